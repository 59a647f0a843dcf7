use hostq_application::ports::NameResolver;
use hostq_domain::{AddrInfo, HostEntry, ResolveError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Deterministic in-memory resolver with an invocation counter.
///
/// Unknown names resolve as `NotFound`; names registered via
/// `with_failure` fail as backend errors; names registered via
/// `with_panic` panic mid-call.
#[derive(Default)]
pub struct MockResolver {
    calls: AtomicUsize,
    hosts: Mutex<HashMap<String, IpAddr>>,
    failures: Mutex<HashSet<String>>,
    panics: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(self, name: &str, addr: &str) -> Self {
        self.hosts
            .lock()
            .insert(name.to_string(), addr.parse().expect("test address"));
        self
    }

    pub fn with_failure(self, name: &str) -> Self {
        self.failures.lock().insert(name.to_string());
        self
    }

    pub fn with_panic(self, name: &str) -> Self {
        self.panics.lock().insert(name.to_string());
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, name: &str) -> Result<IpAddr, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = *self.delay.lock() {
            std::thread::sleep(delay);
        }
        if self.panics.lock().contains(name) {
            panic!("mock resolver asked to panic for {name}");
        }
        if self.failures.lock().contains(name) {
            return Err(ResolveError::backend(name, "mock backend failure"));
        }
        self.hosts
            .lock()
            .get(name)
            .copied()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

impl NameResolver for MockResolver {
    fn resolve_host(&self, name: &str) -> Result<IpAddr, ResolveError> {
        self.lookup(name)
    }

    fn resolve_host_extended(&self, name: &str) -> Result<HostEntry, ResolveError> {
        let addr = self.lookup(name)?;
        Ok(HostEntry::new(name, vec![addr]))
    }

    fn resolve_addr(&self, addr: &str) -> Result<HostEntry, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let parsed: IpAddr = addr
            .parse()
            .map_err(|_| ResolveError::InvalidAddress(addr.to_string()))?;
        Ok(HostEntry::new("reverse.mock.test", vec![parsed]))
    }

    fn resolve_addr_info(&self, name: &str) -> Result<Vec<AddrInfo>, ResolveError> {
        let addr = self.lookup(name)?;
        Ok(vec![AddrInfo::new(SocketAddr::new(addr, 0))])
    }
}
