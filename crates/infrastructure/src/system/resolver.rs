use hostq_application::ports::NameResolver;
use hostq_domain::{AddrInfo, HostEntry, ResolveError};
use std::net::{IpAddr, ToSocketAddrs};
use tracing::debug;

/// [`NameResolver`] backed by the operating system's resolver.
///
/// Every call blocks for the duration of the underlying `getaddrinfo`/
/// `getnameinfo`, which is why these only ever run on pool worker threads.
/// The OS reports nonexistent names as errors rather than empty results, so
/// those surface as backend failures carrying the OS reason; the pool treats
/// either the same way.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }

    fn addresses(name: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let addrs = dns_lookup::lookup_host(name)
            .map_err(|e| ResolveError::backend(name, e.to_string()))?;
        if addrs.is_empty() {
            return Err(ResolveError::NotFound(name.to_string()));
        }
        Ok(addrs)
    }
}

impl NameResolver for SystemResolver {
    fn resolve_host(&self, name: &str) -> Result<IpAddr, ResolveError> {
        let addrs = Self::addresses(name)?;
        debug!(name = %name, count = addrs.len(), "Forward lookup resolved");
        Ok(addrs[0])
    }

    fn resolve_host_extended(&self, name: &str) -> Result<HostEntry, ResolveError> {
        // getaddrinfo exposes no alias list; the queried name stands as
        // canonical.
        let addresses = Self::addresses(name)?;
        Ok(HostEntry::new(name, addresses))
    }

    fn resolve_addr(&self, addr: &str) -> Result<HostEntry, ResolveError> {
        let ip: IpAddr = addr
            .parse()
            .map_err(|_| ResolveError::InvalidAddress(addr.to_string()))?;
        let hostname =
            dns_lookup::lookup_addr(&ip).map_err(|e| ResolveError::backend(addr, e.to_string()))?;
        // Without a PTR record getnameinfo hands back the numeric form.
        if hostname == addr {
            return Err(ResolveError::NotFound(addr.to_string()));
        }
        debug!(addr = %addr, hostname = %hostname, "Reverse lookup resolved");
        Ok(HostEntry::new(hostname, vec![ip]))
    }

    fn resolve_addr_info(&self, name: &str) -> Result<Vec<AddrInfo>, ResolveError> {
        let records: Vec<AddrInfo> = (name, 0u16)
            .to_socket_addrs()
            .map_err(|e| ResolveError::backend(name, e.to_string()))?
            .map(AddrInfo::new)
            .collect();
        if records.is_empty() {
            return Err(ResolveError::NotFound(name.to_string()));
        }
        debug!(name = %name, count = records.len(), "Addr-info lookup resolved");
        Ok(records)
    }
}
