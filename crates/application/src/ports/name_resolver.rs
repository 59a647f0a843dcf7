use hostq_domain::{AddrInfo, HostEntry, ResolveError};
use std::net::IpAddr;

/// Blocking resolution capability behind the worker pool.
///
/// Implementations may block for the full duration of an OS-level lookup;
/// the pool keeps those calls off the dispatching thread, so blocking one
/// worker never blocks the caller or its siblings. "No such record" and
/// backend failure are reported distinctly so workers can log root cause;
/// both reach the caller as an absent answer.
///
/// Arguments arrive unvalidated. An implementation receiving a syntactically
/// invalid name or address reports it as a [`ResolveError`].
pub trait NameResolver: Send + Sync {
    /// Name to its first address.
    fn resolve_host(&self, name: &str) -> Result<IpAddr, ResolveError>;

    /// Name to canonical name, aliases and every address.
    fn resolve_host_extended(&self, name: &str) -> Result<HostEntry, ResolveError>;

    /// Address literal to the host entry naming it.
    fn resolve_addr(&self, addr: &str) -> Result<HostEntry, ResolveError>;

    /// Name to socket-address records.
    fn resolve_addr_info(&self, name: &str) -> Result<Vec<AddrInfo>, ResolveError>;
}
