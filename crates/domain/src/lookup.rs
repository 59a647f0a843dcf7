use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// The four lookup shapes a resolver backend must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupMethod {
    /// Name to a single address.
    Forward,
    /// Name to canonical name, aliases and all addresses.
    ForwardExtended,
    /// Address literal back to a host entry.
    Reverse,
    /// Name to socket-address records.
    AddrInfo,
}

impl LookupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMethod::Forward => "forward",
            LookupMethod::ForwardExtended => "forward-extended",
            LookupMethod::Reverse => "reverse",
            LookupMethod::AddrInfo => "addr-info",
        }
    }
}

impl fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(LookupMethod::Forward),
            "forward-extended" | "extended" => Ok(LookupMethod::ForwardExtended),
            "reverse" => Ok(LookupMethod::Reverse),
            "addr-info" | "addrinfo" => Ok(LookupMethod::AddrInfo),
            other => Err(format!("Unknown lookup method: {other}")),
        }
    }
}

/// A resolved host: canonical name, any aliases, and its addresses.
///
/// Extended forward lookups and reverse lookups both produce this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
    pub addresses: Vec<IpAddr>,
}

impl HostEntry {
    pub fn new(canonical: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            canonical: canonical.into(),
            aliases: Vec::new(),
            addresses,
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }
}

/// One socket-address record from an addr-info lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    pub address: SocketAddr,
    pub canonical: Option<String>,
}

impl AddrInfo {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            canonical: None,
        }
    }
}

/// Successful outcome of a lookup, shaped by the method that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupAnswer {
    Address(IpAddr),
    Host(HostEntry),
    AddrInfo(Vec<AddrInfo>),
}

impl LookupAnswer {
    /// First address carried by the answer, whatever its shape.
    pub fn first_address(&self) -> Option<IpAddr> {
        match self {
            LookupAnswer::Address(addr) => Some(*addr),
            LookupAnswer::Host(entry) => entry.addresses.first().copied(),
            LookupAnswer::AddrInfo(records) => records.first().map(|r| r.address.ip()),
        }
    }
}

impl fmt::Display for LookupAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupAnswer::Address(addr) => write!(f, "{addr}"),
            LookupAnswer::Host(entry) => {
                write!(f, "{}", entry.canonical)?;
                for addr in &entry.addresses {
                    write!(f, " {addr}")?;
                }
                Ok(())
            }
            LookupAnswer::AddrInfo(records) => {
                let mut first = true;
                for record in records {
                    if !first {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", record.address)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}
