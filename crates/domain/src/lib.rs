//! Hostq Domain Layer
pub mod config;
pub mod errors;
pub mod lookup;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, PoolConfig};
pub use errors::ResolveError;
pub use lookup::{AddrInfo, HostEntry, LookupAnswer, LookupMethod};
