//! Hostq Infrastructure Layer
//!
//! Adapters binding the application ports to the operating system.
pub mod system;

pub use system::SystemResolver;
