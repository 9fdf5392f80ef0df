// # Interface Enumerator Trait
//
// Defines the one-shot startup snapshot used to seed the interface table
// before live notifications are applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One interface as reported by the host at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    /// Interface name
    pub name: String,
    /// Whether the interface was administratively up
    pub up: bool,
    /// Currently assigned addresses
    pub addresses: Vec<IpAddr>,
}

impl InterfaceSnapshot {
    /// Create a snapshot entry with no addresses
    pub fn new(name: impl Into<String>, up: bool) -> Self {
        Self {
            name: name.into(),
            up,
            addresses: Vec::new(),
        }
    }

    /// Add an address
    pub fn with_address(mut self, addr: IpAddr) -> Self {
        self.addresses.push(addr);
        self
    }
}

/// Trait for startup enumeration implementations
///
/// Enumeration failure is not fatal to monitoring: the engine logs it and
/// continues with whatever the live notifications report.
#[async_trait]
pub trait InterfaceEnumerator: Send + Sync {
    /// Snapshot the interfaces present right now
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<InterfaceSnapshot>)`: One entry per interface
    /// - `Err(Error)`: If the host facility could not be queried
    async fn snapshot(&self) -> Result<Vec<InterfaceSnapshot>, crate::Error>;
}
