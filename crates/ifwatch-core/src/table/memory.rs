// # In-Memory Interface Table
//
// Lock-guarded registry of interface records.
//
// ## Concurrency
//
// - One `std::sync::Mutex` covers the whole table
// - Every operation, reads included, holds it for its full duration
// - The guard is released on every exit path when it goes out of scope
//
// ## Lifetime
//
// - Built empty, seeded once at startup, then mutated by the event loop
// - State lives only as long as the process

use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::record::InterfaceRecord;
use crate::traits::InterfaceSnapshot;

/// Shared interface state table
///
/// Cloning yields another handle to the same table. Records are only
/// reachable through the methods below, so the locking discipline cannot be
/// bypassed.
///
/// # Example
///
/// ```rust
/// use ifwatch_core::InterfaceTable;
///
/// let table = InterfaceTable::new();
/// table.add_link("wlan0", false);
/// table.set_up("wlan0");
/// assert!(table.get("wlan0").unwrap().up);
///
/// table.add_address("wlan0", "10.0.0.5".parse().unwrap());
/// assert_eq!(table.get("wlan0").unwrap().ipv4.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    inner: Arc<Mutex<Vec<InterfaceRecord>>>,
}

impl InterfaceTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address on an interface
    ///
    /// Appends to the matching family list of the named interface. An
    /// unknown name gets a new record, down, holding only this address.
    pub fn add_address(&self, name: &str, addr: IpAddr) {
        let mut guard = self.lock();
        if let Some(record) = guard.iter_mut().find(|r| r.name == name) {
            record.push_address(addr);
            trace!("Recorded {} on {}", addr, name);
            return;
        }
        guard.push(InterfaceRecord::with_address(name, addr));
        trace!("Created {} with {}", name, addr);
    }

    /// Remove an address from an interface
    ///
    /// Removes the first exact match. Unknown interfaces and absent
    /// addresses are no-ops.
    pub fn remove_address(&self, name: &str, addr: IpAddr) {
        let mut guard = self.lock();
        if let Some(record) = guard.iter_mut().find(|r| r.name == name) {
            if record.remove_address(addr) {
                trace!("Removed {} from {}", addr, name);
            }
        }
    }

    /// Register a link
    ///
    /// Does not check for an existing record with the same name; callers
    /// must not register a link twice.
    pub fn add_link(&self, name: &str, up: bool) {
        let mut guard = self.lock();
        guard.push(InterfaceRecord::new(name, up));
        trace!("Registered link {} (up={})", name, up);
    }

    /// Remove every record with this name
    pub fn remove_link(&self, name: &str) {
        let mut guard = self.lock();
        guard.retain(|r| r.name != name);
        trace!("Removed link {}", name);
    }

    /// Mark an interface up; unknown names are a no-op
    pub fn set_up(&self, name: &str) {
        self.set_state(name, true);
    }

    /// Mark an interface down; unknown names are a no-op
    pub fn set_down(&self, name: &str) {
        self.set_state(name, false);
    }

    fn set_state(&self, name: &str, up: bool) {
        let mut guard = self.lock();
        if let Some(record) = guard.iter_mut().find(|r| r.name == name) {
            record.up = up;
        }
    }

    /// Register a startup snapshot
    ///
    /// Each interface is added as a link, then each of its addresses is
    /// recorded.
    pub fn seed(&self, snapshot: &[InterfaceSnapshot]) {
        for iface in snapshot {
            self.add_link(&iface.name, iface.up);
            for addr in &iface.addresses {
                self.add_address(&iface.name, *addr);
            }
        }
    }

    /// Copy of the named record
    pub fn get(&self, name: &str) -> Option<InterfaceRecord> {
        self.lock().iter().find(|r| r.name == name).cloned()
    }

    /// Check whether an interface is known
    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|r| r.name == name)
    }

    /// Consistent copy of every record, in registration order
    pub fn snapshot(&self) -> Vec<InterfaceRecord> {
        self.lock().clone()
    }

    /// Names of all known interfaces
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.name.clone()).collect()
    }

    /// Get the number of records in the table
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Records are plain data, so a panic while holding the guard cannot leave
    // them half-updated in a way later operations would trip over.
    fn lock(&self) -> MutexGuard<'_, Vec<InterfaceRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
