//! Per-interface entry of the state table

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// One network interface as last observed
///
/// Address lists have list semantics: the table appends whatever the kernel
/// reports, so a repeated "address added" notification leaves a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Interface name (e.g., "eth0"), the identity key
    pub name: String,
    /// IPv4 addresses in arrival order
    pub ipv4: Vec<Ipv4Addr>,
    /// IPv6 addresses in arrival order
    pub ipv6: Vec<Ipv6Addr>,
    /// Link up flag; false until a link event says otherwise
    pub up: bool,
}

impl InterfaceRecord {
    /// Create a record with no addresses
    pub fn new(name: impl Into<String>, up: bool) -> Self {
        Self {
            name: name.into(),
            up,
            ..Default::default()
        }
    }

    /// Create a down record holding a single address
    pub fn with_address(name: impl Into<String>, addr: IpAddr) -> Self {
        let mut record = Self::new(name, false);
        record.push_address(addr);
        record
    }

    /// Append an address to the list of its family
    pub(crate) fn push_address(&mut self, addr: IpAddr) {
        match addr {
            IpAddr::V4(v4) => self.ipv4.push(v4),
            IpAddr::V6(v6) => self.ipv6.push(v6),
        }
    }

    /// Remove the first exact match; returns whether anything was removed
    pub(crate) fn remove_address(&mut self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => remove_first(&mut self.ipv4, &v4),
            IpAddr::V6(v6) => remove_first(&mut self.ipv6, &v6),
        }
    }

    /// Check whether the record holds an address
    pub fn has_address(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => self.ipv4.contains(&v4),
            IpAddr::V6(v6) => self.ipv6.contains(&v6),
        }
    }

    /// All addresses, IPv4 first
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.ipv4
            .iter()
            .copied()
            .map(IpAddr::V4)
            .chain(self.ipv6.iter().copied().map(IpAddr::V6))
            .collect()
    }
}

fn remove_first<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    match list.iter().position(|x| x == item) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}
