//! Change events decoded from kernel interface notifications
//!
//! One kernel datagram decodes into one [`EventBatch`]. Batches are delivered
//! whole, so a consumer never sees events from two notifications
//! interleaved.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A single decoded unit of work for the interface table
///
/// Address variants carry `None` when the kernel payload could not be
/// parsed as an address of the message's family. Such events must be
/// discarded rather than applied; see [`ChangeEvent::is_applicable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An address was assigned to an interface
    AddressAdded {
        name: String,
        address: Option<IpAddr>,
    },

    /// An address was removed from an interface
    AddressRemoved {
        name: String,
        address: Option<IpAddr>,
    },

    /// A link notification arrived with the up flag set
    LinkUp { name: String },

    /// A link notification arrived with the up flag clear
    LinkDown { name: String },

    /// The link was deleted
    LinkRemoved { name: String },
}

impl ChangeEvent {
    /// Interface name this event targets
    pub fn name(&self) -> &str {
        match self {
            ChangeEvent::AddressAdded { name, .. }
            | ChangeEvent::AddressRemoved { name, .. }
            | ChangeEvent::LinkUp { name }
            | ChangeEvent::LinkDown { name }
            | ChangeEvent::LinkRemoved { name } => name,
        }
    }

    /// Address carried by an address event
    ///
    /// `None` for link events and for address events whose payload was invalid.
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            ChangeEvent::AddressAdded { address, .. }
            | ChangeEvent::AddressRemoved { address, .. } => *address,
            _ => None,
        }
    }

    /// Whether this is an address-added or address-removed event
    pub fn is_address_event(&self) -> bool {
        matches!(
            self,
            ChangeEvent::AddressAdded { .. } | ChangeEvent::AddressRemoved { .. }
        )
    }

    /// Whether the event is complete enough to apply to the table
    ///
    /// False when the interface name is empty, or when an address event has
    /// no valid address.
    pub fn is_applicable(&self) -> bool {
        if self.name().is_empty() {
            return false;
        }
        !self.is_address_event() || self.address().is_some()
    }
}

/// The ordered events decoded from one kernel notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBatch {
    events: Vec<ChangeEvent>,
}

impl EventBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, preserving decode order
    pub fn push(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }

    /// Number of events in the batch
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the batch holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over events in decode order
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEvent> {
        self.events.iter()
    }

    /// Borrow the events as a slice
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Take ownership of the events
    pub fn into_events(self) -> Vec<ChangeEvent> {
        self.events
    }
}

impl From<Vec<ChangeEvent>> for EventBatch {
    fn from(events: Vec<ChangeEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<ChangeEvent> for EventBatch {
    fn from_iter<I: IntoIterator<Item = ChangeEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventBatch {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a ChangeEvent;
    type IntoIter = std::slice::Iter<'a, ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
