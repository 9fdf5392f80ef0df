//! Core traits for the ifwatch system
//!
//! This module defines the seams between the platform-free core and the
//! platform-specific collaborators.
//!
//! - [`EventSource`]: Deliver batches of decoded interface changes
//! - [`InterfaceEnumerator`]: Snapshot the interfaces present at startup

pub mod enumerator;
pub mod event_source;

pub use enumerator::{InterfaceEnumerator, InterfaceSnapshot};
pub use event_source::{BatchStream, EventSource};
