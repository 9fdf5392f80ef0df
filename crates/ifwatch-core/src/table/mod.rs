// # Interface State Table
//
// The authoritative registry of interface name → interface record.
// Mutated by the event loop, read by anyone holding a handle.

pub mod memory;
pub mod record;

pub use memory::InterfaceTable;
pub use record::InterfaceRecord;
