// # Netlink Interface Source
//
// Kernel-facing half of ifwatch: decodes `NETLINK_ROUTE` link and address
// notifications and feeds them to the monitor engine.
//
// ## Layout
//
// - `wire`: structure sizes, tag values, and the attribute iterator
// - `decode`: datagram to `EventBatch`, pure and total
// - `listener`: bound socket plus the blocking receive thread (Linux)
// - `source`: `EventSource` adapter over the listener (Linux)
// - `enumerate`: startup link/address dump (Linux)
//
// ## Platform Support
//
// The decoder builds everywhere so it can be tested on any host. The socket
// side only compiles on Linux.

pub mod decode;
pub mod wire;

#[cfg(target_os = "linux")]
pub mod enumerate;
#[cfg(target_os = "linux")]
pub mod listener;
#[cfg(target_os = "linux")]
pub mod source;

pub use decode::{decode, decode_message};

#[cfg(target_os = "linux")]
pub use enumerate::NetlinkEnumerator;
#[cfg(target_os = "linux")]
pub use listener::NetlinkListener;
#[cfg(target_os = "linux")]
pub use source::NetlinkEventSource;
