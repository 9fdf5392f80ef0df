// # ifwatch-core
//
// Core library for the ifwatch interface monitor.
//
// ## Architecture Overview
//
// This library keeps a live, in-memory model of the host's network
// interfaces and the plumbing that feeds it:
// - **ChangeEvent / EventBatch**: Decoded kernel notifications, one batch per datagram
// - **EventSource**: Trait for anything that delivers event batches (netlink, tests)
// - **InterfaceEnumerator**: Trait for the one-shot startup snapshot
// - **InterfaceTable**: The shared, lock-guarded interface registry
// - **MonitorEngine**: Event loop applying batches to the table
//
// ## Design Principles
//
// 1. **Platform-Free Core**: Socket and kernel details live in `ifwatch-netlink`
// 2. **Single Lock**: Every table operation runs under one exclusive guard
// 3. **Batch Delivery**: Events decoded from one notification travel together
// 4. **Observe Only**: State is recorded, never reconciled or persisted

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod table;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, ListenerConfig, MonitorConfig};
pub use engine::{BatchOutcome, MonitorEngine, MonitorEvent, apply_batch};
pub use error::{Error, Result};
pub use event::{ChangeEvent, EventBatch};
pub use table::{InterfaceRecord, InterfaceTable};
pub use traits::{EventSource, InterfaceEnumerator, InterfaceSnapshot};
