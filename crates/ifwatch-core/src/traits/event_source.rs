// # Event Source Trait
//
// Defines the interface for anything that delivers decoded interface
// change batches to the event loop.
//
// ## Implementations
//
// - Netlink-based (Linux): `ifwatch-netlink` crate
// - Test doubles: `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ifwatch_core::EventSource;
// use tokio_stream::StreamExt;
//
// let mut batches = source.watch();
// while let Some(batch) = batches.next().await {
//     for event in &batch {
//         println!("{:?}", event);
//     }
// }
// source.shutdown();
// ```

use std::pin::Pin;
use tokio_stream::Stream;

use crate::event::EventBatch;

/// Boxed stream of event batches
pub type BatchStream = Pin<Box<dyn Stream<Item = EventBatch> + Send + 'static>>;

/// Trait for event source implementations
///
/// # Ordering
///
/// Batches must be yielded in the order their notifications were received,
/// and events inside a batch in the order they were decoded.
///
/// # Lifecycle
///
/// - `watch()` starts delivery; the stream ends when the source stops
/// - `shutdown()` asks the source to stop; it must be safe to call more than
///   once and before `watch()`
pub trait EventSource: Send + Sync {
    /// Stream of event batches
    ///
    /// Sources backed by a single kernel channel yield batches from the
    /// first call only; later calls return an empty, finished stream.
    fn watch(&self) -> BatchStream;

    /// Request the source to stop delivering batches
    fn shutdown(&self) {}

    /// Short name used in logs
    fn source_name(&self) -> &'static str;
}
