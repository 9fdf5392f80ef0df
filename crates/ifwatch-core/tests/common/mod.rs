//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that exercise the engine and
//! table without a kernel channel.

#![allow(dead_code)]

use ifwatch_core::error::{Error, Result};
use ifwatch_core::traits::{BatchStream, EventSource, InterfaceEnumerator, InterfaceSnapshot};
use ifwatch_core::{ChangeEvent, EventBatch, MonitorConfig, MonitorEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// An EventSource that emits batches on demand
pub struct ControlledEventSource {
    /// Receiver for the engine's watch stream
    engine_rx: Arc<std::sync::Mutex<Option<mpsc::UnboundedReceiver<EventBatch>>>>,
    /// Call counter for watch()
    watch_call_count: Arc<AtomicUsize>,
    /// Call counter for shutdown()
    shutdown_call_count: Arc<AtomicUsize>,
}

impl ControlledEventSource {
    /// Create a new controlled source and the sender the test drives it with
    pub fn new() -> (Self, mpsc::UnboundedSender<EventBatch>) {
        let (test_tx, engine_rx) = mpsc::unbounded_channel();

        let source = Self {
            engine_rx: Arc::new(std::sync::Mutex::new(Some(engine_rx))),
            watch_call_count: Arc::new(AtomicUsize::new(0)),
            shutdown_call_count: Arc::new(AtomicUsize::new(0)),
        };

        (source, test_tx)
    }

    /// Get the number of times watch() was called
    pub fn watch_call_count(&self) -> usize {
        self.watch_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times shutdown() was called
    pub fn shutdown_call_count(&self) -> usize {
        self.shutdown_call_count.load(Ordering::SeqCst)
    }

    /// Create a new source that shares counters with an existing one
    ///
    /// The receiver moves to the new source.
    pub fn sharing_counters_with(other: &Self) -> Self {
        let rx = other.engine_rx.lock().unwrap().take();
        Self {
            engine_rx: Arc::new(std::sync::Mutex::new(rx)),
            watch_call_count: Arc::clone(&other.watch_call_count),
            shutdown_call_count: Arc::clone(&other.shutdown_call_count),
        }
    }
}

impl EventSource for ControlledEventSource {
    fn watch(&self) -> BatchStream {
        self.watch_call_count.fetch_add(1, Ordering::SeqCst);

        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    fn shutdown(&self) {
        self.shutdown_call_count.fetch_add(1, Ordering::SeqCst);
    }

    fn source_name(&self) -> &'static str {
        "controlled"
    }
}

/// An EventSource that never emits anything (for idle testing)
pub struct IdleEventSource {
    /// Kept alive so the stream never ends
    _tx: mpsc::UnboundedSender<EventBatch>,
    rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<EventBatch>>>,
}

impl IdleEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            _tx: tx,
            rx: std::sync::Mutex::new(Some(rx)),
        }
    }
}

impl EventSource for IdleEventSource {
    fn watch(&self) -> BatchStream {
        let rx = self.rx.lock().unwrap().take().expect("watch() called once");
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    fn source_name(&self) -> &'static str {
        "idle"
    }
}

/// An enumerator returning a fixed snapshot
pub struct StaticEnumerator {
    snapshot: Vec<InterfaceSnapshot>,
    call_count: Arc<AtomicUsize>,
}

impl StaticEnumerator {
    pub fn new(snapshot: Vec<InterfaceSnapshot>) -> Self {
        Self {
            snapshot,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter shared with this enumerator
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait::async_trait]
impl InterfaceEnumerator for StaticEnumerator {
    async fn snapshot(&self) -> Result<Vec<InterfaceSnapshot>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

/// An enumerator that always fails
pub struct FailingEnumerator;

#[async_trait::async_trait]
impl InterfaceEnumerator for FailingEnumerator {
    async fn snapshot(&self) -> Result<Vec<InterfaceSnapshot>> {
        Err(Error::enumeration("dump refused"))
    }
}

/// Helper to create a minimal MonitorConfig for testing
pub fn minimal_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.engine.queue_capacity = 16;
    config.engine.event_channel_capacity = 100;
    config
}

/// Helper to build an address-added event
pub fn addr_added(name: &str, addr: &str) -> ChangeEvent {
    ChangeEvent::AddressAdded {
        name: name.to_string(),
        address: Some(addr.parse().expect("valid test address")),
    }
}

/// Helper to build an address-removed event
pub fn addr_removed(name: &str, addr: &str) -> ChangeEvent {
    ChangeEvent::AddressRemoved {
        name: name.to_string(),
        address: Some(addr.parse().expect("valid test address")),
    }
}

/// Wait for the next monitoring event matching a predicate
pub async fn wait_for_event<F>(rx: &mut mpsc::Receiver<MonitorEvent>, mut pred: F) -> MonitorEvent
where
    F: FnMut(&MonitorEvent) -> bool,
{
    tokio::time::timeout(tokio::time::Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event channel open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("expected monitoring event within 5 seconds")
}
