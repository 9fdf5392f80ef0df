//! Monitor engine
//!
//! The MonitorEngine is responsible for:
//! - Seeding the interface table from the startup enumerator
//! - Draining event batches from an EventSource
//! - Applying each batch to the InterfaceTable in order
//! - Stopping the source on shutdown
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ EventSource  │─── EventBatch ───┐
//! └──────────────┘                  │
//!                                   ▼
//!                          ┌────────────────┐
//!                          │ MonitorEngine  │
//!                          └────────────────┘
//!                                   │
//!               ┌───────────────────┴───────────────────┐
//!               │                                       │
//!               ▼                                       ▼
//!      ┌────────────────┐                      ┌─────────────┐
//!      │ InterfaceTable │                      │   Events    │
//!      │ (mutate)       │                      │  (notify)   │
//!      └────────────────┘                      └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Snapshot existing interfaces (optional) and seed the table
//! 2. Receive the next batch from the source
//! 3. Discard events without a name or a valid address
//! 4. Apply the rest in decode order
//! 5. Emit a monitoring event

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::event::{ChangeEvent, EventBatch};
use crate::table::InterfaceTable;
use crate::traits::{EventSource, InterfaceEnumerator};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Events emitted by the MonitorEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Table seeded from the startup snapshot
    Seeded { interfaces: usize },

    /// Startup snapshot failed; monitoring continues unseeded
    SeedFailed { error: String },

    /// Engine started consuming batches
    Started { interfaces: usize },

    /// A batch was applied to the table
    BatchApplied { applied: usize, discarded: usize },

    /// Engine stopped
    Stopped { reason: String },
}

/// Result of applying one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events applied to the table
    pub applied: usize,
    /// Events dropped because they had no name or no valid address
    pub discarded: usize,
}

/// Apply a batch to the table, in order
///
/// Address events map to `add_address` / `remove_address`, link events to
/// `set_up` / `set_down` / `remove_link`. Inapplicable events are skipped.
pub fn apply_batch(table: &InterfaceTable, batch: &EventBatch) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for event in batch {
        if !event.is_applicable() {
            debug!("Discarding inapplicable event: {:?}", event);
            outcome.discarded += 1;
            continue;
        }

        match event {
            ChangeEvent::AddressAdded {
                name,
                address: Some(addr),
            } => table.add_address(name, *addr),
            ChangeEvent::AddressRemoved {
                name,
                address: Some(addr),
            } => table.remove_address(name, *addr),
            ChangeEvent::LinkUp { name } => table.set_up(name),
            ChangeEvent::LinkDown { name } => table.set_down(name),
            ChangeEvent::LinkRemoved { name } => table.remove_link(name),
            // is_applicable() rejected address events without an address
            ChangeEvent::AddressAdded { address: None, .. }
            | ChangeEvent::AddressRemoved { address: None, .. } => continue,
        }
        outcome.applied += 1;
    }

    outcome
}

/// Core monitor engine
///
/// ## Lifecycle
///
/// 1. Create with [`MonitorEngine::new()`]
/// 2. Start with [`MonitorEngine::run()`]
/// 3. Engine runs until a shutdown signal arrives or the source closes
/// 4. The source is shut down before `run()` returns
///
/// ## Threading
///
/// The engine is the single consumer of the batch queue, so mutations for
/// the same interface apply in receipt order. Readers use their own
/// [`InterfaceTable`] handles concurrently.
pub struct MonitorEngine {
    /// Source of event batches
    source: Box<dyn EventSource>,

    /// Startup snapshot provider
    enumerator: Option<Box<dyn InterfaceEnumerator>>,

    /// Shared interface table
    table: InterfaceTable,

    /// Whether to seed before consuming batches
    seed_on_startup: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl MonitorEngine {
    /// Create a new monitor engine
    ///
    /// # Parameters
    ///
    /// - `source`: Event source implementation
    /// - `enumerator`: Optional startup enumerator
    /// - `table`: Table handle the engine mutates
    /// - `config`: Monitor configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields monitoring events
    pub fn new(
        source: Box<dyn EventSource>,
        enumerator: Option<Box<dyn InterfaceEnumerator>>,
        table: InterfaceTable,
        config: &MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            source,
            enumerator,
            table,
            seed_on_startup: config.engine.seed_on_startup,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Handle to the table this engine mutates
    pub fn table(&self) -> InterfaceTable {
        self.table.clone()
    }

    /// Run the engine until Ctrl-C or until the source closes
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// With `None` this behaves like [`MonitorEngine::run()`]. A dropped
    /// sender counts as a shutdown request.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        if self.seed_on_startup {
            self.seed().await;
        }

        self.emit_event(MonitorEvent::Started {
            interfaces: self.table.len(),
        });
        info!(
            "Monitoring {} via {}",
            plural(self.table.len(), "interface"),
            self.source.source_name()
        );

        let mut batches = self.source.watch();

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                batch = batches.next() => match batch {
                    Some(batch) => self.handle_batch(&batch),
                    None => {
                        warn!("Event source {} closed", self.source.source_name());
                        break "event source closed";
                    }
                },

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break "shutdown signal";
                }
            }
        };

        self.source.shutdown();
        self.emit_event(MonitorEvent::Stopped {
            reason: reason.to_string(),
        });
        info!("Monitor engine stopped ({})", reason);

        Ok(())
    }

    /// Seed the table from the enumerator, if one is configured
    async fn seed(&self) {
        let Some(enumerator) = &self.enumerator else {
            debug!("No enumerator configured, starting with an empty table");
            return;
        };

        match enumerator.snapshot().await {
            Ok(snapshot) => {
                self.table.seed(&snapshot);
                info!("Seeded {}", plural(snapshot.len(), "interface"));
                self.emit_event(MonitorEvent::Seeded {
                    interfaces: snapshot.len(),
                });
            }
            Err(e) => {
                warn!("Startup enumeration failed, continuing unseeded: {}", e);
                self.emit_event(MonitorEvent::SeedFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn handle_batch(&self, batch: &EventBatch) {
        let outcome = apply_batch(&self.table, batch);
        debug!(
            "Applied batch: {} applied, {} discarded",
            outcome.applied, outcome.discarded
        );
        self.emit_event(MonitorEvent::BatchApplied {
            applied: outcome.applied,
            discarded: outcome.discarded,
        });
    }

    /// Emit a monitoring event without ever blocking the loop
    fn emit_event(&self, event: MonitorEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Monitoring event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
