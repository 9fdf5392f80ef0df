//! Configuration types for the ifwatch system
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Size of a netlink message header; no receive buffer may be smaller.
const MIN_RECEIVE_BUFFER_SIZE: usize = 16;

/// Upper bound for the receive buffer (1 MiB).
const MAX_RECEIVE_BUFFER_SIZE: usize = 1 << 20;

/// Main ifwatch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Notification listener settings
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Event loop settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl MonitorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.listener.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Notification listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Size of the buffer handed to each kernel receive call (bytes)
    ///
    /// A datagram larger than this is truncated; the decoder keeps every
    /// complete message that fits and drops the rest.
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,

    /// Upper bound on a single blocking receive (milliseconds)
    ///
    /// The listener checks its cancellation token at least this often.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl ListenerConfig {
    /// Validate the listener configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.receive_buffer_size < MIN_RECEIVE_BUFFER_SIZE {
            return Err(crate::Error::config(format!(
                "Receive buffer must hold at least one netlink header ({} bytes), got {}",
                MIN_RECEIVE_BUFFER_SIZE, self.receive_buffer_size
            )));
        }
        if self.receive_buffer_size > MAX_RECEIVE_BUFFER_SIZE {
            return Err(crate::Error::config(format!(
                "Receive buffer must not exceed {} bytes, got {}",
                MAX_RECEIVE_BUFFER_SIZE, self.receive_buffer_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("Listener poll interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: default_receive_buffer_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Event loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the batch queue between listener and event loop
    ///
    /// When full, the listener blocks until the event loop catches up.
    /// Batches are never dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the monitoring event channel
    ///
    /// When full, new monitoring events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Seed the table from the startup enumerator before applying batches
    #[serde(default = "default_seed_on_startup")]
    pub seed_on_startup: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.queue_capacity == 0 {
            return Err(crate::Error::config("Batch queue capacity must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "Monitoring event channel capacity must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            event_channel_capacity: default_event_channel_capacity(),
            seed_on_startup: default_seed_on_startup(),
        }
    }
}

fn default_receive_buffer_size() -> usize {
    8192
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_queue_capacity() -> usize {
    64
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_seed_on_startup() -> bool {
    true
}
