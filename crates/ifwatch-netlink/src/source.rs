//! `EventSource` adapter over the netlink listener

use std::sync::{Mutex, PoisonError};

use ifwatch_core::traits::{BatchStream, EventSource};
use ifwatch_core::{MonitorConfig, Result};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::listener::NetlinkListener;

/// Netlink-backed event source (Linux)
///
/// The socket is bound in [`NetlinkEventSource::bind`], so permission and
/// bind failures surface before the engine starts. The receive thread starts
/// on the first [`EventSource::watch`] call.
pub struct NetlinkEventSource {
    listener: Mutex<Option<NetlinkListener>>,
    queue_capacity: usize,
    cancel: CancellationToken,
}

impl NetlinkEventSource {
    /// Bind the notification channel
    pub fn bind(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        let listener = NetlinkListener::bind(&config.listener)?;

        Ok(Self {
            listener: Mutex::new(Some(listener)),
            queue_capacity: config.engine.queue_capacity,
            cancel: CancellationToken::new(),
        })
    }
}

impl EventSource for NetlinkEventSource {
    fn watch(&self) -> BatchStream {
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match listener {
            Some(listener) => {
                // On failure `tx` is dropped with the listener and the stream ends
                if let Err(e) = listener.spawn(tx, self.cancel.clone()) {
                    error!("{}", e);
                }
            }
            None => warn!("Netlink source already watched, returning a closed stream"),
        }

        Box::pin(ReceiverStream::new(rx))
    }

    fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn source_name(&self) -> &'static str {
        "netlink"
    }
}

impl Drop for NetlinkEventSource {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
