//! Blocking netlink notification listener
//!
//! Owns the `NETLINK_ROUTE` socket subscribed to link and address
//! notifications and runs the receive loop on a dedicated OS thread.
//!
//! ## Loop
//!
//! 1. Check the cancellation token
//! 2. Block in `recv` for at most `poll_interval_ms`
//! 3. Decode the datagram into one batch
//! 4. `blocking_send` the batch to the bounded queue (backpressure, never drops)
//!
//! Setup failures are returned to the caller. Receive failures are logged and
//! the loop carries on.

use std::io;
use std::os::fd::AsRawFd;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ifwatch_core::config::ListenerConfig;
use ifwatch_core::{Error, EventBatch, Result};
use netlink_sys::constants::NETLINK_ROUTE;
use netlink_sys::{Socket, SocketAddr};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::decode::decode;
use crate::wire::MULTICAST_GROUPS;

/// Name given to the receive thread
pub const LISTENER_THREAD_NAME: &str = "ifwatch-netlink";

/// A bound notification channel, ready to be spawned
pub struct NetlinkListener {
    socket: Socket,
    receive_buffer_size: usize,
}

impl NetlinkListener {
    /// Open and bind the notification channel
    ///
    /// Requires permission to open a raw netlink socket.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid configuration, `Error::Socket` when the
    /// socket cannot be created, bound, or configured.
    pub fn bind(config: &ListenerConfig) -> Result<Self> {
        config.validate()?;

        let mut socket = Socket::new(NETLINK_ROUTE)
            .map_err(|e| Error::socket(format!("Failed to create netlink socket: {}", e)))?;

        socket
            .bind(&SocketAddr::new(0, MULTICAST_GROUPS))
            .map_err(|e| {
                Error::socket(format!(
                    "Failed to bind netlink socket to groups {:#x}: {}",
                    MULTICAST_GROUPS, e
                ))
            })?;

        set_receive_timeout(&socket, Duration::from_millis(config.poll_interval_ms))
            .map_err(|e| Error::socket(format!("Failed to set receive timeout: {}", e)))?;

        debug!(
            "Netlink socket bound (groups={:#x}, buffer={} bytes)",
            MULTICAST_GROUPS, config.receive_buffer_size
        );

        Ok(Self {
            socket,
            receive_buffer_size: config.receive_buffer_size,
        })
    }

    /// Start the receive loop on its own thread
    ///
    /// The thread exits when `cancel` fires or when the queue's receiver is
    /// dropped.
    pub fn spawn(
        self,
        tx: mpsc::Sender<EventBatch>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || self.run(tx, cancel))
            .map_err(|e| Error::socket(format!("Failed to spawn listener thread: {}", e)))
    }

    /// Run the receive loop on the current thread
    ///
    /// Must not be called from inside an async runtime: queue sends block.
    pub fn run(self, tx: mpsc::Sender<EventBatch>, cancel: CancellationToken) {
        info!("Listening for netlink interface notifications");

        let socket = self.socket;
        let exit = receive_loop(
            |buf| socket.recv(buf, 0).map(|_| ()),
            self.receive_buffer_size,
            &tx,
            &cancel,
        );

        match exit {
            LoopExit::Cancelled => info!("Listener cancelled"),
            LoopExit::QueueClosed => info!("Batch queue closed, stopping listener"),
        }
    }
}

/// Why the receive loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Cancelled,
    QueueClosed,
}

/// Receive, decode, and forward datagrams until cancelled or the queue closes
///
/// `recv` fills the cleared buffer with one datagram. Receive errors never
/// end the loop.
fn receive_loop<F>(
    mut recv: F,
    buffer_size: usize,
    tx: &mpsc::Sender<EventBatch>,
    cancel: &CancellationToken,
) -> LoopExit
where
    F: FnMut(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buf: Vec<u8> = Vec::with_capacity(buffer_size);

    while !cancel.is_cancelled() {
        buf.clear();
        match recv(&mut buf) {
            Ok(()) => {}
            Err(e) if is_retryable(&e) => continue,
            Err(e) => {
                warn!("Error receiving netlink message: {}", e);
                continue;
            }
        }

        let batch = decode(&buf);
        if batch.is_empty() {
            trace!("Datagram of {} bytes carried no interface events", buf.len());
            continue;
        }

        trace!("Decoded {} event(s) from {} bytes", batch.len(), buf.len());
        if tx.blocking_send(batch).is_err() {
            return LoopExit::QueueClosed;
        }
    }

    LoopExit::Cancelled
}

/// Timeouts and interrupted calls just bring us back to the cancellation check
fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn set_receive_timeout(socket: &Socket, timeout: Duration) -> io::Result<()> {
    let tv = libc::timeval {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    };

    // SAFETY: the fd is owned by `socket` and stays open for the call; `tv`
    // lives on the stack for the duration of the call and its size is passed.
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVTIMEO,
            &tv as *const libc::timeval as *const libc::c_void,
            std::mem::size_of::<libc::timeval>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
