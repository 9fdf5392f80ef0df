// # ifwatchd - Interface Monitor Daemon
//
// Thin integration layer: all monitoring logic lives in ifwatch-core and
// ifwatch-netlink.
//
// The daemon is responsible for:
// 1. Reading configuration from the environment (and an optional JSON file)
// 2. Initializing tracing and the runtime
// 3. Binding the netlink source and startup enumerator
// 4. Running the monitor engine until SIGTERM/SIGINT
//
// ## Configuration
//
// - `IFWATCH_CONFIG`: Path to a JSON `MonitorConfig` (optional)
// - `IFWATCH_QUEUE_CAPACITY`: Batch queue capacity
// - `IFWATCH_RECV_BUFFER`: Receive buffer size in bytes
// - `IFWATCH_POLL_INTERVAL_MS`: Receive timeout between cancellation checks
// - `IFWATCH_SEED`: Seed the table at startup (`true`/`false`)
// - `IFWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// Environment variables override values from the file.
//
// ## Example
//
// ```bash
// export IFWATCH_LOG_LEVEL=debug
// export IFWATCH_QUEUE_CAPACITY=128
//
// sudo ifwatchd
// ```

use anyhow::{Context, Result};
use ifwatch_core::{InterfaceTable, MonitorConfig, MonitorEvent};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IfwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IfwatchExitCode> for ExitCode {
    fn from(code: IfwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    monitor: MonitorConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from the environment
    fn from_env() -> Result<Self> {
        let mut monitor = match env::var("IFWATCH_CONFIG") {
            Ok(path) if !path.is_empty() => MonitorConfig::from_json_file(&path)
                .with_context(|| format!("Failed to load IFWATCH_CONFIG from {}", path))?,
            _ => MonitorConfig::default(),
        };

        if let Some(capacity) = parse_env("IFWATCH_QUEUE_CAPACITY")? {
            monitor.engine.queue_capacity = capacity;
        }
        if let Some(size) = parse_env("IFWATCH_RECV_BUFFER")? {
            monitor.listener.receive_buffer_size = size;
        }
        if let Some(interval) = parse_env("IFWATCH_POLL_INTERVAL_MS")? {
            monitor.listener.poll_interval_ms = interval;
        }
        if let Some(seed) = parse_env("IFWATCH_SEED")? {
            monitor.engine.seed_on_startup = seed;
        }

        Ok(Self {
            monitor,
            log_level: env::var("IFWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        self.monitor.validate()?;
        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "IFWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Read and parse an optional environment variable
fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        _ => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IfwatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return IfwatchExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IfwatchExitCode::ConfigError.into();
    }

    info!("Starting ifwatchd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IfwatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Build the engine and run it until a shutdown signal
#[cfg(all(feature = "netlink", target_os = "linux"))]
async fn run_daemon(config: Config) -> IfwatchExitCode {
    use ifwatch_core::MonitorEngine;
    use ifwatch_netlink::{NetlinkEnumerator, NetlinkEventSource};
    use tokio::sync::oneshot;

    let source = match NetlinkEventSource::bind(&config.monitor) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to open netlink channel: {}", e);
            return startup_exit_code(&e);
        }
    };

    let (engine, events) = match MonitorEngine::new(
        Box::new(source),
        Some(Box::new(NetlinkEnumerator::new())),
        InterfaceTable::new(),
        &config.monitor,
    ) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed to create monitor engine: {}", e);
            return startup_exit_code(&e);
        }
    };

    let reporter = tokio::spawn(report_events(events, engine.table()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signals = tokio::spawn(async move {
        let outcome = wait_for_shutdown().await;
        let _ = shutdown_tx.send(());
        outcome
    });

    let result = engine.run_with_shutdown(Some(shutdown_rx)).await;
    // An unfinished signal task means the source closed on its own
    signals.abort();
    let stop = match signals.await {
        Ok(Ok(signal)) => StopCause::Signal(signal),
        Ok(Err(e)) => StopCause::SignalSetupFailed(e),
        Err(_) => StopCause::SourceClosed,
    };
    drop(engine);
    let _ = reporter.await;

    if let Err(e) = result {
        error!("Daemon error: {}", e);
        return IfwatchExitCode::RuntimeError;
    }
    shutdown_exit_code(stop)
}

#[cfg(not(all(feature = "netlink", target_os = "linux")))]
async fn run_daemon(_config: Config) -> IfwatchExitCode {
    error!("ifwatchd needs the netlink feature and a Linux host");
    IfwatchExitCode::ConfigError
}

/// Why the engine stopped
#[derive(Debug)]
enum StopCause {
    /// SIGTERM or SIGINT
    Signal(&'static str),
    /// Signal handlers could not be installed
    SignalSetupFailed(anyhow::Error),
    /// The notification source ended without a shutdown request
    SourceClosed,
}

/// Fatal startup errors are configuration problems; the rest are runtime failures
fn startup_exit_code(err: &ifwatch_core::Error) -> IfwatchExitCode {
    if err.is_fatal() {
        IfwatchExitCode::ConfigError
    } else {
        IfwatchExitCode::RuntimeError
    }
}

fn shutdown_exit_code(stop: StopCause) -> IfwatchExitCode {
    match stop {
        StopCause::Signal(signal) => {
            info!("Received shutdown signal: {}", signal);
            info!("Shutting down ifwatchd");
            IfwatchExitCode::CleanShutdown
        }
        StopCause::SignalSetupFailed(e) => {
            error!("Signal handling failed: {}", e);
            IfwatchExitCode::RuntimeError
        }
        StopCause::SourceClosed => {
            error!("Netlink listener stopped unexpectedly");
            IfwatchExitCode::RuntimeError
        }
    }
}

/// Log monitoring events; dump the table after each applied batch
async fn report_events(mut events: mpsc::Receiver<MonitorEvent>, table: InterfaceTable) {
    while let Some(event) = events.recv().await {
        match &event {
            MonitorEvent::SeedFailed { error } => {
                warn!("Startup enumeration failed: {}", error)
            }
            MonitorEvent::BatchApplied { applied, discarded } => {
                debug!("Batch applied ({} applied, {} discarded)", applied, discarded);
                match serde_json::to_string(&table.snapshot()) {
                    Ok(json) => debug!("Interface table: {}", json),
                    Err(e) => warn!("Failed to serialize interface table: {}", e),
                }
            }
            other => info!("{:?}", other),
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
