/*!
Observability infrastructure for the checkpoint engine.

This module provides:
- Structured logging and tracing setup
- A lightweight timer that logs the duration of container operations
*/

use std::time::{Duration, Instant};
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::{CheckpointError, Result};

/// Filter directive used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "checkpoint_core=info";

/// Timer helper for measuring operation durations
///
/// The elapsed time is emitted as a `debug!` event when the timer is finished,
/// tagged with the operation name and the container location.
#[derive(Debug)]
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    location: String,
}

impl OperationTimer {
    /// Start a new timer for the given operation
    pub fn start(operation: &'static str, location: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation,
            location: location.into(),
        }
    }

    /// Time elapsed since the timer was started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Complete the timer, logging the operation latency
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::debug!(
            operation = self.operation,
            location = %self.location,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Container operation finished"
        );
        elapsed
    }

    /// Complete the timer for a failed operation
    pub fn finish_with_error(self, error: &CheckpointError) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::warn!(
            operation = self.operation,
            location = %self.location,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            error = %error,
            "Container operation failed"
        );
        elapsed
    }
}

/// Initialize the global tracing subscriber
///
/// # Arguments
/// * `json` - Emit JSON lines instead of the human readable format
///
/// # Returns
/// Result indicating success or failure of initialization; installing a second
/// global subscriber fails with a storage error.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| CheckpointError::validation(format!("Invalid log filter: {e}")))?;

    let result = if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(false);
        set_global_default(Registry::default().with(filter).with(fmt_layer))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
        set_global_default(Registry::default().with(filter).with(fmt_layer))
    };

    result.map_err(|e| {
        CheckpointError::storage(format!("Failed to set global tracing subscriber: {e}"))
    })?;

    tracing::info!(json, "Checkpoint tracing initialized");
    Ok(())
}

/// Initialize tracing with default settings (human readable output)
pub fn init_default_tracing() -> Result<()> {
    init_tracing(false)
}
