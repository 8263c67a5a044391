//! Observability subsystem for aerofiles
//!
//! Logging goes through `tracing`. This module owns subscriber setup and
//! the typed event names carried in the `event` field.
//!
//! # Principles
//!
//! 1. One log line = one event
//! 2. Structured (JSON) output unless configured otherwise
//! 3. Backend failure detail is logged, never returned to clients
//!
//! # Usage
//!
//! ```ignore
//! use aerofiles::observability::{self, Event};
//!
//! observability::init(&config.log)?;
//! tracing::info!(event = %Event::Serving, addr = %addr);
//! ```

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. Fails if a subscriber is
/// already installed or the filter does not parse.
pub fn init(config: &LogConfig) -> Result<(), String> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.is_empty() => EnvFilter::try_new(from_env),
        _ => EnvFilter::try_new(&config.filter),
    }
    .map_err(|e| format!("invalid log filter: {}", e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| format!("failed to install log subscriber: {}", e))
}
