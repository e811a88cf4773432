//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the output format from `common:logging:format`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides `common:logging:level` when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};
use crate::error::HostError;

/// Build the filter: `RUST_LOG` if set and valid, else the configured level.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, HostError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level)
        .map_err(|e| HostError::Logging(format!("invalid level `{}`: {}", settings.level, e)))
}

/// Install the global subscriber.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), HostError> {
    let filter = env_filter(settings)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match settings.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| HostError::Logging(e.to_string()))
}
