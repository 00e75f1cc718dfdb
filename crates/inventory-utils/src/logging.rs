/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Inventory Logging Module
//!
//! Installs a `tracing` subscriber for the inventory binaries. Library crates only emit
//! events through the `tracing` macros; nothing is printed until a binary calls [`init`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inventory_utils::logging;
//! use inventory_utils::logging::prelude::*;
//!
//! logging::init("info", "text")?;
//! info!("Logger initialized");
//! ```
//!
//! `RUST_LOG`, when set, takes precedence over the configured level so a single module can be
//! turned up without touching the config file.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level string could not be turned into a filter
    #[error("Log filter error: {0}")]
    FilterError(String),
    /// A global subscriber was already installed
    #[error("Subscriber error: {0}")]
    SubscriberError(String),
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) is text.
    pub fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Normalises a configured level, falling back to "info" for unknown values.
pub fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "off" => "off",
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}

/// Initializes the global tracing subscriber.
///
/// # Arguments
/// * `level` - Log level filter string (e.g., "info", "debug")
/// * `format` - Log format ("text" or "json")
///
/// # Returns
/// * `Ok(())` on success
/// * `Err(LoggingError)` if a subscriber is already installed
pub fn init(level: &str, format: &str) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(normalize_level(level))
            .map_err(|e| LoggingError::FilterError(e.to_string()))?,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match LogFormat::parse(format) {
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| LoggingError::SubscriberError(e.to_string())),
        LogFormat::Text => subscriber
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| LoggingError::SubscriberError(e.to_string())),
    }
}

/// Re-export tracing macros for convenience
pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}
