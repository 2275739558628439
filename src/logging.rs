//! Logging setup for scoped-injector
//!
//! Resolution steps are emitted as `trace!`/`debug!` events under the
//! `scoped_injector` target. This module installs a subscriber for them.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Human-readable output
//!
//! # Example
//!
//! ```rust,ignore
//! use scoped_injector::logging;
//!
//! logging::init();
//!
//! // Or trace only the injector's own events
//! logging::builder()
//!     .trace()
//!     .injector_only()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "scoped_injector";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Every cache hit, delegation and wiring step
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Scope creation, registrations and misses
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show scoped-injector logs
    pub fn injector_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Useful when several threads resolve through the same scope
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    fn directive(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the subscriber globally.
    ///
    /// Without `logging-json`, a JSON request falls back to the default
    /// formatter.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.directive());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => tracing_subscriber::registry().with(filter).with(layer).init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty())
                .init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .init(),
        }
    }

    /// Initialize (no-op when subscriber features not available)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {
        let _ = self.directive();
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings.
///
/// JSON if `logging-json` is enabled, otherwise pretty output.
pub fn init() {
    #[cfg(feature = "logging-json")]
    init_json();
    #[cfg(not(feature = "logging-json"))]
    init_pretty();
}

/// JSON structured logging at DEBUG
pub fn init_json() {
    builder().json().debug().init();
}

/// Human-readable logging at DEBUG
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Trace only this crate's events
pub fn init_injector_only() {
    builder().injector_only().trace().init();
}
