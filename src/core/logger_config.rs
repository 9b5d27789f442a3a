//! Per-logger level gates

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// Level gates for one pooled logger
///
/// `error` and `critical` are always enabled: constructors force them on and
/// [`LoggerConfig::set_level`] refuses to turn them off.
///
/// # Example
///
/// ```
/// use relay_logger_pool::{LogLevel, LoggerConfig};
///
/// let mut config = LoggerConfig::new("uploader");
/// assert!(!config.is_enabled(LogLevel::Debug));
/// assert!(config.is_enabled(LogLevel::Info));
///
/// assert!(!config.set_level(LogLevel::Error, false));
/// assert!(config.is_enabled(LogLevel::Error));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggerConfig {
    service_name: String,
    debug_enabled: bool,
    warning_enabled: bool,
    info_enabled: bool,
    error_enabled: bool,
    critical_enabled: bool,
}

impl LoggerConfig {
    /// Default gates: debug off, info and warning on
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_levels(service_name, false, true, true)
    }

    pub fn with_levels(
        service_name: impl Into<String>,
        debug: bool,
        warning: bool,
        info: bool,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            debug_enabled: debug,
            warning_enabled: warning,
            info_enabled: info,
            error_enabled: true,
            critical_enabled: true,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Debug => self.debug_enabled,
            LogLevel::Info => self.info_enabled,
            LogLevel::Warning => self.warning_enabled,
            LogLevel::Error => self.error_enabled,
            LogLevel::Critical => self.critical_enabled,
        }
    }

    /// Toggle a gate, returning `false` if the level cannot be changed
    pub fn set_level(&mut self, level: LogLevel, enabled: bool) -> bool {
        match level {
            LogLevel::Debug => self.debug_enabled = enabled,
            LogLevel::Info => self.info_enabled = enabled,
            LogLevel::Warning => self.warning_enabled = enabled,
            LogLevel::Error | LogLevel::Critical => return false,
        }
        true
    }

    /// Apply a partial update; absent fields are left unchanged
    pub fn apply(&mut self, update: &LevelUpdate) {
        if let Some(debug) = update.debug {
            self.debug_enabled = debug;
        }
        if let Some(warning) = update.warning {
            self.warning_enabled = warning;
        }
        if let Some(info) = update.info {
            self.info_enabled = info;
        }
    }
}

/// Partial update of the configurable gates
///
/// Deserializes from request bodies such as `{"debug": true}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpdate {
    pub debug: Option<bool>,
    pub warning: Option<bool>,
    pub info: Option<bool>,
}

impl LevelUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn warning(mut self, enabled: bool) -> Self {
        self.warning = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn info(mut self, enabled: bool) -> Self {
        self.info = Some(enabled);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.debug.is_none() && self.warning.is_none() && self.info.is_none()
    }
}
