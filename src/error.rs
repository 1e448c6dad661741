#![allow(dead_code)]
use std::fmt;
use thiserror::Error;

/// Main error type for the fluxgate data plane
#[derive(Error, Debug, Clone)]
pub enum FluxgateError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Routing-rule annotation rejected at validation
    #[error("Invalid annotation content: {message}")]
    Annotation { message: String },

    /// Payload could not be serialized or deserialized
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Shared state store errors
    #[error("State store error: {message}")]
    Store { message: String },

    /// Synchronization channel transport errors
    #[error("Sync channel error: {message}")]
    Channel { message: String },

    /// File system and watcher errors
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FluxgateError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an annotation validation error
    pub fn annotation<S: Into<String>>(message: S) -> Self {
        Self::Annotation {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a state store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a sync channel error
    pub fn channel<S: Into<String>>(message: S) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if the error leaves the routing pipeline intact.
    ///
    /// Recoverable errors degrade one decision (empty policy list, rejected
    /// rule, failed push) while requests keep flowing; the caller logs and
    /// moves on instead of propagating.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FluxgateError::Annotation { .. }
                | FluxgateError::Serialization { .. }
                | FluxgateError::Channel { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FluxgateError::Config { .. } => ErrorSeverity::Critical,
            FluxgateError::Store { .. } => ErrorSeverity::High,
            FluxgateError::Internal { .. } => ErrorSeverity::High,
            FluxgateError::Channel { .. } => ErrorSeverity::Medium,
            FluxgateError::Io { .. } => ErrorSeverity::Medium,
            FluxgateError::Annotation { .. } => ErrorSeverity::Low,
            FluxgateError::Serialization { .. } => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Result type alias for fluxgate operations
pub type FluxgateResult<T> = Result<T, FluxgateError>;

/// Convert from anyhow::Error to FluxgateError
impl From<anyhow::Error> for FluxgateError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to known error types first
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return FluxgateError::io(io_err.to_string());
        }

        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            return FluxgateError::channel(format!("HTTP error: {}", hyper_err));
        }

        // Default to internal error
        FluxgateError::internal(err.to_string())
    }
}

/// Convert from std::io::Error to FluxgateError
impl From<std::io::Error> for FluxgateError {
    fn from(err: std::io::Error) -> Self {
        FluxgateError::io(err.to_string())
    }
}

/// Convert from hyper::Error to FluxgateError
impl From<hyper::Error> for FluxgateError {
    fn from(err: hyper::Error) -> Self {
        FluxgateError::channel(format!("HTTP error: {}", err))
    }
}

/// Convert from hyper::http::Error to FluxgateError
impl From<hyper::http::Error> for FluxgateError {
    fn from(err: hyper::http::Error) -> Self {
        FluxgateError::channel(format!("HTTP error: {}", err))
    }
}

/// Convert from toml::de::Error to FluxgateError
impl From<toml::de::Error> for FluxgateError {
    fn from(err: toml::de::Error) -> Self {
        FluxgateError::config(format!("TOML parsing error: {}", err))
    }
}

/// Convert from notify::Error to FluxgateError
impl From<notify::Error> for FluxgateError {
    fn from(err: notify::Error) -> Self {
        FluxgateError::io(format!("File watching error: {}", err))
    }
}

/// Convert from serde_json::Error to FluxgateError
impl From<serde_json::Error> for FluxgateError {
    fn from(err: serde_json::Error) -> Self {
        FluxgateError::serialization(format!("JSON error: {}", err))
    }
}
