//! Error handling for expiry resolution.
//!
//! A single error type covers zone listing, WHOIS queries, field extraction
//! and timestamp parsing. Per-domain variants are reported inside
//! [`ExpiryResult`](crate::ExpiryResult) and never abort a scrape; only
//! zone listing and configuration failures stop work.

use std::fmt;
use std::time::Duration;

/// Main error type for expiry resolution.
#[derive(Debug, Clone)]
pub enum ExpiryError {
    /// The zone-listing API was unreachable or returned something unusable
    ZoneFetchFailed {
        message: String,
        status_code: Option<u16>,
    },

    /// The WHOIS lookup could not be completed (spawn failure, non-zero exit, timeout)
    QueryFailed {
        domain: String,
        message: String,
    },

    /// The convention's marker line was absent from the WHOIS text
    FieldNotFound {
        marker: &'static str,
    },

    /// The extracted value was not an RFC 3339 timestamp
    TimestampParseFailed {
        value: String,
        message: String,
    },

    /// Domain name rejected before any lookup was attempted
    InvalidDomain {
        domain: String,
        reason: String,
    },

    /// Configuration errors (missing token, bad values)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

/// Coarse classification of an [`ExpiryError`], used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ZoneFetchFailed,
    QueryFailed,
    FieldNotFound,
    TimestampParseFailed,
    InvalidDomain,
    Config,
    Internal,
}

impl ExpiryError {
    /// Create a new zone fetch error.
    pub fn zone_fetch<M: Into<String>>(message: M) -> Self {
        Self::ZoneFetchFailed {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new zone fetch error carrying the HTTP status.
    pub fn zone_fetch_with_status<M: Into<String>>(message: M, status_code: u16) -> Self {
        Self::ZoneFetchFailed {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new WHOIS query error.
    pub fn query_failed<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::QueryFailed {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a query error for a lookup that exceeded its time budget.
    pub fn query_timeout<D: Into<String>>(domain: D, duration: Duration) -> Self {
        Self::QueryFailed {
            domain: domain.into(),
            message: format!("WHOIS query timed out after {:?}", duration),
        }
    }

    pub fn field_not_found(marker: &'static str) -> Self {
        Self::FieldNotFound { marker }
    }

    /// Create a new timestamp parse error.
    pub fn timestamp_parse<V: Into<String>, M: Into<String>>(value: V, message: M) -> Self {
        Self::TimestampParseFailed {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZoneFetchFailed { .. } => ErrorKind::ZoneFetchFailed,
            Self::QueryFailed { .. } => ErrorKind::QueryFailed,
            Self::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            Self::TimestampParseFailed { .. } => ErrorKind::TimestampParseFailed,
            Self::InvalidDomain { .. } => ErrorKind::InvalidDomain,
            Self::ConfigError { .. } | Self::FileError { .. } => ErrorKind::Config,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ExpiryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoneFetchFailed {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "Zone fetch failed (HTTP {}): {}", code, message)
                } else {
                    write!(f, "Zone fetch failed: {}", message)
                }
            }
            Self::QueryFailed { domain, message } => {
                write!(f, "WHOIS query for '{}' failed: {}", domain, message)
            }
            Self::FieldNotFound { marker } => {
                write!(f, "No '{}' line in WHOIS response", marker)
            }
            Self::TimestampParseFailed { value, message } => {
                write!(f, "Cannot parse expiry timestamp '{}': {}", value, message)
            }
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpiryError {}

impl From<reqwest::Error> for ExpiryError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::zone_fetch_with_status("HTTP request failed", status.as_u16())
        } else if err.is_timeout() {
            Self::zone_fetch(format!("HTTP request timed out: {}", err))
        } else if err.is_connect() {
            Self::zone_fetch(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::zone_fetch(format!("Malformed response body: {}", err))
        } else {
            Self::zone_fetch(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for ExpiryError {
    fn from(err: serde_json::Error) -> Self {
        Self::zone_fetch(format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for ExpiryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ExpiryError::query_failed("a.com", "exit 1").kind(),
            ErrorKind::QueryFailed
        );
        assert_eq!(
            ExpiryError::field_not_found("paid-till").kind(),
            ErrorKind::FieldNotFound
        );
        assert_eq!(
            ExpiryError::file_error("/nope", "missing").kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExpiryError::query_timeout("example.com", Duration::from_secs(10));
        let text = err.to_string();
        assert!(text.contains("example.com"));
        assert!(text.contains("timed out"));

        let err = ExpiryError::zone_fetch_with_status("unauthorized", 403);
        assert_eq!(err.to_string(), "Zone fetch failed (HTTP 403): unauthorized");
    }

    #[test]
    fn test_json_error_is_zone_fetch() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ExpiryError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::ZoneFetchFailed);
    }
}
