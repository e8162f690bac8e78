//! Core data types for expiry resolution.
//!
//! Everything here is transient: created while serving one scrape and
//! dropped once the response has been written.

use crate::error::{ErrorKind, ExpiryError};
use serde::{Deserialize, Serialize};

/// Textual convention a WHOIS registry uses for the expiry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryConvention {
    /// `Registry Expiry Date: <timestamp>`, value is the last token
    #[serde(rename = "standard")]
    StandardExpiryField,

    /// `paid-till: <timestamp>`, value is the second token
    #[serde(rename = "paid-till")]
    PaidTillField,
}

/// Raw text returned by one WHOIS lookup.
///
/// No structure is assumed beyond line-oriented `key: value` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisRecord {
    text: String,
}

impl WhoisRecord {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Outcome of resolving one domain's expiry.
///
/// Exactly one is produced per admitted domain, tagged with that domain.
#[derive(Debug, Clone)]
pub enum ExpiryResult {
    /// The expiry was found and parsed
    Resolved { domain: String, expiry_unix: i64 },

    /// Some stage failed; the scrape carries on with the next domain
    Failed { domain: String, error: ExpiryError },
}

impl ExpiryResult {
    /// The domain this result belongs to.
    pub fn domain(&self) -> &str {
        match self {
            Self::Resolved { domain, .. } | Self::Failed { domain, .. } => domain,
        }
    }

    /// Expiry as Unix seconds, if resolution succeeded.
    pub fn expiry_unix(&self) -> Option<i64> {
        match self {
            Self::Resolved { expiry_unix, .. } => Some(*expiry_unix),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExpiryError> {
        match self {
            Self::Resolved { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(ExpiryError::kind)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// A DNS zone managed under the registrar account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Envelope of the zone-listing response: `{ "result": [ ... ] }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ZoneListResponse {
    pub(crate) result: Vec<Zone>,
}

impl std::fmt::Display for RegistryConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryConvention::StandardExpiryField => write!(f, "Registry Expiry Date"),
            RegistryConvention::PaidTillField => write!(f, "paid-till"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_result_accessors() {
        let ok = ExpiryResult::Resolved {
            domain: "a.com".to_string(),
            expiry_unix: 42,
        };
        assert_eq!(ok.domain(), "a.com");
        assert_eq!(ok.expiry_unix(), Some(42));
        assert!(ok.error_kind().is_none());

        let failed = ExpiryResult::Failed {
            domain: "b.ru".to_string(),
            error: ExpiryError::field_not_found("paid-till"),
        };
        assert_eq!(failed.domain(), "b.ru");
        assert_eq!(failed.expiry_unix(), None);
        assert_eq!(failed.error_kind(), Some(ErrorKind::FieldNotFound));
    }

    #[test]
    fn test_zone_list_decodes_without_status() {
        let body = r#"{"result":[{"id":"z1","name":"example.com"}],"success":true}"#;
        let parsed: ZoneListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.len(), 1);
        assert_eq!(parsed.result[0].name, "example.com");
        assert_eq!(parsed.result[0].status, "");
    }
}
