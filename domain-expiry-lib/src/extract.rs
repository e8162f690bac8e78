//! Expiry field extraction from raw WHOIS text.
//!
//! Extraction only locates the raw value; parsing it into a timestamp is the
//! pipeline's job.

use crate::error::ExpiryError;
use crate::types::{RegistryConvention, WhoisRecord};

const STANDARD_MARKER: &str = "Registry Expiry Date";
const PAID_TILL_MARKER: &str = "paid-till";

impl RegistryConvention {
    /// Literal text that identifies the expiry line.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::StandardExpiryField => STANDARD_MARKER,
            Self::PaidTillField => PAID_TILL_MARKER,
        }
    }

    /// Pick the value token out of a line known to contain the marker.
    fn value_token<'a>(&self, line: &'a str) -> Option<&'a str> {
        match self {
            Self::StandardExpiryField => line.split_whitespace().last(),
            Self::PaidTillField => line.split_whitespace().nth(1),
        }
    }
}

/// Pull the raw expiry string out of `record` according to `convention`.
///
/// The first line containing the convention's marker (case-sensitive) is
/// used:
///
/// ```text
/// Registry Expiry Date: 2030-01-15T00:00:00Z     -> last token
/// paid-till:     2028-06-01T00:00:00Z            -> second token
/// ```
///
/// # Errors
///
/// Returns [`ExpiryError::FieldNotFound`] when no line carries the marker, or
/// the matching line has no token at the expected position. A bare
/// `Registry Expiry Date:` line yields `Date:`, which then fails timestamp
/// parsing.
pub fn extract(record: &WhoisRecord, convention: RegistryConvention) -> Result<String, ExpiryError> {
    let marker = convention.marker();

    let line = record
        .lines()
        .find(|line| line.contains(marker))
        .ok_or_else(|| ExpiryError::field_not_found(marker))?;

    convention
        .value_token(line)
        .map(str::to_string)
        .ok_or_else(|| ExpiryError::field_not_found(marker))
}
