//! Utility functions for domain processing and validation.

use crate::error::ExpiryError;

/// Highest code point admitted by the Latin-1 filter.
const MAX_LATIN1: char = '\u{FF}';

/// Check that every character of `domain` lies within Latin-1.
///
/// Internationalized names (Cyrillic, CJK, ...) fail this check and are
/// skipped by the pipeline without a lookup. This is a lossy filter, not an
/// encoding normalization: no punycode conversion is attempted.
pub fn is_latin1(domain: &str) -> bool {
    domain.chars().all(|c| c <= MAX_LATIN1)
}

/// Return the label that follows the first `.` in `domain`.
///
/// For `example.com` this is `com`, but for `example.co.uk` it is `co`:
/// multi-label public suffixes are not recognised.
pub fn first_label_suffix(domain: &str) -> Option<&str> {
    domain.split('.').nth(1)
}

/// Validate a domain name before it is handed to a WHOIS process.
///
/// Checks basic FQDN structure: at least two labels, each 1-63 characters of
/// alphanumerics and hyphens, no leading or trailing hyphen, total length at
/// most 253. A leading `-` would otherwise be read as a flag by the whois
/// utility.
pub fn validate_domain(domain: &str) -> Result<(), ExpiryError> {
    if domain.is_empty() {
        return Err(ExpiryError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.len() > 253 {
        return Err(ExpiryError::invalid_domain(
            domain,
            "Domain name longer than 253 bytes",
        ));
    }

    if !domain.contains('.') {
        return Err(ExpiryError::invalid_domain(
            domain,
            "Domain must contain at least one dot",
        ));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(ExpiryError::invalid_domain(domain, "Empty label"));
        }

        if label.len() > 63 {
            return Err(ExpiryError::invalid_domain(
                domain,
                format!("Label '{}' longer than 63 bytes", label),
            ));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(ExpiryError::invalid_domain(
                domain,
                format!("Label '{}' starts or ends with a hyphen", label),
            ));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(ExpiryError::invalid_domain(
                domain,
                format!("Label '{}' contains invalid characters", label),
            ));
        }
    }

    Ok(())
}
