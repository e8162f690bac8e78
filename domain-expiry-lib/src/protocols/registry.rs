//! Registry convention lookup.
//!
//! WHOIS has no common response format. This module maps a domain to the
//! convention its registry uses for the expiry line, so the extractor knows
//! which marker to search for.

use crate::types::RegistryConvention;
use crate::utils::first_label_suffix;

/// Labels whose registries publish `paid-till` instead of `Registry Expiry Date`.
const PAID_TILL_LABELS: &[&str] = &["ru"];

/// Pick the WHOIS text convention for `domain`.
///
/// The label examined is the one following the first `.`, so
/// `example.co.uk` is looked up as `co`. Unknown labels and names without a
/// dot fall back to [`RegistryConvention::StandardExpiryField`].
pub fn resolve(domain: &str) -> RegistryConvention {
    match first_label_suffix(domain) {
        Some(label)
            if PAID_TILL_LABELS
                .iter()
                .any(|known| label.eq_ignore_ascii_case(known)) =>
        {
            RegistryConvention::PaidTillField
        }
        _ => RegistryConvention::StandardExpiryField,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ru_uses_paid_till() {
        assert_eq!(resolve("example.ru"), RegistryConvention::PaidTillField);
        assert_eq!(resolve("EXAMPLE.RU"), RegistryConvention::PaidTillField);
    }

    #[test]
    fn test_other_labels_use_standard_field() {
        for domain in ["example.com", "example.org", "example.io", "example.su"] {
            assert_eq!(
                resolve(domain),
                RegistryConvention::StandardExpiryField,
                "{} should use the standard field",
                domain
            );
        }
    }

    #[test]
    fn test_dotless_name_defaults_to_standard() {
        assert_eq!(resolve("localhost"), RegistryConvention::StandardExpiryField);
    }

    // Known limitation: the label after the first dot is used, not the
    // public suffix. These cases document the current behaviour.
    #[test]
    fn test_multi_label_suffix_uses_first_label() {
        assert_eq!(
            resolve("example.co.uk"),
            RegistryConvention::StandardExpiryField
        );
        assert_eq!(resolve("shop.ru.com"), RegistryConvention::PaidTillField);
        assert_eq!(
            resolve("www.example.ru"),
            RegistryConvention::StandardExpiryField
        );
    }
}
