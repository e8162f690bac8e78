//! Metrics text rendering.
//!
//! One line per resolved domain:
//!
//! ```text
//! domain_expiry_time{domain="example.com"} 1894665600
//! ```
//!
//! Failed domains render nothing; the format has no way to encode errors.

use crate::types::ExpiryResult;

/// Metric name used for every line.
pub const METRIC_NAME: &str = "domain_expiry_time";

/// Content type of the `/metrics` response.
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Render one metric line, including the trailing newline.
pub fn render_line(domain: &str, expiry_unix: i64) -> String {
    format!(
        "{}{{domain=\"{}\"}} {}\n",
        METRIC_NAME,
        escape_label_value(domain),
        expiry_unix
    )
}

/// Render a pipeline result, or `None` for failures.
pub fn render_result(result: &ExpiryResult) -> Option<String> {
    match result {
        ExpiryResult::Resolved {
            domain,
            expiry_unix,
        } => Some(render_line(domain, *expiry_unix)),
        ExpiryResult::Failed { .. } => None,
    }
}

/// Escape a label value for the text format (`\`, `"` and newline).
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpiryError;

    #[test]
    fn test_render_line() {
        assert_eq!(
            render_line("example.com", 1_894_665_600),
            "domain_expiry_time{domain=\"example.com\"} 1894665600\n"
        );
    }

    #[test]
    fn test_render_result_skips_failures() {
        let ok = ExpiryResult::Resolved {
            domain: "b.ru".to_string(),
            expiry_unix: 1_843_430_400,
        };
        assert_eq!(
            render_result(&ok).as_deref(),
            Some("domain_expiry_time{domain=\"b.ru\"} 1843430400\n")
        );

        let failed = ExpiryResult::Failed {
            domain: "c.com".to_string(),
            error: ExpiryError::field_not_found("Registry Expiry Date"),
        };
        assert_eq!(render_result(&failed), None);
    }

    #[test]
    fn test_label_value_is_escaped() {
        assert_eq!(
            render_line("a\"b\\c\nd", 1),
            "domain_expiry_time{domain=\"a\\\"b\\\\c\\nd\"} 1\n"
        );
    }
}
