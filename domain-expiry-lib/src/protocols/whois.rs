//! WHOIS query execution.
//!
//! Lookups go through the system `whois` utility. The domain is passed as a
//! separate argv entry after validation, never spliced into a shell command
//! line, and each lookup is bounded by an explicit timeout.

use crate::error::ExpiryError;
use crate::types::WhoisRecord;
use crate::utils::validate_domain;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default program used for lookups.
pub const DEFAULT_WHOIS_PROGRAM: &str = "whois";

/// Default time budget for a single lookup.
pub const DEFAULT_WHOIS_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for the startup availability check.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest stderr excerpt carried into an error message.
const STDERR_EXCERPT: usize = 200;

/// Anything that can fetch the raw WHOIS text for a domain.
///
/// The pipeline only depends on this trait, so tests can substitute canned
/// records for real lookups.
#[async_trait]
pub trait WhoisQuery: Send + Sync {
    /// Fetch the WHOIS record for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpiryError::QueryFailed`] when the lookup cannot be
    /// completed, or [`ExpiryError::InvalidDomain`] when the name is rejected
    /// before any lookup is attempted. Implementations never retry.
    async fn query(&self, domain: &str) -> Result<WhoisRecord, ExpiryError>;
}

/// WHOIS client backed by an external `whois` process.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Program to execute
    program: String,
    /// Arguments placed before the domain (e.g. `-h whois.tcinet.ru`)
    args: Vec<String>,
    /// Timeout for WHOIS requests
    timeout: Duration,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_WHOIS_PROGRAM.to_string(),
            args: Vec::new(),
            timeout: DEFAULT_WHOIS_TIMEOUT,
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Create a client that runs `program args... <domain>`.
    pub fn with_command<P: Into<String>>(program: P, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the lookup process and collect its stdout.
    async fn execute_whois_command(&self, domain: &str) -> Result<WhoisRecord, ExpiryError> {
        debug!(domain, program = %self.program, "running whois");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(domain)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ExpiryError::query_failed(
                    domain,
                    format!(
                        "Failed to execute {}: {}. Make sure 'whois' is installed.",
                        self.program, e
                    ),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(ExpiryError::query_failed(
                domain,
                format!("{} exited with {}: {}", self.program, output.status, excerpt),
            ));
        }

        let record = WhoisRecord::new(String::from_utf8_lossy(&output.stdout).into_owned());
        if record.is_empty() {
            return Err(ExpiryError::query_failed(domain, "Empty WHOIS response"));
        }

        Ok(record)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisQuery for WhoisClient {
    async fn query(&self, domain: &str) -> Result<WhoisRecord, ExpiryError> {
        validate_domain(domain)?;

        // Dropping the inner future on timeout kills the child (kill_on_drop).
        match tokio::time::timeout(self.timeout, self.execute_whois_command(domain)).await {
            Ok(result) => result,
            Err(_) => Err(ExpiryError::query_timeout(domain, self.timeout)),
        }
    }
}

/// Check whether `program` can be spawned at all.
///
/// Used at startup to warn early when the whois utility is missing; the
/// exporter still starts, and every lookup then reports `QueryFailed`.
/// A program that spawns but does not exit within a few seconds is killed
/// and counted as available.
pub async fn is_whois_available(program: &str) -> bool {
    let mut command = Command::new(program);
    command.arg("--version");
    spawns_within(&mut command, AVAILABILITY_TIMEOUT).await
}

async fn spawns_within(command: &mut Command, limit: Duration) -> bool {
    match tokio::time::timeout(limit, command.kill_on_drop(true).output()).await {
        Ok(result) => result.is_ok(),
        Err(_) => {
            debug!("availability check timed out after {:?}", limit);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Client running `sh -c <script> whois-stub <domain>`; the domain is `$1`.
    #[cfg(unix)]
    fn shell_client(script: &str, timeout: Duration) -> WhoisClient {
        WhoisClient::with_command(
            "sh",
            vec!["-c".to_string(), script.to_string(), "whois-stub".to_string()],
            timeout,
        )
    }

    #[test]
    fn test_whois_client_creation() {
        let client = WhoisClient::new();
        assert_eq!(client.timeout(), DEFAULT_WHOIS_TIMEOUT);
        assert_eq!(client.program(), "whois");

        let custom_client = WhoisClient::with_timeout(Duration::from_secs(3));
        assert_eq!(custom_client.timeout(), Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_query_returns_stdout() {
        let client = shell_client(
            r#"printf 'Domain Name: %s\nRegistry Expiry Date: 2030-01-15T00:00:00Z\n' "$1""#,
            Duration::from_secs(5),
        );

        let record = client.query("example.com").await.unwrap();
        assert!(record.as_str().contains("Domain Name: example.com"));
        assert!(record.as_str().contains("Registry Expiry Date"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_metacharacters_rejected_before_spawn() {
        let client = shell_client(r#"printf '%s' "$1""#, Duration::from_secs(5));
        let err = client.query("a.com;id").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDomain);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_query_failure() {
        let client = shell_client(
            "echo 'connect: Network is unreachable' >&2; exit 2",
            Duration::from_secs(5),
        );
        let err = client.query("example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert!(err.to_string().contains("Network is unreachable"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_query_failure() {
        let client = shell_client("exit 0", Duration::from_secs(5));
        let err = client.query("example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_query_failure() {
        let client = shell_client("sleep 5", Duration::from_millis(100));
        let err = client.query("example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert!(err.to_string().contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_availability_check_is_bounded() {
        let mut hanging = Command::new("sh");
        hanging.args(["-c", "sleep 30"]);

        let started = std::time::Instant::now();
        assert!(spawns_within(&mut hanging, Duration::from_millis(200)).await);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_program_is_query_failure() {
        let client = WhoisClient::with_command(
            "definitely-not-a-whois-binary",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = client.query("example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert!(!is_whois_available("definitely-not-a-whois-binary").await);
    }
}
