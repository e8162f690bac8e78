//! Expiry pipeline orchestration.
//!
//! This module provides [`ExpiryPipeline`], which turns a list of domain
//! names into a lazy stream of [`ExpiryResult`]s: filter, resolve the
//! registry convention, query WHOIS, extract the field, parse the timestamp.
//!
//! Domains are processed strictly one at a time with a fixed pause between
//! consecutive lookups, so a scrape never bursts queries at the shared WHOIS
//! infrastructure. Dropping the stream cancels whatever lookup is in flight.

use crate::error::ExpiryError;
use crate::extract::extract;
use crate::protocols::{resolve, WhoisQuery};
use crate::types::ExpiryResult;
use crate::utils::is_latin1;
use chrono::DateTime;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default spacing between consecutive WHOIS lookups.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_secs(1);

/// Smallest pacing the exporter accepts from configuration.
pub const MIN_PACING_INTERVAL: Duration = Duration::from_secs(1);

/// Sequential, paced expiry resolver.
///
/// # Example
///
/// ```rust,no_run
/// use domain_expiry_lib::{ExpiryPipeline, WhoisClient};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let pipeline = ExpiryPipeline::new(Arc::new(WhoisClient::new()));
///     let domains = vec!["example.com".to_string(), "example.ru".to_string()];
///
///     let mut results = Box::pin(pipeline.run(domains));
///     while let Some(result) = results.next().await {
///         println!("{}: {:?}", result.domain(), result.expiry_unix());
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ExpiryPipeline {
    /// WHOIS executor used for every lookup
    whois: Arc<dyn WhoisQuery>,
    /// Pause between consecutive admitted domains
    pacing: Duration,
}

/// Iteration state carried between stream polls.
struct RunState<I> {
    domains: I,
    whois: Arc<dyn WhoisQuery>,
    pacing: Duration,
    started: bool,
}

impl ExpiryPipeline {
    /// Create a pipeline with the default one-second pacing.
    pub fn new(whois: Arc<dyn WhoisQuery>) -> Self {
        Self {
            whois,
            pacing: DEFAULT_PACING_INTERVAL,
        }
    }

    /// Override the pause between consecutive lookups.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Resolve the expiry of every admitted domain, lazily and in order.
    ///
    /// Names with characters outside Latin-1 are skipped and produce no
    /// result. Every other name produces exactly one [`ExpiryResult`]; a
    /// failure on one domain is logged and reported, then the next domain is
    /// processed. The stream does no work until polled.
    pub fn run<I>(&self, domains: I) -> impl Stream<Item = ExpiryResult> + Send + 'static
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        let state = RunState {
            domains: domains.into_iter(),
            whois: Arc::clone(&self.whois),
            pacing: self.pacing,
            started: false,
        };

        stream::unfold(state, |mut state| async move {
            let domain = state.domains.by_ref().find(|domain| admit(domain))?;

            if state.started {
                tokio::time::sleep(state.pacing).await;
            }
            state.started = true;

            let result = match resolve_expiry(state.whois.as_ref(), &domain).await {
                Ok(expiry_unix) => {
                    debug!(domain = %domain, expiry_unix, "expiry resolved");
                    ExpiryResult::Resolved {
                        domain,
                        expiry_unix,
                    }
                }
                Err(error) => {
                    warn!(domain = %domain, kind = ?error.kind(), %error, "failed to resolve expiry");
                    ExpiryResult::Failed { domain, error }
                }
            };

            Some((result, state))
        })
    }

    /// Resolve a single domain without filtering or pacing.
    pub async fn check_domain(&self, domain: &str) -> Result<i64, ExpiryError> {
        resolve_expiry(self.whois.as_ref(), domain).await
    }
}

/// Latin-1 admission filter, with a debug trace for skipped names.
fn admit(domain: &str) -> bool {
    let admitted = is_latin1(domain);
    if !admitted {
        debug!(domain, "skipping non-Latin domain");
    }
    admitted
}

/// Convention → query → extract → parse for one domain.
async fn resolve_expiry(whois: &dyn WhoisQuery, domain: &str) -> Result<i64, ExpiryError> {
    let convention = resolve(domain);
    let record = whois.query(domain).await?;
    let raw = extract(&record, convention)?;
    parse_expiry(&raw)
}

/// Parse an RFC 3339 timestamp (`2030-01-15T00:00:00Z`) into Unix seconds.
pub fn parse_expiry(value: &str) -> Result<i64, ExpiryError> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.timestamp())
        .map_err(|e| ExpiryError::timestamp_parse(value, e.to_string()))
}
