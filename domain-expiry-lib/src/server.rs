//! HTTP surface: the `/metrics` route.
//!
//! Each scrape fetches its own zone list and runs its own pipeline; nothing
//! is shared between concurrent scrapes except the immutable clients. Metric
//! lines are streamed as domains resolve, and a client disconnect drops the
//! body stream, which cancels the remaining lookups.

use crate::error::ExpiryError;
use crate::exposition::{render_result, CONTENT_TYPE};
use crate::pipeline::ExpiryPipeline;
use crate::protocols::ZoneSource;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{future, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    zones: Arc<dyn ZoneSource>,
    pipeline: ExpiryPipeline,
}

impl AppState {
    pub fn new(zones: Arc<dyn ZoneSource>, pipeline: ExpiryPipeline) -> Self {
        Self { zones, pipeline }
    }
}

/// Build the exporter router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve the router on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ExpiryError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "serving /metrics");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let zones = match state.zones.list_zones().await {
        Ok(zones) => zones,
        Err(error) => {
            // The scrape yields no series this cycle.
            error!(%error, "Failed to fetch zones");
            return text_response(Body::empty());
        }
    };

    info!(zones = zones.len(), "scrape started");

    let lines = state
        .pipeline
        .run(zones.into_iter().map(|zone| zone.name))
        .filter_map(|result| future::ready(render_result(&result)))
        .map(Ok::<_, Infallible>);

    text_response(Body::from_stream(lines))
}

fn text_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::WhoisQuery;
    use crate::types::{WhoisRecord, Zone};
    use async_trait::async_trait;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    struct FixedZones(Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl ZoneSource for FixedZones {
        async fn list_zones(&self) -> Result<Vec<Zone>, ExpiryError> {
            match &self.0 {
                Ok(names) => Ok(names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| Zone {
                        id: i.to_string(),
                        name: name.to_string(),
                        status: "active".to_string(),
                    })
                    .collect()),
                Err(()) => Err(ExpiryError::zone_fetch("connection refused")),
            }
        }
    }

    struct StubWhois;

    #[async_trait]
    impl WhoisQuery for StubWhois {
        async fn query(&self, domain: &str) -> Result<WhoisRecord, ExpiryError> {
            match domain {
                "a.com" => Ok(WhoisRecord::new("Registry Expiry Date: 2030-01-15T00:00:00Z\n")),
                "b.ru" => Ok(WhoisRecord::new("paid-till:     2028-06-01T00:00:00Z\n")),
                other => Err(ExpiryError::query_failed(other, "exit status 1")),
            }
        }
    }

    fn app(zones: FixedZones) -> Router {
        let pipeline = ExpiryPipeline::new(Arc::new(StubWhois)).with_pacing(Duration::ZERO);
        router(AppState::new(Arc::new(zones), pipeline))
    }

    async fn scrape(app: Router) -> (StatusCode, String, String) {
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_lists_only_resolved_domains() {
        let (status, content_type, body) =
            scrape(app(FixedZones(Ok(vec!["a.com", "broken.com", "测试.com", "b.ru"])))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(
            body,
            "domain_expiry_time{domain=\"a.com\"} 1894665600\n\
             domain_expiry_time{domain=\"b.ru\"} 1843430400\n"
        );
    }

    #[tokio::test]
    async fn test_zone_failure_yields_empty_body() {
        let (status, content_type, body) = scrape(app(FixedZones(Err(())))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app(FixedZones(Ok(vec![])))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
