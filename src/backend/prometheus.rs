//! Metrics exposition backend.

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::backend::{Handler, HandlerFuture};

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Renders the process-wide metrics registry in Prometheus text format.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }
}

impl Handler for PrometheusExporter {
    fn handle(&self, _request: Request<Body>) -> HandlerFuture {
        let body = self.handle.render();
        Box::pin(async move { ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[tokio::test]
    async fn test_renders_text_format() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = PrometheusExporter::new(recorder.handle());

        let response = exporter
            .handle(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONTENT_TYPE);
    }
}
