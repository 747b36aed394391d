// src/server/handler.rs
use hyper::{Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tower::Service;

use crate::config::MetricsConfig;
use crate::health::HealthAggregator;
use crate::metrics::MetricsRegistry;

/// Routes the two endpoints this service exposes. `/health` always answers
/// 200 with a structured report; degradation lives in the report content,
/// never in the transport status, so monitors can tell "degraded" apart
/// from "the health endpoint is broken".
#[derive(Clone)]
pub struct RequestHandler {
    aggregator: Arc<HealthAggregator>,
    metrics: Arc<MetricsRegistry>,
    metrics_config: MetricsConfig,
}

impl RequestHandler {
    pub fn new(
        aggregator: Arc<HealthAggregator>,
        metrics: Arc<MetricsRegistry>,
        metrics_config: MetricsConfig,
    ) -> Self {
        Self {
            aggregator,
            metrics,
            metrics_config,
        }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let response = match (req.method(), req.uri().path()) {
                (&Method::GET, "/health") => {
                    let report = handler.aggregator.check().await;
                    let body = serde_json::to_vec(&report)?;
                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", "application/json")
                        .body(Body::from(body))
                        .unwrap()
                }
                (&Method::GET, path)
                    if handler.metrics_config.enabled
                        && path == handler.metrics_config.path =>
                {
                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", "text/plain; version=0.0.4")
                        .body(Body::from(handler.metrics.gather()))
                        .unwrap()
                }
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("Not Found"))
                    .unwrap(),
            };

            Ok(response)
        })
    }
}
