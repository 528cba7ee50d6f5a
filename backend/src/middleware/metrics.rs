//! Per-operation request counters and latency histograms.
//!
//! Every request is counted under its operation label and a `success` or
//! `failed` status; anything but a 2xx or 3xx response counts as failed.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use super::request_log::RequestSummary;

const NAMESPACE: &str = "phonebook";
const LABELS: &[&str] = &["operation", "status"];

struct Recorders {
    request_count: IntCounterVec,
    request_latency: HistogramVec,
}

/// Middleware recording `request_count` and `request_latency_seconds`.
#[derive(Clone)]
pub struct RequestMetrics {
    recorders: Arc<Recorders>,
}

impl RequestMetrics {
    /// Create the collectors and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when Prometheus rejects the registration, e.g. when
    /// the collectors already exist in `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let request_count = IntCounterVec::new(
            Opts::new("request_count", "Requests handled, by operation and status")
                .namespace(NAMESPACE),
            LABELS,
        )?;
        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "request_latency_seconds",
                "Time spent answering requests, by operation and status",
            )
            .namespace(NAMESPACE),
            LABELS,
        )?;
        registry.register(Box::new(request_count.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;
        Ok(Self {
            recorders: Arc::new(Recorders {
                request_count,
                request_latency,
            }),
        })
    }

    fn record(&self, operation: &str, status: StatusCode, started: Instant) {
        let status = if status.is_client_error() || status.is_server_error() {
            "failed"
        } else {
            "success"
        };
        let labels = [operation, status];
        self.recorders.request_count.with_label_values(&labels).inc();
        self.recorders
            .request_latency
            .with_label_values(&labels)
            .observe(started.elapsed().as_secs_f64());
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestMetricsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestMetricsMiddleware {
            service,
            metrics: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`RequestMetrics`].
pub struct RequestMetricsMiddleware<S> {
    service: S,
    metrics: RequestMetrics,
}

impl<S, B> Service<ServiceRequest> for RequestMetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let before = RequestSummary::of(req.request());
        let metrics = self.metrics.clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let result = fut.await;
            let (operation, status) = match &result {
                Ok(res) => (RequestSummary::of(res.request()).operation, res.status()),
                Err(err) => (before.operation, err.as_response_error().status_code()),
            };
            metrics.record(&operation, status, started);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::request_log::DecodedRequest;
    use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, test as actix_test, web};
    use rstest::{fixture, rstest};

    async fn create(req: HttpRequest) -> HttpResponse {
        req.extensions_mut().insert(DecodedRequest {
            operation: "add_new_profile",
            params: None,
        });
        HttpResponse::NoContent().finish()
    }

    async fn reject(req: HttpRequest) -> HttpResponse {
        req.extensions_mut().insert(DecodedRequest {
            operation: "remove_profile",
            params: None,
        });
        HttpResponse::UnprocessableEntity().finish()
    }

    #[fixture]
    fn metrics() -> RequestMetrics {
        RequestMetrics::register(&Registry::new()).expect("collectors register")
    }

    fn count(metrics: &RequestMetrics, operation: &str, status: &str) -> u64 {
        metrics
            .recorders
            .request_count
            .with_label_values(&[operation, status])
            .get()
    }

    #[rstest]
    #[actix_web::test]
    async fn counts_requests_by_operation_and_status(metrics: RequestMetrics) {
        let app = actix_test::init_service(
            App::new()
                .wrap(metrics.clone())
                .route("/phonebook", web::post().to(create))
                .route("/phonebook/{id}", web::delete().to(reject)),
        )
        .await;

        for _ in 0..2 {
            actix_test::call_service(
                &app,
                actix_test::TestRequest::post().uri("/phonebook").to_request(),
            )
            .await;
        }
        actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri("/phonebook/7").to_request(),
        )
        .await;

        assert_eq!(count(&metrics, "add_new_profile", "success"), 2);
        assert_eq!(count(&metrics, "add_new_profile", "failed"), 0);
        assert_eq!(count(&metrics, "remove_profile", "failed"), 1);
        let observed = metrics
            .recorders
            .request_latency
            .with_label_values(&["remove_profile", "failed"])
            .get_sample_count();
        assert_eq!(observed, 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn unmatched_routes_count_under_the_placeholder(metrics: RequestMetrics) {
        let app = actix_test::init_service(App::new().wrap(metrics.clone())).await;

        actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/missing").to_request(),
        )
        .await;

        assert_eq!(count(&metrics, "-", "failed"), 1);
    }

    #[rstest]
    fn registering_twice_is_rejected() {
        let registry = Registry::new();
        RequestMetrics::register(&registry).expect("first registration");

        assert!(RequestMetrics::register(&registry).is_err());
    }
}
