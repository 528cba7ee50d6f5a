//! Access log middleware.
//!
//! Emits one structured event per request once the response is ready:
//! method, matched route pattern, decoded operation and parameters, status,
//! outcome class and elapsed time.
//! Wrap it inside [`crate::Trace`] so each event carries the request's
//! trace identifier.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::{Error, HttpMessage, HttpRequest};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info, warn};

use crate::domain::TraceId;

/// Coarse classification of a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
}

impl Outcome {
    /// Classify `status`.
    #[must_use]
    pub fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::ServerError
        } else if status.is_client_error() {
            Self::ClientError
        } else {
            Self::Success
        }
    }

    /// Label used in log events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
        }
    }
}

/// Middleware logging every request.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use phonebook::{RequestLog, Trace};
///
/// let app = App::new().wrap(RequestLog).wrap(Trace);
/// ```
#[derive(Clone)]
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddleware { service }))
    }
}

/// Service wrapper produced by [`RequestLog`].
pub struct RequestLogMiddleware<S> {
    service: S,
}

/// What the request decoder made of a request.
///
/// Left in the request extensions by the `Decoded` extractor so the access
/// log can name the operation and show its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRequest {
    /// Operation label of the endpoint, e.g. `add_new_profile`.
    pub operation: &'static str,
    /// The decoded model as JSON; absent when decoding failed.
    pub params: Option<String>,
}

/// Labels of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    /// HTTP method.
    pub method: String,
    /// Matched route pattern, or the raw path when nothing matched.
    pub route: String,
    /// Operation label, `-` for endpoints without decoded input.
    pub operation: String,
    /// Decoded parameters as JSON.
    pub params: Option<String>,
}

impl RequestSummary {
    /// Read the labels of `req`.
    #[must_use]
    pub fn of(req: &HttpRequest) -> Self {
        let decoded = req.extensions().get::<DecodedRequest>().cloned();
        Self {
            method: req.method().to_string(),
            route: req.match_pattern().unwrap_or_else(|| req.path().to_owned()),
            operation: decoded
                .as_ref()
                .map_or_else(|| "-".to_owned(), |decoded| decoded.operation.to_owned()),
            params: decoded.and_then(|decoded| decoded.params),
        }
    }
}

fn log_completion(summary: &RequestSummary, status: StatusCode, elapsed_ms: u64) {
    let outcome = Outcome::of(status);
    let trace_id = TraceId::current().map(|id| id.to_string());
    let trace_id = trace_id.as_deref().unwrap_or("-");
    let RequestSummary {
        method,
        route,
        operation,
        params,
    } = summary;
    let params = params.as_deref().unwrap_or("-");
    match outcome {
        Outcome::Success => info!(
            method,
            route,
            operation,
            params,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms,
            trace_id,
            "request completed"
        ),
        Outcome::ClientError => warn!(
            method,
            route,
            operation,
            params,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms,
            trace_id,
            "request rejected"
        ),
        Outcome::ServerError => error!(
            method,
            route,
            operation,
            params,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms,
            trace_id,
            "request failed"
        ),
    }
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
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
        let fut = self.service.call(req);
        Box::pin(async move {
            let result = fut.await;
            let (summary, status) = match &result {
                Ok(res) => (RequestSummary::of(res.request()), res.status()),
                Err(err) => (before, err.as_response_error().status_code()),
            };
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            log_completion(&summary, status, elapsed_ms);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Trace;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::OK, Outcome::Success)]
    #[case(StatusCode::NO_CONTENT, Outcome::Success)]
    #[case(StatusCode::UNPROCESSABLE_ENTITY, Outcome::ClientError)]
    #[case(StatusCode::NOT_FOUND, Outcome::ClientError)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, Outcome::ServerError)]
    fn classifies_statuses(#[case] status: StatusCode, #[case] expected: Outcome) {
        assert_eq!(Outcome::of(status), expected);
    }

    #[actix_web::test]
    async fn passes_responses_through_unchanged() {
        let app = actix_test::init_service(
            App::new().wrap(RequestLog).wrap(Trace).route(
                "/items/{id}",
                web::get().to(|| async { HttpResponse::Accepted().body("ok") }),
            ),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/items/7").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert!(res.headers().contains_key("trace-id"));
        assert_eq!(actix_test::read_body(res).await, "ok");
    }

    #[rstest]
    fn summaries_carry_the_decoded_request() {
        let req = actix_test::TestRequest::put()
            .uri("/phonebook/7")
            .to_http_request();
        req.extensions_mut().insert(DecodedRequest {
            operation: "update_profile",
            params: Some(r#"{"id":"7"}"#.to_owned()),
        });

        let summary = RequestSummary::of(&req);

        assert_eq!(
            summary,
            RequestSummary {
                method: "PUT".to_owned(),
                route: "/phonebook/7".to_owned(),
                operation: "update_profile".to_owned(),
                params: Some(r#"{"id":"7"}"#.to_owned()),
            }
        );
    }

    #[rstest]
    fn summaries_without_decoding_use_placeholders() {
        let req = actix_test::TestRequest::get().uri("/healthy").to_http_request();

        let summary = RequestSummary::of(&req);

        assert_eq!(summary.operation, "-");
        assert_eq!(summary.params, None);
    }
}
