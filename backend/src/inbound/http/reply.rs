//! Response encoding for handler results.
//!
//! A handler returns a [`Reply`]: a body to serialise, an empty success, or
//! an error to hand to the error encoder. Keeping failure as a variant lets a
//! handler forward a use-case result without unpacking it first.

use actix_web::body::BoxBody;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::domain::Error;

/// Content type attached to every JSON reply.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Body written for `204 No Content`: an empty JSON string.
const EMPTY_JSON_STRING: &str = "\"\"";

/// Outcome of a handler, encoded as an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// `200 OK` with `T` serialised as JSON.
    Content(T),
    /// `204 No Content`.
    NoContent,
    /// The error's own status and body.
    Failed(Error),
}

impl<T> Reply<T> {
    /// `NoContent` on success, `Failed` otherwise.
    pub fn done(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self::NoContent,
            Err(err) => Self::Failed(err),
        }
    }
}

impl<T> From<Option<T>> for Reply<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NoContent, Self::Content)
    }
}

impl<T> From<Result<T, Error>> for Reply<T> {
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(content) => Self::Content(content),
            Err(err) => Self::Failed(err),
        }
    }
}

impl<T> From<Error> for Reply<T> {
    fn from(value: Error) -> Self {
        Self::Failed(value)
    }
}

fn json_response(mut builder: actix_web::HttpResponseBuilder, body: String) -> HttpResponse {
    builder
        .insert_header((
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        ))
        .body(body)
}

impl<T: Serialize> Responder for Reply<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        match self {
            Self::Content(content) => match serde_json::to_string(&content) {
                Ok(body) => json_response(HttpResponse::Ok(), body),
                Err(err) => {
                    error!(error = %err, "failed to serialise response body");
                    Error::internal(format!("failed to serialise response: {err}"))
                        .error_response()
                }
            },
            Self::NoContent => json_response(HttpResponse::NoContent(), EMPTY_JSON_STRING.to_owned()),
            Self::Failed(err) => err.error_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;
    use serde_json::json;

    async fn encode<T: Serialize>(reply: Reply<T>) -> (StatusCode, Option<String>, String) {
        let req = TestRequest::default().to_http_request();
        let response = reply.respond_to(&req);
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body()).await.expect("body readable");
        let body = String::from_utf8(bytes.to_vec()).expect("utf8 body");
        (status, content_type, body)
    }

    #[rstest]
    #[actix_web::test]
    async fn content_is_serialised_with_json_content_type() {
        let (status, content_type, body) = encode(Reply::Content(json!({"id": 1}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(body, r#"{"id":1}"#);
    }

    #[rstest]
    #[actix_web::test]
    async fn absent_value_is_no_content_with_empty_json_string() {
        let (status, _, body) = encode(Reply::<String>::from(None)).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, "\"\"");
    }

    #[rstest]
    #[actix_web::test]
    async fn failed_reply_surfaces_the_error_instead_of_a_body() {
        let reply = Reply::<Vec<u8>>::from(Err(Error::invalid_request("profile_not_exist")));

        let (status, _, body) = encode(reply).await;
        let body: serde_json::Value = serde_json::from_str(&body).expect("error json");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("profile_not_exist"));
        assert_eq!(body["code"], json!("invalid_request"));
    }

    #[rstest]
    #[case(Ok(()), StatusCode::NO_CONTENT)]
    #[case(Err(Error::internal("db down")), StatusCode::INTERNAL_SERVER_ERROR)]
    #[actix_web::test]
    async fn done_maps_unit_results(
        #[case] result: Result<(), Error>,
        #[case] expected: StatusCode,
    ) {
        let (status, _, _) = encode(Reply::<()>::done(result)).await;
        assert_eq!(status, expected);
    }
}
