//! Cross-origin policy for browser clients.

use actix_cors::Cors;
use actix_web::http::{Method, header};

/// Headers a browser may send on cross-origin requests.
pub const ALLOWED_HEADERS: [&str; 6] = [
    "Accept",
    "Authorization",
    "Content-Type",
    "X-CSRF-Token",
    "Client-ID",
    "Client-Secret",
];

/// Preflight answers are cached by browsers for this many seconds.
pub const MAX_AGE_SECS: usize = 300;

/// Policy admitting any origin with credentials.
///
/// The origin is echoed back rather than answered with `*` so credentialed
/// requests stay valid. Wrap it outermost: preflight requests are answered
/// before any other middleware runs.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use phonebook::middleware::cors::cors_policy;
///
/// let app = App::new().wrap(cors_policy());
/// ```
#[must_use]
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allowed_headers(ALLOWED_HEADERS)
        .expose_headers([header::LINK])
        .supports_credentials()
        .max_age(MAX_AGE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    const ORIGIN: &str = "https://contacts.example";

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn header_value<'a, B>(res: &'a ServiceResponse<B>, name: &str) -> Option<&'a str> {
        res.headers().get(name).and_then(|value| value.to_str().ok())
    }

    #[rstest]
    #[case("PUT")]
    #[case("DELETE")]
    #[case("PATCH")]
    #[actix_web::test]
    async fn preflights_admit_the_listed_methods(#[case] method: &str) {
        let app = actix_test::init_service(
            App::new()
                .wrap(cors_policy())
                .route("/v1/phonebook", web::get().to(ok)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/v1/phonebook")
                .insert_header((header::ORIGIN, ORIGIN))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, method))
                .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            header_value(&res, "access-control-allow-origin"),
            Some(ORIGIN)
        );
        assert_eq!(
            header_value(&res, "access-control-allow-credentials"),
            Some("true")
        );
        assert_eq!(header_value(&res, "access-control-max-age"), Some("300"));
        let methods = header_value(&res, "access-control-allow-methods").unwrap_or_default();
        assert!(methods.contains(method), "{methods} lacks {method}");
    }

    #[actix_web::test]
    async fn preflights_for_unlisted_methods_are_refused() {
        let app = actix_test::init_service(
            App::new()
                .wrap(cors_policy())
                .route("/v1/phonebook", web::get().to(ok)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/v1/phonebook")
                .insert_header((header::ORIGIN, ORIGIN))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "TRACE"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn simple_requests_echo_the_origin_and_expose_link() {
        let app = actix_test::init_service(
            App::new()
                .wrap(cors_policy())
                .route("/v1/phonebook", web::get().to(ok)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/v1/phonebook")
                .insert_header((header::ORIGIN, ORIGIN))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            header_value(&res, "access-control-allow-origin"),
            Some(ORIGIN)
        );
        let exposed = header_value(&res, "access-control-expose-headers").unwrap_or_default();
        assert!(exposed.eq_ignore_ascii_case("link"), "exposed: {exposed}");
    }
}
