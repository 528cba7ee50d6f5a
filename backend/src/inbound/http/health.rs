//! Storage health endpoint for orchestration and load balancers.

use actix_web::{HttpResponse, get, http::header, web};
use tracing::warn;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Health probe. Return 200 when storage answers a trivial query.
#[utoipa::path(
    get,
    path = "/healthy",
    tags = ["health"],
    responses(
        (status = 200, description = "Storage is reachable"),
        (status = 500, description = "Storage is unreachable", body = ErrorSchema)
    )
)]
#[get("/healthy")]
pub async fn healthy(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.health.check().await.map_err(|err| {
        warn!(error = %err, "health check failed");
        Error::internal(err.to_string())
    })?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::{
        FixturePhonebookCommand, FixturePhonebookQuery, HealthProbeError, MockHealthProbe,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    fn state(probe: MockHealthProbe) -> HttpState {
        HttpState::new(
            Arc::new(FixturePhonebookCommand),
            Arc::new(FixturePhonebookQuery),
            Arc::new(probe),
        )
    }

    #[rstest]
    #[case(Ok(()), StatusCode::OK)]
    #[case(
        Err(HealthProbeError::query("relation does not exist")),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(
        Err(HealthProbeError::connection("connection refused")),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[actix_web::test]
    async fn reports_storage_reachability(
        #[case] outcome: Result<(), HealthProbeError>,
        #[case] expected: StatusCode,
    ) {
        let mut probe = MockHealthProbe::new();
        probe
            .expect_check()
            .times(1)
            .returning(move || outcome.clone());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(probe)))
                .service(healthy),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/healthy").to_request(),
        )
        .await;

        assert_eq!(res.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn failure_body_is_redacted() {
        let mut probe = MockHealthProbe::new();
        probe
            .expect_check()
            .returning(|| Err(HealthProbeError::connection("password=hunter2")));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(probe)))
                .service(healthy),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/healthy").to_request(),
        )
        .await;
        let body: serde_json::Value = actix_test::read_body_json(res).await;

        assert_eq!(body["error"], "Internal server error");
    }
}
