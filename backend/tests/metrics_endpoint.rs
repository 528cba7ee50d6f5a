//! Prometheus exposition of per-operation request metrics.
#![cfg(feature = "metrics")]

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use actix_web_prom::PrometheusMetricsBuilder;
use prometheus::Registry;
use serde_json::json;

use phonebook::inbound::http::phonebook::PhonebookDecoders;
use phonebook::inbound::http::state::HttpState;
use phonebook::inbound::http::validation::Validator;
use phonebook::middleware::RequestMetrics;
use phonebook::{RequestLog, Trace};

fn sample<'a>(exposition: &'a str, metric: &str, operation: &str, status: &str) -> Option<&'a str> {
    exposition.lines().find(|line| {
        line.starts_with(metric)
            && line.contains(&format!(r#"operation="{operation}""#))
            && line.contains(&format!(r#"status="{status}""#))
    })
}

#[actix_rt::test]
async fn metrics_endpoint_reports_counts_per_operation() {
    let registry = Registry::new();
    let prometheus = PrometheusMetricsBuilder::new("phonebook")
        .registry(registry.clone())
        .endpoint("/metrics")
        .build()
        .expect("prometheus middleware builds");
    let request_metrics = RequestMetrics::register(&registry).expect("collectors register");
    let decoders = PhonebookDecoders::new(&Arc::new(Validator::default()));
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(HttpState::fixtures()))
            .wrap(request_metrics)
            .wrap(RequestLog)
            .wrap(Trace)
            .wrap(prometheus)
            .service(web::scope("/v1").configure(|cfg| decoders.configure(cfg))),
    )
    .await;

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/phonebook")
            .set_json(json!({
                "fullname": "Grace Hopper",
                "phone_number": "+1-202-555-0199",
                "address": "Arlington"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::NO_CONTENT);
    let rejected = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/phonebook")
            .set_json(json!({ "address": "Nowhere" }))
            .to_request(),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = actix_test::read_body(res).await;
    let exposition = std::str::from_utf8(&body).expect("utf-8 exposition");

    let success = sample(exposition, "phonebook_request_count{", "add_new_profile", "success")
        .expect("success sample");
    assert!(success.ends_with(" 1"), "{success}");
    let failed = sample(exposition, "phonebook_request_count{", "add_new_profile", "failed")
        .expect("failed sample");
    assert!(failed.ends_with(" 1"), "{failed}");
    assert!(
        sample(
            exposition,
            "phonebook_request_latency_seconds_count{",
            "add_new_profile",
            "success"
        )
        .is_some()
    );
}
