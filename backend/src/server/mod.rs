//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;

#[cfg(debug_assertions)]
use phonebook::doc::ApiDoc;
use phonebook::domain::{PhonebookService, TransactionalPhonebook};
use phonebook::inbound::http::health::healthy;
use phonebook::inbound::http::phonebook::PhonebookDecoders;
use phonebook::inbound::http::state::HttpState;
use phonebook::outbound::persistence::{
    DieselHealthProbe, DieselPhonebookRepository, DieselTransactionSource,
};
#[cfg(feature = "metrics")]
use phonebook::middleware::RequestMetrics;
use phonebook::middleware::cors_policy;
use phonebook::{RequestLog, Trace};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Wire the storage adapters into the use-cases behind the HTTP ports.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let service = PhonebookService::new(
        Arc::new(DieselPhonebookRepository::new()),
        Arc::new(DefaultClock),
        config.actor.clone(),
    );
    let phonebook = Arc::new(TransactionalPhonebook::new(
        Arc::new(DieselTransactionSource::new(config.db_pool.clone())),
        service,
    ));
    HttpState::new(
        phonebook.clone(),
        phonebook,
        Arc::new(DieselHealthProbe::new(config.db_pool.clone())),
    )
}

#[derive(Clone)]
struct AppDependencies {
    http_state: web::Data<HttpState>,
    decoders: PhonebookDecoders,
    #[cfg(feature = "metrics")]
    request_metrics: RequestMetrics,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        decoders,
        #[cfg(feature = "metrics")]
        request_metrics,
    } = deps;

    let api = web::scope("/v1").configure(|cfg| decoders.configure(cfg));

    let app = App::new().app_data(http_state);

    #[cfg(feature = "metrics")]
    let app = app.wrap(request_metrics);

    let app = app
        .wrap(RequestLog)
        .wrap(Trace)
        .service(api)
        .service(healthy);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from `config`.
///
/// The cross-origin policy wraps everything else. With the `metrics` feature
/// the Prometheus endpoint sits just inside it.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails or, with the
/// `metrics` feature, when the collectors cannot be registered.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    #[cfg(feature = "metrics")]
    let prometheus = match config.prometheus.clone() {
        Some(prometheus) => prometheus,
        None => metrics::prometheus_metrics()?,
    };
    let deps = AppDependencies {
        http_state: web::Data::new(build_http_state(&config)),
        decoders: PhonebookDecoders::new(&config.validator),
        #[cfg(feature = "metrics")]
        request_metrics: metrics::request_metrics(&prometheus)?,
    };
    let (host, port) = config.bind_addr;

    let server = HttpServer::new(move || {
        let app = build_app(deps.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app.wrap(cors_policy())
    })
    .bind((host.as_str(), port))?
    .run();
    info!(%host, port, "phonebook listening");
    Ok(server)
}
