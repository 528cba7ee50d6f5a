//! HTTP server configuration object and helpers.

use std::sync::Arc;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use phonebook::inbound::http::validation::Validator;
use phonebook::outbound::persistence::DbPool;

/// Everything needed to build the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: (String, u16),
    pub(crate) db_pool: DbPool,
    pub(crate) actor: String,
    pub(crate) validator: Arc<Validator>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration using the default validation messages.
    ///
    /// `bind_addr` is a host name or IP address with a port.
    #[must_use]
    pub fn new(bind_addr: (String, u16), db_pool: DbPool, actor: impl Into<String>) -> Self {
        Self {
            bind_addr,
            db_pool,
            actor: actor.into(),
            validator: Arc::new(Validator::default()),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    #[cfg(feature = "metrics")]
    /// Serve Prometheus metrics through `prometheus`; without it the server
    /// builds its own.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: PrometheusMetrics) -> Self {
        self.prometheus = Some(prometheus);
        self
    }
}
