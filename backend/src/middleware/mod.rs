//! Request middleware for tracing, access logging, cross-origin policy and
//! optional request metrics.

pub mod cors;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod request_log;
pub mod trace;

pub use cors::cors_policy;
#[cfg(feature = "metrics")]
pub use metrics::RequestMetrics;
pub use request_log::RequestLog;
pub use trace::Trace;
