//! Port for checking that storage answers queries.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Reasons a storage probe failed.
    pub enum HealthProbeError {
        /// No connection could be obtained.
        Connection { message: String } => "health probe connection failed: {message}",
        /// The trivial query itself failed.
        Query { message: String } => "health probe query failed: {message}",
    }
}

/// Runs a trivial round trip against storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Succeed when storage answered a trivial query.
    async fn check(&self) -> Result<(), HealthProbeError>;
}

/// Probe that always reports healthy storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureHealthProbe;

#[async_trait]
impl HealthProbe for FixtureHealthProbe {
    async fn check(&self) -> Result<(), HealthProbeError> {
        Ok(())
    }
}
