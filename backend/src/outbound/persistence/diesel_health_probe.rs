//! Storage liveness probe backed by the connection pool.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{HealthProbe, HealthProbeError};

use super::pool::DbPool;

/// Runs `SELECT 1` on a pooled connection.
#[derive(Clone)]
pub struct DieselHealthProbe {
    pool: DbPool,
}

impl DieselHealthProbe {
    /// Create a probe that checks out connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for DieselHealthProbe {
    async fn check(&self) -> Result<(), HealthProbeError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            warn!(error = %err, "health probe could not check out a connection");
            HealthProbeError::connection(err.into_message())
        })?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                warn!(error = %err, "health probe query failed");
                HealthProbeError::query(err.to_string())
            })
    }
}
