//! Diesel implementation of the domain transaction boundary.
//!
//! A [`TransactionHandle`] owns one pooled connection with an open
//! transaction. Repositories reach it through an [`Executor`], which is
//! either the pool itself or such a handle.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, TransactionManager};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::{TransactionError, TransactionSource};

use super::pool::{DbPool, PoolError};

type OwnedConnection = PooledConnection<'static, AsyncPgConnection>;

/// Shared token for one open transaction.
///
/// Dropping the last clone returns the connection to the pool. If the
/// transaction was never resolved the pool discards the connection and the
/// server rolls the transaction back.
#[derive(Clone)]
pub struct TransactionHandle(Arc<Mutex<OwnedConnection>>);

/// Opens transactions on pooled connections.
#[derive(Clone)]
pub struct DieselTransactionSource {
    pool: DbPool,
}

impl DieselTransactionSource {
    /// Create a source drawing connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionSource for DieselTransactionSource {
    type Handle = TransactionHandle;

    async fn begin(&self) -> Result<Self::Handle, TransactionError> {
        let mut conn = self
            .pool
            .get_owned()
            .await
            .map_err(|err| TransactionError::begin(err.into_message()))?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::begin_transaction(
            &mut *conn,
        )
        .await
        .map_err(|err| TransactionError::begin(err.to_string()))?;
        debug!("transaction opened");
        Ok(TransactionHandle(Arc::new(Mutex::new(conn))))
    }

    async fn commit(&self, handle: Self::Handle) -> Result<(), TransactionError> {
        let mut conn = handle.0.lock().await;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(
            &mut **conn,
        )
        .await
        .map_err(|err| TransactionError::commit_failed(err.to_string()))
    }

    async fn rollback(&self, handle: Self::Handle) -> Result<(), TransactionError> {
        let mut conn = handle.0.lock().await;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::rollback_transaction(
            &mut **conn,
        )
        .await
        .map_err(|err| TransactionError::rollback(err.to_string()))
    }
}

/// Where repository statements run.
#[derive(Clone)]
pub enum Executor {
    /// Autocommit statements on a fresh pooled connection.
    Pool(DbPool),
    /// Statements inside an open transaction.
    Transaction(TransactionHandle),
}

impl From<DbPool> for Executor {
    fn from(pool: DbPool) -> Self {
        Self::Pool(pool)
    }
}

impl From<TransactionHandle> for Executor {
    fn from(handle: TransactionHandle) -> Self {
        Self::Transaction(handle)
    }
}

impl Executor {
    /// Borrow a connection to run statements on.
    ///
    /// Inside a transaction this waits for any statement of the same request
    /// still holding the connection.
    ///
    /// # Errors
    /// Returns `PoolError::Checkout` when the pool cannot supply a connection.
    pub async fn connection(&self) -> Result<ExecutorConnection<'_>, PoolError> {
        match self {
            Self::Pool(pool) => pool.get().await.map(ExecutorConnection::Pooled),
            Self::Transaction(handle) => Ok(ExecutorConnection::Transaction(handle.0.lock().await)),
        }
    }
}

/// A connection borrowed from an [`Executor`].
pub enum ExecutorConnection<'a> {
    /// Checked out from the pool for this statement only.
    Pooled(PooledConnection<'a, AsyncPgConnection>),
    /// Locked transaction connection.
    Transaction(MutexGuard<'a, OwnedConnection>),
}

impl Deref for ExecutorConnection<'_> {
    type Target = AsyncPgConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Pooled(conn) => &**conn,
            Self::Transaction(guard) => &***guard,
        }
    }
}

impl DerefMut for ExecutorConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Pooled(conn) => &mut **conn,
            Self::Transaction(guard) => &mut ***guard,
        }
    }
}
