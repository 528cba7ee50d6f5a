//! Transactional scope for request handling.
//!
//! [`run_in_transaction`] opens one transaction, hands the caller a handle
//! bound to it, and resolves the transaction exactly once: commit when the
//! callback succeeds, rollback when it fails. Repositories never look the
//! transaction up themselves; callers convert the handle into the repository's
//! executor and pass it explicitly.
//!
//! Dropping the returned future before it resolves leaves the handle's
//! transaction open. Adapters must make sure such a connection is discarded
//! rather than recycled so the server rolls it back.

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::Error;
use super::ports::define_port_error;

define_port_error! {
    /// Failures of the transaction boundary itself.
    pub enum TransactionError {
        /// No transaction could be opened.
        Begin { message: String } => "failed to begin transaction: {message}",
        /// The work succeeded but the commit did not.
        CommitFailed { message: String } => "failed to commit transaction: {message}",
        /// Rolling back failed; the connection is unusable.
        Rollback { message: String } => "failed to roll back transaction: {message}",
    }
}

impl From<TransactionError> for Error {
    fn from(value: TransactionError) -> Self {
        error!(error = %value, "transaction boundary failed");
        Self::internal(value.to_string())
    }
}

/// Something that can open, commit and roll back transactions.
///
/// `Handle` is a cheap, cloneable token bound to one open transaction.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Token identifying one open transaction.
    type Handle: Clone + Send + Sync + 'static;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Handle, TransactionError>;

    /// Commit the transaction bound to `handle`.
    async fn commit(&self, handle: Self::Handle) -> Result<(), TransactionError>;

    /// Roll back the transaction bound to `handle`.
    async fn rollback(&self, handle: Self::Handle) -> Result<(), TransactionError>;
}

/// Run `work` inside one transaction opened on `source`.
///
/// Errors from `work` are returned unchanged after a rollback; a rollback
/// failure is logged and never replaces them. A failed commit surfaces as
/// [`TransactionError::CommitFailed`] converted into `E`.
///
/// # Errors
/// Returns the callback's error, or the converted begin/commit failure.
pub async fn run_in_transaction<S, T, E, F, Fut>(source: &S, work: F) -> Result<T, E>
where
    S: TransactionSource + ?Sized,
    E: From<TransactionError> + std::fmt::Display,
    F: FnOnce(S::Handle) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let handle = source.begin().await?;
    match work(handle.clone()).await {
        Ok(value) => {
            source.commit(handle).await?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = source.rollback(handle).await {
                warn!(
                    error = %rollback_error,
                    cause = %error,
                    "rollback failed after unsuccessful transactional work"
                );
            } else {
                debug!(cause = %error, "transaction rolled back");
            }
            Err(error)
        }
    }
}
