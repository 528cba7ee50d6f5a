//! Phone-book use-cases.
//!
//! [`PhonebookService`] holds the domain rules and runs every statement on
//! the executor it is handed. [`TransactionalPhonebook`] implements the
//! driving ports by wrapping each use-case in its own transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound;
use mockable::Clock;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::ports::{
    PhonebookCommand, PhonebookQuery, PhonebookRepository, PhonebookRepositoryError,
};
use crate::domain::transaction::{TransactionSource, run_in_transaction};
use crate::domain::{
    AuditStamp, EntryChanges, EntryFilter, EntrySelector, Error, ListEntriesQuery, ListFilter,
    NewPhonebookEntry, PhonebookEntry, duplicate_phone_number, entry_not_found,
};

fn map_repository_error(error: PhonebookRepositoryError) -> Error {
    match error {
        PhonebookRepositoryError::DuplicatePhoneNumber { phone_number } => {
            duplicate_phone_number(&phone_number)
        }
        PhonebookRepositoryError::Connection { message } => {
            error!(%message, "phonebook storage unavailable");
            Error::internal(format!("phonebook storage unavailable: {message}"))
        }
        PhonebookRepositoryError::Query { message } => {
            error!(%message, "phonebook storage query failed");
            Error::internal(format!("phonebook storage error: {message}"))
        }
    }
}

/// Domain rules for listing, creating, updating and removing entries.
pub struct PhonebookService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    actor: String,
}

impl<R> PhonebookService<R> {
    /// Create a service stamping audit columns with `actor`.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, actor: impl Into<String>) -> Self {
        Self {
            repository,
            clock,
            actor: actor.into(),
        }
    }

    /// Stamps carry microsecond precision, the resolution of the audit columns.
    fn stamp(&self) -> AuditStamp {
        AuditStamp {
            actor: self.actor.clone(),
            at: self.clock.utc().trunc_subsecs(6),
        }
    }
}

impl<R> PhonebookService<R>
where
    R: PhonebookRepository,
{
    async fn resolve_selector(
        &self,
        executor: &R::Executor,
        query: &ListEntriesQuery,
    ) -> Result<EntrySelector, Error> {
        let selector = match query.primary_filter() {
            None => EntrySelector::All,
            Some(ListFilter::Id(id)) => EntrySelector::ById(id),
            Some(ListFilter::Fullname(name)) => EntrySelector::ByFullname(name),
            Some(ListFilter::PhoneNumber(phone)) => EntrySelector::ByPhoneNumber(phone),
            Some(ListFilter::OffsetId(offset_id)) => self
                .repository
                .find_created_at(executor, offset_id)
                .await
                .map_err(map_repository_error)?
                .map_or(EntrySelector::All, EntrySelector::CreatedAfter),
        };
        Ok(selector)
    }

    /// Live entries chosen by the highest-precedence supplied filter.
    ///
    /// # Errors
    /// Storage failures surface as internal errors.
    pub async fn list(
        &self,
        executor: &R::Executor,
        query: ListEntriesQuery,
    ) -> Result<Vec<PhonebookEntry>, Error> {
        let selector = self.resolve_selector(executor, &query).await?;
        let filter = EntryFilter::new(selector).with_limit(query.limit);
        self.repository
            .list(executor, &filter)
            .await
            .map_err(map_repository_error)
    }

    /// Register a new entry under a random identifier.
    ///
    /// # Errors
    /// `phone_already_registered` when a live entry owns the phone number,
    /// whether detected up front or by the storage constraint.
    pub async fn create(
        &self,
        executor: &R::Executor,
        draft: NewPhonebookEntry,
    ) -> Result<PhonebookEntry, Error> {
        if let Some(phone_number) = draft.phone_number.as_deref() {
            let same_number = EntryFilter::new(EntrySelector::ByPhoneNumber(phone_number.to_owned()))
                .with_limit(Some(1));
            let existing = self
                .repository
                .list(executor, &same_number)
                .await
                .map_err(map_repository_error)?;
            if !existing.is_empty() {
                return Err(duplicate_phone_number(phone_number));
            }
        }

        let entry = PhonebookEntry::create(Uuid::new_v4(), draft, &self.stamp());
        self.repository
            .insert(executor, &entry)
            .await
            .map_err(map_repository_error)?;
        info!(entry_id = %entry.id, "phonebook entry created");
        Ok(entry)
    }

    async fn require_live(&self, executor: &R::Executor, id: Uuid) -> Result<(), Error> {
        let found = self
            .repository
            .find_by_id(executor, id)
            .await
            .map_err(map_repository_error)?;
        found.map(|_| ()).ok_or_else(|| entry_not_found(id))
    }

    /// Apply every supplied field to the live entry `id`.
    ///
    /// # Errors
    /// `profile_not_exist` when no live entry matches.
    pub async fn update(
        &self,
        executor: &R::Executor,
        id: Uuid,
        changes: EntryChanges,
    ) -> Result<(), Error> {
        self.require_live(executor, id).await?;
        self.repository
            .update(executor, id, &changes, &self.stamp())
            .await
            .map_err(map_repository_error)?;
        info!(entry_id = %id, "phonebook entry updated");
        Ok(())
    }

    /// Soft-delete the live entry `id`.
    ///
    /// # Errors
    /// `profile_not_exist` when no live entry matches.
    pub async fn remove(&self, executor: &R::Executor, id: Uuid) -> Result<(), Error> {
        self.require_live(executor, id).await?;
        self.repository
            .soft_delete(executor, id, &self.stamp())
            .await
            .map_err(map_repository_error)?;
        info!(entry_id = %id, "phonebook entry removed");
        Ok(())
    }
}

/// Driving-port adapter running each use-case in its own transaction.
///
/// The transaction handle is converted into the repository's executor, so
/// every statement of one call shares the same transaction.
pub struct TransactionalPhonebook<S, R> {
    source: Arc<S>,
    service: Arc<PhonebookService<R>>,
}

impl<S, R> TransactionalPhonebook<S, R> {
    /// Wrap `service` so each call runs in a transaction opened on `source`.
    pub fn new(source: Arc<S>, service: PhonebookService<R>) -> Self {
        Self {
            source,
            service: Arc::new(service),
        }
    }
}

#[async_trait]
impl<S, R> PhonebookCommand for TransactionalPhonebook<S, R>
where
    S: TransactionSource + 'static,
    R: PhonebookRepository + 'static,
    R::Executor: From<S::Handle>,
{
    async fn create(&self, draft: NewPhonebookEntry) -> Result<PhonebookEntry, Error> {
        let service = Arc::clone(&self.service);
        run_in_transaction(self.source.as_ref(), |handle| async move {
            let executor = R::Executor::from(handle);
            service.create(&executor, draft).await
        })
        .await
    }

    async fn update(&self, id: Uuid, changes: EntryChanges) -> Result<(), Error> {
        let service = Arc::clone(&self.service);
        run_in_transaction(self.source.as_ref(), |handle| async move {
            let executor = R::Executor::from(handle);
            service.update(&executor, id, changes).await
        })
        .await
    }

    async fn remove(&self, id: Uuid) -> Result<(), Error> {
        let service = Arc::clone(&self.service);
        run_in_transaction(self.source.as_ref(), |handle| async move {
            let executor = R::Executor::from(handle);
            service.remove(&executor, id).await
        })
        .await
    }
}

#[async_trait]
impl<S, R> PhonebookQuery for TransactionalPhonebook<S, R>
where
    S: TransactionSource + 'static,
    R: PhonebookRepository + 'static,
    R::Executor: From<S::Handle>,
{
    async fn list(&self, query: ListEntriesQuery) -> Result<Vec<PhonebookEntry>, Error> {
        let service = Arc::clone(&self.service);
        run_in_transaction(self.source.as_ref(), |handle| async move {
            let executor = R::Executor::from(handle);
            service.list(&executor, query).await
        })
        .await
    }
}

#[cfg(test)]
#[path = "phonebook_service_tests.rs"]
mod tests;
