//! Port for phone-book persistence.
//!
//! Every method takes the executor to run on explicitly. The same adapter code
//! therefore runs standalone against a pool or inside a caller-owned
//! transaction, depending only on the executor it is handed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuditStamp, EntryChanges, EntryFilter, PhonebookEntry};

use super::define_port_error;

define_port_error! {
    /// Errors raised by phone-book repository adapters.
    pub enum PhonebookRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "phonebook repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "phonebook repository query failed: {message}",
        /// A live entry already owns the phone number.
        DuplicatePhoneNumber { phone_number: String } =>
            "phone number {phone_number} is already registered",
    }
}

/// Port for phone-book storage.
#[cfg_attr(test, mockall::automock(type Executor = ();))]
#[async_trait]
pub trait PhonebookRepository: Send + Sync {
    /// Where statements run: a pool, an open transaction, or a test double.
    type Executor: Send + Sync;

    /// Live entries matching `filter`, oldest first.
    async fn list(
        &self,
        executor: &Self::Executor,
        filter: &EntryFilter,
    ) -> Result<Vec<PhonebookEntry>, PhonebookRepositoryError>;

    /// The live entry with `id`.
    async fn find_by_id(
        &self,
        executor: &Self::Executor,
        id: Uuid,
    ) -> Result<Option<PhonebookEntry>, PhonebookRepositoryError>;

    /// Creation time of the entry with `id`, deleted or not.
    async fn find_created_at(
        &self,
        executor: &Self::Executor,
        id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, PhonebookRepositoryError>;

    /// Store a new entry.
    ///
    /// Returns [`PhonebookRepositoryError::DuplicatePhoneNumber`] when storage
    /// rejects the phone number as already taken by a live entry.
    async fn insert(
        &self,
        executor: &Self::Executor,
        entry: &PhonebookEntry,
    ) -> Result<(), PhonebookRepositoryError>;

    /// Apply `changes` to the live entry with `id` and stamp the updater.
    async fn update(
        &self,
        executor: &Self::Executor,
        id: Uuid,
        changes: &EntryChanges,
        stamp: &AuditStamp,
    ) -> Result<(), PhonebookRepositoryError>;

    /// Mark the live entry with `id` as deleted.
    async fn soft_delete(
        &self,
        executor: &Self::Executor,
        id: Uuid,
        stamp: &AuditStamp,
    ) -> Result<(), PhonebookRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn duplicate_error_names_the_phone_number() {
        let err = PhonebookRepositoryError::duplicate_phone_number("555-0100");
        assert_eq!(err.to_string(), "phone number 555-0100 is already registered");
    }

    #[rstest]
    #[tokio::test]
    async fn mock_accepts_unit_executor() {
        let mut repo = MockPhonebookRepository::new();
        repo.expect_find_by_id()
            .withf(|_, id| id.is_nil())
            .return_once(|_, _| Ok(None));

        let found = repo.find_by_id(&(), Uuid::nil()).await.expect("mock lookup");
        assert!(found.is_none());
    }
}
