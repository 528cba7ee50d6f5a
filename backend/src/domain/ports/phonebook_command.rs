//! Driving port for phone-book mutations.
//!
//! Each call is one unit of work: it either applies completely or leaves
//! storage untouched.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{EntryChanges, Error, NewPhonebookEntry, PhonebookEntry};

/// Driving port for phone-book write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhonebookCommand: Send + Sync {
    /// Register a new entry under a freshly generated identifier.
    ///
    /// Fails with `phone_already_registered` when a live entry already owns
    /// the phone number.
    async fn create(&self, draft: NewPhonebookEntry) -> Result<PhonebookEntry, Error>;

    /// Apply `changes` to the live entry `id`.
    ///
    /// Fails with `profile_not_exist` when no live entry matches.
    async fn update(&self, id: Uuid, changes: EntryChanges) -> Result<(), Error>;

    /// Soft-delete the live entry `id`.
    ///
    /// Fails with `profile_not_exist` when no live entry matches.
    async fn remove(&self, id: Uuid) -> Result<(), Error>;
}

/// Fixture command accepting every mutation without storing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePhonebookCommand;

#[async_trait]
impl PhonebookCommand for FixturePhonebookCommand {
    async fn create(&self, draft: NewPhonebookEntry) -> Result<PhonebookEntry, Error> {
        let stamp = crate::domain::AuditStamp {
            actor: "fixture".to_owned(),
            at: chrono::Utc::now(),
        };
        Ok(PhonebookEntry::create(Uuid::new_v4(), draft, &stamp))
    }

    async fn update(&self, _id: Uuid, _changes: EntryChanges) -> Result<(), Error> {
        Ok(())
    }

    async fn remove(&self, _id: Uuid) -> Result<(), Error> {
        Ok(())
    }
}
