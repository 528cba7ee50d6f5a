//! Driving port for reading the phone book.

use async_trait::async_trait;

use crate::domain::{Error, ListEntriesQuery, PhonebookEntry};

/// Driving port for phone-book reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhonebookQuery: Send + Sync {
    /// Live entries selected by the first supplied filter, oldest first.
    async fn list(&self, query: ListEntriesQuery) -> Result<Vec<PhonebookEntry>, Error>;
}

/// Fixture query returning an empty phone book.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePhonebookQuery;

#[async_trait]
impl PhonebookQuery for FixturePhonebookQuery {
    async fn list(&self, _query: ListEntriesQuery) -> Result<Vec<PhonebookEntry>, Error> {
        Ok(Vec::new())
    }
}
