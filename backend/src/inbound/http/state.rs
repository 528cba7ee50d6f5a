//! Shared HTTP adapter state.
//!
//! Handlers receive this state via `actix_web::web::Data` so they depend only
//! on domain ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixtureHealthProbe, FixturePhonebookCommand, FixturePhonebookQuery, HealthProbe,
    PhonebookCommand, PhonebookQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub phonebook: Arc<dyn PhonebookCommand>,
    pub phonebook_query: Arc<dyn PhonebookQuery>,
    pub health: Arc<dyn HealthProbe>,
}

impl HttpState {
    /// Construct state from its ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use phonebook::domain::ports::{
    ///     FixtureHealthProbe, FixturePhonebookCommand, FixturePhonebookQuery,
    /// };
    /// use phonebook::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixturePhonebookCommand),
    ///     Arc::new(FixturePhonebookQuery),
    ///     Arc::new(FixtureHealthProbe),
    /// );
    /// let _query = state.phonebook_query.clone();
    /// ```
    pub fn new(
        phonebook: Arc<dyn PhonebookCommand>,
        phonebook_query: Arc<dyn PhonebookQuery>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            phonebook,
            phonebook_query,
            health,
        }
    }

    /// State backed entirely by fixtures; nothing is persisted.
    #[must_use]
    pub fn fixtures() -> Self {
        Self::new(
            Arc::new(FixturePhonebookCommand),
            Arc::new(FixturePhonebookQuery),
            Arc::new(FixtureHealthProbe),
        )
    }
}
