//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod health_probe;
mod phonebook_command;
mod phonebook_query;
mod phonebook_repository;

#[cfg(test)]
pub use health_probe::MockHealthProbe;
pub use health_probe::{FixtureHealthProbe, HealthProbe, HealthProbeError};
#[cfg(test)]
pub use phonebook_command::MockPhonebookCommand;
pub use phonebook_command::{FixturePhonebookCommand, PhonebookCommand};
#[cfg(test)]
pub use phonebook_query::MockPhonebookQuery;
pub use phonebook_query::{FixturePhonebookQuery, PhonebookQuery};
#[cfg(test)]
pub use phonebook_repository::MockPhonebookRepository;
pub use phonebook_repository::{PhonebookRepository, PhonebookRepositoryError};
