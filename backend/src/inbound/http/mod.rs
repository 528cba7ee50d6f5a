//! HTTP inbound adapter exposing REST endpoints.

pub mod decode;
pub mod error;
pub mod health;
pub mod phonebook;
pub mod phonebook_dto;
pub mod reply;
pub mod schemas;
pub mod state;
pub mod validation;

pub use error::ApiResult;
