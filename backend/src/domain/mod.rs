//! Domain primitives, use-cases and ports.
//!
//! Purpose: hold the phone-book rules independent of HTTP and storage.
//! Inbound adapters call the driving ports; outbound adapters implement the
//! driven ones.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - TraceId: per-request correlation identifier.
//! - PhonebookEntry and the use-case inputs.
//! - PhonebookService / TransactionalPhonebook: the use-cases.
//! - run_in_transaction / TransactionSource: the transaction boundary.

pub mod error;
pub mod phonebook;
pub mod phonebook_service;
pub mod ports;
pub mod trace_id;
pub mod transaction;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::phonebook::{
    AuditStamp, EntryChanges, EntryFilter, EntrySelector, ListEntriesQuery, ListFilter,
    NewPhonebookEntry, PHONE_ALREADY_REGISTERED, PROFILE_NOT_EXIST, PhonebookEntry,
    duplicate_phone_number, entry_not_found,
};
pub use self::phonebook_service::{PhonebookService, TransactionalPhonebook};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transaction::{TransactionError, TransactionSource, run_in_transaction};
