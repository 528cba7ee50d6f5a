//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{AuditStamp, EntryChanges, PhonebookEntry};

use super::schema::{phone_book, seed_log};

/// Row struct for reading from the phone_book table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = phone_book)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PhonebookRow {
    pub id: Uuid,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_date_utc: DateTime<Utc>,
    pub created_by: String,
    pub updated_date_utc: DateTime<Utc>,
    pub updated_by: String,
    pub deleted_date_utc: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl From<PhonebookRow> for PhonebookEntry {
    fn from(row: PhonebookRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            phone_number: row.phone_number,
            address: row.address,
            created_date_utc: row.created_date_utc,
            created_by: row.created_by,
            updated_date_utc: row.updated_date_utc,
            updated_by: row.updated_by,
            deleted_date_utc: row.deleted_date_utc,
            deleted_by: row.deleted_by,
        }
    }
}

/// Insertable struct for creating new phone_book records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = phone_book)]
pub(crate) struct NewPhonebookRow<'a> {
    pub id: Uuid,
    pub fullname: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub created_date_utc: DateTime<Utc>,
    pub created_by: &'a str,
    pub updated_date_utc: DateTime<Utc>,
    pub updated_by: &'a str,
}

impl<'a> From<&'a PhonebookEntry> for NewPhonebookRow<'a> {
    fn from(entry: &'a PhonebookEntry) -> Self {
        Self {
            id: entry.id,
            fullname: entry.fullname.as_deref(),
            phone_number: entry.phone_number.as_deref(),
            address: entry.address.as_deref(),
            created_date_utc: entry.created_date_utc,
            created_by: &entry.created_by,
            updated_date_utc: entry.updated_date_utc,
            updated_by: &entry.updated_by,
        }
    }
}

/// Changeset for the update use-case. `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = phone_book)]
pub(crate) struct PhonebookUpdate<'a> {
    pub fullname: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub updated_date_utc: DateTime<Utc>,
    pub updated_by: &'a str,
}

impl<'a> PhonebookUpdate<'a> {
    pub(crate) fn new(changes: &'a EntryChanges, stamp: &'a AuditStamp) -> Self {
        Self {
            fullname: changes.fullname.as_deref(),
            phone_number: changes.phone_number.as_deref(),
            address: changes.address.as_deref(),
            updated_date_utc: stamp.at,
            updated_by: &stamp.actor,
        }
    }
}

/// Changeset stamping a removal.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = phone_book)]
pub(crate) struct PhonebookRemoval<'a> {
    pub deleted_date_utc: DateTime<Utc>,
    pub deleted_by: &'a str,
}

/// Row struct for the seed_log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = seed_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SeedLogRow {
    pub version: i32,
    pub dirty: bool,
}
