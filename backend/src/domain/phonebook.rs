//! Phone-book entries and the inputs of their use-cases.
//!
//! Entries are soft-deleted: removal stamps `deleted_date_utc` and
//! `deleted_by` and the row stays in storage. Every read path excludes
//! soft-deleted rows.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::Error;

/// Message and detail code for a create that reuses a live phone number.
pub const PHONE_ALREADY_REGISTERED: &str = "phone_already_registered";

/// Message and detail code for an update or removal of a missing entry.
pub const PROFILE_NOT_EXIST: &str = "profile_not_exist";

/// One phone-book record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookEntry {
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

impl PhonebookEntry {
    /// Build a fresh, live entry stamped with `stamp` as creator and updater.
    #[must_use]
    pub fn create(id: Uuid, draft: NewPhonebookEntry, stamp: &AuditStamp) -> Self {
        Self {
            id,
            fullname: draft.fullname,
            phone_number: draft.phone_number,
            address: draft.address,
            created_date_utc: stamp.at,
            created_by: stamp.actor.clone(),
            updated_date_utc: stamp.at,
            updated_by: stamp.actor.clone(),
            deleted_date_utc: None,
            deleted_by: None,
        }
    }

    /// Whether the entry has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_date_utc.is_some()
    }
}

/// Who touched an entry, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Input of the create use-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPhonebookEntry {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Fields supplied to the update use-case. `None` leaves a column as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryChanges {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl EntryChanges {
    /// True when no field was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.phone_number.is_none() && self.address.is_none()
    }
}

/// Optional list filters as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntriesQuery {
    pub id: Option<Uuid>,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub offset_id: Option<Uuid>,
    pub limit: Option<u32>,
}

/// A supplied list filter, before any storage lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    Id(Uuid),
    Fullname(String),
    PhoneNumber(String),
    OffsetId(Uuid),
}

impl ListEntriesQuery {
    /// Supplied filters in precedence order; only the first one applies.
    #[must_use]
    pub fn filters(&self) -> Vec<ListFilter> {
        let present_id = |id: Option<Uuid>| id.filter(|value| !value.is_nil());
        let present_text = |text: &Option<String>| text.clone().filter(|value| !value.is_empty());

        [
            present_id(self.id).map(ListFilter::Id),
            present_text(&self.fullname).map(ListFilter::Fullname),
            present_text(&self.phone_number).map(ListFilter::PhoneNumber),
            present_id(self.offset_id).map(ListFilter::OffsetId),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// The winning filter, if any was supplied.
    #[must_use]
    pub fn primary_filter(&self) -> Option<ListFilter> {
        self.filters().into_iter().next()
    }
}

/// The single predicate a list query applies, next to "not deleted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySelector {
    /// Exact identifier match.
    ById(Uuid),
    /// Case-insensitive substring of the full name.
    ByFullname(String),
    /// Exact phone number.
    ByPhoneNumber(String),
    /// Created strictly after the given instant.
    CreatedAfter(DateTime<Utc>),
    /// Every live entry.
    All,
}

/// Storage-level list request: one selector, an optional row cap, ordered by
/// creation time ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub selector: EntrySelector,
    pub limit: Option<u32>,
}

impl EntryFilter {
    #[must_use]
    pub const fn new(selector: EntrySelector) -> Self {
        Self {
            selector,
            limit: None,
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }
}

/// Rejection of a create whose phone number belongs to a live entry.
pub fn duplicate_phone_number(phone_number: &str) -> Error {
    Error::invalid_request(PHONE_ALREADY_REGISTERED).with_details(json!({
        "code": PHONE_ALREADY_REGISTERED,
        "field": "phone_number",
        "value": phone_number,
    }))
}

/// Rejection of an update or removal targeting a missing or deleted entry.
pub fn entry_not_found(id: Uuid) -> Error {
    Error::invalid_request(PROFILE_NOT_EXIST).with_details(json!({
        "code": PROFILE_NOT_EXIST,
        "field": "id",
        "value": id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[rstest]
    #[case::id_beats_everything(
        ListEntriesQuery {
            id: Some(uuid(1)),
            fullname: Some("ann".into()),
            phone_number: Some("555".into()),
            offset_id: Some(uuid(2)),
            limit: None,
        },
        Some(ListFilter::Id(uuid(1)))
    )]
    #[case::fullname_beats_phone(
        ListEntriesQuery {
            fullname: Some("ann".into()),
            phone_number: Some("555".into()),
            ..ListEntriesQuery::default()
        },
        Some(ListFilter::Fullname("ann".into()))
    )]
    #[case::phone_beats_offset(
        ListEntriesQuery {
            phone_number: Some("555".into()),
            offset_id: Some(uuid(2)),
            ..ListEntriesQuery::default()
        },
        Some(ListFilter::PhoneNumber("555".into()))
    )]
    #[case::offset_alone(
        ListEntriesQuery { offset_id: Some(uuid(2)), ..ListEntriesQuery::default() },
        Some(ListFilter::OffsetId(uuid(2)))
    )]
    #[case::nil_and_empty_are_absent(
        ListEntriesQuery {
            id: Some(Uuid::nil()),
            fullname: Some(String::new()),
            ..ListEntriesQuery::default()
        },
        None
    )]
    fn first_supplied_filter_wins(
        #[case] query: ListEntriesQuery,
        #[case] expected: Option<ListFilter>,
    ) {
        assert_eq!(query.primary_filter(), expected);
    }

    #[rstest]
    fn create_stamps_creator_and_updater() {
        let stamp = AuditStamp {
            actor: "http".into(),
            at: Utc::now(),
        };
        let draft = NewPhonebookEntry {
            fullname: Some("Ann".into()),
            phone_number: Some("555-0100".into()),
            address: None,
        };

        let entry = PhonebookEntry::create(uuid(9), draft, &stamp);

        assert_eq!(entry.created_by, "http");
        assert_eq!(entry.updated_by, "http");
        assert_eq!(entry.created_date_utc, entry.updated_date_utc);
        assert!(!entry.is_deleted());
    }

    #[rstest]
    fn rule_errors_carry_their_code_in_the_message() {
        assert!(duplicate_phone_number("555").message().contains("phone_already_registered"));
        assert!(entry_not_found(uuid(3)).message().contains("profile_not_exist"));
    }
}
