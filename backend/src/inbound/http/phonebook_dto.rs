//! Phone-book request models and response payloads.
//!
//! Each request model carries its validation rules and the binding table
//! telling the decoder which fields come from the path or query string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{EntryChanges, ListEntriesQuery, NewPhonebookEntry, PhonebookEntry};
use crate::inbound::http::decode::{FieldBinding, RequestModel, Setter};

/// Filters accepted by `GET /v1/phonebook`. The first one supplied wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct ListEntriesRequest {
    pub id: Option<Uuid>,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    /// Return entries created after this one.
    pub offset_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
}

impl RequestModel for ListEntriesRequest {
    const NAME: &'static str = "ListEntriesRequest";
    const OPERATION: &'static str = "get_list_phone";

    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::query("id", Setter::Uuid(|m, v| m.id = Some(v))),
            FieldBinding::query("fullname", Setter::Text(|m, v| m.fullname = Some(v))),
            FieldBinding::query("phone_number", Setter::Text(|m, v| m.phone_number = Some(v))),
            FieldBinding::query("offset_id", Setter::Uuid(|m, v| m.offset_id = Some(v))),
            FieldBinding::query("limit", Setter::Integer(|m, v| m.limit = Some(v))),
        ]
    }
}

impl From<ListEntriesRequest> for ListEntriesQuery {
    fn from(value: ListEntriesRequest) -> Self {
        Self {
            id: value.id,
            fullname: value.fullname,
            phone_number: value.phone_number,
            offset_id: value.offset_id,
            // Validation guarantees a positive limit; oversized ones saturate.
            limit: value
                .limit
                .map(|limit| u32::try_from(limit).unwrap_or(u32::MAX)),
        }
    }
}

/// Body of `POST /v1/phonebook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct CreateEntryRequest {
    #[validate(required, length(max = 255))]
    pub fullname: Option<String>,
    #[validate(required, length(min = 1, max = 32))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl RequestModel for CreateEntryRequest {
    const NAME: &'static str = "CreateEntryRequest";
    const OPERATION: &'static str = "add_new_profile";
}

impl From<CreateEntryRequest> for NewPhonebookEntry {
    fn from(value: CreateEntryRequest) -> Self {
        Self {
            fullname: value.fullname,
            phone_number: value.phone_number,
            address: value.address,
        }
    }
}

/// Path id and body of `PUT /v1/phonebook/{id}`. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct UpdateEntryRequest {
    #[validate(required)]
    #[schema(read_only)]
    pub id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub fullname: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl RequestModel for UpdateEntryRequest {
    const NAME: &'static str = "UpdateEntryRequest";
    const OPERATION: &'static str = "update_profile";

    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![FieldBinding::path("id", Setter::Uuid(|m, v| m.id = Some(v)))]
    }
}

impl UpdateEntryRequest {
    /// Split into the target id and the supplied changes.
    #[must_use]
    pub fn into_parts(self) -> (Option<Uuid>, EntryChanges) {
        let changes = EntryChanges {
            fullname: self.fullname,
            phone_number: self.phone_number,
            address: self.address,
        };
        (self.id, changes)
    }
}

/// Path id of `DELETE /v1/phonebook/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RemoveEntryRequest {
    #[validate(required)]
    pub id: Option<Uuid>,
}

impl RequestModel for RemoveEntryRequest {
    const NAME: &'static str = "RemoveEntryRequest";
    const OPERATION: &'static str = "remove_profile";

    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![FieldBinding::path("id", Setter::Uuid(|m, v| m.id = Some(v)))]
    }
}

/// One live phone-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhonebookEntryResponse {
    pub id: Uuid,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_date_utc: DateTime<Utc>,
    pub created_by: String,
    pub updated_date_utc: DateTime<Utc>,
    pub updated_by: String,
}

impl From<PhonebookEntry> for PhonebookEntryResponse {
    fn from(value: PhonebookEntry) -> Self {
        Self {
            id: value.id,
            fullname: value.fullname,
            phone_number: value.phone_number,
            address: value.address,
            created_date_utc: value.created_date_utc,
            created_by: value.created_by,
            updated_date_utc: value.updated_date_utc,
            updated_by: value.updated_by,
        }
    }
}
