//! Phone-book HTTP handlers.
//!
//! ```text
//! GET    /v1/phonebook
//! POST   /v1/phonebook
//! PUT    /v1/phonebook/{id}
//! DELETE /v1/phonebook/{id}
//! ```
//!
//! Every handler takes its input through [`Decoded`], so malformed or invalid
//! requests are answered with 422 before a use-case runs.

use std::sync::Arc;

use actix_web::{delete, get, post, put, web};
use serde_json::json;

use crate::domain::Error;
use crate::inbound::http::decode::{DecodeConfig, Decoded, Decoder};
use crate::inbound::http::reply::Reply;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::Validator;

pub use crate::inbound::http::phonebook_dto::{
    CreateEntryRequest, ListEntriesRequest, PhonebookEntryResponse, RemoveEntryRequest,
    UpdateEntryRequest,
};

/// Decoders for every phone-book request model, built once at startup.
#[derive(Clone)]
pub struct PhonebookDecoders {
    list: web::Data<Decoder<ListEntriesRequest>>,
    create: web::Data<Decoder<CreateEntryRequest>>,
    update: web::Data<Decoder<UpdateEntryRequest>>,
    remove: web::Data<Decoder<RemoveEntryRequest>>,
}

impl PhonebookDecoders {
    /// Build decoders sharing `validator`.
    pub fn new(validator: &Arc<Validator>) -> Self {
        Self {
            list: web::Data::new(Decoder::new(DecodeConfig::new(), Arc::clone(validator))),
            create: web::Data::new(Decoder::new(DecodeConfig::new(), Arc::clone(validator))),
            update: web::Data::new(Decoder::new(DecodeConfig::new(), Arc::clone(validator))),
            remove: web::Data::new(Decoder::new(DecodeConfig::new(), Arc::clone(validator))),
        }
    }

    /// Register the decoders and handlers on `cfg`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.list.clone())
            .app_data(self.create.clone())
            .app_data(self.update.clone())
            .app_data(self.remove.clone())
            .service(list_entries)
            .service(create_entry)
            .service(update_entry)
            .service(remove_entry);
    }
}

fn missing_id() -> Error {
    Error::invalid_request("id is required").with_details(json!({
        "field": "id",
        "code": "missing_field",
    }))
}

/// List live entries, oldest first.
#[utoipa::path(
    get,
    path = "/v1/phonebook",
    params(
        ("id" = Option<uuid::Uuid>, Query, description = "Exact entry id"),
        ("fullname" = Option<String>, Query, description = "Case-insensitive substring of the full name"),
        ("phone_number" = Option<String>, Query, description = "Exact phone number"),
        ("offset_id" = Option<uuid::Uuid>, Query, description = "Return entries created after this one"),
        ("limit" = Option<i64>, Query, description = "Maximum number of entries, at least 1")
    ),
    responses(
        (status = 200, description = "Matching entries", body = [PhonebookEntryResponse]),
        (status = 422, description = "Invalid request", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["phonebook"],
    operation_id = "listPhonebookEntries"
)]
#[get("/phonebook")]
pub async fn list_entries(
    state: web::Data<HttpState>,
    request: Decoded<ListEntriesRequest>,
) -> Reply<Vec<PhonebookEntryResponse>> {
    state
        .phonebook_query
        .list(request.into_inner().into())
        .await
        .map(|entries| entries.into_iter().map(PhonebookEntryResponse::from).collect())
        .into()
}

/// Register a new entry.
#[utoipa::path(
    post,
    path = "/v1/phonebook",
    request_body = CreateEntryRequest,
    responses(
        (status = 204, description = "Entry created"),
        (status = 422, description = "Invalid request or phone number already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["phonebook"],
    operation_id = "createPhonebookEntry"
)]
#[post("/phonebook")]
pub async fn create_entry(
    state: web::Data<HttpState>,
    request: Decoded<CreateEntryRequest>,
) -> Reply<()> {
    Reply::done(
        state
            .phonebook
            .create(request.into_inner().into())
            .await
            .map(drop),
    )
}

/// Update the supplied fields of a live entry.
#[utoipa::path(
    put,
    path = "/v1/phonebook/{id}",
    params(("id" = uuid::Uuid, Path, description = "Entry id")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 204, description = "Entry updated"),
        (status = 422, description = "Invalid request or entry does not exist", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["phonebook"],
    operation_id = "updatePhonebookEntry"
)]
#[put("/phonebook/{id}")]
pub async fn update_entry(
    state: web::Data<HttpState>,
    request: Decoded<UpdateEntryRequest>,
) -> Reply<()> {
    let (id, changes) = request.into_inner().into_parts();
    let Some(id) = id else {
        return missing_id().into();
    };
    Reply::done(state.phonebook.update(id, changes).await)
}

/// Soft-delete a live entry.
#[utoipa::path(
    delete,
    path = "/v1/phonebook/{id}",
    params(("id" = uuid::Uuid, Path, description = "Entry id")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 422, description = "Invalid request or entry does not exist", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["phonebook"],
    operation_id = "removePhonebookEntry"
)]
#[delete("/phonebook/{id}")]
pub async fn remove_entry(
    state: web::Data<HttpState>,
    request: Decoded<RemoveEntryRequest>,
) -> Reply<()> {
    let Some(id) = request.into_inner().id else {
        return missing_id().into();
    };
    Reply::done(state.phonebook.remove(id).await)
}

#[cfg(test)]
#[path = "phonebook_tests.rs"]
mod tests;
