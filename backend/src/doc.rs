//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint together with the request and
//! response payloads and the error envelope. Swagger UI serves it in debug
//! builds; `cargo run --bin openapi-dump` exports it for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::phonebook::{
    CreateEntryRequest, ListEntriesRequest, PhonebookEntryResponse, UpdateEntryRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Phonebook API",
        description = "List, create, update and soft-delete phone-book entries."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::phonebook::list_entries,
        crate::inbound::http::phonebook::create_entry,
        crate::inbound::http::phonebook::update_entry,
        crate::inbound::http::phonebook::remove_entry,
        crate::inbound::http::health::healthy,
    ),
    components(schemas(
        ListEntriesRequest,
        CreateEntryRequest,
        UpdateEntryRequest,
        PhonebookEntryResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "phonebook", description = "Phone-book entries"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
