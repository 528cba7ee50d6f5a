//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. When a
//! migration changes a table, update the matching block here; `diesel
//! print-schema` against a migrated database produces the same shape.

diesel::table! {
    /// Phone-book entries.
    ///
    /// Rows are never deleted. Removal stamps `deleted_date_utc` and
    /// `deleted_by`; the partial unique index `phone_book_phone_number_active_key`
    /// covers `phone_number` for rows where `deleted_date_utc IS NULL`.
    phone_book (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        fullname -> Nullable<Varchar>,
        phone_number -> Nullable<Varchar>,
        address -> Nullable<Text>,
        created_date_utc -> Timestamptz,
        created_by -> Varchar,
        updated_date_utc -> Timestamptz,
        updated_by -> Varchar,
        /// Set once when the entry is removed.
        deleted_date_utc -> Nullable<Timestamptz>,
        deleted_by -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Progress of SQL seed files, one row per attempted seed version.
    seed_log (version) {
        version -> Int4,
        /// True while the seed at `version` has failed and not been reapplied.
        dirty -> Bool,
    }
}
