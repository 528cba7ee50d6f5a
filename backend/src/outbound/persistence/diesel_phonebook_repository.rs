//! PostgreSQL-backed `PhonebookRepository` implementation using Diesel ORM.
//!
//! The adapter is stateless: every statement runs on the [`Executor`] handed
//! in by the caller, so the same code serves autocommit reads and statements
//! inside a request's transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PhonebookRepository, PhonebookRepositoryError};
use crate::domain::{AuditStamp, EntryChanges, EntryFilter, EntrySelector, PhonebookEntry};

use super::models::{NewPhonebookRow, PhonebookRemoval, PhonebookRow, PhonebookUpdate};
use super::pool::PoolError;
use super::schema::phone_book;
use super::transaction::Executor;

/// Partial unique index guarding live phone numbers.
const ACTIVE_PHONE_NUMBER_KEY: &str = "phone_book_phone_number_active_key";

/// Diesel-backed implementation of the `PhonebookRepository` port.
#[derive(Debug, Default, Clone, Copy)]
pub struct DieselPhonebookRepository;

impl DieselPhonebookRepository {
    /// Create a new repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn map_pool_error(error: PoolError) -> PhonebookRepositoryError {
    PhonebookRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> PhonebookRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => PhonebookRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            PhonebookRepositoryError::query("database query error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PhonebookRepositoryError::connection("database connection error")
        }
        DieselError::DatabaseError(_, info) => {
            PhonebookRepositoryError::query(format!("database error: {}", info.message()))
        }
        _ => PhonebookRepositoryError::query("database error"),
    }
}

/// Map a write failure, recognising the live phone-number constraint.
fn map_write_error(
    error: diesel::result::Error,
    phone_number: Option<&str>,
) -> PhonebookRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    let taken = matches!(
        &error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(ACTIVE_PHONE_NUMBER_KEY)
    );
    if taken {
        debug!(constraint = ACTIVE_PHONE_NUMBER_KEY, "live phone number already taken");
        return PhonebookRepositoryError::duplicate_phone_number(phone_number.unwrap_or_default());
    }
    map_diesel_error(error)
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl PhonebookRepository for DieselPhonebookRepository {
    type Executor = Executor;

    async fn list(
        &self,
        executor: &Self::Executor,
        filter: &EntryFilter,
    ) -> Result<Vec<PhonebookEntry>, PhonebookRepositoryError> {
        let mut query = phone_book::table
            .filter(phone_book::deleted_date_utc.is_null())
            .select(PhonebookRow::as_select())
            .order_by((phone_book::created_date_utc.asc(), phone_book::id.asc()))
            .into_boxed();

        query = match &filter.selector {
            EntrySelector::ById(id) => query.filter(phone_book::id.eq(*id)),
            EntrySelector::ByFullname(name) => {
                query.filter(phone_book::fullname.ilike(format!("%{}%", escape_like(name))))
            }
            EntrySelector::ByPhoneNumber(phone) => {
                query.filter(phone_book::phone_number.eq(phone.clone()))
            }
            EntrySelector::CreatedAfter(at) => query.filter(phone_book::created_date_utc.gt(*at)),
            EntrySelector::All => query,
        };
        if let Some(limit) = filter.limit {
            query = query.limit(i64::from(limit));
        }

        let mut conn = executor.connection().await.map_err(map_pool_error)?;
        let rows: Vec<PhonebookRow> = query.load(&mut *conn).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(PhonebookEntry::from).collect())
    }

    async fn find_by_id(
        &self,
        executor: &Self::Executor,
        id: Uuid,
    ) -> Result<Option<PhonebookEntry>, PhonebookRepositoryError> {
        let mut conn = executor.connection().await.map_err(map_pool_error)?;

        let row: Option<PhonebookRow> = phone_book::table
            .filter(phone_book::id.eq(id))
            .filter(phone_book::deleted_date_utc.is_null())
            .select(PhonebookRow::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(PhonebookEntry::from))
    }

    async fn find_created_at(
        &self,
        executor: &Self::Executor,
        id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, PhonebookRepositoryError> {
        let mut conn = executor.connection().await.map_err(map_pool_error)?;

        phone_book::table
            .filter(phone_book::id.eq(id))
            .select(phone_book::created_date_utc)
            .first(&mut *conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn insert(
        &self,
        executor: &Self::Executor,
        entry: &PhonebookEntry,
    ) -> Result<(), PhonebookRepositoryError> {
        let mut conn = executor.connection().await.map_err(map_pool_error)?;

        diesel::insert_into(phone_book::table)
            .values(&NewPhonebookRow::from(entry))
            .execute(&mut *conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, entry.phone_number.as_deref()))
    }

    async fn update(
        &self,
        executor: &Self::Executor,
        id: Uuid,
        changes: &EntryChanges,
        stamp: &AuditStamp,
    ) -> Result<(), PhonebookRepositoryError> {
        let mut conn = executor.connection().await.map_err(map_pool_error)?;

        diesel::update(phone_book::table)
            .filter(phone_book::id.eq(id))
            .filter(phone_book::deleted_date_utc.is_null())
            .set(&PhonebookUpdate::new(changes, stamp))
            .execute(&mut *conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, changes.phone_number.as_deref()))
    }

    async fn soft_delete(
        &self,
        executor: &Self::Executor,
        id: Uuid,
        stamp: &AuditStamp,
    ) -> Result<(), PhonebookRepositoryError> {
        let mut conn = executor.connection().await.map_err(map_pool_error)?;

        let removal = PhonebookRemoval {
            deleted_date_utc: stamp.at,
            deleted_by: &stamp.actor,
        };
        diesel::update(phone_book::table)
            .filter(phone_book::id.eq(id))
            .filter(phone_book::deleted_date_utc.is_null())
            .set(&removal)
            .execute(&mut *conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ann", "ann")]
    #[case("50%", "50\\%")]
    #[case("a_b", "a\\_b")]
    #[case("c:\\tmp", "c:\\\\tmp")]
    fn like_metacharacters_are_escaped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_like(input), expected);
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(err, PhonebookRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn not_found_maps_to_query() {
        let err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(err, PhonebookRepositoryError::Query { .. }));
    }
}
