//! Startup schema migrations and SQL seeding.
//!
//! Migrations are embedded from `backend/migrations`. Seeds are plain SQL
//! files named `<version>_<name>.sql`, applied in version order, each in its
//! own transaction. Progress lives in `seed_log`: a seed whose version is
//! below the latest logged version is skipped, as is the latest version once
//! it applied cleanly. A failing seed is logged as dirty and retried on the
//! next start.
//!
//! Everything here is blocking; call it from `spawn_blocking`.

use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::{info, warn};

use super::models::SeedLogRow;
use super::schema::seed_log;

/// Migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failures that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {message}")]
    Connection { message: String },
    #[error("database migration failed: {message}")]
    Migration { message: String },
    #[error("seed directory unreadable ({path}): {message}")]
    SeedDirectory { path: PathBuf, message: String },
    #[error("seed file '{name}' must be named <version>_<name>.sql")]
    SeedName { name: String },
    #[error("seed version {version} is used by more than one file")]
    DuplicateSeedVersion { version: i32 },
    #[error("seed log query failed: {message}")]
    SeedLog { message: String },
    #[error("seed {version} ({name}) failed: {message}")]
    Seed {
        version: i32,
        name: String,
        message: String,
    },
}

/// One SQL seed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
    pub version: i32,
    pub name: String,
    pub sql: String,
}

/// The latest entry of `seed_log`, or the empty state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedStatus {
    pub version: i32,
    pub dirty: bool,
}

impl SeedStatus {
    /// Whether the seed at `version` still has to run.
    #[must_use]
    pub const fn should_apply(self, version: i32) -> bool {
        version > self.version || (version == self.version && self.dirty)
    }
}

impl From<SeedLogRow> for SeedStatus {
    fn from(row: SeedLogRow) -> Self {
        Self {
            version: row.version,
            dirty: row.dirty,
        }
    }
}

/// What a bootstrap run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub migrations: Vec<String>,
    pub seeds: Vec<i32>,
}

/// Parse the numeric version prefix of a seed file name.
///
/// # Errors
/// [`BootstrapError::SeedName`] when the prefix before the first `_` is not
/// a non-negative integer.
pub fn parse_seed_version(file_name: &str) -> Result<i32, BootstrapError> {
    let invalid = || BootstrapError::SeedName {
        name: file_name.to_owned(),
    };
    let (prefix, _) = file_name.split_once('_').ok_or_else(invalid)?;
    prefix
        .parse::<i32>()
        .ok()
        .filter(|version| *version >= 0)
        .ok_or_else(invalid)
}

/// Read every `*.sql` file in `path`, ordered by version.
///
/// # Errors
/// Fails when the directory or a file cannot be read, a file name lacks a
/// version prefix, or two files share a version.
pub fn discover_seeds(path: &Path) -> Result<Vec<SeedFile>, BootstrapError> {
    let io_error = |err: std::io::Error| BootstrapError::SeedDirectory {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(io_error)?;

    let mut seeds = Vec::new();
    for entry in dir.entries().map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(file = ?file_name, "skipping seed file with non-UTF-8 name");
            continue;
        };
        if !name.ends_with(".sql") {
            continue;
        }
        let version = parse_seed_version(name)?;
        let sql = dir.read_to_string(name).map_err(io_error)?;
        seeds.push(SeedFile {
            version,
            name: name.to_owned(),
            sql,
        });
    }

    seeds.sort_by_key(|seed| seed.version);
    let duplicate = seeds.windows(2).find_map(|pair| match pair {
        [left, right] if left.version == right.version => Some(left.version),
        _ => None,
    });
    if let Some(version) = duplicate {
        return Err(BootstrapError::DuplicateSeedVersion { version });
    }
    Ok(seeds)
}

/// Apply all pending embedded migrations.
///
/// # Errors
/// [`BootstrapError::Migration`] when any migration fails.
pub fn run_migrations(conn: &mut PgConnection) -> Result<Vec<String>, BootstrapError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| BootstrapError::Migration {
            message: err.to_string(),
        })?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

fn seed_log_error(err: &diesel::result::Error) -> BootstrapError {
    BootstrapError::SeedLog {
        message: err.to_string(),
    }
}

/// The latest `seed_log` entry.
///
/// # Errors
/// [`BootstrapError::SeedLog`] when the table cannot be read.
pub fn seed_status(conn: &mut PgConnection) -> Result<SeedStatus, BootstrapError> {
    let latest: Option<SeedLogRow> = seed_log::table
        .select(SeedLogRow::as_select())
        .order_by(seed_log::version.desc())
        .first(conn)
        .optional()
        .map_err(|err| seed_log_error(&err))?;
    Ok(latest.map(SeedStatus::from).unwrap_or_default())
}

fn record_seed(conn: &mut PgConnection, row: SeedLogRow) -> QueryResult<usize> {
    diesel::insert_into(seed_log::table)
        .values(&row)
        .on_conflict(seed_log::version)
        .do_update()
        .set(seed_log::dirty.eq(row.dirty))
        .execute(conn)
}

/// Apply each pending seed in its own transaction.
///
/// # Errors
/// [`BootstrapError::Seed`] for the first seed that fails; it is logged as
/// dirty and no later seed runs.
pub fn apply_seeds(
    conn: &mut PgConnection,
    seeds: &[SeedFile],
) -> Result<Vec<i32>, BootstrapError> {
    let status = seed_status(conn)?;
    let mut applied = Vec::new();

    for seed in seeds.iter().filter(|seed| status.should_apply(seed.version)) {
        info!(version = seed.version, name = %seed.name, "applying seed");
        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            tx.batch_execute(&seed.sql)?;
            record_seed(
                tx,
                SeedLogRow {
                    version: seed.version,
                    dirty: false,
                },
            )?;
            Ok(())
        });

        if let Err(err) = outcome {
            let dirty = SeedLogRow {
                version: seed.version,
                dirty: true,
            };
            if let Err(log_err) = record_seed(conn, dirty) {
                warn!(error = %log_err, version = seed.version, "could not mark seed dirty");
            }
            return Err(BootstrapError::Seed {
                version: seed.version,
                name: seed.name.clone(),
                message: err.to_string(),
            });
        }
        applied.push(seed.version);
    }
    Ok(applied)
}

/// Migrate the database at `database_url`, then apply seeds from
/// `seeders_dir` when one is given.
///
/// # Errors
/// Any [`BootstrapError`]; the caller is expected to abort startup.
pub fn bootstrap(
    database_url: &str,
    seeders_dir: Option<&Path>,
) -> Result<BootstrapReport, BootstrapError> {
    let mut conn =
        PgConnection::establish(database_url).map_err(|err| BootstrapError::Connection {
            message: err.to_string(),
        })?;

    let migrations = run_migrations(&mut conn)?;
    info!(count = migrations.len(), "migrations applied");

    let seeds = match seeders_dir {
        Some(dir) => {
            let files = discover_seeds(dir)?;
            apply_seeds(&mut conn, &files)?
        }
        None => Vec::new(),
    };
    info!(count = seeds.len(), "seeds applied");

    Ok(BootstrapReport { migrations, seeds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1_people.sql", 1)]
    #[case("0007_more_people.sql", 7)]
    #[case("20240501_init_data.sql", 20_240_501)]
    fn seed_versions_come_from_the_prefix(#[case] name: &str, #[case] expected: i32) {
        assert_eq!(parse_seed_version(name).expect("valid name"), expected);
    }

    #[rstest]
    #[case("people.sql")]
    #[case("v1_people.sql")]
    #[case("-1_people.sql")]
    fn malformed_seed_names_are_rejected(#[case] name: &str) {
        assert!(matches!(
            parse_seed_version(name),
            Err(BootstrapError::SeedName { .. })
        ));
    }

    #[rstest]
    #[case(SeedStatus::default(), 1, true)]
    #[case(SeedStatus { version: 2, dirty: false }, 1, false)]
    #[case(SeedStatus { version: 2, dirty: false }, 2, false)]
    #[case(SeedStatus { version: 2, dirty: true }, 2, true)]
    #[case(SeedStatus { version: 2, dirty: true }, 3, true)]
    fn pending_seeds_follow_the_log(
        #[case] status: SeedStatus,
        #[case] version: i32,
        #[case] expected: bool,
    ) {
        assert_eq!(status.should_apply(version), expected);
    }

    #[rstest]
    fn discovery_orders_sql_files_by_version() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("10_late.sql"), "SELECT 10;").expect("write");
        std::fs::write(dir.path().join("2_early.sql"), "SELECT 2;").expect("write");
        std::fs::write(dir.path().join("README.md"), "notes").expect("write");

        let seeds = discover_seeds(dir.path()).expect("discover");

        let versions: Vec<i32> = seeds.iter().map(|seed| seed.version).collect();
        assert_eq!(versions, vec![2, 10]);
        assert_eq!(seeds.first().map(|seed| seed.sql.as_str()), Some("SELECT 2;"));
    }

    #[rstest]
    fn discovery_rejects_shared_versions() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("3_a.sql"), "SELECT 1;").expect("write");
        std::fs::write(dir.path().join("03_b.sql"), "SELECT 1;").expect("write");

        assert!(matches!(
            discover_seeds(dir.path()),
            Err(BootstrapError::DuplicateSeedVersion { version: 3 })
        ));
    }

    #[rstest]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent");

        assert!(matches!(
            discover_seeds(&missing),
            Err(BootstrapError::SeedDirectory { .. })
        ));
    }
}
