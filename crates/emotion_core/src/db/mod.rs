//! Record store bootstrap: connection setup and schema versioning.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No participant or emotion data is read or written before migrations
//!   succeed.
//! - File open failures carry the database path they were attempted on.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// The file was migrated by a newer build than this one.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
            Self::Sqlite(_) => "db_sqlite_error",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open record store at {}: {source}", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "record store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
