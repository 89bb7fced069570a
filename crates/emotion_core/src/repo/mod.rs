//! Record store: repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for participants and
//!   emotion entries.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Repositories borrow an explicit connection; there is no global session.
//! - Repository APIs return semantic errors (`ParticipantNotFound`,
//!   `DuplicateParticipant`) in addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod emotion_repo;
pub mod participant_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::participant::ParticipantId;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default page size for list queries.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced participant does not exist.
    ParticipantNotFound(ParticipantId),
    /// Another participant already holds the same identity triple.
    DuplicateParticipant,
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::DuplicateParticipant => write!(f, "participant is already registered"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Offset/limit window over insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    /// Builds a page. Only an absent limit takes the default.
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: normalize_page_limit(limit),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Resolves a list limit: `None` -> 100, an explicit value as given.
pub fn normalize_page_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_LIMIT)
}

pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_timestamp_ms(value: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

#[cfg(test)]
mod tests {
    use super::{normalize_page_limit, Page, DEFAULT_PAGE_LIMIT};

    #[test]
    fn absent_limit_uses_default() {
        assert_eq!(normalize_page_limit(None), DEFAULT_PAGE_LIMIT);
        assert_eq!(Page::default(), Page { offset: 0, limit: 100 });
    }

    #[test]
    fn explicit_limits_pass_through() {
        assert_eq!(normalize_page_limit(Some(0)), 0);
        assert_eq!(normalize_page_limit(Some(2000)), 2000);
        assert_eq!(Page::new(Some(7), Some(3)), Page { offset: 7, limit: 3 });
    }
}
