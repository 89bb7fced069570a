//! Participant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist and load participant records.
//! - Enforce identity-triple uniqueness with one conditional insert.
//!
//! # Invariants
//! - Duplicate detection is decided by the UNIQUE index, never by a
//!   separate read.
//! - List order is insertion order (`rowid ASC`).

use crate::model::participant::{Participant, ParticipantId};
use crate::repo::{
    ensure_table_ready, parse_timestamp_ms, parse_uuid, Page, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const PARTICIPANT_COLUMNS: &[&str] = &["id", "name", "birthdate", "phone_last_four", "created_at"];

const PARTICIPANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    birthdate,
    phone_last_four,
    created_at
FROM participants";

pub(crate) const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for participant records.
pub trait ParticipantRepository {
    /// Inserts one participant unless its identity triple is already taken.
    ///
    /// Returns `RepoError::DuplicateParticipant` without writing on conflict.
    fn insert_participant(&self, participant: &Participant) -> RepoResult<()>;
    /// Loads one participant by id.
    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>>;
    /// Reports whether a participant with this id exists.
    fn participant_exists(&self, id: ParticipantId) -> RepoResult<bool>;
    /// Lists participants in insertion order.
    fn list_participants(&self, page: Page) -> RepoResult<Vec<Participant>>;
    /// Deletes one participant; its emotion entries are removed by cascade.
    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()>;
    /// Runs `read` in one deferred transaction so all of its statements see
    /// the same snapshot. Joins an already open transaction instead.
    fn read_snapshot<T>(&self, read: impl FnOnce() -> RepoResult<T>) -> RepoResult<T>;
}

/// SQLite-backed participant repository.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "participants", PARTICIPANT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn insert_participant(&self, participant: &Participant) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO participants (
                id,
                name,
                birthdate,
                phone_last_four,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (name, birthdate, phone_last_four) DO NOTHING;",
            params![
                participant.id.to_string(),
                participant.name.as_str(),
                participant.birthdate.format(BIRTHDATE_FORMAT).to_string(),
                participant.phone_last_four.as_str(),
                participant.created_at.timestamp_millis(),
            ],
        )?;

        if inserted == 0 {
            return Err(RepoError::DuplicateParticipant);
        }
        Ok(())
    }

    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{PARTICIPANT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_participant_row(row)?));
        }
        Ok(None)
    }

    fn participant_exists(&self, id: ParticipantId) -> RepoResult<bool> {
        participant_exists(self.conn, id)
    }

    fn list_participants(&self, page: Page) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{PARTICIPANT_SELECT_SQL} ORDER BY rowid ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(page.limit), i64::from(page.offset)])?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(parse_participant_row(row)?);
        }
        Ok(participants)
    }

    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM participants WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ParticipantNotFound(id));
        }
        Ok(())
    }

    fn read_snapshot<T>(&self, read: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
        if !self.conn.is_autocommit() {
            return read();
        }
        // Dropping `tx` on error rolls back and ends the snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let value = read()?;
        tx.commit()?;
        Ok(value)
    }
}

pub(crate) fn participant_exists(conn: &Connection, id: ParticipantId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM participants WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_participant_row(row: &Row<'_>) -> RepoResult<Participant> {
    let id_text: String = row.get("id")?;
    let birthdate_text: String = row.get("birthdate")?;
    let birthdate = NaiveDate::parse_from_str(&birthdate_text, BIRTHDATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{birthdate_text}` in participants.birthdate"
        ))
    })?;

    Ok(Participant {
        id: parse_uuid(&id_text, "participants.id")?,
        name: row.get("name")?,
        birthdate,
        phone_last_four: row.get("phone_last_four")?,
        created_at: parse_timestamp_ms(row.get("created_at")?, "participants.created_at")?,
    })
}
