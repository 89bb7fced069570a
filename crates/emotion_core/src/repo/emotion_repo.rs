//! Emotion entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist emotion entries for one participant, one call per transaction.
//! - Load entries by owning participant with explicit ordering.
//!
//! # Invariants
//! - `insert_entries` writes all rows of the call or none of them.
//! - Per-participant listing is `sequence_order ASC, rowid ASC`, so equal
//!   orders keep creation order.
//! - Global listing is insertion order (`rowid ASC`).

use crate::model::emotion::EmotionEntry;
use crate::model::participant::ParticipantId;
use crate::model::validation::{INTENSITY_MAX, INTENSITY_MIN};
use crate::repo::participant_repo::participant_exists;
use crate::repo::{
    ensure_table_ready, parse_timestamp_ms, parse_uuid, Page, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const EMOTION_COLUMNS: &[&str] = &[
    "id",
    "participant_id",
    "emotion_name",
    "intensity",
    "color",
    "sequence_order",
    "created_at",
];

const EMOTION_SELECT_SQL: &str = "SELECT
    id,
    participant_id,
    emotion_name,
    intensity,
    color,
    sequence_order,
    created_at
FROM emotion_entries";

/// Repository interface for emotion entry records.
pub trait EmotionRepository {
    /// Inserts all entries for `participant_id` in one transaction.
    ///
    /// Fails with `ParticipantNotFound` when the owner is missing, and with
    /// `InvalidData` when an entry names a different owner. Any failure
    /// leaves no rows from this call behind.
    fn insert_entries(
        &self,
        participant_id: ParticipantId,
        entries: &[EmotionEntry],
    ) -> RepoResult<()>;
    /// Lists all entries of one participant ordered by `sequence_order`.
    fn list_entries_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> RepoResult<Vec<EmotionEntry>>;
    /// Lists entries across all participants in insertion order.
    fn list_entries(&self, page: Page) -> RepoResult<Vec<EmotionEntry>>;
}

/// SQLite-backed emotion entry repository.
pub struct SqliteEmotionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmotionRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "emotion_entries", EMOTION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl EmotionRepository for SqliteEmotionRepository<'_> {
    fn insert_entries(
        &self,
        participant_id: ParticipantId,
        entries: &[EmotionEntry],
    ) -> RepoResult<()> {
        if let Some(foreign) = entries
            .iter()
            .find(|entry| entry.participant_id != participant_id)
        {
            return Err(RepoError::InvalidData(format!(
                "emotion entry {} belongs to participant {}, expected {participant_id}",
                foreign.id, foreign.participant_id
            )));
        }

        // Dropping `tx` without commit rolls back every row written so far.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !participant_exists(&tx, participant_id)? {
            return Err(RepoError::ParticipantNotFound(participant_id));
        }

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO emotion_entries (
                    id,
                    participant_id,
                    emotion_name,
                    intensity,
                    color,
                    sequence_order,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.id.to_string(),
                    participant_id.to_string(),
                    entry.emotion_name.as_str(),
                    i64::from(entry.intensity),
                    entry.color.as_deref(),
                    entry.sequence_order,
                    entry.created_at.timestamp_millis(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn list_entries_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> RepoResult<Vec<EmotionEntry>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{EMOTION_SELECT_SQL}
             WHERE participant_id = ?1
             ORDER BY sequence_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([participant_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_emotion_row(row)?);
        }
        Ok(entries)
    }

    fn list_entries(&self, page: Page) -> RepoResult<Vec<EmotionEntry>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{EMOTION_SELECT_SQL} ORDER BY rowid ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(page.limit), i64::from(page.offset)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_emotion_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_emotion_row(row: &Row<'_>) -> RepoResult<EmotionEntry> {
    let id_text: String = row.get("id")?;
    let participant_text: String = row.get("participant_id")?;

    let raw_intensity: i64 = row.get("intensity")?;
    if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&raw_intensity) {
        return Err(RepoError::InvalidData(format!(
            "invalid intensity `{raw_intensity}` in emotion_entries.intensity"
        )));
    }

    let sequence_order: i64 = row.get("sequence_order")?;
    if sequence_order < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid sequence order `{sequence_order}` in emotion_entries.sequence_order"
        )));
    }

    Ok(EmotionEntry {
        id: parse_uuid(&id_text, "emotion_entries.id")?,
        participant_id: parse_uuid(&participant_text, "emotion_entries.participant_id")?,
        emotion_name: row.get("emotion_name")?,
        intensity: raw_intensity as u8,
        color: row.get("color")?,
        sequence_order,
        created_at: parse_timestamp_ms(row.get("created_at")?, "emotion_entries.created_at")?,
    })
}
