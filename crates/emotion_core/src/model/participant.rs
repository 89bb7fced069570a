//! Participant record.
//!
//! # Invariants
//! - `id` and `created_at` are assigned once in [`Participant::new`].
//! - Deduplication uses `(name, birthdate, phone_last_four)`, never `id`.

use crate::model::storage_now;
use crate::model::validation::ParticipantDraft;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Stable identifier of one study participant.
pub type ParticipantId = Uuid;

/// One registered study participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub birthdate: NaiveDate,
    /// Exactly four ASCII digits.
    pub phone_last_four: String,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Builds a new participant from validated input with a fresh id.
    pub fn new(draft: ParticipantDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            birthdate: draft.birthdate,
            phone_last_four: draft.phone_last_four,
            created_at: storage_now(),
        }
    }
}
