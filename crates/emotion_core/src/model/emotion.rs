//! Emotion entry record.
//!
//! # Invariants
//! - Every entry belongs to exactly one participant and is deleted with it.
//! - `sequence_order` is caller-supplied; duplicates and gaps within one
//!   participant are allowed.

use crate::model::participant::ParticipantId;
use crate::model::storage_now;
use crate::model::validation::EmotionDraft;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stable identifier of one emotion entry.
pub type EmotionEntryId = Uuid;

/// One recorded emotion observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionEntry {
    pub id: EmotionEntryId,
    pub participant_id: ParticipantId,
    /// Free-form label such as `anger` or `joy`.
    pub emotion_name: String,
    /// 1..=10.
    pub intensity: u8,
    /// Display color token, stored as given.
    pub color: Option<String>,
    /// Position within the participant's sequence, >= 1.
    pub sequence_order: i64,
    pub created_at: DateTime<Utc>,
}

impl EmotionEntry {
    /// Builds a new entry owned by `participant_id` with a fresh id.
    pub fn new(participant_id: ParticipantId, draft: EmotionDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_id,
            emotion_name: draft.emotion_name,
            intensity: draft.intensity,
            color: draft.color,
            sequence_order: draft.sequence_order,
            created_at: storage_now(),
        }
    }
}
