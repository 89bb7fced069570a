//! Emotion use-case service.
//!
//! # Responsibility
//! - Record single and batched emotion entries under an existing participant.
//! - List entries per participant and across all participants.
//!
//! # Invariants
//! - An unknown participant is reported as `ParticipantNotFound` before any
//!   input is validated.
//! - A batch is validated completely before the first write; one invalid
//!   entry rejects the whole batch.
//! - Batch writes run in a single store transaction.

use crate::model::emotion::EmotionEntry;
use crate::model::participant::ParticipantId;
use crate::model::validation::EmotionInput;
use crate::repo::emotion_repo::EmotionRepository;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::{Page, RepoError};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::participant_service::{log_failure, logged};
use log::info;

/// Emotion service facade over repository implementations.
pub struct EmotionService<P: ParticipantRepository, E: EmotionRepository> {
    participants: P,
    emotions: E,
}

impl<P: ParticipantRepository, E: EmotionRepository> EmotionService<P, E> {
    pub fn new(participants: P, emotions: E) -> Self {
        Self {
            participants,
            emotions,
        }
    }

    /// Records one emotion entry.
    pub fn create_emotion(
        &self,
        participant_id: ParticipantId,
        input: &EmotionInput,
    ) -> ServiceResult<EmotionEntry> {
        let mut created =
            self.create_emotions(participant_id, std::slice::from_ref(input), false)?;
        created.pop().ok_or_else(|| {
            ServiceError::Storage(RepoError::InvalidData(
                "single emotion insert returned no record".to_string(),
            ))
        })
    }

    /// Records all entries of a batch atomically, returned in input order.
    ///
    /// An empty batch is accepted and writes nothing.
    pub fn create_emotions_batch(
        &self,
        participant_id: ParticipantId,
        inputs: &[EmotionInput],
    ) -> ServiceResult<Vec<EmotionEntry>> {
        self.create_emotions(participant_id, inputs, true)
    }

    /// Lists one participant's entries ordered by `sequence_order`.
    pub fn list_emotions_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> ServiceResult<Vec<EmotionEntry>> {
        self.require_participant(participant_id)?;
        logged(
            "emotion_list_participant",
            self.emotions.list_entries_for_participant(participant_id),
        )
    }

    /// Lists entries across all participants in insertion order.
    pub fn list_all_emotions(&self, page: Page) -> ServiceResult<Vec<EmotionEntry>> {
        logged("emotion_list", self.emotions.list_entries(page))
    }

    fn create_emotions(
        &self,
        participant_id: ParticipantId,
        inputs: &[EmotionInput],
        batch: bool,
    ) -> ServiceResult<Vec<EmotionEntry>> {
        let event = if batch {
            "emotion_batch_create"
        } else {
            "emotion_create"
        };

        let result = self
            .check_participant(participant_id)
            .and_then(|()| build_entries(participant_id, inputs, batch))
            .and_then(|entries| {
                self.emotions.insert_entries(participant_id, &entries)?;
                Ok(entries)
            });

        match &result {
            Ok(entries) => info!(
                "event={event} module=service status=ok participant_id={participant_id} count={}",
                entries.len()
            ),
            Err(err) => log_failure(event, err),
        }
        result
    }

    /// Fails with `ParticipantNotFound` unless `participant_id` is registered.
    pub fn require_participant(&self, participant_id: ParticipantId) -> ServiceResult<()> {
        let result = self.check_participant(participant_id);
        if let Err(err) = &result {
            log_failure("participant_lookup", err);
        }
        result
    }

    fn check_participant(&self, participant_id: ParticipantId) -> ServiceResult<()> {
        if self.participants.participant_exists(participant_id)? {
            Ok(())
        } else {
            Err(ServiceError::ParticipantNotFound(participant_id))
        }
    }
}

fn build_entries(
    participant_id: ParticipantId,
    inputs: &[EmotionInput],
    batch: bool,
) -> ServiceResult<Vec<EmotionEntry>> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            input
                .validate()
                .map(|draft| EmotionEntry::new(participant_id, draft))
                .map_err(|error| ServiceError::Validation {
                    index: batch.then_some(index),
                    error,
                })
        })
        .collect()
}
