//! Participant use-case service.
//!
//! # Responsibility
//! - Register participants with identity-triple deduplication.
//! - Load one participant together with its ordered emotion entries.
//!
//! # Invariants
//! - Input is validated before any store access.
//! - A duplicate registration leaves the store unchanged.
//! - Nested entries follow the per-participant order of the emotion store.

use crate::model::emotion::EmotionEntry;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::validation::ParticipantInput;
use crate::repo::emotion_repo::EmotionRepository;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::{Page, RepoResult};
use crate::service::error::{ServiceError, ServiceResult};
use log::{error, info, warn};

/// Participant read model with nested entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantWithEmotions {
    pub participant: Participant,
    /// Ordered by `sequence_order ASC`, ties in creation order.
    pub emotions: Vec<EmotionEntry>,
}

/// Participant service facade over repository implementations.
pub struct ParticipantService<P: ParticipantRepository, E: EmotionRepository> {
    participants: P,
    emotions: E,
}

impl<P: ParticipantRepository, E: EmotionRepository> ParticipantService<P, E> {
    pub fn new(participants: P, emotions: E) -> Self {
        Self {
            participants,
            emotions,
        }
    }

    /// Validates and registers one participant.
    ///
    /// # Errors
    /// - `Validation` for a malformed field (store untouched).
    /// - `DuplicateParticipant` when the identity triple is taken.
    /// - `Storage` for underlying failures.
    pub fn create_participant(&self, input: &ParticipantInput) -> ServiceResult<Participant> {
        let draft = input.validate().map_err(|err| {
            info!(
                "event=participant_create module=service status=rejected error_code=validation_error field={}",
                err.field
            );
            ServiceError::from(err)
        })?;

        let participant = Participant::new(draft);
        match self.participants.insert_participant(&participant) {
            Ok(()) => {
                info!(
                    "event=participant_create module=service status=ok participant_id={}",
                    participant.id
                );
                Ok(participant)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                log_failure("participant_create", &err);
                Err(err)
            }
        }
    }

    /// Loads one participant with all of its emotion entries.
    ///
    /// Both reads share one snapshot.
    pub fn get_participant(&self, id: ParticipantId) -> ServiceResult<ParticipantWithEmotions> {
        let loaded = self.participants.read_snapshot(|| {
            let participant = match self.participants.get_participant(id)? {
                Some(participant) => participant,
                None => return Ok(None),
            };
            let emotions = self.emotions.list_entries_for_participant(id)?;
            Ok(Some(ParticipantWithEmotions {
                participant,
                emotions,
            }))
        });

        logged("participant_get", loaded)?.ok_or(ServiceError::ParticipantNotFound(id))
    }

    /// Lists participants in insertion order.
    pub fn list_participants(&self, page: Page) -> ServiceResult<Vec<Participant>> {
        logged(
            "participant_list",
            self.participants.list_participants(page),
        )
    }
}

/// Lifts a repository result, logging any failure under `event`.
pub(crate) fn logged<T>(event: &str, result: RepoResult<T>) -> ServiceResult<T> {
    result.map_err(|err| {
        let err = ServiceError::from(err);
        log_failure(event, &err);
        err
    })
}

pub(crate) fn log_failure(event: &str, err: &ServiceError) {
    let code = err.kind().code();
    match err {
        ServiceError::Storage(cause) => error!(
            "event={event} module=service status=error error_code={code} error={cause}"
        ),
        _ => warn!("event={event} module=service status=rejected error_code={code}"),
    }
}
