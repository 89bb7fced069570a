//! Core domain logic for the emotion research session store.
//! This crate is the single source of truth for participant and emotion
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::emotion::{EmotionEntry, EmotionEntryId};
pub use model::participant::{Participant, ParticipantId};
pub use model::validation::{
    EmotionDraft, EmotionInput, ParticipantDraft, ParticipantInput, ValidationError,
    ValidationRule,
};
pub use repo::emotion_repo::{EmotionRepository, SqliteEmotionRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::{Page, RepoError, RepoResult};
pub use service::emotion_service::EmotionService;
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::participant_service::{ParticipantService, ParticipantWithEmotions};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
