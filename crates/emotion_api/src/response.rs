//! Response assembly and the wire envelope.
//!
//! # Responsibility
//! - Map core records 1:1 to serializable views.
//! - Map service failures to stable error kinds.
//!
//! # Invariants
//! - Storage failure details never reach the wire; they are logged instead.
//! - Wire field names are snake_case.

use chrono::{DateTime, NaiveDate, Utc};
use emotion_core::{EmotionEntry, Participant, ParticipantWithEmotions, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const INVALID_REQUEST: &str = "invalid_request";
const STORAGE_MESSAGE: &str = "record store operation failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: Uuid,
    pub name: String,
    pub birthdate: NaiveDate,
    pub phone_last_four: String,
    pub created_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantView {
    fn from(value: Participant) -> Self {
        Self {
            id: value.id,
            name: value.name,
            birthdate: value.birthdate,
            phone_last_four: value.phone_last_four,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionEntryView {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub emotion_name: String,
    pub intensity: u8,
    pub color: Option<String>,
    pub sequence_order: i64,
    pub created_at: DateTime<Utc>,
}

impl From<EmotionEntry> for EmotionEntryView {
    fn from(value: EmotionEntry) -> Self {
        Self {
            id: value.id,
            participant_id: value.participant_id,
            emotion_name: value.emotion_name,
            intensity: value.intensity,
            color: value.color,
            sequence_order: value.sequence_order,
            created_at: value.created_at,
        }
    }
}

/// Participant with its entries ordered by `sequence_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantWithEntriesView {
    #[serde(flatten)]
    pub participant: ParticipantView,
    pub emotions: Vec<EmotionEntryView>,
}

impl From<ParticipantWithEmotions> for ParticipantWithEntriesView {
    fn from(value: ParticipantWithEmotions) -> Self {
        Self {
            participant: value.participant.into(),
            emotions: value.emotions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Machine-readable failure carried in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ErrorBody {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: INVALID_REQUEST.to_string(),
            message: message.into(),
            field: None,
            index: None,
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self {
            kind: emotion_core::ErrorKind::NotFound.code().to_string(),
            message: format!("participant not found: {id}"),
            field: None,
            index: None,
        }
    }
}

impl From<&ServiceError> for ErrorBody {
    fn from(value: &ServiceError) -> Self {
        let kind = value.kind().code().to_string();
        match value {
            ServiceError::Validation { index, error } => Self {
                kind,
                message: value.to_string(),
                field: Some(error.field.to_string()),
                index: *index,
            },
            // Already logged with its cause where it was raised.
            ServiceError::Storage(_) => Self {
                kind,
                message: STORAGE_MESSAGE.to_string(),
                field: None,
                index: None,
            },
            ServiceError::ParticipantNotFound(_) | ServiceError::DuplicateParticipant => Self {
                kind,
                message: value.to_string(),
                field: None,
                index: None,
            },
        }
    }
}

/// Response envelope: `{"ok":true,"data":..}` or `{"ok":false,"error":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(err) => {
                log::error!(
                    "event=response_encode module=api status=error error_code={} error={err}",
                    emotion_core::ErrorKind::Storage.code()
                );
                Self::storage_failure()
            }
        }
    }

    pub fn failure(error: ErrorBody) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    /// Generic storage failure. Callers log the cause.
    pub(crate) fn storage_failure() -> Self {
        Self::failure(ErrorBody {
            kind: emotion_core::ErrorKind::Storage.code().to_string(),
            message: STORAGE_MESSAGE.to_string(),
            field: None,
            index: None,
        })
    }

    /// Error kind code for failures, `None` on success.
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.kind.as_str())
    }

    /// Serializes the envelope as one JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"ok":false,"error":{{"kind":"{}","message":"{}"}}}}"#,
                emotion_core::ErrorKind::Storage.code(),
                STORAGE_MESSAGE
            )
        })
    }
}

impl From<ServiceError> for Response {
    fn from(value: ServiceError) -> Self {
        Self::failure(ErrorBody::from(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorBody, ParticipantView, ParticipantWithEntriesView, Response};
    use chrono::{NaiveDate, TimeZone, Utc};
    use emotion_core::{RepoError, ServiceError, ValidationError, ValidationRule};
    use serde_json::json;
    use uuid::Uuid;

    fn view() -> ParticipantView {
        ParticipantView {
            id: Uuid::nil(),
            name: "Kim".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 2).unwrap(),
            phone_last_four: "0123".to_string(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        }
    }

    #[test]
    fn participant_view_uses_snake_case_fields() {
        let value = serde_json::to_value(view()).unwrap();
        assert_eq!(value["birthdate"], json!("1990-01-02"));
        assert_eq!(value["phone_last_four"], json!("0123"));
        assert_eq!(value["created_at"], json!("2023-11-14T22:13:20.123Z"));
    }

    #[test]
    fn nested_view_flattens_participant_fields() {
        let nested = ParticipantWithEntriesView {
            participant: view(),
            emotions: Vec::new(),
        };
        let value = serde_json::to_value(&nested).unwrap();
        assert_eq!(value["name"], json!("Kim"));
        assert_eq!(value["emotions"], json!([]));
    }

    #[test]
    fn validation_error_carries_field_and_index() {
        let err = ServiceError::Validation {
            index: Some(2),
            error: ValidationError {
                field: "intensity",
                rule: ValidationRule::OutOfRange {
                    min: 1,
                    max: Some(10),
                },
            },
        };
        let body = ErrorBody::from(&err);
        assert_eq!(body.kind, "validation_error");
        assert_eq!(body.field.as_deref(), Some("intensity"));
        assert_eq!(body.index, Some(2));
    }

    #[test]
    fn storage_error_hides_details() {
        let err = ServiceError::Storage(RepoError::InvalidData("secret detail".to_string()));
        let response = Response::from(err);
        assert!(!response.ok);
        let body = response.error.unwrap();
        assert_eq!(body.kind, "storage_error");
        assert!(!body.message.contains("secret"));
    }

    #[test]
    fn envelope_omits_absent_members() {
        let line = Response::success(json!({"status": "healthy"})).to_json();
        assert_eq!(line, r#"{"ok":true,"data":{"status":"healthy"}}"#);

        let line = Response::failure(ErrorBody::invalid_request("bad frame")).to_json();
        assert_eq!(
            line,
            r#"{"ok":false,"error":{"kind":"invalid_request","message":"bad frame"}}"#
        );
    }
}
