//! Typed request frames.
//!
//! Frames are JSON objects tagged by `op`. The tag, ids and paging fields are
//! typed; a frame that gets those wrong is an invalid request. Body fields
//! are kept as raw JSON and decoded afterwards, so a mistyped or missing
//! field is reported as a validation error naming that field.

use emotion_core::{EmotionInput, ParticipantInput, ValidationError, ValidationRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateParticipant {
        #[serde(default)]
        name: Value,
        #[serde(default)]
        birthdate: Value,
        #[serde(default)]
        phone_last_four: Value,
    },
    GetParticipant {
        id: String,
    },
    ListParticipants {
        offset: Option<u32>,
        limit: Option<u32>,
    },
    CreateEmotion {
        participant_id: String,
        #[serde(flatten)]
        fields: EmotionFields,
    },
    CreateEmotionsBatch {
        participant_id: String,
        #[serde(default)]
        emotions: Value,
    },
    ListParticipantEmotions {
        participant_id: String,
    },
    ListEmotions {
        offset: Option<u32>,
        limit: Option<u32>,
    },
    Health,
    Info,
}

/// Undecoded body of one emotion entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionFields {
    #[serde(default)]
    pub emotion_name: Value,
    #[serde(default)]
    pub intensity: Value,
    #[serde(default)]
    pub color: Value,
    #[serde(default)]
    pub sequence_order: Value,
}

impl From<EmotionInput> for EmotionFields {
    fn from(value: EmotionInput) -> Self {
        Self {
            emotion_name: Value::from(value.emotion_name),
            intensity: Value::from(value.intensity),
            color: value.color.map_or(Value::Null, Value::from),
            sequence_order: Value::from(value.sequence_order),
        }
    }
}

impl EmotionFields {
    /// Reads one batch entry, which must be a JSON object.
    pub fn from_entry(entry: Value) -> Result<Self, ValidationError> {
        match entry {
            Value::Object(_) => {
                serde_json::from_value(entry).map_err(|_| invalid_type("emotions", "object"))
            }
            _ => Err(invalid_type("emotions", "object")),
        }
    }

    /// Decodes field types. Range and length rules are left to
    /// [`EmotionInput::validate`].
    pub fn decode(self) -> Result<EmotionInput, ValidationError> {
        Ok(EmotionInput {
            emotion_name: string_field("emotion_name", self.emotion_name)?,
            intensity: integer_field("intensity", self.intensity)?,
            color: optional_string_field("color", self.color)?,
            sequence_order: integer_field("sequence_order", self.sequence_order)?,
        })
    }
}

/// Operation names accepted in the `op` tag.
pub const OPERATIONS: &[&str] = &[
    "create_participant",
    "get_participant",
    "list_participants",
    "create_emotion",
    "create_emotions_batch",
    "list_participant_emotions",
    "list_emotions",
    "health",
    "info",
];

impl Request {
    /// Parses one JSON frame.
    pub fn from_json(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Value of the `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateParticipant { .. } => "create_participant",
            Self::GetParticipant { .. } => "get_participant",
            Self::ListParticipants { .. } => "list_participants",
            Self::CreateEmotion { .. } => "create_emotion",
            Self::CreateEmotionsBatch { .. } => "create_emotions_batch",
            Self::ListParticipantEmotions { .. } => "list_participant_emotions",
            Self::ListEmotions { .. } => "list_emotions",
            Self::Health => "health",
            Self::Info => "info",
        }
    }
}

pub(crate) fn participant_input(
    name: Value,
    birthdate: Value,
    phone_last_four: Value,
) -> Result<ParticipantInput, ValidationError> {
    Ok(ParticipantInput {
        name: string_field("name", name)?,
        birthdate: string_field("birthdate", birthdate)?,
        phone_last_four: string_field("phone_last_four", phone_last_four)?,
    })
}

/// Unpacks a raw `emotions` value into its entries.
pub(crate) fn emotion_batch(emotions: Value) -> Result<Vec<Value>, ValidationError> {
    match emotions {
        Value::Array(entries) => Ok(entries),
        Value::Null => Err(ValidationError::new("emotions", ValidationRule::Missing)),
        _ => Err(invalid_type("emotions", "array")),
    }
}

fn string_field(field: &'static str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(text) => Ok(text),
        Value::Null => Err(ValidationError::new(field, ValidationRule::Missing)),
        _ => Err(invalid_type(field, "string")),
    }
}

fn optional_string_field(
    field: &'static str,
    value: Value,
) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        other => string_field(field, other).map(Some),
    }
}

fn integer_field(field: &'static str, value: Value) -> Result<i64, ValidationError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| invalid_type(field, "integer")),
        Value::Null => Err(ValidationError::new(field, ValidationRule::Missing)),
        _ => Err(invalid_type(field, "integer")),
    }
}

fn invalid_type(field: &'static str, expected: &'static str) -> ValidationError {
    ValidationError::new(field, ValidationRule::InvalidType { expected })
}
