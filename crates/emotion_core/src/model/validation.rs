//! Field validation for raw participant and emotion input.
//!
//! # Responsibility
//! - Turn raw input into validated drafts or a field-specific error.
//!
//! # Invariants
//! - Validation never touches storage.
//! - Accepted values are passed through unchanged (no trimming or case
//!   folding), so reads return exactly what was supplied.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MAX_CHARS: usize = 100;
pub const EMOTION_NAME_MAX_CHARS: usize = 50;
pub const PHONE_LAST_FOUR_LEN: usize = 4;
pub const INTENSITY_MIN: i64 = 1;
pub const INTENSITY_MAX: i64 = 10;
pub const SEQUENCE_ORDER_MIN: i64 = 1;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid iso date regex"));

/// Rule violated by one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Fewer characters than allowed.
    TooShort { min: usize },
    /// More characters than allowed.
    TooLong { max: usize },
    /// Character count differs from the required exact length.
    InvalidLength { expected: usize },
    /// Contains a character other than `0-9`.
    NotDigits,
    /// Not a `YYYY-MM-DD` calendar date.
    InvalidDate,
    /// Integer outside the accepted range. `max = None` means unbounded.
    OutOfRange { min: i64, max: Option<i64> },
    /// Required field absent or `null`.
    Missing,
    /// Field present with a JSON type other than `expected`.
    InvalidType { expected: &'static str },
}

/// Validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub rule: ValidationRule,
}

impl ValidationError {
    pub fn new(field: &'static str, rule: ValidationRule) -> Self {
        Self { field, rule }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let field = self.field;
        match self.rule {
            ValidationRule::TooShort { min } => {
                write!(f, "`{field}` must be at least {min} character(s)")
            }
            ValidationRule::TooLong { max } => {
                write!(f, "`{field}` must be at most {max} character(s)")
            }
            ValidationRule::InvalidLength { expected } => {
                write!(f, "`{field}` must be exactly {expected} character(s)")
            }
            ValidationRule::NotDigits => write!(f, "`{field}` must contain only digits 0-9"),
            ValidationRule::InvalidDate => {
                write!(f, "`{field}` must be a calendar date formatted YYYY-MM-DD")
            }
            ValidationRule::OutOfRange { min, max: Some(max) } => {
                write!(f, "`{field}` must be between {min} and {max}")
            }
            ValidationRule::OutOfRange { min, max: None } => {
                write!(f, "`{field}` must be at least {min}")
            }
            ValidationRule::Missing => write!(f, "`{field}` is required"),
            ValidationRule::InvalidType { expected } => {
                write!(f, "`{field}` must be of type {expected}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Raw participant registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInput {
    pub name: String,
    /// `YYYY-MM-DD`.
    pub birthdate: String,
    pub phone_last_four: String,
}

/// Participant input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantDraft {
    pub name: String,
    pub birthdate: NaiveDate,
    pub phone_last_four: String,
}

/// Raw input for one emotion entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionInput {
    pub emotion_name: String,
    pub intensity: i64,
    #[serde(default)]
    pub color: Option<String>,
    pub sequence_order: i64,
}

/// Emotion input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionDraft {
    pub emotion_name: String,
    pub intensity: u8,
    pub color: Option<String>,
    pub sequence_order: i64,
}

impl ParticipantInput {
    /// Validates all participant fields, reporting the first violation.
    ///
    /// Fields are checked in order `name`, `birthdate`, `phone_last_four`.
    pub fn validate(&self) -> Result<ParticipantDraft, ValidationError> {
        check_char_len("name", &self.name, 1, NAME_MAX_CHARS)?;
        let birthdate = parse_birthdate(&self.birthdate)?;
        check_phone_last_four(&self.phone_last_four)?;

        Ok(ParticipantDraft {
            name: self.name.clone(),
            birthdate,
            phone_last_four: self.phone_last_four.clone(),
        })
    }
}

impl EmotionInput {
    /// Validates all emotion fields, reporting the first violation.
    ///
    /// `color` is free-form and never rejected.
    pub fn validate(&self) -> Result<EmotionDraft, ValidationError> {
        check_char_len("emotion_name", &self.emotion_name, 1, EMOTION_NAME_MAX_CHARS)?;
        let intensity = check_range(
            "intensity",
            self.intensity,
            INTENSITY_MIN,
            Some(INTENSITY_MAX),
        )?;
        let sequence_order =
            check_range("sequence_order", self.sequence_order, SEQUENCE_ORDER_MIN, None)?;

        Ok(EmotionDraft {
            emotion_name: self.emotion_name.clone(),
            // In range 1..=10 after the check above.
            intensity: intensity as u8,
            color: self.color.clone(),
            sequence_order,
        })
    }
}

fn check_char_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if count < min {
        return Err(ValidationError::new(field, ValidationRule::TooShort { min }));
    }
    if count > max {
        return Err(ValidationError::new(field, ValidationRule::TooLong { max }));
    }
    Ok(())
}

fn check_phone_last_four(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() != PHONE_LAST_FOUR_LEN {
        return Err(ValidationError::new(
            "phone_last_four",
            ValidationRule::InvalidLength {
                expected: PHONE_LAST_FOUR_LEN,
            },
        ));
    }
    if !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "phone_last_four",
            ValidationRule::NotDigits,
        ));
    }
    Ok(())
}

fn parse_birthdate(value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::new("birthdate", ValidationRule::InvalidDate);
    if !ISO_DATE_RE.is_match(value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: Option<i64>,
) -> Result<i64, ValidationError> {
    let above_max = max.is_some_and(|max| value > max);
    if value < min || above_max {
        return Err(out_of_range(field, min, max));
    }
    Ok(value)
}

fn out_of_range(field: &'static str, min: i64, max: Option<i64>) -> ValidationError {
    ValidationError::new(field, ValidationRule::OutOfRange { min, max })
}
