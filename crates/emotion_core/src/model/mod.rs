//! Domain model for participants and their recorded emotions.
//!
//! # Responsibility
//! - Define the records persisted by the store.
//! - Own the validation rules applied to raw input before persistence.
//!
//! # Invariants
//! - Every record is identified by a generated UUID that never changes.
//! - Records are immutable after creation; there is no update path.
//! - A participant is unique by `(name, birthdate, phone_last_four)`.

pub mod emotion;
pub mod participant;
pub mod validation;

use chrono::{DateTime, Utc};

/// Current UTC time truncated to the millisecond precision kept by storage.
pub(crate) fn storage_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
