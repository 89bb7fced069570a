//! Core use-case services.
//!
//! # Responsibility
//! - Enforce business rules (existence, deduplication, batch atomicity)
//!   above the record store.
//! - Keep dispatch layers decoupled from storage details.

pub mod emotion_service;
pub mod error;
pub mod participant_service;
