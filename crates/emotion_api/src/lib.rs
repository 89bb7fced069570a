//! Request dispatcher for the emotion research session store.
//!
//! # Responsibility
//! - Parse JSON request frames into typed requests.
//! - Run each request against core services on a scoped connection.
//! - Assemble wire representations and machine-readable error kinds.
//!
//! # Invariants
//! - Every request yields exactly one response frame.
//! - Dispatch functions never panic and never return transport errors.

pub mod dispatch;
pub mod request;
pub mod response;

pub use dispatch::{dispatch, handle_json, ApiContext};
pub use request::{EmotionFields, Request};
pub use response::{
    EmotionEntryView, ErrorBody, ParticipantView, ParticipantWithEntriesView, Response,
};
