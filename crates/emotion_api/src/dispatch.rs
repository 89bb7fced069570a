//! Request dispatch over a scoped connection.
//!
//! # Responsibility
//! - Resolve string ids, build repositories and services per request.
//! - Produce exactly one [`Response`] per request.
//!
//! # Invariants
//! - A connection opened by [`ApiContext`] lives for one request only.
//! - Ids that are not UUIDs resolve to `not_found`.

use crate::request::{emotion_batch, participant_input, EmotionFields, Request, OPERATIONS};
use crate::response::{
    EmotionEntryView, ErrorBody, ParticipantView, ParticipantWithEntriesView, Response,
};
use emotion_core::db::open_db;
use emotion_core::{
    core_version, EmotionInput, EmotionService, ErrorKind, Page, ParticipantId,
    ParticipantService, ServiceError, ServiceResult, SqliteEmotionRepository,
    SqliteParticipantRepository, ValidationError,
};
use log::{error, info, warn};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;

const API_NAME: &str = "VR Emotion Research API";

type Participants<'conn> =
    ParticipantService<SqliteParticipantRepository<'conn>, SqliteEmotionRepository<'conn>>;
type Emotions<'conn> =
    EmotionService<SqliteParticipantRepository<'conn>, SqliteEmotionRepository<'conn>>;

/// Request entry point bound to one database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    db_path: PathBuf,
}

impl ApiContext {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Opens a migrated connection, dispatches, and releases the connection.
    pub fn handle(&self, request: Request) -> Response {
        let op = request.op();
        match open_db(&self.db_path) {
            Ok(conn) => dispatch(&conn, request),
            // The cause, including the path, is logged by `db_open`.
            Err(err) => {
                warn!(
                    "event=request module=api op={op} status=error error_code={}",
                    err.code()
                );
                Response::storage_failure()
            }
        }
    }

    /// JSON frame in, JSON frame out.
    pub fn handle_json(&self, frame: &str) -> String {
        match parse_frame(frame) {
            Ok(request) => self.handle(request).to_json(),
            Err(response) => response.to_json(),
        }
    }
}

/// Runs one request on an already opened connection.
pub fn dispatch(conn: &Connection, request: Request) -> Response {
    let started_at = Instant::now();
    let op = request.op();

    let response = run(conn, request);
    match response.error_kind() {
        None => info!(
            "event=request module=api op={op} status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Some(code) => info!(
            "event=request module=api op={op} status=error duration_ms={} error_code={code}",
            started_at.elapsed().as_millis()
        ),
    }
    response
}

/// Parses and dispatches one JSON frame on an opened connection.
pub fn handle_json(conn: &Connection, frame: &str) -> String {
    match parse_frame(frame) {
        Ok(request) => dispatch(conn, request).to_json(),
        Err(response) => response.to_json(),
    }
}

fn parse_frame(frame: &str) -> Result<Request, Response> {
    Request::from_json(frame).map_err(|err| {
        warn!("event=request module=api status=error error_code=invalid_request");
        Response::failure(ErrorBody::invalid_request(format!(
            "malformed request: {err}"
        )))
    })
}

fn run(conn: &Connection, request: Request) -> Response {
    match request {
        Request::CreateParticipant {
            name,
            birthdate,
            phone_last_four,
        } => respond(participants(conn).and_then(|service| {
            let input = participant_input(name, birthdate, phone_last_four)?;
            service
                .create_participant(&input)
                .map(ParticipantView::from)
        })),
        Request::GetParticipant { id } => with_participant_id(&id, |id| {
            respond(participants(conn).and_then(|service| {
                service
                    .get_participant(id)
                    .map(ParticipantWithEntriesView::from)
            }))
        }),
        Request::ListParticipants { offset, limit } => {
            respond(participants(conn).and_then(|service| {
                service
                    .list_participants(Page::new(offset, limit))
                    .map(views::<_, ParticipantView>)
            }))
        }
        Request::CreateEmotion {
            participant_id,
            fields,
        } => with_participant_id(&participant_id, |id| {
            respond(emotions(conn).and_then(|service| {
                service.require_participant(id)?;
                let input = fields.decode()?;
                service
                    .create_emotion(id, &input)
                    .map(EmotionEntryView::from)
            }))
        }),
        Request::CreateEmotionsBatch {
            participant_id,
            emotions: raw,
        } => with_participant_id(&participant_id, |id| {
            respond(emotions(conn).and_then(|service| {
                service.require_participant(id)?;
                let inputs = decode_batch(raw)?;
                service
                    .create_emotions_batch(id, &inputs)
                    .map(views::<_, EmotionEntryView>)
            }))
        }),
        Request::ListParticipantEmotions { participant_id } => {
            with_participant_id(&participant_id, |id| {
                respond(emotions(conn).and_then(|service| {
                    service
                        .list_emotions_for_participant(id)
                        .map(views::<_, EmotionEntryView>)
                }))
            })
        }
        Request::ListEmotions { offset, limit } => respond(emotions(conn).and_then(|service| {
            service
                .list_all_emotions(Page::new(offset, limit))
                .map(views::<_, EmotionEntryView>)
        })),
        Request::Health => health(conn),
        Request::Info => Response::success(json!({
            "name": API_NAME,
            "version": core_version(),
            "operations": OPERATIONS,
        })),
    }
}

fn health(conn: &Connection) -> Response {
    match conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => Response::success(json!({
            "status": "healthy",
            "database": "connected",
        })),
        Err(err) => {
            error!("event=health module=api status=error error_code=db_unreachable error={err}");
            Response::storage_failure()
        }
    }
}

fn participants(conn: &Connection) -> ServiceResult<Participants<'_>> {
    let (participants, emotions) = repositories(conn)?;
    Ok(ParticipantService::new(participants, emotions))
}

fn emotions(conn: &Connection) -> ServiceResult<Emotions<'_>> {
    let (participants, emotions) = repositories(conn)?;
    Ok(EmotionService::new(participants, emotions))
}

fn repositories(
    conn: &Connection,
) -> ServiceResult<(SqliteParticipantRepository<'_>, SqliteEmotionRepository<'_>)> {
    SqliteParticipantRepository::try_new(conn)
        .and_then(|participants| Ok((participants, SqliteEmotionRepository::try_new(conn)?)))
        .map_err(|err| {
            error!(
                "event=repo_init module=api status=error error_code={} error={err}",
                ErrorKind::Storage.code()
            );
            ServiceError::from(err)
        })
}

/// Decodes and validates batch entries in input order, so the reported
/// index is the first entry that fails any rule.
fn decode_batch(raw: Value) -> ServiceResult<Vec<EmotionInput>> {
    let rejected = |index: Option<usize>, error: ValidationError| ServiceError::Validation {
        index,
        error,
    };

    let entries = emotion_batch(raw).map_err(|error| rejected(None, error))?;
    let mut inputs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let input = EmotionFields::from_entry(entry)
            .and_then(EmotionFields::decode)
            .map_err(|error| rejected(Some(index), error))?;
        input
            .validate()
            .map_err(|error| rejected(Some(index), error))?;
        inputs.push(input);
    }
    Ok(inputs)
}

fn with_participant_id(raw: &str, f: impl FnOnce(ParticipantId) -> Response) -> Response {
    match ParticipantId::parse_str(raw) {
        Ok(id) => f(id),
        Err(_) => Response::failure(ErrorBody::not_found(raw)),
    }
}

fn respond<T: serde::Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(data) => Response::success(data),
        Err(err) => Response::from(err),
    }
}

fn views<T, V: From<T>>(items: Vec<T>) -> Vec<V> {
    items.into_iter().map(V::from).collect()
}
