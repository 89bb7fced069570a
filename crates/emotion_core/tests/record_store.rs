use chrono::NaiveDate;
use emotion_core::db::migrations::latest_version;
use emotion_core::db::open_db_in_memory;
use emotion_core::{
    EmotionEntry, EmotionInput, EmotionRepository, Page, Participant, ParticipantInput,
    ParticipantRepository, RepoError, SqliteEmotionRepository, SqliteParticipantRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn participant(name: &str) -> Participant {
    let draft = ParticipantInput {
        name: name.to_string(),
        birthdate: "2001-07-15".to_string(),
        phone_last_four: "5678".to_string(),
    }
    .validate()
    .unwrap();
    Participant::new(draft)
}

fn entry(owner: &Participant, name: &str, sequence_order: i64) -> EmotionEntry {
    let draft = EmotionInput {
        emotion_name: name.to_string(),
        intensity: 6,
        color: Some("#3366FF".to_string()),
        sequence_order,
    }
    .validate()
    .unwrap();
    EmotionEntry::new(owner.id, draft)
}

fn count_entries(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM emotion_entries;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn participant_insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let created = participant("Lee Jiwon");
    repo.insert_participant(&created).unwrap();

    let loaded = repo.get_participant(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.birthdate, NaiveDate::from_ymd_opt(2001, 7, 15).unwrap());
    assert!(repo.participant_exists(created.id).unwrap());
    assert!(repo.get_participant(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn identical_triple_is_rejected_by_conditional_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let first = participant("Park Seoyeon");
    let second = participant("Park Seoyeon");
    assert_ne!(first.id, second.id);

    repo.insert_participant(&first).unwrap();
    let err = repo.insert_participant(&second).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateParticipant));

    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM participants;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 1);
    assert!(repo.get_participant(second.id).unwrap().is_none());
}

#[test]
fn same_name_with_different_phone_is_a_different_participant() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let first = participant("Choi Yuna");
    let mut second = participant("Choi Yuna");
    second.phone_last_four = "0000".to_string();

    repo.insert_participant(&first).unwrap();
    repo.insert_participant(&second).unwrap();
    assert_eq!(repo.list_participants(Page::default()).unwrap().len(), 2);
}

#[test]
fn participant_list_uses_insertion_order_and_pagination() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let created: Vec<Participant> = ["c", "a", "b"].iter().map(|n| participant(n)).collect();
    for item in &created {
        repo.insert_participant(item).unwrap();
    }

    let all: Vec<_> = repo
        .list_participants(Page::default())
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(all, vec!["c", "a", "b"]);

    let page = repo.list_participants(Page::new(Some(1), Some(1))).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, created[1].id);
}

#[test]
fn batch_insert_rolls_back_when_a_later_row_fails() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let owner = participant("Rollback");
    participants.insert_participant(&owner).unwrap();

    let first = entry(&owner, "anger", 1);
    let mut clash = entry(&owner, "joy", 2);
    clash.id = first.id;

    let err = emotions
        .insert_entries(owner.id, &[first, entry(&owner, "sadness", 3), clash])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(count_entries(&conn), 0);
}

#[test]
fn store_constraints_reject_out_of_range_rows() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let owner = participant("Checks");
    participants.insert_participant(&owner).unwrap();

    let mut bad = entry(&owner, "fear", 1);
    bad.intensity = 15;
    let err = emotions
        .insert_entries(owner.id, &[entry(&owner, "calm", 1), bad])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(count_entries(&conn), 0);
}

#[test]
fn batch_insert_requires_existing_owner() {
    let conn = open_db_in_memory().unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let ghost = participant("Ghost");
    let err = emotions
        .insert_entries(ghost.id, &[entry(&ghost, "anger", 1)])
        .unwrap_err();
    assert!(matches!(err, RepoError::ParticipantNotFound(id) if id == ghost.id));
}

#[test]
fn batch_insert_rejects_entries_of_another_owner() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let owner = participant("Owner");
    let other = participant("Other");
    participants.insert_participant(&owner).unwrap();
    participants.insert_participant(&other).unwrap();

    let err = emotions
        .insert_entries(owner.id, &[entry(&owner, "joy", 1), entry(&other, "joy", 1)])
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(count_entries(&conn), 0);
}

#[test]
fn entries_are_listed_by_sequence_order_then_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let owner = participant("Ordering");
    participants.insert_participant(&owner).unwrap();

    let batch = vec![
        entry(&owner, "third", 3),
        entry(&owner, "first-a", 1),
        entry(&owner, "second", 2),
        entry(&owner, "first-b", 1),
    ];
    emotions.insert_entries(owner.id, &batch).unwrap();

    let names: Vec<_> = emotions
        .list_entries_for_participant(owner.id)
        .unwrap()
        .into_iter()
        .map(|e| e.emotion_name)
        .collect();
    assert_eq!(names, vec!["first-a", "first-b", "second", "third"]);

    let global: Vec<_> = emotions
        .list_entries(Page::default())
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    let inserted: Vec<_> = batch.iter().map(|e| e.id).collect();
    assert_eq!(global, inserted);
}

#[test]
fn deleting_participant_cascades_to_entries() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();

    let owner = participant("Cascade");
    let keeper = participant("Keeper");
    participants.insert_participant(&owner).unwrap();
    participants.insert_participant(&keeper).unwrap();
    emotions
        .insert_entries(owner.id, &[entry(&owner, "anger", 1), entry(&owner, "joy", 2)])
        .unwrap();
    emotions
        .insert_entries(keeper.id, &[entry(&keeper, "calm", 1)])
        .unwrap();

    participants.delete_participant(owner.id).unwrap();

    assert!(emotions.list_entries_for_participant(owner.id).unwrap().is_empty());
    assert_eq!(count_entries(&conn), 1);
    assert!(matches!(
        participants.delete_participant(owner.id),
        Err(RepoError::ParticipantNotFound(_))
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteParticipantRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_table_or_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();
    assert!(matches!(
        SqliteEmotionRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("emotion_entries"))
    ));

    conn.execute_batch(
        "CREATE TABLE participants (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            birthdate TEXT NOT NULL
        );",
    )
    .unwrap();
    assert!(matches!(
        SqliteParticipantRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "participants",
            column: "phone_last_four"
        })
    ));
}

#[test]
fn corrupted_rows_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO participants (id, name, birthdate, phone_last_four, created_at)
         VALUES ('not-a-uuid', 'x', '2000-01-01', '1234', 0);",
        [],
    )
    .unwrap();
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let err = repo.list_participants(Page::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("participants.id")));
}

#[test]
fn read_snapshot_runs_reads_in_one_transaction() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    let emotions = SqliteEmotionRepository::try_new(&conn).unwrap();
    let owner = participant("Snapshot");
    participants.insert_participant(&owner).unwrap();

    let (inside_transaction, loaded) = participants
        .read_snapshot(|| {
            let loaded = participants.get_participant(owner.id)?;
            let entries = emotions.list_entries_for_participant(owner.id)?;
            assert!(entries.is_empty());
            Ok((!conn.is_autocommit(), loaded))
        })
        .unwrap();
    assert!(inside_transaction);
    assert_eq!(loaded, Some(owner));
    assert!(conn.is_autocommit());

    let failed: Result<(), RepoError> =
        participants.read_snapshot(|| Err(RepoError::InvalidData("stop".to_string())));
    assert!(matches!(failed, Err(RepoError::InvalidData(_))));
    assert!(conn.is_autocommit());
}

#[test]
fn read_snapshot_joins_an_open_transaction() {
    let conn = open_db_in_memory().unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();

    conn.execute_batch("BEGIN;").unwrap();
    let count = participants
        .read_snapshot(|| participants.list_participants(Page::default()))
        .unwrap()
        .len();
    assert_eq!(count, 0);
    assert!(!conn.is_autocommit());
    conn.execute_batch("COMMIT;").unwrap();
}
