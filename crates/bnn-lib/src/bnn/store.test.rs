use super::*;
use chrono::Duration;
use tempfile::TempDir;

fn store(temp: &TempDir) -> SessionStore {
    SessionStore::new(temp.path().join("sessions"), 50)
}

fn payload(tag: &str) -> ImagePayload {
    ImagePayload {
        mime_type: "image/png".to_string(),
        data: tag.to_string(),
    }
}

/// Persist a session whose `updated_at` is `minutes` past a fixed origin
fn seeded(store: &SessionStore, id: &str, minutes: i64) -> Session {
    let origin = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let session = Session {
        id: id.to_string(),
        created_at: origin,
        updated_at: origin + Duration::minutes(minutes),
        model: "m1".to_string(),
        input_image: None,
        history: Vec::new(),
    };
    store.save(&session).unwrap();
    session
}

#[test]
fn test_create_persists_fresh_session() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);

    let session = store.create("m1", None).unwrap();
    assert_eq!(session.id.len(), 8);
    assert!(session.id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(session.created_at, session.updated_at);
    assert!(session.history.is_empty());

    assert_eq!(store.get(&session.id), Some(session));
}

#[test]
fn test_ids_are_unique() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let a = store.create("m1", None).unwrap();
    let b = store.create("m1", None).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_three_appends_show_in_single_summary() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let session = store.create("m1", None).unwrap();

    for prompt in ["first", "second", "third"] {
        store
            .append_entry(&session.id, prompt, Path::new("out.png"), None)
            .unwrap()
            .unwrap();
    }

    let summaries = store.list().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].history_count, 3);
    assert_eq!(summaries[0].last_prompt.as_deref(), Some("third"));
}

#[test]
fn test_append_keeps_order_and_monotonic_timestamps() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let session = store.create("m1", None).unwrap();

    store
        .append_entry(&session.id, "a", Path::new("a.png"), None)
        .unwrap();
    let updated = store
        .append_entry(&session.id, "b", Path::new("b.png"), None)
        .unwrap()
        .unwrap();

    let prompts: Vec<&str> = updated.history.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, ["a", "b"]);
    assert!(updated.updated_at >= session.updated_at);
    assert!(updated.history[1].timestamp >= updated.history[0].timestamp);
    assert_eq!(updated.updated_at, updated.history[1].timestamp);
}

#[test]
fn test_append_never_moves_updated_at_backwards() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let mut session = seeded(&store, "future01", 0);
    session.updated_at = Utc::now() + Duration::days(1);
    store.save(&session).unwrap();

    let updated = store
        .append_entry("future01", "p", Path::new("p.png"), None)
        .unwrap()
        .unwrap();
    assert_eq!(updated.updated_at, session.updated_at);
}

#[test]
fn test_append_to_missing_session_is_none() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let result = store
        .append_entry("deadbeef", "p", Path::new("p.png"), None)
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_last_image_data_prefers_newest_payload() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let original = ImageSource::from(payload("original"));
    let session = store.create("m1", Some(original.clone())).unwrap();

    assert_eq!(store.last_image_data(&session.id), Some(original.clone()));

    store
        .append_entry(&session.id, "p1", Path::new("1.png"), Some(payload("first")))
        .unwrap();
    assert_eq!(
        store.last_image_data(&session.id),
        Some(ImageSource::Embedded(payload("first")))
    );

    store
        .append_entry(&session.id, "p2", Path::new("2.png"), None)
        .unwrap();
    assert_eq!(
        store.last_image_data(&session.id),
        Some(ImageSource::Embedded(payload("first")))
    );
}

#[test]
fn test_last_image_data_absent_without_any_image() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let session = store.create("m1", None).unwrap();
    assert_eq!(store.last_image_data(&session.id), None);
    assert_eq!(store.last_image_data("unknown1"), None);
}

#[test]
fn test_corrupt_record_is_treated_as_absent() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    seeded(&store, "good0001", 1);
    fs::write(store.directory().join("bad00001.json"), "{ not json").unwrap();
    fs::write(store.directory().join("notes.txt"), "ignored").unwrap();

    assert!(store.get("bad00001").is_none());
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, ["good0001"]);
}

#[test]
fn test_get_rejects_path_like_ids() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    assert!(store.get("../sessions/x").is_none());
    assert!(store.get("").is_none());
    assert!(!store.delete("../x").unwrap());
}

#[test]
fn test_list_orders_by_recency_then_id() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    seeded(&store, "aaaa0001", 1);
    seeded(&store, "cccc0003", 5);
    seeded(&store, "bbbb0002", 5);

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, ["bbbb0002", "cccc0003", "aaaa0001"]);
    assert_eq!(store.latest().unwrap().unwrap().id, "bbbb0002");
}

#[test]
fn test_list_of_missing_directory_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("absent"), 5);
    assert!(store.list().unwrap().is_empty());
    assert_eq!(store.clear().unwrap(), 0);
}

#[test]
fn test_prune_keeps_most_recent() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    for (minutes, id) in ["s1", "s2", "s3", "s4", "s5"].iter().enumerate() {
        seeded(&store, id, minutes as i64);
    }

    assert_eq!(store.prune(2).unwrap(), 3);
    assert!(store.get("s5").is_some());
    assert!(store.get("s4").is_some());
    for id in ["s1", "s2", "s3"] {
        assert!(store.get(id).is_none(), "{id} should be pruned");
    }

    assert_eq!(store.prune(2).unwrap(), 0);
}

#[test]
fn test_prune_skips_records_it_cannot_remove() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    for (minutes, id) in ["s1", "s2", "s3", "s4", "s5"].iter().enumerate() {
        seeded(&store, id, minutes as i64);
    }

    let removed = store
        .prune_with(2, |path| {
            if path.ends_with("s2.json") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(path)
            }
        })
        .unwrap();

    assert_eq!(removed, 2);
    assert!(store.get("s2").is_some());
    assert!(store.get("s1").is_none());
    assert!(store.get("s3").is_none());
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, ["s5", "s4", "s2"]);
}

#[test]
fn test_record_named_after_another_id_is_ignored() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    seeded(&store, "a0000001", 0);
    seeded(&store, "b0000002", 5);
    let stray = store.directory().join("zzzz9999.json");
    fs::copy(store.directory().join("b0000002.json"), &stray).unwrap();

    assert!(store.get("zzzz9999").is_none());
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, ["b0000002", "a0000001"]);

    assert_eq!(store.prune(1).unwrap(), 1);
    assert!(store.get("b0000002").is_some());
    assert!(store.get("a0000001").is_none());
    // still on disk, so clear would remove it
    assert_eq!(store.record_count().unwrap(), 2);
}

#[test]
fn test_create_applies_retention_cap() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 2);
    seeded(&store, "old00001", 0);
    seeded(&store, "old00002", 1);

    let fresh = store.create("m1", None).unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, [fresh.id, "old00002".to_string()]);
}

#[test]
fn test_delete_and_clear() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    seeded(&store, "one00001", 0);
    seeded(&store, "two00002", 1);
    seeded(&store, "thr00003", 2);

    assert!(store.delete("one00001").unwrap());
    assert!(!store.delete("one00001").unwrap());
    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_record_is_self_describing_json() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let session = store
        .create("m1", Some(ImageSource::Path { path: PathBuf::from("in.png") }))
        .unwrap();

    let raw = fs::read_to_string(store.directory().join(format!("{}.json", session.id))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["model"], "m1");
    assert_eq!(json["input_image"]["kind"], "path");
    assert!(json["history"].as_array().unwrap().is_empty());
}
