//! Eviction scan tests driven by a synthetic clock.

use super::*;

const POLICY: EvictionPolicy = EvictionPolicy {
    max_age_ms: 1_000,
    max_idle_ms: 500,
};

#[test]
fn sweep_with_nothing_expired_deletes_nothing() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::create_report(&db, "fresh", b"x").expect("create");

    let summary = db.sweep_expired(&POLICY, Utc::now()).expect("sweep");
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.deleted, 0);
    assert_eq!(summary.remaining, 1);
}

#[test]
fn sweep_on_empty_registry_reports_zero_counts() {
    let (db, _temp) = setup_temp_db();
    let summary = db.sweep_expired(&POLICY, Utc::now()).expect("sweep");
    assert_eq!(summary, Default::default());
}

#[test]
fn entries_past_max_age_are_evicted_even_if_just_read() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::create_report(&db, "a", b"x").expect("create");
    let now = Utc::now();
    backdate(&db, "a", now - Duration::milliseconds(1_500), Some(now));

    let summary = db.sweep_expired(&POLICY, now).expect("sweep");
    assert_eq!(summary.deleted, 1);
    assert!(db.get_report_meta("a").expect("meta").is_none());
    assert!(db.content.read("a.html").expect("read").is_none());
}

#[test]
fn never_read_entries_are_evicted_after_idle_threshold() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::create_report(&db, "b", b"x").expect("create");

    let summary = db
        .sweep_expired(&POLICY, Utc::now() + Duration::milliseconds(700))
        .expect("sweep");
    assert_eq!(summary.deleted, 1);
    assert!(db.get_report_meta("b").expect("meta").is_none());
}

#[test]
fn recent_reads_keep_entries_under_max_age() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::create_report(&db, "read", b"x").expect("create");
    TransactionOps::create_report(&db, "unread", b"x").expect("create");
    let now = Utc::now();
    backdate(&db, "read", now - Duration::milliseconds(900), Some(now - Duration::milliseconds(100)));
    backdate(&db, "unread", now - Duration::milliseconds(900), None);

    let summary = db.sweep_expired(&POLICY, now).expect("sweep");
    assert_eq!(summary.checked, 2);
    assert_eq!(summary.deleted, 1);
    assert!(db.get_report_meta("read").expect("meta").is_some());
    assert!(db.get_report_meta("unread").expect("meta").is_none());
}

#[test]
fn eviction_clears_group_membership() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::upload_group(&db, "g1", vec![item("old", "x"), item("new", "y")])
        .expect("upload");
    TransactionOps::upload_group(&db, "g2", vec![item("lonely", "z")]).expect("upload");
    let now = Utc::now();
    backdate(&db, "old", now - Duration::seconds(10), None);
    backdate(&db, "lonely", now - Duration::seconds(10), None);

    db.sweep_expired(&POLICY, now).expect("sweep");

    assert_eq!(db.group_members("g1").expect("members"), vec!["new".to_string()]);
    assert!(db.group_members("g2").expect("members").is_empty());
    assert_eq!(db.list_groups().expect("groups").len(), 1);
    assert_groups_match_registry(&db);
    assert_registry_matches_content(&db);
}

#[test]
fn per_entry_delete_failure_does_not_abort_scan() {
    let (db, _temp) = setup_temp_db();
    for key in ["a", "stuck", "z"] {
        TransactionOps::create_report(&db, key, b"x").expect("create");
    }
    let stuck_path = db.content.root().join("stuck.html");
    std::fs::remove_file(&stuck_path).expect("remove");
    std::fs::create_dir(&stuck_path).expect("directory in place of content");

    let summary = db
        .sweep_expired(&POLICY, Utc::now() + Duration::seconds(60))
        .expect("sweep");

    assert_eq!(summary.checked, 3);
    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.remaining, 1);
    assert!(db.get_report_meta("stuck").expect("meta").is_some());
}

#[test]
fn already_missing_content_still_evicts_entry() {
    let (db, _temp) = setup_temp_db();
    TransactionOps::create_report(&db, "gone", b"x").expect("create");
    std::fs::remove_file(db.content.root().join("gone.html")).expect("remove");

    let summary = db
        .sweep_expired(&POLICY, Utc::now() + Duration::seconds(60))
        .expect("sweep");
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.remaining, 0);
}
