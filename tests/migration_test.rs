mod helpers;

use glossa::db;
use glossa::db::migrations::{
    get_schema_version, has_review_log, run_migrations, CURRENT_SCHEMA_VERSION,
};

#[test]
fn fresh_db_migrates_to_current_version() {
    let conn = helpers::test_db();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    assert!(has_review_log(&conn).unwrap());
}

#[test]
fn migrations_are_idempotent() {
    let mut conn = helpers::test_db();
    // Running again should be a no-op
    run_migrations(&mut conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn manual_v1_db_upgrades_correctly() {
    // Simulate a v1 database that hasn't been migrated
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), 1);
    assert!(!has_review_log(&conn).unwrap());

    conn.execute(
        "INSERT INTO entries (word, record, updated_at) VALUES ('猫', '{\"word\":\"猫\",\"meaning\":\"cat\"}', '2024-01-01T00:00:00Z')",
        [],
    )
    .unwrap();

    run_migrations(&mut conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    assert!(has_review_log(&conn).unwrap());

    // Existing rows survive the schema upgrade
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn review_log_rejects_quality_two() {
    let conn = helpers::test_db();
    let result = conn.execute(
        "INSERT INTO review_log (word, quality, interval_days, ease_factor, reviewed_at) \
         VALUES ('猫', 2, 1.0, 2.5, 0)",
        [],
    );
    assert!(result.is_err());
}
