use entity_repo_core::db::open_db_in_memory;
use entity_repo_core::{
    reflect_metadata, ClassMetadata, Criteria, MagicResult, QueryKind, Record,
    RelationalRepository, RepoError, SqliteEntityManager, Value,
};
use rusqlite::Connection;

const TASK_CLASS: &str = "App\\Entity\\Task";

fn task_metadata() -> ClassMetadata {
    ClassMetadata::new(TASK_CLASS)
        .with_table("tasks")
        .with_identifier("id")
        .with_field("title")
        .with_field("status")
        .with_field("closedAt")
        .with_association("project", "project_id")
}

fn seeded_connection() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            closedAt INTEGER,
            project_id INTEGER
         );",
    )
    .unwrap();

    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());
    let rows = [
        (1, "write docs", "open", None, 10),
        (2, "fix build", "open", None, 10),
        (3, "ship", "done", Some(99_i64), 10),
        (4, "triage", "open", None, 20),
    ];
    for (id, title, status, closed_at, project) in rows {
        repo.add(
            &Record::new()
                .with("id", id)
                .with("title", title)
                .with("status", status)
                .with("closedAt", closed_at)
                .with("project_id", project),
        )
        .unwrap();
    }
    conn
}

fn remaining_ids(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn.prepare("SELECT id FROM tasks ORDER BY id;").unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.collect::<Result<Vec<i64>, _>>().unwrap()
}

#[test]
fn count_by_criteria_is_stable_across_calls() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let criteria = Criteria::new().eq("status", "open").is_null("closedAt");
    let first = repo.count_by(criteria.clone()).unwrap();
    let second = repo.count_by(criteria).unwrap();
    assert_eq!(first, 3);
    assert_eq!(first, second);
}

#[test]
fn count_by_builder_switches_builder_to_count_in_place() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let mut builder = repo.create_query_builder("t").unwrap();
    builder
        .and_where("t.\"project_id\" = :project")
        .set_parameter("project", Value::from(10));

    assert_eq!(repo.count_by(&mut builder).unwrap(), 3);
    assert_eq!(builder.kind(), QueryKind::Count);
}

#[test]
fn count_by_json_criteria_with_null_value() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let criteria = Criteria::try_from(serde_json::json!({
        "project": 10,
        "closedAt": null
    }))
    .unwrap();
    assert_eq!(repo.count_by(criteria).unwrap(), 2);
}

#[test]
fn count_all_counts_every_row() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    assert_eq!(repo.count_all().unwrap(), 4);
}

#[test]
fn count_by_empty_criteria_is_invalid_argument() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let err = repo.count_by(Criteria::new()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
}

#[test]
fn remove_by_deletes_every_match() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let removed = repo.remove_by(&Criteria::new().eq("project", 10)).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(remaining_ids(&conn), vec![4]);
}

#[test]
fn remove_one_by_deletes_lowest_identifier_only() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let removed = repo.remove_one_by(&Criteria::new().eq("status", "open")).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(remaining_ids(&conn), vec![2, 3, 4]);

    let none = repo.remove_one_by(&Criteria::new().eq("status", "archived")).unwrap();
    assert_eq!(none, 0);
    assert_eq!(remaining_ids(&conn), vec![2, 3, 4]);
}

#[test]
fn remove_all_empties_the_table() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    assert_eq!(repo.remove_all().unwrap(), 4);
    assert!(remaining_ids(&conn).is_empty());
}

#[test]
fn count_by_builder_ignores_colons_inside_string_literals() {
    let conn = seeded_connection();
    conn.execute("UPDATE tasks SET title = 'standup 10:am' WHERE id = 4;", []).unwrap();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, task_metadata());

    let mut builder = repo.create_query_builder("e").unwrap();
    builder.and_where("e.\"title\" = 'standup 10:am'");
    assert_eq!(repo.count_by(&mut builder).unwrap(), 1);
}

#[test]
fn criteria_on_digit_leading_column_binds_its_value() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, \"2fa\" INTEGER NOT NULL);
         INSERT INTO accounts (id, \"2fa\") VALUES (1, 1), (2, 0), (3, 1);",
    )
    .unwrap();
    let manager = SqliteEntityManager::new(&conn);
    let metadata = reflect_metadata(&conn, "App\\Entity\\Account", "accounts").unwrap();
    let repo = RelationalRepository::new(&manager, metadata);

    assert_eq!(repo.count_by(Criteria::new().eq("2fa", 1)).unwrap(), 2);
    assert_eq!(repo.count_by(Criteria::new().any_of("2fa", [0, 1])).unwrap(), 3);
}

#[test]
fn remove_one_by_on_table_without_primary_key_uses_rowid() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tags (name TEXT NOT NULL);
         INSERT INTO tags (name) VALUES ('a'), ('b'), ('a');",
    )
    .unwrap();
    let manager = SqliteEntityManager::new(&conn);
    let metadata = reflect_metadata(&conn, "App\\Entity\\Tag", "tags").unwrap();
    let repo = RelationalRepository::new(&manager, metadata);

    assert_eq!(
        repo.call("removeOneByName", &[Value::from("a")]).unwrap(),
        MagicResult::Removed(1)
    );

    let mut stmt = conn.prepare("SELECT rowid FROM tags ORDER BY rowid;").unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    let remaining = rows.collect::<Result<Vec<i64>, _>>().unwrap();
    assert_eq!(remaining, vec![2, 3]);
}

#[test]
fn find_by_default_identifier_without_explicit_declaration() {
    let conn = seeded_connection();
    let manager = SqliteEntityManager::new(&conn);
    let metadata = ClassMetadata::new(TASK_CLASS)
        .with_table("tasks")
        .with_field("title");
    let repo = RelationalRepository::new(&manager, metadata);

    let found = repo
        .call("findById", &[Value::from(3)])
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("title"), Some(&Value::from("ship")));
}
