use entity_repo_core::db::open_db_in_memory;
use entity_repo_core::{
    ClassMetadata, EntityManager, MagicOperation, MagicResult, QueryBuilder, Record,
    RelationalRepository, RepoError, RepoResult, SqliteEntityManager, Value,
};
use std::cell::{Cell, RefCell};

const DOCUMENT_CLASS: &str = "Tests\\Stubs\\EntityDocumentStub";

/// Engine double that records compiled SQL and answers counts with a fixed
/// value.
#[derive(Default)]
struct RecordingManager {
    statements: RefCell<Vec<String>>,
    executions: Cell<usize>,
    count_result: u64,
}

impl RecordingManager {
    fn with_count(count_result: u64) -> Self {
        Self {
            count_result,
            ..Self::default()
        }
    }

    fn record(&self, query: &QueryBuilder) -> RepoResult<()> {
        let compiled = query.compile()?;
        self.statements.borrow_mut().push(compiled.sql);
        self.executions.set(self.executions.get() + 1);
        Ok(())
    }
}

impl EntityManager for RecordingManager {
    type Record = Record;

    fn fetch(&self, query: &QueryBuilder) -> RepoResult<Vec<Record>> {
        self.record(query)?;
        Ok(Vec::new())
    }

    fn fetch_count(&self, query: &QueryBuilder) -> RepoResult<u64> {
        self.record(query)?;
        Ok(self.count_result)
    }

    fn execute(&self, query: &QueryBuilder) -> RepoResult<u64> {
        self.record(query)?;
        Ok(0)
    }

    fn insert(&self, _table: &str, _record: &Record) -> RepoResult<()> {
        self.executions.set(self.executions.get() + 1);
        Ok(())
    }
}

fn document_metadata() -> ClassMetadata {
    ClassMetadata::new(DOCUMENT_CLASS)
        .with_table("documents")
        .with_identifier("id")
        .with_field("title")
        .with_field("parameter")
        .with_association("owner", "owner_id")
}

#[test]
fn remove_by_without_argument_is_missing_argument() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, ClassMetadata::new(DOCUMENT_CLASS));

    let err = repo.call("removeByParameter", &[]).unwrap_err();
    assert!(matches!(
        &err,
        RepoError::MissingArgument { method, .. } if method == "removeByParameter"
    ));
    assert_eq!(
        err.to_string(),
        format!("You need to pass a parameter to {DOCUMENT_CLASS}::removeByParameter")
    );
    assert_eq!(manager.executions.get(), 0);
}

#[test]
fn remove_one_by_undeclared_field_is_invalid_call() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, ClassMetadata::new(DOCUMENT_CLASS));

    let err = repo
        .call("removeOneByParameter", &[Value::from(0)])
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidCall { ref field, .. } if field == "parameter"));
    let message = err.to_string();
    assert!(message.starts_with(&format!("Invalid call to {DOCUMENT_CLASS}::removeOneBy")));
    assert_eq!(manager.executions.get(), 0);
}

#[test]
fn unknown_prefix_is_no_such_method() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, document_metadata());

    let err = repo.call("purgeByTitle", &[Value::from("x")]).unwrap_err();
    assert!(matches!(err, RepoError::NoSuchMethod { ref method, .. } if method == "purgeByTitle"));

    let err = repo.call("findBy", &[Value::from("x")]).unwrap_err();
    assert!(matches!(err, RepoError::NoSuchMethod { .. }));
    assert_eq!(manager.executions.get(), 0);
}

#[test]
fn count_by_field_builds_count_query() {
    let manager = RecordingManager::with_count(10);
    let repo = RelationalRepository::new(&manager, document_metadata());

    let result = repo.call("countByTitle", &[Value::from("draft")]).unwrap();
    assert_eq!(result, MagicResult::Count(10));

    let statements = manager.statements.borrow();
    assert_eq!(
        statements.as_slice(),
        &["SELECT COUNT(*) FROM \"documents\" AS e WHERE (e.\"title\" = ?)".to_string()]
    );
}

#[test]
fn count_by_twice_with_builder_and_criteria_returns_same_value() {
    let manager = RecordingManager::with_count(10);
    let repo = RelationalRepository::new(&manager, document_metadata());

    let mut builder = QueryBuilder::new();
    assert_eq!(repo.count_by(&mut builder).unwrap(), 10);

    let criteria = entity_repo_core::Criteria::new()
        .eq("fakeField", "fakeValue")
        .eq("nullFakeField", Value::Null);
    assert_eq!(repo.count_by(criteria).unwrap(), 10);

    let statements = manager.statements.borrow();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[1],
        "SELECT COUNT(*) FROM \"documents\" AS e WHERE (e.\"fakeField\" = ?) AND (e.\"nullFakeField\" IS NULL)"
    );
}

#[test]
fn association_suffix_resolves_to_join_column() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, document_metadata());

    let result = repo.call("findByOwner", &[Value::from(5)]).unwrap();
    assert_eq!(result.into_many(), Some(Vec::new()));
    assert!(manager.statements.borrow()[0].contains("e.\"owner_id\" = ?"));
}

#[test]
fn null_argument_becomes_is_null_predicate() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, document_metadata());

    repo.call("findOneByOwner", &[Value::Null]).unwrap();
    let statement = manager.statements.borrow()[0].clone();
    assert!(statement.contains("e.\"owner_id\" IS NULL"));
    assert!(statement.ends_with("LIMIT 1"));
}

#[test]
fn dispatch_validates_field_and_names_generated_method() {
    let manager = RecordingManager::default();
    let repo = RelationalRepository::new(&manager, document_metadata());

    let err = repo
        .dispatch(MagicOperation::RemoveOneBy, "missing", 1)
        .unwrap_err();
    assert!(err.to_string().contains("::removeOneByMissing"));

    let removed = repo
        .dispatch(MagicOperation::RemoveBy, "title", "old")
        .unwrap();
    assert_eq!(removed.as_count(), Some(0));
}

#[test]
fn magic_calls_run_against_sqlite() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE documents (id INTEGER PRIMARY KEY, title TEXT, parameter TEXT, owner_id INTEGER);
         INSERT INTO documents (id, title, parameter, owner_id) VALUES
            (1, 'a', 'x', 7),
            (2, 'b', 'x', 7),
            (3, 'c', 'y', NULL);",
    )
    .unwrap();
    let manager = SqliteEntityManager::new(&conn);
    let repo = RelationalRepository::new(&manager, document_metadata());

    let found = repo
        .call("findByParameter", &[Value::from("x")])
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(found.len(), 2);

    let one = repo
        .call("findOneByTitle", &[Value::from("c")])
        .unwrap()
        .into_one()
        .unwrap()
        .unwrap();
    assert_eq!(one.get("id"), Some(&Value::Integer(3)));

    assert_eq!(
        repo.call("countByOwner", &[Value::from(7)]).unwrap(),
        MagicResult::Count(2)
    );
    assert_eq!(
        repo.call("removeOneByOwner", &[Value::from(7)]).unwrap(),
        MagicResult::Removed(1)
    );
    assert_eq!(
        repo.call("removeByParameter", &[Value::from("x")]).unwrap(),
        MagicResult::Removed(1)
    );
    assert_eq!(repo.count_all().unwrap(), 1);
}
