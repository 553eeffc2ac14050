//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `entity_repo_core` linkage and run one repository round trip
//!   against an in-memory SQLite table.
//! - Keep output deterministic for quick local sanity checks.
//! - File logging starts only when `ENTITY_REPO_LOG_DIR` is set.

use entity_repo_core::{
    init_logging_with, open_db_in_memory, reflect_metadata, Criteria, LogConfig, Record,
    RelationalRepository, SqliteEntityManager, Value,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("entity_repo_core ping={}", entity_repo_core::ping());
    println!("entity_repo_core version={}", entity_repo_core::core_version());
    if let Ok(config) = LogConfig::from_env() {
        if let Err(err) = init_logging_with(&config) {
            eprintln!("entity_repo_core logging disabled: {err}");
        }
    }

    match run_demo() {
        Ok(count) => {
            println!("entity_repo_core demo_count={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("entity_repo_core demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo() -> Result<u64, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, role TEXT);")?;

    let metadata = reflect_metadata(&conn, "Demo\\User", "users")?;
    let manager = SqliteEntityManager::new(&conn);
    let repository = RelationalRepository::new(&manager, metadata);
    for (id, role) in [(1, "admin"), (2, "member"), (3, "member")] {
        repository.add(&Record::new().with("id", id).with("role", role))?;
    }

    let count = repository.count_by(Criteria::new().eq("role", "member"))?;
    let by_magic = repository
        .call("countByRole", &[Value::from("member")])?
        .as_count()
        .unwrap_or_default();
    if by_magic != count {
        return Err(format!("magic count {by_magic} differs from criteria count {count}").into());
    }
    Ok(count)
}
