pub mod queries;

use crate::record::{LogRecord, NewLogRecord, STORED_TIMESTAMP_FORMAT, parse_stored_timestamp};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn insert_log(&self, record: &NewLogRecord, created_at: i64) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO logs (owner, date, exercise, weight, reps, one_rm, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.owner,
                    record.date.format(STORED_TIMESTAMP_FORMAT).to_string(),
                    record.exercise,
                    record.weight,
                    record.reps,
                    record.one_rm,
                    created_at
                ],
            )
            .context("Failed to insert log record")?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_log(&self, owner: &str, id: i64) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM logs WHERE owner = ?1 AND id = ?2",
                params![owner, id],
            )
            .context("Failed to delete log record")
    }

    pub fn logs_for_owner(&self, owner: &str) -> Result<Vec<LogRecord>> {
        let mut statement = self.conn.prepare(queries::SELECT_LOGS_FOR_OWNER)?;

        let rows = statement
            .query_map(params![owner], |row| {
                let date: String = row.get(1)?;
                Ok(LogRecord {
                    id: row.get(0)?,
                    date: parse_stored_timestamp(&date),
                    exercise: row.get(2)?,
                    weight: row.get(3)?,
                    reps: row.get(4)?,
                    one_rm: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query log records")?;

        Ok(rows)
    }

    pub fn latest_log_timestamp(&self, owner: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT created_at FROM logs WHERE owner = ?1 ORDER BY created_at DESC LIMIT 1",
                params![owner],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query latest log timestamp")
    }

    pub fn load_document(&self, owner: &str, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT body FROM documents WHERE owner = ?1 AND name = ?2",
                params![owner, name],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to load document: {name}"))
    }

    pub fn upsert_document(
        &self,
        owner: &str,
        name: &str,
        body: &str,
        updated_at: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO documents (owner, name, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(owner, name)
                 DO UPDATE SET body=excluded.body, updated_at=excluded.updated_at",
                params![owner, name, body, updated_at],
            )
            .with_context(|| format!("Failed to upsert document: {name}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::record::NewLogRecord;
    use chrono::NaiveDate;
    use rusqlite::params;

    fn new_record(owner: &str, day: u32, exercise: &str) -> NewLogRecord {
        NewLogRecord {
            owner: owner.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day)
                .and_then(|date| date.and_hms_opt(18, 30, 0))
                .expect("timestamp"),
            exercise: exercise.to_string(),
            weight: 100.0,
            reps: 5,
            one_rm: 116.7,
        }
    }

    #[test]
    fn logs_are_scoped_per_owner_and_sorted_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::open(&dir.path().join("db").join("liftlog.db")).expect("db");

        database.insert_log(&new_record("a", 10, "ベンチプレス"), 1).expect("insert");
        database.insert_log(&new_record("a", 12, "スクワット"), 2).expect("insert");
        database.insert_log(&new_record("b", 11, "ベンチプレス"), 3).expect("insert");

        let logs = database.logs_for_owner("a").expect("logs");

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].exercise, "スクワット");
        assert_eq!(logs[1].one_rm, 116.7);
        assert_eq!(database.latest_log_timestamp("a").expect("latest"), Some(2));
    }

    #[test]
    fn unparseable_stored_date_surfaces_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::open(&dir.path().join("liftlog.db")).expect("db");

        database
            .conn
            .execute(
                "INSERT INTO logs (owner, date, exercise, weight, reps, one_rm, created_at) VALUES ('a', 'garbage', 'x', 1.0, 1, 1.0, 0)",
                params![],
            )
            .expect("raw insert");

        let logs = database.logs_for_owner("a").expect("logs");
        assert_eq!(logs.len(), 1);
        assert!(logs[0].date.is_none());
    }

    #[test]
    fn delete_only_touches_owner_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::open(&dir.path().join("liftlog.db")).expect("db");
        let id = database.insert_log(&new_record("a", 10, "ベンチプレス"), 1).expect("insert");

        assert_eq!(database.delete_log("b", id).expect("delete"), 0);
        assert_eq!(database.delete_log("a", id).expect("delete"), 1);
    }

    #[test]
    fn document_upsert_replaces_body() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::open(&dir.path().join("liftlog.db")).expect("db");

        database.upsert_document("a", "settings/exercises", "[]", 1).expect("upsert");
        database
            .upsert_document("a", "settings/exercises", "[\"x\"]", 2)
            .expect("upsert");

        assert_eq!(
            database.load_document("a", "settings/exercises").expect("load"),
            Some("[\"x\"]".to_string())
        );
        assert_eq!(database.load_document("b", "settings/exercises").expect("load"), None);
    }
}
