pub const CREATE_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  owner      TEXT NOT NULL,
  date       TEXT NOT NULL,
  exercise   TEXT NOT NULL,
  weight     REAL NOT NULL,
  reps       INTEGER NOT NULL,
  one_rm     REAL NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL
);
"#;

pub const CREATE_DOCUMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
  owner      TEXT NOT NULL,
  name       TEXT NOT NULL,
  body       TEXT NOT NULL,
  updated_at INTEGER NOT NULL,
  PRIMARY KEY (owner, name)
);
"#;

pub const INDEX_LOGS_OWNER_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_logs_owner_date ON logs(owner, date);";

pub const SELECT_LOGS_FOR_OWNER: &str = "SELECT id, date, exercise, weight, reps, one_rm, created_at
     FROM logs
     WHERE owner = ?1
     ORDER BY date DESC, id DESC";

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_LOGS, CREATE_DOCUMENTS, INDEX_LOGS_OWNER_DATE]
}
