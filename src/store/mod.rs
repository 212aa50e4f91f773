pub mod session;

pub use session::Session;

use crate::db::Database;
use crate::record::{LogRecord, NewLogRecord};
use crate::registry::ExerciseRegistry;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

const SETTINGS_DOCUMENT: &str = "settings/exercises";
const CUSTOM_EXERCISES_FIELD: &str = "custom_exercises";

pub type LogSnapshot = Arc<Vec<LogRecord>>;
pub type ExerciseSnapshot = Arc<Vec<String>>;

pub struct Store {
    database: Mutex<Option<Database>>,
    session: Option<Session>,
    logs: watch::Sender<LogSnapshot>,
    exercises: watch::Sender<ExerciseSnapshot>,
}

impl Store {
    pub async fn connect(db_path: &Path, session: Option<Session>) -> Result<Self> {
        let database = Database::open(db_path)?;
        let (logs, _) = watch::channel(LogSnapshot::default());
        let (exercises, _) = watch::channel(ExerciseSnapshot::default());

        let store = Self {
            database: Mutex::new(Some(database)),
            session,
            logs,
            exercises,
        };
        store.refresh().await?;

        match &store.session {
            Some(session) => info!(
                user_id = %session.user_id,
                anonymous = session.anonymous,
                path = %db_path.display(),
                "store connected"
            ),
            None => info!(path = %db_path.display(), "store connected without session"),
        }

        Ok(store)
    }

    pub async fn close(&self) {
        if self.database.lock().await.take().is_some() {
            info!("store closed");
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn subscribe_logs(&self) -> Subscription<LogSnapshot> {
        Subscription::new(self.logs.subscribe())
    }

    pub fn subscribe_exercises(&self) -> Subscription<ExerciseSnapshot> {
        Subscription::new(self.exercises.subscribe())
    }

    pub async fn refresh(&self) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        let guard = self.database.lock().await;
        let database = guard.as_ref().context("Store is closed")?;
        self.publish_logs(database, session)?;
        self.publish_exercises(database, session)?;

        Ok(())
    }

    pub async fn create_record(&self, record: &NewLogRecord) -> Result<Option<i64>> {
        let Some(session) = self.session.as_ref() else {
            debug!("create_record without session ignored");
            return Ok(None);
        };
        if record.owner != session.user_id {
            bail!(
                "Record owner {} does not match session {}",
                record.owner,
                session.user_id
            );
        }

        let guard = self.database.lock().await;
        let database = guard.as_ref().context("Store is closed")?;
        let id = database.insert_log(record, Utc::now().timestamp())?;
        self.publish_after_write(database, session);

        Ok(Some(id))
    }

    pub async fn delete_record(&self, id: i64) -> Result<bool> {
        let Some(session) = self.session.as_ref() else {
            debug!("delete_record without session ignored");
            return Ok(false);
        };

        let guard = self.database.lock().await;
        let database = guard.as_ref().context("Store is closed")?;
        let deleted = database.delete_log(&session.user_id, id)?;
        self.publish_after_write(database, session);

        Ok(deleted > 0)
    }

    /// Adds `name` to the owner's custom exercise list. The duplicate check
    /// and the write share one lock. Returns whether a write was made.
    pub async fn append_custom_exercise(&self, name: &str) -> Result<bool> {
        let Some(session) = self.session.as_ref() else {
            debug!("append_custom_exercise without session ignored");
            return Ok(false);
        };

        let guard = self.database.lock().await;
        let database = guard.as_ref().context("Store is closed")?;

        let mut settings = load_settings(database, session)?;
        let registry = ExerciseRegistry::new(custom_exercises(&settings));
        let Some(custom) = registry.try_add(name) else {
            debug!(name, "exercise already registered or empty");
            return Ok(false);
        };

        settings.insert(CUSTOM_EXERCISES_FIELD.to_string(), Value::from(custom));
        let body = serde_json::to_string(&Value::Object(settings))
            .context("Failed to serialize settings document")?;
        database.upsert_document(
            &session.user_id,
            SETTINGS_DOCUMENT,
            &body,
            Utc::now().timestamp(),
        )?;
        if let Err(error) = self.publish_exercises(database, session) {
            warn!(error = %error, "exercise list saved but snapshot publish failed");
        }

        Ok(true)
    }

    pub async fn latest_write_timestamp(&self) -> Result<Option<i64>> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };

        let guard = self.database.lock().await;
        let database = guard.as_ref().context("Store is closed")?;
        database.latest_log_timestamp(&session.user_id)
    }

    // Runs after a committed write: a failed re-read is logged, not returned.
    fn publish_after_write(&self, database: &Database, session: &Session) {
        if let Err(error) = self.publish_logs(database, session) {
            warn!(error = %error, "log write saved but snapshot publish failed");
        }
    }

    fn publish_logs(&self, database: &Database, session: &Session) -> Result<()> {
        let logs = database.logs_for_owner(&session.user_id)?;
        debug!(count = logs.len(), "publishing log snapshot");
        self.logs.send_replace(Arc::new(logs));
        Ok(())
    }

    fn publish_exercises(&self, database: &Database, session: &Session) -> Result<()> {
        let names = custom_exercises(&load_settings(database, session)?);
        self.exercises.send_replace(Arc::new(names));
        Ok(())
    }
}

fn load_settings(database: &Database, session: &Session) -> Result<Map<String, Value>> {
    let Some(body) = database.load_document(&session.user_id, SETTINGS_DOCUMENT)? else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(&body).context("Failed to parse settings document")? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn custom_exercises(settings: &Map<String, Value>) -> Vec<String> {
    settings
        .get(CUSTOM_EXERCISES_FIELD)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    fn new(receiver: watch::Receiver<T>) -> Self {
        Self {
            receiver,
            primed: false,
        }
    }

    /// First call yields the snapshot current at subscribe time; later calls
    /// wait for the next publish. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }
}
