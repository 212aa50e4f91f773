use crate::analyzer::DerivedViews;
use crate::record::{LogForm, normalize};
use crate::registry::ExerciseRegistry;
use crate::store::Store;
use crate::transfer::{self, ImportSummary};
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Tracker {
    store: Arc<Store>,
}

impl Tracker {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn views(&self) -> DerivedViews {
        DerivedViews::compute(self.store.subscribe_logs().current())
    }

    pub fn registry(&self) -> ExerciseRegistry {
        let custom = self.store.subscribe_exercises().current();
        ExerciseRegistry::new(custom.to_vec())
    }

    pub async fn save_log(&self, form: &LogForm) -> Option<i64> {
        let record = normalize(form, self.store.session(), Local::now().time())?;

        match self.store.create_record(&record).await {
            Ok(id) => id,
            Err(error) => {
                warn!(error = %error, exercise = %record.exercise, "failed to save log record");
                None
            }
        }
    }

    pub async fn delete_log(&self, id: i64) -> bool {
        self.store
            .delete_record(id)
            .await
            .unwrap_or_else(|error| {
                warn!(error = %error, id, "failed to delete log record");
                false
            })
    }

    pub async fn add_exercise(&self, name: &str) -> bool {
        self.store
            .append_custom_exercise(name)
            .await
            .unwrap_or_else(|error| {
                warn!(error = %error, name, "failed to save custom exercise");
                false
            })
    }

    /// Imports rows one at a time, awaiting each write before the next row.
    ///
    /// Rows written before a failure stay written. A rejected write counts as
    /// an error and the import carries on.
    pub async fn import_csv(&self, text: &str) -> Result<ImportSummary> {
        if self.store.session().is_none() {
            debug!("import without session ignored");
            return Ok(ImportSummary::default());
        }

        let rows = transfer::candidate_rows(text)?;
        let mut summary = ImportSummary::default();

        for (index, form) in rows.iter().enumerate() {
            let Some(record) = normalize(form, self.store.session(), Local::now().time()) else {
                debug!(row = index + 1, "rejected import row");
                summary.error += 1;
                continue;
            };

            match self.store.create_record(&record).await {
                Ok(Some(_)) => summary.success += 1,
                Ok(None) => summary.error += 1,
                Err(error) => {
                    warn!(error = %error, row = index + 1, "failed to write imported row");
                    summary.error += 1;
                }
            }
        }

        info!(
            success = summary.success,
            error = summary.error,
            "CSV import finished"
        );
        Ok(summary)
    }

    pub fn export_csv(&self) -> Result<String> {
        transfer::export_csv(&self.store.subscribe_logs().current())
    }
}

/// Recomputes [`DerivedViews`] once per published log snapshot.
pub fn spawn_view_updates(store: &Store) -> (watch::Receiver<Arc<DerivedViews>>, JoinHandle<()>) {
    let mut subscription = store.subscribe_logs();
    let (sender, receiver) = watch::channel(Arc::new(DerivedViews::compute(
        subscription.current(),
    )));

    let handle = tokio::spawn(async move {
        while let Some(snapshot) = subscription.next().await {
            let views = DerivedViews::compute(snapshot);
            debug!(
                sets = views.summary.total_sets,
                days = views.summary.training_days,
                "views recomputed"
            );
            if sender.send(Arc::new(views)).is_err() {
                break;
            }
        }
    });

    (receiver, handle)
}
