pub mod calendar;
pub mod estimate;
pub mod history;
pub mod progress;

use crate::analyzer::calendar::TrainingDays;
use crate::analyzer::history::HistoryGroup;
use crate::analyzer::progress::ProgressSeries;
use crate::record::LogRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogSummary {
    pub total_sets: usize,
    pub training_days: usize,
    pub last_training_day: Option<NaiveDate>,
    pub best_one_rm: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    pub records: Arc<Vec<LogRecord>>,
    pub history: Vec<HistoryGroup>,
    pub training_days: TrainingDays,
    pub progress: BTreeMap<String, ProgressSeries>,
    pub summary: LogSummary,
}

impl DerivedViews {
    pub fn compute(records: Arc<Vec<LogRecord>>) -> Self {
        let history = history::group_history(&records);
        let training_days = calendar::training_days(&records);

        let exercises = records
            .iter()
            .filter(|record| record.date.is_some())
            .map(|record| record.exercise.as_str())
            .collect::<BTreeSet<_>>();
        let progress = exercises
            .into_iter()
            .map(|exercise| {
                (
                    exercise.to_string(),
                    progress::progress_series(&records, exercise),
                )
            })
            .collect::<BTreeMap<_, _>>();

        let summary = summarize(&records, &training_days);

        Self {
            records,
            history,
            training_days,
            progress,
            summary,
        }
    }

    pub fn progress_for(&self, exercise: &str) -> ProgressSeries {
        self.progress
            .get(exercise)
            .cloned()
            .unwrap_or_else(|| ProgressSeries::InsufficientData {
                exercise: exercise.to_string(),
                points: 0,
            })
    }
}

fn summarize(records: &[LogRecord], training_days: &TrainingDays) -> LogSummary {
    let dated = records
        .iter()
        .filter(|record| record.date.is_some())
        .collect::<Vec<_>>();

    let best_one_rm = dated.iter().fold(BTreeMap::new(), |mut acc, record| {
        let entry = acc.entry(record.exercise.clone()).or_insert(0.0_f64);
        *entry = entry.max(record.one_rm);
        acc
    });

    LogSummary {
        total_sets: dated.len(),
        training_days: training_days.len(),
        last_training_day: dated.iter().filter_map(|record| record.day()).max(),
        best_one_rm,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analyzer::estimate::estimate_one_rm;
    use crate::record::{LogRecord, parse_stored_timestamp};

    pub fn record_at(id: i64, date: &str, exercise: &str, weight: f64, reps: u32) -> LogRecord {
        LogRecord {
            id,
            date: parse_stored_timestamp(date),
            exercise: exercise.to_string(),
            weight,
            reps,
            one_rm: estimate_one_rm(weight, reps),
            created_at: 0,
        }
    }

    pub fn record_with_one_rm(id: i64, date: &str, exercise: &str, one_rm: f64) -> LogRecord {
        LogRecord {
            one_rm,
            ..record_at(id, date, exercise, one_rm, 1)
        }
    }
}
