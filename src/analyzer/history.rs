use crate::record::{DISPLAY_DATE_FORMAT, LogRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryGroup {
    pub day: NaiveDate,
    pub label: String,
    pub records: Vec<LogRecord>,
}

pub fn group_history(records: &[LogRecord]) -> Vec<HistoryGroup> {
    let grouped = records
        .iter()
        .filter_map(|record| record.day().map(|day| (day, record)))
        .fold(BTreeMap::new(), |mut acc, (day, record)| {
            acc.entry(day).or_insert_with(Vec::new).push(record.clone());
            acc
        });

    grouped
        .into_iter()
        .rev()
        .map(|(day, records)| HistoryGroup {
            day,
            label: day.format(DISPLAY_DATE_FORMAT).to_string(),
            records,
        })
        .collect()
}
