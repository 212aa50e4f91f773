use crate::analyzer::estimate::estimate_one_rm;
use crate::store::Session;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_DATE_FORMAT: &str = "%Y/%m/%d";
pub const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub id: i64,
    pub date: Option<NaiveDateTime>,
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub one_rm: f64,
    pub created_at: i64,
}

impl LogRecord {
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.map(|date| date.date())
    }

    pub fn day_label(&self) -> String {
        self.day()
            .map(|day| day.format(DISPLAY_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLogRecord {
    pub owner: String,
    pub date: NaiveDateTime,
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub one_rm: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogForm {
    pub date: String,
    pub exercise: String,
    pub weight: String,
    pub reps: String,
}

/// Declines with `None` on bad numbers, a bad date, an empty exercise or no
/// session. The calendar date is kept verbatim; only hour and minute come
/// from `now`.
pub fn normalize(form: &LogForm, session: Option<&Session>, now: NaiveTime) -> Option<NewLogRecord> {
    let Some(session) = session else {
        debug!("no session, declining record");
        return None;
    };

    let weight = parse_weight(&form.weight)?;
    let reps = parse_reps(&form.reps)?;
    let day = parse_day(&form.date)?;

    if form.exercise.is_empty() {
        debug!("empty exercise name, declining record");
        return None;
    }

    let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)?;

    Some(NewLogRecord {
        owner: session.user_id.clone(),
        date: day.and_time(time),
        exercise: form.exercise.clone(),
        weight,
        reps,
        one_rm: estimate_one_rm(weight, reps),
    })
}

pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, FORM_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, DISPLAY_DATE_FORMAT))
        .ok()
}

pub fn parse_stored_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, STORED_TIMESTAMP_FORMAT).ok()
}

fn parse_weight(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite() && *weight > 0.0)
}

fn parse_reps(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|reps| *reps > 0)
}
