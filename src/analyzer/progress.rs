use crate::record::LogRecord;
use chrono::NaiveDate;
use serde::Serialize;

const CHART_LABEL_FORMAT: &str = "%m/%d";
const MIN_TREND_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMaxPoint {
    pub day: NaiveDate,
    pub label: String,
    pub one_rm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressSeries {
    InsufficientData {
        exercise: String,
        points: usize,
    },
    Trend {
        exercise: String,
        points: Vec<DailyMaxPoint>,
        best: f64,
        gain: f64,
    },
}

pub fn daily_max_points(records: &[LogRecord], exercise: &str) -> Vec<DailyMaxPoint> {
    let mut sets = records
        .iter()
        .filter(|record| record.exercise == exercise)
        .filter_map(|record| record.date.map(|date| (date, record.one_rm)))
        .collect::<Vec<_>>();
    sets.sort_by_key(|(date, _)| *date);

    sets.into_iter()
        .fold(Vec::<DailyMaxPoint>::new(), |mut points, (date, one_rm)| {
            let day = date.date();
            match points.last_mut() {
                Some(last) if last.day == day => {
                    last.one_rm = last.one_rm.max(one_rm);
                }
                _ => points.push(DailyMaxPoint {
                    day,
                    label: day.format(CHART_LABEL_FORMAT).to_string(),
                    one_rm,
                }),
            }
            points
        })
}

pub fn progress_series(records: &[LogRecord], exercise: &str) -> ProgressSeries {
    let points = daily_max_points(records, exercise);

    if points.len() < MIN_TREND_POINTS {
        return ProgressSeries::InsufficientData {
            exercise: exercise.to_string(),
            points: points.len(),
        };
    }

    let best = points
        .iter()
        .map(|point| point.one_rm)
        .fold(f64::MIN, f64::max);
    let gain = match (points.first(), points.last()) {
        (Some(first), Some(last)) => round_one_decimal(last.one_rm - first.one_rm),
        _ => 0.0,
    };

    ProgressSeries::Trend {
        exercise: exercise.to_string(),
        points,
        best,
        gain,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{ProgressSeries, daily_max_points, progress_series};
    use crate::analyzer::test_support::record_with_one_rm;

    #[test]
    fn same_day_max_wins_regardless_of_arrival_order() {
        let records = vec![
            record_with_one_rm(1, "2024-01-10T18:00:00", "ベンチプレス", 100.0),
            record_with_one_rm(2, "2024-01-10T18:30:00", "ベンチプレス", 90.0),
            record_with_one_rm(3, "2024-01-12T18:00:00", "ベンチプレス", 110.0),
        ];

        let points = daily_max_points(&records, "ベンチプレス");
        let summary = points
            .iter()
            .map(|point| (point.label.as_str(), point.one_rm))
            .collect::<Vec<_>>();

        assert_eq!(summary, vec![("01/10", 100.0), ("01/12", 110.0)]);
    }

    #[test]
    fn later_higher_set_on_same_day_overrides() {
        let records = vec![
            record_with_one_rm(5, "2024-01-10T19:00:00", "ベンチプレス", 105.0),
            record_with_one_rm(4, "2024-01-10T18:00:00", "ベンチプレス", 100.0),
        ];

        let points = daily_max_points(&records, "ベンチプレス");

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].one_rm, 105.0);
    }

    #[test]
    fn fewer_than_two_days_is_insufficient() {
        let records = vec![
            record_with_one_rm(1, "2024-01-10T18:00:00", "ベンチプレス", 100.0),
            record_with_one_rm(2, "2024-01-10T18:30:00", "ベンチプレス", 102.0),
            record_with_one_rm(3, "2024-01-11T18:30:00", "スクワット", 140.0),
        ];

        assert_eq!(
            progress_series(&records, "ベンチプレス"),
            ProgressSeries::InsufficientData {
                exercise: "ベンチプレス".to_string(),
                points: 1,
            }
        );
    }

    #[test]
    fn trend_reports_best_and_gain() {
        let records = vec![
            record_with_one_rm(3, "2024-02-01T18:00:00", "ベンチプレス", 112.5),
            record_with_one_rm(2, "2024-01-20T18:00:00", "ベンチプレス", 115.0),
            record_with_one_rm(1, "2024-01-10T18:00:00", "ベンチプレス", 100.0),
        ];

        match progress_series(&records, "ベンチプレス") {
            ProgressSeries::Trend {
                points, best, gain, ..
            } => {
                assert_eq!(points.len(), 3);
                assert_eq!(best, 115.0);
                assert_eq!(gain, 12.5);
            }
            other => panic!("unexpected series: {other:?}"),
        }
    }
}
