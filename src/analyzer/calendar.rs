use crate::record::LogRecord;
use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingDays(HashSet<NaiveDate>);

impl TrainingDays {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.0.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn in_month(&self, year: i32, month: u32) -> usize {
        self.0
            .iter()
            .filter(|day| day.year() == year && day.month() == month)
            .count()
    }
}

pub fn training_days(records: &[LogRecord]) -> TrainingDays {
    TrainingDays(records.iter().filter_map(LogRecord::day).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarCell {
    pub day: NaiveDate,
    pub trained: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub trained_days: usize,
    pub weeks: Vec<Vec<Option<CalendarCell>>>,
}

pub fn month_grid(year: i32, month: u32, days: &TrainingDays) -> Result<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("Invalid calendar month: {year}-{month}"))?;
    let next_first = first
        .checked_add_months(Months::new(1))
        .context("Calendar month out of range")?;

    let leading = first.weekday().num_days_from_sunday() as usize;
    let cells = std::iter::repeat_with(|| None)
        .take(leading)
        .chain(
            first
                .iter_days()
                .take_while(|day| *day < next_first)
                .map(|day| {
                    Some(CalendarCell {
                        day,
                        trained: days.contains(day),
                    })
                }),
        )
        .collect::<Vec<_>>();

    let weeks = cells
        .chunks(7)
        .map(|week| {
            let mut week = week.to_vec();
            week.resize(7, None);
            week
        })
        .collect::<Vec<_>>();

    Ok(MonthGrid {
        year,
        month,
        label: first.format("%Y-%m").to_string(),
        trained_days: days.in_month(year, month),
        weeks,
    })
}

pub fn shift_month(year: i32, month: u32, delta: i32) -> Result<(i32, u32)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("Invalid calendar month: {year}-{month}"))?;
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    }
    .context("Calendar month out of range")?;

    Ok((shifted.year(), shifted.month()))
}

pub fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month format: {raw}. Example: 2024-01"))?;
    Ok((first.year(), first.month()))
}

#[cfg(test)]
mod tests {
    use super::{month_grid, parse_month, shift_month, training_days};
    use crate::analyzer::test_support::record_at;
    use chrono::NaiveDate;

    #[test]
    fn two_sets_on_one_day_count_once() {
        let records = vec![
            record_at(1, "2024-01-10T18:00:00", "ベンチプレス", 100.0, 5),
            record_at(2, "2024-01-10T18:20:00", "スクワット", 120.0, 5),
        ];

        let days = training_days(&records);

        assert_eq!(days.len(), 1);
        assert!(days.contains(NaiveDate::from_ymd_opt(2024, 1, 10).expect("date")));
    }

    #[test]
    fn grid_pads_to_sunday_first_weeks() {
        let records = vec![record_at(1, "2024-01-10T18:00:00", "ベンチプレス", 100.0, 5)];
        let grid = month_grid(2024, 1, &training_days(&records)).expect("grid");

        // 2024-01-01 is a Monday.
        assert!(grid.weeks[0][0].is_none());
        assert_eq!(
            grid.weeks[0][1].as_ref().map(|cell| cell.day),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(grid.weeks.iter().all(|week| week.len() == 7));
        assert_eq!(grid.weeks.iter().flatten().flatten().count(), 31);
        assert_eq!(grid.trained_days, 1);
        assert!(
            grid.weeks
                .iter()
                .flatten()
                .flatten()
                .any(|cell| cell.trained && cell.day == NaiveDate::from_ymd_opt(2024, 1, 10).expect("date"))
        );
    }

    #[test]
    fn month_navigation_crosses_years() {
        assert_eq!(shift_month(2024, 1, -1).expect("shift"), (2023, 12));
        assert_eq!(shift_month(2024, 12, 1).expect("shift"), (2025, 1));
        assert_eq!(parse_month("2024-02").expect("month"), (2024, 2));
        assert!(parse_month("2024-13").is_err());
    }
}
