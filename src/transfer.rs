use crate::record::{LogForm, LogRecord};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;

const UTF8_BOM: char = '\u{feff}';
const IMPORT_COLUMNS: usize = 4;

pub const EXPORT_HEADER: [&str; 5] = ["date", "exercise", "weight(kg)", "reps", "estimated-1RM(kg)"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success: usize,
    pub error: usize,
}

// Unquoted: an exercise name containing a comma does not survive re-import.
pub fn export_csv(records: &[LogRecord]) -> Result<String> {
    let mut buffer = String::new();
    buffer.push(UTF8_BOM);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(buffer.into_bytes());

    writer
        .write_record(EXPORT_HEADER)
        .context("Failed to write CSV header")?;

    records.iter().try_for_each(|record| {
        writer
            .write_record([
                record.day_label(),
                record.exercise.clone(),
                record.weight.to_string(),
                record.reps.to_string(),
                record.one_rm.to_string(),
            ])
            .with_context(|| format!("Failed to write CSV row for record {}", record.id))
    })?;

    let bytes = writer
        .into_inner()
        .map_err(|error| anyhow!("Failed to flush CSV export: {error}"))?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("workout_log_{}.csv", today.format("%Y-%m-%d"))
}

pub fn candidate_rows(text: &str) -> Result<Vec<LogForm>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read CSV import")?;

    Ok(records
        .iter()
        .skip(1)
        .filter(|row| row.len() >= IMPORT_COLUMNS)
        .map(form_from_row)
        .collect())
}

fn form_from_row(row: &StringRecord) -> LogForm {
    let column = |index: usize| row.get(index).unwrap_or_default().to_string();

    LogForm {
        date: column(0),
        exercise: column(1),
        weight: column(2),
        reps: column(3),
    }
}

#[cfg(test)]
mod tests {
    use super::{EXPORT_HEADER, candidate_rows, export_csv, export_file_name};
    use crate::analyzer::test_support::record_at;
    use crate::record::normalize;
    use crate::store::Session;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn export_starts_with_bom_and_fixed_header() {
        let records = vec![record_at(1, "2024-01-10T18:30:00", "ベンチプレス", 100.0, 5)];
        let text = export_csv(&records).expect("export");

        assert!(text.starts_with('\u{feff}'));
        let lines = text.trim_start_matches('\u{feff}').lines().collect::<Vec<_>>();
        assert_eq!(lines[0], EXPORT_HEADER.join(","));
        assert_eq!(lines[1], "2024/01/10,ベンチプレス,100,5,116.7");
    }

    #[test]
    fn export_then_import_reconstructs_records() {
        let records = vec![
            record_at(1, "2024-01-12T18:30:00", "スクワット", 122.5, 3),
            record_at(2, "2024-01-10T18:30:00", "ベンチプレス", 100.0, 5),
            record_at(3, "2024-01-10T18:10:00", "ベンチプレス", 90.0, 8),
        ];
        let text = export_csv(&records).expect("export");
        let session = Session::signed_in("a");
        let now = NaiveTime::from_hms_opt(7, 15, 0).expect("time");

        let rebuilt = candidate_rows(&text)
            .expect("rows")
            .iter()
            .filter_map(|form| normalize(form, Some(&session), now))
            .collect::<Vec<_>>();

        assert_eq!(rebuilt.len(), records.len());
        rebuilt.iter().zip(&records).for_each(|(new, original)| {
            assert_eq!(new.exercise, original.exercise);
            assert_eq!(new.weight, original.weight);
            assert_eq!(new.reps, original.reps);
            assert_eq!(Some(new.date.date()), original.day());
            assert!((new.one_rm - original.one_rm).abs() < 0.05);
        });
    }

    #[test]
    fn short_and_blank_lines_are_skipped() {
        let text = "date,exercise,weight,reps\n\n2024-01-10,ベンチプレス\n  \n2024-01-10,スクワット,120,5,extra\r\n";
        let rows = candidate_rows(text).expect("rows");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise, "スクワット");
        assert_eq!(rows[0].reps, "5");
    }

    #[test]
    fn header_only_yields_nothing() {
        assert!(candidate_rows("\u{feff}date,exercise,weight(kg),reps,estimated-1RM(kg)\n")
            .expect("rows")
            .is_empty());
        assert!(candidate_rows("").expect("rows").is_empty());
    }

    #[test]
    fn file_name_carries_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).expect("date");
        assert_eq!(export_file_name(day), "workout_log_2024-03-09.csv");
    }
}
