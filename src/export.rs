use std::path::Path;

use csv::WriterBuilder;

use crate::error::StoreError;
use crate::schedule::{GroupMode, PolishCollator, SubstitutionRecord};

const HEADERS: [&str; 7] = [
    "Klasa",
    "Godzina",
    "Przedmiot",
    "Nauczyciel nieobecny",
    "Nauczyciel zastępujący",
    "Status",
    "Opis",
];

/// Writes substitutions to a CSV file, ordered by class then input order
///
/// # Arguments
/// * `records` - One day's substitutions
/// * `csv_path` - Destination; overwritten if it exists
pub fn export_substitutions_to_csv(records: &[SubstitutionRecord], csv_path: &Path) -> Result<usize, StoreError> {
    let collator = PolishCollator::numeric();
    let mut sorted: Vec<&SubstitutionRecord> = records.iter().collect();
    sorted.sort_by(|a, b| collator.compare(&GroupMode::Class.key_of(a), &GroupMode::Class.key_of(b)));

    let mut wtr = WriterBuilder::new().has_headers(false).from_path(csv_path)?;
    wtr.write_record(HEADERS)?;

    for record in &sorted {
        wtr.write_record([
            record.class.as_str(),
            record.time_slot.as_str(),
            record.subject.as_str(),
            record.absent_teacher.as_str(),
            record.covering_teacher.as_str(),
            record.status.as_str(),
            record.description.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(sorted.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(class: &str, subject: &str, description: &str) -> SubstitutionRecord {
        SubstitutionRecord {
            class: class.to_string(),
            subject: subject.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_writes_header_and_sorted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![
            record("10A", "Fizyka", "Zajęcia odwołane"),
            record("2A", "Polski", "Połączono klasy 2A i 3A, sala 12"),
        ];

        let written = export_substitutions_to_csv(&records, &path).unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "Klasa");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "2A");
        assert_eq!(&rows[0][6], "Połączono klasy 2A i 3A, sala 12");
        assert_eq!(&rows[1][0], "10A");
    }
}
