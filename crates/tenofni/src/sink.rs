use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use csv::WriterBuilder;

use crate::types::{CSV_COLUMNS, CompanyRecord, Dataset};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file not found: {0}")]
    NotFound(String),
}

/// Whether to start a fresh file with a header row, or extend an
/// existing one with data rows only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Append,
}

/// Writes the dataset to `path` as UTF-8 CSV, creating parent
/// directories as needed. Create mode writes the header first, even
/// for an empty dataset; append mode assumes the file already carries
/// a matching header and does not check. Absent fields become empty
/// cells.
///
/// This is the one place a failure is returned to the caller instead
/// of being skipped over.
pub fn save_to_csv(
    dataset: &[CompanyRecord],
    path: &Path,
    mode: WriteMode,
) -> Result<(), SinkError> {
    write_csv(dataset, path, mode)
        .inspect_err(|e| log::error!("Failed to save CSV: {}", e))?;
    log::info!("Saved {} records to {}", dataset.len(), path.display());
    Ok(())
}

fn write_csv(dataset: &[CompanyRecord], path: &Path, mode: WriteMode) -> Result<(), SinkError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = match mode {
        WriteMode::Create => File::create(path)?,
        WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
    };

    // The header is written by hand so an empty Create still produces
    // one; serialize would only emit it alongside a first record.
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if mode == WriteMode::Create {
        writer.write_record(CSV_COLUMNS)?;
    }
    for record in dataset {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a previously saved CSV back into records. Empty cells come
/// back as absent fields.
pub fn load_from_csv(path: &Path) -> Result<Dataset, SinkError> {
    if !path.exists() {
        log::error!("File not found: {}", path.display());
        return Err(SinkError::NotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut dataset = Dataset::new();
    for record in reader.deserialize() {
        dataset.push(record?);
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tmp(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("tenofni-{}-{}", std::process::id(), name));
        path
    }

    fn record(link: &str, name: &str, postal: &str) -> CompanyRecord {
        CompanyRecord {
            link: Some(link.to_string()),
            company_name: Some(name.to_string()),
            postal_code: Some(postal.to_string()),
            ..CompanyRecord::default()
        }
    }

    #[test]
    fn create_then_append_keeps_one_header() {
        let path = tmp("create-append.csv");

        let first = vec![
            record("https://infonet.fr/entreprises/a-1", "Alpha", "75"),
            record("https://infonet.fr/entreprises/b-2", "Beta", "92"),
        ];
        let second = vec![
            record("https://infonet.fr/entreprises/c-3", "Gamma", "77"),
            record("https://infonet.fr/entreprises/d-4", "Delta", "78"),
            record("https://infonet.fr/entreprises/e-5", "Epsilon", "91"),
        ];

        save_to_csv(&first, &path, WriteMode::Create).unwrap();
        save_to_csv(&second, &path, WriteMode::Append).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("link,")).count(),
            1
        );
    }

    #[test]
    fn empty_create_still_writes_header() {
        let path = tmp("empty-create.csv");

        save_to_csv(&[], &path, WriteMode::Create).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert_eq!(contents.lines().next().unwrap(), CSV_COLUMNS.join(","));
    }

    #[test]
    fn absent_fields_serialize_as_empty_cells() {
        let path = tmp("absent-fields.csv");

        let dataset = vec![CompanyRecord {
            company_name: Some("Alpha".to_string()),
            ..CompanyRecord::default()
        }];
        save_to_csv(&dataset, &path, WriteMode::Create).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert_eq!(data_line, ",Alpha,,,,,,,");
        assert!(!contents.contains("None"));
        assert!(!contents.contains("null"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let path = tmp("nested").join("deeper").join("out.csv");

        save_to_csv(
            &[record("https://infonet.fr/entreprises/a-1", "Alpha", "75")],
            &path,
            WriteMode::Create,
        )
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn round_trip_preserves_values_including_multibyte() {
        let path = tmp("round-trip.csv");

        let dataset = vec![
            CompanyRecord {
                link: Some("https://infonet.fr/entreprises/creperie-1".to_string()),
                company_name: Some("Crêperie Müller & Fils Œnologie".to_string()),
                director: Some("René-François Lefèvre".to_string()),
                phone: Some("01 42 68 53 00".to_string()),
                email: Some("contact@creperie.fr".to_string()),
                postal_code: Some("75".to_string()),
                revenue: Some("12 345 678 €".to_string()),
                creation_date: Some("12/03/2004".to_string()),
                staff_count: Some("25".to_string()),
            },
            CompanyRecord {
                link: None,
                company_name: Some("Maison Œuvrière".to_string()),
                postal_code: Some("77".to_string()),
                ..CompanyRecord::default()
            },
        ];

        save_to_csv(&dataset, &path, WriteMode::Create).unwrap();
        let loaded = load_from_csv(&path).unwrap();

        assert_eq!(loaded, dataset);
    }

    #[test]
    fn loading_missing_file_is_an_error() {
        let path = tmp("does-not-exist.csv");
        assert!(matches!(
            load_from_csv(&path),
            Err(SinkError::NotFound(_))
        ));
    }
}
