use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::CompanyRecord;

/// Contact coverage over a run's dataset.
#[derive(Debug)]
pub struct DatasetStats {
    pub total: usize,
    pub with_email: usize,
    pub with_phone: usize,
}

impl DatasetStats {
    pub fn from_records(records: &[CompanyRecord]) -> DatasetStats {
        DatasetStats {
            total: records.len(),
            with_email: records.iter().filter(|r| r.email.is_some()).count(),
            with_phone: records.iter().filter(|r| r.phone.is_some()).count(),
        }
    }
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Companies collected: {}", self.total)?;
        writeln!(f, "  With email:          {}", self.with_email)?;
        writeln!(f, "  With phone:          {}", self.with_phone)
    }
}

/// Summary of a finished run, written next to the dataset.
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub scraped_at: DateTime<Utc>,
    pub pages: u32,
    pub records: usize,
}

impl RunMetadata {
    pub fn new(pages: u32, records: usize) -> RunMetadata {
        RunMetadata {
            scraped_at: Utc::now(),
            pages,
            records,
        }
    }
}

/// Best effort: a metadata write failure is logged, never fatal.
pub fn save_metadata(metadata: &RunMetadata, path: &Path) {
    let json = match serde_json::to_string_pretty(metadata) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to encode metadata: {}", e);
            return;
        }
    };
    if let Err(e) = fs::write(path, json) {
        log::error!("Failed to save metadata: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_contact_coverage() {
        let records = vec![
            CompanyRecord {
                email: Some("a@example.fr".to_string()),
                phone: Some("01 00 00 00 01".to_string()),
                ..CompanyRecord::default()
            },
            CompanyRecord {
                phone: Some("01 00 00 00 02".to_string()),
                ..CompanyRecord::default()
            },
            CompanyRecord::default(),
        ];

        let stats = DatasetStats::from_records(&records);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.with_email, 1);
        assert_eq!(stats.with_phone, 2);
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let path = std::env::temp_dir().join(format!(
            "tenofni-{}-metadata.json",
            std::process::id()
        ));

        save_metadata(&RunMetadata::new(5, 42), &path);

        let contents = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["pages"], 5);
        assert_eq!(value["records"], 42);
        assert!(value["scraped_at"].is_string());
    }
}
