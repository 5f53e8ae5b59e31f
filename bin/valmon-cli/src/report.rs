use std::fmt;

use alloy::primitives::Address;
use console::style;
use valmon_checkpoint::{
    is_signing_latest_checkpoint, latest_validator_checkpoint, storage::ValidatorFactory,
    ValidatorCheckpoint,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorStatus {
    /// Signing within the allowed lag of the on-chain checkpoint.
    Current,
    Lagging,
    /// Announced a location, but it could not be read.
    Unknown,
    NotAnnounced,
}

impl fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorStatus::Current => f.pad("current"),
            ValidatorStatus::Lagging => f.pad("lagging"),
            ValidatorStatus::Unknown => f.pad("unknown"),
            ValidatorStatus::NotAnnounced => f.pad("not announced"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorReport {
    pub address: Address,
    pub location: Option<String>,
    pub checkpoint: Option<ValidatorCheckpoint>,
    pub status: ValidatorStatus,
}

pub fn classify(
    location: Option<&str>,
    checkpoint: Option<&ValidatorCheckpoint>,
    merkle_tree_index: u32,
) -> ValidatorStatus {
    match (location, checkpoint) {
        (None, _) => ValidatorStatus::NotAnnounced,
        (Some(_), None) => ValidatorStatus::Unknown,
        (Some(_), Some(cp)) if is_signing_latest_checkpoint(cp.index, merkle_tree_index) => {
            ValidatorStatus::Current
        }
        (Some(_), Some(_)) => ValidatorStatus::Lagging,
    }
}

/// Checks one validator against the on-chain index using the location it
/// announced most recently.
pub async fn check_validator(
    factory: &impl ValidatorFactory,
    address: Address,
    announced: &[String],
    merkle_tree_index: u32,
) -> ValidatorReport {
    let location = announced.last().cloned();
    let checkpoint = match &location {
        Some(loc) => latest_validator_checkpoint(factory, loc).await,
        None => None,
    };
    let status = classify(location.as_deref(), checkpoint.as_ref(), merkle_tree_index);

    ValidatorReport {
        address,
        location,
        checkpoint,
        status,
    }
}

/// Renders a report as a single line, without styling.
pub fn format_row(report: &ValidatorReport, merkle_tree_index: u32) -> String {
    let index = report
        .checkpoint
        .as_ref()
        .map(|cp| cp.index.to_string())
        .unwrap_or_else(|| "-".to_owned());
    let source = report
        .checkpoint
        .as_ref()
        .map(|cp| cp.url.as_str())
        .or(report.location.as_deref())
        .unwrap_or("-");

    format!(
        "{} {:<13} {:>10} / {:<10} {}",
        report.address, report.status, index, merkle_tree_index, source
    )
}

pub fn styled_row(report: &ValidatorReport, merkle_tree_index: u32) -> String {
    let row = format_row(report, merkle_tree_index);
    match report.status {
        ValidatorStatus::Current => style(row).green().to_string(),
        ValidatorStatus::Lagging => style(row).red().to_string(),
        ValidatorStatus::Unknown | ValidatorStatus::NotAnnounced => {
            style(row).yellow().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use valmon_checkpoint::storage::{StorageValidatorFactory, LATEST_INDEX_KEY};

    use super::*;

    fn cp(index: u32) -> ValidatorCheckpoint {
        ValidatorCheckpoint {
            index,
            url: "https://bucket/checkpoint_latest_index.json".to_owned(),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(None, None, 1000), ValidatorStatus::NotAnnounced);
        assert_eq!(classify(Some("gs://b"), None, 1000), ValidatorStatus::Unknown);
        assert_eq!(
            classify(Some("gs://b"), Some(&cp(995)), 1000),
            ValidatorStatus::Current
        );
        assert_eq!(
            classify(Some("gs://b"), Some(&cp(980)), 1000),
            ValidatorStatus::Lagging
        );
    }

    #[test]
    fn test_format_row() {
        let report = ValidatorReport {
            address: Address::repeat_byte(0xaa),
            location: Some("s3://bucket/us-east-1".to_owned()),
            checkpoint: Some(cp(995)),
            status: ValidatorStatus::Current,
        };
        let row = format_row(&report, 1000);
        assert!(row.contains("current"), "{row}");
        assert!(row.contains("995 / 1000"), "{row}");
        assert!(row.ends_with("https://bucket/checkpoint_latest_index.json"));

        let unknown = ValidatorReport {
            checkpoint: None,
            status: ValidatorStatus::Unknown,
            ..report
        };
        let row = format_row(&unknown, 1000);
        assert!(row.contains("unknown"), "{row}");
        assert!(row.ends_with("s3://bucket/us-east-1"), "{row}");
    }

    #[tokio::test]
    async fn test_check_validator_uses_latest_announcement() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        fs::write(old.path().join(LATEST_INDEX_KEY), "10").unwrap();
        fs::write(new.path().join(LATEST_INDEX_KEY), "999").unwrap();

        let announced = vec![
            format!("file://{}", old.path().display()),
            format!("file://{}", new.path().display()),
        ];
        let report = check_validator(
            &StorageValidatorFactory::new(),
            Address::repeat_byte(1),
            &announced,
            1000,
        )
        .await;

        assert_eq!(report.status, ValidatorStatus::Current);
        assert_eq!(report.checkpoint.map(|cp| cp.index), Some(999));
        assert_eq!(report.location.as_ref(), announced.last());
    }

    #[tokio::test]
    async fn test_check_validator_without_announcement() {
        let report =
            check_validator(&StorageValidatorFactory::new(), Address::ZERO, &[], 1000).await;
        assert_eq!(report.status, ValidatorStatus::NotAnnounced);
        assert!(report.location.is_none());
    }

    #[tokio::test]
    async fn test_check_validator_malformed_location() {
        let report = check_validator(
            &StorageValidatorFactory::new(),
            Address::ZERO,
            &["not-a-location".to_owned()],
            1000,
        )
        .await;
        assert_eq!(report.status, ValidatorStatus::Unknown);
    }
}
