use ascend_core::{AppError, AppResult};
use ascend_domain::{Lead, Prospect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backup format version written into every file.
pub const BACKUP_VERSION: &str = "1.0";

/// On-disk backup shape: `{ version, timestamp, data: { prospects, leads } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    /// Format version.
    pub version: String,
    /// When the backup was taken.
    pub timestamp: DateTime<Utc>,
    /// The backed-up collections.
    pub data: BackupData,
}

/// Collections carried by a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    /// Prospect records, ids included.
    #[serde(default)]
    pub prospects: Vec<Prospect>,
    /// Lead records; older backups stored them under `joinRequests`.
    #[serde(default, alias = "joinRequests")]
    pub leads: Vec<Lead>,
}

impl BackupFile {
    /// Builds a backup of the given collections.
    #[must_use]
    pub fn new(prospects: Vec<Prospect>, leads: Vec<Lead>, now: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_VERSION.to_owned(),
            timestamp: now,
            data: BackupData { prospects, leads },
        }
    }
}

/// Serializes a backup file to pretty JSON.
pub fn serialize_backup(backup: &BackupFile) -> AppResult<String> {
    serde_json::to_string_pretty(backup)
        .map_err(|error| AppError::Internal(format!("backup serialization failed: {error}")))
}

/// Parses and validates a backup file BEFORE anything is written.
///
/// A file without the `data` key is rejected outright; that is the one
/// structural requirement the restore flow promises to check.
pub fn parse_backup(text: &str) -> AppResult<BackupFile> {
    let value: Value = serde_json::from_str(text)
        .map_err(|error| AppError::ImportFormat(format!("backup is not valid JSON: {error}")))?;

    if value.get("data").is_none() {
        return Err(AppError::ImportFormat(
            "backup file is missing the 'data' section".to_owned(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|error| AppError::ImportFormat(format!("backup has an unexpected shape: {error}")))
}
