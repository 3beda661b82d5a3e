use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// One object as returned by the source storage listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(flatten)]
    pub metadata: EntryMetadata,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: EntryMetadata::default(),
        }
    }
}

/// Listing metadata. Folder placeholders come back with every field null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryMetadata {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "metadata")]
    pub object: Option<ObjectMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMetadata {
    pub size: Option<i64>,
    pub mimetype: Option<String>,
}

/// Per-run outcome counters.
///
/// `processed` counts entries that passed the type filter. Every processed
/// entry ends up in exactly one of `skipped_existing`, `failed` or
/// `succeeded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub skipped_by_type: u64,
    pub skipped_existing: u64,
    pub failed: u64,
    pub succeeded: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_processed(&mut self) {
        self.processed += 1;
    }

    pub fn increment_skipped_by_type(&mut self) {
        self.skipped_by_type += 1;
    }

    pub fn increment_skipped_existing(&mut self) {
        self.skipped_existing += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed += 1;
    }

    pub fn increment_succeeded(&mut self) {
        self.succeeded += 1;
    }

    pub fn skipped(&self) -> u64 {
        self.skipped_by_type + self.skipped_existing
    }

    pub fn total(&self) -> u64 {
        self.processed + self.skipped_by_type
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.processed += other.processed;
        self.skipped_by_type += other.skipped_by_type;
        self.skipped_existing += other.skipped_existing;
        self.failed += other.failed;
        self.succeeded += other.succeeded;
    }

    pub fn log_summary(&self, label: &str) {
        tracing::info!("📊 Summary ({})", label);
        tracing::info!("Total files processed: {}", self.processed);
        tracing::info!("Successfully uploaded: {}", self.succeeded);
        tracing::info!(
            by_type = self.skipped_by_type,
            existing = self.skipped_existing,
            "Skipped: {}",
            self.skipped()
        );
        tracing::info!("Failed: {}", self.failed);
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} succeeded={} skipped={} failed={}",
            self.processed,
            self.succeeded,
            self.skipped(),
            self.failed
        )
    }
}
