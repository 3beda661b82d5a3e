use crate::error::{MigrationError, Result};
use crate::models::{FileEntry, RunStats};
use crate::services::lister::{DEFAULT_PAGE_SIZE, Lister};
use crate::services::records::PostUploadHook;
use crate::services::retry::RetryPolicy;
use crate::services::source::SourceStorage;
use crate::services::storage::{DestinationStorage, ObjectPresence};
use crate::utils::media::MediaKind;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Everything that differs between one migration run and another.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub kind: MediaKind,
    pub source_bucket: String,
    pub dest_bucket: String,
    pub page_size: usize,
    /// Used for listing pages and existence checks
    pub retry_policy: RetryPolicy,
    /// Used for downloads and uploads
    pub transfer_retry_policy: RetryPolicy,
}

impl PipelineConfig {
    pub fn new(
        kind: MediaKind,
        source_bucket: impl Into<String>,
        dest_bucket: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source_bucket: source_bucket.into(),
            dest_bucket: dest_bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            retry_policy: RetryPolicy::default(),
            transfer_retry_policy: RetryPolicy::default(),
        }
    }
}

/// What happened to an entry that passed the type filter and did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    AlreadyPresent,
    Uploaded,
}

pub struct MigrationPipeline {
    source: Arc<dyn SourceStorage>,
    destination: Arc<dyn DestinationStorage>,
    post_upload: Option<Arc<dyn PostUploadHook>>,
    config: PipelineConfig,
}

impl MigrationPipeline {
    pub fn new(
        source: Arc<dyn SourceStorage>,
        destination: Arc<dyn DestinationStorage>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            destination,
            post_upload: None,
            config,
        }
    }

    pub fn with_post_upload_hook(mut self, hook: Arc<dyn PostUploadHook>) -> Self {
        self.post_upload = Some(hook);
        self
    }

    /// Lists the source bucket and migrates every matching entry.
    ///
    /// A listing failure aborts the run. Failures on individual entries are
    /// counted and the run carries on.
    pub async fn run(&self) -> Result<RunStats> {
        info!(
            "🔄 Fetching {} from source bucket '{}'...",
            self.config.kind, self.config.source_bucket
        );

        let lister = Lister::new(
            self.source.as_ref(),
            &self.config.source_bucket,
            self.config.page_size,
            &self.config.retry_policy,
        )?;

        let entries = match lister.list_all().await {
            Ok(entries) => entries,
            Err(e) => {
                let code = e.code();
                error!(
                    code = code.as_deref().unwrap_or("-"),
                    "❌ Fatal error fetching files: {}", e
                );
                return Err(e);
            }
        };
        info!("🎯 Total files found: {}", entries.len());

        Ok(self.process_entries(&entries).await)
    }

    /// Runs the transfer loop over an already-listed set of entries, in order.
    pub async fn process_entries(&self, entries: &[FileEntry]) -> RunStats {
        let mut stats = RunStats::new();
        let total = entries.len();

        for entry in entries {
            if !self.config.kind.matches(&entry.name) {
                debug!(file = %entry.name, "Skipping entry outside the {} allow-list", self.config.kind);
                stats.increment_skipped_by_type();
                continue;
            }

            stats.increment_processed();
            info!("[{}/{}] Processing: {}", stats.processed, total, entry.name);

            match self.migrate_entry(entry).await {
                Ok(EntryOutcome::AlreadyPresent) => {
                    info!("⏭️  Skipping: {} - Already exists at destination", entry.name);
                    stats.increment_skipped_existing();
                }
                Ok(EntryOutcome::Uploaded) => {
                    stats.increment_succeeded();
                }
                Err(e) => {
                    log_entry_failure(&entry.name, &e);
                    stats.increment_failed();
                }
            }
        }

        stats
    }

    /// Existence check, download, upload and post-upload hook for one entry.
    pub async fn migrate_entry(&self, entry: &FileEntry) -> Result<EntryOutcome> {
        let key = entry.name.as_str();
        let dest_bucket = self.config.dest_bucket.as_str();
        let source = self.source.as_ref();
        let destination = self.destination.as_ref();

        let presence = self
            .config
            .retry_policy
            .run(&format!("Checking if {} exists at destination", key), move || {
                destination.head_object(dest_bucket, key)
            })
            .await?;

        if presence == ObjectPresence::Present {
            return Ok(EntryOutcome::AlreadyPresent);
        }

        info!("⬆ Moving: {} → {}", key, dest_bucket);

        let source_url = source.public_url(&self.config.source_bucket, key);
        let url = source_url.as_str();
        let body = self
            .config
            .transfer_retry_policy
            .run(&format!("Fetching {} from source", key), move || {
                source.fetch_object(url)
            })
            .await?;

        let content_type = self.config.kind.content_type(key);
        let content_type = content_type.essence_str();
        debug!(file = %key, bytes = body.len(), content_type, "Downloaded object");

        self.config
            .transfer_retry_policy
            .run(&format!("Uploading {} to destination", key), move || {
                destination.put_object(dest_bucket, key, body.clone(), content_type)
            })
            .await?;
        info!("✅ Uploaded: {} → {}", key, dest_bucket);

        if let Some(hook) = &self.post_upload {
            let destination_url = destination.object_url(dest_bucket, key);
            hook.after_upload(&source_url, &destination_url).await?;
        }

        Ok(EntryOutcome::Uploaded)
    }
}

fn log_entry_failure(name: &str, err: &MigrationError) {
    let code = err.code();
    error!(
        file = %name,
        code = code.as_deref().unwrap_or("-"),
        "❌ Upload failed for {}: {}",
        name,
        err
    );

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        error!(file = %name, "  caused by: {}", cause);
        source = cause.source();
    }
    debug!(file = %name, "Error detail: {:?}", err);
}
