use crate::error::{MigrationError, Result};
use crate::services::lister::DEFAULT_PAGE_SIZE;
use crate::services::records::DEFAULT_TRACKS_TABLE;
use crate::services::retry::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::utils::media::MediaKind;
use std::env;
use std::time::Duration;
use url::Url;

/// Source and destination bucket names for one media kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPair {
    pub source: String,
    pub destination: String,
}

/// Migration settings, read from the environment
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Supabase project URL (SUPABASE_URL)
    pub supabase_url: String,
    /// Supabase API key (SUPABASE_KEY)
    pub supabase_key: String,

    /// S3-compatible endpoint, e.g. an R2 account URL (R2_ENDPOINT)
    pub r2_endpoint: String,
    pub r2_access_key: String,
    pub r2_secret_key: String,
    /// Signing region (default: "auto")
    pub r2_region: String,

    /// SUPABASE_AUDIO_BUCKET / R2_AUDIO_BUCKET
    pub audio_buckets: Option<BucketPair>,
    /// SUPABASE_IMAGE_BUCKET / R2_IMAGE_BUCKET
    pub image_buckets: Option<BucketPair>,

    /// Listing page size (default: 100)
    pub page_size: usize,
    /// Attempts per retried operation (default: 3)
    pub max_attempts: u32,
    /// Wait before the first retry in milliseconds (default: 1000)
    pub retry_delay_ms: u64,

    /// Table whose `url` column is rewritten after upload (default: "tracks")
    pub tracks_table: String,
}

impl MigrationConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| MigrationError::Config(format!("{} must be set", key)))
        };
        let pair = |source_key: &str, dest_key: &str| -> Result<Option<BucketPair>> {
            match (get(source_key), get(dest_key)) {
                (Some(source), Some(destination)) => Ok(Some(BucketPair {
                    source,
                    destination,
                })),
                (None, None) => Ok(None),
                (Some(_), None) => Err(MigrationError::Config(format!(
                    "{} is set but {} is missing",
                    source_key, dest_key
                ))),
                (None, Some(_)) => Err(MigrationError::Config(format!(
                    "{} is set but {} is missing",
                    dest_key, source_key
                ))),
            }
        };

        let supabase_url = validate_url("SUPABASE_URL", require("SUPABASE_URL")?)?;
        let r2_endpoint = validate_url("R2_ENDPOINT", require("R2_ENDPOINT")?)?;

        Ok(Self {
            supabase_url,
            supabase_key: require("SUPABASE_KEY")?,
            r2_endpoint,
            r2_access_key: require("R2_ACCESS_KEY")?,
            r2_secret_key: require("R2_SECRET_KEY")?,
            r2_region: get("R2_REGION").unwrap_or_else(|| "auto".to_string()),

            audio_buckets: pair("SUPABASE_AUDIO_BUCKET", "R2_AUDIO_BUCKET")?,
            image_buckets: pair("SUPABASE_IMAGE_BUCKET", "R2_IMAGE_BUCKET")?,

            page_size: get("MIGRATION_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),

            max_attempts: get("MIGRATION_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),

            retry_delay_ms: get("MIGRATION_RETRY_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INITIAL_DELAY_MS),

            tracks_table: get("TRACKS_TABLE").unwrap_or_else(|| DEFAULT_TRACKS_TABLE.to_string()),
        })
    }

    pub fn buckets_for(&self, kind: MediaKind) -> Result<&BucketPair> {
        let (pair, source_key, dest_key) = match kind {
            MediaKind::Audio => (
                self.audio_buckets.as_ref(),
                "SUPABASE_AUDIO_BUCKET",
                "R2_AUDIO_BUCKET",
            ),
            MediaKind::Image => (
                self.image_buckets.as_ref(),
                "SUPABASE_IMAGE_BUCKET",
                "R2_IMAGE_BUCKET",
            ),
        };
        pair.ok_or_else(|| {
            MigrationError::Config(format!(
                "{} and {} must be set to migrate {}",
                source_key, dest_key, kind
            ))
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }
}

fn validate_url(key: &str, value: String) -> Result<String> {
    Url::parse(&value)
        .map_err(|e| MigrationError::Config(format!("{} is not a valid URL: {}", key, e)))?;
    Ok(value.trim_end_matches('/').to_string())
}
