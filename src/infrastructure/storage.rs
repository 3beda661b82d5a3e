use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};
use crate::services::records::TrackRecordUpdater;
use crate::services::source::SupabaseStorage;
use crate::services::storage::S3DestinationStorage;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn setup_destination(config: &MigrationConfig) -> Arc<S3DestinationStorage> {
    info!(
        "☁️  Destination storage: {} (region: {})",
        config.r2_endpoint, config.r2_region
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.r2_endpoint)
        .region(Region::new(config.r2_region.clone()))
        .credentials_provider(Credentials::new(
            config.r2_access_key.clone(),
            config.r2_secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3DestinationStorage::new(s3_client, config.r2_endpoint.clone()))
}

/// Shared HTTP client for the source storage and record updates.
pub fn setup_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("media-migrator/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(MigrationError::from)
}

pub fn setup_source(config: &MigrationConfig, client: reqwest::Client) -> Arc<SupabaseStorage> {
    info!("📦 Source storage: {}", config.supabase_url);
    Arc::new(SupabaseStorage::new(
        client,
        config.supabase_url.clone(),
        config.supabase_key.clone(),
    ))
}

pub fn setup_record_updater(
    config: &MigrationConfig,
    client: reqwest::Client,
) -> Arc<TrackRecordUpdater> {
    info!("🗂️  Record updates enabled for table '{}'", config.tracks_table);
    Arc::new(TrackRecordUpdater::new(
        client,
        config.supabase_url.clone(),
        config.supabase_key.clone(),
        config.tracks_table.clone(),
    ))
}
