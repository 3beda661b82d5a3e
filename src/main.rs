use anyhow::Context;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use media_migrator::config::MigrationConfig;
use media_migrator::infrastructure::storage;
use media_migrator::services::retry::RetryPolicy;
use media_migrator::{MediaKind, MigrationPipeline, PipelineConfig, RunStats};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the run completed but some entries failed
const EXIT_ENTRY_FAILURES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Audio,
    Images,
    All,
}

impl Target {
    fn kinds(self) -> &'static [MediaKind] {
        match self {
            Target::Audio => &[MediaKind::Audio],
            Target::Images => &[MediaKind::Image],
            Target::All => &[MediaKind::Audio, MediaKind::Image],
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Copy media objects from Supabase Storage to an S3-compatible bucket", long_about = None)]
struct Args {
    /// Which media to migrate
    #[arg(value_enum)]
    target: Target,

    /// Listing page size (overrides MIGRATION_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<usize>,

    /// Attempts per retried operation (overrides MIGRATION_MAX_ATTEMPTS)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Wait before the first retry in milliseconds (overrides MIGRATION_RETRY_DELAY_MS)
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Download and upload each object once, without retries
    #[arg(long)]
    no_transfer_retry: bool,

    /// Point rows in the tracks table at the migrated object
    #[arg(long)]
    update_records: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "media_migrator=info".into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json);

    info!("🚀 Starting media migration [{:?}]...", args.target);

    let mut config = MigrationConfig::from_env().context("Failed to load configuration")?;
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay_ms = delay;
    }

    let http = storage::setup_http_client().context("Failed to build HTTP client")?;
    let source = storage::setup_source(&config, http.clone());
    let destination = storage::setup_destination(&config).await;
    let record_updater = args
        .update_records
        .then(|| storage::setup_record_updater(&config, http.clone()));

    let retry_policy = config.retry_policy();
    let transfer_retry_policy = if args.no_transfer_retry {
        RetryPolicy::single_attempt()
    } else {
        retry_policy.clone()
    };
    info!(
        "🔁 Retry policy: {} attempts, first wait {:?}{}",
        retry_policy.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        if args.no_transfer_retry {
            " (transfers not retried)"
        } else {
            ""
        }
    );

    let mut totals = RunStats::new();
    for &kind in args.target.kinds() {
        let buckets = config.buckets_for(kind)?;
        let pipeline_config = PipelineConfig {
            page_size: config.page_size,
            retry_policy: retry_policy.clone(),
            transfer_retry_policy: transfer_retry_policy.clone(),
            ..PipelineConfig::new(kind, &buckets.source, &buckets.destination)
        };

        let mut pipeline =
            MigrationPipeline::new(source.clone(), destination.clone(), pipeline_config);
        if let Some(updater) = &record_updater {
            pipeline = pipeline.with_post_upload_hook(updater.clone());
        }

        let stats = match pipeline.run().await {
            Ok(stats) => stats,
            Err(e) => {
                error!("❌ Migration of {} aborted", kind);
                return Err(e).with_context(|| format!("Failed to list {} files", kind));
            }
        };
        stats.log_summary(kind.label());
        totals.merge(&stats);
    }

    if args.target == Target::All {
        totals.log_summary("all");
    }

    if totals.failed > 0 {
        error!("⚠️ Process completed with {} failed file(s): {}", totals.failed, totals);
        return Ok(ExitCode::from(EXIT_ENTRY_FAILURES));
    }

    info!("🎉 Process completed! {}", totals);
    Ok(ExitCode::SUCCESS)
}
