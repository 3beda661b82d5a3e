pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{MigrationError, Result};
pub use models::{FileEntry, RunStats};
pub use services::migration::{MigrationPipeline, PipelineConfig};
pub use utils::media::MediaKind;
