use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status: {status}")]
    Status { status: u16, url: String },

    #[error("Storage error ({code}): {message}")]
    Storage { code: String, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MigrationError {
    pub fn storage(code: impl Into<String>, message: impl Into<String>) -> Self {
        MigrationError::Storage {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Machine-readable code for log lines, when the error carries one.
    pub fn code(&self) -> Option<String> {
        match self {
            MigrationError::Status { status, .. } => Some(status.to_string()),
            MigrationError::Storage { code, .. } => Some(code.clone()),
            MigrationError::Http(e) => e.status().map(|s| s.as_u16().to_string()),
            MigrationError::Config(_) | MigrationError::Decode(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MigrationError::Status {
            status: 404,
            url: "http://localhost/x".to_string(),
        };
        assert_eq!(err.code().as_deref(), Some("404"));
        assert!(err.to_string().contains("404"));

        let err = MigrationError::storage("SlowDown", "Please reduce your request rate");
        assert_eq!(err.code().as_deref(), Some("SlowDown"));

        let err = MigrationError::Config("SUPABASE_URL must be set".to_string());
        assert!(err.code().is_none());
    }
}
