use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const DEFAULT_TRACKS_TABLE: &str = "tracks";

/// Step run after an object has been uploaded.
#[async_trait]
pub trait PostUploadHook: Send + Sync {
    async fn after_upload(&self, source_url: &str, destination_url: &str) -> Result<()>;
}

/// Rewrites `url` columns that still point at the source object.
pub struct TrackRecordUpdater {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl TrackRecordUpdater {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: table.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl PostUploadHook for TrackRecordUpdater {
    async fn after_upload(&self, source_url: &str, destination_url: &str) -> Result<()> {
        let url = self.table_url();
        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .query(&[("url", format!("eq.{}", source_url))])
            .json(&json!({ "url": destination_url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrationError::Status {
                status: status.as_u16(),
                url,
            });
        }

        tracing::info!("🔄 Updated {} records pointing at {}", self.table, source_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stub_http::StubServer;

    fn updater_for(server: &StubServer) -> TrackRecordUpdater {
        let client = Client::builder().no_proxy().build().unwrap();
        TrackRecordUpdater::new(client, &server.base_url, "service-key", DEFAULT_TRACKS_TABLE)
    }

    #[test]
    fn test_table_url() {
        let updater = TrackRecordUpdater::new(
            Client::new(),
            "https://project.supabase.co/",
            "service-key",
            DEFAULT_TRACKS_TABLE,
        );
        assert_eq!(
            updater.table_url(),
            "https://project.supabase.co/rest/v1/tracks"
        );
    }

    #[tokio::test]
    async fn test_after_upload_patches_matching_rows() {
        let server = StubServer::start(204, "").await;
        let updater = updater_for(&server);

        updater
            .after_upload(
                "http://127.0.0.1/storage/v1/object/public/audio/my%20song.mp3",
                "https://r2.example.com/audio-r2/my%20song.mp3",
            )
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with(
            "PATCH /rest/v1/tracks?url=eq.http%3A%2F%2F127.0.0.1%2Fstorage%2Fv1%2Fobject%2Fpublic%2Faudio%2Fmy%2520song.mp3 HTTP/1.1"
        ));
        let lowered = request.to_lowercase();
        assert!(lowered.contains("prefer: return=minimal"));
        assert!(lowered.contains("apikey: service-key"));

        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body,
            json!({ "url": "https://r2.example.com/audio-r2/my%20song.mp3" })
        );
    }

    #[tokio::test]
    async fn test_after_upload_rejected() {
        let server = StubServer::start(401, r#"{"message":"JWT expired"}"#).await;
        let err = updater_for(&server)
            .after_upload("http://a/x.mp3", "http://b/x.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Status { status: 401, .. }));
    }
}
