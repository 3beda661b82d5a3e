use crate::error::{MigrationError, Result};
use crate::models::FileEntry;
use crate::utils::media::encode_key;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

/// Source object store: paged listing plus public downloads.
#[async_trait]
pub trait SourceStorage: Send + Sync {
    /// One page of the bucket root, sorted by name ascending.
    async fn list_page(&self, bucket: &str, limit: usize, offset: usize)
    -> Result<Vec<FileEntry>>;
    fn public_url(&self, bucket: &str, key: &str) -> String;
    async fn fetch_object(&self, url: &str) -> Result<Bytes>;
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy<'a>,
}

#[derive(Debug, Serialize)]
struct SortBy<'a> {
    column: &'a str,
    order: &'a str,
}

/// Supabase Storage over its REST API.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn list_url(&self, bucket: &str) -> String {
        format!("{}/storage/v1/object/list/{}", self.base_url, bucket)
    }
}

#[async_trait]
impl SourceStorage for SupabaseStorage {
    async fn list_page(
        &self,
        bucket: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FileEntry>> {
        let url = self.list_url(bucket);
        let body = ListRequest {
            prefix: "",
            limit,
            offset,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %detail, "Listing request rejected");
            return Err(MigrationError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let entries: Vec<FileEntry> = serde_json::from_str(&text)?;
        Ok(entries)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            encode_key(key)
        )
    }

    async fn fetch_object(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrationError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}
