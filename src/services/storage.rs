use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

/// Outcome of a successful existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPresence {
    Present,
    Absent,
}

/// Destination object store.
///
/// `head_object` reports a missing key as `Ok(ObjectPresence::Absent)`;
/// only other failures are errors.
#[async_trait]
pub trait DestinationStorage: Send + Sync {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectPresence>;
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<()>;
    /// Address of an object once uploaded, used to rewrite backing records.
    fn object_url(&self, bucket: &str, key: &str) -> String;
}

pub struct S3DestinationStorage {
    client: Client,
    endpoint: String,
}

impl S3DestinationStorage {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

fn sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>) -> MigrationError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    // HEAD responses carry no error body, so fall back to the HTTP status.
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = match (err.code(), status) {
        (Some(code), _) => code.to_string(),
        (None, Some(status)) => status.to_string(),
        (None, None) => "Unknown".to_string(),
    };
    let message = match (err.message(), status) {
        (Some(msg), _) => msg.to_string(),
        (None, Some(status)) => format!("request rejected with HTTP {}", status),
        (None, None) => format!("{}", aws_sdk_s3::error::DisplayErrorContext(&err)),
    };
    MigrationError::storage(code, message)
}

#[async_trait]
impl DestinationStorage for S3DestinationStorage {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectPresence> {
        let res = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(ObjectPresence::Present),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(ObjectPresence::Absent)
                } else {
                    Err(sdk_error(e))
                }
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let res = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                bucket,
                key,
                e
            );
            return Err(sdk_error(e));
        }
        Ok(())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            bucket,
            crate::utils::media::encode_key(key)
        )
    }
}
