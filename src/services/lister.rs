use crate::error::{MigrationError, Result};
use crate::models::FileEntry;
use crate::services::retry::RetryPolicy;
use crate::services::source::SourceStorage;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Walks a source bucket page by page using offset pagination.
pub struct Lister<'a> {
    source: &'a dyn SourceStorage,
    bucket: &'a str,
    page_size: usize,
    retry: &'a RetryPolicy,
}

impl<'a> Lister<'a> {
    pub fn new(
        source: &'a dyn SourceStorage,
        bucket: &'a str,
        page_size: usize,
        retry: &'a RetryPolicy,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(MigrationError::Config(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            source,
            bucket,
            page_size,
            retry,
        })
    }

    /// Fresh cursor starting at offset 0.
    pub fn pages(&self) -> PageCursor<'_> {
        PageCursor {
            lister: self,
            offset: 0,
            pages_requested: 0,
            done: false,
        }
    }

    /// Collects every page into one name-ordered list.
    pub async fn list_all(&self) -> Result<Vec<FileEntry>> {
        let mut all_files = Vec::new();
        let mut cursor = self.pages();

        while let Some(page) = cursor.next_page().await? {
            all_files.extend(page);
            tracing::info!("📑 Fetched {} files so far...", all_files.len());
        }

        tracing::debug!(
            bucket = self.bucket,
            pages = cursor.pages_requested(),
            "Listing complete"
        );
        Ok(all_files)
    }
}

/// Finite cursor over listing pages. Ends after the first empty page.
pub struct PageCursor<'a> {
    lister: &'a Lister<'a>,
    offset: usize,
    pages_requested: usize,
    done: bool,
}

impl<'a> PageCursor<'a> {
    pub async fn next_page(&mut self) -> Result<Option<Vec<FileEntry>>> {
        if self.done {
            return Ok(None);
        }

        let lister = self.lister;
        let offset = self.offset;
        let description = format!("Fetching files from {} (offset {})", lister.bucket, offset);

        let page = lister
            .retry
            .run(&description, move || {
                lister
                    .source
                    .list_page(lister.bucket, lister.page_size, offset)
            })
            .await?;
        self.pages_requested += 1;

        if page.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.offset += lister.page_size;
        Ok(Some(page))
    }

    pub fn pages_requested(&self) -> usize {
        self.pages_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Serves a fixed list of names and records every requested offset.
    struct PagedSource {
        names: Vec<String>,
        offsets: Mutex<Vec<usize>>,
        fail_first: Mutex<u32>,
    }

    impl PagedSource {
        fn new(count: usize) -> Self {
            Self {
                names: (0..count).map(|i| format!("file-{:04}.mp3", i)).collect(),
                offsets: Mutex::new(Vec::new()),
                fail_first: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceStorage for PagedSource {
        async fn list_page(
            &self,
            _bucket: &str,
            limit: usize,
            offset: usize,
        ) -> Result<Vec<FileEntry>> {
            {
                let mut failures = self.fail_first.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(MigrationError::Status {
                        status: 503,
                        url: "list".to_string(),
                    });
                }
            }
            self.offsets.lock().unwrap().push(offset);
            Ok(self
                .names
                .iter()
                .skip(offset)
                .take(limit)
                .map(FileEntry::new)
                .collect())
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("memory://{}/{}", bucket, key)
        }

        async fn fetch_object(&self, _url: &str) -> Result<Bytes> {
            Ok(Bytes::new())
        }
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy::new(3, std::time::Duration::ZERO)
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let source = PagedSource::new(250);
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 100, &retry).unwrap();

        let files = lister.list_all().await.unwrap();
        assert_eq!(files.len(), 250);
        assert_eq!(files[0].name, "file-0000.mp3");
        assert_eq!(files[249].name, "file-0249.mp3");
        // Short last page still needs one empty probe
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 100, 200, 300]);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size() {
        let source = PagedSource::new(200);
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 100, &retry).unwrap();

        let mut cursor = lister.pages();
        let mut total = 0;
        while let Some(page) = cursor.next_page().await.unwrap() {
            total += page.len();
        }
        assert_eq!(total, 200);
        assert_eq!(cursor.pages_requested(), 200 / 100 + 1);
        // Exhausted cursor stays exhausted
        assert!(cursor.next_page().await.unwrap().is_none());
        assert_eq!(cursor.pages_requested(), 3);
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let source = PagedSource::new(0);
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 100, &retry).unwrap();

        assert!(lister.list_all().await.unwrap().is_empty());
        assert_eq!(*source.offsets.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_restart_begins_at_zero() {
        let source = PagedSource::new(5);
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 2, &retry).unwrap();

        let mut first = lister.pages();
        first.next_page().await.unwrap();
        first.next_page().await.unwrap();

        let again = lister.list_all().await.unwrap();
        assert_eq!(again.len(), 5);
        assert_eq!(
            *source.offsets.lock().unwrap(),
            vec![0, 2, 0, 2, 4, 6]
        );
    }

    #[tokio::test]
    async fn test_transient_page_failure_is_retried() {
        let source = PagedSource::new(3);
        *source.fail_first.lock().unwrap() = 2;
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 10, &retry).unwrap();

        assert_eq!(lister.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_page_failure_aborts() {
        let source = PagedSource::new(3);
        *source.fail_first.lock().unwrap() = 3;
        let retry = no_wait();
        let lister = Lister::new(&source, "audio", 10, &retry).unwrap();

        let err = lister.list_all().await.unwrap_err();
        assert!(matches!(err, MigrationError::Status { status: 503, .. }));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let source = PagedSource::new(1);
        let retry = no_wait();
        assert!(Lister::new(&source, "audio", 0, &retry).is_err());
    }
}
