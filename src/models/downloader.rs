use crate::error::{ModelError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

/// Bytes handed to the filesystem per write while streaming a download.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Keeps a single model artifact in a local cache file.
///
/// A file at the cache path is trusted as-is: there is no expiry and no
/// re-validation against the remote copy.
pub struct ModelDownloader {
    client: Client,
    url: String,
    cache_path: PathBuf,
    checksum: Option<String>,
}

impl ModelDownloader {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            cache_path: cache_path.into(),
            checksum: None,
        })
    }

    /// Expected lowercase hex SHA-256 of the artifact. Empty disables the check.
    pub fn with_checksum(mut self, checksum: Option<String>) -> Self {
        self.checksum = checksum
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty());
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_cached(&self) -> bool {
        self.cache_path.exists()
    }

    /// Returns the cache path, downloading the artifact first if it is absent.
    ///
    /// Failures are not retried.
    pub async fn ensure_cached(&self) -> Result<PathBuf> {
        if self.is_cached() {
            info!(path = %self.cache_path.display(), "using cached model");
            return Ok(self.cache_path.clone());
        }

        info!(url = %self.url, path = %self.cache_path.display(), "downloading model");
        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ModelError::io(parent, e))?;
        }

        let bytes = self.download_file().await?;
        info!(bytes, path = %self.cache_path.display(), "model download complete");
        Ok(self.cache_path.clone())
    }

    async fn download_file(&self) -> Result<u64> {
        // Download to .part file first
        let part_path = part_path(&self.cache_path);

        let result = self.stream_to(&part_path).await;
        let downloaded = match result {
            Ok(downloaded) => downloaded,
            Err(e) => {
                discard_partial(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part_path, &self.cache_path).await {
            discard_partial(&part_path).await;
            return Err(ModelError::io(&self.cache_path, e));
        }

        Ok(downloaded)
    }

    async fn stream_to(&self, part_path: &Path) -> Result<u64> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;

        let file = File::create(part_path)
            .await
            .map_err(|e| ModelError::io(part_path, e))?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            hasher.update(&chunk);
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| ModelError::io(part_path, e))?;
            downloaded += chunk.len() as u64;
        }

        writer.flush().await.map_err(|e| ModelError::io(part_path, e))?;
        drop(writer);

        if let Some(expected) = &self.checksum {
            let actual = format!("{:x}", hasher.finalize());
            if &actual != expected {
                return Err(ModelError::Checksum {
                    expected: expected.clone(),
                    actual,
                });
            }
            info!(sha256 = %actual, "model checksum verified");
        }

        Ok(downloaded)
    }
}

// A truncated .part file must never be mistaken for the model.
async fn discard_partial(part_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(part_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %part_path.display(), error = %e, "could not remove partial download");
        }
    }
}

// Per-process so that instances starting together on a cold cache never
// write into each other's partial file.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}.part", std::process::id()));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BODY: &[u8] = b"{\"pretend\": \"model bytes\"}";

    /// Serves `BODY` at `/model.json`, a 404 at `/missing` and a response
    /// that stalls for 30s at `/slow`, counting hits.
    async fn spawn_model_server() -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let missing_counter = hits.clone();
        let slow_counter = hits.clone();
        let app = Router::new()
            .route(
                "/model.json",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        BODY
                    }
                }),
            )
            .route(
                "/missing",
                get(move || {
                    let counter = missing_counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NOT_FOUND
                    }
                }),
            )
            .route(
                "/slow",
                get(move || {
                    let counter = slow_counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        BODY
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (addr, hits)
    }

    fn downloader(addr: SocketAddr, route: &str, path: &Path) -> ModelDownloader {
        ModelDownloader::new(
            format!("http://{}{}", addr, route),
            path,
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn cold_cache_downloads_exactly_once() {
        let (addr, hits) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("model_cache.json");
        let downloader = downloader(addr, "/model.json", &path);

        assert!(!downloader.is_cached());
        let cached = downloader.ensure_cached().await.expect("download");
        assert_eq!(cached, path);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&path).expect("cached file"), BODY);
        assert!(!part_path(&path).exists());
        assert!(downloader.is_cached());
    }

    #[tokio::test]
    async fn warm_cache_skips_network() {
        let (addr, hits) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_cache.json");
        std::fs::write(&path, b"already here").expect("seed cache");

        let downloader = downloader(addr, "/model.json", &path);
        downloader.ensure_cached().await.expect("cache hit");
        downloader.ensure_cached().await.expect("cache hit");

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&path).expect("cached file"), b"already here");
    }

    #[tokio::test]
    async fn http_error_is_fatal_and_leaves_no_cache_file() {
        let (addr, hits) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_cache.json");
        let downloader = downloader(addr, "/missing", &path);

        let err = downloader.ensure_cached().await.unwrap_err();
        assert!(matches!(err, ModelError::Download(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1, "no internal retry");
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
    }

    #[tokio::test]
    async fn stalled_download_times_out_without_cache_file() {
        let (addr, hits) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_cache.json");
        let downloader = ModelDownloader::new(
            format!("http://{}/slow", addr),
            &path,
            Duration::from_secs(1),
        )
        .expect("client");

        let err = downloader.ensure_cached().await.unwrap_err();
        assert!(matches!(err, ModelError::Download(_)));
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
        assert_eq!(hits.load(Ordering::SeqCst), 1, "no internal retry");
    }

    #[tokio::test]
    async fn failed_rename_removes_partial_download() {
        let (addr, _) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        // A non-empty directory at the cache path makes the final rename fail.
        let path = dir.path().join("model_cache.json");
        std::fs::create_dir(&path).expect("mkdir");
        std::fs::write(path.join("occupant"), b"x").expect("occupant");
        let downloader = downloader(addr, "/model.json", &path);

        let err = downloader.download_file().await.unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(!part_path(&path).exists());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn checksum_match_is_accepted() {
        let (addr, _) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_cache.json");
        let expected = format!("{:x}", Sha256::digest(BODY)).to_uppercase();

        let downloader = downloader(addr, "/model.json", &path).with_checksum(Some(expected));
        downloader.ensure_cached().await.expect("verified download");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_discards_download() {
        let (addr, _) = spawn_model_server().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_cache.json");

        let downloader =
            downloader(addr, "/model.json", &path).with_checksum(Some("00".repeat(32)));
        let err = downloader.ensure_cached().await.unwrap_err();
        assert!(matches!(err, ModelError::Checksum { .. }));
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn blank_checksum_disables_verification() {
        let downloader = ModelDownloader::new("http://localhost/m", "m.json", Duration::from_secs(1))
            .expect("client")
            .with_checksum(Some("  ".to_string()));
        assert!(downloader.checksum.is_none());
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/model_cache.json")),
            PathBuf::from(format!("/tmp/model_cache.json.{}.part", std::process::id()))
        );
    }
}
