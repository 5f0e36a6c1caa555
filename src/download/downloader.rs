//! Streaming HTTP downloader

use crate::core::progress::Progress;
use crate::error::FetchError;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const DEFAULT_USER_AGENT: &str = concat!("tubefetch/", env!("CARGO_PKG_VERSION"));

/// Streaming downloader configuration
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Connect timeout, also the longest allowed pause between two chunks
    pub timeout: Duration,
    /// User-Agent used when the resolver supplies none
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Writes an HTTP response body to disk chunk by chunk
pub struct StreamDownloader {
    client: reqwest::Client,
    config: DownloaderConfig,
}

impl StreamDownloader {
    /// Create a new downloader with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Create a new downloader with configuration
    pub fn with_config(config: DownloaderConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Download `url` into `output_path`, truncating any existing file.
    ///
    /// `expected_size` seeds progress reporting until the server announces a
    /// length of its own.
    pub async fn download(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        expected_size: u64,
        output_path: &Path,
        on_progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<u64, FetchError> {
        info!("Starting download to {}", output_path.display());
        debug!("Source URL: {}", url);

        let response = self
            .client
            .get(url)
            .headers(to_header_map(headers))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Unexpected status code {} for {}", status, output_path.display());
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        let announced = response.content_length();
        let total = announced.unwrap_or(expected_size);
        let mut progress = Progress::new(total);
        let mut file = File::create(output_path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        loop {
            let next = tokio::time::timeout(self.config.timeout, stream.next())
                .await
                .map_err(|_| {
                    FetchError::Network(format!(
                        "no data received for {}",
                        humantime::format_duration(self.config.timeout)
                    ))
                })?;
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| {
                FetchError::Network(format!(
                    "transfer interrupted after {} bytes: {}",
                    downloaded, e
                ))
            })?;

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress.update(downloaded);
            on_progress(progress.clone());
        }

        file.flush().await?;
        file.sync_all().await?;

        if downloaded == 0 {
            return Err(FetchError::Network("Empty download (0 bytes)".to_string()));
        }
        // Estimated sizes are approximate; only a length the server announced is binding
        if let Some(announced) = announced.filter(|len| downloaded < *len) {
            return Err(FetchError::Network(format!(
                "connection closed after {} of {} bytes",
                downloaded, announced
            )));
        }

        info!("Download completed: {} bytes", downloaded);
        Ok(downloaded)
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => debug!("Skipping invalid header {}", name),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn downloader(timeout: Duration) -> StreamDownloader {
        StreamDownloader::with_config(DownloaderConfig {
            timeout,
            ..DownloaderConfig::default()
        })
        .unwrap()
    }

    /// Answer one request with a raw response, then keep the socket open for `hold`
    async fn serve_raw(response: &'static [u8], hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            socket.write_all(response).await.unwrap();
            tokio::time::sleep(hold).await;
        });
        format!("http://{}/video", addr)
    }

    #[test]
    fn test_downloader_config_default() {
        let config = DownloaderConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("tubefetch/"));
    }

    #[test]
    fn test_stream_downloader_creation() {
        let downloader = StreamDownloader::with_config(DownloaderConfig {
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
        })
        .unwrap();
        assert_eq!(downloader.config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_header_map_conversion() {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), "Mozilla/5.0".to_string());
        headers.insert("Accept-Language".to_string(), "en-us,en;q=0.5".to_string());
        headers.insert("Bad Header".to_string(), "x".to_string());

        let map = to_header_map(&headers);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("user-agent").unwrap(), "Mozilla/5.0");
    }

    #[tokio::test]
    async fn test_download_writes_full_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/video")
            .match_header("user-agent", "Mozilla/5.0")
            .with_status(200)
            .with_body("hello world")
            .create_async()
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.mp4");
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), "Mozilla/5.0".to_string());
        let updates = Mutex::new(Vec::new());

        let bytes = downloader(Duration::from_secs(5))
            .download(
                &format!("{}/video", server.url()),
                &headers,
                0,
                &path,
                &|p: Progress| updates.lock().unwrap().push(p),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
        let updates = updates.lock().unwrap();
        let last = updates.last().unwrap();
        assert_eq!(last.total_size, 11);
        assert!(last.is_complete());
    }

    #[tokio::test]
    async fn test_error_status_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/video")
            .with_status(404)
            .create_async()
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.mp4");

        let result = downloader(Duration::from_secs(5))
            .download(
                &format!("{}/video", server.url()),
                &BTreeMap::new(),
                0,
                &path,
                &|_: Progress| {},
            )
            .await;

        match result {
            Err(FetchError::Network(message)) => assert!(message.contains("404")),
            other => panic!("expected network error, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/video")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;
        let tmp = tempfile::tempdir().unwrap();

        let result = downloader(Duration::from_secs(5))
            .download(
                &format!("{}/video", server.url()),
                &BTreeMap::new(),
                0,
                &tmp.path().join("out.mp4"),
                &|_: Progress| {},
            )
            .await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_body_shorter_than_content_length() {
        let url = serve_raw(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nhello",
            Duration::ZERO,
        )
        .await;
        let tmp = tempfile::tempdir().unwrap();

        let result = downloader(Duration::from_secs(5))
            .download(&url, &BTreeMap::new(), 0, &tmp.path().join("out.mp4"), &|_: Progress| {})
            .await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_stalled_transfer_times_out() {
        let url = serve_raw(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello",
            Duration::from_secs(10),
        )
        .await;
        let tmp = tempfile::tempdir().unwrap();

        let result = downloader(Duration::from_millis(200))
            .download(&url, &BTreeMap::new(), 0, &tmp.path().join("out.mp4"), &|_: Progress| {})
            .await;
        match result {
            Err(FetchError::Network(message)) => assert!(message.contains("no data received")),
            other => panic!("expected stall error, got {:?}", other),
        }
    }
}
