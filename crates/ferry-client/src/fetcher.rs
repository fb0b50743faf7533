use std::path::Path;
use std::time::Duration;

use ferry_core::error::AppError;
use ferry_core::traits::ResourceFetcher;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Seconds allowed for establishing a connection. The transfer itself is
/// not bounded.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = concat!("Ferry/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher using reqwest.
///
/// Streams response bodies straight into the target file, so large
/// resources never sit in memory.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    connect_timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            connect_timeout_secs: timeout.as_secs(),
        })
    }

    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.connect_timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

impl ResourceFetcher for ReqwestFetcher {
    async fn fetch_to(&self, url: &str, target: &Path) -> Result<u64, AppError> {
        validate_url(url)?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| sink_error(target, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read response body: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| sink_error(target, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| sink_error(target, e))?;

        tracing::trace!(%url, bytes = written, "Body streamed to disk");
        Ok(written)
    }
}

fn sink_error(target: &Path, e: std::io::Error) -> AppError {
    AppError::FilesystemError(format!("{}: {e}", target.display()))
}

/// Only absolute `http` and `https` URLs are fetched.
fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::NetworkError(format!("Invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::NetworkError(format!(
            "URL scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}
