//! Renderer source loading — module scripts and stylesheets.
//!
//! DESIGN
//! ======
//! A widget's front-end module source or stylesheet can be given inline,
//! as a file path, or as an http(s) URL. URL fetches are bounded and
//! retryable: each attempt gets its own timeout, transient failures back
//! off and retry, and 4xx responses fail fast. Nothing here hangs or
//! panics — every failure mode is a typed `FetchError`.

use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::envelope::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub attempts: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { attempts: 3, timeout: Duration::from_secs(10), backoff: Duration::from_millis(250) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} unreachable after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },
    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request { .. } => "E_FETCH_REQUEST",
            Self::Status { .. } => "E_FETCH_STATUS",
            Self::Exhausted { .. } => "E_FETCH_EXHAUSTED",
            Self::File { .. } => "E_FETCH_FILE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::Exhausted { .. })
    }
}

// =============================================================================
// FETCH
// =============================================================================

/// GET a text resource with per-attempt timeout and bounded retries.
/// Server errors (5xx) and transport failures retry with linear backoff;
/// client errors (4xx) fail immediately.
///
/// # Errors
///
/// `Status` on a client error, `Exhausted` when the retry budget runs out.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    config: &FetchConfig,
) -> Result<String, FetchError> {
    let mut last_status = None;
    for attempt in 1..=config.attempts {
        let result = client.get(url).timeout(config.timeout).send().await;
        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response
                        .text()
                        .await
                        .map_err(|source| FetchError::Request { url: url.to_string(), source });
                }
                if status.is_client_error() {
                    return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
                }
                last_status = Some(status.as_u16());
                warn!(%url, status = status.as_u16(), attempt, "fetch failed; retrying");
            }
            Err(source) => {
                warn!(%url, error = %source, attempt, "fetch failed; retrying");
                if attempt == config.attempts {
                    return Err(FetchError::Request { url: url.to_string(), source });
                }
            }
        }
        if attempt < config.attempts {
            tokio::time::sleep(config.backoff * attempt).await;
        }
    }

    match last_status {
        Some(status) => Err(FetchError::Status { url: url.to_string(), status }),
        None => Err(FetchError::Exhausted { url: url.to_string(), attempts: config.attempts }),
    }
}

/// Resolve a source spec the way widget authors write them: an existing
/// file path is read, an http(s) URL is fetched, anything else is taken as
/// the inline source itself.
///
/// # Errors
///
/// File read and fetch failures; inline sources cannot fail.
pub async fn resolve_source(
    client: &reqwest::Client,
    spec: &str,
    config: &FetchConfig,
) -> Result<String, FetchError> {
    if Path::new(spec).is_file() {
        return tokio::fs::read_to_string(spec)
            .await
            .map_err(|source| FetchError::File { path: spec.to_string(), source });
    }
    if spec.starts_with("http://") || spec.starts_with("https://") {
        return fetch_text(client, spec, config).await;
    }
    Ok(spec.to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inline_source_passes_through() {
        let client = reqwest::Client::new();
        let source = "export function render(view) {}";
        let resolved = resolve_source(&client, source, &FetchConfig::default())
            .await
            .expect("inline source cannot fail");
        assert_eq!(resolved, source);
    }

    #[tokio::test]
    async fn file_source_is_read() {
        let path = std::env::temp_dir().join("mapbridge_fetch_test.mjs");
        std::fs::write(&path, "export const style = 1;").expect("write temp file");

        let client = reqwest::Client::new();
        let resolved = resolve_source(&client, path.to_str().expect("utf-8 path"), &FetchConfig::default())
            .await
            .expect("file read");
        assert_eq!(resolved, "export const style = 1;");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn unreachable_url_is_a_typed_retryable_error() {
        let client = reqwest::Client::new();
        // Reserved TEST-NET-1 address; connections fail without a network
        // round trip mattering for the assertion.
        let config = FetchConfig {
            attempts: 2,
            timeout: Duration::from_millis(200),
            backoff: Duration::from_millis(1),
        };
        let err = fetch_text(&client, "http://192.0.2.1:9/style.json", &config)
            .await
            .expect_err("must fail");
        assert!(err.retryable());
    }
}
