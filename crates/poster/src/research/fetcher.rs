//! Page fetching for link research.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::extract::{extract_readable, normalize_whitespace};

/// Browser-like user agent; many sites refuse obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Maximum redirects followed per link.
const MAX_REDIRECTS: usize = 5;

/// Bytes read from one page; the rest of the body is ignored.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Why a single link could not be used.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unsupported content type `{0}`")]
    UnsupportedContent(String),

    #[error("no readable text on page")]
    Empty,
}

/// A fetched page reduced to readable text.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Page title, if one was found.
    pub title: Option<String>,
    /// Readable text (not yet truncated).
    pub text: String,
}

/// Fetches a URL and returns its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Fetcher backed by reqwest and HTML extraction.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            max_bytes: MAX_PAGE_BYTES,
        })
    }

    /// Cap the bytes read from each page.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Read at most `limit` bytes of a response body, chunk by chunk.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<String, FetchError> {
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            tracing::debug!(length, limit, "Page larger than read limit, keeping the head");
        }
    }

    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    // A cut may split a multi-byte character.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        let kind = ContentKind::from_header(&content_type)
            .ok_or_else(|| FetchError::UnsupportedContent(content_type.clone()))?;

        let body = read_capped(response, self.max_bytes).await?;

        let page = match kind {
            ContentKind::Html => {
                let extracted = extract_readable(&body);
                FetchedPage {
                    title: extracted.title,
                    text: extracted.text,
                }
            }
            ContentKind::Text => FetchedPage {
                title: None,
                text: normalize_whitespace(&body),
            },
        };

        if page.text.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Text,
}

impl ContentKind {
    /// Classify a lower-cased `Content-Type` value. A missing header is
    /// treated as HTML.
    fn from_header(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime {
            "" | "text/html" | "application/xhtml+xml" => Some(Self::Html),
            "text/plain" | "text/markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve_text(server: &MockServer, route: &str, body: String) -> Url {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/plain"))
            .mount(server)
            .await;
        Url::parse(&format!("{}{route}", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_large_page_is_read_up_to_the_cap() {
        let server = MockServer::start().await;
        let url = serve_text(&server, "/huge", "word ".repeat(50_000)).await;

        let fetcher = HttpFetcher::new(Duration::from_secs(2))
            .unwrap()
            .with_max_bytes(1024);
        let page = fetcher.fetch(&url).await.unwrap();

        assert!(!page.text.is_empty());
        assert!(page.text.len() <= 1024);
        assert!(page.text.starts_with("word word"));
    }

    #[tokio::test]
    async fn test_small_page_is_read_whole() {
        let server = MockServer::start().await;
        let url = serve_text(&server, "/small", "Rust is fast.\n\nAnd safe.".to_string()).await;

        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.text, "Rust is fast.\nAnd safe.");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
        let err = HttpFetcher::new(Duration::from_secs(2))
            .unwrap()
            .fetch(&url)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[test]
    fn test_content_kind_classification() {
        assert_eq!(
            ContentKind::from_header("text/html; charset=utf-8"),
            Some(ContentKind::Html)
        );
        assert_eq!(ContentKind::from_header(""), Some(ContentKind::Html));
        assert_eq!(
            ContentKind::from_header("text/plain"),
            Some(ContentKind::Text)
        );
        assert_eq!(ContentKind::from_header("application/pdf"), None);
        assert_eq!(ContentKind::from_header("image/png"), None);
    }
}
