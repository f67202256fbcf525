//! Gold price provider client
//!
//! Two page-data endpoints on the provider feed everything we serve: the
//! main page (gram gold and spot ounce) and the crafted-coin page (coin
//! coefficients against the gram price). Both wrap their payload in a
//! top-level `data` object.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{CraftedItem, CraftedItems, Quote, QuoteSnapshot};
use crate::pricing::{safe_float, RawScalar};

pub const DEFAULT_BASE_URL: &str = "https://ozandoviz.com";
pub const MAIN_PAGE_PATH: &str = "/mainpagedataredis.php";
pub const CRAFTED_PAGE_PATH: &str = "/sarrafiyehaspagedataredis.php";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// The provider rejects obvious bot user agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const ACCEPT_ANY_JSON: &str = "application/json, text/plain, */*";

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Transport failure or a 4xx/5xx status.
    #[error("upstream {url} unreachable: {reason}")]
    Connection { url: String, reason: String },
    /// Body is not JSON, or not shaped like a page-data payload.
    #[error("upstream {url} returned malformed body ({reason}): {preview}")]
    Format {
        url: String,
        preview: String,
        reason: String,
    },
}

impl UpstreamError {
    pub fn url(&self) -> &str {
        match self {
            UpstreamError::Connection { url, .. } | UpstreamError::Format { url, .. } => url,
        }
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// GET `url` and parse the body as JSON. No retries.
pub async fn fetch_json(
    http: &Client,
    url: &str,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<Value, UpstreamError> {
    let connection = |reason: String| UpstreamError::Connection {
        url: url.to_string(),
        reason,
    };

    let response = http
        .get(url)
        .headers(headers)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| connection(e.to_string()))?
        .error_for_status()
        .map_err(|e| connection(e.to_string()))?;

    let body = response
        .text()
        .await
        .map_err(|e| connection(format!("failed to read body: {e}")))?;
    debug!(url = %url, body_len = body.len(), "upstream response received");

    serde_json::from_str(&body).map_err(|e| {
        warn!(url = %url, error = %e, body_preview = %preview(&body), "upstream JSON parse failed");
        UpstreamError::Format {
            url: url.to_string(),
            preview: preview(&body),
            reason: e.to_string(),
        }
    })
}

/// One record inside `data`, before coercion.
#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    code: Option<RawScalar>,
    #[serde(default)]
    alis: Option<RawScalar>,
    #[serde(default)]
    satis: Option<RawScalar>,
}

/// Pull the `data` records out of a page payload.
///
/// A missing or null `data` reads as empty. Individual records that are not
/// objects are skipped, so they degrade like absent records.
fn data_entries(url: &str, body: Value) -> Result<Vec<(String, RawEntry)>, UpstreamError> {
    let malformed = |reason: &str, value: &Value| UpstreamError::Format {
        url: url.to_string(),
        preview: preview(&value.to_string()),
        reason: reason.to_string(),
    };

    let mut root = match body {
        Value::Object(map) => map,
        other => return Err(malformed("expected a JSON object", &other)),
    };

    let data = match root.remove("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(malformed("`data` is not an object", &other)),
    };

    let mut entries = Vec::with_capacity(data.len());
    for (key, value) in data {
        // Derived struct deserialization also accepts sequences by position.
        if !value.is_object() {
            warn!(url = %url, key = %key, "skipping non-object upstream record");
            continue;
        }
        match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => entries.push((key, entry)),
            Err(e) => warn!(url = %url, key = %key, error = %e, "skipping malformed upstream record"),
        }
    }
    Ok(entries)
}

pub fn parse_quote_snapshot(url: &str, body: Value) -> Result<QuoteSnapshot, UpstreamError> {
    let instruments = data_entries(url, body)?
        .into_iter()
        .map(|(code, raw)| {
            let quote = Quote {
                bid: safe_float(raw.alis.as_ref(), 0.0),
                ask: safe_float(raw.satis.as_ref(), 0.0),
            };
            (code, quote)
        })
        .collect();
    Ok(QuoteSnapshot { instruments })
}

pub fn parse_crafted_items(url: &str, body: Value) -> Result<CraftedItems, UpstreamError> {
    let items = data_entries(url, body)?
        .into_iter()
        .map(|(code, raw)| {
            let item = CraftedItem {
                name: raw.code.as_ref().and_then(RawScalar::as_text).map(str::to_string),
                bid_coefficient: safe_float(raw.alis.as_ref(), 0.0),
                ask_coefficient: safe_float(raw.satis.as_ref(), 0.0),
            };
            (code, item)
        })
        .collect();
    Ok(CraftedItems { items })
}

/// Where the endpoint gets its two upstream payloads from.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn main_snapshot(&self) -> Result<QuoteSnapshot, UpstreamError>;
    async fn crafted_items(&self) -> Result<CraftedItems, UpstreamError>;
}

#[derive(Clone)]
pub struct GoldProviderClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl GoldProviderClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build GoldProviderClient")?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_ANY_JSON));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers,
            timeout,
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_page(&self, path: &str) -> Result<(String, Value), UpstreamError> {
        let url = self.url(path);
        let started = Instant::now();
        let body = fetch_json(&self.client, &url, self.headers.clone(), self.timeout).await?;
        debug!(
            url = %url,
            latency_ms = started.elapsed().as_millis() as u64,
            "upstream page fetched"
        );
        Ok((url, body))
    }
}

#[async_trait]
impl QuoteSource for GoldProviderClient {
    async fn main_snapshot(&self) -> Result<QuoteSnapshot, UpstreamError> {
        let (url, body) = self.fetch_page(MAIN_PAGE_PATH).await?;
        parse_quote_snapshot(&url, body)
    }

    async fn crafted_items(&self) -> Result<CraftedItems, UpstreamError> {
        let (url, body) = self.fetch_page(CRAFTED_PAGE_PATH).await?;
        parse_crafted_items(&url, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_quote_snapshot_coerces_fields() {
        let body = json!({
            "data": {
                "ALTIN": {"alis": "2.512,40", "satis": 2519.9},
                "ONS": {"alis": "-", "satis": null},
                "USD": "not a record"
            }
        });
        let snapshot = parse_quote_snapshot("http://test/main", body).unwrap();
        assert_eq!(snapshot.quote("ALTIN"), Quote { bid: 2512.4, ask: 2519.9 });
        assert_eq!(snapshot.quote("ONS"), Quote { bid: 0.0, ask: 0.0 });
        assert!(!snapshot.instruments.contains_key("USD"));
    }

    #[test]
    fn test_parse_crafted_items() {
        let body = json!({
            "data": {
                "stl2": {"code": "ESKİ ÇEYREK ALTIN", "alis": "1,5", "satis": 1.52},
                "stl4": {"code": 42, "alis": 3.0}
            }
        });
        let items = parse_crafted_items("http://test/crafted", body).unwrap();
        let quarter = items.get("stl2").unwrap();
        assert_eq!(quarter.name.as_deref(), Some("ESKİ ÇEYREK ALTIN"));
        assert_eq!(quarter.bid_coefficient, 1.5);
        assert_eq!(quarter.ask_coefficient, 1.52);

        let half = items.get("stl4").unwrap();
        assert_eq!(half.name, None);
        assert_eq!(half.ask_coefficient, 0.0);
    }

    #[test]
    fn test_missing_data_reads_as_empty() {
        let snapshot = parse_quote_snapshot("http://test/main", json!({})).unwrap();
        assert!(snapshot.instruments.is_empty());
        let items = parse_crafted_items("http://test/crafted", json!({"data": null})).unwrap();
        assert!(items.items.is_empty());
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let snapshot = parse_quote_snapshot(
            "http://test/main",
            json!({"data": {
                "ALTIN": ["x", "2500", "2510"],
                "ONS": "2650",
                "USDTRY": {"alis": "41,10", "satis": "41,20"}
            }}),
        )
        .unwrap();
        assert!(!snapshot.instruments.contains_key("ALTIN"));
        assert!(!snapshot.instruments.contains_key("ONS"));
        assert_eq!(snapshot.quote("ALTIN"), Quote::default());
        assert_eq!(snapshot.instruments.len(), 1);

        let items = parse_crafted_items(
            "http://test/crafted",
            json!({"data": {"stl2": ["ESKİ ÇEYREK ALTIN", 1.5, 1.5]}}),
        )
        .unwrap();
        assert!(items.get("stl2").is_none());
    }

    #[test]
    fn test_unexpected_shape_is_format_error() {
        let err = parse_quote_snapshot("http://test/main", json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, UpstreamError::Format { .. }));

        let err = parse_crafted_items("http://test/crafted", json!({"data": "oops"})).unwrap_err();
        match err {
            UpstreamError::Format { url, preview, .. } => {
                assert_eq!(url, "http://test/crafted");
                assert_eq!(preview, "\"oops\"");
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MAIN_PAGE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"ALTIN": {"alis": "2500", "satis": "2510"}}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GoldProviderClient::new(server.uri(), DEFAULT_TIMEOUT).unwrap();
        let snapshot = client.main_snapshot().await.unwrap();
        assert_eq!(snapshot.quote("ALTIN"), Quote { bid: 2500.0, ask: 2510.0 });

        let requests = server.received_requests().await.unwrap();
        let sent = |name: &str| {
            requests[0]
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(sent("user-agent").as_deref(), Some(BROWSER_USER_AGENT));
        assert_eq!(sent("accept").as_deref(), Some(ACCEPT_ANY_JSON));
    }

    #[tokio::test]
    async fn test_server_error_is_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = GoldProviderClient::new(server.uri(), DEFAULT_TIMEOUT).unwrap();
        let err = client.crafted_items().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Connection { .. }));
        assert!(err.url().ends_with(CRAFTED_PAGE_PATH));
    }

    #[tokio::test]
    async fn test_html_body_is_format_error_with_preview() {
        let server = MockServer::start().await;
        let page = format!("<html>{}</html>", "x".repeat(500));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page.clone()))
            .mount(&server)
            .await;

        let client = GoldProviderClient::new(server.uri(), DEFAULT_TIMEOUT).unwrap();
        match client.main_snapshot().await.unwrap_err() {
            UpstreamError::Format { url, preview, .. } => {
                assert!(url.ends_with(MAIN_PAGE_PATH));
                assert_eq!(preview.chars().count(), BODY_PREVIEW_CHARS);
                assert!(page.starts_with(&preview));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {}}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = GoldProviderClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.main_snapshot().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GoldProviderClient::new(format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap();
        let err = client.main_snapshot().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Connection { .. }));
    }
}
