//! Resource fetching for the Marlin engine.
//!
//! Documents consume network content exclusively through the
//! [`ResourceProvider`] capability, so embedders can swap the real HTTP
//! implementation for a deterministic in-memory one in tests.
//!
//! TODO: Implement proper Fetch Standard (<https://fetch.spec.whatwg.org/>)

use base64::Engine;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// User-Agent header sent with all requests.
///
/// Mimics a common desktop browser to avoid basic bot detection.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single outgoing request, created by [`ResourceProvider::create_request`]
/// and dispatched by [`ResourceProvider::send_request`].
#[derive(Debug, Clone)]
pub struct Request {
    /// Absolute target URL.
    pub url: String,
    /// HTTP method. Non-HTTP providers may ignore it.
    pub method: String,
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Per-request timeout; transport failures past this deadline surface
    /// as [`FetchError::Timeout`].
    pub timeout: Duration,
}

impl Request {
    /// Create a GET request for `url` with the default timeout.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A completed response.
///
/// Non-2xx statuses are *not* errors at this layer; callers that need
/// success-only semantics check [`Response::is_success`].
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code (always 200 for `data:` URLs and memory routes).
    pub status: u16,
    /// Response headers, in arrival order.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Build a successful response carrying `body` and no headers.
    #[must_use]
    pub const fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers as `Name: Value` lines separated by CRLF.
    #[must_use]
    pub fn headers_joined(&self) -> String {
        self.headers
            .iter()
            .map(|(n, v)| format!("{n}: {v}"))
            .collect::<Vec<_>>()
            .join("\r\n")
    }
}

/// Transport-level fetch failure.
///
/// Timeouts are a distinct variant because callers react to them
/// differently (e.g. `XMLHttpRequest` fires `ontimeout` rather than
/// `onerror`).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("request to `{url}` timed out")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },
    /// Any other transport failure (DNS, TLS, refused connection, ...).
    #[error("transport failure for `{url}`: {message}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// Human-readable failure description.
        message: String,
    },
    /// A `data:` URL whose payload could not be decoded.
    #[error("cannot decode data URL: {0}")]
    DataUrl(String),
}

impl FetchError {
    /// Whether this failure is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Capability through which the engine resolves external content.
///
/// Implementations must be callable from worker threads: asynchronous
/// script and XHR loads are dispatched off the document's thread.
pub trait ResourceProvider: Send + Sync {
    /// Create a request for `url` with provider defaults applied.
    fn create_request(&self, url: &str) -> Request {
        Request::new(url)
    }

    /// Send `request` and block until a response or failure is available.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport-level failure; an HTTP error
    /// status is a successful fetch whose [`Response::status`] is non-2xx.
    fn send_request(&self, request: &Request) -> Result<Response, FetchError>;

    /// Convenience: create and send a GET request for `url`.
    ///
    /// # Errors
    ///
    /// Propagates [`FetchError`] from [`ResourceProvider::send_request`].
    fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        self.send_request(&self.create_request(url))
    }
}

/// A parsed `data:` URL payload.
struct DataUrl<'a> {
    metadata: &'a str,
    payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a `data:` URL into metadata and payload at the first comma.
    fn parse(url: &'a str) -> Result<Self, FetchError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FetchError::DataUrl("missing data: scheme".to_string()))?;
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| FetchError::DataUrl("missing comma".to_string()))?;
        Ok(Self { metadata, payload })
    }

    /// Decode the payload into raw bytes.
    ///
    /// Base64 payloads are decoded; anything else is taken verbatim.
    fn decode(&self) -> Result<Vec<u8>, FetchError> {
        if self.metadata.ends_with(";base64") {
            base64::engine::general_purpose::STANDARD
                .decode(self.payload)
                .map_err(|e| FetchError::DataUrl(format!("base64 decode error: {e}")))
        } else {
            Ok(self.payload.as_bytes().to_vec())
        }
    }
}

/// Production [`ResourceProvider`] backed by a blocking HTTP client.
///
/// Also resolves `data:` URLs locally without touching the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpResourceProvider;

impl HttpResourceProvider {
    /// Create the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn send_http(request: &Request) -> Result<Response, FetchError> {
        let transport = |message: String| FetchError::Transport {
            url: request.url.clone(),
            message,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(request.timeout)
            .build()
            .map_err(|e| transport(format!("failed to create HTTP client: {e}")))?;

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| transport(format!("invalid method `{}`: {e}", request.method)))?;

        let mut builder = client
            .request(method, &request.url)
            .header("User-Agent", USER_AGENT);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                transport(format!("request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(n, v)| {
                (
                    n.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| transport(format!("failed to read response body: {e}")))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl ResourceProvider for HttpResourceProvider {
    fn send_request(&self, request: &Request) -> Result<Response, FetchError> {
        if request.url.starts_with("data:") {
            let body = DataUrl::parse(&request.url)?.decode()?;
            return Ok(Response::ok(body));
        }
        Self::send_http(request)
    }
}

/// Deterministic in-memory [`ResourceProvider`] for tests and demos.
///
/// Routes map exact URLs to canned bodies or canned failures; requests for
/// unrouted URLs fail with a transport error.
#[derive(Debug, Default)]
pub struct MemoryResourceProvider {
    routes: Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>,
}

impl MemoryResourceProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `url` to a successful UTF-8 body.
    ///
    /// # Panics
    ///
    /// Panics if the route table mutex is poisoned.
    pub fn insert_text(&self, url: &str, body: &str) {
        let _ = self
            .routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
    }

    /// Route `url` to a canned failure.
    ///
    /// # Panics
    ///
    /// Panics if the route table mutex is poisoned.
    pub fn insert_error(&self, url: &str, error: FetchError) {
        let _ = self
            .routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }
}

impl ResourceProvider for MemoryResourceProvider {
    fn send_request(&self, request: &Request) -> Result<Response, FetchError> {
        let routes = self.routes.lock().unwrap();
        match routes.get(&request.url) {
            Some(Ok(body)) => Ok(Response::ok(body.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Transport {
                url: request.url.clone(),
                message: "no route registered".to_string(),
            }),
        }
    }
}
