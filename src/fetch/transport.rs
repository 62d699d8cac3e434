//! HTTP transport for linked-page lookups
//!
//! A transport turns one GET into a stream of readiness events: headers
//! received, body progress, completion or failure. The pipeline resumes once
//! per event. A transport is never aborted from the pipeline side; when the
//! pipeline stops listening, remaining events are simply dropped.

use crate::config::ClientConfig;
use crate::FetchError;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use url::Url;

/// `Accept` header sent with every lookup
pub const ACCEPT_HTML: &str = "text/html";

const EVENT_BUFFER: usize = 16;

/// A GET request issued by a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub accept: &'static str,
}

/// Status line and headers of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn new(status: u16, content_type: Option<&str>) -> Self {
        Self {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// One readiness change of an in-flight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Response headers are available
    Headers(ResponseHead),

    /// Part of the body arrived
    Progress,

    /// The body finished loading
    Complete(String),

    /// The request failed before completing
    Failed(String),
}

/// Asynchronous GET capability
pub trait Transport: Send + Sync {
    /// Issues `request` and returns the channel its readiness events arrive on
    fn open(&self, request: HttpRequest) -> Result<mpsc::Receiver<TransportEvent>, FetchError>;
}

/// Builds the HTTP client used for lookups
///
/// No timeouts and no retries are configured: a lookup lives until the
/// server answers or the request is superseded.
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] backed by reqwest on the current tokio runtime
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl Transport for ReqwestTransport {
    fn open(&self, request: HttpRequest) -> Result<mpsc::Receiver<TransportEvent>, FetchError> {
        let runtime = Handle::try_current().map_err(|e| FetchError::Setup {
            url: request.url.to_string(),
            message: e.to_string(),
        })?;

        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let pending = self
            .client
            .get(request.url.clone())
            .header(ACCEPT, request.accept);

        runtime.spawn(run_request(pending, request.url, events));
        Ok(receiver)
    }
}

async fn run_request(pending: RequestBuilder, url: Url, events: mpsc::Sender<TransportEvent>) {
    let mut response = match pending.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Request to {} failed: {}", url, e);
            notify(&events, TransportEvent::Failed(describe(&e))).await;
            return;
        }
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let encoding = body_encoding(content_type.as_deref());
    let head = ResponseHead {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        content_type,
    };
    notify(&events, TransportEvent::Headers(head)).await;

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                notify(&events, TransportEvent::Progress).await;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Reading body of {} failed: {}", url, e);
                notify(&events, TransportEvent::Failed(describe(&e))).await;
                return;
            }
        }
    }

    let (text, used, had_errors) = encoding.decode(&body);
    if had_errors {
        tracing::debug!("Body of {} is not valid {}", url, used.name());
    }
    notify(&events, TransportEvent::Complete(text.into_owned())).await;
}

/// Picks the body encoding from the `charset` parameter, defaulting to UTF-8
///
/// A byte order mark in the body still overrides this when decoding.
pub fn body_encoding(content_type: Option<&str>) -> &'static Encoding {
    content_type
        .into_iter()
        .flat_map(|value| value.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
        .unwrap_or(UTF_8)
}

async fn notify(events: &mpsc::Sender<TransportEvent>, event: TransportEvent) {
    // Closed once the pipeline is done or stale; the request still runs to the end.
    let _ = events.send(event).await;
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_body() || e.is_decode() {
        format!("Failed to read response body: {}", e)
    } else {
        e.to_string()
    }
}
