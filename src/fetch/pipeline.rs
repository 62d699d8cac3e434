//! Per-request fetch pipeline
//!
//! A [`FetchPipeline`] is an explicit state machine:
//!
//! ```text
//! Init --begin--> HeadersWait --headers ok--> BodyWait --complete--> Done
//!                      |                         |
//!                      +------ failure / stale --+------------------> Done
//! ```
//!
//! The runtime holds the pipeline and calls [`FetchPipeline::resume`] once per
//! transport event. Currency against the request epoch is re-checked on every
//! wake; a stale pipeline goes to `Done` without invoking its callback.
//! Every other path to `Done` invokes the callback exactly once.

use crate::extract::{strip_noscript, ContextDocument, ExtractionResult, Extractor, LookupFlags};
use crate::fetch::transport::{HttpRequest, ResponseHead, TransportEvent, ACCEPT_HTML};
use crate::state::{EpochToken, PipelineState};
use crate::FetchError;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Completion callback receiving the extraction result, or `None` on failure
pub type CompletionFn = Box<dyn FnOnce(Option<ExtractionResult>) + Send>;

/// Everything one lookup needs, owned by its pipeline until it finishes
pub struct FetchRequest {
    pub document: ContextDocument,
    pub target_url: Url,
    pub flags: LookupFlags,
    pub epoch_token: EpochToken,
    pub extractor: Arc<dyn Extractor>,
    pub on_complete: CompletionFn,
}

/// State machine driving one fetch-parse-extract lookup
pub struct FetchPipeline {
    state: PipelineState,
    url: Url,
    epoch_token: EpochToken,
    allowed_types: Arc<[String]>,
    content_type: Option<String>,
    request: Option<FetchRequest>,
}

impl FetchPipeline {
    /// Creates a pipeline in `Init`
    ///
    /// `allowed_types` are the media types the linked document may be served as.
    pub fn new(request: FetchRequest, allowed_types: Arc<[String]>) -> Self {
        Self {
            state: PipelineState::Init,
            url: request.target_url.clone(),
            epoch_token: request.epoch_token.clone(),
            allowed_types,
            content_type: None,
            request: Some(request),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Moves to `HeadersWait` and returns the request the transport must issue
    pub fn begin(&mut self) -> HttpRequest {
        tracing::debug!(
            "Fetching {} (epoch {})",
            self.url,
            self.epoch_token
        );
        self.state = PipelineState::HeadersWait;
        tracing::debug!("Waiting for headers from {}", self.url);
        HttpRequest {
            url: self.url.clone(),
            accept: ACCEPT_HTML,
        }
    }

    /// Continues the pipeline after one transport event and returns the new state
    pub fn resume(&mut self, event: TransportEvent) -> PipelineState {
        if self.state.is_terminal() {
            return self.state;
        }

        if !self.epoch_token.is_current() {
            let stale = FetchError::Stale {
                url: self.url.to_string(),
            };
            tracing::debug!("Aborting obsolete request (epoch {}): {}", self.epoch_token, stale);
            // Dropping the request drops its callback uninvoked
            self.request = None;
            self.state = PipelineState::Done;
            return self.state;
        }

        let next = match (self.state, event) {
            (PipelineState::Init, event) => {
                tracing::warn!("Ignoring {:?} for {}: request not issued yet", event, self.url);
                Ok(PipelineState::Init)
            }
            (_, TransportEvent::Failed(message)) => Err(FetchError::Transport {
                url: self.url.to_string(),
                message,
            }),
            (PipelineState::HeadersWait, TransportEvent::Headers(head)) => self.accept_headers(head),
            (PipelineState::HeadersWait, TransportEvent::Progress) => Ok(PipelineState::HeadersWait),
            (PipelineState::HeadersWait, TransportEvent::Complete(_)) => Err(FetchError::Transport {
                url: self.url.to_string(),
                message: "Response completed without headers".to_string(),
            }),
            (PipelineState::BodyWait, TransportEvent::Progress) => {
                tracing::trace!(
                    "Waiting for body of {} (epoch {})",
                    self.url,
                    self.epoch_token
                );
                Ok(PipelineState::BodyWait)
            }
            (PipelineState::BodyWait, TransportEvent::Headers(_)) => {
                tracing::warn!("Ignoring repeated headers for {}", self.url);
                Ok(PipelineState::BodyWait)
            }
            (PipelineState::BodyWait, TransportEvent::Complete(body)) => self.finish(body),
            (PipelineState::Done, _) => Ok(PipelineState::Done),
        };

        match next {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::debug!("{}", e);
                self.complete(None);
            }
        }

        self.state
    }

    /// Feeds transport events into the pipeline until it reaches `Done`
    ///
    /// A transport that hangs up before completing counts as a transport failure.
    pub async fn run(mut self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            if self.resume(event).is_terminal() {
                return;
            }
        }

        self.resume(TransportEvent::Failed(
            "Transport closed before completion".to_string(),
        ));
    }

    fn accept_headers(&mut self, head: ResponseHead) -> Result<PipelineState, FetchError> {
        if head.status != 200 {
            tracing::debug!("Site returned error {} {}", head.status, head.status_text);
            return Err(FetchError::HttpStatus {
                url: self.url.to_string(),
                status: head.status,
            });
        }

        let content_type = head.content_type.unwrap_or_default();
        if !self.is_allowed_type(&content_type) {
            return Err(FetchError::UnsupportedContentType {
                url: self.url.to_string(),
                content_type,
            });
        }

        self.content_type = Some(content_type);
        tracing::debug!("Waiting for body from {}", self.url);
        Ok(PipelineState::BodyWait)
    }

    fn is_allowed_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    fn finish(&mut self, body: String) -> Result<PipelineState, FetchError> {
        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: self.url.to_string(),
            });
        }

        let Some(request) = self.request.as_ref() else {
            return Ok(PipelineState::Done);
        };

        let text = strip_noscript(&body);
        tracing::debug!(
            "Got doc type {} from {} ({} bytes)",
            self.content_type.as_deref().unwrap_or_default(),
            self.url,
            text.len()
        );

        let result = request.extractor.extract(
            &request.document,
            &request.target_url,
            request.flags,
            &text,
        );
        self.complete(result);
        Ok(PipelineState::Done)
    }

    fn complete(&mut self, result: Option<ExtractionResult>) {
        self.state = PipelineState::Done;
        if let Some(request) = self.request.take() {
            tracing::debug!("Lookup of {} finished: {:?}", self.url, result);
            (request.on_complete)(result);
        }
    }
}
