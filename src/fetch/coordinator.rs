//! Lookup coordinator - public entry point
//!
//! [`PipelineCoordinator::start`] gates the target URL's protocol, spawns a
//! [`FetchPipeline`] on the current tokio runtime and returns immediately. The
//! outcome arrives later through the completion callback.

use crate::config::{Config, ContentConfig};
use crate::extract::{ContextDocument, ExtractionResult, Extractor, LookupFlags};
use crate::fetch::pipeline::{CompletionFn, FetchPipeline, FetchRequest};
use crate::fetch::transport::{ReqwestTransport, Transport};
use crate::state::EpochToken;
use crate::url::{ProtocolGate, SchemePolicy};
use crate::FetchError;
use std::sync::Arc;
use tokio::runtime::Handle;
use url::Url;

/// Marker returned when a lookup was accepted and will report back later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Deferred;

/// Starts lookups and hands them to the runtime
pub struct PipelineCoordinator<T, G> {
    transport: T,
    gate: G,
    allowed_types: Arc<[String]>,
}

impl<T: Transport, G: ProtocolGate> PipelineCoordinator<T, G> {
    /// Creates a coordinator accepting `text/html` and `application/json` responses
    pub fn new(transport: T, gate: G) -> Self {
        Self {
            transport,
            gate,
            allowed_types: Arc::from(ContentConfig::default().allowed_types),
        }
    }

    /// Replaces the media types a linked document may be served as
    pub fn with_allowed_types(mut self, allowed_types: Vec<String>) -> Self {
        self.allowed_types = Arc::from(allowed_types);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Starts a lookup of the image behind `target_url`
    ///
    /// Returns `None` when the protocol gate rejects `target_url`; nothing is
    /// fetched and `on_complete` is dropped uncalled. Otherwise returns
    /// `Some(Deferred)` and `on_complete` receives the result later, at most
    /// once. It is not called at all when the lookup goes stale or cannot be
    /// set up (the latter is logged).
    ///
    /// # Arguments
    ///
    /// * `document` - The document the link was found on
    /// * `target_url` - The linked page to fetch
    /// * `flags` - Passed through to the extractor
    /// * `epoch_token` - Captured epoch; the lookup vanishes once it is superseded
    /// * `on_complete` - Receives the extraction result or `None`
    /// * `extractor` - Picks the image out of the fetched page
    pub fn start<F>(
        &self,
        document: ContextDocument,
        target_url: &str,
        flags: LookupFlags,
        epoch_token: EpochToken,
        on_complete: F,
        extractor: Arc<dyn Extractor>,
    ) -> Option<Deferred>
    where
        F: FnOnce(Option<ExtractionResult>) + Send + 'static,
    {
        tracing::debug!("Image lookup from linked page {}", target_url);

        if !self.gate.allow_protocol_of_url(target_url, true) {
            tracing::debug!(
                "{}",
                FetchError::ProtocolDisallowed {
                    url: target_url.to_string(),
                }
            );
            return None;
        }

        if let Err(e) = self.launch(
            document,
            target_url,
            flags,
            epoch_token,
            Box::new(on_complete),
            extractor,
        ) {
            tracing::error!("{}", e);
        }

        Some(Deferred)
    }

    fn launch(
        &self,
        document: ContextDocument,
        target_url: &str,
        flags: LookupFlags,
        epoch_token: EpochToken,
        on_complete: CompletionFn,
        extractor: Arc<dyn Extractor>,
    ) -> Result<(), FetchError> {
        let setup_error = |message: String| FetchError::Setup {
            url: target_url.to_string(),
            message,
        };

        let runtime = Handle::try_current().map_err(|e| setup_error(e.to_string()))?;
        let target_url = Url::parse(target_url).map_err(|e| setup_error(e.to_string()))?;

        let mut pipeline = FetchPipeline::new(
            FetchRequest {
                document,
                target_url,
                flags,
                epoch_token,
                extractor,
                on_complete,
            },
            self.allowed_types.clone(),
        );

        let events = self.transport.open(pipeline.begin())?;
        runtime.spawn(pipeline.run(events));
        Ok(())
    }
}

impl PipelineCoordinator<ReqwestTransport, SchemePolicy> {
    /// Builds a coordinator with the reqwest transport and the configured policies
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::from_config(&config.client)?;
        Ok(Self::new(transport, SchemePolicy::from_config(&config.protocols))
            .with_allowed_types(config.content.allowed_types.clone()))
    }
}
