//! URL handling module for Indirect-Image
//!
//! This module provides the protocol gate consulted before any lookup starts and
//! the domain pattern matching used to pick site rules.

mod matcher;

use crate::config::ProtocolConfig;
use url::Url;

pub use matcher::{matches_wildcard, url_matches};

/// Decides whether a URL's protocol may be fetched
///
/// `strict` restricts the check to the schemes that are safe to fetch from
/// a background lookup; a relaxed check may admit more.
pub trait ProtocolGate: Send + Sync {
    fn allow_protocol_of_url(&self, url: &str, strict: bool) -> bool;
}

impl<F> ProtocolGate for F
where
    F: Fn(&str, bool) -> bool + Send + Sync,
{
    fn allow_protocol_of_url(&self, url: &str, strict: bool) -> bool {
        self(url, strict)
    }
}

/// Scheme allow-list policy
///
/// A strict check accepts only the strict schemes. A relaxed check accepts
/// the strict schemes plus the relaxed ones. URLs that fail to parse are
/// never allowed.
#[derive(Debug, Clone)]
pub struct SchemePolicy {
    strict: Vec<String>,
    relaxed: Vec<String>,
}

impl SchemePolicy {
    pub fn new(strict: Vec<String>, relaxed: Vec<String>) -> Self {
        Self {
            strict: strict.into_iter().map(|s| s.to_ascii_lowercase()).collect(),
            relaxed: relaxed.into_iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self::new(config.strict.clone(), config.relaxed.clone())
    }
}

impl Default for SchemePolicy {
    fn default() -> Self {
        Self::from_config(&ProtocolConfig::default())
    }
}

impl ProtocolGate for SchemePolicy {
    fn allow_protocol_of_url(&self, url: &str, strict: bool) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Rejecting unparseable URL {}: {}", url, e);
                return false;
            }
        };

        // Url::scheme() is always lowercase
        let scheme = parsed.scheme();
        let allowed = self.strict.iter().any(|s| s == scheme)
            || (!strict && self.relaxed.iter().any(|s| s == scheme));

        if !allowed {
            tracing::debug!(
                "Protocol '{}' not allowed for {} (strict={})",
                scheme,
                url,
                strict
            );
        }
        allowed
    }
}
