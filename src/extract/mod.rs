//! Extraction of image URLs from linked documents
//!
//! This module contains:
//! - HTML parsing and `<noscript>` unwrapping
//! - Ordered, first-match-wins selector lookup
//! - The [`Extractor`] seam the fetch pipeline hands fetched text to
//! - Config-driven selector rules

mod document;
mod rules;
mod selector;

pub use document::{parse_document, strip_noscript, ParsedDocument};
pub use rules::{RuleSet, SelectorRule, DEFAULT_SELECTORS, RULE_ATTRIBUTES};
pub use selector::{compile, find, find_all, find_attr, URL_ATTRIBUTES};

use std::ops::BitOr;
use url::Url;

/// The document a link was discovered on
///
/// Its URI is the parse context for the linked page (diagnostics, and the
/// page the extractor was invoked from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDocument {
    uri: Url,
}

impl ContextDocument {
    pub fn new(uri: Url) -> Self {
        Self { uri }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }
}

/// What an extractor found: one URL or an ordered list of candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Single(String),
    Multiple(Vec<String>),
}

impl ExtractionResult {
    /// All URLs, best candidate first
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Self::Single(url) => vec![url.as_str()],
            Self::Multiple(urls) => urls.iter().map(String::as_str).collect(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(url) => Some(url),
            Self::Multiple(urls) => urls.first().map(String::as_str),
        }
    }
}

impl From<String> for ExtractionResult {
    fn from(url: String) -> Self {
        Self::Single(url)
    }
}

impl From<Vec<String>> for ExtractionResult {
    fn from(urls: Vec<String>) -> Self {
        Self::Multiple(urls)
    }
}

/// Caller-defined request flags, passed through to the extractor untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LookupFlags(u32);

impl LookupFlags {
    pub const NONE: Self = Self(0);

    /// Ask selector rules for every candidate instead of the first one
    pub const ALL_CANDIDATES: Self = Self(1);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LookupFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Maps a fetched document to the image it points at
///
/// Supplied by the caller per lookup. Implementations should be free of side
/// effects; the pipeline calls it at most once per request.
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        document: &ContextDocument,
        page_url: &Url,
        flags: LookupFlags,
        html: &str,
    ) -> Option<ExtractionResult>;
}

impl<F> Extractor for F
where
    F: Fn(&ContextDocument, &Url, LookupFlags, &str) -> Option<ExtractionResult> + Send + Sync,
{
    fn extract(
        &self,
        document: &ContextDocument,
        page_url: &Url,
        flags: LookupFlags,
        html: &str,
    ) -> Option<ExtractionResult> {
        self(document, page_url, flags, html)
    }
}
