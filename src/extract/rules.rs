//! Selector rules: config-driven extractors
//!
//! A rule pairs a domain pattern with an ordered selector list. A [`RuleSet`]
//! picks the first rule whose pattern matches the linked page's host, falling
//! back to generic page metadata selectors.

use crate::config::RuleEntry;
use crate::extract::document::{parse_document, ParsedDocument};
use crate::extract::selector::{find_all, find_attr};
use crate::extract::{ContextDocument, ExtractionResult, Extractor, LookupFlags};
use crate::url::url_matches;
use url::Url;

/// Attributes a rule reads, in order of preference
///
/// `content` covers `<meta property="og:image" content="...">`.
pub const RULE_ATTRIBUTES: &[&str] = &["src", "href", "content"];

/// Selectors used when no site rule applies
pub const DEFAULT_SELECTORS: &[&str] = &[
    "meta[property='og:image']",
    "meta[name='twitter:image']",
    "meta[name='twitter:image:src']",
    "link[rel='image_src']",
];

/// An ordered selector list, optionally restricted to a domain pattern
#[derive(Debug, Clone)]
pub struct SelectorRule {
    domain: Option<String>,
    selectors: Vec<String>,
}

impl SelectorRule {
    /// A rule that applies to any page
    pub fn new<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            domain: None,
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    /// A rule that applies to pages whose host matches `domain`
    pub fn for_domain<S: Into<String>>(
        domain: impl Into<String>,
        selectors: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            domain: Some(domain.into()),
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn applies_to(&self, page_url: &Url) -> bool {
        match &self.domain {
            Some(pattern) => url_matches(pattern, page_url),
            None => true,
        }
    }

    fn extract_from(&self, parsed: &ParsedDocument, flags: LookupFlags) -> Option<ExtractionResult> {
        let absolute = |raw: String| -> String {
            parsed.resolve(&raw).map(String::from).unwrap_or(raw)
        };

        if flags.contains(LookupFlags::ALL_CANDIDATES) {
            let mut urls: Vec<String> = Vec::new();
            for url in find_all(parsed.root(), &self.selectors, RULE_ATTRIBUTES) {
                let url = absolute(url);
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
            return (!urls.is_empty()).then_some(ExtractionResult::Multiple(urls));
        }

        find_attr(parsed.root(), &self.selectors, RULE_ATTRIBUTES)
            .map(|raw| ExtractionResult::Single(absolute(raw)))
    }
}

impl From<&RuleEntry> for SelectorRule {
    fn from(entry: &RuleEntry) -> Self {
        Self::for_domain(entry.domain.clone(), entry.selectors.iter().cloned())
    }
}

impl Extractor for SelectorRule {
    fn extract(
        &self,
        document: &ContextDocument,
        page_url: &Url,
        flags: LookupFlags,
        html: &str,
    ) -> Option<ExtractionResult> {
        let parsed = parse_document(document, page_url, html);
        self.extract_from(&parsed, flags)
    }
}

/// Site rules with a metadata fallback
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SelectorRule>,
    fallback: SelectorRule,
}

impl RuleSet {
    pub fn new(rules: Vec<SelectorRule>) -> Self {
        Self {
            rules,
            fallback: SelectorRule::new(DEFAULT_SELECTORS.iter().copied()),
        }
    }

    pub fn from_config(entries: &[RuleEntry]) -> Self {
        Self::new(entries.iter().map(SelectorRule::from).collect())
    }

    /// Returns the rule used for `page_url`
    pub fn rule_for(&self, page_url: &Url) -> &SelectorRule {
        self.rules
            .iter()
            .find(|rule| rule.applies_to(page_url))
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Extractor for RuleSet {
    fn extract(
        &self,
        document: &ContextDocument,
        page_url: &Url,
        flags: LookupFlags,
        html: &str,
    ) -> Option<ExtractionResult> {
        let rule = self.rule_for(page_url);
        tracing::debug!(
            "Extracting from {} with {} selectors",
            page_url,
            rule.selectors().len()
        );
        rule.extract(document, page_url, flags, html)
    }
}
