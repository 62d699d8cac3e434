//! HTML document parsing for linked pages
//!
//! Parsing is delegated to html5ever through `scraper`. The parser never
//! executes script, so `<noscript>` wrappers are removed first: their content is
//! what a page shows without script, and it must be reachable by selectors.

use crate::extract::ContextDocument;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

static NOSCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?noscript[^>]*>").expect("noscript pattern is valid"));

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("base selector is valid"));

/// Removes `<noscript>` and `</noscript>` tags, keeping whatever they wrap
///
/// # Example
///
/// ```
/// use indirect_image::extract::strip_noscript;
///
/// let html = r#"<div><NOSCRIPT class="x"><img src="y"></noscript></div>"#;
/// assert_eq!(strip_noscript(html), r#"<div><img src="y"></div>"#);
/// ```
pub fn strip_noscript(html: &str) -> Cow<'_, str> {
    NOSCRIPT_TAG.replace_all(html, "")
}

/// A linked page parsed into a tree
///
/// Only lives for the duration of one extraction.
pub struct ParsedDocument {
    tree: Html,
    base_url: Url,
}

impl ParsedDocument {
    /// The `<html>` element; selectors run from here also see `<head>`
    pub fn root(&self) -> ElementRef<'_> {
        self.tree.root_element()
    }

    /// The `<body>` element, or the root element for documents without one
    pub fn body(&self) -> ElementRef<'_> {
        self.tree
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| self.tree.root_element())
    }

    /// The URL relative references are resolved against
    ///
    /// This is the document's `<base href>` when present, else the page URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an attribute value to an absolute URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base_url.join(href.trim()).ok()
    }
}

/// Parses the HTML of a linked page
///
/// Never fails: malformed markup still yields a best-effort tree. Parse errors
/// are logged against the URI of the context document the link was found on.
///
/// # Arguments
///
/// * `context` - The document containing the link
/// * `base_url` - The URL the HTML was fetched from
/// * `html` - The raw page text
pub fn parse_document(context: &ContextDocument, base_url: &Url, html: &str) -> ParsedDocument {
    tracing::debug!("Building document for {}", base_url);

    let sanitized = strip_noscript(html);
    let tree = Html::parse_document(&sanitized);

    if !tree.errors.is_empty() {
        tracing::trace!(
            "{} parse errors in {} (linked from {}): {:?}",
            tree.errors.len(),
            base_url,
            context.uri(),
            tree.errors
        );
    }

    let base_url = tree
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .unwrap_or_else(|| base_url.clone());

    ParsedDocument { tree, base_url }
}
