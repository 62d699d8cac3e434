//! Selector-driven URL extraction
//!
//! Selectors are tried in the order given, not in document order: the first
//! selector whose first match carries a URL wins and later selectors are never
//! evaluated. A selector the engine rejects is logged and skipped.

use crate::{ExtractError, ExtractResult};
use scraper::{ElementRef, Selector};

/// Attributes read by [`find`], in order of preference
pub const URL_ATTRIBUTES: &[&str] = &["src", "href"];

/// Compiles a selector, mapping engine errors into [`ExtractError`]
pub fn compile(selector: &str) -> ExtractResult<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Returns the `src` (else `href`) of the first element matched by the first
/// selector that yields one
///
/// A matching element with neither attribute counts as no match.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use indirect_image::extract::find;
///
/// let doc = Html::parse_document(r#"<body><a class="full" href="/big.jpg">x</a></body>"#);
/// let url = find(doc.root_element(), &["img.main", "a.full"]);
/// assert_eq!(url.as_deref(), Some("/big.jpg"));
/// ```
pub fn find<S: AsRef<str>>(scope: ElementRef<'_>, selectors: &[S]) -> Option<String> {
    find_attr(scope, selectors, URL_ATTRIBUTES)
}

/// Like [`find`], reading `attrs` in order of preference
pub fn find_attr<S: AsRef<str>>(
    scope: ElementRef<'_>,
    selectors: &[S],
    attrs: &[&str],
) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| candidate(scope, selector.as_ref(), attrs))
}

/// Collects one candidate per selector, in selector order, without duplicates
pub fn find_all<S: AsRef<str>>(
    scope: ElementRef<'_>,
    selectors: &[S],
    attrs: &[&str],
) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for selector in selectors {
        if let Some(url) = candidate(scope, selector.as_ref(), attrs) {
            if !found.contains(&url) {
                found.push(url);
            }
        }
    }
    found
}

fn candidate(scope: ElementRef<'_>, selector: &str, attrs: &[&str]) -> Option<String> {
    tracing::debug!("Seeking with selector '{}'", selector);

    let compiled = match compile(selector) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("{}", e);
            return None;
        }
    };

    let node = scope.select(&compiled).next()?;
    let url = url_attribute(node, attrs);
    match &url {
        Some(url) => tracing::debug!("Found node {} url {}", node.value().name(), url),
        None => tracing::debug!(
            "Node {} matched '{}' but has none of {:?}",
            node.value().name(),
            selector,
            attrs
        ),
    }
    url
}

/// Reads the first non-empty attribute out of `attrs`, value as written
fn url_attribute(node: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        node.value()
            .attr(attr)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}
