use url::Url;

/// Checks if a host matches a domain pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: "example.com" matches only "example.com"
/// 2. Wildcard: "*.example.com" matches the bare domain and any subdomain
///
/// Both sides are compared case-insensitively.
///
/// # Examples
///
/// ```
/// use indirect_image::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "EXAMPLE.com"));
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "img.cdn.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Returns true if the pattern matches the host of `url`
///
/// URLs without a host (e.g. `data:` or `file:///`) never match.
pub fn url_matches(pattern: &str, url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| matches_wildcard(pattern, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("example.com", "example.com"));
        assert!(!matches_wildcard("example.com", "blog.example.com"));
        assert!(!matches_wildcard("blog.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_nested() {
        assert!(matches_wildcard("*.imgur.com", "imgur.com"));
        assert!(matches_wildcard("*.imgur.com", "i.imgur.com"));
        assert!(matches_wildcard("*.imgur.com", "a.b.imgur.com"));
    }

    #[test]
    fn test_wildcard_no_partial_match() {
        assert!(!matches_wildcard("*.example.com", "notexample.com"));
        assert!(!matches_wildcard("*.example.com", "example.com.org"));
        assert!(!matches_wildcard("*.example.com", ""));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_wildcard("Example.COM", "example.com"));
        assert!(matches_wildcard("*.example.com", "CDN.Example.Com"));
    }

    #[test]
    fn test_url_matches() {
        let url = Url::parse("http://photos.example.com:8080/p/1").unwrap();
        assert!(url_matches("*.example.com", &url));
        assert!(!url_matches("example.com", &url));

        let data = Url::parse("data:text/html,hello").unwrap();
        assert!(!url_matches("*.example.com", &data));
    }
}
