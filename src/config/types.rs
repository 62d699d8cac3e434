use serde::Deserialize;

/// Main configuration structure for Indirect-Image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub protocols: ProtocolConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User agent sent with every lookup request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

/// URL scheme policy
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// Schemes accepted by a strict protocol check
    #[serde(default = "default_strict_schemes")]
    pub strict: Vec<String>,

    /// Additional schemes accepted when the check is not strict
    #[serde(default = "default_relaxed_schemes")]
    pub relaxed: Vec<String>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            strict: default_strict_schemes(),
            relaxed: default_relaxed_schemes(),
        }
    }
}

/// Response content handling
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Content types a linked document may be served as.
    ///
    /// JSON is included because some lookups target JSON APIs rather than pages.
    #[serde(rename = "allowed-types", default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            allowed_types: default_allowed_types(),
        }
    }
}

/// Site rule: which selectors locate the image on pages of a domain
#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,

    /// Selectors tried in order; the first one with a URL wins
    pub selectors: Vec<String>,
}

fn default_user_agent() -> String {
    format!("indirect-image/{}", env!("CARGO_PKG_VERSION"))
}

fn default_strict_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_relaxed_schemes() -> Vec<String> {
    vec!["file".to_string()]
}

fn default_allowed_types() -> Vec<String> {
    vec!["text/html".to_string(), "application/json".to_string()]
}
