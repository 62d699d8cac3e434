use crate::config::types::{ClientConfig, Config, ContentConfig, ProtocolConfig, RuleEntry};
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_protocol_config(&config.protocols)?;
    validate_content_config(&config.content)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the scheme lists used by the protocol check
fn validate_protocol_config(config: &ProtocolConfig) -> Result<(), ConfigError> {
    if config.strict.is_empty() {
        return Err(ConfigError::Validation(
            "protocols.strict must list at least one scheme".to_string(),
        ));
    }

    for scheme in config.strict.iter().chain(config.relaxed.iter()) {
        validate_scheme(scheme)?;
    }

    Ok(())
}

/// Validates a URL scheme name (RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ))
fn validate_scheme(scheme: &str) -> Result<(), ConfigError> {
    let mut chars = scheme.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid URL scheme '{}'",
            scheme
        )));
    }

    Ok(())
}

/// Validates the accepted content types
fn validate_content_config(config: &ContentConfig) -> Result<(), ConfigError> {
    if config.allowed_types.is_empty() {
        return Err(ConfigError::Validation(
            "content.allowed-types must list at least one content type".to_string(),
        ));
    }

    for content_type in &config.allowed_types {
        let valid = content_type
            .split_once('/')
            .is_some_and(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty());
        if !valid {
            return Err(ConfigError::Validation(format!(
                "Invalid content type '{}', expected 'type/subtype'",
                content_type
            )));
        }
    }

    Ok(())
}

/// Validates site rule entries
fn validate_rules(rules: &[RuleEntry]) -> Result<(), ConfigError> {
    for rule in rules {
        validate_domain_pattern(&rule.domain)?;

        if rule.selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Rule for '{}' must have at least one selector",
                rule.domain
            )));
        }

        for selector in &rule.selectors {
            if selector.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Rule for '{}' contains an empty selector",
                    rule.domain
                )));
            }

            Selector::parse(selector).map_err(|e| {
                ConfigError::Validation(format!(
                    "Rule for '{}' has invalid selector '{}': {:?}",
                    rule.domain, selector, e
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
