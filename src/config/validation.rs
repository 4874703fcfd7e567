use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on concurrently fetched pages
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources, config.crawler.strict_rules)?;
    Ok(())
}

/// Re-validates the sections command-line overrides can change
///
/// Rule problems were already reported when the file was loaded, so they are
/// only checked again when strict rules are now on, and never logged twice.
pub fn validate_overrides(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    if config.crawler.strict_rules {
        for source in &config.sources {
            if let Some(rule) = source.detection_rule() {
                reject_rule_problems(source, &rule.problems())?;
            }
        }
    }
    Ok(())
}

fn reject_rule_problems(source: &SourceEntry, problems: &[String]) -> Result<(), ConfigError> {
    if problems.is_empty() {
        return Ok(());
    }
    Err(ConfigError::Validation(format!(
        "Source '{}' has malformed detection rules: {}",
        source.name,
        problems.join("; ")
    )))
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_pages and max_depth may be zero: a zero quota crawls nothing

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates source entries and their detection rules
fn validate_sources(sources: &[SourceEntry], strict_rules: bool) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[source]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }

        validate_root_url(&source.root_url)?;

        let Some(rule) = source.detection_rule() else {
            return Err(ConfigError::Validation(format!(
                "Source '{}' needs product-detection or rules-file",
                source.name
            )));
        };

        let problems = rule.problems();
        if problems.is_empty() {
            continue;
        }

        if strict_rules {
            reject_rule_problems(source, &problems)?;
        }

        for problem in &problems {
            tracing::warn!(
                "Source '{}': {} (clause will never match)",
                source.name,
                problem
            );
        }
    }

    Ok(())
}

/// A root URL must be absolute and use HTTP(S)
fn validate_root_url(root_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' must use HTTP or HTTPS",
            root_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' has no host",
            root_url
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
