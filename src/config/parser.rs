use crate::config::types::Config;
use crate::config::validation::validate;
use crate::rules::Rule;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Sources that point at a `rules-file` get their rule tree loaded from that
/// JSON file, resolved relative to the directory of the configuration file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use product_scout::config::load_config;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_rule_files(&mut config, base_dir)?;

    validate(&config)?;

    Ok(config)
}

/// Replaces `rules-file` references with the rule trees they contain
fn resolve_rule_files(config: &mut Config, base_dir: &Path) -> Result<(), ConfigError> {
    for source in &mut config.sources {
        let Some(rules_file) = source.rules_file.as_deref() else {
            continue;
        };

        if source.product_detection.is_some() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' sets both product-detection and rules-file",
                source.name
            )));
        }

        let rules_path = base_dir.join(rules_file);
        tracing::debug!(
            "Loading rules for source '{}' from {}",
            source.name,
            rules_path.display()
        );

        let content = std::fs::read_to_string(&rules_path)?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|err| ConfigError::RulesFile {
                path: rules_path.display().to_string(),
                source: err,
            })?;

        source.product_detection = Some(Rule::from_value(&value));
    }

    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so result files can be traced back to the configuration
/// that produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
