use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
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
/// use orgcrawl::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to detect if the configuration has changed between crawl runs.
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
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// The file is read once, so the hash always matches the parsed content.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG: &str = r#"
download-extensions = [".pdf", ".docx"]

[crawler]
max-depth = 3
max-pages = 200

[rate-limiting]
delay-between-requests = 1500
delay-on-error = 5000
timeout = 30

[session]
checkpoint-dir = "./checkpoints"
checkpoint-interval = 25

[user-agent]
crawler-name = "OrgCrawl"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
data-dir = "./data"

[filters]
exclusions = ["/login", "/cart"]

[filters.priority]
high = ["annual-report"]
medium = ["/news"]

[[organization]]
name = "Second"
seeds = ["https://second.example.org/"]
scrape-priority = 2

[[organization]]
name = "First"
seeds = ["https://first.example.org/", "https://first.example.org/about"]
max-pages = 20
scrape-priority = 1
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_pages, 200);
        assert!(!config.crawler.follow_external_links);
        assert!(config.crawler.respect_robots_txt);
        assert_eq!(config.rate_limiting.max_retries, 3);
        assert_eq!(config.session.checkpoint_interval, 25);
        assert!(config.session.save_progress);
        assert!(config.output.save_html);
        assert_eq!(config.user_agent.crawler_name, "OrgCrawl");
        assert_eq!(config.filters.exclusions.len(), 2);
        assert_eq!(config.filters.priority.high, vec!["annual-report"]);
        assert!(config.filters.priority.low.is_empty());
        assert_eq!(config.download_extensions, vec![".pdf", ".docx"]);
        assert!(config
            .document_types
            .iter()
            .any(|t| t == "application/pdf"));
        assert_eq!(config.organizations.len(), 2);
        assert_eq!(config.organizations[1].max_pages, Some(20));
        assert!(!config.logging.file_output);
        assert_eq!(config.logging.log_dir, "data/logs");
    }

    #[test]
    fn test_logging_section() {
        let content = format!(
            "{}\n[logging]\nfile-output = true\nlog-dir = \"./logs\"\n",
            VALID_CONFIG
        );
        let config = parse_config(&content).unwrap();
        assert!(config.logging.file_output);
        assert_eq!(config.logging.log_dir, "./logs");
    }

    #[test]
    fn test_organizations_in_priority_order() {
        let config = parse_config(VALID_CONFIG).unwrap();
        let names: Vec<&str> = config
            .organizations_in_order()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_user_agent_header() {
        let config = parse_config(VALID_CONFIG).unwrap();
        assert_eq!(
            config.user_agent.header_value(),
            "OrgCrawl/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_organizations_rejected() {
        let content = VALID_CONFIG
            .split("[[organization]]")
            .next()
            .unwrap()
            .to_string();
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_load_with_hash_matches_file_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (_, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
