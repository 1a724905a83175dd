use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, LoggingConfig, OrganizationConfig, OutputConfig,
    RateLimitConfig, SessionConfig, UserAgentConfig,
};
use crate::checkpoint::sanitize_name;
use crate::ConfigError;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rate_limit_config(&config.rate_limiting)?;
    validate_session_config(&config.session)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_logging_config(&config.logging)?;
    validate_filters(&config.filters)?;
    validate_download_extensions(&config.download_extensions)?;
    validate_organizations(&config.organizations)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates request pacing
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be >= 1 second".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates checkpoint settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.checkpoint_dir.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
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

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if config.file_output && config.log_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "log-dir cannot be empty when file-output is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Rejects blank filter patterns, which would match every URL
fn validate_filters(filters: &FilterConfig) -> Result<(), ConfigError> {
    let groups = [
        ("exclusions", &filters.exclusions),
        ("priority.high", &filters.priority.high),
        ("priority.medium", &filters.priority.medium),
        ("priority.low", &filters.priority.low),
    ];

    for (name, patterns) in groups {
        if patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidPattern(format!(
                "{} contains an empty pattern",
                name
            )));
        }
    }

    Ok(())
}

fn validate_download_extensions(extensions: &[String]) -> Result<(), ConfigError> {
    for ext in extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "download extension '{}' must look like '.pdf'",
                ext
            )));
        }
    }
    Ok(())
}

/// Validates organization entries
fn validate_organizations(orgs: &[OrganizationConfig]) -> Result<(), ConfigError> {
    if orgs.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[organization]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    // Sanitized names key checkpoint files and output directories
    let mut file_names: HashMap<String, &str> = HashMap::new();
    for org in orgs {
        if org.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "organization name cannot be empty".to_string(),
            ));
        }

        if !names.insert(org.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate organization name '{}'",
                org.name
            )));
        }

        let file_name = sanitize_name(&org.name);
        if let Some(other) = file_names.insert(file_name.to_lowercase(), &org.name) {
            return Err(ConfigError::Validation(format!(
                "organization names '{}' and '{}' map to the same file name '{}'",
                other, org.name, file_name
            )));
        }

        if org.seeds.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Organization '{}' must have at least one seed URL",
                org.name
            )));
        }

        if org.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "Organization '{}' max-pages must be >= 1",
                org.name
            )));
        }

        for seed in &org.seeds {
            let url = Url::parse(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "https" && url.scheme() != "http" {
                return Err(ConfigError::Validation(format!(
                    "Seed URL '{}' must use http or https",
                    seed
                )));
            }

            if url.host_str().is_none() {
                return Err(ConfigError::InvalidUrl(format!(
                    "Seed URL '{}' has no host",
                    seed
                )));
            }
        }
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

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
