use crate::config::types::{
    OutputSettings, PredicateSettings, ProviderSettings, RetailerSettings, RunSettings, Settings,
};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use url::Url;

/// Upper bound on retailers scraped at once
const MAX_CONCURRENT_RETAILERS: usize = 32;

/// Validates the entire settings tree
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    validate_output_settings(&settings.output)?;
    validate_retailer_settings(&settings.retailers)?;
    validate_provider_settings(&settings.provider)?;
    validate_predicate_settings(&settings.predicate)?;
    validate_run_settings(&settings.run)?;
    Ok(())
}

fn validate_output_settings(output: &OutputSettings) -> ConfigResult<()> {
    if output.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output.dir cannot be empty".to_string(),
        ));
    }

    if output.log_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output.log-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_retailer_settings(retailers: &RetailerSettings) -> ConfigResult<()> {
    if retailers.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "retailers.dir cannot be empty".to_string(),
        ));
    }

    for id in &retailers.order {
        validate_retailer_id(id)?;
    }

    Ok(())
}

/// Retailer ids double as file stems, so they must not walk out of the directory
pub(crate) fn validate_retailer_id(id: &str) -> ConfigResult<()> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "retailer id cannot be empty".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "retailer id must contain only alphanumeric characters, '-' and '_', got '{}'",
            id
        )));
    }

    Ok(())
}

fn validate_provider_settings(provider: &ProviderSettings) -> ConfigResult<()> {
    let endpoint = Url::parse(&provider.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid provider endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Provider endpoint '{}' must use http or https",
            provider.endpoint
        )));
    }

    if provider.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "provider.timeout-secs must be >= 1, got {}",
            provider.timeout_secs
        )));
    }

    Ok(())
}

fn validate_predicate_settings(predicate: &PredicateSettings) -> ConfigResult<()> {
    if let Some(command) = &predicate.command {
        if command.first().map_or(true, |program| program.is_empty()) {
            return Err(ConfigError::Validation(
                "predicate.command must name a program".to_string(),
            ));
        }
    }

    Regex::new(&predicate.product_url_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("Invalid predicate.product-url-pattern: {}", e))
    })?;

    Ok(())
}

fn validate_run_settings(run: &RunSettings) -> ConfigResult<()> {
    if run.max_concurrent_retailers < 1 || run.max_concurrent_retailers > MAX_CONCURRENT_RETAILERS
    {
        return Err(ConfigError::Validation(format!(
            "run.max-concurrent-retailers must be between 1 and {}, got {}",
            MAX_CONCURRENT_RETAILERS, run.max_concurrent_retailers
        )));
    }

    Ok(())
}
