use serde::Deserialize;
use std::path::PathBuf;

/// Main run settings for Sale-Pager
///
/// Every section is optional; an empty file yields [`Settings::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: OutputSettings,
    pub retailers: RetailerSettings,
    pub provider: ProviderSettings,
    pub predicate: PredicateSettings,
    pub run: RunSettings,
}

/// Where artifacts and run logs are written
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving one file per fetched page
    pub dir: PathBuf,

    /// Directory receiving the per-run log file
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Location and enumeration order of retailer files
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetailerSettings {
    /// Directory holding one `<id>.toml` per retailer
    pub dir: PathBuf,

    /// Explicit enumeration order for `all` runs (empty = sorted file names)
    pub order: Vec<String>,
}

impl Default for RetailerSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("retailers"),
            order: Vec::new(),
        }
    }
}

/// Scrape provider connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the scrape provider API
    pub endpoint: String,

    /// Bearer token sent with every scrape request
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.firecrawl.dev".to_string(),
            api_key: None,
            timeout_secs: 90,
        }
    }
}

/// What a failing stop predicate means for pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateErrorPolicy {
    /// Treat the failure as a stop signal
    #[default]
    Stop,
    /// Ignore the failure and keep paginating
    Continue,
}

/// Stop predicate settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredicateSettings {
    /// External program (plus leading arguments); `None` uses the built-in evaluator
    pub command: Option<Vec<String>>,

    /// Prior-run reference file handed to the predicate
    #[serde(rename = "latest-path")]
    pub latest_path: Option<PathBuf>,

    /// Regex used by the built-in `seen_before` mode to find product URLs
    #[serde(rename = "product-url-pattern")]
    pub product_url_pattern: String,

    #[serde(rename = "on-error")]
    pub on_error: PredicateErrorPolicy,
}

impl Default for PredicateSettings {
    fn default() -> Self {
        Self {
            command: None,
            latest_path: None,
            product_url_pattern: r"https?://[^\s)\]]+".to_string(),
            on_error: PredicateErrorPolicy::Stop,
        }
    }
}

/// Run scheduling settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// How many retailers an `all` run scrapes at once
    #[serde(rename = "max-concurrent-retailers")]
    pub max_concurrent_retailers: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_concurrent_retailers: 1,
        }
    }
}
