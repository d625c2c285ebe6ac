//! Per-retailer scraping configuration
//!
//! Retailer files are decoded leniently: a key that is missing or holds a
//! value of the wrong shape falls back to its default instead of failing the
//! load. Only a missing file or unparseable TOML is an error.

use crate::config::parser::hash_bytes;
use crate::config::validation::validate_retailer_id;
use crate::crawler::StopMode;
use crate::url::category_name;
use crate::{ConfigError, PagerError};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Default provider render wait
pub const DEFAULT_WAIT_FOR_MS: u64 = 5000;

/// Default query parameter carrying the page number
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Default page budget per category
pub const DEFAULT_MAX_PAGES: u32 = 3;

/// Default threshold handed to the stop predicate
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// File extension of retailer configuration files
const RETAILER_EXTENSION: &str = "toml";

/// Decodes a field, mapping a value of the wrong shape to `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(value.try_into().ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawRetailer {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    scrape_options: Option<RawScrapeOptions>,
    #[serde(default, deserialize_with = "lenient")]
    pagination: Option<RawPagination>,
    #[serde(default, deserialize_with = "lenient")]
    sale_urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    url_labels: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pagination_overrides: Option<BTreeMap<String, toml::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawScrapeOptions {
    #[serde(default, deserialize_with = "lenient")]
    wait_for_ms: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    only_main_content: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPagination {
    #[serde(default, deserialize_with = "lenient")]
    param: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    max_pages: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawOverride {
    #[serde(default, deserialize_with = "lenient")]
    max_pages: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    stop_when: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    threshold: Option<f64>,
}

/// Options forwarded to the scrape provider for every page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrapeOptions {
    /// How long the provider waits for the page to render
    pub wait_for_ms: u64,
    /// Whether the provider strips navigation and other boilerplate
    pub only_main_content: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            wait_for_ms: DEFAULT_WAIT_FOR_MS,
            only_main_content: true,
        }
    }
}

/// Global pagination settings of one retailer
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationSettings {
    pub param: String,
    pub max_pages: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            param: DEFAULT_PAGE_PARAM.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Per-category pagination override
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationOverride {
    /// Replaces the global page budget when positive
    pub max_pages: Option<i64>,
    /// Stop predicate mode checked after every kept page
    pub stop_when: Option<StopMode>,
    pub threshold: f64,
}

impl Default for PaginationOverride {
    fn default() -> Self {
        Self {
            max_pages: None,
            stop_when: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl From<RawOverride> for PaginationOverride {
    fn from(raw: RawOverride) -> Self {
        Self {
            max_pages: raw.max_pages,
            stop_when: raw
                .stop_when
                .filter(|mode| !mode.trim().is_empty())
                .map(|mode| StopMode::from(mode.trim())),
            threshold: raw.threshold.unwrap_or(DEFAULT_THRESHOLD),
        }
    }
}

/// One fully resolved category of a retailer
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Position in `sale-urls`
    pub index: usize,
    /// Label or name derived from the URL; keys the override map
    pub name: String,
    /// Name used in artifact file names; suffixed with the 1-based position
    /// when several categories share `name`
    pub file_stem: String,
    pub base_url: String,
    pub max_pages: u32,
    pub stop_when: Option<StopMode>,
    pub threshold: f64,
}

/// Immutable view of one retailer's scraping parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetailerConfig {
    /// Identifier (file stem) of the retailer
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub scrape_options: ScrapeOptions,
    pub pagination: PaginationSettings,
    pub sale_urls: Vec<String>,
    pub url_labels: Vec<String>,
    pub pagination_overrides: HashMap<String, PaginationOverride>,
}

impl RetailerConfig {
    /// Parses retailer TOML, defaulting every absent or malformed key
    pub fn parse(id: &str, content: &str) -> Result<Self, ConfigError> {
        let raw: RawRetailer = toml::from_str(content)?;
        Ok(Self::from_raw(id, raw))
    }

    fn from_raw(id: &str, raw: RawRetailer) -> Self {
        let scrape = raw.scrape_options.unwrap_or_default();
        let pagination = raw.pagination.unwrap_or_default();

        let pagination_overrides = raw
            .pagination_overrides
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(category, value)| {
                value
                    .try_into::<RawOverride>()
                    .ok()
                    .map(|raw| (category, PaginationOverride::from(raw)))
            })
            .collect();

        Self {
            id: id.to_string(),
            name: raw.name.unwrap_or_else(|| id.to_string()),
            enabled: raw.enabled.unwrap_or(true),
            scrape_options: ScrapeOptions {
                wait_for_ms: scrape.wait_for_ms.unwrap_or(DEFAULT_WAIT_FOR_MS),
                only_main_content: scrape.only_main_content.unwrap_or(true),
            },
            pagination: PaginationSettings {
                param: pagination
                    .param
                    .unwrap_or_else(|| DEFAULT_PAGE_PARAM.to_string()),
                max_pages: pagination.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            },
            sale_urls: raw.sale_urls.unwrap_or_default(),
            url_labels: raw.url_labels.unwrap_or_default(),
            pagination_overrides,
        }
    }

    /// Display name of the category at `index`
    ///
    /// Uses the aligned label when present and non-blank, otherwise derives
    /// the name from the URL.
    pub fn category_name(&self, index: usize) -> Option<String> {
        let url = self.sale_urls.get(index)?;
        let name = match self.url_labels.get(index) {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => category_name(url),
        };
        Some(name)
    }

    /// Page budget for a category: a positive override wins over the global value
    pub fn effective_max_pages(&self, category: &str) -> u32 {
        self.pagination_overrides
            .get(category)
            .and_then(|o| o.max_pages)
            .filter(|&max| max > 0)
            .map(|max| u32::try_from(max).unwrap_or(u32::MAX))
            .unwrap_or(self.pagination.max_pages)
    }

    /// Resolves every category in `sale-urls` order
    pub fn categories(&self) -> Vec<Category> {
        let names: Vec<Option<String>> = (0..self.sale_urls.len())
            .map(|index| self.category_name(index))
            .collect();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for name in names.iter().flatten() {
            *counts.entry(name.as_str()).or_default() += 1;
        }

        self.sale_urls
            .iter()
            .zip(&names)
            .enumerate()
            .filter_map(|(index, (url, name))| {
                let name = name.clone()?;
                let overrides = self.pagination_overrides.get(&name);
                let file_stem = if counts.get(name.as_str()).copied().unwrap_or(0) > 1 {
                    format!("{}-{}", name, index + 1)
                } else {
                    name.clone()
                };
                Some(Category {
                    index,
                    max_pages: self.effective_max_pages(&name),
                    stop_when: overrides.and_then(|o| o.stop_when.clone()),
                    threshold: overrides.map_or(DEFAULT_THRESHOLD, |o| o.threshold),
                    base_url: url.clone(),
                    file_stem,
                    name,
                })
            })
            .collect()
    }
}

/// Directory of `<id>.toml` retailer files
#[derive(Debug, Clone)]
pub struct RetailerStore {
    dir: PathBuf,
}

impl RetailerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the configuration file for a retailer id
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RETAILER_EXTENSION))
    }

    /// Lists known retailer ids, sorted by file name
    ///
    /// A missing directory lists as empty.
    pub fn list(&self) -> std::io::Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(RETAILER_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Enumeration order for `all` runs: the explicit order when given,
    /// otherwise every file in the directory
    pub fn enumerate(&self, order: &[String]) -> std::io::Result<Vec<String>> {
        if order.is_empty() {
            self.list()
        } else {
            Ok(order.to_vec())
        }
    }

    /// Loads one retailer
    ///
    /// # Returns
    ///
    /// * `Ok(RetailerConfig)` - Parsed configuration
    /// * `Err(PagerError::ConfigNotFound)` - No file exists for `id`
    /// * `Err(PagerError::Config)` - The id is malformed, or the file could
    ///   not be read or parsed
    pub fn load(&self, id: &str) -> Result<RetailerConfig, PagerError> {
        validate_retailer_id(id)?;
        let path = self.path_for(id);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PagerError::ConfigNotFound {
                    retailer: id.to_string(),
                })
            }
            Err(e) => return Err(ConfigError::Io(e).into()),
        };

        tracing::debug!(
            retailer = id,
            hash = %hash_bytes(&content),
            "Loaded retailer configuration from {}",
            path.display()
        );

        let text = String::from_utf8_lossy(&content);
        Ok(RetailerConfig::parse(id, &text)?)
    }
}
