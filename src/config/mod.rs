//! Configuration module for Sale-Pager
//!
//! Two layers live here: the run [`Settings`] (one TOML file, validated once
//! and handed to the coordinator) and the per-retailer [`RetailerConfig`]
//! files, which are decoded leniently.
//!
//! # Example
//!
//! ```no_run
//! use sale_pager::config::{load_settings, RetailerStore};
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("sale-pager.toml")).unwrap();
//! let store = RetailerStore::new(&settings.retailers.dir);
//! let retailer = store.load("ssense").unwrap();
//! println!("{} has {} categories", retailer.name, retailer.sale_urls.len());
//! ```

mod parser;
mod retailer;
mod types;
mod validation;

// Re-export types
pub use retailer::{
    Category, PaginationOverride, PaginationSettings, RetailerConfig, RetailerStore,
    ScrapeOptions, DEFAULT_MAX_PAGES, DEFAULT_PAGE_PARAM, DEFAULT_THRESHOLD, DEFAULT_WAIT_FOR_MS,
};
pub use types::{
    OutputSettings, PredicateErrorPolicy, PredicateSettings, ProviderSettings, RetailerSettings,
    RunSettings, Settings,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_settings, load_settings_with_hash, parse_settings,
    DEFAULT_SETTINGS_PATH,
};
