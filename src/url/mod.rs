//! URL handling module for Sale-Pager
//!
//! This module provides page URL construction for paginated listings and
//! the naming rules that turn URLs into category names and file-safe slugs.

mod naming;
mod pagination;

// Re-export main functions
pub use naming::{category_name, host_slug, last_segment, slugify, DEFAULT_CATEGORY};
pub use pagination::page_url;
