//! Integration tests for Sale-Pager
//!
//! These tests use wiremock to stand in for the scrape provider and drive
//! runs end to end through the public API.

mod run_tests;
mod scrape_api_tests;
