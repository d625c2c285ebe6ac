//! Stop predicates deciding whether a category keeps paginating
//!
//! Two evaluators implement [`StopPredicate`]:
//! - [`BuiltinPredicate`] runs the `no_discount` and `seen_before` checks in process
//! - [`CommandPredicate`] hands the page to an external program and reads its exit code

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Errors raised while evaluating a stop predicate
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("Failed to read page {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start predicate command '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Predicate command exited with {status}")]
    UnexpectedExit { status: String },

    #[error("Mode '{0}' needs a prior-state file")]
    MissingPriorState(String),

    #[error("Unknown stop mode '{0}'")]
    UnknownMode(String),

    #[error("Invalid product URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Stop predicate mode named by a category's `stop-when`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StopMode {
    /// Stop once a page shows no discounted items
    NoDiscount,
    /// Stop once most of a page's products were already known from the prior run
    SeenBefore,
    /// Any other mode, understood only by an external predicate
    Other(String),
}

impl StopMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoDiscount => "no_discount",
            Self::SeenBefore => "seen_before",
            Self::Other(mode) => mode,
        }
    }
}

impl From<&str> for StopMode {
    fn from(mode: &str) -> Self {
        match mode {
            "no_discount" => Self::NoDiscount,
            "seen_before" => Self::SeenBefore,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a stop predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    Stop,
}

/// Input to one predicate evaluation
#[derive(Debug, Clone, Copy)]
pub struct StopCheck<'a> {
    pub mode: &'a StopMode,
    /// Saved page content to inspect
    pub artifact: &'a Path,
    /// Reference file from a prior run, if any
    pub prior_state: Option<&'a Path>,
    pub threshold: f64,
}

/// Decides, after a page is kept, whether its category should stop
#[async_trait]
pub trait StopPredicate: Send + Sync {
    async fn evaluate(&self, check: &StopCheck<'_>) -> Result<StopDecision, PredicateError>;
}

/// In-process evaluator for the `no_discount` and `seen_before` modes
pub struct BuiltinPredicate {
    discount: Regex,
    product_url: Regex,
}

#[derive(Debug, Default, Deserialize)]
struct PriorResults {
    #[serde(default)]
    products: Vec<PriorProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct PriorProduct {
    #[serde(default)]
    url: String,
}

impl BuiltinPredicate {
    /// Creates the evaluator with the regex that finds product URLs on a page
    pub fn new(product_url_pattern: &str) -> Result<Self, PredicateError> {
        Ok(Self {
            discount: Regex::new(r"(?i)\d+%\s*OFF")?,
            product_url: Regex::new(product_url_pattern)?,
        })
    }

    /// Continue while the page shows at least one discount marker
    fn check_no_discount(&self, text: &str) -> StopDecision {
        let count = self.discount.find_iter(text).count();
        tracing::debug!("no_discount: found {} discounted items", count);

        if count > 0 {
            StopDecision::Continue
        } else {
            StopDecision::Stop
        }
    }

    /// Continue while the share of already-known product URLs stays below the threshold
    async fn check_seen_before(
        &self,
        text: &str,
        prior_state: &Path,
        threshold: f64,
    ) -> StopDecision {
        let page_urls: HashSet<&str> = self
            .product_url
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();

        if page_urls.is_empty() {
            tracing::debug!("seen_before: no product URLs found on page");
            return StopDecision::Stop;
        }

        let known = match load_known_urls(prior_state).await {
            Ok(known) => known,
            Err(e) => {
                tracing::warn!(
                    "seen_before: could not load {}: {}",
                    prior_state.display(),
                    e
                );
                return StopDecision::Continue;
            }
        };

        let overlap = page_urls.iter().filter(|url| known.contains(**url)).count();
        let ratio = overlap as f64 / page_urls.len() as f64;
        tracing::debug!(
            "seen_before: {}/{} URLs already known ({:.0}%, threshold {:.0}%)",
            overlap,
            page_urls.len(),
            ratio * 100.0,
            threshold * 100.0
        );

        if ratio < threshold {
            StopDecision::Continue
        } else {
            StopDecision::Stop
        }
    }
}

async fn load_known_urls(path: &Path) -> Result<HashSet<String>, String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    let results: PriorResults = serde_json::from_str(&content).map_err(|e| e.to_string())?;

    Ok(results.products.into_iter().map(|p| p.url).collect())
}

#[async_trait]
impl StopPredicate for BuiltinPredicate {
    async fn evaluate(&self, check: &StopCheck<'_>) -> Result<StopDecision, PredicateError> {
        let text = tokio::fs::read_to_string(check.artifact)
            .await
            .map_err(|source| PredicateError::Io {
                path: check.artifact.to_path_buf(),
                source,
            })?;

        match check.mode {
            StopMode::NoDiscount => Ok(self.check_no_discount(&text)),
            StopMode::SeenBefore => {
                let prior = check
                    .prior_state
                    .ok_or_else(|| PredicateError::MissingPriorState(check.mode.to_string()))?;
                Ok(self.check_seen_before(&text, prior, check.threshold).await)
            }
            StopMode::Other(mode) => Err(PredicateError::UnknownMode(mode.clone())),
        }
    }
}

/// Runs an external program per page
///
/// The program receives `--mode <mode> --file <page> [--latest <prior>]
/// --threshold <t>`. Exit status 0 means continue, 1 means stop.
pub struct CommandPredicate {
    program: String,
    args: Vec<String>,
}

impl CommandPredicate {
    /// Builds the predicate from a program and its leading arguments
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn arguments(&self, check: &StopCheck<'_>) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--mode".to_string());
        args.push(check.mode.to_string());
        args.push("--file".to_string());
        args.push(check.artifact.display().to_string());
        if let Some(prior) = check.prior_state {
            args.push("--latest".to_string());
            args.push(prior.display().to_string());
        }
        args.push("--threshold".to_string());
        args.push(check.threshold.to_string());
        args
    }
}

#[async_trait]
impl StopPredicate for CommandPredicate {
    async fn evaluate(&self, check: &StopCheck<'_>) -> Result<StopDecision, PredicateError> {
        let output = Command::new(&self.program)
            .args(self.arguments(check))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| PredicateError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Child output belongs to the diagnostic stream, never to stdout
        for line in String::from_utf8_lossy(&output.stderr)
            .lines()
            .chain(String::from_utf8_lossy(&output.stdout).lines())
            .filter(|line| !line.trim().is_empty())
        {
            tracing::info!("{}: {}", self.program, line.trim());
        }

        match output.status.code() {
            Some(0) => Ok(StopDecision::Continue),
            Some(1) => Ok(StopDecision::Stop),
            _ => Err(PredicateError::UnexpectedExit {
                status: output.status.to_string(),
            }),
        }
    }
}
