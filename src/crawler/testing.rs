//! Scripted collaborators for crawler tests

use crate::crawler::{
    FetchError, FetchRequest, PageFetcher, PredicateError, StopCheck, StopDecision, StopPredicate,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

enum Script {
    /// Nth call returns the Nth size
    Sizes(Vec<u64>),
    /// Listed calls (1-based) fail, the rest return `size`
    Failing { calls: Vec<usize>, size: u64 },
    /// Size looked up by URL; unknown URLs fail
    ByUrl(HashMap<String, u64>),
}

/// Fetcher writing `size` bytes of filler per request and recording every call
pub struct ScriptedFetcher {
    script: Script,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sizes(sizes: &[u64]) -> Self {
        Self::new(Script::Sizes(sizes.to_vec()))
    }

    pub fn failing_on(calls: &[usize], size: u64) -> Self {
        Self::new(Script::Failing {
            calls: calls.to_vec(),
            size,
        })
    }

    pub fn by_url(sizes: &[(&str, u64)]) -> Self {
        Self::new(Script::ByUrl(
            sizes
                .iter()
                .map(|(url, size)| (url.to_string(), *size))
                .collect(),
        ))
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest, output: &Path) -> Result<u64, FetchError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let size = match &self.script {
            Script::Sizes(sizes) => sizes.get(call - 1).copied(),
            Script::Failing { calls, size } => (!calls.contains(&call)).then_some(*size),
            Script::ByUrl(sizes) => sizes.get(&request.url).copied(),
        };

        let size = size.ok_or_else(|| FetchError::Provider {
            url: request.url.clone(),
            message: "scripted failure".to_string(),
        })?;

        tokio::fs::write(output, "x".repeat(size as usize))
            .await
            .map_err(|source| FetchError::Io {
                path: output.to_path_buf(),
                source,
            })?;
        Ok(size)
    }
}

/// What the predicate was asked on one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCheck {
    pub mode: String,
    pub artifact: PathBuf,
    pub prior_state: Option<PathBuf>,
    pub threshold: f64,
}

/// Predicate replaying a fixed list of outcomes, then a fallback decision
pub struct ScriptedPredicate {
    outcomes: Mutex<VecDeque<Result<StopDecision, PredicateError>>>,
    fallback: StopDecision,
    checks: Mutex<Vec<RecordedCheck>>,
}

impl ScriptedPredicate {
    pub fn always(decision: StopDecision) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: decision,
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn sequence(outcomes: Vec<Result<StopDecision, PredicateError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback: StopDecision::Continue,
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    pub fn checks(&self) -> Vec<RecordedCheck> {
        self.checks.lock().unwrap().clone()
    }
}

#[async_trait]
impl StopPredicate for ScriptedPredicate {
    async fn evaluate(&self, check: &StopCheck<'_>) -> Result<StopDecision, PredicateError> {
        self.checks.lock().unwrap().push(RecordedCheck {
            mode: check.mode.to_string(),
            artifact: check.artifact.to_path_buf(),
            prior_state: check.prior_state.map(Path::to_path_buf),
            threshold: check.threshold,
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }
}
