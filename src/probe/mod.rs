//! 模型可用性探测 — 逐个试探候选模型并分类结果
//!
//! # Model availability probe
//!
//! Sends one trial prompt to each candidate model, strictly in order, and turns
//! every result into a [`ProbeOutcome`]. Per-candidate failures are data: they
//! never abort the run. The only failure of the run as a whole is a
//! configuration problem detected before the first request.
//!
//! ```rust,no_run
//! use vertex_gemini::config::{GeminiConfig, ProbeConfig};
//! use vertex_gemini::probe::ModelProber;
//! use vertex_gemini::GeminiClient;
//!
//! # async fn run() -> vertex_gemini::Result<()> {
//! let client = GeminiClient::new(GeminiConfig::from_env()?)?;
//! let config = ProbeConfig::default();
//! let report = ModelProber::from_config(&config)
//!     .run(&client, &config, None)
//!     .await?;
//! if let Some(rec) = &report.recommendation {
//!     println!("GEMINI_MODEL={}", rec.model);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod recommend;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use crate::config::{ProbeConfig, DEFAULT_DETAIL_MAX_CHARS, DEFAULT_PROBE_TIMEOUT_SECS};
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};

pub use classify::ClassificationRule;
pub use recommend::{PriorityEntry, PriorityTable, Recommendation, RecommendationSource};

/// The remote side of a probe: "send(model, prompt) -> text | error".
#[async_trait]
pub trait GenerativeModelService: Send + Sync {
    /// Fail here when the service cannot work at all (missing credentials, ...).
    /// Called once before probing starts.
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Generate a reply from `model`. `Ok(None)` means the call succeeded but
    /// carried no text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    Available,
    EmptyResponse,
    NotFound,
    PermissionDenied,
    OtherError,
}

impl ProbeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::EmptyResponse => "empty response",
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::OtherError => "error",
        }
    }

    /// One-character marker used in terminal tables.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Available => "✓",
            Self::EmptyResponse => "?",
            Self::NotFound => "✗",
            Self::PermissionDenied => "!",
            Self::OtherError => "!",
        }
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of probing one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub model: String,
    pub status: ProbeStatus,
    pub detail: String,
    pub duration: Duration,
}

impl ProbeOutcome {
    pub fn new(model: impl Into<String>, status: ProbeStatus, detail: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            status,
            detail: detail.into(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ProbeStatus::Available
    }
}

/// Outcomes of one run plus the derived recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub outcomes: Vec<ProbeOutcome>,
    pub recommendation: Option<Recommendation>,
    /// True when the run stopped early; `outcomes` then covers a prefix of the candidates.
    pub cancelled: bool,
}

impl ProbeReport {
    pub fn available(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.is_available())
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }
}

/// Cooperative cancellation shared between the caller and a running probe.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so this only returns after a cancel.
        let _ = rx.wait_for(|c| *c).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential prober.
#[derive(Debug, Clone)]
pub struct ModelProber {
    rules: Vec<ClassificationRule>,
    timeout: Duration,
    detail_max_chars: usize,
}

impl Default for ModelProber {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelProber {
    pub fn new() -> Self {
        Self {
            rules: classify::default_rules(),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            detail_max_chars: DEFAULT_DETAIL_MAX_CHARS,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new()
            .with_timeout(config.timeout)
            .with_detail_max_chars(config.detail_max_chars)
    }

    /// Per-call bound; a call exceeding it becomes `OtherError`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_detail_max_chars(mut self, n: usize) -> Self {
        self.detail_max_chars = n.max(1);
        self
    }

    /// Replace the classification table. Order matters: first match wins.
    pub fn with_rules(mut self, rules: Vec<ClassificationRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Probe every candidate in order. One outcome per candidate, same order.
    pub async fn probe<S, C>(
        &self,
        service: &S,
        candidates: &[C],
        prompt: &str,
    ) -> Result<Vec<ProbeOutcome>>
    where
        S: GenerativeModelService + ?Sized,
        C: AsRef<str>,
    {
        let (outcomes, _) = self.probe_inner(service, candidates, prompt, None).await?;
        Ok(outcomes)
    }

    /// Like [`probe`](Self::probe), but stops when `cancel` fires. The candidate
    /// in flight at that moment is abandoned and gets no outcome.
    pub async fn probe_with_cancel<S, C>(
        &self,
        service: &S,
        candidates: &[C],
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ProbeOutcome>>
    where
        S: GenerativeModelService + ?Sized,
        C: AsRef<str>,
    {
        let (outcomes, _) = self
            .probe_inner(service, candidates, prompt, Some(cancel))
            .await?;
        Ok(outcomes)
    }

    /// Probe `config.candidates` and recommend from `config.priority`.
    pub async fn run<S>(
        &self,
        service: &S,
        config: &ProbeConfig,
        cancel: Option<&CancelToken>,
    ) -> Result<ProbeReport>
    where
        S: GenerativeModelService + ?Sized,
    {
        let (outcomes, cancelled) = self
            .probe_inner(service, config.candidates.as_slice(), &config.prompt, cancel)
            .await?;
        let recommendation = config.priority.recommend(&outcomes);
        Ok(ProbeReport {
            outcomes,
            recommendation,
            cancelled,
        })
    }

    async fn probe_inner<S, C>(
        &self,
        service: &S,
        candidates: &[C],
        prompt: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<(Vec<ProbeOutcome>, bool)>
    where
        S: GenerativeModelService + ?Sized,
        C: AsRef<str>,
    {
        if candidates.is_empty() {
            return Ok((Vec::new(), false));
        }
        if prompt.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "probe prompt must not be empty",
                ErrorContext::new()
                    .with_field_path("prompt")
                    .with_source("model_prober"),
            ));
        }
        service.check_ready()?;

        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                return Ok((outcomes, true));
            }
            let model = candidate.as_ref();
            let outcome = match cancel {
                Some(token) => {
                    tokio::select! {
                        o = self.probe_one(service, model, prompt) => o,
                        _ = token.cancelled() => return Ok((outcomes, true)),
                    }
                }
                None => self.probe_one(service, model, prompt).await,
            };
            outcomes.push(outcome);
        }
        Ok((outcomes, false))
    }

    /// Probe a single model. Never fails; errors become the outcome status.
    pub async fn probe_one<S>(&self, service: &S, model: &str, prompt: &str) -> ProbeOutcome
    where
        S: GenerativeModelService + ?Sized,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, service.generate(model, prompt)).await;

        let (status, detail) = match result {
            Ok(Ok(text)) => {
                let status = classify::classify_response(text.as_deref());
                let detail = match status {
                    ProbeStatus::Available => "responded normally",
                    _ => "response was empty",
                };
                (status, detail.to_string())
            }
            Ok(Err(err)) => {
                let diagnostic = diagnostic_text(&err);
                let status = classify::classify_error(&diagnostic, &self.rules);
                let detail = match status {
                    ProbeStatus::NotFound => "model not found".to_string(),
                    ProbeStatus::PermissionDenied => "no access permission".to_string(),
                    _ => classify::truncate_detail(&diagnostic, self.detail_max_chars),
                };
                (status, detail)
            }
            Err(_) => (
                ProbeStatus::OtherError,
                classify::truncate_detail(
                    &format!("timed out after {}s", self.timeout.as_secs_f32()),
                    self.detail_max_chars,
                ),
            ),
        };

        let duration = start.elapsed();
        debug!(
            model,
            status = status.label(),
            duration_ms = duration.as_millis() as u64,
            "probed model"
        );
        ProbeOutcome {
            model: model.to_string(),
            status,
            detail,
            duration,
        }
    }
}

/// Error text used for classification and detail, without the generic
/// "Remote error:" style prefixes that would eat the detail budget.
fn diagnostic_text(err: &Error) -> String {
    match err {
        Error::Remote { status, message } => format!("HTTP {}: {}", status, message),
        Error::Transport(TransportError::Http(inner)) => transport_text(inner),
        Error::Transport(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

/// Failure kind plus the innermost cause. reqwest's own `Display` carries the
/// request URL, whose project id and model name must not reach classification.
fn transport_text(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_decode() {
        "undecodable response"
    } else {
        "request failed"
    };
    let mut cause = None;
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        cause = Some(inner.to_string());
        source = inner.source();
    }
    match cause {
        Some(cause) => format!("{}: {}", kind, cause),
        None => kind.to_string(),
    }
}
