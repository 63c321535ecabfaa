//! Configuration: environment-driven client settings and file-driven probe settings.
//!
//! Client settings follow the `.env` convention of the starter kit:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GCP_PROJECT_ID` | required |
//! | `GCP_LOCATION` | `us-central1` |
//! | `GEMINI_MODEL` | none (commands that need it fail early) |
//! | `GOOGLE_ACCESS_TOKEN` | OS keyring, service `vertex-gemini`, user = project id |
//! | `GEMINI_HTTP_TIMEOUT_SECS` | 60 |
//! | `GEMINI_PROXY_URL` | none |
//! | `GEMINI_BASE_URL` | `https://{location}-aiplatform.googleapis.com` |

use crate::probe::recommend::{PriorityEntry, PriorityTable};
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const ENV_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const ENV_LOCATION: &str = "GCP_LOCATION";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "GEMINI_HTTP_TIMEOUT_SECS";
pub const ENV_PROXY_URL: &str = "GEMINI_PROXY_URL";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Resolved settings for talking to Vertex AI.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    /// Default model for chat, streaming and vision. The prober names its own.
    pub model: Option<String>,
    pub access_token: Option<String>,
    pub base_url: Option<String>,
    pub proxy_url: Option<String>,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            model: None,
            access_token: None,
            base_url: None,
            proxy_url: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Read settings from the process environment.
    ///
    /// Callers that want `.env` support should run `dotenvy::dotenv()` first.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let project_id = get(ENV_PROJECT_ID).ok_or_else(|| missing_var(ENV_PROJECT_ID))?;
        let location = get(ENV_LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let timeout_secs = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::configuration_with_context(
                    "timeout must be a whole number of seconds",
                    ErrorContext::new()
                        .with_field_path(ENV_TIMEOUT_SECS)
                        .with_details(raw.clone())
                        .with_source("config"),
                )
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            project_id,
            location,
            model: get(ENV_MODEL),
            access_token: get(ENV_ACCESS_TOKEN),
            base_url: get(ENV_BASE_URL),
            proxy_url: get(ENV_PROXY_URL),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured default model, or a configuration error naming `GEMINI_MODEL`.
    pub fn require_model(&self) -> Result<&str> {
        self.model
            .as_deref()
            .ok_or_else(|| missing_var(ENV_MODEL))
    }

    /// API root, without trailing slash.
    pub fn endpoint_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.location == "global" => "https://aiplatform.googleapis.com".to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

fn missing_var(name: &str) -> Error {
    Error::configuration_with_context(
        format!("{} is not set", name),
        ErrorContext::new()
            .with_field_path(name)
            .with_details("add it to the environment or the .env file")
            .with_source("config"),
    )
}

pub const DEFAULT_PROBE_PROMPT: &str = "Hello";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DETAIL_MAX_CHARS: usize = 30;

/// Models tried by `models` when no config file is given. Newest first.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "gemini-2.5-pro-preview-06-05",
    "gemini-2.5-pro-preview-05-06",
    "gemini-2.5-flash-preview-05-20",
    "gemini-2.5-flash-preview-04-17",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.0-flash-preview-image-generation",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemma-3-27b-it",
    "gemma-3-12b-it",
    "gemma-3-4b-it",
    "gemma-3-1b-it",
    "gemma-3n-e4b-it",
];

/// Recommendation order: (model, rank, note).
pub const DEFAULT_PRIORITY: &[(&str, u32, &str)] = &[
    ("gemini-2.5-pro-preview-05-06", 1, "latest, highest capability"),
    ("gemini-2.5-flash-preview-05-20", 2, "latest, fast"),
    ("gemini-2.0-flash", 3, "stable, fast"),
    ("gemini-1.5-flash", 4, "stable, cost efficient"),
    ("gemini-1.5-pro", 5, "stable, high capability"),
];

/// Settings for the model availability probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub candidates: Vec<String>,
    pub priority: PriorityTable,
    pub prompt: String,
    pub timeout: Duration,
    pub detail_max_chars: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            priority: PriorityTable::new(
                DEFAULT_PRIORITY
                    .iter()
                    .map(|(model, rank, note)| PriorityEntry::new(*model, *rank).with_note(*note))
                    .collect(),
            ),
            prompt: DEFAULT_PROBE_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            detail_max_chars: DEFAULT_DETAIL_MAX_CHARS,
        }
    }
}

/// On-disk shape; every field is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProbeConfigFile {
    candidates: Option<Vec<String>>,
    priority: Option<Vec<PriorityEntry>>,
    prompt: Option<String>,
    timeout_secs: Option<u64>,
    detail_max_chars: Option<usize>,
}

impl ProbeConfig {
    /// Parse YAML such as:
    ///
    /// ```yaml
    /// candidates: [gemini-2.0-flash, gemini-1.5-flash]
    /// priority:
    ///   - { model: gemini-2.0-flash, rank: 1, note: "stable, fast" }
    /// prompt: Hello
    /// timeout_secs: 20
    /// ```
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let file: ProbeConfigFile = if s.trim().is_empty() {
            ProbeConfigFile::default()
        } else {
            serde_yaml::from_str(s)?
        };
        let mut cfg = ProbeConfig::default();
        if let Some(candidates) = file.candidates {
            cfg.candidates = candidates
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(priority) = file.priority {
            cfg.priority = PriorityTable::new(priority);
        }
        if let Some(prompt) = file.prompt {
            if prompt.trim().is_empty() {
                return Err(Error::configuration_with_context(
                    "probe prompt must not be empty",
                    ErrorContext::new()
                        .with_field_path("prompt")
                        .with_source("probe_config"),
                ));
            }
            cfg.prompt = prompt;
        }
        if let Some(secs) = file.timeout_secs {
            cfg.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(n) = file.detail_max_chars {
            cfg.detail_max_chars = n.max(1);
        }
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read probe config: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("probe_config"),
            )
        })?;
        Self::from_yaml_str(&content)
    }
}
