//! Recommendation of a default model from probe outcomes.

use serde::{Deserialize, Serialize};

use super::{ProbeOutcome, ProbeStatus};

/// One row of the preference table. Lower rank is preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub model: String,
    pub rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PriorityEntry {
    pub fn new(model: impl Into<String>, rank: u32) -> Self {
        Self {
            model: model.into(),
            rank,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Preference table kept sorted by rank; equal ranks keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTable {
    entries: Vec<PriorityEntry>,
}

/// Where a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Priority { rank: u32 },
    /// No ranked model was available; first available candidate in probe order.
    FirstAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub model: String,
    pub note: Option<String>,
    pub source: RecommendationSource,
}

impl PriorityTable {
    pub fn new(mut entries: Vec<PriorityEntry>) -> Self {
        entries.sort_by_key(|e| e.rank);
        Self { entries }
    }

    /// Build from models listed best first; ranks start at 1.
    pub fn from_ordered<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            models
                .into_iter()
                .enumerate()
                .map(|(i, m)| PriorityEntry::new(m, i as u32 + 1))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn recommend(&self, outcomes: &[ProbeOutcome]) -> Option<Recommendation> {
        let is_available =
            |model: &str| outcomes.iter().any(|o| o.model == model && o.is_available());

        if let Some(entry) = self.entries.iter().find(|e| is_available(e.model.as_str())) {
            return Some(Recommendation {
                model: entry.model.clone(),
                note: entry.note.clone(),
                source: RecommendationSource::Priority { rank: entry.rank },
            });
        }

        outcomes
            .iter()
            .find(|o| o.status == ProbeStatus::Available)
            .map(|o| Recommendation {
                model: o.model.clone(),
                note: None,
                source: RecommendationSource::FirstAvailable,
            })
    }
}
