use serde::{Deserialize, Serialize};

/// Coarse cost classification of a model, derived from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Budget,
    Balanced,
    Premium,
}

const BUDGET_MARKERS: &[&str] = &["claude-3-haiku", "gpt-3.5", "mistral"];
const BALANCED_MARKERS: &[&str] = &["claude-3-sonnet", "gpt-4", "llama"];

impl ModelTier {
    /// Classify a model by substring. Budget markers are checked before
    /// balanced ones; anything unmatched is premium.
    pub fn classify(model_id: &str) -> Self {
        if BUDGET_MARKERS.iter().any(|m| model_id.contains(m)) {
            ModelTier::Budget
        } else if BALANCED_MARKERS.iter().any(|m| model_id.contains(m)) {
            ModelTier::Balanced
        } else {
            ModelTier::Premium
        }
    }
}
