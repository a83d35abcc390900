use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    ModelTier,
    fields::{self, Payloads},
    locale,
};

/// Placeholder for `primaryModel` when the key reports no models.
const UNKNOWN_MODEL: &str = "unknown";

/// Dashboard view of one account, built from the credits and key-info payloads.
///
/// Every upstream value is optional; missing ones become zero, empty or the
/// configured default limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub current_session: CurrentSession,
    pub model_usage: Vec<ModelUsageEntry>,
    pub monthly: MonthlyTotals,
    pub daily_stats: DailyStats,
    pub account_info: AccountInfo,
    /// Overview section fields, flattened for the legacy frontend.
    #[serde(rename = "total_cost")]
    pub total_cost: f64,
    #[serde(rename = "total_requests")]
    pub total_requests: u64,
    #[serde(rename = "top_models")]
    pub top_models: Vec<TopModel>,
    #[serde(rename = "daily_usage")]
    pub daily_usage: Vec<DailyUsage>,
    /// ISO-8601 UTC time the snapshot was built.
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    pub total_cost: f64,
    pub total_requests: u64,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub active_models: usize,
    pub primary_model: String,
    pub last_used: String,
    pub requests_per_minute: f64,
}

/// One model reported by the key. The upstream has no per-model breakdown,
/// so cost, requests and tokens carry the account totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsageEntry {
    pub model: String,
    pub cost: f64,
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub last_used: String,
    pub is_active: bool,
    /// Always zero: the upstream reports no per-model cost to score.
    pub efficiency_score: f64,
    pub usage_trend: Vec<f64>,
    pub tier: ModelTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub total_cost: f64,
    pub total_requests: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub today: f64,
    pub yesterday: f64,
    pub this_week: f64,
    pub this_month: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub is_free_tier: bool,
    pub limit: f64,
    /// `limit - usage`; negative once the limit is exceeded.
    pub limit_remaining: f64,
    pub rate_limit: Map<String, Value>,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopModel {
    pub model: String,
    pub cost: f64,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyUsage {
    pub date: String,
    pub cost: f64,
    pub requests: u64,
}

impl UsageSnapshot {
    /// Merge the available payloads into a snapshot as of `now`.
    pub fn build(payloads: &Payloads<'_>, now: DateTime<FixedOffset>, default_limit: f64) -> Self {
        let balance = payloads.amount(fields::BALANCE).unwrap_or(0.0);
        let usage = payloads.amount(fields::USAGE).unwrap_or(0.0);
        let limit = payloads.amount(fields::LIMIT).unwrap_or(default_limit);

        let total_requests = payloads.count(fields::TOTAL_REQUESTS).unwrap_or(0);
        let total_tokens = payloads.count(fields::TOTAL_TOKENS).unwrap_or(0);
        let input_tokens = payloads.count(fields::INPUT_TOKENS).unwrap_or(0);
        let output_tokens = payloads.count(fields::OUTPUT_TOKENS).unwrap_or(0);
        let requests_per_minute = payloads.amount(fields::REQUESTS_PER_MINUTE).unwrap_or(0.0);
        let models = payloads.model_ids(fields::MODELS).unwrap_or_default();

        let last_used = locale::korean_time(&now);

        let model_usage = models
            .iter()
            .map(|model| ModelUsageEntry {
                model: model.clone(),
                cost: usage,
                requests: total_requests,
                input_tokens,
                output_tokens,
                last_used: last_used.clone(),
                is_active: usage > 0.0,
                efficiency_score: 0.0,
                usage_trend: Vec::new(),
                tier: ModelTier::classify(model),
            })
            .collect();

        let top_models = models
            .iter()
            .map(|model| TopModel {
                model: model.clone(),
                cost: usage,
                requests: total_requests,
            })
            .collect();

        Self {
            current_session: CurrentSession {
                total_cost: usage,
                total_requests,
                total_tokens,
                input_tokens,
                output_tokens,
                // Entries without a usable identifier are not counted.
                active_models: models.len(),
                primary_model: models
                    .first()
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
                last_used,
                requests_per_minute,
            },
            model_usage,
            monthly: MonthlyTotals {
                total_cost: usage,
                total_requests,
                total_tokens,
            },
            daily_stats: DailyStats {
                today: usage,
                yesterday: 0.0,
                this_week: usage,
                this_month: usage,
            },
            account_info: AccountInfo {
                is_free_tier: payloads.flag(fields::IS_FREE_TIER).unwrap_or(false),
                limit,
                limit_remaining: limit - usage,
                rate_limit: payloads.object(fields::RATE_LIMIT).unwrap_or_default(),
                balance,
            },
            total_cost: usage,
            total_requests,
            top_models,
            daily_usage: vec![DailyUsage {
                date: locale::korean_date(&now),
                cost: usage,
                requests: total_requests,
            }],
            last_updated: locale::iso_timestamp(&now),
        }
    }
}
