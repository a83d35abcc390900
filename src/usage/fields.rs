//! Lookup of upstream values that may appear under several field names.
//!
//! The billing API has changed shape over time, so most dashboard values can
//! come from more than one place. Each value is described by an ordered list
//! of [`FieldPath`]s; the first path that holds a usable value wins and the
//! caller supplies the final default.

use serde_json::{Map, Value};

/// Which upstream payload a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Credits,
    KeyInfo,
}

/// A key path inside one upstream payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    pub source: Source,
    pub keys: &'static [&'static str],
}

impl FieldPath {
    pub const fn credits(keys: &'static [&'static str]) -> Self {
        Self {
            source: Source::Credits,
            keys,
        }
    }

    pub const fn key_info(keys: &'static [&'static str]) -> Self {
        Self {
            source: Source::KeyInfo,
            keys,
        }
    }
}

pub const BALANCE: &[FieldPath] = &[
    FieldPath::credits(&["data", "total_credits"]),
    FieldPath::credits(&["balance"]),
    FieldPath::credits(&["credits"]),
];

pub const USAGE: &[FieldPath] = &[
    FieldPath::credits(&["data", "total_usage"]),
    FieldPath::credits(&["usage"]),
];

pub const LIMIT: &[FieldPath] = &[
    FieldPath::credits(&["data", "limit"]),
    FieldPath::key_info(&["limit"]),
];

pub const IS_FREE_TIER: &[FieldPath] = &[
    FieldPath::credits(&["is_free_tier"]),
    FieldPath::key_info(&["is_free_tier"]),
];

pub const TOTAL_REQUESTS: &[FieldPath] = &[FieldPath::key_info(&["total_requests"])];
pub const TOTAL_TOKENS: &[FieldPath] = &[FieldPath::key_info(&["total_tokens"])];
pub const INPUT_TOKENS: &[FieldPath] = &[FieldPath::key_info(&["input_tokens"])];
pub const OUTPUT_TOKENS: &[FieldPath] = &[FieldPath::key_info(&["output_tokens"])];
pub const REQUESTS_PER_MINUTE: &[FieldPath] = &[FieldPath::key_info(&["requests_per_minute"])];
pub const MODELS: &[FieldPath] = &[FieldPath::key_info(&["models"])];
pub const RATE_LIMIT: &[FieldPath] = &[FieldPath::key_info(&["rate_limit"])];

/// The two upstream payloads of one request. Either may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payloads<'a> {
    pub credits: Option<&'a Value>,
    pub key_info: Option<&'a Value>,
}

impl<'a> Payloads<'a> {
    pub fn new(credits: Option<&'a Value>, key_info: Option<&'a Value>) -> Self {
        Self { credits, key_info }
    }

    /// Raw value at `field`, treating JSON `null` as absent.
    fn get(&self, field: &FieldPath) -> Option<&'a Value> {
        let root = match field.source {
            Source::Credits => self.credits?,
            Source::KeyInfo => self.key_info?,
        };
        field
            .keys
            .iter()
            .try_fold(root, |value, key| value.get(key))
            .filter(|value| !value.is_null())
    }

    fn first<T>(&self, paths: &[FieldPath], extract: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        paths
            .iter()
            .find_map(|field| self.get(field).and_then(&extract))
    }

    /// First finite, non-negative number.
    pub fn amount(&self, paths: &[FieldPath]) -> Option<f64> {
        self.first(paths, |value| {
            value.as_f64().filter(|n| n.is_finite() && *n >= 0.0)
        })
    }

    /// First non-negative whole count. Fractional counts are truncated.
    pub fn count(&self, paths: &[FieldPath]) -> Option<u64> {
        self.first(paths, |value| {
            value.as_u64().or_else(|| {
                value
                    .as_f64()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n.trunc() as u64)
            })
        })
    }

    pub fn flag(&self, paths: &[FieldPath]) -> Option<bool> {
        self.first(paths, Value::as_bool)
    }

    pub fn object(&self, paths: &[FieldPath]) -> Option<Map<String, Value>> {
        self.first(paths, |value| value.as_object().cloned())
    }

    /// First array of model identifiers.
    ///
    /// Entries are either plain strings or objects carrying an `id` string;
    /// anything else is skipped.
    pub fn model_ids(&self, paths: &[FieldPath]) -> Option<Vec<String>> {
        self.first(paths, |value| {
            value.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        item.as_str()
                            .or_else(|| item.get("id").and_then(Value::as_str))
                            .map(str::to_string)
                    })
                    .collect()
            })
        })
    }
}
