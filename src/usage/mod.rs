//! Aggregation of billing API payloads into the dashboard usage document.
//!
//! [`fields`] resolves values that may appear under several upstream names,
//! [`ModelTier`] classifies models, and [`UsageSnapshot::build`] shapes the
//! merged values into the response body.

pub mod fields;
mod locale;
mod snapshot;
mod tier;

pub use fields::Payloads;
pub use locale::iso_timestamp;
pub use snapshot::*;
pub use tier::ModelTier;
