use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Presentation settings for the dashboard payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// UTC offset, in minutes, used for the human-readable `lastUsed` and
    /// `date` strings (e.g. 540 for KST). Defaults to the host's local zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl DashboardConfig {
    /// Current wall-clock time in the configured display zone.
    /// Out-of-range offsets fall back to the local zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self.utc_offset_minutes.and_then(offset_from_minutes) {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(minutes) = self.utc_offset_minutes
            && offset_from_minutes(minutes).is_none()
        {
            return Err(ConfigError::Validation(format!(
                "dashboard.utc_offset_minutes must be within ±1439, got {}",
                minutes
            )));
        }
        Ok(())
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}
