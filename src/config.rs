//! Engine tuning parsed from the page's `data-journey-config` JSON.
//!
//! Every field is optional; absent keys take the defaults in [`crate::consts`].

use serde::Deserialize;

use crate::consts::{
    CARD_GAP_PX, CARD_HEIGHT_PX, CARD_WIDTH_PX, EXTERNAL_LOCK_MS, LINE_DURATION_MS, PROXIMITY_TOLERANCE_PX,
};

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Error returned by [`EngineConfig::from_json`] and [`EngineConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The raw string is not valid JSON for [`EngineConfig`].
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field parsed but holds an unusable value.
    #[error("invalid engine config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub proximity_tolerance_px: f64,
    pub external_lock_ms: f64,
    pub line_duration_ms: f64,
    pub card_width: f64,
    pub card_height: f64,
    pub card_gap_px: f64,
    /// Seed for decorative pulse phases; [`crate::consts::DEFAULT_DECOR_SEED`] when absent.
    pub decor_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proximity_tolerance_px: PROXIMITY_TOLERANCE_PX,
            external_lock_ms: EXTERNAL_LOCK_MS,
            line_duration_ms: LINE_DURATION_MS,
            card_width: CARD_WIDTH_PX,
            card_height: CARD_HEIGHT_PX,
            card_gap_px: CARD_GAP_PX,
            decor_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config blob.
    ///
    /// An empty or whitespace-only string yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`EngineConfig::from_json`], but logs and falls back to the
    /// defaults instead of failing. A bad attribute on the page must not
    /// take the map down.
    #[must_use]
    pub fn from_json_or_default(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "invalid journey map config; using defaults");
                Self::default()
            }
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("proximityTolerancePx", self.proximity_tolerance_px)?;
        positive("externalLockMs", self.external_lock_ms)?;
        positive("lineDurationMs", self.line_duration_ms)?;
        positive("cardWidth", self.card_width)?;
        positive("cardHeight", self.card_height)?;
        non_negative("cardGapPx", self.card_gap_px)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::Invalid { field, reason: "must be finite" });
    }
    if value <= 0.0 {
        return Err(ConfigError::Invalid { field, reason: "must be greater than zero" });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::Invalid { field, reason: "must be finite" });
    }
    if value < 0.0 {
        return Err(ConfigError::Invalid { field, reason: "must not be negative" });
    }
    Ok(())
}
