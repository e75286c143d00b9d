//! Editor tuning knobs, supplied by the host page as JSON.

use crate::error::ConfigError;
use crate::viewport::DEFAULT_FIT_PADDING;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum snapshots kept per page, including the initial one.
    pub history_limit: usize,
    /// Quiet period before a buffered edit is written, in milliseconds.
    pub autosave_debounce_ms: f64,
    /// Quiet period before a container resize triggers a refit.
    pub resize_debounce_ms: f64,
    pub fit_padding: f64,
    /// Additive zoom step used by zoom in / zoom out.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub default_fill: String,
    pub default_font: String,
    pub brush_width: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            autosave_debounce_ms: 500.0,
            resize_debounce_ms: 100.0,
            fit_padding: DEFAULT_FIT_PADDING,
            zoom_step: 0.05,
            min_zoom: 0.05,
            max_zoom: 4.0,
            default_fill: "#000000".to_string(),
            default_font: "Arial".to_string(),
            brush_width: 5.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config; missing keys keep defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("historyLimit must be at least 1".into()));
        }
        if !(self.fit_padding > 0.0 && self.fit_padding <= 1.0) {
            return Err(ConfigError::Invalid("fitPadding must be in (0, 1]".into()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid("minZoom must be positive and <= maxZoom".into()));
        }
        if self.autosave_debounce_ms < 0.0 || self.resize_debounce_ms < 0.0 {
            return Err(ConfigError::Invalid("debounce windows must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "historyLimit": 10 }"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.autosave_debounce_ms, 500.0);
        assert_eq!(config.fit_padding, 0.85);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EditorConfig::from_json(r#"{ "historyLimit": 0 }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "fitPadding": 1.5 }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "minZoom": 5, "maxZoom": 1 }"#).is_err());
        assert!(EditorConfig::from_json("[]").is_err());
    }
}
