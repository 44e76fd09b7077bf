#![forbid(unsafe_code)]

//! Page-level configuration.
//!
//! The server embeds these settings as JSON (or the host passes a JS options
//! object, stringified). Every field has a default matching the markup the
//! burialdb templates render, so an empty object `{}` is a valid config.

use core::fmt;
use core::str::FromStr;

use serde::Deserialize;

use crate::fragment::DEFAULT_PAGE_PARAM;
use crate::loader::DEFAULT_BOTTOM_TOLERANCE_PX;
use crate::visibility::{VisibilityRule, VisibilityRules};

/// Errors from loading or validating a [`UiConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Malformed JSON or a field of the wrong type.
    Json(String),
    /// A field parsed but holds an unusable value.
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "config JSON error: {msg}"),
            Self::Invalid { field, reason } => write!(f, "invalid config field {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiConfig {
    /// CSS class that hides an element (Bootstrap's `d-none` by default).
    pub hidden_class: String,
    /// Minimum level forwarded to the browser console.
    pub log_level: String,
    pub pagination: PaginationConfig,
    pub rows: RowConfig,
    pub visibility: VisibilityConfig,
    pub search: SearchConfig,
    pub copy_field: CopyFieldConfig,
    pub scroll_top: ScrollTopConfig,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            hidden_class: "d-none".to_owned(),
            log_level: "warn".to_owned(),
            pagination: PaginationConfig::default(),
            rows: RowConfig::default(),
            visibility: VisibilityConfig::default(),
            search: SearchConfig::default(),
            copy_field: CopyFieldConfig::default(),
            scroll_top: ScrollTopConfig::default(),
        }
    }
}

impl UiConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_token("hiddenClass", &self.hidden_class)?;
        self.log_level()?;
        self.pagination.validate()?;
        self.rows.validate()?;
        self.visibility.rules()?;
        self.search.validate()?;
        self.copy_field.validate()?;
        self.scroll_top.validate()
    }

    /// Parsed [`Self::log_level`].
    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(self.log_level.trim()).map_err(|_| {
            ConfigError::invalid("logLevel", format!("unknown level {:?}", self.log_level))
        })
    }
}

/// Incremental loader knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    /// How far (CSS px) above the exact bottom a scroll still counts as "at
    /// the bottom". `0.0` requires exact equality.
    pub bottom_tolerance_px: f64,
    /// Query parameter carrying the page number.
    pub page_param: String,
    /// Treat a blank fragment as the end of the list.
    pub exhaust_on_blank: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            bottom_tolerance_px: DEFAULT_BOTTOM_TOLERANCE_PX,
            page_param: DEFAULT_PAGE_PARAM.to_owned(),
            exhaust_on_blank: true,
        }
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bottom_tolerance_px.is_finite() || self.bottom_tolerance_px < 0.0 {
            return Err(ConfigError::invalid(
                "pagination.bottomTolerancePx",
                "must be a finite, non-negative number",
            ));
        }
        require_token("pagination.pageParam", &self.page_param)?;
        if self
            .page_param
            .chars()
            .any(|c| matches!(c, '&' | '=' | '?' | '#'))
        {
            return Err(ConfigError::invalid(
                "pagination.pageParam",
                "must not contain URL delimiters",
            ));
        }
        Ok(())
    }
}

/// Clickable row markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RowConfig {
    pub selector: String,
    pub href_attribute: String,
    pub target_attribute: String,
    pub new_window_attribute: String,
    /// Attribute stamped on rows once bound.
    pub key_attribute: String,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            selector: ".clickable-row".to_owned(),
            href_attribute: "data-href".to_owned(),
            target_attribute: "data-target".to_owned(),
            new_window_attribute: "data-new-window".to_owned(),
            key_attribute: "data-row-key".to_owned(),
        }
    }
}

impl RowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_token("rows.selector", &self.selector)?;
        require_token("rows.hrefAttribute", &self.href_attribute)?;
        require_token("rows.targetAttribute", &self.target_attribute)?;
        require_token("rows.newWindowAttribute", &self.new_window_attribute)?;
        require_token("rows.keyAttribute", &self.key_attribute)
    }
}

/// Which built-in rule table drives field visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityPreset {
    /// `treated` / `killed` / `mia`.
    #[default]
    CasualtyStatus,
    /// Numeric codes `0..=4`.
    StateCodes,
    /// Rules supplied in [`VisibilityConfig::rules`].
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisibilityConfig {
    /// Id of the state `<select>`.
    pub selector_id: String,
    pub preset: VisibilityPreset,
    pub rules: Vec<VisibilityRule>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            selector_id: "id_state".to_owned(),
            preset: VisibilityPreset::default(),
            rules: Vec::new(),
        }
    }
}

impl VisibilityConfig {
    /// Resolve the configured rule table.
    pub fn rules(&self) -> Result<VisibilityRules, ConfigError> {
        require_token("visibility.selectorId", &self.selector_id)?;
        match self.preset {
            VisibilityPreset::CasualtyStatus => Ok(VisibilityRules::casualty_status()),
            VisibilityPreset::StateCodes => Ok(VisibilityRules::state_codes()),
            VisibilityPreset::Custom => VisibilityRules::from_rules(self.rules.clone()),
        }
    }
}

/// Advanced-search markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    pub flag_input_id: String,
    pub field_selector: String,
    pub on_control_id: String,
    pub off_control_id: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            flag_input_id: "id_advanced_search".to_owned(),
            field_selector: ".advanced-search-field".to_owned(),
            on_control_id: "advanced-search-on".to_owned(),
            off_control_id: "advanced-search-off".to_owned(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_token("search.flagInputId", &self.flag_input_id)?;
        require_token("search.fieldSelector", &self.field_selector)?;
        require_token("search.onControlId", &self.on_control_id)?;
        require_token("search.offControlId", &self.off_control_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFieldConfig {
    pub selector: String,
}

impl Default for CopyFieldConfig {
    fn default() -> Self {
        Self {
            selector: "[data-copy-from][data-copy-to]".to_owned(),
        }
    }
}

impl CopyFieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_token("copyField.selector", &self.selector)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollTopConfig {
    pub button_id: String,
    /// Scroll offset (CSS px) past which the button is shown.
    pub threshold_px: f64,
}

impl Default for ScrollTopConfig {
    fn default() -> Self {
        Self {
            button_id: "scroll-to-top".to_owned(),
            threshold_px: 200.0,
        }
    }
}

impl ScrollTopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_token("scrollTop.buttonId", &self.button_id)?;
        if !self.threshold_px.is_finite() || self.threshold_px < 0.0 {
            return Err(ConfigError::invalid(
                "scrollTop.thresholdPx",
                "must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

fn require_token(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::invalid(field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = UiConfig::from_json("{}").expect("empty config is valid");
        assert_eq!(config, UiConfig::default());
        assert_eq!(config.log_level(), Ok(tracing::Level::WARN));
    }

    #[test]
    fn nested_overrides_keep_sibling_defaults() {
        let config = UiConfig::from_json(
            r#"{"pagination":{"bottomTolerancePx":0},"scrollTop":{"thresholdPx":50}}"#,
        )
        .expect("config should parse");
        assert_eq!(config.pagination.bottom_tolerance_px, 0.0);
        assert_eq!(config.pagination.page_param, "page");
        assert_eq!(config.scroll_top.threshold_px, 50.0);
        assert_eq!(config.scroll_top.button_id, "scroll-to-top");
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = UiConfig::from_json(r#"{"pagination":{"bottomTolerancePx":-2}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "pagination.bottomTolerancePx",
                ..
            }
        ));
    }

    #[test]
    fn page_param_with_delimiters_is_rejected() {
        let err = UiConfig::from_json(r#"{"pagination":{"pageParam":"p&x"}}"#).unwrap_err();
        assert!(err.to_string().contains("pagination.pageParam"));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = UiConfig::from_json(r#"{"logLevel":"loud"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "logLevel", .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = UiConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn custom_visibility_rules_are_resolved() {
        let config = UiConfig::from_json(
            r#"{"visibility":{"preset":"custom",
                "rules":[{"value":"buried","hide":["hide-if-buried"]}]}}"#,
        )
        .expect("config should parse");
        let rules = config.visibility.rules().expect("rules should resolve");
        assert_eq!(rules.plan("buried").hidden, vec!["hide-if-buried".to_owned()]);
    }

    #[test]
    fn empty_custom_rules_are_rejected() {
        let err = UiConfig::from_json(r#"{"visibility":{"preset":"custom"}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "visibility.rules",
                ..
            }
        ));
    }
}
