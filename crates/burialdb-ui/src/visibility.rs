#![forbid(unsafe_code)]

//! State-dependent field visibility.
//!
//! A person's form shows or hides groups of fields depending on the value of
//! the state selector (e.g. a soldier who was killed has no discharge
//! fields). Groups are identified by marker classes such as
//! `hide-if-killed`. Every evaluation starts from "all groups visible" and
//! then hides the groups listed for the selected value, so switching between
//! values never leaves a previous value's groups stuck hidden.

use serde::Deserialize;

use crate::config::ConfigError;

/// Casualty-status selector values.
pub const CASUALTY_STATUSES: [&str; 3] = ["treated", "killed", "mia"];

/// Highest numeric state code of the later selector variant.
pub const MAX_STATE_CODE: u8 = 4;

/// Groups to hide for one selector value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisibilityRule {
    pub value: String,
    pub hide: Vec<String>,
}

/// Lookup table from selector value to hidden field groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityRules {
    rules: Vec<VisibilityRule>,
    groups: Vec<String>,
}

impl VisibilityRules {
    pub fn from_rules(rules: Vec<VisibilityRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(invalid_rules("at least one rule is required"));
        }

        let mut groups: Vec<String> = Vec::new();
        for rule in &rules {
            if rule.value.trim().is_empty() {
                return Err(invalid_rules("rule value must not be empty"));
            }
            for group in &rule.hide {
                let group = group.trim();
                if group.is_empty() || group.contains(char::is_whitespace) {
                    return Err(invalid_rules(format!(
                        "rule {:?} has an invalid group class {group:?}",
                        rule.value
                    )));
                }
                if !groups.iter().any(|known| known == group) {
                    groups.push(group.to_owned());
                }
            }
        }

        Ok(Self { rules, groups })
    }

    /// `treated` / `killed` / `mia`, each hiding its own `hide-if-*` group.
    #[must_use]
    pub fn casualty_status() -> Self {
        Self::one_group_per_value(CASUALTY_STATUSES.iter().map(|s| (*s).to_owned()), |value| {
            format!("hide-if-{value}")
        })
    }

    /// Codes `0..=4`, each hiding `hide-if-state-<code>`.
    #[must_use]
    pub fn state_codes() -> Self {
        Self::one_group_per_value((0..=MAX_STATE_CODE).map(|code| code.to_string()), |value| {
            format!("hide-if-state-{value}")
        })
    }

    fn one_group_per_value(
        values: impl Iterator<Item = String>,
        group_for: impl Fn(&str) -> String,
    ) -> Self {
        let rules: Vec<VisibilityRule> = values
            .map(|value| VisibilityRule {
                hide: vec![group_for(&value)],
                value,
            })
            .collect();
        let groups = rules.iter().flat_map(|rule| rule.hide.clone()).collect();
        Self { rules, groups }
    }

    /// Every group class any rule may hide, in first-seen order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[must_use]
    pub fn is_known_value(&self, value: &str) -> bool {
        self.rule_for(value).is_some()
    }

    fn rule_for(&self, value: &str) -> Option<&VisibilityRule> {
        let value = value.trim();
        self.rules.iter().find(|rule| rule.value.trim() == value)
    }

    /// Visibility of every group for the given selector value.
    ///
    /// Unknown values hide nothing.
    #[must_use]
    pub fn plan(&self, value: &str) -> VisibilityPlan {
        let hide: &[String] = self
            .rule_for(value)
            .map(|rule| rule.hide.as_slice())
            .unwrap_or_default();
        let (hidden, shown) = self
            .groups
            .iter()
            .cloned()
            .partition(|group| hide.iter().any(|h| h.trim() == group.as_str()));
        VisibilityPlan { shown, hidden }
    }
}

fn invalid_rules(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: "visibility.rules",
        reason: reason.into(),
    }
}

/// Result of evaluating the rules for one selector value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibilityPlan {
    pub shown: Vec<String>,
    pub hidden: Vec<String>,
}

impl VisibilityPlan {
    #[must_use]
    pub fn is_hidden(&self, group: &str) -> bool {
        self.hidden.iter().any(|g| g == group)
    }
}
