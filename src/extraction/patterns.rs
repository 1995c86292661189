//! Issue categories and their detection patterns.
//!
//! The category set is closed. Each category maps to exactly one
//! case-insensitive pattern; `GeneralError` is a catch-all, so a single log
//! region may land in several categories.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fixed issue classification.
///
/// Declaration order is the iteration order used everywhere (candidate maps,
/// issue insertion order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EntityUnavailable,
    AutomationError,
    ScriptError,
    #[serde(alias = "configuration_error")]
    ConfigError,
    IntegrationError,
    GeneralError,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EntityUnavailable,
        Category::AutomationError,
        Category::ScriptError,
        Category::ConfigError,
        Category::IntegrationError,
        Category::GeneralError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EntityUnavailable => "entity_unavailable",
            Category::AutomationError => "automation_error",
            Category::ScriptError => "script_error",
            Category::ConfigError => "config_error",
            Category::IntegrationError => "integration_error",
            Category::GeneralError => "general_error",
        }
    }

    /// Human readable form: `script_error` -> `Script Error`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Category name with spaces, as used in prompts.
    pub fn phrase(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Detection pattern for this category.
    pub fn pattern(&self) -> &'static Regex {
        match self {
            Category::EntityUnavailable => &*ENTITY_UNAVAILABLE_PATTERN,
            Category::AutomationError => &*AUTOMATION_ERROR_PATTERN,
            Category::ScriptError => &*SCRIPT_ERROR_PATTERN,
            Category::ConfigError => &*CONFIG_ERROR_PATTERN,
            Category::IntegrationError => &*INTEGRATION_ERROR_PATTERN,
            Category::GeneralError => &*GENERAL_ERROR_PATTERN,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "entity_unavailable" => Ok(Category::EntityUnavailable),
            "automation_error" => Ok(Category::AutomationError),
            "script_error" => Ok(Category::ScriptError),
            "config_error" | "configuration_error" => Ok(Category::ConfigError),
            "integration_error" => Ok(Category::IntegrationError),
            "general_error" => Ok(Category::GeneralError),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

lazy_static! {
    static ref ENTITY_UNAVAILABLE_PATTERN: Regex = Regex::new(
        r"(?i)(Entity|Device) .+? (is unavailable|not available|could not be found|not found|not responding)"
    ).unwrap();

    static ref AUTOMATION_ERROR_PATTERN: Regex = Regex::new(
        r"(?i)(Error|Exception) (executing|running|in) automation .+?"
    ).unwrap();

    static ref SCRIPT_ERROR_PATTERN: Regex = Regex::new(
        r"(?i)(Error|Exception) (executing|running|in) script .+?"
    ).unwrap();

    static ref CONFIG_ERROR_PATTERN: Regex = Regex::new(
        r"(?i)(Invalid|Error in|Failed) config(uration)? .+?"
    ).unwrap();

    static ref INTEGRATION_ERROR_PATTERN: Regex = Regex::new(
        r"(?i)(Error|Failed|Exception) (setting up|loading|initializing) (platform|integration|component) .+?"
    ).unwrap();

    static ref GENERAL_ERROR_PATTERN: Regex = Regex::new(
        r"(?i)(Error|Exception|Failed|Traceback|WARNING|ERROR)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert_eq!("configuration_error".parse::<Category>(), Ok(Category::ConfigError));
        assert_eq!("Script-Error".parse::<Category>(), Ok(Category::ScriptError));
        assert!("disk_full".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_title() {
        assert_eq!(Category::EntityUnavailable.title(), "Entity Unavailable");
        assert_eq!(Category::ConfigError.title(), "Config Error");
        assert_eq!(Category::GeneralError.phrase(), "general error");
    }

    #[test]
    fn test_category_serde_names() {
        assert_eq!(
            serde_json::to_string(&Category::IntegrationError).unwrap(),
            r#""integration_error""#
        );
        let parsed: Category = serde_json::from_str(r#""configuration_error""#).unwrap();
        assert_eq!(parsed, Category::ConfigError);
    }

    #[test]
    fn test_entity_unavailable_pattern() {
        let pattern = Category::EntityUnavailable.pattern();
        assert!(pattern.is_match("Entity light.kitchen is unavailable"));
        assert!(pattern.is_match("device sensor.porch not responding"));
        assert!(!pattern.is_match("Entity light.kitchen turned on"));
    }

    #[test]
    fn test_specific_patterns() {
        assert!(Category::AutomationError
            .pattern()
            .is_match("Error executing automation automation.wake_up: boom"));
        assert!(Category::ScriptError
            .pattern()
            .is_match("Exception in script script.goodnight: bad"));
        assert!(Category::ConfigError
            .pattern()
            .is_match("Invalid config for [light]: required key not provided"));
        assert!(Category::IntegrationError
            .pattern()
            .is_match("Error setting up integration hue: timeout"));
    }

    #[test]
    fn test_general_pattern_is_catch_all() {
        let pattern = Category::GeneralError.pattern();
        assert!(pattern.is_match("WARNING (MainThread) something odd"));
        assert!(pattern.is_match("Traceback (most recent call last):"));
        assert!(pattern.is_match("setup failed"));
        assert!(!pattern.is_match("INFO (MainThread) Started"));
    }
}
