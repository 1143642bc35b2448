use crate::errors::{LocatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocatorConfig {
    pub generation: GenerationConfig,
    pub validation: ValidationConfig,
    pub scoring: ScoringWeights,
    pub relation: RelationWeights,
    pub relation_options: RelationOptions,
}

impl LocatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LocatorConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    fn check(&self) -> Result<()> {
        let band = &self.validation;
        if band.min_matches == 0 || band.min_matches > band.max_matches {
            return Err(LocatorError::Configuration(format!(
                "match band {}..={} is empty or admits zero matches",
                band.min_matches, band.max_matches
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub max_strategies: usize,
    #[serde(rename = "includeXPath")]
    pub include_xpath: bool,
    pub include_css_path: bool,
    /// Accepted for compatibility; tier order already ranks test attributes first.
    pub prioritize_test_attributes: bool,
    pub fallback_to_position: bool,
    pub custom_attributes: Vec<String>,
}

/// Accepted match-count band for a validated strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    pub min_matches: usize,
    pub max_matches: usize,
}

/// Additive rubric for free-text scan candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    pub visible: i32,
    pub interactive: i32,
    pub test_attribute: i32,
    pub id: i32,
    pub exact_match: i32,
    pub reasonable_size: i32,
    pub clickable_tag: i32,
    pub large_box_penalty: i32,
    pub min_width: f64,
    pub min_height: f64,
    pub large_width: f64,
    pub large_height: f64,
}

/// Container specificity rubric for the related-text scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationWeights {
    pub unique_anchor: i32,
    pub short_container: i32,
    pub medium_container: i32,
    pub long_container: i32,
    pub short_length: usize,
    pub medium_length: usize,
    pub visible: i32,
    pub interactive: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationOptions {
    /// Tag names, or `[role=...]` entries matched against an explicit role.
    pub container_tags: Vec<String>,
    pub max_ancestor_levels: usize,
    pub max_strategies: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_strategies: 10,
            include_xpath: true,
            include_css_path: true,
            prioritize_test_attributes: true,
            fallback_to_position: false,
            custom_attributes: vec![],
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_matches: 1,
            max_matches: 5,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            visible: 30,
            interactive: 25,
            test_attribute: 40,
            id: 20,
            exact_match: 15,
            reasonable_size: 10,
            clickable_tag: 20,
            large_box_penalty: 15,
            min_width: 20.0,
            min_height: 10.0,
            large_width: 800.0,
            large_height: 600.0,
        }
    }
}

impl Default for RelationWeights {
    fn default() -> Self {
        Self {
            unique_anchor: 100,
            short_container: 80,
            medium_container: 60,
            long_container: 40,
            short_length: 500,
            medium_length: 1000,
            visible: 20,
            interactive: 10,
        }
    }
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            container_tags: [
                "tr",
                "li",
                "article",
                "section",
                "form",
                "fieldset",
                "div",
                "td",
                "[role=row]",
                "[role=listitem]",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            max_ancestor_levels: 8,
            max_strategies: 5,
        }
    }
}
