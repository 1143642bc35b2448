use crate::errors::Result;
use crate::generator::paths;
use crate::selector::Query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Opaque reference to an element inside one document: its position in
/// document order among all elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub usize);

/// One level of an element's ancestry, as seen from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageStep {
    pub tag: String,
    pub id: Option<String>,
    /// 1-based position among siblings with the same tag.
    pub same_tag_index: usize,
    /// Number of siblings (self included) with the same tag.
    pub same_tag_count: usize,
    /// 1-based position among all element siblings.
    pub child_index: usize,
}

impl LineageStep {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            same_tag_index: 1,
            same_tag_count: 1,
            child_index: 1,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_position(mut self, same_tag_index: usize, same_tag_count: usize, child_index: usize) -> Self {
        self.same_tag_index = same_tag_index;
        self.same_tag_count = same_tag_count;
        self.child_index = child_index;
        self
    }
}

/// Immutable capture of one element at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub element_id: Option<String>,
    pub class_name: Option<String>,
    pub text_content: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub rect: ElementRect,
    /// Element first, document root last.
    pub lineage: Vec<LineageStep>,
    pub xpath: Option<String>,
    pub css_path: Option<String>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl ElementSnapshot {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            element_id: None,
            class_name: None,
            text_content: None,
            attributes: BTreeMap::new(),
            rect: ElementRect::default(),
            lineage: Vec::new(),
            xpath: None,
            css_path: None,
            captured_at: chrono::Utc::now(),
        }
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attribute("id", id)
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attribute("class", class)
    }

    pub fn with_text(mut self, text: &str) -> Self {
        let trimmed = text.trim();
        self.text_content = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        if key == "id" {
            self.element_id = Some(value.to_string());
        } else if key == "class" {
            self.class_name = Some(value.to_string());
        }
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = rect;
        self
    }

    /// Attach the ancestry and derive both path strings from it.
    pub fn with_lineage(mut self, lineage: Vec<LineageStep>) -> Self {
        self.xpath = paths::position_path(&lineage);
        self.css_path = paths::specificity_path(&lineage);
        self.lineage = lineage;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.class_name
            .as_deref()
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Identifier,
    TestAttribute,
    AriaLabel,
    Text,
    Role,
    Css,
    #[serde(rename = "xpath")]
    XPath,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Identifier => "id",
            StrategyKind::TestAttribute => "test-attribute",
            StrategyKind::AriaLabel => "aria-label",
            StrategyKind::Text => "text",
            StrategyKind::Role => "role",
            StrategyKind::Css => "css",
            StrategyKind::XPath => "xpath",
        }
    }
}

/// One candidate way to re-locate an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub kind: StrategyKind,
    pub selector: String,
    pub priority: u8,
    pub description: String,
    pub reliability: Option<f64>,
    pub is_unique: Option<bool>,
    pub match_count: Option<usize>,
}

impl Strategy {
    pub fn new(
        kind: StrategyKind,
        selector: impl Into<String>,
        priority: u8,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            selector: selector.into(),
            priority,
            description: description.into(),
            reliability: None,
            is_unique: None,
            match_count: None,
        }
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = Some(reliability.clamp(0.0, 1.0));
        self
    }

    /// Record what validation observed.
    pub fn annotate(&mut self, match_count: usize) {
        self.match_count = Some(match_count);
        self.is_unique = Some(match_count == 1);
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique.unwrap_or(false)
    }

    pub fn query(&self) -> Result<Query> {
        Query::parse_as(self.kind, &self.selector)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorResult {
    pub strategies: Vec<Strategy>,
    pub primary_selector: String,
    pub confidence: f64,
    pub element: ElementSnapshot,
}

/// Element record produced by a whole-document scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub handle: ElementHandle,
    pub tag_name: String,
    pub element_id: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Whitespace-normalized text content.
    pub text: String,
    pub rect: Option<ElementRect>,
    pub is_visible: bool,
    pub has_click_handler: bool,
}

impl RawElement {
    pub fn new(handle: ElementHandle, tag_name: &str) -> Self {
        Self {
            handle,
            tag_name: tag_name.to_ascii_lowercase(),
            element_id: None,
            attributes: BTreeMap::new(),
            text: String::new(),
            rect: None,
            is_visible: true,
            has_click_handler: false,
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        if key == "id" {
            self.element_id = Some(value.to_string());
        }
        if key == "onclick" {
            self.has_click_handler = true;
        }
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn set_visible(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn first_class(&self) -> Option<&str> {
        self.attribute("class")
            .and_then(|c| c.split_whitespace().next())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub element: RawElement,
    pub is_visible: bool,
    pub is_interactive: bool,
    pub has_test_attribute: bool,
    pub matched_text: String,
    pub match_type: MatchType,
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder_routes_id_and_class() {
        let snapshot = ElementSnapshot::new("BUTTON")
            .with_id("go")
            .with_class("btn primary")
            .with_text("   Go  ");

        assert_eq!(snapshot.tag_name, "button");
        assert_eq!(snapshot.element_id.as_deref(), Some("go"));
        assert_eq!(snapshot.attribute("id"), Some("go"));
        assert_eq!(snapshot.classes(), vec!["btn", "primary"]);
        assert_eq!(snapshot.text_content.as_deref(), Some("Go"));
    }

    #[test]
    fn test_blank_text_is_absent() {
        let snapshot = ElementSnapshot::new("div").with_text("  \n ");
        assert!(snapshot.text_content.is_none());
    }

    #[test]
    fn test_annotate_sets_uniqueness() {
        let mut strategy = Strategy::new(StrategyKind::Css, ".a", 18, "class");
        strategy.annotate(1);
        assert!(strategy.is_unique());
        strategy.annotate(3);
        assert!(!strategy.is_unique());
        assert_eq!(strategy.match_count, Some(3));
    }

    #[test]
    fn test_reliability_is_clamped() {
        let strategy = Strategy::new(StrategyKind::Css, ".a", 18, "class").with_reliability(1.7);
        assert_eq!(strategy.reliability, Some(1.0));
    }

    #[test]
    fn test_strategy_serializes_camel_case() {
        let strategy = Strategy::new(StrategyKind::TestAttribute, "[data-testid=\"x\"]", 1, "test id");
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["kind"], "test-attribute");
        assert!(json.get("isUnique").is_some());
    }
}
