pub mod classes;
pub mod paths;
pub mod tables;

use crate::core::GenerationConfig;
use crate::selector;
use crate::types::{ElementSnapshot, Strategy, StrategyKind};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// Text longer than this is not used for text strategies.
const MAX_TEXT_LEN: usize = 50;
/// Text longer than this also gets a truncated partial-text strategy.
const PARTIAL_TEXT_THRESHOLD: usize = 10;
const PARTIAL_TEXT_LEN: usize = 20;

/// Priority bands, most resilient first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    TestAttribute,
    Semantic,
    Role,
    Text,
    Structure,
    Attribute,
    Fallback,
}

impl Tier {
    pub const ALL: [Tier; 7] = [
        Tier::TestAttribute,
        Tier::Semantic,
        Tier::Role,
        Tier::Text,
        Tier::Structure,
        Tier::Attribute,
        Tier::Fallback,
    ];

    pub fn priorities(self) -> RangeInclusive<u8> {
        match self {
            Tier::TestAttribute => 1..=5,
            Tier::Semantic => 6..=10,
            Tier::Role => 11..=12,
            Tier::Text => 13..=17,
            Tier::Structure => 18..=22,
            Tier::Attribute => 23..=29,
            Tier::Fallback => 30..=35,
        }
    }

    pub fn of(priority: u8) -> Option<Tier> {
        Tier::ALL
            .iter()
            .copied()
            .find(|tier| tier.priorities().contains(&priority))
    }

    fn slot(self, offset: u8) -> u8 {
        let range = self.priorities();
        (range.start() + offset).min(*range.end())
    }
}

pub struct StrategyGenerator {
    config: GenerationConfig,
}

impl StrategyGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generate(&self, snapshot: &ElementSnapshot) -> Vec<Strategy> {
        let mut strategies = Vec::new();

        self.test_attribute_strategies(snapshot, &mut strategies);
        self.semantic_strategies(snapshot, &mut strategies);
        self.role_strategies(snapshot, &mut strategies);
        self.text_strategies(snapshot, &mut strategies);
        self.structure_strategies(snapshot, &mut strategies);
        self.attribute_strategies(snapshot, &mut strategies);
        self.fallback_strategies(snapshot, &mut strategies);

        strategies.retain(|s| !s.selector.trim().is_empty());
        strategies.sort_by_key(|s| s.priority);

        let mut seen = HashSet::new();
        strategies.retain(|s| seen.insert(s.selector.clone()));
        strategies.truncate(self.config.max_strategies);

        debug!(
            "Generated {} strategies for <{}>",
            strategies.len(),
            snapshot.tag_name
        );
        strategies
    }

    fn test_attribute_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        for (offset, (name, reliability)) in tables::TEST_ATTRIBUTES.iter().enumerate() {
            if let Some(value) = snapshot.attribute(name) {
                out.push(
                    Strategy::new(
                        StrategyKind::TestAttribute,
                        selector::attribute(name, value),
                        Tier::TestAttribute.slot(offset as u8),
                        format!("{} attribute", name),
                    )
                    .with_reliability(*reliability),
                );
            }
        }

        if let Some(id) = test_like_id(snapshot) {
            out.push(
                Strategy::new(
                    StrategyKind::Identifier,
                    selector::id(id),
                    Tier::TestAttribute.slot(4),
                    "test-oriented id",
                )
                .with_reliability(0.8),
            );
        }
    }

    fn semantic_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        if let Some(id) = snapshot.attribute("id") {
            if test_like_id(snapshot).is_none() {
                out.push(
                    Strategy::new(
                        StrategyKind::Identifier,
                        selector::id(id),
                        Tier::Semantic.slot(0),
                        "element id",
                    )
                    .with_reliability(0.8),
                );
            }
        }

        let semantic = [
            ("aria-label", StrategyKind::AriaLabel, 0.75),
            ("aria-labelledby", StrategyKind::AriaLabel, 0.7),
            ("name", StrategyKind::Css, 0.75),
            ("for", StrategyKind::Css, 0.7),
        ];
        for (offset, (name, kind, reliability)) in semantic.iter().enumerate() {
            if let Some(value) = snapshot.attribute(name) {
                out.push(
                    Strategy::new(
                        *kind,
                        selector::attribute(name, value),
                        Tier::Semantic.slot(offset as u8 + 1),
                        format!("{} attribute", name),
                    )
                    .with_reliability(*reliability),
                );
            }
        }
    }

    fn role_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        if let Some(role) = snapshot.attribute("role") {
            out.push(
                Strategy::new(
                    StrategyKind::Role,
                    selector::attribute("role", role),
                    Tier::Role.slot(0),
                    format!("explicit role '{}'", role),
                )
                .with_reliability(0.6),
            );
            return;
        }

        if let Some(role) = tables::implicit_role(&snapshot.tag_name, &snapshot.attributes) {
            let name = snapshot
                .attribute("aria-label")
                .or_else(|| short_text(snapshot));
            out.push(
                Strategy::new(
                    StrategyKind::Role,
                    selector::role(role, name),
                    Tier::Role.slot(1),
                    format!("implicit role '{}'", role),
                )
                .with_reliability(0.55),
            );
        }
    }

    fn text_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        if let Some(text) = short_text(snapshot) {
            out.push(
                Strategy::new(
                    StrategyKind::Text,
                    selector::exact_text(text),
                    Tier::Text.slot(0),
                    "exact text",
                )
                .with_reliability(0.7),
            );

            if text.chars().count() > PARTIAL_TEXT_THRESHOLD {
                let partial: String = text.chars().take(PARTIAL_TEXT_LEN).collect();
                out.push(
                    Strategy::new(
                        StrategyKind::Text,
                        selector::partial_text(partial.trim_end()),
                        Tier::Text.slot(1),
                        "partial text",
                    )
                    .with_reliability(0.6),
                );
            }

            out.push(
                Strategy::new(
                    StrategyKind::Text,
                    selector::has_text(&snapshot.tag_name, text),
                    Tier::Text.slot(2),
                    format!("<{}> containing text", snapshot.tag_name),
                )
                .with_reliability(0.65),
            );
        }

        for (offset, (name, reliability)) in [("placeholder", 0.7), ("alt", 0.65)].iter().enumerate() {
            if let Some(value) = snapshot.attribute(name) {
                out.push(
                    Strategy::new(
                        StrategyKind::Text,
                        selector::attribute(name, value),
                        Tier::Text.slot(offset as u8 + 3),
                        format!("{} attribute", name),
                    )
                    .with_reliability(*reliability),
                );
            }
        }
    }

    fn structure_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        let tag = snapshot.tag_name.as_str();

        if let Some(class) = classes::best_class(&snapshot.classes()) {
            out.push(
                Strategy::new(
                    StrategyKind::Css,
                    selector::class(class),
                    Tier::Structure.slot(0),
                    format!("class '{}'", class),
                )
                .with_reliability(0.55),
            );
            out.push(
                Strategy::new(
                    StrategyKind::Css,
                    selector::tag_class(tag, class),
                    Tier::Structure.slot(1),
                    format!("<{}> with class '{}'", tag, class),
                )
                .with_reliability(0.6),
            );
        }

        if tag == "input" {
            if let Some(input_type) = snapshot.attribute("type") {
                out.push(
                    Strategy::new(
                        StrategyKind::Css,
                        selector::tag_attribute("input", "type", input_type),
                        Tier::Structure.slot(2),
                        format!("input of type '{}'", input_type),
                    )
                    .with_reliability(0.45),
                );
            }
        }

        if self.config.include_css_path {
            if let Some(path) = snapshot.css_path.as_deref() {
                out.push(
                    Strategy::new(
                        StrategyKind::Css,
                        path,
                        Tier::Structure.slot(3),
                        "ancestor specificity path",
                    )
                    .with_reliability(0.75),
                );
            }
        }

        out.push(
            Strategy::new(
                StrategyKind::Css,
                tag,
                Tier::Structure.slot(4),
                format!("bare <{}> tag", tag),
            )
            .with_reliability(0.2),
        );
    }

    fn attribute_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        let tag = snapshot.tag_name.as_str();

        for name in &self.config.custom_attributes {
            if let Some(value) = snapshot.attribute(name) {
                out.push(
                    Strategy::new(
                        StrategyKind::Css,
                        selector::attribute(name, value),
                        Tier::Attribute.slot(0),
                        format!("custom attribute '{}'", name),
                    )
                    .with_reliability(0.65),
                );
            }
        }

        let combinations: [(&[&str], &str, f64); 3] = [
            (&["input", "button"], "value", 0.6),
            (&["a"], "href", 0.65),
            (&["img", "iframe"], "src", 0.6),
        ];
        for (offset, (tags, name, reliability)) in combinations.iter().enumerate() {
            if !tags.contains(&tag) {
                continue;
            }
            if let Some(value) = snapshot.attribute(name) {
                out.push(
                    Strategy::new(
                        StrategyKind::Css,
                        selector::tag_attribute(tag, name, value),
                        Tier::Attribute.slot(offset as u8 + 1),
                        format!("<{}> {}", tag, name),
                    )
                    .with_reliability(*reliability),
                );
            }
        }
    }

    fn fallback_strategies(&self, snapshot: &ElementSnapshot, out: &mut Vec<Strategy>) {
        // Positionally exact, hence the high prior, yet the first strategy to
        // break when the surrounding structure changes.
        if self.config.include_xpath {
            if let Some(path) = snapshot.xpath.as_deref() {
                out.push(
                    Strategy::new(
                        StrategyKind::XPath,
                        path,
                        Tier::Fallback.slot(0),
                        "hierarchical position path",
                    )
                    .with_reliability(0.9),
                );
            }
        }

        if self.config.fallback_to_position {
            out.push(
                Strategy::new(
                    StrategyKind::Css,
                    selector::position(snapshot.rect.x, snapshot.rect.y),
                    Tier::Fallback.slot(1),
                    "screen position",
                )
                .with_reliability(0.3),
            );
        }
    }
}

impl Default for StrategyGenerator {
    fn default() -> Self {
        Self::new(GenerationConfig::default())
    }
}

fn test_like_id(snapshot: &ElementSnapshot) -> Option<&str> {
    snapshot
        .attribute("id")
        .filter(|id| tables::is_test_like_id(id))
}

fn short_text(snapshot: &ElementSnapshot) -> Option<&str> {
    snapshot
        .text_content
        .as_deref()
        .filter(|t| !t.is_empty() && t.chars().count() <= MAX_TEXT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementRect, LineageStep};

    fn submit_button() -> ElementSnapshot {
        ElementSnapshot::new("button")
            .with_attribute("data-testid", "submit-button")
            .with_id("submit-btn")
            .with_class("p-4 text-lg submit-button")
            .with_text("Submit Form")
            .with_lineage(vec![
                LineageStep::new("button"),
                LineageStep::new("form").with_id("signup"),
                LineageStep::new("body").with_position(1, 1, 2),
                LineageStep::new("html"),
            ])
    }

    fn unlimited() -> StrategyGenerator {
        StrategyGenerator::new(GenerationConfig {
            max_strategies: 100,
            ..Default::default()
        })
    }

    fn find<'a>(strategies: &'a [Strategy], selector: &str) -> Option<&'a Strategy> {
        strategies.iter().find(|s| s.selector == selector)
    }

    #[test]
    fn test_test_attribute_outranks_id() {
        let strategies = unlimited().generate(&submit_button());

        let test_id = find(&strategies, "[data-testid=\"submit-button\"]").unwrap();
        let id = find(&strategies, "#submit-btn").unwrap();
        assert!(test_id.priority < id.priority);
        assert_eq!(strategies[0].selector, "[data-testid=\"submit-button\"]");
    }

    #[test]
    fn test_priorities_match_tiers() {
        let strategies = unlimited().generate(&submit_button());

        let tier_of = |selector: &str| Tier::of(find(&strategies, selector).unwrap().priority).unwrap();
        assert_eq!(tier_of("[data-testid=\"submit-button\"]"), Tier::TestAttribute);
        assert_eq!(tier_of("#submit-btn"), Tier::Semantic);
        assert_eq!(tier_of("text=\"Submit Form\""), Tier::Text);
        assert_eq!(tier_of("button.submit-button"), Tier::Structure);
        assert_eq!(tier_of("//html/body/form/button"), Tier::Fallback);

        for pair in strategies.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        for strategy in &strategies {
            assert!(Tier::of(strategy.priority).is_some());
        }
    }

    #[test]
    fn test_text_tier_precedes_fallback_tier() {
        let strategies = unlimited().generate(&submit_button());
        let max_text = strategies
            .iter()
            .filter(|s| Tier::of(s.priority) == Some(Tier::Text))
            .map(|s| s.priority)
            .max()
            .unwrap();
        let min_fallback = strategies
            .iter()
            .filter(|s| Tier::of(s.priority) == Some(Tier::Fallback))
            .map(|s| s.priority)
            .min()
            .unwrap();
        assert!(max_text < min_fallback);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let generator = StrategyGenerator::default();
        let snapshot = submit_button();
        assert_eq!(generator.generate(&snapshot), generator.generate(&snapshot));
    }

    #[test]
    fn test_cap_is_respected() {
        let snapshot = submit_button();
        for k in 0..12 {
            let generator = StrategyGenerator::new(GenerationConfig {
                max_strategies: k,
                ..Default::default()
            });
            assert!(generator.generate(&snapshot).len() <= k);
        }
        assert!(StrategyGenerator::default().generate(&snapshot).len() <= 10);
    }

    #[test]
    fn test_best_class_excludes_utilities() {
        let strategies = unlimited().generate(&submit_button());
        assert!(find(&strategies, ".submit-button").is_some());
        assert!(find(&strategies, ".p-4").is_none());
        assert!(find(&strategies, ".text-lg").is_none());
    }

    #[test]
    fn test_test_like_id_moves_to_first_tier() {
        let snapshot = ElementSnapshot::new("button").with_id("qa-login");
        let strategies = unlimited().generate(&snapshot);

        let ids: Vec<_> = strategies
            .iter()
            .filter(|s| s.selector == "#qa-login")
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(Tier::of(ids[0].priority), Some(Tier::TestAttribute));
    }

    #[test]
    fn test_text_strategies() {
        let strategies = unlimited().generate(&submit_button());
        assert!(find(&strategies, "text=\"Submit Form\"").is_some());
        assert!(find(&strategies, "text*=\"Submit Form\"").is_some());
        assert!(find(&strategies, "button:has-text(\"Submit Form\")").is_some());
    }

    #[test]
    fn test_partial_text_is_truncated() {
        let snapshot = ElementSnapshot::new("a")
            .with_attribute("href", "/terms")
            .with_text("Read the full terms and conditions");
        let strategies = unlimited().generate(&snapshot);
        assert!(find(&strategies, "text*=\"Read the full terms\"").is_some());
    }

    #[test]
    fn test_long_text_is_skipped() {
        let long = "x".repeat(51);
        let snapshot = ElementSnapshot::new("p").with_text(&long);
        let strategies = unlimited().generate(&snapshot);
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::Text));
    }

    #[test]
    fn test_roles() {
        let explicit = ElementSnapshot::new("div").with_attribute("role", "tab");
        let strategies = unlimited().generate(&explicit);
        assert!(find(&strategies, "[role=\"tab\"]").is_some());

        let implicit = ElementSnapshot::new("input").with_attribute("type", "checkbox");
        let strategies = unlimited().generate(&implicit);
        assert!(find(&strategies, "role=checkbox").is_some());
        assert!(find(&strategies, "input[type=\"checkbox\"]").is_some());

        let strategies = unlimited().generate(&submit_button());
        assert!(find(&strategies, "role=button[name=\"Submit Form\"]").is_some());
    }

    #[test]
    fn test_semantic_attributes() {
        let snapshot = ElementSnapshot::new("input")
            .with_attribute("name", "email")
            .with_attribute("aria-label", "Email address")
            .with_attribute("placeholder", "you@example.com");
        let strategies = unlimited().generate(&snapshot);

        assert_eq!(
            find(&strategies, "[aria-label=\"Email address\"]").unwrap().kind,
            StrategyKind::AriaLabel
        );
        assert!(find(&strategies, "[name=\"email\"]").is_some());
        assert!(find(&strategies, "[placeholder=\"you@example.com\"]").is_some());
    }

    #[test]
    fn test_attribute_combinations() {
        let link = ElementSnapshot::new("a").with_attribute("href", "/pricing");
        let strategies = unlimited().generate(&link);
        assert!(find(&strategies, "a[href=\"/pricing\"]").is_some());

        let image = ElementSnapshot::new("img").with_attribute("src", "/logo.png");
        let strategies = unlimited().generate(&image);
        assert!(find(&strategies, "img[src=\"/logo.png\"]").is_some());

        let div = ElementSnapshot::new("div").with_attribute("href", "/nope");
        let strategies = unlimited().generate(&div);
        assert!(find(&strategies, "div[href=\"/nope\"]").is_none());
    }

    #[test]
    fn test_custom_attributes_in_configured_order() {
        let generator = StrategyGenerator::new(GenerationConfig {
            max_strategies: 100,
            custom_attributes: vec!["data-cy".to_string(), "data-track".to_string()],
            ..Default::default()
        });
        let snapshot = ElementSnapshot::new("span")
            .with_attribute("data-track", "promo")
            .with_attribute("data-cy", "banner");
        let strategies = generator.generate(&snapshot);

        let cy = strategies.iter().position(|s| s.selector == "[data-cy=\"banner\"]").unwrap();
        let track = strategies.iter().position(|s| s.selector == "[data-track=\"promo\"]").unwrap();
        assert!(cy < track);
        assert_eq!(Tier::of(strategies[cy].priority), Some(Tier::Attribute));
    }

    #[test]
    fn test_path_toggles() {
        let snapshot = submit_button();
        let generator = StrategyGenerator::new(GenerationConfig {
            max_strategies: 100,
            include_xpath: false,
            include_css_path: false,
            ..Default::default()
        });
        let strategies = generator.generate(&snapshot);
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::XPath));
        assert!(find(&strategies, "form#signup > button").is_none());

        let strategies = unlimited().generate(&snapshot);
        assert!(find(&strategies, "form#signup > button").is_some());
    }

    #[test]
    fn test_xpath_fallback_prior_is_high_but_last_tier() {
        let strategies = unlimited().generate(&submit_button());
        let xpath = strategies.iter().find(|s| s.kind == StrategyKind::XPath).unwrap();
        assert_eq!(xpath.reliability, Some(0.9));
        assert!(strategies
            .iter()
            .filter(|s| s.kind != StrategyKind::XPath)
            .all(|s| s.priority < xpath.priority));
    }

    #[test]
    fn test_position_fallback_only_when_enabled() {
        let snapshot = ElementSnapshot::new("canvas").with_rect(ElementRect::new(10.4, 99.6, 300.0, 150.0));
        let strategies = unlimited().generate(&snapshot);
        assert!(strategies.iter().all(|s| !s.selector.starts_with("position=")));

        let generator = StrategyGenerator::new(GenerationConfig {
            fallback_to_position: true,
            ..Default::default()
        });
        let strategies = generator.generate(&snapshot);
        let position = find(&strategies, "position=10,100").unwrap();
        assert_eq!(position.reliability, Some(0.3));
    }

    #[test]
    fn test_bare_tag_is_last_resort() {
        let strategies = unlimited().generate(&submit_button());
        let bare = find(&strategies, "button").unwrap();
        assert_eq!(bare.reliability, Some(0.2));
    }

    #[test]
    fn test_duplicates_collapse_to_best_priority() {
        let generator = StrategyGenerator::new(GenerationConfig {
            max_strategies: 100,
            custom_attributes: vec!["data-testid".to_string()],
            ..Default::default()
        });
        let strategies = generator.generate(&submit_button());
        let hits: Vec<_> = strategies
            .iter()
            .filter(|s| s.selector == "[data-testid=\"submit-button\"]")
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, StrategyKind::TestAttribute);
    }

    #[tokio::test]
    async fn test_partial_text_with_chain_separator_still_matches() {
        let doc = crate::dom::StaticDocument::parse(
            r#"<html><body><nav><a href="/p">Home >> Products page</a></nav></body></html>"#,
        );
        let handle = crate::testing::TestHelper::handle_of(&doc, "a");
        let snapshot = doc.snapshot(handle.0).unwrap();

        let partial: Vec<Strategy> = unlimited()
            .generate(&snapshot)
            .into_iter()
            .filter(|s| s.description == "partial text")
            .collect();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].selector, "text*=\"Home >> Products pag\"");

        let valid = crate::validator::StrategyValidator::default()
            .validate(partial, &doc)
            .await;
        assert_eq!(valid.len(), 1);
        assert!(valid[0].is_unique());
    }
}
