use crate::generator::Tier;
use crate::selector;
use crate::types::{Strategy, StrategyKind};
use std::collections::HashSet;
use tracing::debug;

/// Words that describe selector syntax rather than the element.
const NOISE_WORDS: &[&str] = &[
    "div", "span", "button", "input", "p", "h1", "h2", "h3", "h4", "ul", "li", "form", "nav",
    "img", "svg", "tr", "td", "table", "data", "testid", "test", "aria", "label", "class",
    "name", "type", "role", "href", "value", "placeholder", "nth", "child", "has", "text",
    "contains",
];

/// Keywords in the order they appear, lowercased and deduplicated.
pub fn extract_keywords(broken: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words(broken)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !NOISE_WORDS.contains(&w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Role suggested by the selector vocabulary.
pub fn infer_role(broken: &str) -> Option<&'static str> {
    let words = words(broken);
    let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(&w.as_str()));

    if has(&["btn", "button"]) {
        Some("button")
    } else if has(&["link"]) {
        Some("link")
    } else if has(&["menu"]) {
        Some("menuitem")
    } else if has(&["input", "field"]) {
        Some("textbox")
    } else {
        None
    }
}

fn words(selector: &str) -> Vec<String> {
    selector
        .replace(
            ['#', '.', '>', '+', '~', '[', ']', '-', '_', '=', '"', '\'', '(', ')', ':', '*', '/', '@', ','],
            " ",
        )
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

fn first_slot(tier: Tier) -> u8 {
    *tier.priorities().start()
}

/// Pattern-based strategies for a selector that matched nothing.
pub fn alternatives_for(broken: &str) -> Vec<Strategy> {
    let keywords = extract_keywords(broken);
    let role = infer_role(broken);
    let mut strategies = Vec::new();

    for keyword in &keywords {
        strategies.push(
            Strategy::new(
                StrategyKind::TestAttribute,
                selector::attribute_op("data-testid", "*=", keyword),
                first_slot(Tier::TestAttribute),
                format!("test id containing '{}'", keyword),
            )
            .with_reliability(0.6),
        );
        strategies.push(
            Strategy::new(
                StrategyKind::Identifier,
                selector::attribute_op("id", "*=", keyword),
                first_slot(Tier::Semantic),
                format!("id containing '{}'", keyword),
            )
            .with_reliability(0.5),
        );
        strategies.push(
            Strategy::new(
                StrategyKind::AriaLabel,
                selector::attribute_op("aria-label", "*=", keyword),
                first_slot(Tier::Semantic) + 1,
                format!("aria-label containing '{}'", keyword),
            )
            .with_reliability(0.55),
        );
        if let Some(role) = role {
            strategies.push(
                Strategy::new(
                    StrategyKind::Role,
                    selector::role(role, Some(keyword)),
                    first_slot(Tier::Role),
                    format!("{} named like '{}'", role, keyword),
                )
                .with_reliability(0.55),
            );
        }
        strategies.push(
            Strategy::new(
                StrategyKind::Text,
                selector::partial_text(keyword),
                first_slot(Tier::Text),
                format!("text containing '{}'", keyword),
            )
            .with_reliability(0.5),
        );
        strategies.push(
            Strategy::new(
                StrategyKind::Css,
                selector::attribute_op("class", "*=", keyword),
                first_slot(Tier::Structure),
                format!("class containing '{}'", keyword),
            )
            .with_reliability(0.4),
        );
    }

    strategies.sort_by_key(|s| s.priority);
    debug!(
        "Derived {} alternatives from '{}' (keywords: {:?})",
        strategies.len(),
        broken,
        keywords
    );
    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StaticDocument;
    use crate::validator::StrategyValidator;

    #[test]
    fn test_keywords_skip_syntax_and_tags() {
        assert_eq!(
            extract_keywords("div.checkout-panel > button#place_order"),
            vec!["checkout", "panel", "place", "order"]
        );
        assert_eq!(
            extract_keywords("[data-testid=\"submit-form\"]"),
            vec!["submit"]
        );
        assert!(extract_keywords("div > span:nth-child(2)").is_empty());
    }

    #[test]
    fn test_role_inference() {
        assert_eq!(infer_role("#checkout-btn"), Some("button"));
        assert_eq!(infer_role(".nav-link"), Some("link"));
        assert_eq!(infer_role(".menu-account"), Some("menuitem"));
        assert_eq!(infer_role("#email-field"), Some("textbox"));
        assert_eq!(infer_role(".banner"), None);
    }

    #[test]
    fn test_alternatives_cover_each_pattern() {
        let alternatives = alternatives_for("#checkout-btn");
        let selectors: Vec<_> = alternatives.iter().map(|s| s.selector.as_str()).collect();

        assert!(selectors.contains(&"[data-testid*=\"checkout\"]"));
        assert!(selectors.contains(&"[id*=\"checkout\"]"));
        assert!(selectors.contains(&"[aria-label*=\"checkout\"]"));
        assert!(selectors.contains(&"role=button[name=\"checkout\"]"));
        assert!(selectors.contains(&"text*=\"checkout\""));
        assert!(selectors.contains(&"[class*=\"checkout\"]"));
        assert!(alternatives.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_nothing_to_work_with() {
        assert!(alternatives_for("div > span").is_empty());
    }

    #[tokio::test]
    async fn test_alternatives_find_the_renamed_element() {
        // `#checkout-btn` was renamed; the button still says "Checkout".
        let doc = StaticDocument::parse(
            r#"<html><body><button id="place-order" class="cta">Checkout</button></body></html>"#,
        );
        let valid = StrategyValidator::default()
            .validate(alternatives_for("#checkout-btn"), &doc)
            .await;

        let selectors: Vec<_> = valid.iter().map(|s| s.selector.as_str()).collect();
        assert!(selectors.contains(&"role=button[name=\"checkout\"]"));
        assert!(selectors.contains(&"text*=\"checkout\""));
        assert!(valid.iter().all(|s| s.is_unique()));
    }
}
