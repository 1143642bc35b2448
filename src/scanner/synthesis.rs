use crate::generator::tables;
use crate::selector;
use crate::types::{RawElement, Strategy, StrategyKind};

/// The container a winner was found in and the text that identified it.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub container: &'a RawElement,
    pub related_text: &'a str,
}

impl<'a> Scope<'a> {
    /// `//tr[contains(@class,"row")][contains(., "iPhone")]`
    fn xpath(&self) -> String {
        let mut path = format!("//{}", self.container.tag_name);
        if let Some(class) = self.container.first_class() {
            path.push_str(&format!(
                "[contains(@class,{})]",
                selector::xpath_literal(class)
            ));
        }
        path.push_str(&format!(
            "[contains(., {})]",
            selector::xpath_literal(self.related_text)
        ));
        path
    }

    /// `tr.row:has-text("iPhone")`
    fn css(&self) -> String {
        let base = match self.container.first_class() {
            Some(class) => selector::tag_class(&self.container.tag_name, class),
            None => self.container.tag_name.clone(),
        };
        selector::has_text(&base, self.related_text)
    }
}

struct Checklist {
    strategies: Vec<Strategy>,
}

impl Checklist {
    fn push(&mut self, slot: u8, kind: StrategyKind, selector: String, reliability: f64, description: &str) {
        self.strategies.push(
            Strategy::new(kind, selector, slot, description).with_reliability(reliability),
        );
    }
}

/// Run the attribute checklist against `target`. Each entry is emitted only
/// when its attribute or condition is present; the checklist position is the
/// strategy priority.
pub fn synthesize(target: &RawElement, target_text: &str, scope: Option<Scope<'_>>) -> Vec<Strategy> {
    let tag = target.tag_name.as_str();
    let within = scope.map(|s| s.xpath()).unwrap_or_default();
    let row_css = scope.map(|s| s.css());
    let scoped = |css: String| match &row_css {
        Some(row) => selector::chain(&[row.as_str(), css.as_str()]),
        None => css,
    };
    let xpath_attr = |name: &str, value: &str| {
        format!(
            "{}//{}[@{}={}]",
            within,
            tag,
            name,
            selector::xpath_literal(value)
        )
    };

    let mut list = Checklist {
        strategies: Vec::new(),
    };

    if let Some(id) = target.attribute("id") {
        list.push(1, StrategyKind::Identifier, selector::id(id), 0.98, "element id");
    }

    if let Some((name, value)) = tables::SCAN_TEST_ATTRIBUTES
        .iter()
        .find_map(|name| target.attribute(name).map(|v| (*name, v)))
    {
        list.push(
            2,
            StrategyKind::TestAttribute,
            selector::attribute(name, value),
            0.95,
            "test attribute",
        );
    }

    if let Some(name) = target.attribute("name") {
        list.push(3, StrategyKind::Css, selector::tag_attribute(tag, "name", name), 0.9, "name attribute");
    }

    if let Some(role) = target.attribute("role") {
        list.push(
            4,
            StrategyKind::XPath,
            format!("{}//*[@role={}]", within, selector::xpath_literal(role)),
            0.85,
            "role within container",
        );
    }

    let scoped_attributes: [(&str, Option<&str>, u8, f64); 5] = [
        ("href", Some("a"), 5, 0.88),
        ("alt", Some("img"), 6, 0.85),
        ("title", None, 7, 0.85),
        ("placeholder", Some("input"), 8, 0.88),
        ("type", Some("input"), 9, 0.8),
    ];
    for (name, only_tag, slot, reliability) in scoped_attributes {
        if only_tag.is_some_and(|t| t != tag) {
            continue;
        }
        if let Some(value) = target.attribute(name) {
            list.push(
                slot,
                StrategyKind::XPath,
                xpath_attr(name, value),
                reliability,
                &format!("{} within container", name),
            );
        }
    }

    if let Some(value) = target.attribute("value") {
        list.push(
            10,
            StrategyKind::Css,
            scoped(selector::tag_attribute(tag, "value", value)),
            0.85,
            "value within row",
        );
        list.push(11, StrategyKind::XPath, xpath_attr("value", value), 0.82, "value within row");
    }

    let text = target_text.trim();
    if !text.is_empty() {
        list.push(
            12,
            StrategyKind::Css,
            scoped(selector::has_text(tag, text)),
            0.9,
            "text within container",
        );
        list.push(
            13,
            StrategyKind::XPath,
            format!("{}//{}[contains(., {})]", within, tag, selector::xpath_literal(text)),
            0.85,
            "text within container",
        );

        if let Some(class) = scope.and_then(|s| s.container.first_class()) {
            list.push(
                14,
                StrategyKind::Text,
                selector::chain(&[selector::class(class), selector::exact_text(text)]),
                0.75,
                "container class and text",
            );
        }
    }

    list.strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementHandle;

    fn row() -> RawElement {
        RawElement::new(ElementHandle(10), "tr")
            .with_attribute("class", "product-row featured")
            .with_text("iPhone 15 Pro $999 Add to Cart")
    }

    fn button() -> RawElement {
        RawElement::new(ElementHandle(12), "button")
            .with_attribute("class", "add-to-cart")
            .with_attribute("value", "ip15")
            .with_text("Add to Cart")
    }

    fn selectors(strategies: &[Strategy]) -> Vec<&str> {
        strategies.iter().map(|s| s.selector.as_str()).collect()
    }

    #[test]
    fn test_scoped_checklist() {
        let row = row();
        let strategies = synthesize(
            &button(),
            "Add to Cart",
            Some(Scope {
                container: &row,
                related_text: "iPhone 15 Pro",
            }),
        );

        assert_eq!(
            selectors(&strategies),
            vec![
                "tr.product-row:has-text(\"iPhone 15 Pro\") >> button[value=\"ip15\"]",
                "//tr[contains(@class,\"product-row\")][contains(., \"iPhone 15 Pro\")]//button[@value=\"ip15\"]",
                "tr.product-row:has-text(\"iPhone 15 Pro\") >> button:has-text(\"Add to Cart\")",
                "//tr[contains(@class,\"product-row\")][contains(., \"iPhone 15 Pro\")]//button[contains(., \"Add to Cart\")]",
                ".product-row >> text=\"Add to Cart\"",
            ]
        );
        assert!(strategies.windows(2).all(|w| w[0].priority < w[1].priority));
        assert!(strategies
            .iter()
            .all(|s| (0.75..=0.98).contains(&s.reliability.unwrap())));
    }

    #[test]
    fn test_identity_attributes_come_first() {
        let target = button()
            .with_attribute("id", "buy")
            .with_attribute("data-qa", "buy-button")
            .with_attribute("name", "buy");
        let strategies = synthesize(&target, "Add to Cart", None);
        assert_eq!(&selectors(&strategies)[..3], &["#buy", "[data-qa=\"buy-button\"]", "button[name=\"buy\"]"]);
        assert_eq!(strategies[0].reliability, Some(0.98));
    }

    #[test]
    fn test_unscoped_uses_document_scope() {
        let strategies = synthesize(&button(), "Add to Cart", None);
        let all = selectors(&strategies);
        assert!(all.contains(&"button[value=\"ip15\"]"));
        assert!(all.contains(&"//button[@value=\"ip15\"]"));
        assert!(all.contains(&"//button[contains(., \"Add to Cart\")]"));
        assert!(all.iter().all(|s| !s.contains(">> text=")));
    }

    #[test]
    fn test_tag_specific_entries() {
        let link = RawElement::new(ElementHandle(1), "a")
            .with_attribute("href", "/pricing")
            .with_attribute("title", "Pricing")
            .with_attribute("role", "menuitem");
        let all: Vec<String> = synthesize(&link, "", None)
            .into_iter()
            .map(|s| s.selector)
            .collect();
        assert_eq!(
            all,
            vec![
                "//*[@role=\"menuitem\"]".to_string(),
                "//a[@href=\"/pricing\"]".to_string(),
                "//a[@title=\"Pricing\"]".to_string(),
            ]
        );

        let input = RawElement::new(ElementHandle(2), "input")
            .with_attribute("placeholder", "Search")
            .with_attribute("type", "search")
            .with_attribute("href", "/ignored");
        let all: Vec<String> = synthesize(&input, "", None)
            .into_iter()
            .map(|s| s.selector)
            .collect();
        assert_eq!(
            all,
            vec![
                "//input[@placeholder=\"Search\"]".to_string(),
                "//input[@type=\"search\"]".to_string(),
            ]
        );
    }
}
