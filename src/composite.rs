use crate::core::DocumentQuery;
use crate::errors::{LocatorError, Result};
use crate::types::{ElementHandle, Strategy};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Ordered fallback chain of strategies, resolved lazily: the first strategy
/// that matches anything wins.
///
/// Building one never touches a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeLocator {
    strategies: Vec<Strategy>,
}

impl CompositeLocator {
    pub fn new(mut strategies: Vec<Strategy>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(LocatorError::EmptyStrategyList);
        }
        strategies.sort_by_key(|s| s.priority);

        info!(
            "Built composite locator with {} strategies, primary '{}'",
            strategies.len(),
            strategies[0].selector
        );
        Ok(Self { strategies })
    }

    /// Try `self` first, then `other`.
    pub fn or(mut self, other: CompositeLocator) -> Self {
        self.strategies.extend(other.strategies);
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn selectors(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.selector.as_str()).collect()
    }

    pub fn primary(&self) -> &Strategy {
        &self.strategies[0]
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Walk the chain and return the first element any strategy resolves to.
    pub async fn resolve<D: DocumentQuery + ?Sized>(&self, document: &D) -> Result<ElementHandle> {
        for strategy in &self.strategies {
            match document.query_by_strategy(strategy).await {
                Ok(matches) => {
                    if let Some(&first) = matches.first() {
                        debug!(
                            "Composite resolved via '{}' ({} matches)",
                            strategy.selector,
                            matches.len()
                        );
                        return Ok(first);
                    }
                }
                Err(e) => {
                    warn!("Composite entry '{}' failed: {}", strategy.selector, e);
                }
            }
        }

        Err(LocatorError::ElementNotFound(format!(
            "none of {} strategies matched",
            self.strategies.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StaticDocument;
    use crate::types::StrategyKind;

    fn css(selector: &str, priority: u8) -> Strategy {
        Strategy::new(StrategyKind::Css, selector, priority, "test")
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(matches!(
            CompositeLocator::new(vec![]),
            Err(LocatorError::EmptyStrategyList)
        ));
    }

    #[test]
    fn test_sorted_by_priority() {
        let composite =
            CompositeLocator::new(vec![css(".b", 18), css("#a", 6), css("[data-testid=\"c\"]", 1)]).unwrap();
        assert_eq!(composite.selectors(), vec!["[data-testid=\"c\"]", "#a", ".b"]);
        assert_eq!(composite.primary().priority, 1);
    }

    #[test]
    fn test_or_appends_after_self() {
        let a = CompositeLocator::new(vec![css("#a", 6)]).unwrap();
        let b = CompositeLocator::new(vec![css("#b", 1)]).unwrap();
        let combined = a.or(b);
        assert_eq!(combined.selectors(), vec!["#a", "#b"]);
        assert_eq!(combined.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_falls_through() {
        let doc = StaticDocument::parse(r#"<html><body><p>x</p><button id="go">Go</button></body></html>"#);
        let composite =
            CompositeLocator::new(vec![css("#missing", 1), css("div[", 2), css("#go", 3)]).unwrap();

        let handle = composite.resolve(&doc).await.unwrap();
        assert_eq!(doc.tree().node(handle.0).unwrap().tag, "button");
    }

    #[test]
    fn test_resolve_reports_exhaustion() {
        let doc = StaticDocument::parse("<html><body></body></html>");
        let composite = CompositeLocator::new(vec![css("#missing", 1)]).unwrap();
        let result = tokio_test::block_on(composite.resolve(&doc));
        assert!(matches!(result, Err(LocatorError::ElementNotFound(_))));
    }
}
