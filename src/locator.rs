use crate::composite::CompositeLocator;
use crate::core::{DocumentQuery, LocatorConfig, RelationOptions};
use crate::errors::{LocatorError, Result};
use crate::generator::StrategyGenerator;
use crate::heal;
use crate::scanner::{synthesize, Scope, TextScanner};
use crate::types::{ElementHandle, ElementSnapshot, LocatorResult, Strategy};
use crate::validator::{self, StrategyValidator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Introspection record for one selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyReport {
    pub all_strategies: Vec<Strategy>,
    pub valid_strategies: Vec<Strategy>,
    pub recommended_selector: String,
}

/// Entry point tying generation, validation, scanning and composition together.
pub struct SmartLocator {
    config: LocatorConfig,
    generator: StrategyGenerator,
    validator: StrategyValidator,
    scanner: TextScanner,
}

impl SmartLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self {
            generator: StrategyGenerator::new(config.generation.clone()),
            validator: StrategyValidator::new(config.validation.clone()),
            scanner: TextScanner::new(config.scoring.clone(), config.relation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Strategies for a snapshot, without touching a document. Nothing is
    /// validated yet, so the primary is the first strategy and confidence
    /// reflects the priors alone.
    pub fn generate_strategies(&self, snapshot: &ElementSnapshot) -> LocatorResult {
        let strategies = self.generator.generate(snapshot);
        LocatorResult {
            primary_selector: validator::select_primary(&strategies),
            confidence: validator::confidence(&strategies),
            strategies,
            element: snapshot.clone(),
        }
    }

    /// Capture, generate and validate in one go.
    pub async fn locate<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        handle: ElementHandle,
    ) -> Result<LocatorResult> {
        let snapshot = document.capture_snapshot(handle).await?;
        let generated = self.generator.generate(&snapshot);
        let strategies = self.validator.validate(generated, document).await;

        let primary_selector = validator::select_primary(&strategies);
        let confidence = validator::confidence(&strategies);
        info!(
            "Located <{}>: primary '{}' with confidence {:.2} from {} strategies",
            snapshot.tag_name,
            primary_selector,
            confidence,
            strategies.len()
        );

        Ok(LocatorResult {
            strategies,
            primary_selector,
            confidence,
            element: snapshot,
        })
    }

    pub async fn validate_strategies<D: DocumentQuery + ?Sized>(
        &self,
        strategies: Vec<Strategy>,
        document: &D,
    ) -> Vec<Strategy> {
        self.validator.validate(strategies, document).await
    }

    pub fn build_composite_locator(&self, strategies: Vec<Strategy>) -> Result<CompositeLocator> {
        CompositeLocator::new(strategies)
    }

    /// Locate an element from any of several phrasings of its visible text.
    pub async fn find_by_text<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        variations: &[String],
    ) -> Result<CompositeLocator> {
        let candidates = self.scanner.find_candidates(document, variations).await?;
        let winner = &candidates[0];

        let synthesized = synthesize(&winner.element, &winner.matched_text, None);
        let strategies = self
            .confirm(synthesized, document, winner.element.handle, self.config.relation_options.max_strategies)
            .await;
        CompositeLocator::new(strategies)
    }

    /// Locate an element carrying `target` text inside the container that
    /// also carries `related` text.
    pub async fn find_by_related_text<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        target: &str,
        related: &str,
        options: Option<&RelationOptions>,
    ) -> Result<CompositeLocator> {
        let options = options.unwrap_or(&self.config.relation_options);
        let matches = self
            .scanner
            .find_related(document, target, related, options)
            .await?;
        let best = &matches[0];
        info!(
            "Related-text match: <{}> in <{}> scoring {}",
            best.candidate.element.tag_name, best.container.tag_name, best.score
        );

        let synthesized = synthesize(
            &best.candidate.element,
            target,
            Some(Scope {
                container: &best.container,
                related_text: related,
            }),
        );
        let strategies = self
            .confirm(synthesized, document, best.candidate.element.handle, options.max_strategies)
            .await;
        CompositeLocator::new(strategies)
    }

    /// Generate and validate strategies for whatever `selector` currently resolves to.
    pub async fn describe_strategies<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        selector: &str,
    ) -> Result<StrategyReport> {
        let query = crate::selector::Query::parse(selector)?;
        let handle = document
            .query(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LocatorError::ElementNotFound(selector.to_string()))?;

        let snapshot = document.capture_snapshot(handle).await?;
        let all_strategies = self.generator.generate(&snapshot);
        let valid_strategies = self.validator.validate(all_strategies.clone(), document).await;
        let recommended_selector = validator::select_primary(&valid_strategies);

        Ok(StrategyReport {
            all_strategies,
            valid_strategies,
            recommended_selector,
        })
    }

    /// Validated alternatives for a selector that no longer resolves.
    pub async fn suggest_alternatives<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        broken: &str,
    ) -> Vec<Strategy> {
        let alternatives = heal::alternatives_for(broken);
        self.validator.validate(alternatives, document).await
    }

    /// Keep synthesized strategies that single out `expected`; failing that,
    /// any that validate; failing that, the unvalidated list.
    async fn confirm<D: DocumentQuery + ?Sized>(
        &self,
        synthesized: Vec<Strategy>,
        document: &D,
        expected: ElementHandle,
        limit: usize,
    ) -> Vec<Strategy> {
        let mut strategies = self
            .validator
            .validate_against(synthesized.clone(), document, expected)
            .await;
        if strategies.is_empty() {
            debug!("No synthesized strategy singles out {:?}, relaxing", expected);
            strategies = self.validator.validate(synthesized.clone(), document).await;
        }
        if strategies.is_empty() {
            strategies = synthesized;
        }
        strategies.truncate(limit.max(1));
        strategies
    }
}

impl Default for SmartLocator {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}
