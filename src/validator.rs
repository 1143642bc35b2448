use crate::core::{DocumentQuery, ValidationConfig};
use crate::errors::Result;
use crate::types::{ElementHandle, Strategy};
use tracing::{debug, warn};

/// Executes strategies against a live document and keeps the ones whose
/// match count falls inside the configured band.
pub struct StrategyValidator {
    config: ValidationConfig,
}

impl StrategyValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Annotates survivors with their match count and uniqueness. A strategy
    /// that fails to execute is logged and dropped; validation itself never
    /// fails.
    pub async fn validate<D: DocumentQuery + ?Sized>(
        &self,
        strategies: Vec<Strategy>,
        document: &D,
    ) -> Vec<Strategy> {
        let mut valid = Vec::with_capacity(strategies.len());

        for mut strategy in strategies {
            match document.query_by_strategy(&strategy).await {
                Ok(matches) => {
                    let count = matches.len();
                    if self.in_band(count) {
                        strategy.annotate(count);
                        valid.push(strategy);
                    } else {
                        debug!(
                            "Dropping '{}': {} matches outside {}..={}",
                            strategy.selector, count, self.config.min_matches, self.config.max_matches
                        );
                    }
                }
                Err(e) => {
                    warn!("Strategy '{}' failed to execute: {}", strategy.selector, e);
                }
            }
        }

        valid
    }

    /// Like [`validate`](Self::validate), but additionally requires that the
    /// strategy resolves to exactly `expected`.
    pub async fn validate_against<D: DocumentQuery + ?Sized>(
        &self,
        strategies: Vec<Strategy>,
        document: &D,
        expected: ElementHandle,
    ) -> Vec<Strategy> {
        let mut valid = Vec::new();

        for mut strategy in strategies {
            match document.query_by_strategy(&strategy).await {
                Ok(matches) if matches == [expected] => {
                    strategy.annotate(1);
                    valid.push(strategy);
                }
                Ok(matches) => {
                    debug!(
                        "Dropping '{}': resolves to {} elements, not {:?}",
                        strategy.selector,
                        matches.len(),
                        expected
                    );
                }
                Err(e) => {
                    warn!("Strategy '{}' failed to execute: {}", strategy.selector, e);
                }
            }
        }

        valid
    }

    /// Run a single strategy without the band filter.
    pub async fn execute<D: DocumentQuery + ?Sized>(
        &self,
        strategy: &Strategy,
        document: &D,
    ) -> Result<Vec<ElementHandle>> {
        document.query_by_strategy(strategy).await
    }

    fn in_band(&self, count: usize) -> bool {
        count >= self.config.min_matches && count <= self.config.max_matches
    }
}

impl Default for StrategyValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

/// First unique strategy, else the first strategy, else an empty string.
pub fn select_primary(strategies: &[Strategy]) -> String {
    strategies
        .iter()
        .find(|s| s.is_unique())
        .or_else(|| strategies.first())
        .map(|s| s.selector.clone())
        .unwrap_or_default()
}

/// Reliability average in which unique strategies count double, normalised
/// so a single unique strategy with reliability 1.0 scores 1.0.
pub fn confidence(strategies: &[Strategy]) -> f64 {
    if strategies.is_empty() {
        return 0.0;
    }

    let weighted: f64 = strategies
        .iter()
        .map(|s| {
            let weight = if s.is_unique() { 2.0 } else { 1.0 };
            weight * s.reliability.unwrap_or(0.5)
        })
        .sum();

    (weighted / (2.0 * strategies.len() as f64)).clamp(0.0, 1.0)
}
