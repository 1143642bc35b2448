pub mod relational;
pub mod scoring;
pub mod synthesis;

pub use relational::RelationalMatch;
pub use synthesis::{synthesize, Scope};

use crate::core::{DocumentQuery, RelationOptions, RelationWeights, ScoringWeights};
use crate::errors::{LocatorError, MatchStage, Result};
use crate::types::{RawElement, ScoredCandidate};
use tracing::debug;

pub struct TextScanner {
    weights: ScoringWeights,
    relation: RelationWeights,
}

impl TextScanner {
    pub fn new(weights: ScoringWeights, relation: RelationWeights) -> Self {
        Self { weights, relation }
    }

    /// Scan for elements matching any of `variations`, best candidate first.
    pub async fn find_candidates<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        variations: &[String],
    ) -> Result<Vec<ScoredCandidate>> {
        let predicate = |element: &RawElement| scoring::match_text(element, variations).is_some();
        let found = document.scan_document(&predicate).await?;

        let mut candidates: Vec<ScoredCandidate> = found
            .into_iter()
            .filter_map(|element| {
                let (text, match_type) = scoring::match_text(&element, variations)?;
                Some(scoring::score(element, text, match_type, &self.weights))
            })
            .collect();

        if candidates.is_empty() {
            return Err(LocatorError::NoMatchFound {
                stage: MatchStage::Target,
                text: variations.join(" | "),
            });
        }

        scoring::rank(&mut candidates);
        debug!(
            "{} text candidates, best <{}> scoring {}",
            candidates.len(),
            candidates[0].element.tag_name,
            candidates[0].score
        );
        Ok(candidates)
    }

    pub async fn find_related<D: DocumentQuery + ?Sized>(
        &self,
        document: &D,
        target: &str,
        related: &str,
        options: &RelationOptions,
    ) -> Result<Vec<RelationalMatch>> {
        relational::scan_related(document, target, related, options, &self.relation).await
    }
}

impl Default for TextScanner {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), RelationWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHelper;

    #[tokio::test]
    async fn test_button_outranks_its_label_cell() {
        let doc = TestHelper::login_form();
        let scanner = TextScanner::default();

        let candidates = scanner
            .find_candidates(&doc, &["Sign in".to_string(), "Log in".to_string()])
            .await
            .unwrap();

        let best = &candidates[0];
        assert_eq!(best.element.tag_name, "button");
        assert_eq!(best.match_type, crate::types::MatchType::Exact);
        assert!(best.has_test_attribute);
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let doc = TestHelper::login_form();
        let err = TextScanner::default()
            .find_candidates(&doc, &["zzz-nonexistent".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LocatorError::NoMatchFound {
                stage: MatchStage::Target,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_placeholder_match() {
        let doc = TestHelper::login_form();
        let candidates = TextScanner::default()
            .find_candidates(&doc, &["you@example.com".to_string()])
            .await
            .unwrap();
        assert_eq!(candidates[0].element.attribute("name"), Some("email"));
    }
}
