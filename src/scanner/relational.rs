use super::scoring;
use crate::core::{DocumentQuery, RelationOptions, RelationWeights};
use crate::errors::{LocatorError, MatchStage, Result};
use crate::types::{RawElement, ScoredCandidate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// A target candidate together with the container that ties it to the related text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationalMatch {
    pub candidate: ScoredCandidate,
    pub container: RawElement,
    /// Ancestor levels between candidate and container, 1 for the parent.
    pub distance: usize,
    pub score: i32,
}

/// Whether `element` is one of the configured container kinds. Entries of the
/// form `[role=x]` match an explicit role, anything else a tag name.
pub fn is_container(element: &RawElement, container_tags: &[String]) -> bool {
    container_tags.iter().any(|entry| {
        match entry
            .strip_prefix("[role=")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(role) => {
                let role = role.trim_matches(|c| c == '"' || c == '\'');
                element
                    .attribute("role")
                    .is_some_and(|r| r.eq_ignore_ascii_case(role))
            }
            None => element.tag_name.eq_ignore_ascii_case(entry),
        }
    })
}

/// Case-insensitive, non-overlapping occurrences of `needle` in `haystack`.
pub fn occurrences(haystack: &str, needle: &str) -> usize {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    haystack.to_lowercase().matches(needle.as_str()).count()
}

/// Specificity bonus of a container holding the related text.
pub fn container_specificity(container_text: &str, related: &str, weights: &RelationWeights) -> i32 {
    if occurrences(container_text, related) == 1 {
        weights.unique_anchor
    } else {
        let length = container_text.chars().count();
        if length < weights.short_length {
            weights.short_container
        } else if length < weights.medium_length {
            weights.medium_container
        } else {
            weights.long_container
        }
    }
}

/// Best score first; ties go to the candidate closest to its container, then
/// to scan order.
pub fn rank(matches: &mut [RelationalMatch]) {
    matches.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.distance.cmp(&b.distance),
        other => other,
    });
}

/// Find elements carrying `target` text whose nearest qualifying container
/// also carries `related` text, ranked best first.
pub async fn scan_related<D: DocumentQuery + ?Sized>(
    document: &D,
    target: &str,
    related: &str,
    options: &RelationOptions,
    weights: &RelationWeights,
) -> Result<Vec<RelationalMatch>> {
    let variations = vec![target.to_string()];
    let predicate = |element: &RawElement| scoring::match_text(element, &variations).is_some();
    let found = document.scan_document(&predicate).await?;

    if found.is_empty() {
        return Err(LocatorError::NoMatchFound {
            stage: MatchStage::Target,
            text: target.to_string(),
        });
    }
    debug!("{} candidates carry target text '{}'", found.len(), target);

    let related_lower = related.trim().to_lowercase();
    let mut matches = Vec::new();

    for element in found {
        let Some((matched_text, match_type)) = scoring::match_text(&element, &variations) else {
            continue;
        };

        let ancestors = document
            .ancestors(element.handle, options.max_ancestor_levels)
            .await?;
        let container = ancestors.into_iter().enumerate().find(|(_, ancestor)| {
            is_container(ancestor, &options.container_tags)
                && !related_lower.is_empty()
                && ancestor.text.to_lowercase().contains(&related_lower)
        });

        let Some((level, container)) = container else {
            continue;
        };

        let is_visible = scoring::is_visible(&element);
        let is_interactive = scoring::is_interactive(&element);
        let mut score = container_specificity(&container.text, related, weights);
        if is_visible {
            score += weights.visible;
        }
        if is_interactive {
            score += weights.interactive;
        }

        matches.push(RelationalMatch {
            candidate: ScoredCandidate {
                has_test_attribute: scoring::has_test_attribute(&element),
                element,
                is_visible,
                is_interactive,
                matched_text,
                match_type,
                score,
            },
            container,
            distance: level + 1,
            score,
        });
    }

    if matches.is_empty() {
        return Err(LocatorError::NoMatchFound {
            stage: MatchStage::Related,
            text: related.to_string(),
        });
    }

    rank(&mut matches);
    debug!(
        "{} candidates sit in a container with '{}', best score {}",
        matches.len(),
        related,
        matches[0].score
    );
    Ok(matches)
}
