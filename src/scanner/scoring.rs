use crate::core::ScoringWeights;
use crate::generator::tables;
use crate::types::{MatchType, RawElement, ScoredCandidate};

/// Element fields a text variation is matched against, in order.
const MATCH_ATTRIBUTES: &[&str] = &["value", "placeholder", "aria-label", "title"];

/// Shortest field that may match by being contained in the search text.
const MIN_REVERSE_MATCH_LEN: usize = 3;

/// Match an element against the supplied text variations.
///
/// A field matches when it contains a variation, or (for fields of at least
/// three characters) when a variation contains it. Comparison ignores case.
/// Exact matches anywhere win over partial ones.
pub fn match_text(element: &RawElement, variations: &[String]) -> Option<(String, MatchType)> {
    let mut fields: Vec<&str> = Vec::with_capacity(MATCH_ATTRIBUTES.len() + 1);
    if !element.text.is_empty() {
        fields.push(&element.text);
    }
    fields.extend(MATCH_ATTRIBUTES.iter().filter_map(|name| element.attribute(name)));

    let mut partial: Option<String> = None;
    for variation in variations {
        let needle = variation.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        for field in &fields {
            let haystack = field.trim().to_lowercase();
            if haystack == needle {
                return Some((variation.clone(), MatchType::Exact));
            }
            let contained = haystack.contains(&needle)
                || (haystack.chars().count() >= MIN_REVERSE_MATCH_LEN && needle.contains(&haystack));
            if contained && partial.is_none() {
                partial = Some(variation.clone());
            }
        }
    }

    partial.map(|text| (text, MatchType::Partial))
}

pub fn is_visible(element: &RawElement) -> bool {
    element.is_visible && element.rect.map_or(true, |r| r.has_area())
}

pub fn is_interactive(element: &RawElement) -> bool {
    tables::is_interactive_tag(&element.tag_name)
        || element.has_click_handler
        || element.attribute("role").is_some()
}

pub fn has_test_attribute(element: &RawElement) -> bool {
    tables::SCAN_TEST_ATTRIBUTES
        .iter()
        .any(|name| element.attribute(name).is_some())
}

pub fn score(
    element: RawElement,
    matched_text: String,
    match_type: MatchType,
    weights: &ScoringWeights,
) -> ScoredCandidate {
    let visible = is_visible(&element);
    let interactive = is_interactive(&element);
    let test_attribute = has_test_attribute(&element);

    let mut total = 0;
    if visible {
        total += weights.visible;
    }
    if interactive {
        total += weights.interactive;
    }
    if test_attribute {
        total += weights.test_attribute;
    }
    if element.attribute("id").is_some() {
        total += weights.id;
    }
    if match_type == MatchType::Exact {
        total += weights.exact_match;
    }
    if let Some(rect) = element.rect {
        if rect.width > weights.min_width && rect.height > weights.min_height {
            total += weights.reasonable_size;
        }
        if rect.width > weights.large_width || rect.height > weights.large_height {
            total -= weights.large_box_penalty;
        }
    }
    if tables::is_clickable_tag(&element.tag_name) {
        total += weights.clickable_tag;
    }

    ScoredCandidate {
        element,
        is_visible: visible,
        is_interactive: interactive,
        has_test_attribute: test_attribute,
        matched_text,
        match_type,
        score: total,
    }
}

/// Highest score first; equal scores keep scan order.
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
}
