use crate::selector;
use crate::types::LineageStep;

/// Hierarchical-position path: `//html/body/ul/li[2]`.
///
/// Steps are anchored on the tag name; an index is added only when siblings
/// share the tag.
pub fn position_path(lineage: &[LineageStep]) -> Option<String> {
    if lineage.is_empty() {
        return None;
    }

    let steps: Vec<String> = lineage
        .iter()
        .rev()
        .map(|step| {
            if step.same_tag_count > 1 {
                format!("{}[{}]", step.tag, step.same_tag_index)
            } else {
                step.tag.clone()
            }
        })
        .collect();

    Some(format!("//{}", steps.join("/")))
}

/// Ancestor-specificity path: `div#main > ul > li:nth-child(2)`.
///
/// The climb stops at the first element carrying an id.
pub fn specificity_path(lineage: &[LineageStep]) -> Option<String> {
    let mut segments = Vec::new();

    for step in lineage {
        if let Some(id) = step.id.as_deref().filter(|id| !id.is_empty()) {
            segments.push(selector::tag_id(&step.tag, id));
            break;
        }
        if step.same_tag_count > 1 {
            segments.push(format!("{}:nth-child({})", step.tag, step.child_index));
        } else {
            segments.push(step.tag.clone());
        }
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join(" > "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_item_lineage() -> Vec<LineageStep> {
        vec![
            LineageStep::new("li").with_position(2, 3, 2),
            LineageStep::new("ul"),
            LineageStep::new("div").with_position(2, 2, 3),
            LineageStep::new("body").with_position(1, 1, 2),
            LineageStep::new("html"),
        ]
    }

    #[test]
    fn test_position_path_anchors_on_tag() {
        let path = position_path(&list_item_lineage()).unwrap();
        assert_eq!(path, "//html/body/div[2]/ul/li[2]");
        assert!(path.contains("li[2]"));
        assert!(!path.contains("*["));
    }

    #[test]
    fn test_first_of_several_siblings_is_indexed() {
        let lineage = vec![
            LineageStep::new("li").with_position(1, 3, 1),
            LineageStep::new("ul"),
        ];
        assert_eq!(position_path(&lineage).unwrap(), "//ul/li[1]");
    }

    #[test]
    fn test_specificity_path_uses_nth_child() {
        let path = specificity_path(&list_item_lineage()).unwrap();
        assert_eq!(path, "html > body > div:nth-child(3) > ul > li:nth-child(2)");
    }

    #[test]
    fn test_specificity_path_stops_at_id() {
        let mut lineage = list_item_lineage();
        lineage[2] = LineageStep::new("div").with_id("main").with_position(2, 2, 3);
        assert_eq!(
            specificity_path(&lineage).unwrap(),
            "div#main > ul > li:nth-child(2)"
        );
    }

    #[test]
    fn test_own_id_terminates_immediately() {
        let lineage = vec![
            LineageStep::new("button").with_id("go"),
            LineageStep::new("form"),
        ];
        assert_eq!(specificity_path(&lineage).unwrap(), "button#go");
    }

    #[test]
    fn test_empty_lineage_has_no_paths() {
        assert!(position_path(&[]).is_none());
        assert!(specificity_path(&[]).is_none());
    }
}
