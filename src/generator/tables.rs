use std::collections::BTreeMap;

/// Attributes that exist only to be targeted by tests, with their reliability prior.
pub const TEST_ATTRIBUTES: &[(&str, f64)] = &[
    ("data-testid", 0.95),
    ("data-test", 0.9),
    ("data-qa", 0.9),
    ("test-id", 0.85),
];

/// Attributes the free-text scan treats as test hooks.
pub const SCAN_TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-test", "data-qa"];

/// Substrings that mark an id as test-oriented.
pub const TEST_ID_VOCABULARY: &[&str] = &[
    "test",
    "qa",
    "cypress",
    "selenium",
    "playwright",
    "automation",
];

pub fn is_test_like_id(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    TEST_ID_VOCABULARY.iter().any(|word| lower.contains(word))
}

/// Implicit ARIA role of an element, from its tag and (for inputs) its type.
pub fn implicit_role(tag: &str, attributes: &BTreeMap<String, String>) -> Option<&'static str> {
    let role = match tag {
        "button" => "button",
        "a" if attributes.contains_key("href") => "link",
        "select" => "combobox",
        "textarea" => "textbox",
        "img" => "img",
        "nav" => "navigation",
        "main" => "main",
        "header" => "banner",
        "footer" => "contentinfo",
        "aside" => "complementary",
        "section" => "region",
        "article" => "article",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "input" => return input_role(attributes.get("type").map(String::as_str)),
        _ => return None,
    };
    Some(role)
}

fn input_role(input_type: Option<&str>) -> Option<&'static str> {
    let role = match input_type.map(|t| t.to_ascii_lowercase()).as_deref() {
        Some("hidden") => return None,
        Some("button") | Some("submit") | Some("reset") | Some("image") => "button",
        Some("checkbox") => "checkbox",
        Some("radio") => "radio",
        Some("search") => "searchbox",
        Some("number") => "spinbutton",
        Some("range") => "slider",
        _ => "textbox",
    };
    Some(role)
}

/// Tags that are clickable primitives in their own right.
pub fn is_clickable_tag(tag: &str) -> bool {
    matches!(tag, "button" | "input" | "a")
}

pub fn is_interactive_tag(tag: &str) -> bool {
    matches!(tag, "button" | "input" | "a" | "select" | "textarea")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_test_like_ids() {
        assert!(is_test_like_id("login-test-btn"));
        assert!(is_test_like_id("QA_submit"));
        assert!(is_test_like_id("cypressHook"));
        assert!(!is_test_like_id("submit-btn"));
    }

    #[test]
    fn test_implicit_roles() {
        let none = attrs(&[]);
        assert_eq!(implicit_role("button", &none), Some("button"));
        assert_eq!(implicit_role("a", &none), None);
        assert_eq!(implicit_role("a", &attrs(&[("href", "/x")])), Some("link"));
        assert_eq!(implicit_role("h3", &none), Some("heading"));
        assert_eq!(implicit_role("header", &none), Some("banner"));
        assert_eq!(implicit_role("div", &none), None);
    }

    #[test]
    fn test_input_roles_follow_type() {
        let role = |t: &str| implicit_role("input", &attrs(&[("type", t)]));
        assert_eq!(role("submit"), Some("button"));
        assert_eq!(role("CHECKBOX"), Some("checkbox"));
        assert_eq!(role("radio"), Some("radio"));
        assert_eq!(role("search"), Some("searchbox"));
        assert_eq!(role("number"), Some("spinbutton"));
        assert_eq!(role("range"), Some("slider"));
        assert_eq!(role("email"), Some("textbox"));
        assert_eq!(role("hidden"), None);
        assert_eq!(implicit_role("input", &attrs(&[])), Some("textbox"));
    }
}
