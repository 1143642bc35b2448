use once_cell::sync::Lazy;
use regex::Regex;

static UTILITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // spacing: p-4, mx-2, mt-10
        r"^(p|m)[trblxy]?-\d+$",
        // text size: text-sm, text-2xl
        r"^text-(xs|sm|base|lg|xl|\d*xl)$",
        // sizing: w-64, h-8
        r"^(w|h)-\d+$",
        // colours: bg-blue-500, text-white, border-gray-200
        r"^(bg|text|border)-\w+(-\d+)?$",
        r"^(flex|block|inline|hidden)$",
        // hashed or generated names
        r"^[a-z0-9]{6,}$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

pub fn is_utility_class(class: &str) -> bool {
    UTILITY_PATTERNS.iter().any(|re| re.is_match(class))
}

/// First non-utility class, else the first class at all.
pub fn best_class<'a>(classes: &[&'a str]) -> Option<&'a str> {
    classes
        .iter()
        .copied()
        .find(|c| !is_utility_class(c))
        .or_else(|| classes.first().copied())
}
