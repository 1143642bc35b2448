use crate::errors::{LocatorError, Result};
use crate::types::StrategyKind;
use serde::{Deserialize, Serialize};

const CHAIN_SEPARATOR: &str = " >> ";
const HAS_TEXT: &str = ":has-text(";
const PARTIAL_TEXT: &str = "text*=";

/// Typed form of a strategy selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Query {
    Css { selector: String },
    XPath { path: String },
    /// Innermost elements whose normalized text equals the value.
    ExactText { text: String },
    /// Innermost elements whose text contains the value, case-insensitively.
    PartialText { text: String },
    /// Elements matching `css` whose text contains the value.
    HasText { css: String, text: String },
    Role { role: String, name: Option<String> },
    /// Elements whose rounded top-left corner sits at the given point.
    Position { x: i64, y: i64 },
    /// Each part is evaluated inside the matches of the previous one.
    Chain { parts: Vec<Query> },
}

impl Query {
    /// Parse a selector, honouring the strategy kind where it is decisive.
    pub fn parse_as(kind: StrategyKind, selector: &str) -> Result<Self> {
        match kind {
            StrategyKind::XPath => Ok(Query::XPath {
                path: selector.trim().to_string(),
            }),
            _ => Self::parse(selector),
        }
    }

    pub fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(LocatorError::invalid_strategy(selector, "empty selector"));
        }

        let parts = split_outside_quotes(selector, CHAIN_SEPARATOR);
        if parts.len() > 1 {
            let parts = parts
                .into_iter()
                .map(Self::parse_single)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Query::Chain { parts });
        }

        Self::parse_single(selector)
    }

    fn parse_single(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(LocatorError::invalid_strategy(selector, "empty chain segment"));
        }

        if selector.starts_with('/') {
            return Ok(Query::XPath {
                path: selector.to_string(),
            });
        }

        if let Some(rest) = selector.strip_prefix(PARTIAL_TEXT) {
            let (text, tail) = parse_quoted(rest.trim_start())
                .map_err(|e| LocatorError::invalid_strategy(selector, e))?;
            if !tail.trim().is_empty() {
                return Err(LocatorError::invalid_strategy(
                    selector,
                    "trailing characters after text value",
                ));
            }
            return Ok(Query::PartialText { text });
        }

        if let Some(rest) = selector.strip_prefix("text=") {
            if rest.starts_with('"') {
                let (text, tail) = parse_quoted(rest)
                    .map_err(|e| LocatorError::invalid_strategy(selector, e))?;
                if !tail.trim().is_empty() {
                    return Err(LocatorError::invalid_strategy(
                        selector,
                        "trailing characters after text value",
                    ));
                }
                return Ok(Query::ExactText { text });
            }
            let text = rest.trim();
            if text.is_empty() {
                return Err(LocatorError::invalid_strategy(selector, "empty text value"));
            }
            return Ok(Query::PartialText {
                text: text.to_string(),
            });
        }

        if let Some(rest) = selector.strip_prefix("role=") {
            return parse_role(selector, rest);
        }

        if let Some(rest) = selector.strip_prefix("position=") {
            return parse_position(selector, rest);
        }

        if let Some(at) = find_outside_quotes(selector, HAS_TEXT) {
            let css = selector[..at].trim();
            let (text, tail) = parse_quoted(&selector[at + HAS_TEXT.len()..])
                .map_err(|e| LocatorError::invalid_strategy(selector, e))?;
            if tail.trim() != ")" {
                return Err(LocatorError::invalid_strategy(
                    selector,
                    "expected ')' after :has-text value",
                ));
            }
            return Ok(Query::HasText {
                css: if css.is_empty() { "*".to_string() } else { css.to_string() },
                text,
            });
        }

        Ok(Query::Css {
            selector: selector.to_string(),
        })
    }
}

fn parse_role(selector: &str, rest: &str) -> Result<Query> {
    let (role, name) = match rest.find('[') {
        Some(open) => {
            let attr = &rest[open + 1..];
            let value = attr
                .strip_prefix("name=")
                .ok_or_else(|| LocatorError::invalid_strategy(selector, "only [name=...] is supported on roles"))?;
            let (name, tail) =
                parse_quoted(value).map_err(|e| LocatorError::invalid_strategy(selector, e))?;
            if tail.trim() != "]" {
                return Err(LocatorError::invalid_strategy(selector, "expected ']' after role name"));
            }
            (&rest[..open], Some(name))
        }
        None => (rest, None),
    };

    let role = role.trim();
    if role.is_empty() || !role.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(LocatorError::invalid_strategy(selector, "invalid role name"));
    }

    Ok(Query::Role {
        role: role.to_string(),
        name,
    })
}

fn parse_position(selector: &str, rest: &str) -> Result<Query> {
    let mut coords = rest.split(',').map(|c| c.trim().parse::<i64>());
    match (coords.next(), coords.next(), coords.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok(Query::Position { x, y }),
        _ => Err(LocatorError::invalid_strategy(
            selector,
            "expected position=<x>,<y>",
        )),
    }
}

/// Parse a leading double-quoted value; returns the unescaped value and the rest.
fn parse_quoted(input: &str) -> std::result::Result<(String, &str), &'static str> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return Err("expected a double-quoted value"),
    }

    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((value, &input[i + 1..]));
        } else {
            value.push(c);
        }
    }
    Err("unterminated quoted value")
}

/// Byte offsets of `pattern` occurrences that sit outside quoted sections.
fn quote_aware_matches(input: &str, pattern: &str) -> Vec<usize> {
    let bytes = input.as_bytes();
    let mut found = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(pattern.as_bytes()) {
                    found.push(i);
                    i += pattern.len();
                    continue;
                }
            }
        }
        i += 1;
    }
    found
}

fn find_outside_quotes(input: &str, pattern: &str) -> Option<usize> {
    quote_aware_matches(input, pattern).into_iter().next()
}

fn split_outside_quotes<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in quote_aware_matches(input, separator) {
        parts.push(&input[start..at]);
        start = at + separator.len();
    }
    parts.push(&input[start..]);
    parts
}

/// Double-quote a value for CSS, text and role selectors.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// XPath 1.0 string literal. There is no escape syntax, so values holding
/// both quote characters are spliced together with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }

    let pieces: Vec<String> = value
        .split('"')
        .map(|piece| format!("\"{}\"", piece))
        .collect();
    format!("concat({})", pieces.join(", '\"', "))
}

/// True when `value` can be written as a bare CSS identifier.
pub fn is_css_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let valid_start = first.is_ascii_alphabetic() || first == '_' || first == '-';
    let starts_with_digit_after_dash =
        first == '-' && value.chars().nth(1).is_some_and(|c| c.is_ascii_digit() || c == '-');
    valid_start
        && !starts_with_digit_after_dash
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn attribute(name: &str, value: &str) -> String {
    format!("[{}={}]", name, quote(value))
}

/// Attribute selector using a CSS match operator such as `*=` or `^=`.
pub fn attribute_op(name: &str, op: &str, value: &str) -> String {
    format!("[{}{}{}]", name, op, quote(value))
}

pub fn tag_attribute(tag: &str, name: &str, value: &str) -> String {
    format!("{}{}", tag, attribute(name, value))
}

pub fn id(value: &str) -> String {
    if is_css_identifier(value) {
        format!("#{}", value)
    } else {
        attribute("id", value)
    }
}

pub fn tag_id(tag: &str, value: &str) -> String {
    if is_css_identifier(value) {
        format!("{}#{}", tag, value)
    } else {
        tag_attribute(tag, "id", value)
    }
}

pub fn class(value: &str) -> String {
    if is_css_identifier(value) {
        format!(".{}", value)
    } else {
        attribute_op("class", "~=", value)
    }
}

pub fn tag_class(tag: &str, value: &str) -> String {
    format!("{}{}", tag, class(value))
}

pub fn exact_text(text: &str) -> String {
    format!("text={}", quote(text))
}

/// `text*="…"`; the bare `text=…` form is accepted when parsing but never emitted.
pub fn partial_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{}{}", PARTIAL_TEXT, quote(&collapsed))
}

pub fn has_text(css: &str, text: &str) -> String {
    format!("{}{}{})", css, HAS_TEXT, quote(text))
}

pub fn role(role: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("role={}[name={}]", role, quote(name)),
        None => format!("role={}", role),
    }
}

pub fn position(x: f64, y: f64) -> String {
    format!("position={},{}", x.round() as i64, y.round() as i64)
}

pub fn chain<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(CHAIN_SEPARATOR)
}
