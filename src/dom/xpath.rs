use super::tree::DomTree;
use crate::errors::{LocatorError, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    /// `None` matches any element.
    name: Option<String>,
    predicates: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Attribute(String),
    /// `.`, `string(.)`, `normalize-space(.)` and `normalize-space()`.
    Context,
    /// `text()`.
    OwnText,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Position(usize),
    Last,
    Exists(Operand),
    Equals(Operand, String),
    NotEquals(Operand, String),
    Contains(Operand, String),
    StartsWith(Operand, String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// Parse `path` and return matching element indices in document order.
pub fn evaluate(tree: &DomTree, path: &str) -> Result<Vec<usize>> {
    let steps = Parser::new(path).parse_path()?;

    // `None` is the document node above the root element.
    let mut context: Vec<Option<usize>> = vec![None];

    for step in &steps {
        let mut bases: BTreeSet<Option<usize>> = BTreeSet::new();
        for &ctx in &context {
            match step.axis {
                Axis::Child => {
                    bases.insert(ctx);
                }
                Axis::DescendantOrSelf => {
                    bases.insert(ctx);
                    let range = match ctx {
                        Some(i) => i + 1..tree.node(i).map(|n| n.subtree_end).unwrap_or(i + 1),
                        None => 0..tree.len(),
                    };
                    bases.extend(range.map(Some));
                }
            }
        }

        let mut next = BTreeSet::new();
        for base in bases {
            let children = match base {
                Some(i) => tree.node(i).map(|n| n.children.clone()).unwrap_or_default(),
                None => tree.roots(),
            };
            let mut group: Vec<usize> = children
                .into_iter()
                .filter(|&c| name_matches(tree, c, step.name.as_deref()))
                .collect();

            for predicate in &step.predicates {
                let size = group.len();
                group = group
                    .iter()
                    .enumerate()
                    .filter(|(pos, &node)| test(tree, node, pos + 1, size, predicate))
                    .map(|(_, &node)| node)
                    .collect();
            }
            next.extend(group);
        }

        context = next.into_iter().map(Some).collect();
        if context.is_empty() {
            break;
        }
    }

    Ok(context.into_iter().flatten().collect())
}

fn name_matches(tree: &DomTree, index: usize, name: Option<&str>) -> bool {
    match name {
        None => true,
        Some(name) => tree
            .node(index)
            .is_some_and(|n| n.tag.eq_ignore_ascii_case(name)),
    }
}

fn operand_value(tree: &DomTree, index: usize, operand: &Operand) -> Option<String> {
    let node = tree.node(index)?;
    match operand {
        Operand::Attribute(name) => node.attribute(name).map(str::to_string),
        Operand::Context => Some(node.text.clone()),
        Operand::OwnText => Some(node.own_text.clone()),
    }
}

fn test(tree: &DomTree, index: usize, position: usize, size: usize, expr: &Expr) -> bool {
    match expr {
        Expr::Position(n) => position == *n,
        Expr::Last => position == size,
        Expr::Exists(operand) => match operand {
            Operand::Attribute(_) => operand_value(tree, index, operand).is_some(),
            _ => operand_value(tree, index, operand).is_some_and(|v| !v.is_empty()),
        },
        Expr::Equals(operand, value) => {
            operand_value(tree, index, operand).is_some_and(|v| v == *value)
        }
        Expr::NotEquals(operand, value) => {
            operand_value(tree, index, operand).is_some_and(|v| v != *value)
        }
        Expr::Contains(operand, value) => {
            operand_value(tree, index, operand).is_some_and(|v| v.contains(value.as_str()))
        }
        Expr::StartsWith(operand, value) => {
            operand_value(tree, index, operand).is_some_and(|v| v.starts_with(value.as_str()))
        }
        Expr::Not(inner) => !test(tree, index, position, size, inner),
        Expr::And(parts) => parts.iter().all(|p| test(tree, index, position, size, p)),
        Expr::Or(parts) => parts.iter().any(|p| test(tree, index, position, size, p)),
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl std::fmt::Display) -> LocatorError {
        LocatorError::invalid_strategy(
            self.source,
            format!("unsupported XPath at offset {}: {}", self.pos, reason),
        )
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let end = self.pos + keyword.len();
        if end > self.chars.len() {
            return false;
        }
        let candidate: String = self.chars[self.pos..end].iter().collect();
        if candidate == keyword {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn name(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_path(&mut self) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        if self.chars.first() != Some(&'/') {
            return Err(self.error("only absolute paths are supported"));
        }

        while self.pos < self.chars.len() {
            self.expect('/')?;
            let axis = if self.peek() == Some('/') {
                self.pos += 1;
                Axis::DescendantOrSelf
            } else {
                Axis::Child
            };

            let name = if self.eat('*') {
                None
            } else {
                Some(self.name()?)
            };

            let mut predicates = Vec::new();
            while self.eat('[') {
                predicates.push(self.parse_or()?);
                self.expect(']')?;
            }

            steps.push(Step {
                axis,
                name,
                predicates,
            });
            self.skip_ws();
        }

        if steps.is_empty() {
            return Err(self.error("empty path"));
        }
        Ok(steps)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut parts = vec![self.parse_and()?];
        while self.eat_keyword("or ") {
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Or(parts)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut parts = vec![self.parse_term()?];
        while self.eat_keyword("and ") {
            parts.push(self.parse_term()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::And(parts)
        })
    }

    fn parse_term(&mut self) -> Result<Expr> {
        self.skip_ws();

        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[start..self.pos].iter().collect();
            let n = digits
                .parse::<usize>()
                .map_err(|e| self.error(e))?;
            if n == 0 {
                return Err(self.error("positions start at 1"));
            }
            return Ok(Expr::Position(n));
        }

        if self.eat_keyword("last()") {
            return Ok(Expr::Last);
        }

        if self.eat_keyword("not(") {
            let inner = self.parse_or()?;
            self.expect(')')?;
            return Ok(Expr::Not(Box::new(inner)));
        }

        if self.eat_keyword("contains(") {
            let (operand, value) = self.parse_string_call()?;
            return Ok(Expr::Contains(operand, value));
        }

        if self.eat_keyword("starts-with(") {
            let (operand, value) = self.parse_string_call()?;
            return Ok(Expr::StartsWith(operand, value));
        }

        let operand = self.parse_operand()?;
        self.skip_ws();
        if self.eat_keyword("!=") {
            let value = self.parse_literal()?;
            return Ok(Expr::NotEquals(operand, value));
        }
        if self.eat('=') {
            let value = self.parse_literal()?;
            return Ok(Expr::Equals(operand, value));
        }
        Ok(Expr::Exists(operand))
    }

    /// Arguments of a two-argument string function, up to the closing paren.
    fn parse_string_call(&mut self) -> Result<(Operand, String)> {
        let operand = self.parse_operand()?;
        self.expect(',')?;
        let value = self.parse_literal()?;
        self.expect(')')?;
        Ok((operand, value))
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        self.skip_ws();
        if self.eat('@') {
            return Ok(Operand::Attribute(self.name()?.to_ascii_lowercase()));
        }
        if self.eat_keyword("text()") {
            return Ok(Operand::OwnText);
        }
        if self.eat_keyword("normalize-space(") || self.eat_keyword("string(") {
            let inner = if self.eat(')') {
                Operand::Context
            } else {
                let inner = self.parse_operand()?;
                self.expect(')')?;
                inner
            };
            return Ok(inner);
        }
        if self.eat('.') {
            return Ok(Operand::Context);
        }
        Err(self.error("expected @attribute, text(), '.' or normalize-space()"))
    }

    fn parse_literal(&mut self) -> Result<String> {
        self.skip_ws();
        if self.eat_keyword("concat(") {
            let mut out = String::new();
            loop {
                out.push_str(&self.parse_literal()?);
                if self.eat(')') {
                    return Ok(out);
                }
                self.expect(',')?;
            }
        }

        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a string literal")),
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated string literal"));
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"
        <html><body>
          <div id="main">
            <ul>
              <li class="item">One</li>
              <li class="item selected">Two</li>
              <li class="item">Three</li>
            </ul>
            <ul>
              <li class="item">Four</li>
            </ul>
          </div>
          <table>
            <tr class="product-row"><td>Pixel 8</td><td><button value="p8">Add to Cart</button></td></tr>
            <tr class="product-row"><td>iPhone 15 Pro</td><td><button value="ip15">Add to Cart</button></td></tr>
          </table>
          <p>It's "quoted"</p>
        </body></html>
    "#;

    fn tree() -> DomTree {
        DomTree::from_html(&Html::parse_document(PAGE))
    }

    fn texts(tree: &DomTree, path: &str) -> Vec<String> {
        evaluate(tree, path)
            .unwrap()
            .into_iter()
            .map(|i| tree.node(i).unwrap().text.clone())
            .collect()
    }

    #[test]
    fn test_absolute_and_descendant_steps() {
        let t = tree();
        assert_eq!(texts(&t, "/html/body/div/ul/li").len(), 4);
        assert_eq!(texts(&t, "//li").len(), 4);
        assert_eq!(texts(&t, "//div[@id=\"main\"]//li").len(), 4);
        assert_eq!(texts(&t, "//*[@id='main']").len(), 1);
    }

    #[test]
    fn test_position_is_relative_to_parent() {
        let t = tree();
        assert_eq!(texts(&t, "//li[2]"), vec!["Two"]);
        assert_eq!(texts(&t, "//li[1]"), vec!["One", "Four"]);
        assert_eq!(texts(&t, "//html/body/div/ul[2]/li"), vec!["Four"]);
        assert_eq!(texts(&t, "//ul/li[last()]"), vec!["Three", "Four"]);
    }

    #[test]
    fn test_attribute_predicates() {
        let t = tree();
        assert_eq!(texts(&t, "//li[contains(@class, \"selected\")]"), vec!["Two"]);
        assert_eq!(texts(&t, "//button[@value]").len(), 2);
        assert_eq!(texts(&t, "//button[@value=\"ip15\"]"), vec!["Add to Cart"]);
        assert_eq!(texts(&t, "//li[starts-with(@class, 'item sel')]"), vec!["Two"]);
    }

    #[test]
    fn test_text_predicates() {
        let t = tree();
        assert_eq!(texts(&t, "//li[text()=\"Three\"]"), vec!["Three"]);
        assert_eq!(texts(&t, "//li[normalize-space(.)='One']"), vec!["One"]);
        let rows = evaluate(&t, "//tr[contains(., \"iPhone 15 Pro\")]//button").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(t.node(rows[0]).unwrap().attribute("value"), Some("ip15"));
    }

    #[test]
    fn test_chained_predicates() {
        let t = tree();
        let hits = evaluate(
            &t,
            "//tr[contains(@class,\"product-row\")][contains(., \"Pixel 8\")]//button[contains(., \"Add to Cart\")]",
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(t.node(hits[0]).unwrap().attribute("value"), Some("p8"));
    }

    #[test]
    fn test_concat_literal() {
        let t = tree();
        let path = format!(
            "//p[normalize-space(.)={}]",
            crate::selector::xpath_literal(r#"It's "quoted""#)
        );
        assert_eq!(evaluate(&t, &path).unwrap().len(), 1);
    }

    #[test]
    fn test_boolean_operators() {
        let t = tree();
        assert_eq!(
            texts(&t, "//li[contains(@class,'item') and not(contains(@class,'selected'))]").len(),
            3
        );
        assert_eq!(texts(&t, "//li[text()='One' or text()='Four']").len(), 2);
    }

    #[test]
    fn test_results_in_document_order() {
        let t = tree();
        let hits = evaluate(&t, "//*[@class]").unwrap();
        let mut sorted = hits.clone();
        sorted.sort_unstable();
        assert_eq!(hits, sorted);
    }

    #[test]
    fn test_unsupported_syntax_is_rejected() {
        let t = tree();
        for path in ["li", "//li[", "//li[position() > 1]", "//ancestor::div", "//li[@class=unquoted]"] {
            assert!(
                matches!(evaluate(&t, path), Err(LocatorError::InvalidStrategyExecution { .. })),
                "{} should be rejected",
                path
            );
        }
    }
}
