use super::tree::{normalize, DomTree};
use super::xpath;
use crate::core::{DocumentQuery, ScanPredicate};
use crate::errors::{LocatorError, Result};
use crate::selector::Query;
use crate::types::{ElementHandle, ElementSnapshot, RawElement};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::debug;

/// In-memory document over parsed HTML.
///
/// There is no layout engine behind it: `position=` queries match nothing and
/// snapshots carry an empty rect.
#[derive(Debug, Clone)]
pub struct StaticDocument {
    source: String,
    tree: DomTree,
}

impl StaticDocument {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let tree = DomTree::from_html(&document);
        debug!("Parsed static document with {} elements", tree.len());

        Self {
            source: html.to_string(),
            tree,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::parse(&html))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Resolve a query to arena indices in document order.
    pub fn evaluate(&self, query: &Query) -> Result<Vec<usize>> {
        match query {
            Query::Css { selector } => self.select_css(selector),
            Query::XPath { path } => xpath::evaluate(&self.tree, path),
            Query::ExactText { text } => {
                let wanted = normalize(text);
                Ok(self.innermost(|i| self.tree.nodes()[i].text == wanted))
            }
            Query::PartialText { text } => {
                let wanted = normalize(text).to_lowercase();
                Ok(self.innermost(|i| self.tree.nodes()[i].text.to_lowercase().contains(&wanted)))
            }
            Query::HasText { css, text } => {
                let wanted = normalize(text).to_lowercase();
                Ok(self
                    .select_css(css)?
                    .into_iter()
                    .filter(|&i| self.tree.nodes()[i].text.to_lowercase().contains(&wanted))
                    .collect())
            }
            Query::Role { role, name } => {
                let wanted = name.as_deref().map(|n| normalize(n).to_lowercase());
                Ok((0..self.tree.len())
                    .filter(|&i| {
                        let node = &self.tree.nodes()[i];
                        if node.role() != Some(role.as_str()) {
                            return false;
                        }
                        match &wanted {
                            Some(name) => node.accessible_name().to_lowercase().contains(name),
                            None => true,
                        }
                    })
                    .collect())
            }
            Query::Position { .. } => Ok(vec![]),
            Query::Chain { parts } => {
                let mut current: Option<Vec<usize>> = None;
                for part in parts {
                    let matches = self.evaluate(part)?;
                    current = Some(match current {
                        None => matches,
                        Some(scopes) => matches
                            .into_iter()
                            .filter(|&m| scopes.iter().any(|&s| self.tree.is_descendant(m, s)))
                            .collect(),
                    });
                }
                Ok(current.unwrap_or_default())
            }
        }
    }

    /// Snapshot of the element at `index`, lineage and path strings included.
    pub fn snapshot(&self, index: usize) -> Result<ElementSnapshot> {
        let node = self
            .tree
            .node(index)
            .ok_or_else(|| LocatorError::ElementNotFound(format!("no element at index {}", index)))?;

        let mut snapshot = ElementSnapshot::new(&node.tag);
        for (key, value) in &node.attributes {
            snapshot = snapshot.with_attribute(key, value);
        }
        Ok(snapshot
            .with_text(&node.text)
            .with_lineage(self.tree.lineage(index)))
    }

    pub fn scan(&self, predicate: ScanPredicate<'_>) -> Vec<RawElement> {
        (0..self.tree.len())
            .filter(|&i| self.tree.is_scannable(i))
            .filter_map(|i| self.tree.raw_element(i))
            .filter(|raw| predicate(raw))
            .collect()
    }

    pub fn ancestor_elements(&self, index: usize, max_levels: usize) -> Result<Vec<RawElement>> {
        if self.tree.node(index).is_none() {
            return Err(LocatorError::ElementNotFound(format!(
                "no element at index {}",
                index
            )));
        }
        Ok(self
            .tree
            .ancestors(index)
            .into_iter()
            .take(max_levels)
            .filter_map(|i| self.tree.raw_element(i))
            .collect())
    }

    fn select_css(&self, css: &str) -> Result<Vec<usize>> {
        let selector = Selector::parse(css)
            .map_err(|e| LocatorError::invalid_strategy(css, format!("{:?}", e)))?;

        // Reparsing yields the same element order the arena was built from.
        let document = Html::parse_document(&self.source);
        Ok(document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .filter(|(_, element)| selector.matches(element))
            .map(|(i, _)| i)
            .collect())
    }

    /// Matching content elements that contain no other match.
    fn innermost<F: Fn(usize) -> bool>(&self, matches: F) -> Vec<usize> {
        let hits: Vec<usize> = (0..self.tree.len())
            .filter(|&i| self.tree.is_content(i) && matches(i))
            .collect();

        hits.iter()
            .enumerate()
            .filter(|(pos, &i)| {
                hits.get(pos + 1)
                    .map_or(true, |&next| !self.tree.is_descendant(next, i))
            })
            .map(|(_, &i)| i)
            .collect()
    }
}

#[async_trait]
impl DocumentQuery for StaticDocument {
    async fn query(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        Ok(self.evaluate(query)?.into_iter().map(ElementHandle).collect())
    }

    async fn capture_snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot> {
        self.snapshot(handle.0)
    }

    async fn scan_document(&self, predicate: ScanPredicate<'_>) -> Result<Vec<RawElement>> {
        Ok(self.scan(predicate))
    }

    async fn ancestors(&self, handle: ElementHandle, max_levels: usize) -> Result<Vec<RawElement>> {
        self.ancestor_elements(handle.0, max_levels)
    }
}
