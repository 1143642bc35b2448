use crate::generator::tables;
use crate::types::{LineageStep, RawElement};
use scraper::{ElementRef, Html, Node};
use std::collections::{BTreeMap, HashMap};

/// Tags that never render content of their own.
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "meta", "link", "title",
];

/// Class names conventionally used to hide elements.
const HIDDEN_CLASSES: &[&str] = &["hidden", "d-none", "invisible"];

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Whitespace-normalized text of the whole subtree, script and style excluded.
    pub text: String,
    /// Whitespace-normalized text of direct text children only.
    pub own_text: String,
    /// Hidden itself or through an ancestor.
    pub hidden: bool,
    /// One past the arena index of the last descendant.
    pub subtree_end: usize,
}

impl NodeInfo {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|c| c.split_whitespace().any(|token| token == class))
            .unwrap_or(false)
    }

    /// Explicit role attribute, else the implicit role of the tag.
    pub fn role(&self) -> Option<&str> {
        self.attribute("role")
            .filter(|r| !r.is_empty())
            .or_else(|| tables::implicit_role(&self.tag, &self.attributes))
    }

    /// Accessible name approximation: aria-label, then text, then title/alt/value.
    pub fn accessible_name(&self) -> &str {
        if let Some(label) = self.attribute("aria-label").filter(|v| !v.trim().is_empty()) {
            return label;
        }
        if !self.text.is_empty() {
            return &self.text;
        }
        for key in ["title", "alt", "value", "placeholder"] {
            if let Some(v) = self.attribute(key).filter(|v| !v.trim().is_empty()) {
                return v;
            }
        }
        ""
    }
}

/// `scraper::Html` is not `Send`, so the parse is flattened into an arena.
/// Index `i` is element `i` of `root_element().descendants()`.
#[derive(Debug, Clone, Default)]
pub struct DomTree {
    nodes: Vec<NodeInfo>,
}

impl DomTree {
    pub fn from_html(html: &Html) -> Self {
        let mut nodes: Vec<NodeInfo> = Vec::new();
        let mut index_of = HashMap::new();

        for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
            let index = nodes.len();
            index_of.insert(element.id(), index);

            let parent = element
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|p| index_of.get(&p.id()).copied());

            let value = element.value();
            let tag = value.name().to_ascii_lowercase();
            let attributes: BTreeMap<String, String> = value
                .attrs()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect();

            let mut text_parts = Vec::new();
            collect_text(element, &mut text_parts);
            let own_parts: Vec<&str> = element
                .children()
                .filter_map(|child| match child.value() {
                    Node::Text(t) => Some(&**t),
                    _ => None,
                })
                .collect();

            let inherited_hidden = parent.map(|p: usize| nodes[p].hidden).unwrap_or(false);
            let hidden = inherited_hidden || is_hidden(&tag, &attributes);

            if let Some(p) = parent {
                nodes[p].children.push(index);
            }

            nodes.push(NodeInfo {
                text: normalize(&text_parts.join(" ")),
                own_text: normalize(&own_parts.join(" ")),
                tag,
                attributes,
                parent,
                children: Vec::new(),
                hidden,
                subtree_end: index + 1,
            });
        }

        // Preorder numbering: a subtree ends where its last descendant ends.
        for i in (0..nodes.len()).rev() {
            let end = nodes[i]
                .children
                .last()
                .map(|&c| nodes[c].subtree_end)
                .unwrap_or(i + 1);
            nodes[i].subtree_end = end;
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&NodeInfo> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    /// Top-level elements, those without an element parent.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parent.is_none())
            .collect()
    }

    pub fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        ancestor < node && self.nodes.get(ancestor).is_some_and(|a| node < a.subtree_end)
    }

    /// Nearest first.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(i) = current {
            out.push(i);
            current = self.nodes[i].parent;
        }
        out
    }

    /// Element siblings including the node itself, in document order.
    fn siblings(&self, index: usize) -> Vec<usize> {
        match self.nodes[index].parent {
            Some(p) => self.nodes[p].children.clone(),
            None => self.roots(),
        }
    }

    /// Lineage from the element up to the document root.
    pub fn lineage(&self, index: usize) -> Vec<LineageStep> {
        let mut chain = vec![index];
        chain.extend(self.ancestors(index));

        chain
            .into_iter()
            .map(|i| {
                let node = &self.nodes[i];
                let siblings = self.siblings(i);
                let same_tag: Vec<usize> = siblings
                    .iter()
                    .copied()
                    .filter(|&s| self.nodes[s].tag == node.tag)
                    .collect();
                let same_tag_index = same_tag.iter().position(|&s| s == i).unwrap_or(0) + 1;
                let child_index = siblings.iter().position(|&s| s == i).unwrap_or(0) + 1;

                let mut step = LineageStep::new(node.tag.clone()).with_position(
                    same_tag_index,
                    same_tag.len(),
                    child_index,
                );
                if let Some(id) = node.attribute("id").filter(|id| !id.is_empty()) {
                    step = step.with_id(id);
                }
                step
            })
            .collect()
    }

    /// Elements that can carry rendered text, hidden or not.
    pub fn is_content(&self, index: usize) -> bool {
        self.nodes
            .get(index)
            .is_some_and(|n| n.tag != "html" && !NON_CONTENT_TAGS.contains(&n.tag.as_str()))
    }

    /// Elements the free-text scan may consider.
    pub fn is_scannable(&self, index: usize) -> bool {
        self.nodes
            .get(index)
            .is_some_and(|n| !n.hidden)
            && self.is_content(index)
    }

    pub fn raw_element(&self, index: usize) -> Option<RawElement> {
        let node = self.nodes.get(index)?;
        let mut raw = RawElement::new(crate::types::ElementHandle(index), &node.tag);
        for (key, value) in &node.attributes {
            raw = raw.with_attribute(key, value);
        }
        Some(raw.with_text(&node.text).set_visible(!node.hidden))
    }
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => out.push(&**t),
            Node::Element(e) if matches!(e.name(), "script" | "style") => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_hidden(tag: &str, attributes: &BTreeMap<String, String>) -> bool {
    if NON_CONTENT_TAGS.contains(&tag) || attributes.contains_key("hidden") {
        return true;
    }
    if tag == "input"
        && attributes
            .get("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    if let Some(style) = attributes.get("style") {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.contains("display:none") || compact.contains("visibility:hidden") {
            return true;
        }
    }
    if let Some(class) = attributes.get("class") {
        if class.split_whitespace().any(|c| HIDDEN_CLASSES.contains(&c)) {
            return true;
        }
    }
    false
}
