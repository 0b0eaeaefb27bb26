pub mod css;
pub mod parser;
pub mod serialize;

use std::collections::BTreeMap;

use css::InlineStyle;

/// Stable handle to a node in a [`Document`] arena.
///
/// Node identity is handle identity: two containers with identical markup
/// are still distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
}

/// Internal DOM node representation.
///
/// Attributes live in a sorted map so serialization is deterministic.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub node_type: NodeType,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DomNode {
    fn document() -> Self {
        Self {
            tag: "#document".into(),
            attributes: BTreeMap::new(),
            text: String::new(),
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
        }
    }

    fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            node_type: NodeType::Element,
            parent: None,
            children: Vec::new(),
        }
    }

    fn leaf(node_type: NodeType, content: impl Into<String>) -> Self {
        Self {
            tag: String::new(),
            attributes: BTreeMap::new(),
            text: content.into(),
            node_type,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Mutable arena DOM. Removed nodes stay in the arena but are detached,
/// so handles held by watchers never dangle.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DomNode>,
    pub doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![DomNode::document()],
            doctype: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(DomNode::element(tag))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(DomNode::leaf(NodeType::Text, content))
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(DomNode::leaf(NodeType::Comment, content))
    }

    fn push(&mut self, node: DomNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// First `<body>` element, or the document root for fragments.
    pub fn body(&self) -> NodeId {
        self.find_descendant(self.root(), |n| n.tag == "body")
            .unwrap_or_else(|| self.root())
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `reference` (or at the end).
    /// A child that already has a parent is moved.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if parent == child {
            return;
        }
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove a node from its parent. The subtree stays intact but disconnected.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Deep-copy a subtree from another document into this one (detached).
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let src = other.node(id);
        let copy = DomNode {
            tag: src.tag.clone(),
            attributes: src.attributes.clone(),
            text: src.text.clone(),
            node_type: src.node_type,
            parent: None,
            children: Vec::new(),
        };
        let new_id = self.push(copy);
        for &child in src.children() {
            let c = self.import(other, child);
            self.append_child(new_id, c);
        }
        new_id
    }

    /// Parse an HTML fragment and append its top-level nodes under `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let fragment = parser::parse_fragment(html);
        let mut added = Vec::new();
        for &child in fragment.node(fragment.root()).children() {
            let id = self.import(&fragment, child);
            self.append_child(parent, id);
            added.push(id);
        }
        added
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.nodes[cur.0].children.iter().rev().copied());
        }
        out
    }

    pub fn find_descendant(&self, id: NodeId, pred: impl Fn(&DomNode) -> bool) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&d| self.nodes[d.0].is_element() && pred(&self.nodes[d.0]))
    }

    pub fn find_all(&self, id: NodeId, pred: impl Fn(&DomNode) -> bool) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.nodes[d.0].is_element() && pred(&self.nodes[d.0]))
            .collect()
    }

    // ------------------------------------------------------------------
    // Attributes, classes, styles
    // ------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        self.nodes[id.0]
            .attributes
            .insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes[id.0].attributes.remove(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id.0].has_class(class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut list: Vec<String> = self.nodes[id.0].classes().map(str::to_string).collect();
        list.push(class.to_string());
        self.set_attr(id, "class", list.join(" "));
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let list: Vec<&str> = self.nodes[id.0].classes().filter(|c| *c != class).collect();
        let joined = list.join(" ");
        self.set_attr(id, "class", joined);
    }

    pub fn style(&self, id: NodeId) -> InlineStyle {
        InlineStyle::parse(self.attr(id, "style").unwrap_or(""))
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let mut style = self.style(id);
        style.set(property, value);
        self.set_attr(id, "style", style.to_css());
    }
}
