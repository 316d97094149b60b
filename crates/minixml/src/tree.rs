//! Arena-backed document tree.
//!
//! A [`Document`] owns every node in a flat vector. Parents refer to their
//! children by [`NodeId`] and each child keeps its parent's id as a
//! back-reference used only for traversal. Dropping the document frees the
//! whole tree.
//!
//! Every query takes a `NodeId` and returns `None` (or an empty slice) when
//! the id does not belong to the document, when an index is out of range,
//! or when nothing matches. Queries never panic.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::ops::Range;

/// Tag of the synthetic node wrapping the whole document.
pub const ROOT_TAG: &str = "ROOT";

/// Index of a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A key/value pair from a start tag, with the value as written (no entity
/// decoding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One element of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    tag: String,
    text: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    span: Range<usize>,
}

impl Node {
    fn new(tag: impl Into<String>, parent: Option<NodeId>, start: usize) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
            span: start..start,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Trimmed inner text, present only when the element's first content
    /// was text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Byte range from the element's `<` to just past the `>` that closed
    /// it. Elements left open run to the end of input.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// First value stored under `key`. Duplicate keys are kept; the first
    /// one in source order wins.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

pub(crate) fn tag_matches(tag: &str, name: &str, exact: bool) -> bool {
    if exact { tag == name } else { tag.contains(name) }
}

/// A parsed document: the synthetic `ROOT` node and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    declaration: Vec<Attribute>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding only the `ROOT` node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(ROOT_TAG, None, 0)],
            declaration: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            document: self,
            id: NodeId::ROOT,
            node: &self.nodes[0],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let node = self.get(id)?;
        Some(NodeRef {
            document: self,
            id,
            node,
        })
    }

    /// Number of elements, not counting `ROOT`.
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(Node::tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::text)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.get(id) {
            Some(node) => &node.attributes,
            None => &[],
        }
    }

    /// The `index`-th child of `id`, or `None` when out of range.
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.get(id)?.attribute(key)
    }

    /// Pre-order iterator over `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.get(id).is_some() {
            vec![id]
        } else {
            Vec::new()
        };
        Descendants {
            document: self,
            stack,
        }
    }

    /// First node in pre-order, starting with `id` itself, whose tag equals
    /// `name` (`exact`) or contains it.
    pub fn find_tag(&self, id: NodeId, name: &str, exact: bool) -> Option<NodeId> {
        self.descendants(id)
            .find(|&found| self.tag(found).is_some_and(|tag| tag_matches(tag, name, exact)))
    }

    /// Every matching node in pre-order.
    pub fn find_all<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
        exact: bool,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .filter(move |&found| self.tag(found).is_some_and(|tag| tag_matches(tag, name, exact)))
    }

    /// Follow a `/`-separated path of child tags from `id`.
    ///
    /// Each segment moves to the first direct child that matches it. Empty
    /// segments are skipped, so an empty path returns `id`.
    pub fn find_by_path(&self, id: NodeId, path: &str, exact: bool) -> Option<NodeId> {
        self.get(id)?;
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(id, |current, segment| {
                self.children(current).iter().copied().find(|&child| {
                    self.tag(child)
                        .is_some_and(|tag| tag_matches(tag, segment, exact))
                })
            })
    }

    /// Pseudo-attributes of the `<?xml ...?>` declaration, if there was one.
    pub fn declaration(&self) -> &[Attribute] {
        &self.declaration
    }

    /// The `encoding` named by the XML declaration. Informational only.
    pub fn declared_encoding(&self) -> Option<&str> {
        self.declaration
            .iter()
            .find(|attr| attr.key == "encoding")
            .map(|attr| attr.value.as_str())
    }

    /// Drop every element, leaving only an empty `ROOT`.
    ///
    /// Calling this on an already released document does nothing.
    pub fn release(&mut self) {
        if self.is_empty() && self.declaration.is_empty() {
            return;
        }
        *self = Self::new();
    }

    /// Indented outline of the tree, one node per line.
    ///
    /// ```rust
    /// let doc = minixml::parse(r#"<a k="v"><b>text</b></a>"#).unwrap();
    /// assert_eq!(doc.dump(), "<ROOT>\n  <a k=\"v\">\n    <b> \"text\"\n");
    /// ```
    pub fn dump(&self) -> String {
        self.dump_node(NodeId::ROOT).unwrap_or_default()
    }

    /// Outline of the subtree rooted at `id`.
    pub fn dump_node(&self, id: NodeId) -> Option<String> {
        self.get(id)?;
        let mut out = String::new();
        let mut stack = vec![(id, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            out.push_str(&"  ".repeat(depth));
            out.push_str(&DumpLine(node).to_string());
            out.push('\n');
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Some(out)
    }

    /// The tree as nested JSON objects.
    pub fn to_json(&self) -> Value {
        self.node_to_json(NodeId::ROOT).unwrap_or(Value::Null)
    }

    /// The subtree rooted at `id` as nested JSON objects.
    pub fn node_to_json(&self, id: NodeId) -> Option<Value> {
        self.get(id)?;
        // Children always sit after their parent in the arena, so building
        // from the back sees every child before its parent.
        let mut built: Vec<Option<Value>> = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate().skip(id.0).rev() {
            let children: Vec<Value> = node
                .children
                .iter()
                .filter_map(|child| built.get_mut(child.0).and_then(Option::take))
                .collect();
            let attributes: Vec<[&str; 2]> = node
                .attributes
                .iter()
                .map(|attr| [attr.key.as_str(), attr.value.as_str()])
                .collect();

            let mut obj = json!({
                "tag": node.tag,
                "attributes": attributes,
                "children": children,
            });
            if let Some(text) = &node.text {
                obj["text"] = json!(text);
            }
            built[index] = Some(obj);
        }
        built.get_mut(id.0).and_then(Option::take)
    }

    pub(crate) fn open_element(&mut self, parent: NodeId, tag: &str, start: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent), start));
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    pub(crate) fn push_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.attributes.push(Attribute::new(key, value));
        }
    }

    /// Record `text` on `id` if it has neither text nor children yet.
    /// Returns whether the text was kept.
    pub(crate) fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) if node.text.is_none() && node.children.is_empty() => {
                node.text = Some(text.to_string());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn close_element(&mut self, id: NodeId, end: usize) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.span.end = end;
        }
    }

    pub(crate) fn set_declaration(&mut self, attributes: Vec<Attribute>) {
        self.declaration = attributes;
    }
}

struct DumpLine<'a>(&'a Node);

impl fmt::Display for DumpLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.0.tag)?;
        for attr in &self.0.attributes {
            write!(f, " {}=\"{}\"", attr.key, attr.value)?;
        }
        f.write_str(">")?;
        if let Some(text) = &self.0.text {
            write!(f, " \"{}\"", text)?;
        }
        Ok(())
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}

/// A node borrowed together with its document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    id: NodeId,
    node: &'a Node,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &self.node.tag)
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    fn wrap(&self, id: NodeId) -> Option<NodeRef<'a>> {
        self.document.node(id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn tag(&self) -> &'a str {
        &self.node.tag
    }

    pub fn text(&self) -> Option<&'a str> {
        self.node.text.as_deref()
    }

    pub fn attributes(&self) -> &'a [Attribute] {
        &self.node.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&'a str> {
        self.node.attribute(key)
    }

    pub fn span(&self) -> Range<usize> {
        self.node.span()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.node.parent?)
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let document = self.document;
        self.node
            .children
            .iter()
            .filter_map(move |&child| document.node(child))
    }

    pub fn child_at(&self, index: usize) -> Option<NodeRef<'a>> {
        self.wrap(*self.node.children.get(index)?)
    }

    pub fn find_tag(&self, name: &str, exact: bool) -> Option<NodeRef<'a>> {
        self.wrap(self.document.find_tag(self.id, name, exact)?)
    }

    pub fn find_all(self, name: &'a str, exact: bool) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let document = self.document;
        document
            .find_all(self.id, name, exact)
            .filter_map(move |id| document.node(id))
    }

    pub fn find_by_path(&self, path: &str, exact: bool) -> Option<NodeRef<'a>> {
        self.wrap(self.document.find_by_path(self.id, path, exact)?)
    }

    /// Outline of this node and everything below it.
    pub fn dump(&self) -> String {
        self.document.dump_node(self.id).unwrap_or_default()
    }

    pub fn to_json(&self) -> Value {
        self.document.node_to_json(self.id).unwrap_or(Value::Null)
    }

    pub fn descendants(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let document = self.document;
        document
            .descendants(self.id)
            .filter_map(move |id| document.node(id))
    }
}
