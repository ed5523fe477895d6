//! An owned HTML document the search flow can mutate and serialise.
//!
//! html5ever's `RcDom` is the parser sink, but its `Rc` handles cannot cross
//! threads, so the parsed tree is copied into a slot map addressed by
//! [`NodeId`]. Removed subtrees free their slots; an id that outlived its node
//! is simply ignored by every operation.

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, QualName, parse_document};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use slotmap::{SlotMap, new_key_type};
use std::io;
use tracing::warn;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Doctype(String),
    Element {
        name: QualName,
        attrs: Vec<(QualName, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

impl Document {
    /// An empty document with just the root node.
    pub fn new() -> Document {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            data: NodeData::Document,
            parent: None,
            children: Vec::new(),
        });
        Document { nodes, root }
    }

    /// Parses a full HTML page. html5ever recovers from any malformed input,
    /// so this never fails.
    pub fn parse(html: &str) -> Document {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let mut document = Document::new();
        let root = document.root();
        for child in dom.document.children.borrow().iter() {
            document.import(child, root);
        }
        document
    }

    fn import(&mut self, handle: &Handle, parent: NodeId) {
        let data = match &handle.data {
            RcNodeData::Doctype { name, .. } => NodeData::Doctype(name.to_string()),
            RcNodeData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
            RcNodeData::Comment { contents } => NodeData::Comment(contents.to_string()),
            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let id = self.push(NodeData::Element {
                    name: name.clone(),
                    attrs: attrs
                        .borrow()
                        .iter()
                        .map(|attr| (attr.name.clone(), attr.value.to_string()))
                        .collect(),
                });
                self.append_child(parent, id);
                // <template> children live in a separate fragment
                if let Some(contents) = template_contents.borrow().as_ref() {
                    for child in contents.children.borrow().iter() {
                        self.import(child, id);
                    }
                }
                for child in handle.children.borrow().iter() {
                    self.import(child, id);
                }
                return;
            }
            // processing instructions carry nothing we render
            _ => return,
        };
        let id = self.push(data);
        self.append_child(parent, id);
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.insert(Node {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    /// A new element, not yet attached anywhere.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(NodeData::Element {
            name: html_name(tag),
            attrs: attrs
                .iter()
                .map(|(k, v)| (attr_name(k), v.to_string()))
                .collect(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Removes and frees everything under `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let Some(children) = self.nodes.get_mut(node).map(|n| std::mem::take(&mut n.children))
        else {
            return;
        };
        let mut stack = children;
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.nodes.remove(current) {
                stack.extend(removed.children);
            }
        }
    }

    /// Replaces everything under `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.contains(node) {
            return;
        }
        self.clear_children(node);
        if !text.is_empty() {
            let text = self.create_text(text);
            self.append_child(node, text);
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| &*k.local == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(node)
        {
            match attrs.iter_mut().find(|(k, _)| &*k.local == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((attr_name(name), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(node)
        {
            attrs.retain(|(k, _)| &*k.local != name);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Returns true if the class was present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.has_class(node, class) {
            return false;
        }
        let remaining = self
            .attr(node, "class")
            .unwrap_or_default()
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(node, "class", &remaining);
        true
    }

    /// Attached elements holding `class`, in document order.
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Whether `node` is alive and reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if !self.contains(current) {
                return false;
            }
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let parent = match self.nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => Some(name.clone()),
            _ => None,
        };
        self.render(node, TraversalScope::ChildrenOnly(parent))
    }

    pub fn to_html(&self) -> String {
        self.render(self.root, TraversalScope::ChildrenOnly(None))
    }

    fn render(&self, node: NodeId, traversal_scope: TraversalScope) -> String {
        let mut out = Vec::new();
        let opts = SerializeOpts {
            traversal_scope,
            ..Default::default()
        };
        if let Err(e) = serialize(&mut out, &Subtree { doc: self, node }, opts) {
            warn!("html serialisation failed: {e}");
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_node<S: Serializer>(&self, node: NodeId, serializer: &mut S) -> io::Result<()> {
        let Some(current) = self.nodes.get(node) else {
            return Ok(());
        };
        match &current.data {
            NodeData::Document => self.write_children(node, serializer),
            NodeData::Doctype(name) => serializer.write_doctype(name),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::Element { name, attrs } => {
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|(k, v)| (k, v.as_str())),
                )?;
                self.write_children(node, serializer)?;
                serializer.end_elem(name.clone())
            }
        }
    }

    fn write_children<S: Serializer>(&self, node: NodeId, serializer: &mut S) -> io::Result<()> {
        for child in self.children(node) {
            self.write_node(*child, serializer)?;
        }
        Ok(())
    }
}

struct Subtree<'a> {
    doc: &'a Document,
    node: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => self.doc.write_node(self.node, serializer),
            TraversalScope::ChildrenOnly(_) => self.doc.write_children(self.node, serializer),
        }
    }
}
