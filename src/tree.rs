//! Arena-backed document tree used by the normalization passes.
//!
//! Nodes are allocated in a flat `Vec` and addressed by index, so rewrite
//! passes can hold snapshots of node ids across structural edits without
//! borrowing the tree. Detached nodes stay in the arena; passes that walk a
//! snapshot check [`Tree::is_attached`] before touching a node.
//!
//! There is no separate "tail text" concept: text following an element is an
//! ordinary sibling text node, and the run helpers below recover the
//! tail/leading-text views the passes need.

use std::io;

use html5ever::serialize::{
    serialize, Serialize as HtmlSerialize, SerializeOpts, Serializer, TraversalScope,
};
use html5ever::{ns, LocalName, QualName};

pub(crate) type NodeId = usize;

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct ArenaNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document forest under a synthetic `body` root.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<ArenaNode>,
    root: NodeId,
}

impl Tree {
    pub(crate) fn new() -> Self {
        let root = ArenaNode {
            kind: NodeKind::Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Tree {
            nodes: vec![root],
            root: 0,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(ArenaNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Allocates a detached element node.
    pub(crate) fn new_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    /// Allocates a detached text node.
    pub(crate) fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    pub(crate) fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element { .. })
    }

    pub(crate) fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Text(_))
    }

    pub(crate) fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn set_tag(&mut self, id: NodeId, tag: &str) {
        if let NodeKind::Element { tag: current, .. } = &mut self.nodes[id].kind {
            *current = tag.to_string();
        }
    }

    pub(crate) fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Sets an attribute, replacing an existing value for the same name.
    pub(crate) fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            if let Some(entry) = attrs.iter_mut().find(|(key, _)| key == name) {
                entry.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub(crate) fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            attrs.retain(|(key, _)| key != name);
        }
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id].parent?;
        self.nodes[parent].children.iter().position(|&c| c == id)
    }

    /// Whether the node is still reachable from the root.
    pub(crate) fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current == self.root
    }

    /// Removes a node (and its subtree) from its parent. No-op when already
    /// detached.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent
            && let Some(index) = self.index_in_parent(id)
        {
            self.nodes[parent].children.remove(index);
            self.nodes[id].parent = None;
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
    }

    /// Inserts `new` immediately before `reference` under the same parent.
    pub(crate) fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        self.detach(new);
        if let Some(parent) = self.nodes[reference].parent
            && let Some(index) = self.index_in_parent(reference)
        {
            self.nodes[parent].children.insert(index, new);
            self.nodes[new].parent = Some(parent);
        }
    }

    /// Inserts `new` immediately after `reference` under the same parent.
    pub(crate) fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        self.detach(new);
        if let Some(parent) = self.nodes[reference].parent
            && let Some(index) = self.index_in_parent(reference)
        {
            self.nodes[parent].children.insert(index + 1, new);
            self.nodes[new].parent = Some(parent);
        }
    }

    /// Replaces an element by its children, preserving order.
    pub(crate) fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            return;
        };
        let Some(index) = self.index_in_parent(id) else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id].children);
        for &child in &children {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes[id].parent = None;
        self.nodes[parent].children.splice(index..=index, children);
        self.coalesce_children(parent);
    }

    /// Merges adjacent text children and drops empty ones.
    pub(crate) fn coalesce_children(&mut self, parent: NodeId) {
        let children = self.nodes[parent].children.clone();
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
        for id in children {
            let Some(text) = self.text(id).map(str::to_string) else {
                merged.push(id);
                continue;
            };
            if text.is_empty() {
                self.nodes[id].parent = None;
                continue;
            }
            if let Some(&previous) = merged.last()
                && let NodeKind::Text(existing) = &mut self.nodes[previous].kind
            {
                existing.push_str(&text);
                self.nodes[id].parent = None;
            } else {
                merged.push(id);
            }
        }
        self.nodes[parent].children = merged;
    }

    pub(crate) fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let index = self.index_in_parent(id)?;
        self.nodes[parent].children[index + 1..]
            .iter()
            .copied()
            .find(|&sibling| self.is_element(sibling))
    }

    /// Siblings preceding `id`, in document order.
    pub(crate) fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.nodes[id].parent, self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.nodes[parent].children[..index].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Descendant elements of `id` in document order, excluding `id` itself.
    pub(crate) fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                found.push(node);
                stack.extend(self.nodes[node].children.iter().rev());
            }
        }
        found
    }

    /// Concatenated text of the subtree rooted at `id`.
    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let mut content = String::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match &self.nodes[node].kind {
                NodeKind::Text(text) => content.push_str(text),
                NodeKind::Element { .. } => {
                    stack.extend(self.nodes[node].children.iter().rev());
                }
            }
        }
        content
    }

    /// The run of text nodes immediately following `id` under its parent.
    pub(crate) fn tail_run(&self, id: NodeId) -> Vec<NodeId> {
        match (self.nodes[id].parent, self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.nodes[parent].children[index + 1..]
                .iter()
                .copied()
                .take_while(|&node| self.is_text(node))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn tail_text(&self, id: NodeId) -> String {
        self.tail_run(id)
            .iter()
            .filter_map(|&node| self.text(node))
            .collect()
    }

    /// Replaces the tail run of `id` with `text` (or nothing when empty).
    pub(crate) fn set_tail(&mut self, id: NodeId, text: &str) {
        for node in self.tail_run(id) {
            self.detach(node);
        }
        if !text.is_empty() {
            let node = self.new_text(text);
            self.insert_after(id, node);
        }
    }

    /// Text children of `parent` before its first element child.
    pub(crate) fn leading_text(&self, parent: NodeId) -> String {
        self.nodes[parent]
            .children
            .iter()
            .map_while(|&node| self.text(node))
            .collect()
    }

    pub(crate) fn clear_leading_text(&mut self, parent: NodeId) {
        let leading: Vec<NodeId> = self.nodes[parent]
            .children
            .iter()
            .copied()
            .take_while(|&node| self.is_text(node))
            .collect();
        for node in leading {
            self.detach(node);
        }
    }

    /// Serializes the tree to HTML, either the root element itself or only
    /// its children.
    pub(crate) fn to_html(&self, include_root: bool) -> io::Result<String> {
        let mut buffer = Vec::new();
        let scope = if include_root {
            TraversalScope::IncludeNode
        } else {
            TraversalScope::ChildrenOnly(None)
        };
        let opts = SerializeOpts {
            traversal_scope: scope,
            ..Default::default()
        };
        serialize(
            &mut buffer,
            &SerializableTree {
                tree: self,
                id: self.root,
            },
            opts,
        )?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

struct SerializableTree<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl SerializableTree<'_> {
    fn write_node<S: Serializer>(&self, id: NodeId, serializer: &mut S) -> io::Result<()> {
        match self.tree.kind(id) {
            NodeKind::Text(text) => serializer.write_text(text),
            NodeKind::Element { tag, attrs } => {
                let name = QualName::new(None, ns!(html), LocalName::from(tag.as_str()));
                let attr_names: Vec<(QualName, &str)> = attrs
                    .iter()
                    .map(|(key, value)| {
                        (
                            QualName::new(None, ns!(), LocalName::from(key.as_str())),
                            value.as_str(),
                        )
                    })
                    .collect();
                serializer.start_elem(
                    name.clone(),
                    attr_names.iter().map(|(name, value)| (name, *value)),
                )?;
                for &child in self.tree.children(id) {
                    self.write_node(child, serializer)?;
                }
                serializer.end_elem(name)
            }
        }
    }
}

impl HtmlSerialize for SerializableTree<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => self.write_node(self.id, serializer),
            TraversalScope::ChildrenOnly(_) => {
                for &child in self.tree.children(self.id) {
                    self.write_node(child, serializer)?;
                }
                Ok(())
            }
        }
    }
}
