//! Normalized tree to content records.

use crate::node::{Node, NodeElement};
use crate::tree::{NodeId, NodeKind, Tree};

/// Serializes the top-level element children of the tree into records.
///
/// Stray text directly under the root has no record representation and is
/// skipped; inside elements, adjacent text runs collapse into one entry.
pub(crate) fn serialize_tree(tree: &Tree) -> Vec<Node> {
    tree.children(tree.root())
        .iter()
        .copied()
        .filter(|&id| tree.is_element(id))
        .map(|id| serialize_node(tree, id))
        .collect()
}

fn serialize_node(tree: &Tree, id: NodeId) -> Node {
    match tree.kind(id) {
        NodeKind::Text(text) => Node::Text(text.clone()),
        NodeKind::Element { tag, attrs } => {
            let mut children: Vec<Node> = Vec::new();
            for &child in tree.children(id) {
                match serialize_node(tree, child) {
                    Node::Text(text) => {
                        if let Some(Node::Text(previous)) = children.last_mut() {
                            previous.push_str(&text);
                        } else if !text.is_empty() {
                            children.push(Node::Text(text));
                        }
                    }
                    node => children.push(node),
                }
            }
            Node::Element(NodeElement {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children,
            })
        }
    }
}
