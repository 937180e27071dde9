//! Fragment parsing: an HTML string becomes an ordered forest of arena
//! nodes under a synthetic root.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::tree::{NodeId, Tree};

/// Parses an HTML string with a spec-compliant HTML5 parser and returns the
/// `body` element of the resulting document, which holds the fragments.
///
/// The `RcDom` is returned alongside the handle: dropping it detaches every
/// node's children, so it must outlive any use of the `body` handle.
pub(crate) fn parse_body(html: &str) -> Option<(RcDom, Handle)> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let html_element = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|child| is_element_named(child, "html"))
        .cloned()?;
    let body = html_element
        .children
        .borrow()
        .iter()
        .find(|child| is_element_named(child, "body"))
        .cloned()?;
    Some((dom, body))
}

pub(crate) fn is_element_named(node: &Handle, name: &str) -> bool {
    matches!(&node.data, NodeData::Element { name: qual, .. } if qual.local.as_ref() == name)
}

/// Parses HTML into top-level fragments under a synthetic root.
///
/// All element attributes are preserved at this stage. Comments, doctypes
/// and processing instructions are dropped. When the first fragment is bare
/// text, non-whitespace text is wrapped in a synthetic `<p>` and
/// whitespace-only text is discarded; empty input yields a childless root.
pub(crate) fn parse_fragments(html: &str) -> Tree {
    let mut tree = Tree::new();
    let root = tree.root();
    if let Some((_dom, body)) = parse_body(html) {
        for child in body.children.borrow().iter() {
            convert_into(&mut tree, root, child);
        }
    }
    tree.coalesce_children(root);

    if let Some(&first) = tree.children(root).first()
        && let Some(text) = tree.text(first)
    {
        if text.trim().is_empty() {
            tree.detach(first);
        } else {
            let para = tree.new_element("p");
            tree.insert_before(first, para);
            tree.append(para, first);
        }
    }
    tree
}

fn convert_into(tree: &mut Tree, parent: NodeId, node: &Handle) {
    match &node.data {
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if !text.is_empty() {
                let id = tree.new_text(text);
                tree.append(parent, id);
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let id = tree.new_element(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                tree.set_attr(id, attr.name.local.as_ref(), &attr.value);
            }
            tree.append(parent, id);
            for child in node.children.borrow().iter() {
                convert_into(tree, id, child);
            }
        }
        // comments, doctypes and processing instructions carry no content
        _ => {}
    }
}
