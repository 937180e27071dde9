//! Content records back to an HTML string.

use url::Url;

use crate::error::ConversionError;
use crate::node::Node;
use crate::tree::{NodeId, Tree};
use crate::whitespace::rewrite_outside_preformatted;

/// Base used to absolutize relative links when no other is configured.
pub(crate) const DEFAULT_BASE_URL: &str = "http://telegra.ph";

/// Rebuilds an HTML string from a record array.
///
/// Attributes are applied in sorted name order, `href`/`src` values are
/// resolved against `base_url` (values that cannot be resolved are
/// discarded), and newlines outside preformatted content are re-expressed
/// as `<br/>` tags.
pub(crate) fn render_nodes(nodes: &[Node], base_url: &str) -> Result<String, ConversionError> {
    let base = Url::parse(base_url).map_err(|source| ConversionError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    let mut tree = Tree::new();
    let root = tree.root();
    for node in nodes {
        build_node(&mut tree, root, node)?;
    }
    absolutize_links(&mut tree, &base);
    let html = tree.to_html(false)?;
    Ok(rewrite_outside_preformatted(&html, "<br/>"))
}

fn build_node(tree: &mut Tree, parent: NodeId, node: &Node) -> Result<(), ConversionError> {
    match node {
        Node::Text(text) => {
            let id = tree.new_text(text.clone());
            tree.append(parent, id);
        }
        Node::Element(element) => {
            if element.tag.is_empty() {
                return Err(ConversionError::InvalidNode("empty tag".to_string()));
            }
            let id = tree.new_element(&element.tag);
            let mut attrs = element.attrs.clone();
            attrs.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, value) in &attrs {
                tree.set_attr(id, name, value);
            }
            tree.append(parent, id);
            for child in &element.children {
                build_node(tree, id, child)?;
            }
        }
    }
    Ok(())
}

fn absolutize_links(tree: &mut Tree, base: &Url) {
    let root = tree.root();
    for id in tree.descendant_elements(root) {
        for name in ["href", "src"] {
            let Some(value) = tree.attr(id, name).map(str::to_string) else {
                continue;
            };
            match base.join(&value) {
                Ok(resolved) => tree.set_attr(id, name, resolved.as_str()),
                Err(_) => tree.remove_attr(id, name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeElement};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_links_are_absolutized() {
        let nodes = vec![Node::Element(NodeElement {
            tag: "img".to_string(),
            attrs: vec![("src".to_string(), "/file/photo.jpg".to_string())],
            children: vec![],
        })];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            r#"<img src="http://telegra.ph/file/photo.jpg">"#
        );
    }

    #[test]
    fn test_absolute_links_are_untouched() {
        let nodes = vec![Node::Element(NodeElement {
            tag: "a".to_string(),
            attrs: vec![("href".to_string(), "https://telegram.org/".to_string())],
            children: vec![Node::text("site")],
        })];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            r#"<a href="https://telegram.org/">site</a>"#
        );
    }

    #[test]
    fn test_attrs_render_in_sorted_order() {
        let nodes = vec![Node::Element(NodeElement {
            tag: "a".to_string(),
            attrs: vec![
                ("target".to_string(), "_blank".to_string()),
                ("href".to_string(), "/".to_string()),
            ],
            children: vec![Node::text("x")],
        })];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            r#"<a href="http://telegra.ph/" target="_blank">x</a>"#
        );
    }

    #[test]
    fn test_newlines_become_br_tags() {
        let nodes = vec![Node::element(
            "p",
            vec![Node::text("first\nsecond")],
        )];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            "<p>first<br/>second</p>"
        );
    }

    #[test]
    fn test_newlines_inside_pre_are_kept() {
        let nodes = vec![Node::element("pre", vec![Node::text("a\nb\n")])];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            "<pre>a\nb\n</pre>"
        );
    }

    #[test]
    fn test_empty_tag_is_rejected() {
        let nodes = vec![Node::element("", vec![])];
        assert!(matches!(
            render_nodes(&nodes, DEFAULT_BASE_URL),
            Err(ConversionError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            render_nodes(&[], "not a base"),
            Err(ConversionError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_unresolvable_link_is_discarded() {
        let nodes = vec![Node::Element(NodeElement {
            tag: "a".to_string(),
            attrs: vec![("href".to_string(), "https://".to_string())],
            children: vec![Node::text("broken")],
        })];
        assert_eq!(
            render_nodes(&nodes, DEFAULT_BASE_URL).unwrap(),
            "<a>broken</a>"
        );
    }
}
