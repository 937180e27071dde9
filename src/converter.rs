//! Conversion pipeline orchestration.

use log::debug;

use crate::deserializer;
use crate::error::ConversionError;
use crate::fragment;
use crate::node::Node;
use crate::normalizer;
use crate::sanitizer;
use crate::serializer;
use crate::tree::Tree;

/// Conversion options
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Sanitize and normalize input HTML; disable to convert markup
    /// verbatim, keeping all elements and attributes
    pub sanitize: bool,
    /// Base URL used to absolutize relative links when rendering records
    /// back to HTML
    pub base_url: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            sanitize: true,
            base_url: deserializer::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Converts HTML to Telegraph content records and back.
///
/// The converter holds no mutable state; one instance can serve any number
/// of conversions.
pub struct ContentConverter {
    options: ConversionOptions,
}

impl ContentConverter {
    /// Creates a converter with default options.
    pub fn new() -> Self {
        Self::with_options(ConversionOptions::default())
    }

    /// Creates a converter with custom options.
    pub fn with_options(options: ConversionOptions) -> Self {
        ContentConverter { options }
    }

    /// Converts an HTML fragment or document into content records.
    ///
    /// This operation is total: any input string, including empty, plain
    /// text or malformed markup, produces a (possibly empty) record list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use telegraph_converter::{ContentConverter, Node};
    ///
    /// let converter = ContentConverter::new();
    /// let nodes = converter.convert("<p>Hello <b>world</b></p>");
    /// assert_eq!(
    ///     nodes,
    ///     vec![Node::element("p", vec![
    ///         Node::text("Hello "),
    ///         Node::element("strong", vec![Node::text("world")]),
    ///     ])]
    /// );
    /// ```
    pub fn convert(&self, html: &str) -> Vec<Node> {
        let tree = self.build_tree(html);
        serializer::serialize_tree(&tree)
    }

    /// JSON string form of [`ContentConverter::convert`].
    pub fn convert_to_json(&self, html: &str) -> Result<String, ConversionError> {
        Ok(serde_json::to_string(&self.convert(html))?)
    }

    /// Converted content as a `<body>`-wrapped HTML string, useful for
    /// inspecting the normalized tree.
    pub fn convert_to_html_string(&self, html: &str) -> Result<String, ConversionError> {
        let tree = self.build_tree(html);
        Ok(tree.to_html(true)?)
    }

    /// Rebuilds an HTML string from content records.
    pub fn render(&self, nodes: &[Node]) -> Result<String, ConversionError> {
        deserializer::render_nodes(nodes, &self.options.base_url)
    }

    /// Rebuilds an HTML string from a JSON record array.
    ///
    /// Records missing a `tag`, or carrying an empty one, are an error.
    pub fn render_json(&self, json: &str) -> Result<String, ConversionError> {
        let nodes: Vec<Node> = serde_json::from_str(json)?;
        self.render(&nodes)
    }

    fn build_tree(&self, html: &str) -> Tree {
        if self.options.sanitize {
            let sanitized = sanitizer::sanitize_html(html);
            debug!(
                "sanitized {} input bytes into {} bytes",
                html.len(),
                sanitized.len()
            );
            let mut tree = fragment::parse_fragments(&sanitized);
            normalizer::normalize(&mut tree);
            tree
        } else {
            fragment::parse_fragments(html)
        }
    }
}

impl Default for ContentConverter {
    fn default() -> Self {
        Self::new()
    }
}
