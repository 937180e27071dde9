//! Wire representation of Telegraph content nodes.
//!
//! A content node is either a bare string or an element record. Element
//! records omit `attrs` and `children` entirely when empty, and attribute
//! order is preserved on the wire, so attributes live in a `Vec` of pairs
//! rather than a map type.

use serde::{Deserialize, Serialize};

/// A single content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A text run
    Text(String),
    /// An element record
    Element(NodeElement),
}

/// An element record `{tag, attrs?, children?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    /// Element name, always lowercase
    pub tag: String,
    /// Attributes in document order
    #[serde(default, with = "attr_map", skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Convenience constructor for a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Convenience constructor for an element without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(NodeElement {
            tag: tag.into(),
            attrs: Vec::new(),
            children,
        })
    }
}

/// Serializes the attribute pair list as a JSON object and back, keeping
/// insertion order.
mod attr_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(attrs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(attrs.len()))?;
        for (key, value) in attrs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AttrVisitor;

        impl<'de> Visitor<'de> for AttrVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of attribute names to string values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut attrs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    attrs.push((key, value));
                }
                Ok(attrs)
            }
        }

        deserializer.deserialize_map(AttrVisitor)
    }
}
