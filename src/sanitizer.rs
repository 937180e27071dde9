//! HTML sanitization: legacy-markup rewrites, allow-list cleaning and
//! whitespace collapsing.
//!
//! The sanitizer is a string-to-string transform. It never fails: malformed
//! markup is recovered by the HTML5 parser, and anything that cannot be
//! represented in the restricted element set is unwrapped or deleted.

use std::cell::RefCell;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData, SerializableHandle};

use crate::fragment::parse_body;
use crate::tags;
use crate::whitespace::rewrite_outside_preformatted;

/// Sanitizes raw HTML into a cleaned fragment string.
///
/// Steps, in order:
/// 1. String-level rewrites: `h1` becomes `h3`, `b` becomes `strong`,
///    `h2`/`h5`/`h6` become `h4`, Telegram post widgets become iframes, and
///    any `<head>` section is removed.
/// 2. Parse and clean against the allow-list: unsafe elements (`script`,
///    `style`, `form`, ...) are deleted with their subtrees, other
///    disallowed elements are replaced by their children, and only
///    `src`/`href`/`class` attributes survive. `javascript:` and
///    `vbscript:` URLs are dropped. Comments, doctypes and processing
///    instructions are removed.
/// 3. Whitespace collapse outside `<pre>`/`<code>`, then runs of `<br>`
///    tags become single newlines, and leading/trailing spaces and tabs
///    are trimmed.
pub fn sanitize_html(html: &str) -> String {
    let rewritten = rewrite_legacy_markup(html);
    let cleaned = clean_fragment(&rewritten);
    let collapsed = rewrite_outside_preformatted(&cleaned, " ");
    let folded = tags::BR_RUN_RE.replace_all(&collapsed, "\n");
    folded.trim_matches([' ', '\t']).to_string()
}

/// String-level tag rewrites applied before parsing.
fn rewrite_legacy_markup(html: &str) -> String {
    let html = tags::H1_RE.replace_all(html, "<${1}h3");
    let html = tags::BOLD_RE.replace_all(&html, "<${1}strong${2}");
    let html = tags::HEADER_LEVEL_RE.replace_all(&html, "<${1}h4");
    let html = tags::TELEGRAM_SCRIPT_RE
        .replace_all(&html, r#"<iframe src="https://t.me/${1}"></iframe>"#);
    tags::HEAD_RE.replace_all(&html, "").into_owned()
}

/// Parses, cleans against the allow-list and re-serializes the fragments.
fn clean_fragment(html: &str) -> String {
    let Some((_dom, body)) = parse_body(html) else {
        return String::new();
    };
    clean_children(&body);
    let mut buffer = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    if serialize(&mut buffer, &SerializableHandle::from(body), opts).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Rebuilds the child list of `node`, recursing first so grandchildren
/// promoted by an unwrap are already clean.
fn clean_children(node: &Handle) {
    let original: Vec<Handle> = node.children.borrow().clone();
    let mut kept: Vec<Handle> = Vec::with_capacity(original.len());
    for child in original {
        match &child.data {
            NodeData::Text { .. } => kept.push(child.clone()),
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.as_ref().to_ascii_lowercase();
                if tags::is_unsafe_tag(&tag) {
                    continue;
                }
                clean_children(&child);
                if tags::is_allowed_tag(&tag) {
                    sanitize_attrs(attrs);
                    kept.push(child.clone());
                } else {
                    // disallowed element: promote its cleaned children,
                    // emptying its child list so its Drop cannot detach them
                    kept.extend(child.children.take());
                }
            }
            // comments, doctypes and processing instructions are dropped
            _ => {}
        }
    }
    *node.children.borrow_mut() = kept;
}

fn sanitize_attrs(attrs: &RefCell<Vec<Attribute>>) {
    attrs.borrow_mut().retain(|attr| {
        tags::is_safe_attr(attr.name.local.as_ref()) && !tags::has_unsafe_scheme(&attr.value)
    });
}
