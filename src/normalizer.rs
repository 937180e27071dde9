//! Structural normalization passes enforcing the Telegraph content model.
//!
//! Each pass snapshots the node ids it will visit, then mutates the tree,
//! skipping nodes an earlier edit already detached. Pass order is
//! load-bearing: later passes rely on the shapes earlier passes establish.

use log::trace;

use crate::tags;
use crate::tree::{NodeId, Tree};

pub(crate) fn normalize(tree: &mut Tree) {
    flatten_quote_paragraphs(tree);
    prune_sourceless_media(tree);
    strip_markup_inside(tree, "figcaption");
    strip_markup_inside(tree, "pre");
    prune_empty_lists(tree);
    unwrap_links_around_images(tree);
    promote_multiline_code(tree);
    enforce_top_level_shape(tree);
    wrap_bare_images(tree);
    rewrite_media(tree);
    move_media_to_top(tree);
    post_process(tree);
}

/// Inside `blockquote`/`aside`/`figure`, a paragraph with text that is
/// followed by further textual content gets its trailing text replaced by a
/// newline; paragraphs directly inside `blockquote`/`aside` are then
/// unwrapped so the container holds bare text runs.
fn flatten_quote_paragraphs(tree: &mut Tree) {
    let root = tree.root();
    let separated: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| {
            tree.tag(id) == Some("p")
                && has_ancestor_in(tree, id, &["blockquote", "aside", "figure"])
                && subtree_has_text(tree, id)
                && has_following_text_sibling(tree, id)
        })
        .collect();
    for id in separated {
        tree.set_tail(id, "\n");
    }

    let paragraphs: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| {
            tree.tag(id) == Some("p") && has_ancestor_in(tree, id, &["blockquote", "aside"])
        })
        .collect();
    for id in paragraphs {
        if tree.is_attached(id) {
            tree.unwrap(id);
        }
    }
}

/// Media without a usable source is deleted: iframes lacking a `src`
/// attribute, images lacking one, and images with an inline `data:` URI.
fn prune_sourceless_media(tree: &mut Tree) {
    let root = tree.root();
    let doomed: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| match tree.tag(id) {
            Some("iframe") => tree.attr(id, "src").is_none(),
            Some("img") => match tree.attr(id, "src") {
                None => true,
                Some(src) => src.trim_start().starts_with("data:"),
            },
            _ => false,
        })
        .collect();
    for id in doomed {
        trace!("dropping sourceless media node");
        tree.detach(id);
    }
}

/// Unwraps every element nested inside containers of the given tag, leaving
/// text only. Used for `figcaption` and `pre`.
fn strip_markup_inside(tree: &mut Tree, container_tag: &str) {
    let root = tree.root();
    let mut doomed = Vec::new();
    for id in tree.descendant_elements(root) {
        if tree.tag(id) == Some(container_tag) {
            doomed.extend(tree.descendant_elements(id));
        }
    }
    for id in doomed {
        if tree.is_attached(id) {
            tree.unwrap(id);
        }
    }
}

/// Lists and list items whose rendered text is blank are deleted.
fn prune_empty_lists(tree: &mut Tree) {
    let root = tree.root();
    let doomed: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| matches!(tree.tag(id), Some("ul" | "ol" | "li")))
        .filter(|&id| tree.text_content(id).trim().is_empty())
        .collect();
    for id in doomed {
        if tree.is_attached(id) {
            tree.detach(id);
        }
    }
}

/// Links wrapping images are unsupported; the link is dropped and the image
/// kept.
fn unwrap_links_around_images(tree: &mut Tree) {
    let root = tree.root();
    let links: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id) == Some("a") && has_descendant_tag(tree, id, "img"))
        .collect();
    for id in links {
        if tree.is_attached(id) {
            tree.unwrap(id);
        }
    }
}

/// Inline code spanning multiple lines becomes a block.
fn promote_multiline_code(tree: &mut Tree) {
    let root = tree.root();
    let blocks: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id) == Some("code") && tree.text_content(id).contains('\n'))
        .collect();
    for id in blocks {
        tree.set_tag(id, "pre");
    }
}

/// Every direct child of the root must be an allowed top-level element.
/// Other elements are wrapped in a paragraph together with their trailing
/// text; trailing text after a valid top-level child splits into its own
/// paragraph.
fn enforce_top_level_shape(tree: &mut Tree) {
    let root = tree.root();
    let top_level: Vec<NodeId> = tree.children(root).to_vec();
    for id in top_level {
        let Some(tag) = tree.tag(id).map(str::to_string) else {
            // bare text: leading text was handled at parse time, trailing
            // runs move together with the element they follow
            continue;
        };
        if !tags::is_top_level_tag(&tag) {
            let para = tree.new_element("p");
            tree.insert_before(id, para);
            let tail = tree.tail_run(id);
            tree.append(para, id);
            for text in tail {
                tree.append(para, text);
            }
        } else {
            let tail = tree.tail_text(id);
            if !tail.trim().is_empty() {
                let para = tree.new_element("p");
                let text = tree.new_text(tail);
                tree.append(para, text);
                tree.set_tail(id, "");
                tree.insert_after(id, para);
            }
        }
    }
}

/// Images outside a `figure` get one, inserted at the image's position; any
/// trailing text stays outside.
fn wrap_bare_images(tree: &mut Tree) {
    let root = tree.root();
    let images: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id) == Some("img") && !has_ancestor_in(tree, id, &["figure"]))
        .collect();
    for id in images {
        wrap_in_figure(tree, id);
    }
}

/// One walk over all elements in document order: list whitespace cleanup,
/// embed rewriting and Twitter quote replacement.
fn rewrite_media(tree: &mut Tree) {
    let root = tree.root();
    for id in tree.descendant_elements(root) {
        if !tree.is_attached(id) {
            continue;
        }
        let Some(tag) = tree.tag(id).map(str::to_string) else {
            continue;
        };
        match tag.as_str() {
            "ul" | "ol" => tree.clear_leading_text(id),
            "li" => tree.set_tail(id, ""),
            "iframe" => rewrite_iframe(tree, id),
            "blockquote" if tree.attr(id, "class") == Some("twitter-tweet") => {
                rewrite_tweet(tree, id)
            }
            _ => {}
        }
    }
}

/// Rewrites a recognized embed iframe to its proxy endpoint and wraps it in
/// a `figure`; unrecognized iframes are deleted.
fn rewrite_iframe(tree: &mut Tree, id: NodeId) {
    let src = tree.attr(id, "src").unwrap_or_default().to_string();
    match tags::rewrite_embed_src(&src) {
        Some(proxy_src) => {
            trace!("rewriting embed iframe to {proxy_src}");
            tree.clear_leading_text(id);
            tree.set_attr(id, "src", &proxy_src);
            if !has_ancestor_in(tree, id, &["figure"]) {
                wrap_in_figure(tree, id);
            }
        }
        None => tree.detach(id),
    }
}

/// Replaces a `blockquote.twitter-tweet` by a proxy iframe built from the
/// first status link found inside it. Quotes without a status link are left
/// alone.
fn rewrite_tweet(tree: &mut Tree, id: NodeId) {
    let status_link = tree.descendant_elements(id).into_iter().find_map(|link| {
        if tree.tag(link) == Some("a")
            && let Some(href) = tree.attr(link, "href")
            && tags::TWITTER_RE.is_match(href)
        {
            Some(href.to_string())
        } else {
            None
        }
    });
    let Some(href) = status_link else {
        return;
    };
    let iframe = tree.new_element("iframe");
    let src = format!("/embed/twitter?url={}", tags::quote_plus(&href));
    tree.set_attr(iframe, "src", &src);
    tree.insert_before(id, iframe);
    wrap_in_figure(tree, iframe);
    tree.detach(id);
}

/// Nested figures one level down and nested blockquotes at any depth move
/// to the top level; content preceding them inside their parent splits into
/// a new sibling container of the same tag. Figures inside list items are
/// intentionally left in place.
fn move_media_to_top(tree: &mut Tree) {
    let root = tree.root();
    let targets: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| match tree.tag(id) {
            Some("figure") => depth_below_root(tree, id) == 2,
            Some("blockquote") => depth_below_root(tree, id) >= 2,
            _ => false,
        })
        .collect();
    for id in targets {
        if !tree.is_attached(id) {
            continue;
        }
        let Some(parent) = tree.parent(id) else {
            continue;
        };
        let preceding = tree.preceding_siblings(id);
        let has_preceding_elements = preceding.iter().any(|&node| tree.is_element(node));
        if has_preceding_elements || !tree.leading_text(parent).is_empty() {
            let container_tag = tree.tag(parent).unwrap_or("p").to_string();
            let container = tree.new_element(&container_tag);
            tree.insert_before(parent, container);
            for node in preceding {
                tree.append(container, node);
            }
        }
        let Some(top_ancestor) = top_level_ancestor(tree, id) else {
            continue;
        };
        // trailing text stays behind in the old parent
        tree.detach(id);
        tree.insert_before(top_ancestor, id);
    }
}

/// Final cleanup: blank text-bearing elements unwrap, adjacent `pre` blocks
/// merge, `class` attributes are stripped and contentless figures are
/// deleted.
fn post_process(tree: &mut Tree) {
    let root = tree.root();

    let candidates: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id).is_some_and(|tag| tags::ELEMENTS_WITH_TEXT.contains(&tag)))
        .collect();
    for id in candidates {
        if tree.is_attached(id) && tree.text_content(id).trim().is_empty() {
            tree.unwrap(id);
        }
    }

    merge_adjacent_pre(tree);

    // class attributes only served the twitter-tweet detection
    for id in tree.descendant_elements(root) {
        tree.remove_attr(id, "class");
    }

    let doomed: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id) == Some("figure"))
        .filter(|&id| !has_media_descendant(tree, id) && direct_text(tree, id).trim().is_empty())
        .collect();
    for id in doomed {
        tree.detach(id);
    }
}

/// Merges runs of sibling `pre` elements into the first one, joined by
/// newlines. Non-blank text between two blocks moves inside the merged
/// block; pure formatting whitespace is discarded.
fn merge_adjacent_pre(tree: &mut Tree) {
    let root = tree.root();
    let blocks: Vec<NodeId> = tree
        .descendant_elements(root)
        .into_iter()
        .filter(|&id| tree.tag(id) == Some("pre"))
        .collect();
    for id in blocks {
        if !tree.is_attached(id) {
            continue;
        }
        while let Some(next) = tree.next_sibling_element(id) {
            if tree.tag(next) != Some("pre") {
                break;
            }
            if !tree.children(next).is_empty() {
                let separator = tree.new_text("\n");
                tree.append(id, separator);
            }
            for child in tree.children(next).to_vec() {
                tree.append(id, child);
            }
            let tail = tree.tail_text(next).trim().to_string();
            tree.set_tail(next, "");
            if !tail.is_empty() {
                let text = tree.new_text(tail);
                tree.append(id, text);
            }
            tree.detach(next);
        }
        tree.coalesce_children(id);
    }
}

// -- shared predicates --

fn has_ancestor_in(tree: &Tree, id: NodeId, tags: &[&str]) -> bool {
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        if let Some(tag) = tree.tag(ancestor)
            && tags.contains(&tag)
        {
            return true;
        }
        current = tree.parent(ancestor);
    }
    false
}

fn has_descendant_tag(tree: &Tree, id: NodeId, tag: &str) -> bool {
    tree.descendant_elements(id)
        .iter()
        .any(|&node| tree.tag(node) == Some(tag))
}

fn has_media_descendant(tree: &Tree, id: NodeId) -> bool {
    tree.descendant_elements(id)
        .iter()
        .any(|&node| tree.tag(node).is_some_and(|tag| tags::FIGURE_MEDIA_TAGS.contains(&tag)))
}

fn direct_text(tree: &Tree, id: NodeId) -> String {
    tree.children(id)
        .iter()
        .filter_map(|&node| tree.text(node))
        .collect()
}

fn subtree_has_text(tree: &Tree, id: NodeId) -> bool {
    !tree.text_content(id).is_empty()
}

/// Whether any following sibling element has a direct text child.
fn has_following_text_sibling(tree: &Tree, id: NodeId) -> bool {
    let mut sibling = tree.next_sibling_element(id);
    while let Some(current) = sibling {
        if tree.children(current).iter().any(|&child| tree.is_text(child)) {
            return true;
        }
        sibling = tree.next_sibling_element(current);
    }
    false
}

fn depth_below_root(tree: &Tree, id: NodeId) -> usize {
    let mut depth = 0;
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        depth += 1;
        current = tree.parent(ancestor);
    }
    depth
}

/// The ancestor of `id` that sits directly under the root.
fn top_level_ancestor(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let root = tree.root();
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        if parent == root {
            return Some(current);
        }
        current = parent;
    }
    None
}

/// Wraps `id` in a new `figure` at its current position.
fn wrap_in_figure(tree: &mut Tree, id: NodeId) -> NodeId {
    let figure = tree.new_element("figure");
    tree.insert_before(id, figure);
    tree.append(figure, id);
    figure
}
