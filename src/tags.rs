//! Read-only tag classification tables and pattern tables.
//!
//! All tables are either `const` slices or lazily compiled regular
//! expressions shared by every conversion in the process.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Elements that survive sanitization; everything else is unwrapped.
pub(crate) const ALLOWED_TAGS: &[&str] = &[
    "a",
    "aside",
    "blockquote",
    "br",
    "code",
    "em",
    "figcaption",
    "figure",
    "h3",
    "h4",
    "hr",
    "i",
    "iframe",
    "img",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "strong",
    "u",
    "ul",
    "video",
];

/// Elements permitted directly under the document root.
pub(crate) const ALLOWED_TOP_LEVEL_TAGS: &[&str] = &[
    "aside",
    "blockquote",
    "pre",
    "figure",
    "h3",
    "h4",
    "hr",
    "ol",
    "p",
    "ul",
];

/// Elements that are unwrapped when their rendered text is blank.
pub(crate) const ELEMENTS_WITH_TEXT: &[&str] = &[
    "a",
    "aside",
    "b",
    "blockquote",
    "em",
    "h3",
    "h4",
    "p",
    "strong",
];

/// Elements whose entire subtree is deleted during sanitization.
pub(crate) const UNSAFE_TAGS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "object",
    "embed",
    "applet",
    "form",
    "template",
];

/// Attributes the sanitizer keeps; everything else is stripped.
pub(crate) const SAFE_ATTRS: &[&str] = &["src", "href", "class"];

/// URL schemes never allowed in `src`/`href` values.
pub(crate) const UNSAFE_URL_SCHEMES: &[&str] = &["javascript:", "vbscript:"];

/// Elements that count as media content inside a `figure`.
pub(crate) const FIGURE_MEDIA_TAGS: &[&str] = &["iframe", "figcaption", "img", "video"];

pub(crate) fn is_allowed_tag(tag: &str) -> bool {
    ALLOWED_TAGS.contains(&tag)
}

pub(crate) fn is_top_level_tag(tag: &str) -> bool {
    ALLOWED_TOP_LEVEL_TAGS.contains(&tag)
}

pub(crate) fn is_unsafe_tag(tag: &str) -> bool {
    UNSAFE_TAGS.contains(&tag)
}

pub(crate) fn is_safe_attr(name: &str) -> bool {
    SAFE_ATTRS.contains(&name)
}

/// Whether an attribute value carries a script-injection URL scheme.
pub(crate) fn has_unsafe_scheme(value: &str) -> bool {
    let value = value.trim_start().to_ascii_lowercase();
    UNSAFE_URL_SCHEMES
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

// Legacy-markup rewrites applied before parsing. The replacement strings
// live next to their patterns in `sanitizer::rewrite_legacy_markup`.

/// `<h1>`/`</h1>` in any position.
pub(crate) static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)h1").unwrap());

/// `<b>`/`</b>` followed by whitespace or `>`, so `<br>`/`<blockquote>`
/// never match.
pub(crate) static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)b([\s>])").unwrap());

/// Header levels that fold into `h4`.
pub(crate) static HEADER_LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)(?:h2|h5|h6)").unwrap());

/// A Telegram post widget `<script>` tag carrying `data-telegram-post`.
pub(crate) static TELEGRAM_SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<script\s[^>]*data-telegram-post=['"]([^'"]+)['"][^<]*</script>"#).unwrap()
});

/// A whole `<head>` section, greedy so nested `</head>`-like text never
/// truncates it.
pub(crate) static HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<head[^a-z][\s\S]*</head>").unwrap());

/// One or more consecutive `<br>` tags with trailing whitespace.
pub(crate) static BR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:<br(?:/?>|\s[^<>]*>)\s*)+").unwrap());

// Embed provider patterns, checked in declaration order against iframe
// `src` values. All are anchored: the scheme may be omitted for YouTube,
// Vimeo and Twitter, but Telegram links require one.

pub(crate) static YOUTUBE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?:)?//(www\.)?youtube(-nocookie)?\.com/embed/").unwrap());

pub(crate) static VIMEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?:)?//player\.vimeo\.com/video/(\d+)").unwrap());

pub(crate) static TELEGRAM_EMBED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?)://(t\.me|telegram\.me|telegram\.dog)/([a-zA-Z0-9_]+)/(\d+)").unwrap()
});

pub(crate) static TWITTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?:)?//(www\.)?twitter\.com/[A-Za-z0-9_]{1,15}/status/\d+").unwrap()
});

/// Percent-encodes a value for use inside a query string, encoding `/` and
/// `:` and mapping spaces to `+`.
pub(crate) fn quote_plus(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Maps a recognized embed `src` to its proxy endpoint URL.
///
/// Providers are tried in order: YouTube, Vimeo, Telegram. Returns `None`
/// when no provider recognizes the source, in which case the iframe is
/// dropped by the caller.
pub(crate) fn rewrite_embed_src(src: &str) -> Option<String> {
    if YOUTUBE_RE.is_match(src) {
        let video_id = url_path(src)?.replace("/embed/", "");
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        return Some(format!("/embed/youtube?url={}", quote_plus(&watch_url)));
    }
    if let Some(caps) = VIMEO_RE.captures(src) {
        let video_url = format!("https://vimeo.com/{}", &caps[2]);
        return Some(format!("/embed/vimeo?url={}", quote_plus(&video_url)));
    }
    if TELEGRAM_EMBED_RE.is_match(src) {
        return Some(format!("/embed/telegram?url={}", quote_plus(src)));
    }
    None
}

/// Path component of a URL that may be scheme-relative.
fn url_path(src: &str) -> Option<String> {
    let absolute = if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .map(|url| url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_classification() {
        assert!(is_allowed_tag("figure"));
        assert!(!is_allowed_tag("div"));
        assert!(is_top_level_tag("blockquote"));
        assert!(!is_top_level_tag("em"));
        assert!(is_unsafe_tag("script"));
        assert!(!is_unsafe_tag("pre"));
    }

    #[test]
    fn test_unsafe_scheme_detection() {
        assert!(has_unsafe_scheme("javascript:alert(1)"));
        assert!(has_unsafe_scheme("  JaVaScRiPt:alert(1)"));
        assert!(has_unsafe_scheme("vbscript:msgbox"));
        assert!(!has_unsafe_scheme("https://example.com/javascript:notscheme"));
    }

    #[test]
    fn test_bold_pattern_spares_br_and_blockquote() {
        assert!(BOLD_RE.is_match("<b>"));
        assert!(BOLD_RE.is_match("</b>"));
        assert!(BOLD_RE.is_match("<b class=\"x\">"));
        assert!(!BOLD_RE.is_match("<br>"));
        assert!(!BOLD_RE.is_match("<blockquote>"));
    }

    #[test]
    fn test_youtube_rewrite() {
        let src = "//www.youtube.com/embed/abcdef";
        assert_eq!(
            rewrite_embed_src(src).as_deref(),
            Some("/embed/youtube?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabcdef")
        );
    }

    #[test]
    fn test_youtube_rewrite_drops_query() {
        let src = "https://www.youtube-nocookie.com/embed/xyz123?rel=0";
        assert_eq!(
            rewrite_embed_src(src).as_deref(),
            Some("/embed/youtube?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dxyz123")
        );
    }

    #[test]
    fn test_vimeo_rewrite() {
        let src = "https://player.vimeo.com/video/1185346";
        assert_eq!(
            rewrite_embed_src(src).as_deref(),
            Some("/embed/vimeo?url=https%3A%2F%2Fvimeo.com%2F1185346")
        );
    }

    #[test]
    fn test_telegram_rewrite_keeps_full_url() {
        let src = "https://t.me/tginfo/1220";
        assert_eq!(
            rewrite_embed_src(src).as_deref(),
            Some("/embed/telegram?url=https%3A%2F%2Ft.me%2Ftginfo%2F1220")
        );
        // scheme is mandatory for telegram links
        assert_eq!(rewrite_embed_src("//t.me/tginfo/1220"), None);
    }

    #[test]
    fn test_unrecognized_embed() {
        assert_eq!(rewrite_embed_src("https://example.com/embed/video"), None);
        assert_eq!(rewrite_embed_src(""), None);
    }

    #[test]
    fn test_twitter_status_pattern() {
        assert!(TWITTER_RE.is_match("https://twitter.com/durov/status/803680844200210432"));
        assert!(TWITTER_RE.is_match("//www.twitter.com/a_user/status/1"));
        assert!(!TWITTER_RE.is_match("https://twitter.com/durov"));
    }
}
