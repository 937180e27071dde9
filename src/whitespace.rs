//! Whitespace rewriting that leaves preformatted regions untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// A `<pre>` or `<code>` span, including its tags.
static PRE_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<pre(?:>|\s[^>]*>).*?</pre>|<code(?:>|\s[^>]*>).*?</code>").unwrap()
});

/// A single `<br>` tag in any of its spellings.
static BR_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br(?:/?>|\s[^<>]*>)").unwrap());

/// A whitespace run that collapses outside preformatted regions: two or
/// more whitespace characters, or any whitespace run containing a newline.
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\s*\r?\n\s*").unwrap());

/// Rewrites whitespace outside `<pre>`/`<code>` spans.
///
/// Non-breaking spaces (both the raw character and the `&nbsp;` entity)
/// become plain spaces everywhere. Outside preformatted spans, collapsible
/// whitespace runs become `replacement`; inside them the text is preserved
/// verbatim except that literal `<br>` tags become newlines.
///
/// The forward pipeline calls this with `" "` to fold formatting whitespace,
/// and the reverse pipeline with `"<br/>"` to re-express newlines as markup.
pub(crate) fn rewrite_outside_preformatted(html: &str, replacement: &str) -> String {
    let html = html.replace('\u{00A0}', " ").replace("&nbsp;", " ");
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for span in PRE_SPAN_RE.find_iter(&html) {
        out.push_str(&WS_RUN_RE.replace_all(&html[last..span.start()], replacement));
        out.push_str(&BR_TAG_RE.replace_all(span.as_str(), "\n"));
        last = span.end();
    }
    out.push_str(&WS_RUN_RE.replace_all(&html[last..], replacement));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_runs_and_newlines() {
        assert_eq!(
            rewrite_outside_preformatted("a  b\nc \n d", " "),
            "a b c d"
        );
    }

    #[test]
    fn test_single_spaces_survive() {
        assert_eq!(rewrite_outside_preformatted("a b c", " "), "a b c");
    }

    #[test]
    fn test_pre_span_is_protected() {
        let html = "a  b<pre>x  y\nz</pre>c\nd";
        assert_eq!(
            rewrite_outside_preformatted(html, " "),
            "a b<pre>x  y\nz</pre>c d"
        );
    }

    #[test]
    fn test_code_span_is_protected() {
        let html = "<code> keep =  this\n</code>  after";
        assert_eq!(
            rewrite_outside_preformatted(html, " "),
            "<code> keep =  this\n</code> after"
        );
    }

    #[test]
    fn test_br_inside_pre_becomes_newline() {
        let html = "<pre>line one<br>line two<br />line three</pre>";
        assert_eq!(
            rewrite_outside_preformatted(html, " "),
            "<pre>line one\nline two\nline three</pre>"
        );
    }

    #[test]
    fn test_nbsp_becomes_space() {
        assert_eq!(
            rewrite_outside_preformatted("a\u{00A0}b&nbsp;c", " "),
            "a b c"
        );
    }

    #[test]
    fn test_newline_to_br_marker() {
        assert_eq!(
            rewrite_outside_preformatted("first\nsecond", "<br/>"),
            "first<br/>second"
        );
        assert_eq!(
            rewrite_outside_preformatted("<pre>a\nb</pre>c\nd", "<br/>"),
            "<pre>a\nb</pre>c<br/>d"
        );
    }

    #[test]
    fn test_pre_with_attributes() {
        let html = "<pre class=\"code\">x  y</pre>";
        assert_eq!(rewrite_outside_preformatted(html, " "), html);
    }
}
