//! Preformatted and code block handling: whitespace preservation, inline
//! versus block promotion and merging of adjacent blocks.

use serde_json::{json, Value};
use telegraph_converter::ContentConverter;

fn convert(html: &str) -> Value {
    let converter = ContentConverter::new();
    serde_json::to_value(converter.convert(html)).unwrap()
}

#[test]
fn test_pre_preserves_inner_whitespace() {
    let html = "<pre>def f():\n    return  1\n</pre>";
    assert_eq!(
        convert(html),
        json!([{"tag": "pre", "children": ["def f():\n    return  1\n"]}])
    );
}

#[test]
fn test_markup_inside_pre_is_flattened() {
    let html = "<pre><code class=\"python hljs\">my_list = [1, 2]\nprint(my_list)\n</code></pre>";
    assert_eq!(
        convert(html),
        json!([{"tag": "pre", "children": ["my_list = [1, 2]\nprint(my_list)\n"]}])
    );
}

#[test]
fn test_br_inside_pre_becomes_newline() {
    let html = "<pre># test_div.py<br>import pytest<br /><br>def test_div():\n    assert 1<br></pre>";
    assert_eq!(
        convert(html),
        json!([{
            "tag": "pre",
            "children": ["# test_div.py\nimport pytest\n\ndef test_div():\n    assert 1\n"]
        }])
    );
}

#[test]
fn test_inline_code_is_kept_inline() {
    let html = "\n        <p>Text before <code> inline_code = True</code> Text after</p>\n        <code> multiline_code = True\n        next_line = True\n        </code>\n        <code></code>empty code\n            ";
    assert_eq!(
        convert(html),
        json!([
            {
                "tag": "p",
                "children": [
                    "Text before ",
                    {"tag": "code", "children": [" inline_code = True"]},
                    " Text after"
                ]
            },
            {
                "tag": "pre",
                "children": [" multiline_code = True\n        next_line = True\n        "]
            },
            {
                "tag": "p",
                "children": [{"tag": "code"}, "empty code"]
            }
        ])
    );
}

#[test]
fn test_adjacent_pre_blocks_merge() {
    assert_eq!(
        convert("<pre>first</pre><pre>second</pre>"),
        json!([{"tag": "pre", "children": ["first\nsecond"]}])
    );
}

#[test]
fn test_pre_blocks_merge_across_whitespace() {
    assert_eq!(
        convert("<pre>first</pre> \n <pre>second</pre>"),
        json!([{"tag": "pre", "children": ["first\nsecond"]}])
    );
}

#[test]
fn test_three_pre_blocks_merge_into_one() {
    assert_eq!(
        convert("<pre>a</pre><pre>b</pre><pre>c</pre>"),
        json!([{"tag": "pre", "children": ["a\nb\nc"]}])
    );
}

#[test]
fn test_empty_pre_merges_without_separator() {
    assert_eq!(
        convert("<pre>first</pre><pre></pre><pre>second</pre>"),
        json!([{"tag": "pre", "children": ["first\nsecond"]}])
    );
}

#[test]
fn test_pre_inside_paragraph_splits_out() {
    let html = "<p>Intro <pre>first()</pre><pre>second()</pre> after</p>";
    assert_eq!(
        convert(html),
        json!([
            {"tag": "p", "children": ["Intro "]},
            {"tag": "pre", "children": ["first()\nsecond()"]},
            {"tag": "p", "children": [" after"]}
        ])
    );
}

#[test]
fn test_leading_newline_after_pre_tag_is_consumed() {
    // the HTML5 parser drops a line feed immediately after <pre>
    assert_eq!(
        convert("<pre>\ncode</pre>"),
        json!([{"tag": "pre", "children": ["code"]}])
    );
}
