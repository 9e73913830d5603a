use std::{collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

/// Tags that survive [`sanitize_html`]. Attributes are never kept.
pub const ALLOWED_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "br", "p"];

static DROPPED_ELEMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style|iframe|object|template)\b[^>]*>.*?</(?:script|style|iframe|object|template)\s*>")
        .unwrap()
});

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)(?:\s[^<>]*)?/?>").unwrap());

/// Makes untrusted text safe for interpolation into an HTML document.
///
/// Elements on the [`ALLOWED_TAGS`] list are kept in a normalized form without
/// attributes. Every other tag is stripped, the contents of script-like
/// elements are dropped entirely and all remaining text is escaped.
pub fn sanitize_html(input: &str) -> String {
    let input = DROPPED_ELEMENT_REGEX.replace_all(input, "");

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in TAG_REGEX.captures_iter(&input) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&tera::escape_html(&input[last..m.start()]));
        push_allowed_tag(&mut out, &caps);
        last = m.end();
    }
    out.push_str(&tera::escape_html(&input[last..]));

    out
}

fn push_allowed_tag(out: &mut String, caps: &Captures) {
    let tag = caps[2].to_ascii_lowercase();
    if !ALLOWED_TAGS.contains(&tag.as_str()) {
        return;
    }

    let closing = !caps[1].is_empty();
    match (tag.as_str(), closing) {
        ("br", true) => {}
        ("br", false) => out.push_str("<br>"),
        (_, true) => {
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        (_, false) => {
            out.push('<');
            out.push_str(&tag);
            out.push('>');
        }
    }
}

/// `sanitize` filter for tera templates, see [`sanitize_html`].
pub fn sanitize_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let value = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Filter `sanitize` expects a string"))?;
    Ok(sanitize_html(value).into())
}
