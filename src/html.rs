/// Tag name normalization and HTML element classification.

/// Void elements: cannot have children or a closing tag.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Markup tags that the editor's component catalog knows under another name.
const TAG_ALIASES: &[(&str, &str)] = &[
    ("a", "link"),
];

/// Tag used for text nodes.
pub const TEXT_TAG: &str = "#text";

/// Lowercase a raw tag name and apply the alias table.
pub fn normalize_tag(raw: &str) -> String {
    let lower = element_name(raw);
    TAG_ALIASES
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, to)| to.to_string())
        .unwrap_or(lower)
}

/// Lowercased tag without aliasing. Open and close tags pair on this name,
/// so `<a>` is closed by `</a>` and never by `</link>`.
pub fn element_name(raw: &str) -> String {
    raw.to_ascii_lowercase()
}

/// Only HTML-cased names (`img`, `IMG`) are void. Mixed-case names such
/// as `Link` or `Input` are components and take children. Checked against
/// the raw tag, so the `link` alias of `<a>` is not void either.
pub fn is_void_element(raw_tag: &str) -> bool {
    let html_cased = !raw_tag.bytes().any(|b| b.is_ascii_uppercase())
        || !raw_tag.bytes().any(|b| b.is_ascii_lowercase());
    html_cased && VOID_ELEMENTS.contains(&raw_tag.to_ascii_lowercase().as_str())
}
