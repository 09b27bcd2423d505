//! Inline style parsing and the utility-class heuristic table.
//!
//! Both `style="background-color: red"` and the object-literal form
//! `style={{ backgroundColor: 'red' }}` produce the same map: camelCase
//! property names to raw string values.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

/// camelCase CSS property -> value
pub type StyleMap = IndexMap<String, String>;

lazy_static! {
    // p-4, mx-2, gap-3 ...
    static ref SPACING_CLASS: Regex =
        Regex::new(r"^(p|px|py|pt|pr|pb|pl|m|mx|my|mt|mr|mb|ml|gap)-(\d{1,3})$").unwrap();
}

/// Utility classes with a fixed meaning.
const CLASS_HEURISTICS: &[(&str, &[(&str, &str)])] = &[
    ("flex", &[("display", "flex")]),
    ("inline-flex", &[("display", "inline-flex")]),
    ("grid", &[("display", "grid")]),
    ("block", &[("display", "block")]),
    ("inline-block", &[("display", "inline-block")]),
    ("hidden", &[("display", "none")]),
    ("flex-row", &[("flexDirection", "row")]),
    ("flex-col", &[("flexDirection", "column")]),
    ("flex-wrap", &[("flexWrap", "wrap")]),
    ("items-start", &[("alignItems", "flex-start")]),
    ("items-center", &[("alignItems", "center")]),
    ("items-end", &[("alignItems", "flex-end")]),
    ("justify-start", &[("justifyContent", "flex-start")]),
    ("justify-center", &[("justifyContent", "center")]),
    ("justify-end", &[("justifyContent", "flex-end")]),
    ("justify-between", &[("justifyContent", "space-between")]),
    ("justify-around", &[("justifyContent", "space-around")]),
    ("text-left", &[("textAlign", "left")]),
    ("text-center", &[("textAlign", "center")]),
    ("text-right", &[("textAlign", "right")]),
    ("font-medium", &[("fontWeight", "500")]),
    ("font-semibold", &[("fontWeight", "600")]),
    ("font-bold", &[("fontWeight", "bold")]),
    ("italic", &[("fontStyle", "italic")]),
    ("underline", &[("textDecoration", "underline")]),
    ("uppercase", &[("textTransform", "uppercase")]),
    ("w-full", &[("width", "100%")]),
    ("h-full", &[("height", "100%")]),
    ("rounded", &[("borderRadius", "4px")]),
    ("rounded-full", &[("borderRadius", "9999px")]),
    ("border", &[("borderWidth", "1px"), ("borderStyle", "solid")]),
    ("relative", &[("position", "relative")]),
    ("absolute", &[("position", "absolute")]),
    ("fixed", &[("position", "fixed")]),
    ("overflow-hidden", &[("overflow", "hidden")]),
    ("cursor-pointer", &[("cursor", "pointer")]),
];

/// Convert a dashed CSS property name to camelCase.
///
/// `background-color` -> `backgroundColor`, `-webkit-transition` ->
/// `WebkitTransition`. Custom properties (`--accent`) are kept verbatim.
pub fn camel_case(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        return property.to_string();
    }

    let mut out = String::with_capacity(property.len());
    let mut upper_next = false;
    for ch in property.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse `property: value; ...` declarations. Empty names or values are
/// skipped; `!important` is dropped. Names are returned as written.
pub fn parse_declarations(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let name = name.trim();
            let value = strip_important(value.trim());
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn strip_important(value: &str) -> &str {
    match value.to_ascii_lowercase().rfind("!important") {
        Some(i) => value[..i].trim_end(),
        None => value,
    }
}

/// Declarations as a camelCase style map (later duplicates win).
pub fn declarations_to_style(input: &str) -> StyleMap {
    parse_declarations(input)
        .into_iter()
        .map(|(name, value)| (camel_case(&name.to_ascii_lowercase()), value))
        .collect()
}

/// Parse the value of a `style` attribute in either syntax.
pub fn parse_inline_style(value: &str) -> StyleMap {
    let trimmed = value.trim();
    if trimmed.starts_with('{') {
        parse_object_literal(trimmed)
    } else {
        declarations_to_style(trimmed)
    }
}

/// `{{ color: 'red', fontSize: 12 }}` -> {color: red, fontSize: 12}
fn parse_object_literal(input: &str) -> StyleMap {
    let mut body = input.trim();
    while body.starts_with('{') && body.ends_with('}') && body.len() >= 2 {
        body = body[1..body.len() - 1].trim();
    }

    let mut style = StyleMap::new();
    for entry in split_top_level(body, b',') {
        let Some(colon) = find_top_level(entry, b':') else {
            continue;
        };
        let key = unquote(entry[..colon].trim());
        let value = unquote(entry[colon + 1..].trim());
        if key.is_empty() || value.is_empty() || key.starts_with("...") {
            continue;
        }
        style.insert(camel_case(key), value.to_string());
    }
    style
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Split on `sep` where it is outside quotes and brackets.
fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_top_level(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + 1..];
    }
    parts.push(rest);
    parts
}

fn find_top_level(s: &str, target: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in s.as_bytes().iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if b == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Best-effort styles implied by utility classes in a class list.
pub fn heuristic_styles(class_list: &str) -> StyleMap {
    let mut style = StyleMap::new();
    for class in class_list.split_whitespace() {
        if let Some((_, decls)) = CLASS_HEURISTICS.iter().find(|(name, _)| *name == class) {
            for (prop, value) in decls.iter() {
                style.insert(prop.to_string(), value.to_string());
            }
            continue;
        }

        if let Some(caps) = SPACING_CLASS.captures(class) {
            let Ok(steps) = caps[2].parse::<u32>() else {
                continue;
            };
            let value = format!("{}px", steps * 4);
            for prop in spacing_properties(&caps[1]) {
                style.insert(prop.to_string(), value.clone());
            }
        }
    }
    style
}

fn spacing_properties(prefix: &str) -> &'static [&'static str] {
    match prefix {
        "p" => &["padding"],
        "px" => &["paddingLeft", "paddingRight"],
        "py" => &["paddingTop", "paddingBottom"],
        "pt" => &["paddingTop"],
        "pr" => &["paddingRight"],
        "pb" => &["paddingBottom"],
        "pl" => &["paddingLeft"],
        "m" => &["margin"],
        "mx" => &["marginLeft", "marginRight"],
        "my" => &["marginTop", "marginBottom"],
        "mt" => &["marginTop"],
        "mr" => &["marginRight"],
        "mb" => &["marginBottom"],
        "ml" => &["marginLeft"],
        "gap" => &["gap"],
        _ => &[],
    }
}
