use indexmap::IndexMap;
use log::trace;
use serde::Serialize;

/// Attribute value: a string, or `true` for a bare boolean attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Flag(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

/// Ordered attribute map; keys are unique, insertion order is kept.
pub type Attributes = IndexMap<String, AttrValue>;

/// Markup attribute names that framework props spell differently.
const PROP_NAMES: &[(&str, &str)] = &[
    ("class", "className"),
    ("for", "htmlFor"),
    ("tabindex", "tabIndex"),
    ("readonly", "readOnly"),
    ("maxlength", "maxLength"),
    ("minlength", "minLength"),
    ("rowspan", "rowSpan"),
    ("colspan", "colSpan"),
    ("contenteditable", "contentEditable"),
    ("autocomplete", "autoComplete"),
    ("autofocus", "autoFocus"),
    ("crossorigin", "crossOrigin"),
    ("enctype", "encType"),
    ("srcset", "srcSet"),
    ("usemap", "useMap"),
    ("cellpadding", "cellPadding"),
    ("cellspacing", "cellSpacing"),
];

/// Map a markup attribute name to its prop spelling. Unknown names pass
/// through unchanged.
pub fn prop_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    PROP_NAMES
        .iter()
        .find(|(markup, _)| *markup == lower)
        .map(|(_, prop)| prop.to_string())
        .unwrap_or_else(|| name.to_string())
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b'@' | b':')
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'@' | b':' | b'.')
}

/// Parse a raw attribute string (`class="a" disabled x={y}`) into an
/// ordered map. Malformed fragments are dropped one at a time; the rest of
/// the string is still parsed. A repeated name keeps its first position and
/// takes the last value.
pub fn parse_attributes(raw: &str) -> Attributes {
    let mut attrs = Attributes::new();
    let bytes = raw.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if !is_name_start(b) {
            // Spread props, stray quotes and stray `=` carry no name
            i = match b {
                b'{' => balanced_brace_end(raw, i).map(|end| end + 1).unwrap_or(len),
                b'"' | b'\'' => raw[i + 1..]
                    .find(b as char)
                    .map(|k| i + 1 + k + 1)
                    .unwrap_or(len),
                _ => i + raw[i..].chars().next().map(char::len_utf8).unwrap_or(1),
            };
            trace!("skipped stray attribute fragment in {:?}", raw);
            continue;
        }

        let name_start = i;
        while i < len && is_name_char(bytes[i]) {
            i += 1;
        }
        let name = prop_name(&raw[name_start..i]);

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        if j >= len || bytes[j] != b'=' {
            attrs.insert(name, AttrValue::Flag(true));
            continue;
        }

        // Value
        j += 1;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= len {
            trace!("attribute {} has no value", name);
            i = j;
            continue;
        }

        match bytes[j] {
            quote @ (b'"' | b'\'') => match raw[j + 1..].find(quote as char) {
                Some(k) => {
                    let value = &raw[j + 1..j + 1 + k];
                    attrs.insert(name, AttrValue::from(value));
                    i = j + 1 + k + 1;
                }
                None => {
                    trace!("attribute {} has an unterminated quote", name);
                    i = j + 1;
                    while i < len && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                }
            },
            b'{' => match balanced_brace_end(raw, j) {
                Some(end) => {
                    attrs.insert(name, AttrValue::from(&raw[j..=end]));
                    i = end + 1;
                }
                None => {
                    trace!("attribute {} has an unbalanced expression", name);
                    i = len;
                }
            },
            _ => {
                let mut k = j;
                while k < len && !bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                attrs.insert(name, AttrValue::from(&raw[j..k]));
                i = k;
            }
        }
    }

    attrs
}

/// Byte index of the `}` matching the `{` at `open`, skipping quoted strings.
pub(crate) fn balanced_brace_end(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
