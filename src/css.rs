//! Class-selector stylesheet resolution.
//!
//! Only rules whose selectors are made of classes (`.card`, `.card.active`,
//! `.btn:hover`) are kept. A compound selector registers its declarations
//! under every class it names, so `.card.active { color: red }` styles any
//! element carrying either class.

use log::{debug, trace};
use std::collections::HashMap;

use crate::ast::Node;
use crate::style::{self, StyleMap};
use crate::transform::{Transformer, Visitor};

/// Class name -> merged declarations (later rules win per property)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassStyleMap {
    classes: HashMap<String, StyleMap>,
}

impl ClassStyleMap {
    /// Parse stylesheet text. Blocks that cannot be parsed are skipped.
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let bytes = css.as_bytes();
        let mut map = ClassStyleMap::default();
        let mut prelude_start = 0;
        let mut i = 0;
        let mut rules = 0usize;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    let Some(close) = matching_brace(bytes, i) else {
                        trace!("skipping unterminated rule block at byte {}", i);
                        break;
                    };
                    let prelude = &css[prelude_start..i];
                    // `@import ...;` and similar statements end at ';'
                    let prelude = prelude.rsplit(';').next().unwrap_or(prelude);
                    if map.add_rule(prelude, &css[i + 1..close]) {
                        rules += 1;
                    }
                    i = close + 1;
                    prelude_start = i;
                }
                b'}' => {
                    i += 1;
                    prelude_start = i;
                }
                _ => i += 1,
            }
        }

        debug!("stylesheet: {} class rule(s), {} class(es)", rules, map.classes.len());
        map
    }

    /// Register a rule's declarations under each class its selectors name.
    fn add_rule(&mut self, prelude: &str, body: &str) -> bool {
        let declarations = style::declarations_to_style(body);
        if declarations.is_empty() {
            return false;
        }

        let mut added = false;
        for selector in prelude.split(',') {
            let Some(classes) = class_names(selector) else {
                trace!("ignoring non-class selector {:?}", selector.trim());
                continue;
            };
            for class in classes {
                self.classes
                    .entry(class.to_string())
                    .or_default()
                    .extend(declarations.iter().map(|(k, v)| (k.clone(), v.clone())));
                added = true;
            }
        }
        added
    }

    pub fn get(&self, class: &str) -> Option<&StyleMap> {
        self.classes.get(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Overlay class declarations onto every element in `nodes`.
    pub fn apply(&self, nodes: &mut [Node]) {
        Transformer::new().add(ClassStyleApplier { map: self }).transform(nodes);
    }
}

/// Class names of a purely class-based selector, pseudo part removed.
/// `None` for element, id, attribute or combinator selectors.
fn class_names(selector: &str) -> Option<Vec<&str>> {
    let selector = selector.trim();
    let selector = match selector.find(':') {
        Some(i) => selector[..i].trim_end(),
        None => selector,
    };
    let rest = selector.strip_prefix('.')?;

    let names: Vec<&str> = rest.split('.').collect();
    let valid = names.iter().all(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    });
    valid.then_some(names)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Writes class declarations into `style`, except for properties the
/// element's own `style` attribute sets.
struct ClassStyleApplier<'a> {
    map: &'a ClassStyleMap,
}

impl Visitor for ClassStyleApplier<'_> {
    fn enter(&mut self, node: &mut Node) -> bool {
        let Node::Element(el) = node else {
            return false;
        };
        let Some(class_list) = el.attr("className") else {
            return true;
        };

        let inline = el
            .attr("style")
            .map(style::parse_inline_style)
            .unwrap_or_default();

        let mut overlay = StyleMap::new();
        for class in class_list.split_whitespace() {
            if let Some(declarations) = self.map.get(class) {
                for (prop, value) in declarations {
                    if !inline.contains_key(prop) {
                        overlay.insert(prop.clone(), value.clone());
                    }
                }
            }
        }
        el.style.extend(overlay);
        true
    }
}

/// Resolve `css` onto a forest. Empty stylesheets return the input as is.
pub fn resolve(mut nodes: Vec<Node>, css: &str) -> Vec<Node> {
    if css.trim().is_empty() {
        return nodes;
    }
    ClassStyleMap::parse(css).apply(&mut nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Language;

    fn style_of<'a>(nodes: &'a [Node], prop: &str) -> Option<&'a str> {
        nodes[0].as_element()?.style.get(prop).map(String::as_str)
    }

    #[test]
    fn test_parse_simple_rule() {
        let map = ClassStyleMap::parse(".card { background-color: black; color: white; }");
        let card = map.get("card").unwrap();
        assert_eq!(card.get("backgroundColor").map(String::as_str), Some("black"));
        assert_eq!(card.get("color").map(String::as_str), Some("white"));
    }

    #[test]
    fn test_selector_lists_and_pseudo() {
        let map = ClassStyleMap::parse(".a, .b:hover, div, #id, .c > .d { margin: 0 }");
        assert!(map.get("a").is_some());
        assert!(map.get("b").is_some());
        assert!(map.get("c").is_none());
        assert!(map.get("d").is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_compound_selector_registers_each_class() {
        let map = ClassStyleMap::parse(".card.active { color: red }");
        assert_eq!(map.get("card").and_then(|s| s.get("color")).map(String::as_str), Some("red"));
        assert_eq!(map.get("active").and_then(|s| s.get("color")).map(String::as_str), Some("red"));
    }

    #[test]
    fn test_later_rules_override() {
        let map = ClassStyleMap::parse(".x { color: red; padding: 1px } .x { color: blue }");
        let x = map.get("x").unwrap();
        assert_eq!(x.get("color").map(String::as_str), Some("blue"));
        assert_eq!(x.get("padding").map(String::as_str), Some("1px"));
    }

    #[test]
    fn test_comments_and_at_rules() {
        let css = "@import url(a.css);\n/* .hidden { display: none } */\n.y { color: red }\n@media (max-width: 10px) { .z { color: blue } }";
        let map = ClassStyleMap::parse(css);
        assert!(map.get("hidden").is_none());
        assert!(map.get("y").is_some());
        assert!(map.get("z").is_none());
    }

    #[test]
    fn test_unterminated_block_is_skipped() {
        let map = ClassStyleMap::parse(".ok { color: red } .broken { color: blue");
        assert!(map.get("ok").is_some());
        assert!(map.get("broken").is_none());
    }

    #[test]
    fn test_stray_close_brace() {
        let map = ClassStyleMap::parse("} .ok { color: red }");
        assert!(map.get("ok").is_some());
    }

    #[test]
    fn test_resolve_overlays_classes() {
        let doc = crate::parse("<div class=\"card\">Hello</div>", Language::Markup);
        let nodes = resolve(doc.nodes, ".card { padding: 12px }");
        assert_eq!(style_of(&nodes, "padding"), Some("12px"));
    }

    #[test]
    fn test_inline_wins_over_class() {
        let doc = crate::parse("<p class=\"t\" style=\"color: red\">x</p>", Language::Markup);
        let nodes = resolve(doc.nodes, ".t { color: blue; margin: 0 }");
        assert_eq!(style_of(&nodes, "color"), Some("red"));
        assert_eq!(style_of(&nodes, "margin"), Some("0"));
    }

    #[test]
    fn test_stylesheet_overrides_heuristics() {
        let doc = crate::parse("<p class=\"flex\">x</p>", Language::Markup);
        assert_eq!(style_of(&doc.nodes, "display"), Some("flex"));
        let nodes = resolve(doc.nodes, ".flex { display: grid }");
        assert_eq!(style_of(&nodes, "display"), Some("grid"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let css = ".a { color: red } .b { margin: 1px }";
        let doc = crate::parse("<div class=\"a b\" style=\"color: green\"><i class=\"b\">x</i></div>", Language::Markup);
        let once = resolve(doc.nodes, css);
        let twice = resolve(once.clone(), css);
        assert_eq!(crate::ast::outline(&once), crate::ast::outline(&twice));
    }

    #[test]
    fn test_empty_stylesheet_is_identity() {
        let doc = crate::parse("<div class=\"flex\">x</div>", Language::Markup);
        let before = crate::ast::outline(&doc.nodes);
        let nodes = resolve(doc.nodes, "   ");
        assert_eq!(crate::ast::outline(&nodes), before);
    }

    #[test]
    fn test_text_nodes_untouched() {
        let doc = crate::parse("plain text", Language::Markup);
        let nodes = resolve(doc.nodes, ".a { color: red }");
        assert!(nodes[0].as_text().is_some());
    }
}
