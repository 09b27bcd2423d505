//! Properties that must hold for every input, run over each fixture and a
//! list of hostile inputs.
//!
//! Run with: cargo test --test invariants

use lazy_static::lazy_static;
use libtest_mimic::{Arguments, Failed, Trial};
use markup_mapper::ast::{self, AttrValue, Node};
use markup_mapper::parser::attributes::prop_name;
use markup_mapper::{Document, Language, NodeId, build, html, node_at_line, parse, resolve, tokenize};
use regex::Regex;
use std::collections::HashSet;
use std::fs;

const STYLESHEET: &str = ".card { color: white; padding: 2px } .btn:hover { color: red } .a.b { margin: 0 }";

const HOSTILE_INPUTS: &[(&str, &str)] = &[
    ("empty", ""),
    ("lone_lt", "<"),
    ("lone_close", "</"),
    ("lt_space", "a < b > c"),
    ("deep_unclosed", "<a><b><c><d><e><f><g><h><i><j>"),
    ("only_closes", "</div></span></p>"),
    ("crossed", "<b><i>x</b></i>"),
    ("unterminated_attr", "<div class=\"oops><p>x</p>"),
    ("unterminated_comment", "<p>a</p><!-- never ends <div>"),
    ("brace_soup", "<x a={{{ b=\"}\">y</x>"),
    ("garbage", "\u{0}\u{1}<<>>\u{fffd}</\u{7f}>\t\r\n<\n"),
    ("multibyte", "<p>héllo</p>\n<span>日本語</span>"),
    ("crlf", "<div>\r\n  <p>x</p>\r\n</div>\r\n"),
    ("fragments", "<>\n<li>a</li>\n</>"),
    ("void_close", "<br></br><img>text"),
    ("style_object", "<div style={{ color: 'red', ...rest }} class=\"card btn\">z</div>"),
];

/// Tags used for generated fragments. None of them is void.
const FRAGMENT_TAGS: &[&str] = &["div", "section", "span", "button", "label", "ul", "li", "a", "p", "Card"];

const FRAGMENT_ATTRIBUTES: &[&str] = &[
    "class=\"card p-2\"",
    "for=\"email\"",
    "tabindex=\"0\"",
    "disabled",
    "id='main'",
    "data-x=1",
    "href=\"/home\"",
    "style=\"color: red\"",
];

const FRAGMENT_COUNT: u64 = 16;

lazy_static! {
    static ref TAG_OR_TEXT: Regex =
        Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9.:_-]*)([^<>]*?)\s*(/?)>|([^<>]+)"#).unwrap();
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([A-Za-z_:@][A-Za-z0-9_:@.-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#
    )
    .unwrap();
}

fn main() {
    let args = Arguments::from_args();

    let mut inputs: Vec<(String, String, Language)> = HOSTILE_INPUTS
        .iter()
        .map(|(name, source)| (name.to_string(), source.to_string(), Language::Markup))
        .collect();
    inputs.push(("deep_nesting".to_string(), "<div>".repeat(20_000), Language::Markup));
    inputs.push((
        "deep_nesting_lines".to_string(),
        "<section>\n  <p>x</p>\n".repeat(2_000),
        Language::Markup,
    ));
    inputs.push(("unbalanced_braces".to_string(), "<a {>".repeat(20_000), Language::Markup));

    let mut trials = Vec::new();

    let pattern = format!("{}/tests/fixtures/*.*", env!("CARGO_MANIFEST_DIR"));
    for path in glob::glob(&pattern).into_iter().flatten().flatten() {
        let is_source = path
            .extension()
            .is_some_and(|ext| ext == "html" || ext == "jsx");
        if !is_source {
            continue;
        }
        let Ok(source) = fs::read_to_string(&path) else {
            continue;
        };
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("fixture")
            .to_string();
        let language = Language::from_path(&path);
        if language == Language::Markup && parse(&source, language).diagnostics.is_empty() {
            trials.push(property("round_trip", &name, &source, language, check_round_trip));
        }
        inputs.push((name, source, language));
    }

    for seed in 1..=FRAGMENT_COUNT {
        let source = generate_fragment(seed);
        let name = format!("generated_{}", seed);
        trials.push(property("round_trip", &name, &source, Language::Markup, check_round_trip));
        inputs.push((name, source, Language::Markup));
    }

    for (name, source, language) in inputs {
        trials.push(property("totality", &name, &source, language, check_totality));
        trials.push(property("line_ranges", &name, &source, language, check_line_ranges));
        trials.push(property("unique_ids", &name, &source, language, check_unique_ids));
        trials.push(property("line_map", &name, &source, language, check_line_map));
        trials.push(property("monotonic", &name, &source, language, check_monotonic));
        trials.push(property("css_idempotent", &name, &source, language, check_css_idempotent));
    }

    libtest_mimic::run(&args, trials).exit();
}

fn property(
    kind: &str,
    name: &str,
    source: &str,
    language: Language,
    check: fn(&str, &Document) -> Result<(), Failed>,
) -> Trial {
    let source = source.to_string();
    Trial::test(format!("{}::{}", kind, name), move || {
        let document = parse(&source, language);
        check(&source, &document)
    })
}

fn elements(nodes: &[Node]) -> Vec<&Node> {
    let mut found = Vec::new();
    ast::walk(nodes, &mut |node| {
        if node.as_element().is_some() {
            found.push(node);
        }
    });
    found
}

fn check_totality(source: &str, _document: &Document) -> Result<(), Failed> {
    let output = build(tokenize(source));
    let mut count = 0;
    ast::walk(&output.nodes, &mut |_| count += 1);
    if output.line_map.len() > count {
        return Err(format!(
            "line map has {} entries for {} nodes",
            output.line_map.len(),
            count
        )
        .into());
    }
    Ok(())
}

fn check_line_ranges(_source: &str, document: &Document) -> Result<(), Failed> {
    let mut failure = None;
    ast::walk(&document.nodes, &mut |node| {
        let (start, end) = node.source_lines();
        if start == 0 || end < start {
            failure = Some(format!("{} {} has lines {}-{}", node.tag(), node.id(), start, end));
        }
    });
    match failure {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn check_unique_ids(_source: &str, document: &Document) -> Result<(), Failed> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut duplicate = None;
    ast::walk(&document.nodes, &mut |node| {
        if !seen.insert(node.id()) {
            duplicate = Some(node.id());
        }
    });
    match duplicate {
        Some(id) => Err(format!("duplicate node id {}", id).into()),
        None => Ok(()),
    }
}

/// Every entry points at an element that starts on that line; text nodes
/// are never registered.
fn check_line_map(_source: &str, document: &Document) -> Result<(), Failed> {
    for (line, id) in document.line_map.iter() {
        let Some(node) = document.find(id) else {
            return Err(format!("line {} maps to unknown node {}", line, id).into());
        };
        let Some(element) = node.as_element() else {
            return Err(format!("line {} maps to text node {}", line, id).into());
        };
        if element.source_start_line != line {
            return Err(format!(
                "line {} maps to <{}> starting at {}",
                line, element.tag, element.source_start_line
            )
            .into());
        }
    }

    for node in elements(&document.nodes) {
        let (start, _) = node.source_lines();
        if document.line_map.get(start).is_none() {
            return Err(format!("line {} of <{}> is not mapped", start, node.tag()).into());
        }
    }
    Ok(())
}

/// A lookup never resolves to an element that starts after the queried line.
fn check_monotonic(source: &str, document: &Document) -> Result<(), Failed> {
    let last_line = source.split('\n').count() + 1;
    for line in 0..=last_line {
        let Some(id) = node_at_line(&document.line_map, line) else {
            continue;
        };
        let Some(node) = document.find(id) else {
            return Err(format!("line {} resolves to unknown node {}", line, id).into());
        };
        let (start, _) = node.source_lines();
        if start > line {
            return Err(format!(
                "line {} resolves to <{}> starting at {}",
                line,
                node.tag(),
                start
            )
            .into());
        }
    }
    Ok(())
}

fn check_css_idempotent(_source: &str, document: &Document) -> Result<(), Failed> {
    let once = resolve(document.nodes.clone(), STYLESHEET);
    let twice = resolve(once.clone(), STYLESHEET);
    let (once, twice) = (ast::outline(&once), ast::outline(&twice));
    if once != twice {
        return Err(format!("resolve is not idempotent\n--- once ---\n{}\n--- twice ---\n{}", once, twice).into());
    }
    Ok(())
}

/// Parsing a well-formed fragment keeps every tag, attribute and text run,
/// in order and at the nesting the source gives them.
fn check_round_trip(source: &str, document: &Document) -> Result<(), Failed> {
    if !document.diagnostics.is_empty() {
        return Err(format!("unexpected diagnostics: {:?}", document.diagnostics).into());
    }

    let expected = source_skeleton(source);
    let mut actual = Vec::new();
    tree_skeleton(&document.nodes, 0, &mut actual);

    if expected != actual {
        return Err(format!(
            "tree does not match source\n--- source ---\n{}\n--- tree ---\n{}",
            expected.join("\n"),
            actual.join("\n")
        )
        .into());
    }
    Ok(())
}

/// One line per element or text run, read straight off the source text.
fn source_skeleton(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut depth = 0usize;

    for caps in TAG_OR_TEXT.captures_iter(source) {
        if let Some(text) = caps.get(5) {
            let text = text.as_str().trim();
            if !text.is_empty() {
                lines.push(format!("{}{:?}", "  ".repeat(depth), text));
            }
            continue;
        }

        let raw_tag = &caps[2];
        if &caps[1] == "/" {
            depth = depth.saturating_sub(1);
            continue;
        }

        let mut line = format!("{}<{}", "  ".repeat(depth), html::normalize_tag(raw_tag));
        for attr in ATTRIBUTE.captures_iter(&caps[3]) {
            let name = prop_name(&attr[1]);
            let value = attr.get(2).or(attr.get(3)).or(attr.get(4));
            match value {
                Some(value) => line.push_str(&format!(" {}={:?}", name, value.as_str())),
                None => line.push_str(&format!(" {}", name)),
            }
        }
        lines.push(line);

        if caps[4].is_empty() && !html::is_void_element(raw_tag) {
            depth += 1;
        }
    }
    lines
}

fn tree_skeleton(nodes: &[Node], depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Element(el) => {
                let mut line = format!("{}<{}", indent, el.tag);
                for (name, value) in &el.attributes {
                    match value {
                        AttrValue::Text(v) => line.push_str(&format!(" {}={:?}", name, v)),
                        AttrValue::Flag(_) => line.push_str(&format!(" {}", name)),
                    }
                }
                lines.push(line);
                tree_skeleton(&el.children, depth + 1, lines);
            }
            Node::Text(text) => lines.push(format!("{}{:?}", indent, text.content)),
        }
    }
}

/// A nested, well-formed markup fragment built from `seed`. Markup names
/// such as `class` and `for` exercise the prop renaming.
fn generate_fragment(seed: u64) -> String {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move |bound: usize| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as usize) % bound
    };

    let mut out = String::new();
    let roots = 1 + next(3);
    for _ in 0..roots {
        write_fragment(&mut next, 0, &mut out);
    }
    out
}

fn write_fragment(next: &mut impl FnMut(usize) -> usize, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let tag = FRAGMENT_TAGS[next(FRAGMENT_TAGS.len())];

    out.push_str(&indent);
    out.push('<');
    out.push_str(tag);
    let first = next(FRAGMENT_ATTRIBUTES.len());
    for offset in 0..next(4) {
        out.push(' ');
        out.push_str(FRAGMENT_ATTRIBUTES[(first + offset) % FRAGMENT_ATTRIBUTES.len()]);
    }

    if depth >= 3 || next(4) == 0 {
        out.push_str(" />\n");
        return;
    }
    out.push_str(">\n");

    for i in 0..next(4) {
        if next(2) == 0 {
            out.push_str(&format!("{}  item {} of {}\n", indent, i, tag));
        } else {
            write_fragment(next, depth + 1, out);
        }
    }

    out.push_str(&indent);
    out.push_str(&format!("</{}>\n", tag));
}
