//! Classification of debugger-printed values.
//!
//! gdb's pretty printers render standard containers as `std::<type> ... = {...}`. The type token
//! is normalized (template arguments and inline ABI namespaces removed) and matched against an
//! ordered rule table; the first match builds the value. Everything else is kept as text with
//! `<...>` annotations stripped. Classification never fails.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::trace::{Kind, Value};

static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("valid annotation regex"));
static BITSET_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bitset<\s*(\d+)").expect("valid bitset width regex"));
static BIT_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]\s*=\s*(\d+)").expect("valid bit position regex"));
static BIT_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[01]+\b").expect("valid bit string regex"));
static REPEATS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*<repeats (\d+) times>$").expect("valid repeats regex")
});
static FIELD_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[[^\]]*\]|[A-Za-z_][A-Za-z0-9_]*)\s*=\s*").expect("valid field regex")
});

/// Inline namespaces inserted by libstdc++ ABI versions and debug mode.
const INLINE_NAMESPACES: &[&str] = &["__cxx11::", "__debug::", "__cxx1998::", "__1::"];

/// Normalized type token of a library value, e.g. `std::map`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeToken {
    /// Last path segment without template arguments (`map`, `unordered_multiset`)
    pub leaf: String,
}

pub struct ContainerRule {
    pub name: &'static str,
    pub matches: fn(&TypeToken) -> bool,
    pub build: fn(&str, &TypeToken) -> Value,
}

pub static CONTAINER_RULES: &[ContainerRule] = &[
    ContainerRule {
        name: "adaptor",
        matches: is_adaptor,
        build: build_adaptor,
    },
    ContainerRule {
        name: "bitset",
        matches: is_bitset,
        build: build_bitset,
    },
    ContainerRule {
        name: "string",
        matches: is_string,
        build: build_string,
    },
    ContainerRule {
        name: "sequence",
        matches: is_sequence,
        build: build_sequence,
    },
    ContainerRule {
        name: "linked_list",
        matches: is_linked_list,
        build: build_linked_list,
    },
    ContainerRule {
        name: "set",
        matches: is_set,
        build: build_set,
    },
    ContainerRule {
        name: "map",
        matches: is_map,
        build: build_map,
    },
    ContainerRule {
        name: "pair",
        matches: is_pair,
        build: build_pair,
    },
    ContainerRule {
        name: "tuple",
        matches: is_tuple,
        build: build_tuple,
    },
];

fn is_adaptor(t: &TypeToken) -> bool {
    matches!(t.leaf.as_str(), "stack" | "queue" | "priority_queue")
}

fn is_bitset(t: &TypeToken) -> bool {
    t.leaf == "bitset"
}

fn is_string(t: &TypeToken) -> bool {
    t.leaf.ends_with("string") || t.leaf.ends_with("string_view")
}

fn is_sequence(t: &TypeToken) -> bool {
    matches!(t.leaf.as_str(), "vector" | "deque")
}

fn is_linked_list(t: &TypeToken) -> bool {
    matches!(t.leaf.as_str(), "list" | "forward_list")
}

fn is_set(t: &TypeToken) -> bool {
    t.leaf.contains("set")
}

fn is_map(t: &TypeToken) -> bool {
    t.leaf.contains("map")
}

fn is_pair(t: &TypeToken) -> bool {
    t.leaf == "pair"
}

fn is_tuple(t: &TypeToken) -> bool {
    t.leaf == "tuple"
}

/// Classify one printed value.
pub fn classify(raw: &str) -> Value {
    let text = raw.trim();
    if let Some(token) = type_token(text) {
        if let Some(rule) = CONTAINER_RULES.iter().find(|rule| (rule.matches)(&token)) {
            return (rule.build)(text, &token);
        }
    }
    if let Some(contents) = string_literal(text) {
        return Value::text(contents);
    }
    Value::text(strip_annotations(text))
}

/// Name of the rule that would classify `raw`, if any.
pub fn rule_name(raw: &str) -> Option<&'static str> {
    let token = type_token(raw.trim())?;
    CONTAINER_RULES
        .iter()
        .find(|rule| (rule.matches)(&token))
        .map(|rule| rule.name)
}

/// Extract and normalize the leading `std::` type token.
pub fn type_token(text: &str) -> Option<TypeToken> {
    if !text.starts_with("std::") {
        return None;
    }

    let mut depth = 0usize;
    let mut end = text.len();
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || c == '=' || c == '{') => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let mut name = strip_template_args(&text[..end]);
    for namespace in INLINE_NAMESPACES {
        name = name.replace(namespace, "");
    }
    let leaf = name.rsplit("::").next().unwrap_or(&name).to_string();
    Some(TypeToken { leaf })
}

fn strip_template_args(token: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Remove `<...>` annotations (symbol names, repeat counts) and tidy whitespace.
pub fn strip_annotations(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = ANNOTATION.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    let tidy = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if tidy.is_empty() {
        text.trim().to_string()
    } else {
        tidy
    }
}

/// Contents of the first top-level `{...}` group. Unterminated groups run to the end.
pub fn brace_body(text: &str) -> Option<&str> {
    let start = find_outside_quotes(text, '{')?;
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quote = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start + 1..start + i]);
                }
            }
            _ => {}
        }
    }
    Some(&text[start + 1..])
}

fn find_outside_quotes(text: &str, needle: char) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
        } else if c == '"' {
            in_quote = true;
        } else if c == needle {
            return Some(i);
        }
    }
    None
}

/// Split on commas outside brackets, quotes and template argument lists.
pub fn split_top_level(body: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut angle = 0usize;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;

    for c in body.chars() {
        if let Some(quote) = in_quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_quote = None;
            }
            prev = Some(c);
            continue;
        }

        match c {
            '"' | '\'' => in_quote = Some(c),
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            '<' if prev.is_some_and(|p| p.is_alphanumeric() || p == '_' || p == ':') => {
                angle += 1
            }
            '>' if angle > 0 => angle -= 1,
            ',' if depth == 0 && angle == 0 => {
                push_part(&mut parts, &current);
                current.clear();
                prev = Some(c);
                continue;
            }
            _ => {}
        }
        current.push(c);
        prev = Some(c);
    }
    push_part(&mut parts, &current);
    parts
}

fn push_part(parts: &mut Vec<String>, raw: &str) {
    let part = raw.trim();
    if part.is_empty() {
        return;
    }
    // "std::vector of length 2, capacity 2 = {...}" carries a comma in its header
    if part.starts_with("capacity ") {
        if let Some(last) = parts.last_mut() {
            last.push_str(", ");
            last.push_str(part);
            return;
        }
    }
    parts.push(part.to_string());
}

/// `[k] = v` and `field = v` reduce to `v`.
pub fn reduce_field(element: &str) -> &str {
    match FIELD_PREFIX.find(element) {
        Some(m) => element[m.end()..].trim(),
        None => element.trim(),
    }
}

fn elements(text: &str) -> Vec<String> {
    brace_body(text)
        .map(split_top_level)
        .unwrap_or_default()
        .into_iter()
        .flat_map(expand_repeats)
        .collect()
}

/// `0 <repeats 12 times>` stands for twelve elements.
fn expand_repeats(element: String) -> Vec<String> {
    let Some(captures) = REPEATS.captures(&element) else {
        return vec![element];
    };
    match captures[2].parse::<usize>() {
        Ok(count) => vec![captures[1].to_string(); count],
        Err(_) => vec![element],
    }
}

fn classified_fields(text: &str) -> Vec<Value> {
    elements(text)
        .iter()
        .map(|element| classify(reduce_field(element)))
        .collect()
}

fn build_adaptor(text: &str, token: &TypeToken) -> Value {
    let kind = match token.leaf.as_str() {
        "stack" => Kind::Stack,
        "queue" => Kind::Queue,
        _ => Kind::PriorityQueue,
    };
    Value::elements(kind, None, classified_fields(text))
}

fn build_string(text: &str, _: &TypeToken) -> Value {
    match quoted(text) {
        Some(contents) => Value::text(contents),
        None => Value::text(strip_annotations(text)),
    }
}

/// Contents of `text` when it is exactly one double-quoted literal.
fn string_literal(text: &str) -> Option<&str> {
    if !text.starts_with('"') {
        return None;
    }
    let contents = quoted(text)?;
    (contents.len() + 2 == text.len()).then_some(contents)
}

/// Text between the first pair of unescaped double quotes.
fn quoted(text: &str) -> Option<&str> {
    let start = text.find('"')? + 1;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(&text[start..start + i]),
            _ => {}
        }
    }
    None
}

fn build_sequence(text: &str, token: &TypeToken) -> Value {
    let kind = if token.leaf == "deque" {
        Kind::Deque
    } else {
        Kind::Vector
    };
    let values = elements(text).iter().map(|e| classify(e)).collect();
    Value::elements(kind, None, values)
}

fn build_linked_list(text: &str, token: &TypeToken) -> Value {
    let kind = if token.leaf == "forward_list" {
        Kind::ForwardList
    } else {
        Kind::LinkedList
    };
    Value::elements(kind, None, classified_fields(text))
}

fn build_set(text: &str, token: &TypeToken) -> Value {
    let kind = Kind::set_family(
        token.leaf.contains("multi"),
        token.leaf.contains("unordered"),
    );
    Value::elements(kind, None, classified_fields(text))
}

fn build_map(text: &str, token: &TypeToken) -> Value {
    let kind = Kind::map_family(
        token.leaf.contains("multi"),
        token.leaf.contains("unordered"),
    );

    let mut values = BTreeMap::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (index, element) in elements(text).iter().enumerate() {
        let (key, value) = match map_entry(element) {
            Some((key, value)) => (key, classify(value)),
            None => (index.to_string(), classify(element)),
        };
        let count = seen.entry(key.clone()).or_insert(0);
        *count += 1;
        let key = if *count == 1 {
            key
        } else {
            format!("{key}#{count}")
        };
        values.insert(key, value);
    }
    Value::entries(kind, None, values)
}

/// Split `[key] = value` into an unquoted key and the raw value.
fn map_entry(element: &str) -> Option<(String, &str)> {
    let rest = element.trim_start().strip_prefix('[')?;
    let mut depth = 1usize;
    let mut close = None;
    for (i, c) in rest.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    let key = rest[..close].trim();
    let key = key
        .strip_prefix('"')
        .and_then(|k| k.strip_suffix('"'))
        .unwrap_or(key);
    let value = rest[close + 1..].trim_start();
    let value = value.strip_prefix('=').unwrap_or(value).trim();
    Some((key.to_string(), value))
}

fn build_pair(text: &str, _: &TypeToken) -> Value {
    let mut first = Value::null();
    let mut second = Value::null();
    for element in elements(text) {
        if let Some(value) = element.strip_prefix("first") {
            first = classify(value.trim_start().trim_start_matches('=').trim());
        } else if let Some(value) = element.strip_prefix("second") {
            second = classify(value.trim_start().trim_start_matches('=').trim());
        }
    }
    Value::pair(first, second)
}

fn build_tuple(text: &str, _: &TypeToken) -> Value {
    Value::elements(Kind::Tuple, None, classified_fields(text))
}

fn build_bitset(text: &str, _: &TypeToken) -> Value {
    let declared = BITSET_WIDTH
        .captures(text)
        .and_then(|c| c[1].parse::<usize>().ok());
    let payload = value_part(text);

    let positions: Vec<usize> = BIT_POSITION
        .captures_iter(payload)
        .filter(|c| &c[2] != "0")
        .filter_map(|c| c[1].parse::<usize>().ok())
        .collect();

    let bits: String = if !positions.is_empty() {
        let width = declared.unwrap_or_else(|| positions.iter().max().map_or(0, |m| m + 1));
        let mut bits = vec!['0'; width];
        for position in positions.into_iter().filter(|p| *p < width) {
            bits[width - 1 - position] = '1';
        }
        bits.into_iter().collect()
    } else {
        BIT_STRING
            .find(payload)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    let width = declared.unwrap_or(bits.len());
    let bits = if bits.len() >= width {
        bits[bits.len() - width..].to_string()
    } else {
        format!("{}{}", "0".repeat(width - bits.len()), bits)
    };

    let values = bits.chars().map(|c| Value::text(c.to_string())).collect();
    Value::elements(Kind::Bitset, None, values)
}

/// Text after the first top-level ` = ` separating a printed header from its contents.
fn value_part(text: &str) -> &str {
    let mut depth = 0usize;
    let bytes = text.as_bytes();
    for (i, c) in text.char_indices() {
        match c {
            '<' | '{' | '[' => depth += 1,
            '>' | '}' | ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 && i > 0 && bytes[i - 1] == b' ' => return text[i + 1..].trim(),
            _ => {}
        }
    }
    ""
}
