//! Facts recovered from the traced source that the debugger does not print.
//!
//! The libstdc++ bitset printer omits the template width, so an all-zero `std::bitset<8>`
//! prints with no bits at all. Widths are read from the declarations instead and applied to
//! the classified locals of the same name.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::trace::{Kind, Locals, Value};

static BITSET_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bbitset\s*<\s*(\d+)\s*>\s*([^;(){}]*)").expect("valid bitset declaration regex")
});
static DECLARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[&*\s]*([A-Za-z_][A-Za-z0-9_]*)").expect("valid declarator regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHints {
    bitset_widths: HashMap<String, usize>,
}

impl SourceHints {
    /// Scan `source` for `bitset<N> name[, name...]` declarations.
    ///
    /// A name declared more than once keeps its last width.
    pub fn from_source(source: &str) -> Self {
        let mut bitset_widths = HashMap::new();
        for captures in BITSET_DECLARATION.captures_iter(source) {
            let Ok(width) = captures[1].parse::<usize>() else {
                continue;
            };
            for declarator in captures[2].split(',') {
                if let Some(name) = DECLARATOR.captures(declarator) {
                    bitset_widths.insert(name[1].to_string(), width);
                }
            }
        }
        Self { bitset_widths }
    }

    pub fn bitset_width(&self, name: &str) -> Option<usize> {
        self.bitset_widths.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bitset_widths.is_empty()
    }

    /// Resize bitset locals to their declared width.
    pub fn apply(&self, locals: &mut Locals) {
        for (name, value) in locals.iter_mut() {
            let Some(width) = self.bitset_width(name) else {
                continue;
            };
            if let Some(resized) = resize_bitset(value, width) {
                *value = resized;
            }
        }
    }
}

/// Left-pad with zeros or keep the low `width` bits; `None` for anything but a bitset.
fn resize_bitset(value: &Value, width: usize) -> Option<Value> {
    if value.kind() != Some(Kind::Bitset) {
        return None;
    }
    let bits = value.elements_of()?;
    // Least significant bit first while resizing
    let mut resized: Vec<Value> = bits.iter().rev().take(width).cloned().collect();
    resized.resize(width, Value::text("0"));
    resized.reverse();
    Some(Value::elements(Kind::Bitset, None, resized))
}
