//! Extraction of `name = value` assignments from an `info locals` block.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::trace::Locals;
use crate::transcript::classify::classify;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_]*) = ").expect("valid assignment regex")
});

/// Runtime and compiler bookkeeping names that never reach a snapshot.
///
/// Range-for temporaries, static-init guards and container internals printed by libstdc++/glibc.
pub const DENYLIST: &[&str] = &[
    "__for_range",
    "__for_begin",
    "__for_end",
    "__range1",
    "__begin1",
    "__end1",
    "__range2",
    "__begin2",
    "__end2",
    "__range3",
    "__begin3",
    "__end3",
    "__ioinit",
    "__dso_handle",
    "__initialize_p",
    "__priority",
    "_M_impl",
    "_M_t",
    "_M_h",
    "_M_c",
];

pub fn is_denied(name: &str) -> bool {
    DENYLIST.contains(&name)
}

/// Raw `(name, value)` pairs in print order. A value runs until the next line-initial
/// assignment or the end of the block.
pub fn extract_assignments(block: &str) -> Vec<(String, String)> {
    let starts: Vec<(usize, usize, &str)> = ASSIGNMENT
        .captures_iter(block)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let name = c.get(1)?;
            Some((whole.start(), whole.end(), name.as_str()))
        })
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(starts.len());
    for (i, (_, value_start, name)) in starts.iter().enumerate() {
        let value_end = starts.get(i + 1).map_or(block.len(), |next| next.0);
        // gdb prints the innermost scope first; shadowed outer bindings follow
        if is_denied(name) || !seen.insert(*name) {
            continue;
        }
        let value = block[*value_start..value_end].trim();
        out.push((name.to_string(), value.to_string()));
    }
    out
}

/// Extract and classify every visible local of one record.
pub fn extract_locals(block: &str) -> Locals {
    extract_assignments(block)
        .into_iter()
        .map(|(name, value)| {
            let value = classify(&value);
            (name, value)
        })
        .collect()
}
