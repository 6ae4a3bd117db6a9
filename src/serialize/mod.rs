//! Live object serializer.
//!
//! Converts the object graph captured by the tracer harness into the [`Value`] model. The walk
//! is depth-first; an identity seen before is replaced by a `circular_ref` marker, so
//! self-referential and shared structures always terminate.

pub mod heap;
pub mod rules;

use std::collections::{BTreeMap, HashSet};

pub use heap::{HeapObject, HeapSnapshot, ObjectRef};

use crate::trace::{Identity, Locals, Value};

/// Nesting depth after which nodes are emitted as `unknown` with their `repr`.
pub const MAX_DEPTH: usize = 256;

/// Serialize `value` against `heap`, recording visited identities in `visited`.
pub fn serialize(value: &ObjectRef, heap: &HeapSnapshot, visited: &mut HashSet<Identity>) -> Value {
    Serializer::new(heap, visited).serialize(value)
}

/// Serialize every visible local of a frame, each with a fresh visited set.
pub fn serialize_locals(locals: &BTreeMap<String, ObjectRef>, heap: &HeapSnapshot) -> Locals {
    locals
        .iter()
        .filter(|(name, _)| is_visible_local(name))
        .map(|(name, value)| {
            let mut visited = HashSet::new();
            (name.clone(), serialize(value, heap, &mut visited))
        })
        .collect()
}

/// Dunder bindings and compiler-generated names (`.0` in comprehensions) stay hidden.
pub fn is_visible_local(name: &str) -> bool {
    !name.starts_with("__") && !name.starts_with('.')
}

pub struct Serializer<'a> {
    heap: &'a HeapSnapshot,
    visited: &'a mut HashSet<Identity>,
    depth: usize,
}

impl<'a> Serializer<'a> {
    pub fn new(heap: &'a HeapSnapshot, visited: &'a mut HashSet<Identity>) -> Self {
        Self {
            heap,
            visited,
            depth: 0,
        }
    }

    pub fn heap(&self) -> &'a HeapSnapshot {
        self.heap
    }

    pub fn serialize(&mut self, value: &ObjectRef) -> Value {
        let id = match value {
            // Primitive identity is meaningless; never cycle-check it.
            ObjectRef::Primitive(p) => return Value::Primitive(p.clone()),
            ObjectRef::Ref { id } => *id,
        };

        if self.visited.contains(&id) {
            return Value::circular(id);
        }
        self.visited.insert(id);

        let Some(object) = self.heap.get(id) else {
            tracing::debug!(id, "Reference missing from heap snapshot");
            return Value::unknown(Some(id), "<unavailable>");
        };

        if self.depth >= MAX_DEPTH {
            return Value::unknown(Some(id), object.repr.clone());
        }

        match rules::rule_for(object) {
            Some(rule) => {
                self.depth += 1;
                let value = (rule.build)(self, id, object);
                self.depth -= 1;
                value
            }
            None => Value::unknown(Some(id), object.repr.clone()),
        }
    }

    pub fn serialize_all(&mut self, values: &[ObjectRef]) -> Vec<Value> {
        values.iter().map(|value| self.serialize(value)).collect()
    }
}
