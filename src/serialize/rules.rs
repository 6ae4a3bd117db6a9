//! Shape classification for live objects.
//!
//! Rules are tried in order and the first match builds the value. The order encodes the
//! precedence module → sequence → set → associative → callable → attribute object; anything left
//! over is `unknown`.

use std::collections::BTreeMap;

use crate::serialize::heap::{HeapObject, ObjectRef};
use crate::serialize::Serializer;
use crate::trace::{Identity, Kind, Primitive, Value};

/// Fallback name for callables without `__name__`.
pub const UNKNOWN_CALLABLE: &str = "unknown_callable";

pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&HeapObject) -> bool,
    pub build: fn(&mut Serializer<'_>, Identity, &HeapObject) -> Value,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "module",
        matches: is_module,
        build: build_module,
    },
    Rule {
        name: "list",
        matches: is_list,
        build: build_list,
    },
    Rule {
        name: "tuple",
        matches: is_tuple,
        build: build_tuple,
    },
    Rule {
        name: "set",
        matches: is_set,
        build: build_set,
    },
    Rule {
        name: "dict",
        matches: is_dict,
        build: build_dict,
    },
    Rule {
        name: "callable",
        matches: is_callable,
        build: build_function,
    },
    Rule {
        name: "attributes",
        matches: has_attributes,
        build: build_object,
    },
];

/// Name of the first rule matching `object`, `None` when it falls back to `unknown`.
pub fn rule_for(object: &HeapObject) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(object))
}

/// Attributes with implementation-private names never reach a snapshot.
pub fn is_internal_name(name: &str) -> bool {
    name.starts_with("__")
}

fn is_module(o: &HeapObject) -> bool {
    o.module
}

fn is_list(o: &HeapObject) -> bool {
    o.list
}

fn is_tuple(o: &HeapObject) -> bool {
    o.tuple
}

fn is_set(o: &HeapObject) -> bool {
    o.set || o.frozenset
}

fn is_dict(o: &HeapObject) -> bool {
    o.dict
}

fn is_callable(o: &HeapObject) -> bool {
    o.callable
}

fn has_attributes(o: &HeapObject) -> bool {
    o.attributes.is_some()
}

fn build_module(_: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    let name = o.name.clone().unwrap_or_else(|| o.class_name.clone());
    Value::module(Some(id), name)
}

fn build_list(s: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    Value::elements(Kind::List, Some(id), s.serialize_all(&o.items))
}

fn build_tuple(s: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    Value::elements(Kind::Tuple, Some(id), s.serialize_all(&o.items))
}

fn build_set(s: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    let mut keyed: Vec<(String, u8, &ObjectRef)> = o
        .items
        .iter()
        .map(|item| (s.heap().text_of(item), type_rank(item), item))
        .collect();
    // Equal texts (`1` and `"1"`) fall back to the element type so order never depends on
    // iteration order.
    keyed.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

    let values = keyed
        .into_iter()
        .map(|(_, _, item)| s.serialize(item))
        .collect();
    Value::elements(Kind::Set, Some(id), values)
}

fn type_rank(item: &ObjectRef) -> u8 {
    match item {
        ObjectRef::Primitive(Primitive::Null) => 0,
        ObjectRef::Primitive(Primitive::Bool(_)) => 1,
        ObjectRef::Primitive(Primitive::Number(_)) => 2,
        ObjectRef::Primitive(Primitive::Text(_)) => 3,
        ObjectRef::Ref { .. } => 4,
    }
}

fn build_dict(s: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    let mut values = BTreeMap::new();
    for (key, item) in &o.entries {
        let value = s.serialize(item);
        values.insert(key.clone(), value);
    }
    Value::entries(Kind::Dict, Some(id), values)
}

fn build_function(_: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    let name = o.name.as_deref().unwrap_or(UNKNOWN_CALLABLE);
    Value::function(Some(id), name)
}

fn build_object(s: &mut Serializer<'_>, id: Identity, o: &HeapObject) -> Value {
    let Some(raw) = o.attributes.as_ref() else {
        return Value::unknown(Some(id), o.repr.clone());
    };

    let mut attributes = BTreeMap::new();
    for (name, item) in raw {
        if is_internal_name(name) {
            continue;
        }
        let value = s.serialize(item);
        attributes.insert(name.clone(), value);
    }

    let kind = node_kind(&attributes);
    Value::object(kind, Some(id), o.class_name.clone(), attributes)
}

/// Sub-classify an attribute object by the names it carries.
fn node_kind<V>(attributes: &BTreeMap<String, V>) -> Kind {
    let has = |name: &str| attributes.contains_key(name);
    if has("val") && has("next") && !has("left") {
        Kind::LinkedListNode
    } else if has("val") && has("left") && has("right") {
        Kind::TreeNode
    } else {
        Kind::Object
    }
}
