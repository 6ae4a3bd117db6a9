//! Value model shared by every trace producer.
//!
//! A [`Value`] is either a primitive carried verbatim or a [`Complex`] node tagged with a
//! [`Kind`]. Complex nodes produced by the instrumented path carry the runtime identity of the
//! object they were built from; identities exist only for cycle detection and are ignored by
//! equality.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime identity token of a live object.
pub type Identity = u64;

/// Variable mapping of a single step, ordered by name.
pub type Locals = BTreeMap<String, Value>;

/// Scalar carried verbatim from the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Primitive {
    /// Python-style `str()` rendering, used as the sort key of set elements.
    pub fn display_text(&self) -> String {
        match self {
            Primitive::Null => "None".to_string(),
            Primitive::Bool(true) => "True".to_string(),
            Primitive::Bool(false) => "False".to_string(),
            Primitive::Number(n) => n.to_string(),
            Primitive::Text(s) => s.clone(),
        }
    }
}

/// Closed set of complex value tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Module,
    Function,
    // Sequence-like
    List,
    Tuple,
    Vector,
    Deque,
    Stack,
    Queue,
    PriorityQueue,
    LinkedList,
    ForwardList,
    // Set-like
    Set,
    Multiset,
    UnorderedSet,
    UnorderedMultiset,
    // Associative
    Dict,
    Map,
    Multimap,
    UnorderedMap,
    UnorderedMultimap,
    Pair,
    Bitset,
    // Attribute-bearing
    LinkedListNode,
    TreeNode,
    Object,
    CircularRef,
    Unknown,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Module => "module",
            Kind::Function => "function",
            Kind::List => "list",
            Kind::Tuple => "tuple",
            Kind::Vector => "vector",
            Kind::Deque => "deque",
            Kind::Stack => "stack",
            Kind::Queue => "queue",
            Kind::PriorityQueue => "priority_queue",
            Kind::LinkedList => "linked_list",
            Kind::ForwardList => "forward_list",
            Kind::Set => "set",
            Kind::Multiset => "multiset",
            Kind::UnorderedSet => "unordered_set",
            Kind::UnorderedMultiset => "unordered_multiset",
            Kind::Dict => "dict",
            Kind::Map => "map",
            Kind::Multimap => "multimap",
            Kind::UnorderedMap => "unordered_map",
            Kind::UnorderedMultimap => "unordered_multimap",
            Kind::Pair => "pair",
            Kind::Bitset => "bitset",
            Kind::LinkedListNode => "linked_list_node",
            Kind::TreeNode => "tree_node",
            Kind::Object => "object",
            Kind::CircularRef => "circular_ref",
            Kind::Unknown => "unknown",
        }
    }

    /// Set kind selected by the `multi` / `unordered` qualifiers of a container name.
    pub fn set_family(multi: bool, unordered: bool) -> Self {
        match (unordered, multi) {
            (false, false) => Kind::Set,
            (false, true) => Kind::Multiset,
            (true, false) => Kind::UnorderedSet,
            (true, true) => Kind::UnorderedMultiset,
        }
    }

    /// Map kind selected by the `multi` / `unordered` qualifiers of a container name.
    pub fn map_family(multi: bool, unordered: bool) -> Self {
        match (unordered, multi) {
            (false, false) => Kind::Map,
            (false, true) => Kind::Multimap,
            (true, false) => Kind::UnorderedMap,
            (true, true) => Kind::UnorderedMultimap,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape-specific payload of a complex value.
///
/// Variant order matters for deserialization: the first shape whose fields are present wins,
/// and `Empty` accepts anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Attributes {
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, Value>,
    },
    Pair {
        first: Box<Value>,
        second: Box<Value>,
    },
    Named {
        name: String,
    },
    Opaque {
        repr: String,
    },
    Elements {
        values: Vec<Value>,
    },
    Entries {
        values: BTreeMap<String, Value>,
    },
    Empty {},
}

/// A tagged complex value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complex {
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identity>,
    #[serde(flatten)]
    pub body: Body,
}

impl PartialEq for Complex {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.body == other.body
    }
}

/// A normalized variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Primitive(Primitive),
    Complex(Box<Complex>),
}

impl Value {
    fn complex(kind: Kind, id: Option<Identity>, body: Body) -> Self {
        Value::Complex(Box::new(Complex { kind, id, body }))
    }

    pub fn null() -> Self {
        Value::Primitive(Primitive::Null)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Value::Primitive(Primitive::Text(text.into()))
    }

    pub fn module(id: Option<Identity>, name: impl Into<String>) -> Self {
        Self::complex(Kind::Module, id, Body::Named { name: name.into() })
    }

    pub fn function(id: Option<Identity>, name: impl Into<String>) -> Self {
        Self::complex(Kind::Function, id, Body::Named { name: name.into() })
    }

    /// Element container: sequences, sets and bitsets.
    pub fn elements(kind: Kind, id: Option<Identity>, values: Vec<Value>) -> Self {
        Self::complex(kind, id, Body::Elements { values })
    }

    /// Associative container with stringified keys.
    pub fn entries(kind: Kind, id: Option<Identity>, values: BTreeMap<String, Value>) -> Self {
        Self::complex(kind, id, Body::Entries { values })
    }

    pub fn pair(first: Value, second: Value) -> Self {
        Self::complex(
            Kind::Pair,
            None,
            Body::Pair {
                first: Box::new(first),
                second: Box::new(second),
            },
        )
    }

    /// Attribute-bearing object (`object`, `linked_list_node`, `tree_node`).
    pub fn object(
        kind: Kind,
        id: Option<Identity>,
        class_name: impl Into<String>,
        attributes: BTreeMap<String, Value>,
    ) -> Self {
        Self::complex(
            kind,
            id,
            Body::Attributes {
                class_name: class_name.into(),
                attributes,
            },
        )
    }

    pub fn circular(id: Identity) -> Self {
        Self::complex(Kind::CircularRef, Some(id), Body::Empty {})
    }

    pub fn unknown(id: Option<Identity>, repr: impl Into<String>) -> Self {
        Self::complex(Kind::Unknown, id, Body::Opaque { repr: repr.into() })
    }

    /// Tag of a complex value, `None` for primitives.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Value::Primitive(_) => None,
            Value::Complex(c) => Some(c.kind),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Primitive(Primitive::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Elements of a sequence, set or bitset.
    pub fn elements_of(&self) -> Option<&[Value]> {
        match self {
            Value::Complex(c) => match &c.body {
                Body::Elements { values } => Some(values),
                _ => None,
            },
            _ => None,
        }
    }

    /// Entries of an associative container.
    pub fn entries_of(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Complex(c) => match &c.body {
                Body::Entries { values } => Some(values),
                _ => None,
            },
            _ => None,
        }
    }

    /// Attributes of an attribute-bearing object.
    pub fn attributes_of(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Complex(c) => match &c.body {
                Body::Attributes { attributes, .. } => Some(attributes),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Primitive(Primitive::Number(n.into()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}
