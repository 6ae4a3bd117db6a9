//! Heap snapshot emitted by the tracer harness for one hook event.
//!
//! The harness flattens everything reachable from a frame's locals into a table keyed by
//! runtime identity. Objects are described by raw facts only; classification happens in
//! [`crate::serialize::rules`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::trace::{Identity, Primitive};

/// Reference from a local, element, entry or attribute to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectRef {
    Ref {
        #[serde(rename = "$ref")]
        id: Identity,
    },
    Primitive(Primitive),
}

impl ObjectRef {
    pub fn to(id: Identity) -> Self {
        ObjectRef::Ref { id }
    }
}

impl From<Primitive> for ObjectRef {
    fn from(p: Primitive) -> Self {
        ObjectRef::Primitive(p)
    }
}

/// Raw runtime facts about one complex object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapObject {
    pub class_name: String,
    /// `repr()` of the object
    pub repr: String,
    /// `str()` of the object, used to order set elements
    pub text: String,
    /// `__name__`, when the object has one
    pub name: Option<String>,
    pub module: bool,
    pub list: bool,
    pub tuple: bool,
    pub set: bool,
    pub frozenset: bool,
    pub dict: bool,
    pub callable: bool,
    /// Elements of lists, tuples and sets in iteration order
    pub items: Vec<ObjectRef>,
    /// Dict entries with stringified keys, in insertion order
    pub entries: Vec<(String, ObjectRef)>,
    /// Instance `__dict__`, absent for objects without one
    pub attributes: Option<BTreeMap<String, ObjectRef>>,
}

/// Identity-keyed table of the objects reachable from one frame.
///
/// Keys stay in their JSON string form: the snapshot travels inside an internally tagged event,
/// and buffered map keys never coerce back to integers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeapSnapshot {
    objects: HashMap<String, HeapObject>,
}

impl HeapSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: Identity, object: HeapObject) {
        self.objects.insert(id.to_string(), object);
    }

    pub fn get(&self, id: Identity) -> Option<&HeapObject> {
        self.objects.get(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Textual representation of a reference, as used for set ordering.
    pub fn text_of(&self, value: &ObjectRef) -> String {
        match value {
            ObjectRef::Primitive(p) => p.display_text(),
            ObjectRef::Ref { id } => self
                .get(*id)
                .map(|object| object.text.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_harness_heap() {
        let heap: HeapSnapshot = serde_json::from_value(json!({
            "140": {
                "class_name": "list",
                "repr": "[1, 'a']",
                "text": "[1, 'a']",
                "list": true,
                "items": [1, "a"]
            },
            "141": {
                "class_name": "Node",
                "attributes": {"val": 1, "next": {"$ref": 141}}
            }
        }))
        .expect("heap parses");

        assert_eq!(heap.len(), 2);
        let list = heap.get(140).unwrap();
        assert!(list.list);
        assert_eq!(list.items.len(), 2);

        let node = heap.get(141).unwrap();
        let attrs = node.attributes.as_ref().unwrap();
        assert_eq!(attrs.get("next"), Some(&ObjectRef::to(141)));
        assert!(!node.callable);
    }

    #[test]
    fn test_text_of_missing_object_is_empty() {
        let heap = HeapSnapshot::new();
        assert_eq!(heap.text_of(&ObjectRef::to(1)), "");
        assert_eq!(heap.text_of(&ObjectRef::Primitive(Primitive::Bool(false))), "False");
    }
}
