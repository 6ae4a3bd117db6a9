//! Property tests for the live object serializer
//!
//! Random heaps with self, mutual and dangling references must always serialize, never expand
//! the same object twice within one local, and render sets independently of iteration order.

use std::collections::{BTreeMap, HashMap, HashSet};

use proptest::prelude::*;
use steptrace::serialize::{serialize, serialize_locals, HeapObject, HeapSnapshot, ObjectRef};
use steptrace::trace::{Body, Identity, Kind, Primitive, Value};

fn num(n: i64) -> ObjectRef {
    ObjectRef::Primitive(Primitive::Number(n.into()))
}

fn arb_primitive() -> impl Strategy<Value = ObjectRef> {
    prop_oneof![
        Just(ObjectRef::Primitive(Primitive::Null)),
        any::<bool>().prop_map(|b| ObjectRef::Primitive(Primitive::Bool(b))),
        (-3i64..4).prop_map(num),
        "[a-c1-3]{0,2}".prop_map(|s| ObjectRef::Primitive(Primitive::Text(s))),
    ]
}

/// References into `1..=size`, plus one identity past the end that is never in the heap.
fn arb_ref(size: u64) -> impl Strategy<Value = ObjectRef> {
    prop_oneof![
        3 => (1..=size + 1).prop_map(ObjectRef::to),
        1 => arb_primitive(),
    ]
}

fn arb_object(size: u64) -> impl Strategy<Value = HeapObject> {
    (
        0u8..5,
        prop::collection::vec(arb_ref(size), 0..4),
        prop::collection::vec(arb_primitive(), 0..5),
    )
        .prop_map(|(shape, refs, primitives)| {
            let mut object = HeapObject {
                repr: "<object>".into(),
                text: "<object>".into(),
                ..Default::default()
            };
            match shape {
                0 => {
                    object.class_name = "list".into();
                    object.list = true;
                    object.items = refs;
                }
                1 => {
                    object.class_name = "tuple".into();
                    object.tuple = true;
                    object.items = refs;
                }
                2 => {
                    // Set members are hashable scalars
                    object.class_name = "set".into();
                    object.set = true;
                    object.items = primitives;
                }
                3 => {
                    object.class_name = "dict".into();
                    object.dict = true;
                    object.entries = refs
                        .into_iter()
                        .enumerate()
                        .map(|(i, r)| (format!("k{i}"), r))
                        .collect();
                }
                _ => {
                    object.class_name = "Node".into();
                    object.attributes = Some(
                        refs.into_iter()
                            .enumerate()
                            .map(|(i, r)| (format!("a{i}"), r))
                            .collect(),
                    );
                }
            }
            object
        })
}

fn arb_heap() -> impl Strategy<Value = HeapSnapshot> {
    (1u64..8).prop_flat_map(|size| {
        prop::collection::vec(arb_object(size), size as usize).prop_map(|objects| {
            let mut heap = HeapSnapshot::new();
            for (id, object) in (1..).zip(objects) {
                heap.insert(id, object);
            }
            heap
        })
    })
}

fn children(value: &Value) -> Vec<&Value> {
    let Value::Complex(complex) = value else {
        return Vec::new();
    };
    match &complex.body {
        Body::Attributes { attributes, .. } => attributes.values().collect(),
        Body::Pair { first, second } => vec![first.as_ref(), second.as_ref()],
        Body::Elements { values } => values.iter().collect(),
        Body::Entries { values } => values.values().collect(),
        Body::Named { .. } | Body::Opaque { .. } | Body::Empty {} => Vec::new(),
    }
}

/// Count expanded nodes per identity and collect `circular_ref` targets.
fn tally(value: &Value, expanded: &mut HashMap<Identity, usize>, circular: &mut HashSet<Identity>) {
    if let Value::Complex(complex) = value {
        if let Some(id) = complex.id {
            if complex.kind == Kind::CircularRef {
                circular.insert(id);
            } else {
                *expanded.entry(id).or_insert(0) += 1;
            }
        }
    }
    for child in children(value) {
        tally(child, expanded, circular);
    }
}

fn reverse_sets(heap: &HeapSnapshot, size: u64) -> HeapSnapshot {
    let mut reversed = HeapSnapshot::new();
    for id in 1..=size {
        if let Some(object) = heap.get(id) {
            let mut object = object.clone();
            if object.set {
                object.items.reverse();
            }
            reversed.insert(id, object);
        }
    }
    reversed
}

proptest! {
    #[test]
    fn prop_each_identity_expands_at_most_once(heap in arb_heap(), root in 1u64..9) {
        let value = serialize(&ObjectRef::to(root), &heap, &mut HashSet::new());

        let mut expanded = HashMap::new();
        let mut circular = HashSet::new();
        tally(&value, &mut expanded, &mut circular);

        for (id, count) in &expanded {
            prop_assert_eq!(*count, 1, "identity {} expanded {} times", id, count);
        }
        for id in &circular {
            prop_assert!(expanded.contains_key(id), "circular_ref {} has no expanded target", id);
        }
    }

    #[test]
    fn prop_set_order_is_independent_of_iteration(heap in arb_heap(), root in 1u64..9) {
        let reversed = reverse_sets(&heap, heap.len() as u64);
        let a = serialize(&ObjectRef::to(root), &heap, &mut HashSet::new());
        let b = serialize(&ObjectRef::to(root), &reversed, &mut HashSet::new());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_set_members_any_permutation(
        (items, shuffled) in prop::collection::vec(arb_primitive(), 0..8)
            .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle()))
    ) {
        let mut heap = HeapSnapshot::new();
        for (id, members) in [(1, items), (2, shuffled)] {
            heap.insert(
                id,
                HeapObject {
                    class_name: "set".into(),
                    set: true,
                    items: members,
                    ..Default::default()
                },
            );
        }
        let a = serialize(&ObjectRef::to(1), &heap, &mut HashSet::new());
        let b = serialize(&ObjectRef::to(2), &heap, &mut HashSet::new());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_every_local_is_serialized(heap in arb_heap()) {
        let locals: BTreeMap<String, ObjectRef> = (1..=heap.len() as u64)
            .map(|id| (format!("v{id}"), ObjectRef::to(id)))
            .collect();

        let out = serialize_locals(&locals, &heap);
        prop_assert_eq!(out.len(), locals.len());
        for value in out.values() {
            // Each local starts from a fresh visited set, so its root is always expanded
            prop_assert_ne!(value.kind(), Some(Kind::CircularRef));
        }
    }
}
