//! The Registrar: turns a type tree's flat pre-order node list into an
//! index-keyed arena of [`ClassView`]s the generic deserializer can walk
//! without re-scanning the flat list for every nested composite.
//!
//! A composite type's fields are exactly the run of nodes one level
//! deeper than it, up to (but not including) the next node at its own
//! level or shallower. Walking the flat list with a level-indexed stack
//! finds these runs in one pass.

use indexmap::IndexMap;

use super::types::{ClassView, TypeField, TypeTree};

/// Populate `tree.class_views` from `tree.nodes`. Idempotent: clears any
/// existing entries first.
pub fn register_type_tree(tree: &mut TypeTree) {
    let mut class_views = IndexMap::new();
    let mut stack: Vec<(TypeField, Vec<TypeField>)> = Vec::new();
    let mut cursor: Option<TypeField> = None;

    for node in &tree.nodes {
        if let Some(cur) = &cursor {
            if cur.level == node.level {
                if let Some((_, fields)) = stack.last_mut() {
                    fields.push(node.clone());
                }
            } else if cur.level < node.level {
                stack.push((cur.clone(), vec![node.clone()]));
            } else {
                for _ in 0..(cur.level - node.level) {
                    if let Some((t, fields)) = stack.pop() {
                        class_views.insert(
                            t.index,
                            ClassView {
                                name: t.type_name.clone(),
                                index: t.index,
                                fields,
                            },
                        );
                    }
                }
                if let Some((_, fields)) = stack.last_mut() {
                    fields.push(node.clone());
                }
            }
        }
        cursor = Some(node.clone());
    }

    while let Some((t, fields)) = stack.pop() {
        class_views.insert(
            t.index,
            ClassView {
                name: t.type_name.clone(),
                index: t.index,
                fields,
            },
        );
    }

    tree.class_views = class_views;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(level: u8, index: i32, type_name: &str, is_array: bool, byte_size: i32) -> TypeField {
        TypeField {
            version: 1,
            level,
            is_array,
            type_str_offset: 0,
            name_str_offset: 0,
            byte_size,
            index,
            meta_flag: 0,
            type_name: type_name.to_string(),
            field_name: format!("field{index}"),
        }
    }

    #[test]
    fn flat_record_has_one_class_view() {
        let mut tree = TypeTree {
            persistent_type_id: 1,
            is_stripped_type: false,
            script_type_index: -1,
            script_type_hash: None,
            type_hash: [0; 16],
            nodes: vec![
                field(0, 0, "MyClass", false, -1),
                field(1, 1, "int", false, 4),
                field(1, 2, "float", false, 4),
            ],
            class_views: IndexMap::new(),
        };
        register_type_tree(&mut tree);
        assert_eq!(tree.class_views.len(), 1);
        let root = tree.root().unwrap();
        assert_eq!(root.fields.len(), 2);
    }

    #[test]
    fn nested_composite_gets_own_class_view() {
        let mut tree = TypeTree {
            persistent_type_id: 1,
            is_stripped_type: false,
            script_type_index: -1,
            script_type_hash: None,
            type_hash: [0; 16],
            nodes: vec![
                field(0, 0, "MyClass", false, -1),
                field(1, 1, "Vector3f", false, -1),
                field(2, 2, "float", false, 4),
                field(2, 3, "float", false, 4),
                field(2, 4, "float", false, 4),
                field(1, 5, "int", false, 4),
            ],
            class_views: IndexMap::new(),
        };
        register_type_tree(&mut tree);
        assert_eq!(tree.class_views.len(), 2);
        assert_eq!(tree.root().unwrap().fields.len(), 2);
        assert_eq!(tree.class_views.get(&1).unwrap().fields.len(), 3);
    }
}
