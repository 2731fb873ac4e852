//! The flat, pre-order depth-annotated field list decoded straight off
//! the wire, before the Registrar turns it into an indexable class view.

use indexmap::IndexMap;

/// One node of a type tree's flat pre-order encoding.
#[derive(Debug, Clone, Default)]
pub struct TypeField {
    pub version: i16,
    pub level: u8,
    pub is_array: bool,
    pub type_str_offset: u32,
    pub name_str_offset: u32,
    pub byte_size: i32,
    pub index: i32,
    pub meta_flag: u32,
    /// Resolved from `type_str_offset` against the built-in table or this
    /// tree's own string buffer.
    pub type_name: String,
    /// Resolved from `name_str_offset` the same way.
    pub field_name: String,
}

impl TypeField {
    /// Bit 0x4000 of `meta_flag`: the field must be 4-byte aligned after
    /// it is read, even though it isn't an array or string.
    pub fn align_after(&self) -> bool {
        self.meta_flag & 0x4000 != 0
    }
}

/// One persistent-type's type tree: the class's own fields, all nested
/// composite types it contains, and (for `MonoBehaviour`) the extra
/// script-type identity fields.
#[derive(Debug, Clone)]
pub struct TypeTree {
    pub persistent_type_id: i32,
    pub is_stripped_type: bool,
    pub script_type_index: i16,
    /// Present only when `persistent_type_id == MONO_BEHAVIOUR_PERSISTENT_ID`.
    pub script_type_hash: Option<[u8; 16]>,
    pub type_hash: [u8; 16],
    pub nodes: Vec<TypeField>,
    /// Arena of composite types keyed by the `TypeField::index` of the
    /// node that introduced them, built by [`crate::typetree::builder::register_type_tree`].
    pub class_views: IndexMap<i32, ClassView>,
}

impl TypeTree {
    /// The root class view (the object's own top-level fields).
    pub fn root(&self) -> Option<&ClassView> {
        self.class_views.get(&0)
    }
}

/// A single composite type's fields, as an index into its owning
/// `TypeTree`'s flat `nodes` list. This is the arena entry the generic
/// deserializer walks; it is never a nested tree node itself.
#[derive(Debug, Clone)]
pub struct ClassView {
    pub name: String,
    pub index: i32,
    pub fields: Vec<TypeField>,
}
