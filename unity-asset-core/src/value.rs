//! The dynamically typed output of the generic deserializer.
//!
//! A type-tree can describe any engine class, so the deserializer cannot
//! produce a statically typed Rust struct per object. Instead it walks the
//! class view and builds this tagged-sum tree, dispatching on the
//! type-tree's declared types rather than on runtime introspection of the
//! value being built.

use indexmap::IndexMap;

/// A decoded field or object. `Map` preserves field declaration order via
/// `IndexMap`, matching the type-tree's own field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Map(IndexMap<String, Value>),
    Seq(Vec<Value>),
    Bytes(Vec<u8>),
    String(String),
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a named field on a `Map` value; `None` for any other variant
    /// or a missing key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_field_lookup() {
        let mut map = IndexMap::new();
        map.insert("x".to_string(), Value::I32(42));
        let v = Value::Map(map);
        assert_eq!(v.get("x"), Some(&Value::I32(42)));
        assert_eq!(v.get("y"), None);
    }

    #[test]
    fn non_map_accessors_return_none() {
        let v = Value::I32(1);
        assert!(v.as_map().is_none());
        assert!(v.as_seq().is_none());
        assert!(v.get("anything").is_none());
    }
}
