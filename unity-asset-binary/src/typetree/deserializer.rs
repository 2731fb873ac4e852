//! The generic deserializer: walks a [`ClassView`]'s fields against the
//! byte stream, dispatching per field on what the type tree declares
//! rather than on any static Rust type.

use indexmap::IndexMap;
use tracing::trace;
use unity_asset_core::Value;

use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;

use super::types::{ClassView, TypeField, TypeTree};

fn decode_primitive(reader: &mut BinaryReader, type_name: &str) -> Result<Option<Value>> {
    let value = match type_name {
        "bool" => Value::Bool(reader.read_bool()?),
        "SInt8" => Value::I8(reader.read_i8()?),
        "UInt8" | "char" => Value::U8(reader.read_u8()?),
        "SInt16" | "short" => Value::I16(reader.read_i16()?),
        "UInt16" | "unsigned short" => Value::U16(reader.read_u16()?),
        "SInt32" | "int" => Value::I32(reader.read_i32()?),
        "UInt32" | "unsigned int" | "Type*" => Value::U32(reader.read_u32()?),
        "SInt64" | "long" => Value::I64(reader.read_i64()?),
        "UInt64" | "unsigned long" => Value::U64(reader.read_u64()?),
        "float" => Value::F32(reader.read_f32()?),
        "double" => Value::F64(reader.read_f64()?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn is_primitive(type_name: &str) -> bool {
    matches!(
        type_name,
        "bool"
            | "SInt8"
            | "UInt8"
            | "char"
            | "SInt16"
            | "short"
            | "UInt16"
            | "unsigned short"
            | "SInt32"
            | "int"
            | "UInt32"
            | "unsigned int"
            | "Type*"
            | "SInt64"
            | "long"
            | "UInt64"
            | "unsigned long"
            | "float"
            | "double"
    )
}

fn read_byte_blob(reader: &mut BinaryReader, count: i32) -> Result<Vec<u8>> {
    if count > 0 {
        reader.read_bytes(count as usize)
    } else {
        Ok(Vec::new())
    }
}

/// Read a length-prefixed string. A negative length is rejected rather
/// than silently treated as empty.
fn read_string_field(reader: &mut BinaryReader) -> Result<String> {
    let size = reader.read_i32()?;
    if size < 0 {
        return Err(BinaryError::format(format!(
            "negative string length {size}"
        )));
    }
    let bytes = read_byte_blob(reader, size)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn class_view_for<'a>(
    tree: &'a TypeTree,
    index: i32,
) -> Result<&'a ClassView> {
    tree.class_views
        .get(&index)
        .ok_or(BinaryError::UnknownType(index))
}

/// Deserialize one object/composite using `view`'s field list, recursing
/// into nested composites via `tree.class_views`.
pub fn deserialize(reader: &mut BinaryReader, tree: &TypeTree, view: &ClassView) -> Result<Value> {
    let mut map = IndexMap::with_capacity(view.fields.len());

    for node in &view.fields {
        trace!(field = %node.field_name, ty = %node.type_name, pos = reader.position(), "decoding field");

        if node.is_array {
            map.insert(node.field_name.clone(), deserialize_array(reader, tree, node)?);
            continue;
        }

        if node.type_name == "string" {
            let value = read_string_field(reader)?;
            reader.align()?;
            map.insert(node.field_name.clone(), Value::String(value));
            continue;
        }

        if let Some(value) = decode_primitive(reader, &node.type_name)? {
            if node.align_after() {
                reader.align()?;
            }
            map.insert(node.field_name.clone(), value);
            continue;
        }

        if node.byte_size == 0 {
            continue;
        }

        let nested = class_view_for(tree, node.index)?;
        let value = deserialize(reader, tree, nested)?;
        map.insert(node.field_name.clone(), value);
    }

    Ok(Value::Map(map))
}

/// Array fields decode to a `{size, data}` record, mirroring the
/// synthetic `size`/`data` children the type tree itself declares for
/// every array node.
fn array_record(count: i32, data: Value) -> Value {
    let mut map = IndexMap::with_capacity(2);
    map.insert("size".to_string(), Value::I32(count));
    map.insert("data".to_string(), data);
    Value::Map(map)
}

fn deserialize_array(reader: &mut BinaryReader, tree: &TypeTree, node: &TypeField) -> Result<Value> {
    let element_type = tree
        .nodes
        .get((node.index + 2) as usize)
        .ok_or(BinaryError::UnknownType(node.index + 2))?
        .clone();
    let element_count = reader.read_i32()?;

    if element_type.byte_size == 1 {
        let bytes = read_byte_blob(reader, element_count)?;
        reader.align()?;
        return Ok(array_record(element_count, Value::Bytes(bytes)));
    }

    let mut items = Vec::with_capacity(element_count.max(0) as usize);
    if is_primitive(&element_type.type_name) {
        for _ in 0..element_count {
            if let Some(value) = decode_primitive(reader, &element_type.type_name)? {
                items.push(value);
            }
        }
    } else if element_type.type_name == "string" {
        for _ in 0..element_count {
            let value = read_string_field(reader)?;
            reader.align()?;
            items.push(Value::String(value));
        }
    } else {
        let nested = class_view_for(tree, element_type.index)?;
        for _ in 0..element_count {
            items.push(deserialize(reader, tree, nested)?);
        }
    }
    reader.align()?;
    Ok(array_record(element_count, Value::Seq(items)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteOrder;
    use crate::typetree::builder::register_type_tree;

    fn field(level: u8, index: i32, type_name: &str, field_name: &str, is_array: bool, byte_size: i32) -> TypeField {
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
            field_name: field_name.to_string(),
        }
    }

    fn build_tree(nodes: Vec<TypeField>) -> TypeTree {
        let mut tree = TypeTree {
            persistent_type_id: 1,
            is_stripped_type: false,
            script_type_index: -1,
            script_type_hash: None,
            type_hash: [0; 16],
            nodes,
            class_views: IndexMap::new(),
        };
        register_type_tree(&mut tree);
        tree
    }

    #[test]
    fn decodes_minimal_scalar_record() {
        let tree = build_tree(vec![
            field(0, 0, "MyClass", "Base", false, -1),
            field(1, 1, "int", "m_Value", false, 4),
            field(1, 2, "float", "m_Ratio", false, 4),
        ]);
        let mut data = Vec::new();
        data.extend_from_slice(&42i32.to_be_bytes());
        data.extend_from_slice(&1.5f32.to_be_bytes());
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let value = deserialize(&mut reader, &tree, tree.root().unwrap()).unwrap();
        assert_eq!(value.get("m_Value"), Some(&Value::I32(42)));
        assert_eq!(value.get("m_Ratio"), Some(&Value::F32(1.5)));
    }

    #[test]
    fn decodes_byte_array_field() {
        let tree = build_tree(vec![
            field(0, 0, "MyClass", "Base", false, -1),
            field(1, 1, "data", "m_Bytes", true, -1),
            field(2, 2, "Array", "Array", false, -1),
            field(3, 3, "int", "size", false, 4),
            field(3, 4, "UInt8", "data", false, 1),
        ]);
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        data.push(0); // alignment padding to 4
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let value = deserialize(&mut reader, &tree, tree.root().unwrap()).unwrap();
        let array = value.get("m_Bytes").unwrap();
        assert_eq!(array.get("size"), Some(&Value::I32(3)));
        assert_eq!(array.get("data").unwrap().as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn zero_size_field_contributes_nothing() {
        let tree = build_tree(vec![
            field(0, 0, "MyClass", "Base", false, -1),
            field(1, 1, "BaseClass", "m_Base", false, 0),
            field(1, 2, "int", "m_Value", false, 4),
        ]);
        let mut data = Vec::new();
        data.extend_from_slice(&7i32.to_be_bytes());
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let value = deserialize(&mut reader, &tree, tree.root().unwrap()).unwrap();
        assert!(value.get("m_Base").is_none());
        assert_eq!(value.get("m_Value"), Some(&Value::I32(7)));
    }

    #[test]
    fn decodes_string_field_with_alignment() {
        let tree = build_tree(vec![
            field(0, 0, "MyClass", "Base", false, -1),
            field(1, 1, "string", "m_Name", false, -1),
        ]);
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_be_bytes());
        data.extend_from_slice(b"Foo");
        data.push(0); // align(4) padding
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let value = deserialize(&mut reader, &tree, tree.root().unwrap()).unwrap();
        assert_eq!(value.get("m_Name").unwrap().as_str(), Some("Foo"));
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn negative_string_length_is_format_error() {
        let tree = build_tree(vec![
            field(0, 0, "MyClass", "Base", false, -1),
            field(1, 1, "string", "m_Name", false, -1),
        ]);
        let data = (-1i32).to_be_bytes();
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let err = deserialize(&mut reader, &tree, tree.root().unwrap()).unwrap_err();
        assert!(matches!(err, BinaryError::FormatError(_)));
    }

    #[test]
    fn unknown_composite_index_is_reported() {
        let tree = build_tree(vec![field(0, 0, "MyClass", "Base", false, -1)]);
        let mut bad_view = tree.root().unwrap().clone();
        bad_view.fields.push(field(1, 99, "Missing", "m_Missing", false, -1));
        let mut reader = BinaryReader::new(&[], ByteOrder::Big);
        let err = deserialize(&mut reader, &tree, &bad_view).unwrap_err();
        assert!(matches!(err, BinaryError::UnknownType(99)));
    }
}
