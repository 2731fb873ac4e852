//! Type-tree name resolution.
//!
//! A `TypeField`'s `type_str_offset`/`name_str_offset` is an offset into
//! one of two string buffers: the engine's fixed, built-in common-string
//! table when the high bit (0x8000_0000) is set, or this tree's own
//! string buffer (the bytes immediately following its node list)
//! otherwise.

use std::collections::HashMap;

const COMMON_STRING_HIGH_BIT: u32 = 0x8000_0000;

/// The built-in common-string table baked into the engine, in the fixed
/// order every Unity version uses. Offsets are each string's cumulative
/// byte position (including its own trailing NUL) in this table.
const COMMON_STRINGS: &[&str] = &[
    "AABB", "AnimationClip", "AnimationCurve", "AnimationState", "Array", "Base", "BitField",
    "bitset", "bool", "char", "ColorRGBA", "Component", "data", "deque", "double",
    "dynamic_array", "FastPropertyName", "first", "float", "Font", "GameObject",
    "Generic Mono", "GradientNEW", "GUID", "GUIStyle", "int", "list", "long long", "map",
    "Matrix4x4f", "MdFour", "MonoBehaviour", "MonoScript", "m_ByteSize", "m_Curve",
    "m_EditorClassIdentifier", "m_EditorHideFlags", "m_Enabled", "m_ExtensionPtr",
    "m_GameObject", "m_Index", "m_IsArray", "m_IsStatic", "m_MetaFlag", "m_Name",
    "m_ObjectHideFlags", "m_PrefabInternal", "m_PrefabParentObject", "m_Script",
    "m_StaticEditorFlags", "m_Type", "m_Version", "Object", "pair", "PPtr<Component>",
    "PPtr<GameObject>", "PPtr<Material>", "PPtr<MonoBehaviour>", "PPtr<MonoScript>",
    "PPtr<Object>", "PPtr<Prefab>", "PPtr<Sprite>", "PPtr<TextAsset>", "PPtr<Texture>",
    "PPtr<Texture2D>", "PPtr<Transform>", "Prefab", "Quaternionf", "Rectf", "Rectangle",
    "RectOffset", "RGBA", "ScriptingAssemblies", "SerializableEntry", "SerializedIndex",
    "short", "size", "SInt16", "SInt32", "SInt64", "SInt8", "staticvector", "string",
    "TextAsset", "TextMesh", "Texture", "Texture2D", "Transform", "TypelessData", "UInt16",
    "UInt32", "UInt64", "UInt8", "unsigned int", "unsigned long long", "unsigned short",
    "vector", "Vector2f", "Vector3f", "Vector4f", "m_ScriptingClassIdentifier", "Gradient",
    "Type*", "int2_storage", "int3_storage", "UInt16Storage", "int4", "float4",
];

fn common_string_table() -> &'static HashMap<u32, &'static str> {
    use std::sync::OnceLock;
    static TABLE: OnceLock<HashMap<u32, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(COMMON_STRINGS.len());
        let mut offset = 0u32;
        for s in COMMON_STRINGS {
            table.insert(offset, *s);
            offset += s.len() as u32 + 1;
        }
        table
    })
}

/// Resolve a `type_str_offset`/`name_str_offset` value against the
/// built-in table (high bit set) or this tree's own string buffer.
pub fn resolve(offset: u32, local: &HashMap<u32, String>) -> String {
    if offset & COMMON_STRING_HIGH_BIT != 0 {
        let stripped = offset & !COMMON_STRING_HIGH_BIT;
        common_string_table()
            .get(&stripped)
            .map(|s| s.to_string())
            .unwrap_or_default()
    } else {
        local.get(&offset).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_string() {
        let local = HashMap::new();
        let offset = COMMON_STRING_HIGH_BIT;
        assert_eq!(resolve(offset, &local), "AABB");
    }

    #[test]
    fn resolves_local_string() {
        let mut local = HashMap::new();
        local.insert(0u32, "MyField".to_string());
        assert_eq!(resolve(0, &local), "MyField");
    }

    #[test]
    fn unknown_offset_is_empty() {
        let local = HashMap::new();
        assert_eq!(resolve(999_999, &local), "");
    }
}
