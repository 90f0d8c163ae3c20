//! Builtin engine value types

use std::fmt;

use gdbind_schema::VariantType;

use crate::array::ArrayElement;
use crate::object::ObjectHandle;
use crate::variant::{FromVariant, ToVariant, Variant, VariantConversionError};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect2 {
    pub position: Vector2,
    pub size: Vector2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect2i {
    pub position: Vector2i,
    pub size: Vector2i,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform2D {
    pub a: Vector2,
    pub b: Vector2,
    pub origin: Vector2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector4i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub normal: Vector3,
    pub d: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub position: Vector3,
    pub size: Vector3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Basis {
    pub rows: [Vector3; 3],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform3D {
    pub basis: Basis,
    pub origin: Vector3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Projection {
    pub columns: [Vector4; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Engine resource id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rid(pub u64);

/// Engine string
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GString(pub String);

/// Interned engine string
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringName(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(pub String);

macro_rules! string_like {
    ($($ty:ident),*) => {$(
        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    )*};
}

string_like!(GString, StringName, NodePath);

/// A method bound to an object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Callable {
    pub object: Option<ObjectHandle>,
    pub method: StringName,
}

/// A signal of an object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    pub object: Option<ObjectHandle>,
    pub name: StringName,
}

/// Insertion-ordered variant map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(Variant, Variant)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value
    pub fn insert(&mut self, key: Variant, value: Variant) -> Option<Variant> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Variant) -> Option<&Variant> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variant, &Variant)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

macro_rules! packed_arrays {
    ($($name:ident($elem:ty)),* $(,)?) => {$(
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(pub Vec<$elem>);

        impl From<Vec<$elem>> for $name {
            fn from(values: Vec<$elem>) -> Self {
                Self(values)
            }
        }

        impl $name {
            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }
    )*};
}

packed_arrays! {
    PackedByteArray(u8),
    PackedInt32Array(i32),
    PackedInt64Array(i64),
    PackedFloat32Array(f32),
    PackedFloat64Array(f64),
    PackedStringArray(GString),
    PackedVector2Array(Vector2),
    PackedVector3Array(Vector3),
    PackedColorArray(Color),
    PackedVector4Array(Vector4),
}

/// Variant conversions for value types carried in a same-named variant slot
macro_rules! builtin_conversions {
    ($($ty:ident => $slot:ident),* $(,)?) => {$(
        impl ToVariant for $ty {
            fn to_variant(&self) -> Variant {
                Variant::$slot(self.clone())
            }
        }

        impl FromVariant for $ty {
            fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
                match variant {
                    Variant::$slot(value) => Ok(value.clone()),
                    other => Err(VariantConversionError::mismatch(VariantType::$slot, other)),
                }
            }
        }

        impl ArrayElement for $ty {
            fn element_type() -> VariantType {
                VariantType::$slot
            }
        }
    )*};
}

builtin_conversions! {
    GString => String,
    Vector2 => Vector2,
    Vector2i => Vector2i,
    Rect2 => Rect2,
    Rect2i => Rect2i,
    Vector3 => Vector3,
    Vector3i => Vector3i,
    Transform2D => Transform2D,
    Vector4 => Vector4,
    Vector4i => Vector4i,
    Plane => Plane,
    Quaternion => Quaternion,
    Aabb => Aabb,
    Basis => Basis,
    Transform3D => Transform3D,
    Projection => Projection,
    Color => Color,
    StringName => StringName,
    NodePath => NodePath,
    Rid => Rid,
    Callable => Callable,
    Signal => Signal,
    Dictionary => Dictionary,
    PackedByteArray => PackedByteArray,
    PackedInt32Array => PackedInt32Array,
    PackedInt64Array => PackedInt64Array,
    PackedFloat32Array => PackedFloat32Array,
    PackedFloat64Array => PackedFloat64Array,
    PackedStringArray => PackedStringArray,
    PackedVector2Array => PackedVector2Array,
    PackedVector3Array => PackedVector3Array,
    PackedColorArray => PackedColorArray,
    PackedVector4Array => PackedVector4Array,
}

macro_rules! scalar_elements {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl ArrayElement for $ty {
            fn element_type() -> VariantType {
                VariantType::$kind
            }
        }
    )*};
}

scalar_elements! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    u64 => Int,
    f32 => Float,
    f64 => Float,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_conversion() {
        let v = Vector2::new(1.0, 2.0).to_variant();
        assert_eq!(v.variant_type(), VariantType::Vector2);
        assert_eq!(Vector2::from_variant(&v), Ok(Vector2::new(1.0, 2.0)));
        assert!(Vector3::from_variant(&v).is_err());
    }

    #[test]
    fn test_gstring_uses_string_slot() {
        let v = GString::from("hello").to_variant();
        assert_eq!(v, Variant::String(GString::from("hello")));
        assert_eq!(GString::from_variant(&v).unwrap().as_str(), "hello");
        assert!(StringName::from_variant(&v).is_err());
    }

    #[test]
    fn test_dictionary_replaces_equal_keys() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.insert(Variant::Int(1), Variant::Bool(true)), None);
        assert_eq!(
            dict.insert(Variant::Int(1), Variant::Bool(false)),
            Some(Variant::Bool(true))
        );
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&Variant::Int(1)), Some(&Variant::Bool(false)));
    }
}
