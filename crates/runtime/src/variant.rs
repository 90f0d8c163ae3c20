//! The dynamic value type of the engine's calling convention

use gdbind_schema::VariantType;

use crate::array::VariantArray;
use crate::builtins::*;
use crate::object::ObjectHandle;

/// A dynamically typed engine value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(GString),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Rect2(Rect2),
    Rect2i(Rect2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Transform2D(Transform2D),
    Vector4(Vector4),
    Vector4i(Vector4i),
    Plane(Plane),
    Quaternion(Quaternion),
    Aabb(Aabb),
    Basis(Basis),
    Transform3D(Transform3D),
    Projection(Projection),
    Color(Color),
    StringName(StringName),
    NodePath(NodePath),
    Rid(Rid),
    Object(ObjectHandle),
    Callable(Callable),
    Signal(Signal),
    Dictionary(Dictionary),
    Array(VariantArray),
    PackedByteArray(PackedByteArray),
    PackedInt32Array(PackedInt32Array),
    PackedInt64Array(PackedInt64Array),
    PackedFloat32Array(PackedFloat32Array),
    PackedFloat64Array(PackedFloat64Array),
    PackedStringArray(PackedStringArray),
    PackedVector2Array(PackedVector2Array),
    PackedVector3Array(PackedVector3Array),
    PackedColorArray(PackedColorArray),
    PackedVector4Array(PackedVector4Array),
}

impl Variant {
    /// Kind of value currently held
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector2i(_) => VariantType::Vector2i,
            Variant::Rect2(_) => VariantType::Rect2,
            Variant::Rect2i(_) => VariantType::Rect2i,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::Vector3i(_) => VariantType::Vector3i,
            Variant::Transform2D(_) => VariantType::Transform2D,
            Variant::Vector4(_) => VariantType::Vector4,
            Variant::Vector4i(_) => VariantType::Vector4i,
            Variant::Plane(_) => VariantType::Plane,
            Variant::Quaternion(_) => VariantType::Quaternion,
            Variant::Aabb(_) => VariantType::Aabb,
            Variant::Basis(_) => VariantType::Basis,
            Variant::Transform3D(_) => VariantType::Transform3D,
            Variant::Projection(_) => VariantType::Projection,
            Variant::Color(_) => VariantType::Color,
            Variant::StringName(_) => VariantType::StringName,
            Variant::NodePath(_) => VariantType::NodePath,
            Variant::Rid(_) => VariantType::Rid,
            Variant::Object(_) => VariantType::Object,
            Variant::Callable(_) => VariantType::Callable,
            Variant::Signal(_) => VariantType::Signal,
            Variant::Dictionary(_) => VariantType::Dictionary,
            Variant::Array(_) => VariantType::Array,
            Variant::PackedByteArray(_) => VariantType::PackedByteArray,
            Variant::PackedInt32Array(_) => VariantType::PackedInt32Array,
            Variant::PackedInt64Array(_) => VariantType::PackedInt64Array,
            Variant::PackedFloat32Array(_) => VariantType::PackedFloat32Array,
            Variant::PackedFloat64Array(_) => VariantType::PackedFloat64Array,
            Variant::PackedStringArray(_) => VariantType::PackedStringArray,
            Variant::PackedVector2Array(_) => VariantType::PackedVector2Array,
            Variant::PackedVector3Array(_) => VariantType::PackedVector3Array,
            Variant::PackedColorArray(_) => VariantType::PackedColorArray,
            Variant::PackedVector4Array(_) => VariantType::PackedVector4Array,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    /// Object handle held by this variant, if any
    pub fn object_handle(&self) -> Option<ObjectHandle> {
        match self {
            Variant::Object(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// Why a variant could not be converted to a Rust value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantConversionError {
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: VariantType,
        found: VariantType,
    },

    #[error("value {value} does not fit in {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("expected an instance of `{expected}`, got `{found}`")]
    WrongClass { expected: String, found: String },

    #[error("object is no longer alive")]
    DeadObject,

    #[error("unknown enum value {0}")]
    UnknownEnumValue(i64),

    #[error(transparent)]
    ArrayType(#[from] crate::array::ArrayTypeError),
}

impl VariantConversionError {
    pub fn mismatch(expected: VariantType, found: &Variant) -> Self {
        VariantConversionError::TypeMismatch {
            expected,
            found: found.variant_type(),
        }
    }
}

/// Conversion into a [`Variant`]
pub trait ToVariant {
    fn to_variant(&self) -> Variant;
}

/// Conversion out of a [`Variant`]
pub trait FromVariant: Sized {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError>;
}

impl ToVariant for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromVariant for Variant {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        Ok(variant.clone())
    }
}

/// `None` is carried as `Nil`
impl<T: ToVariant> ToVariant for Option<T> {
    fn to_variant(&self) -> Variant {
        match self {
            Some(value) => value.to_variant(),
            None => Variant::Nil,
        }
    }
}

impl<T: FromVariant> FromVariant for Option<T> {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        match variant {
            Variant::Nil => Ok(None),
            other => T::from_variant(other).map(Some),
        }
    }
}

impl ToVariant for () {
    fn to_variant(&self) -> Variant {
        Variant::Nil
    }
}

impl ToVariant for bool {
    fn to_variant(&self) -> Variant {
        Variant::Bool(*self)
    }
}

impl FromVariant for bool {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        match variant {
            Variant::Bool(value) => Ok(*value),
            other => Err(VariantConversionError::mismatch(VariantType::Bool, other)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl ToVariant for $ty {
            fn to_variant(&self) -> Variant {
                Variant::Int(*self as i64)
            }
        }

        impl FromVariant for $ty {
            fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
                match variant {
                    Variant::Int(value) => <$ty>::try_from(*value).map_err(|_| {
                        VariantConversionError::OutOfRange {
                            value: *value,
                            target: stringify!($ty),
                        }
                    }),
                    other => Err(VariantConversionError::mismatch(VariantType::Int, other)),
                }
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self)
    }
}

impl FromVariant for f64 {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        match variant {
            Variant::Float(value) => Ok(*value),
            other => Err(VariantConversionError::mismatch(VariantType::Float, other)),
        }
    }
}

impl ToVariant for f32 {
    fn to_variant(&self) -> Variant {
        Variant::Float(f64::from(*self))
    }
}

impl FromVariant for f32 {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        f64::from_variant(variant).map(|value| value as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range_checked() {
        assert_eq!(i32::from_variant(&Variant::Int(7)), Ok(7));
        assert_eq!(
            u8::from_variant(&Variant::Int(300)),
            Err(VariantConversionError::OutOfRange {
                value: 300,
                target: "u8"
            })
        );
        assert_eq!(
            i64::from_variant(&Variant::Bool(true)),
            Err(VariantConversionError::TypeMismatch {
                expected: VariantType::Int,
                found: VariantType::Bool
            })
        );
    }

    #[test]
    fn test_option_uses_nil() {
        assert_eq!(None::<i64>.to_variant(), Variant::Nil);
        assert_eq!(Some(3i64).to_variant(), Variant::Int(3));
        assert_eq!(Option::<Variant>::from_variant(&Variant::Nil), Ok(None));
        assert_eq!(
            Option::<Variant>::from_variant(&Variant::Int(1)),
            Ok(Some(Variant::Int(1)))
        );
    }

    #[test]
    fn test_variant_type_reported() {
        assert_eq!(Variant::Float(1.0).variant_type(), VariantType::Float);
        assert_eq!(
            Variant::String(GString::from("x")).variant_type(),
            VariantType::String
        );
        assert!(Variant::default().is_nil());
    }
}
