//! Variant kinds of the engine's dynamic calling convention

use std::fmt;

macro_rules! variant_types {
    ($($variant:ident => $engine:literal, $host:literal;)*) => {
        /// Every kind of value a variant can hold
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u32)]
        pub enum VariantType {
            $($variant,)*
        }

        impl VariantType {
            /// All variant kinds in engine ordinal order
            pub const ALL: &'static [VariantType] = &[$(VariantType::$variant,)*];

            /// Name used by the engine's reflection data
            pub fn engine_name(self) -> &'static str {
                match self {
                    $(VariantType::$variant => $engine,)*
                }
            }

            /// Name of the Rust type that represents this kind in the runtime crate
            pub fn host_name(self) -> &'static str {
                match self {
                    $(VariantType::$variant => $host,)*
                }
            }

            /// Look up a variant kind by its engine name
            pub fn from_engine_name(name: &str) -> Option<Self> {
                match name {
                    $($engine => Some(VariantType::$variant),)*
                    _ => None,
                }
            }

            /// Look up a variant kind by its runtime type name
            pub fn from_host_name(name: &str) -> Option<Self> {
                match name {
                    $($host => Some(VariantType::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

variant_types! {
    Nil => "Nil", "()";
    Bool => "bool", "bool";
    Int => "int", "i64";
    Float => "float", "f64";
    String => "String", "GString";
    Vector2 => "Vector2", "Vector2";
    Vector2i => "Vector2i", "Vector2i";
    Rect2 => "Rect2", "Rect2";
    Rect2i => "Rect2i", "Rect2i";
    Vector3 => "Vector3", "Vector3";
    Vector3i => "Vector3i", "Vector3i";
    Transform2D => "Transform2D", "Transform2D";
    Vector4 => "Vector4", "Vector4";
    Vector4i => "Vector4i", "Vector4i";
    Plane => "Plane", "Plane";
    Quaternion => "Quaternion", "Quaternion";
    Aabb => "AABB", "Aabb";
    Basis => "Basis", "Basis";
    Transform3D => "Transform3D", "Transform3D";
    Projection => "Projection", "Projection";
    Color => "Color", "Color";
    StringName => "StringName", "StringName";
    NodePath => "NodePath", "NodePath";
    Rid => "RID", "Rid";
    Object => "Object", "Object";
    Callable => "Callable", "Callable";
    Signal => "Signal", "Signal";
    Dictionary => "Dictionary", "Dictionary";
    Array => "Array", "VariantArray";
    PackedByteArray => "PackedByteArray", "PackedByteArray";
    PackedInt32Array => "PackedInt32Array", "PackedInt32Array";
    PackedInt64Array => "PackedInt64Array", "PackedInt64Array";
    PackedFloat32Array => "PackedFloat32Array", "PackedFloat32Array";
    PackedFloat64Array => "PackedFloat64Array", "PackedFloat64Array";
    PackedStringArray => "PackedStringArray", "PackedStringArray";
    PackedVector2Array => "PackedVector2Array", "PackedVector2Array";
    PackedVector3Array => "PackedVector3Array", "PackedVector3Array";
    PackedColorArray => "PackedColorArray", "PackedColorArray";
    PackedVector4Array => "PackedVector4Array", "PackedVector4Array";
}

impl VariantType {
    /// Engine ordinal
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Whether this kind is one of the packed array types
    pub fn is_packed_array(self) -> bool {
        self.engine_name().starts_with("Packed")
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_name())
    }
}

macro_rules! variant_operators {
    ($($variant:ident => $engine:literal, $suffix:literal;)*) => {
        /// Operators a variant evaluator understands, in engine ordinal order
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u32)]
        pub enum VariantOperator {
            $($variant,)*
        }

        impl VariantOperator {
            pub const ALL: &'static [VariantOperator] = &[$(VariantOperator::$variant,)*];

            /// Symbol used by the engine's reflection data (`"=="`, `"unary-"`)
            pub fn engine_name(self) -> &'static str {
                match self {
                    $(VariantOperator::$variant => $engine,)*
                }
            }

            /// Snake-case word naming the operator in generated methods
            pub fn method_suffix(self) -> &'static str {
                match self {
                    $(VariantOperator::$variant => $suffix,)*
                }
            }

            pub fn from_engine_name(name: &str) -> Option<Self> {
                match name {
                    $($engine => Some(VariantOperator::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

variant_operators! {
    Equal => "==", "equal";
    NotEqual => "!=", "not_equal";
    Less => "<", "less";
    LessEqual => "<=", "less_equal";
    Greater => ">", "greater";
    GreaterEqual => ">=", "greater_equal";
    Add => "+", "add";
    Subtract => "-", "subtract";
    Multiply => "*", "multiply";
    Divide => "/", "divide";
    Negate => "unary-", "negate";
    Positive => "unary+", "positive";
    Module => "%", "module";
    Power => "**", "power";
    ShiftLeft => "<<", "shift_left";
    ShiftRight => ">>", "shift_right";
    BitAnd => "&", "bit_and";
    BitOr => "|", "bit_or";
    BitXor => "^", "bit_xor";
    BitNegate => "~", "bit_negate";
    And => "and", "and";
    Or => "or", "or";
    Xor => "xor", "xor";
    Not => "not", "not";
    In => "in", "in";
}

impl VariantOperator {
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Whether the operator takes no right operand
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            VariantOperator::Negate
                | VariantOperator::Positive
                | VariantOperator::BitNegate
                | VariantOperator::Not
        )
    }
}

impl fmt::Display for VariantOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        for op in VariantOperator::ALL {
            assert_eq!(VariantOperator::from_engine_name(op.engine_name()), Some(*op));
        }
        assert_eq!(VariantOperator::from_engine_name("unary-"), Some(VariantOperator::Negate));
        assert_eq!(VariantOperator::In.ordinal(), 24);
        assert!(VariantOperator::Not.is_unary());
        assert!(!VariantOperator::Subtract.is_unary());
        assert_eq!(VariantOperator::from_engine_name("<=>"), None);
    }

    #[test]
    fn test_engine_names_round_trip() {
        for ty in VariantType::ALL {
            assert_eq!(VariantType::from_engine_name(ty.engine_name()), Some(*ty));
            assert_eq!(VariantType::from_host_name(ty.host_name()), Some(*ty));
        }
    }

    #[test]
    fn test_renamed_kinds() {
        assert_eq!(VariantType::from_engine_name("AABB"), Some(VariantType::Aabb));
        assert_eq!(VariantType::String.host_name(), "GString");
        assert_eq!(VariantType::Array.host_name(), "VariantArray");
        assert_eq!(VariantType::Object.ordinal(), 24);
        assert!(VariantType::PackedColorArray.is_packed_array());
        assert!(!VariantType::Array.is_packed_array());
    }
}
