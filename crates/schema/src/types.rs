//! Declared type syntax
//!
//! A [`DeclaredType`] is the syntactic shape of a type as written in a
//! declaration: by the engine's reflection data (`"enum::Node.ProcessMode"`,
//! `"typedarray::Node"`, `"int"` + meta) or by a Rust field (`Option<Gd<Node>>`,
//! `TypedArray<i64>`). It carries no semantics; the classifier decides what
//! marshaling strategy a shape maps to.

use std::fmt;

use crate::variant::VariantType;

/// Syntactic shape of a declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// A named type with optional generic arguments (`i64`, `Node`, `TypedArray<Node>`)
    Named { name: String, args: Vec<DeclaredType> },
    /// A nullable wrapper (`Option<T>`)
    Optional(Box<DeclaredType>),
    /// Host sequence syntax (`Vec<T>`, `[T]`, `[T; N]`)
    Sequence(Box<DeclaredType>),
    /// A type the declaration itself marks as an enumeration
    Enum { name: String, bitfield: bool },
    /// A raw pointer type from the engine's native interface
    Pointer(String),
}

impl DeclaredType {
    /// A plain named type
    pub fn named(name: impl Into<String>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type with generic arguments
    pub fn generic(name: impl Into<String>, args: Vec<DeclaredType>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            args,
        }
    }

    /// Wrap a type in `Option`
    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    /// Wrap a type in host sequence syntax
    pub fn sequence(inner: DeclaredType) -> Self {
        DeclaredType::Sequence(Box::new(inner))
    }

    /// The name of a named or enum type
    pub fn name(&self) -> Option<&str> {
        match self {
            DeclaredType::Named { name, .. } | DeclaredType::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether a raw pointer appears anywhere in this type
    pub fn contains_pointer(&self) -> bool {
        match self {
            DeclaredType::Pointer(_) => true,
            DeclaredType::Named { args, .. } => args.iter().any(DeclaredType::contains_pointer),
            DeclaredType::Optional(inner) | DeclaredType::Sequence(inner) => {
                inner.contains_pointer()
            }
            DeclaredType::Enum { .. } => false,
        }
    }

    /// Parse a type string from the engine's reflection data.
    ///
    /// `meta` is the width qualifier the engine attaches to `int` and `float`.
    pub fn parse_engine(ty: &str, meta: Option<&str>) -> Self {
        let ty = ty.trim();

        if ty.contains('*') {
            return DeclaredType::Pointer(ty.to_string());
        }
        if let Some(name) = ty.strip_prefix("enum::") {
            return DeclaredType::Enum {
                name: name.to_string(),
                bitfield: false,
            };
        }
        if let Some(name) = ty.strip_prefix("bitfield::") {
            return DeclaredType::Enum {
                name: name.to_string(),
                bitfield: true,
            };
        }
        if let Some(element) = ty.strip_prefix("typedarray::") {
            // Hinted element types look like "24/17:Node"
            let element = element.rsplit(':').next().unwrap_or(element);
            return DeclaredType::generic(
                "TypedArray",
                vec![DeclaredType::parse_engine(element, None)],
            );
        }
        if ty.starts_with("typeddictionary::") {
            return DeclaredType::named("Dictionary");
        }

        match ty {
            "int" => DeclaredType::named(integer_for_meta(meta)),
            "float" => DeclaredType::named(if meta == Some("float") { "f32" } else { "f64" }),
            "Variant" => DeclaredType::named("Variant"),
            _ => {
                // Property types may list several accepted classes
                let first = ty.split(',').next().unwrap_or(ty).trim();
                let name = VariantType::from_engine_name(first)
                    .filter(|kind| *kind != VariantType::Object && *kind != VariantType::Nil)
                    .map(|kind| kind.host_name())
                    .unwrap_or(first);
                DeclaredType::named(name)
            }
        }
    }
}

fn integer_for_meta(meta: Option<&str>) -> &'static str {
    match meta {
        Some("int8") => "i8",
        Some("int16") => "i16",
        Some("int32") => "i32",
        Some("uint8") => "u8",
        Some("uint16") => "u16",
        Some("uint32") | Some("char32") => "u32",
        Some("uint64") => "u64",
        _ => "i64",
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Named { name, args } if args.is_empty() => f.write_str(name),
            DeclaredType::Named { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            DeclaredType::Optional(inner) => write!(f, "Option<{inner}>"),
            DeclaredType::Sequence(inner) => write!(f, "Vec<{inner}>"),
            DeclaredType::Enum { name, .. } => f.write_str(name),
            DeclaredType::Pointer(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_meta() {
        assert_eq!(
            DeclaredType::parse_engine("int", Some("int32")),
            DeclaredType::named("i32")
        );
        assert_eq!(DeclaredType::parse_engine("int", None), DeclaredType::named("i64"));
        assert_eq!(
            DeclaredType::parse_engine("float", Some("float")),
            DeclaredType::named("f32")
        );
        assert_eq!(
            DeclaredType::parse_engine("float", Some("double")),
            DeclaredType::named("f64")
        );
    }

    #[test]
    fn test_parse_enum_and_bitfield() {
        assert_eq!(
            DeclaredType::parse_engine("enum::Node.ProcessMode", None),
            DeclaredType::Enum {
                name: "Node.ProcessMode".to_string(),
                bitfield: false
            }
        );
        assert_eq!(
            DeclaredType::parse_engine("bitfield::MouseButtonMask", None),
            DeclaredType::Enum {
                name: "MouseButtonMask".to_string(),
                bitfield: true
            }
        );
    }

    #[test]
    fn test_parse_typed_array() {
        let expected = DeclaredType::generic("TypedArray", vec![DeclaredType::named("Node")]);
        assert_eq!(DeclaredType::parse_engine("typedarray::Node", None), expected);
        assert_eq!(
            DeclaredType::parse_engine("typedarray::24/17:Node", None),
            expected
        );
    }

    #[test]
    fn test_parse_builtin_renames() {
        assert_eq!(
            DeclaredType::parse_engine("String", None),
            DeclaredType::named("GString")
        );
        assert_eq!(
            DeclaredType::parse_engine("Array", None),
            DeclaredType::named("VariantArray")
        );
        assert_eq!(DeclaredType::parse_engine("RID", None), DeclaredType::named("Rid"));
        assert_eq!(
            DeclaredType::parse_engine("Object", None),
            DeclaredType::named("Object")
        );
        assert_eq!(
            DeclaredType::parse_engine("CanvasItemMaterial,ShaderMaterial", None),
            DeclaredType::named("CanvasItemMaterial")
        );
    }

    #[test]
    fn test_pointer_detection() {
        let ty = DeclaredType::parse_engine("const void*", None);
        assert!(ty.contains_pointer());
        assert!(!DeclaredType::named("Node").contains_pointer());
    }

    #[test]
    fn test_display() {
        let ty = DeclaredType::optional(DeclaredType::generic(
            "TypedArray",
            vec![DeclaredType::named("i64")],
        ));
        assert_eq!(ty.to_string(), "Option<TypedArray<i64>>");
        assert_eq!(
            DeclaredType::sequence(DeclaredType::named("i64")).to_string(),
            "Vec<i64>"
        );
    }
}
