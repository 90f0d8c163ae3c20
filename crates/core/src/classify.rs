//! Type-category classification
//!
//! Every exported member's declared type is mapped to exactly one
//! [`TypeCategory`], which selects the marshaling strategy the emitters use.
//! Classification is a pure function of the type's syntactic shape and a
//! [`TypeContext`] that knows which names are enums or classes.
//!
//! Rules, in priority order:
//!
//! 1. Fixed value-type names (numbers, `bool`, strings, engine value types) are
//!    [`TypeCategory::Primitive`].
//! 2. Known enumerations are [`TypeCategory::Enum`], carrying their storage width.
//! 3. `Variant` / `Option<Variant>` are [`TypeCategory::OpaqueVariant`].
//! 4. `TypedArray<T>` is a [`TypeCategory::HomogeneousCollection`] over the
//!    classified element type. Plain collections are rejected.
//! 5. Anything naming a known class is a [`TypeCategory::ObjectReference`].

use std::fmt;

use gdbind_schema::{DeclaredType, Schema, VariantType};

/// Scalar and engine value kinds that convert directly to and from a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// A builtin engine value type (`GString`, `Vector2`, `VariantArray`, ...)
    Builtin(VariantType),
}

impl PrimitiveKind {
    /// Look up a primitive by its Rust type name
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => PrimitiveKind::Bool,
            "i8" => PrimitiveKind::I8,
            "i16" => PrimitiveKind::I16,
            "i32" => PrimitiveKind::I32,
            "i64" => PrimitiveKind::I64,
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "f32" => PrimitiveKind::F32,
            "f64" => PrimitiveKind::F64,
            _ => {
                let ty = VariantType::from_host_name(name)?;
                match ty {
                    VariantType::Nil | VariantType::Object => return None,
                    _ => PrimitiveKind::Builtin(ty),
                }
            }
        };
        Some(kind)
    }

    /// Variant kind this primitive is stored as
    pub fn variant_type(self) -> VariantType {
        match self {
            PrimitiveKind::Bool => VariantType::Bool,
            PrimitiveKind::I8
            | PrimitiveKind::I16
            | PrimitiveKind::I32
            | PrimitiveKind::I64
            | PrimitiveKind::U8
            | PrimitiveKind::U16
            | PrimitiveKind::U32
            | PrimitiveKind::U64 => VariantType::Int,
            PrimitiveKind::F32 | PrimitiveKind::F64 => VariantType::Float,
            PrimitiveKind::Builtin(ty) => ty,
        }
    }

    /// Rust type name of this primitive
    pub fn host_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Builtin(ty) => ty.host_name(),
        }
    }
}

/// Raw storage width of an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumWidth {
    Int32,
    Int64,
}

impl EnumWidth {
    pub fn bits(self) -> u32 {
        match self {
            EnumWidth::Int32 => 32,
            EnumWidth::Int64 => 64,
        }
    }
}

/// Whether a referenced class needs retain/release around ownership transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefCounting {
    Yes,
    No,
    /// Not known when the code is emitted; the object handle decides at run time
    Dynamic,
}

/// Marshaling strategy for a declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Primitive(PrimitiveKind),
    Enum(EnumWidth),
    OpaqueVariant {
        nullable: bool,
    },
    HomogeneousCollection(Box<TypeCategory>),
    ObjectReference {
        class: String,
        nullable: bool,
        ref_counting: RefCounting,
    },
}

impl TypeCategory {
    /// Variant kind a value of this category is carried as
    pub fn variant_type(&self) -> VariantType {
        match self {
            TypeCategory::Primitive(kind) => kind.variant_type(),
            TypeCategory::Enum(_) => VariantType::Int,
            TypeCategory::OpaqueVariant { .. } => VariantType::Nil,
            TypeCategory::HomogeneousCollection(_) => VariantType::Array,
            TypeCategory::ObjectReference { .. } => VariantType::Object,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeCategory::OpaqueVariant { nullable }
            | TypeCategory::ObjectReference { nullable, .. } => *nullable,
            _ => false,
        }
    }

    /// Class name carried by object references
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeCategory::ObjectReference { class, .. } => Some(class),
            _ => None,
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCategory::Primitive(kind) => write!(f, "{}", kind.host_name()),
            TypeCategory::Enum(width) => write!(f, "enum ({}-bit)", width.bits()),
            TypeCategory::OpaqueVariant { nullable: true } => f.write_str("Option<Variant>"),
            TypeCategory::OpaqueVariant { nullable: false } => f.write_str("Variant"),
            TypeCategory::HomogeneousCollection(element) => write!(f, "TypedArray<{element}>"),
            TypeCategory::ObjectReference {
                class,
                nullable: true,
                ..
            } => write!(f, "Option<{class}>"),
            TypeCategory::ObjectReference { class, .. } => f.write_str(class),
        }
    }
}

/// Classification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The type has a recognisable shape that cannot be exported; reported to
    /// the author as a compile diagnostic
    #[error("the type `{ty}` cannot be exported: {help}")]
    Rejected { ty: String, help: String },

    /// The type matches no category at all
    #[error("cannot classify type `{0}`")]
    Unclassifiable(String),
}

impl ClassifyError {
    fn rejected(ty: &DeclaredType, help: impl Into<String>) -> Self {
        ClassifyError::Rejected {
            ty: ty.to_string(),
            help: help.into(),
        }
    }
}

/// Name knowledge the classifier consults
pub trait TypeContext {
    /// Width of a known enumeration, `None` if `name` is not an enum
    fn enum_width(&self, name: &str) -> Option<EnumWidth>;

    /// Ref-counting of a known class, `None` if `name` is not a class
    fn lookup_class(&self, name: &str) -> Option<RefCounting>;
}

impl TypeContext for Schema {
    fn enum_width(&self, name: &str) -> Option<EnumWidth> {
        // The engine carries every enum and bitfield as a 64-bit integer
        self.find_enum(name).map(|_| EnumWidth::Int64)
    }

    fn lookup_class(&self, name: &str) -> Option<RefCounting> {
        self.is_ref_counted(name).map(|ref_counted| {
            if ref_counted {
                RefCounting::Yes
            } else {
                RefCounting::No
            }
        })
    }
}

/// Classify a declared type
pub fn classify(ty: &DeclaredType, ctx: &impl TypeContext) -> Result<TypeCategory, ClassifyError> {
    match ty {
        DeclaredType::Pointer(raw) => Err(ClassifyError::Unclassifiable(raw.clone())),
        DeclaredType::Sequence(element) => Err(ClassifyError::rejected(
            ty,
            format!("plain collections are not supported, use `TypedArray<{element}>` instead"),
        )),
        DeclaredType::Enum { name, .. } => ctx
            .enum_width(name)
            .map(TypeCategory::Enum)
            .ok_or_else(|| ClassifyError::Unclassifiable(name.clone())),
        DeclaredType::Optional(inner) => classify_optional(ty, inner, ctx),
        DeclaredType::Named { name, args } => classify_named(ty, name, args, ctx),
    }
}

fn classify_optional(
    ty: &DeclaredType,
    inner: &DeclaredType,
    ctx: &impl TypeContext,
) -> Result<TypeCategory, ClassifyError> {
    if matches!(inner, DeclaredType::Optional(_)) {
        return Err(ClassifyError::rejected(ty, "nested `Option` is not supported"));
    }

    match classify(inner, ctx)? {
        TypeCategory::OpaqueVariant { .. } => Ok(TypeCategory::OpaqueVariant { nullable: true }),
        TypeCategory::ObjectReference {
            class,
            ref_counting,
            ..
        } => Ok(TypeCategory::ObjectReference {
            class,
            nullable: true,
            ref_counting,
        }),
        TypeCategory::HomogeneousCollection(_) => Err(ClassifyError::rejected(
            ty,
            "collections are never null, use an empty `TypedArray` instead",
        )),
        TypeCategory::Primitive(_) | TypeCategory::Enum(_) => Err(ClassifyError::rejected(
            ty,
            "optional value types are not supported, use `Variant` for nullable values",
        )),
    }
}

fn classify_named(
    ty: &DeclaredType,
    name: &str,
    args: &[DeclaredType],
    ctx: &impl TypeContext,
) -> Result<TypeCategory, ClassifyError> {
    if args.is_empty() {
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(TypeCategory::Primitive(kind));
        }
        if let Some(width) = ctx.enum_width(name) {
            return Ok(TypeCategory::Enum(width));
        }
    }

    match (name, args) {
        ("Variant", []) => Ok(TypeCategory::OpaqueVariant { nullable: false }),
        ("TypedArray", []) => Err(ClassifyError::rejected(
            ty,
            "`TypedArray` needs an element type, use `TypedArray<T>`",
        )),
        ("TypedArray", [element]) => classify_element(ty, element, ctx),
        ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet", _) => {
            Err(ClassifyError::rejected(
                ty,
                "plain collections are not supported, use `TypedArray<T>` instead",
            ))
        }
        (_, []) => ctx
            .lookup_class(name)
            .map(|ref_counting| TypeCategory::ObjectReference {
                class: name.to_string(),
                nullable: false,
                ref_counting,
            })
            .ok_or_else(|| ClassifyError::Unclassifiable(ty.to_string())),
        _ => Err(ClassifyError::Unclassifiable(ty.to_string())),
    }
}

fn classify_element(
    ty: &DeclaredType,
    element: &DeclaredType,
    ctx: &impl TypeContext,
) -> Result<TypeCategory, ClassifyError> {
    match classify(element, ctx)? {
        category @ (TypeCategory::Primitive(_)
        | TypeCategory::Enum(_)
        | TypeCategory::ObjectReference {
            nullable: false, ..
        }) => Ok(TypeCategory::HomogeneousCollection(Box::new(category))),
        TypeCategory::ObjectReference { .. } => Err(ClassifyError::rejected(
            ty,
            "typed array elements cannot be optional",
        )),
        TypeCategory::OpaqueVariant { .. } => Err(ClassifyError::rejected(
            ty,
            "an array of `Variant` is untyped, use `VariantArray` instead",
        )),
        TypeCategory::HomogeneousCollection(_) => Err(ClassifyError::rejected(
            ty,
            "nested typed arrays are not supported by the engine",
        )),
    }
}
