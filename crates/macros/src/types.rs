//! Rust types of user members as declared engine types
//!
//! The macros see only syntax, so the classification context is open-world:
//! any unknown type name is taken to be an object class whose ref-counting is
//! decided at run time, and enums are known only where an attribute says so.

use std::collections::HashMap;

use gdbind_codegen::MarshaledType;
use gdbind_core::{classify, EnumWidth, RefCounting, TypeContext};
use gdbind_schema::DeclaredType;
use quote::{quote, ToTokens};
use syn::{GenericArgument, PathArguments, Type};

/// Standard library names that are never engine classes
const NOT_CLASSES: [&str; 12] = [
    "String", "str", "char", "usize", "isize", "i128", "u128", "Box", "Rc", "Arc", "HashMap",
    "BTreeMap",
];

/// Declared shape of a Rust type
pub fn declared_type(ty: &Type) -> DeclaredType {
    match ty {
        Type::Paren(inner) => declared_type(&inner.elem),
        Type::Group(inner) => declared_type(&inner.elem),
        Type::Slice(slice) => DeclaredType::sequence(declared_type(&slice.elem)),
        Type::Array(array) => DeclaredType::sequence(declared_type(&array.elem)),
        Type::Reference(reference) => match reference.elem.as_ref() {
            Type::Slice(slice) => DeclaredType::sequence(declared_type(&slice.elem)),
            _ => DeclaredType::named(type_text(ty)),
        },
        Type::Path(path) if path.qself.is_none() => {
            let Some(last) = path.path.segments.last() else {
                return DeclaredType::named(type_text(ty));
            };
            let name = last.ident.to_string();
            let args: Vec<DeclaredType> = match &last.arguments {
                PathArguments::None => Vec::new(),
                PathArguments::AngleBracketed(generic) => generic
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        GenericArgument::Type(t) => Some(declared_type(t)),
                        _ => None,
                    })
                    .collect(),
                PathArguments::Parenthesized(_) => return DeclaredType::named(type_text(ty)),
            };
            match (name.as_str(), args.as_slice()) {
                ("Option", [inner]) => DeclaredType::optional(inner.clone()),
                // Typed handles to user classes are references to that class
                ("Gd", [inner]) => inner.clone(),
                _ => DeclaredType::generic(name, args),
            }
        }
        _ => DeclaredType::named(type_text(ty)),
    }
}

fn type_text(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}

/// The innermost named type, e.g. `Team` in `TypedArray<Team>`
fn leaf_name(ty: &DeclaredType) -> Option<&str> {
    match ty {
        DeclaredType::Optional(inner) | DeclaredType::Sequence(inner) => leaf_name(inner),
        DeclaredType::Named { name, args } => match args.last() {
            Some(arg) => leaf_name(arg),
            None => Some(name),
        },
        DeclaredType::Enum { name, .. } => Some(name),
        DeclaredType::Pointer(_) => None,
    }
}

/// Open-world classification context
#[derive(Debug, Default)]
pub struct MacroContext {
    enums: HashMap<String, EnumWidth>,
}

impl MacroContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat the innermost named type of `ty` as an enum of `width`
    pub fn with_enum(mut self, ty: &DeclaredType, width: EnumWidth) -> Self {
        if let Some(name) = leaf_name(ty) {
            self.enums.insert(name.to_string(), width);
        }
        self
    }
}

impl TypeContext for MacroContext {
    fn enum_width(&self, name: &str) -> Option<EnumWidth> {
        self.enums.get(name).copied()
    }

    fn lookup_class(&self, name: &str) -> Option<RefCounting> {
        let is_type_name = name.starts_with(|c: char| c.is_ascii_uppercase())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        (is_type_name && !NOT_CLASSES.contains(&name)).then_some(RefCounting::Dynamic)
    }
}

/// Classify `ty`; a rejected type becomes a compile error pointing at it
pub fn marshaled(ty: &Type, ctx: &MacroContext) -> syn::Result<MarshaledType> {
    classified(ty, &declared_type(ty), ctx)
}

/// Classify the already-declared `declared`, reporting errors at `ty`
pub fn classified(ty: &Type, declared: &DeclaredType, ctx: &MacroContext) -> syn::Result<MarshaledType> {
    classify(declared, ctx)
        .map(|category| MarshaledType::new(quote!(#ty), category))
        .map_err(|err| syn::Error::new_spanned(ty, err.to_string()))
}

/// Width for an `enum_width` attribute value
pub fn enum_width(bits: u32) -> Option<EnumWidth> {
    match bits {
        32 => Some(EnumWidth::Int32),
        64 => Some(EnumWidth::Int64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbind_core::{PrimitiveKind, TypeCategory};
    use syn::parse_quote;

    fn category(ty: Type, ctx: &MacroContext) -> syn::Result<TypeCategory> {
        marshaled(&ty, ctx).map(|m| m.category)
    }

    #[test]
    fn test_user_types_classify() {
        let ctx = MacroContext::new();
        assert_eq!(
            category(parse_quote!(i64), &ctx).unwrap(),
            TypeCategory::Primitive(PrimitiveKind::I64)
        );
        assert!(matches!(
            category(parse_quote!(Option<Gd<Player>>), &ctx).unwrap(),
            TypeCategory::ObjectReference { ref class, nullable: true, ref_counting: RefCounting::Dynamic }
                if class == "Player"
        ));
        assert!(matches!(
            category(parse_quote!(TypedArray<Node>), &ctx).unwrap(),
            TypeCategory::HomogeneousCollection(_)
        ));
    }

    #[test]
    fn test_rejections_become_errors() {
        let ctx = MacroContext::new();
        let err = category(parse_quote!(Vec<i64>), &ctx).unwrap_err();
        assert!(err.to_string().contains("TypedArray"));
        assert!(category(parse_quote!(Option<i64>), &ctx).is_err());
        assert!(category(parse_quote!(&[Node]), &ctx).is_err());
        assert!(category(parse_quote!(String), &ctx).is_err());
    }

    #[test]
    fn test_enum_attribute_marks_leaf() {
        let ty: Type = parse_quote!(TypedArray<Team>);
        let declared = declared_type(&ty);
        let ctx = MacroContext::new().with_enum(&declared, EnumWidth::Int32);
        assert_eq!(
            classified(&ty, &declared, &ctx).unwrap().category,
            TypeCategory::HomogeneousCollection(Box::new(TypeCategory::Enum(EnumWidth::Int32)))
        );
    }
}
