//! Identifier and file naming for emitted code

use convert_case::{Case, Casing};
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

/// Names that cannot even be raw identifiers
const RESERVED: [&str; 4] = ["self", "super", "crate", "Self"];

/// A valid Rust identifier for `name`.
///
/// Keywords become raw identifiers (`r#type`); the path keywords that cannot be
/// raw get a trailing underscore, and names that do not start like an
/// identifier get a leading one.
pub fn ident(name: &str) -> Ident {
    if name.is_empty() || name == "_" {
        return Ident::new("_unnamed", Span::call_site());
    }
    if RESERVED.contains(&name) {
        return Ident::new(&format!("{}_", name), Span::call_site());
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Ident::new(&format!("_{}", name), Span::call_site());
    }
    if syn::parse_str::<Ident>(name).is_ok() {
        Ident::new(name, Span::call_site())
    } else {
        Ident::new_raw(name, Span::call_site())
    }
}

/// Primitive type names a module must not shadow
const PRIMITIVES: [&str; 17] = [
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// Module and file stem of a type (`Node2D` -> `node2d`, `bool` -> `bool_`)
pub fn module_name(type_name: &str) -> String {
    let lower = type_name.to_lowercase();
    if PRIMITIVES.contains(&lower.as_str()) {
        format!("{}_", lower)
    } else {
        lower
    }
}

/// Extension trait carrying the methods of a builtin value type
pub fn builtin_trait_name(engine_name: &str, host_name: &str) -> String {
    if is_scalar(host_name) {
        format!("{}Methods", engine_name.to_case(Case::Pascal))
    } else {
        format!("{}Methods", host_name)
    }
}

/// Trait holding the overridable methods of a class
pub fn virtual_trait_name(class: &str) -> String {
    format!("{}Virtual", class)
}

/// Free function dispatching virtual calls for a class
pub fn virtual_dispatcher_name(class: &str) -> String {
    format!("dispatch_{}_virtual", module_name(class))
}

/// Rust name of a virtual method (`_process` -> `process`)
pub fn virtual_method_name(method: &str) -> &str {
    method.trim_start_matches('_')
}

/// Name of an engine enum as emitted at module scope.
///
/// Dotted global and builtin-owned enums are flattened (`Variant.Type` ->
/// `VariantType`).
pub fn flat_enum_name(qualified: &str) -> String {
    qualified.replace('.', "")
}

/// Constant name of an enum value, without the enum's own prefix.
///
/// `PROCESS_MODE_INHERIT` in `ProcessMode` becomes `INHERIT`. The prefix is
/// kept when dropping it would leave nothing or a leading digit.
pub fn enum_constant_name(enum_name: &str, value: &str) -> String {
    let prefix = format!("{}_", enum_name.to_case(Case::UpperSnake));
    match value.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => value.to_string(),
    }
}

/// Whether a host type name is a Rust primitive
pub fn is_scalar(name: &str) -> bool {
    matches!(
        name,
        "bool" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "f32" | "f64"
    )
}

/// Tokens naming a primitive or runtime value type by its host name
pub fn host_type(name: &str) -> TokenStream {
    let ty = ident(name);
    if is_scalar(name) {
        quote!(#ty)
    } else {
        quote!(::gdbind_runtime::#ty)
    }
}
