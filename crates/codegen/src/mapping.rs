//! Engine types as seen from one generated module
//!
//! Maps the declared types of schema members to Rust types and marshaling
//! categories. Classes outside the module's available set are replaced by
//! their nearest available ancestor; object references are always nullable
//! because the engine may hand back a null object anywhere.

use std::collections::HashSet;

use gdbind_core::{classify, ClassifyError};
use gdbind_schema::{DeclaredType, Schema};
use proc_macro2::TokenStream;
use quote::quote;

use crate::marshal::MarshaledType;
use crate::naming;

/// Where an engine enum is emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumOwner {
    /// Global and builtin-owned enums live at module scope under a flattened name
    Module(String),
    /// Class enums live in the class's module
    Class { class: String, name: String },
}

/// Resolves declared types against the schema and one module's available classes
pub struct TypeMapper<'a> {
    schema: &'a Schema,
    available: HashSet<&'a str>,
    foundational: &'a str,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schema: &'a Schema, available: &'a [String], foundational: &'a str) -> Self {
        Self {
            schema,
            available: available.iter().map(String::as_str).collect(),
            foundational,
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn is_available(&self, class: &str) -> bool {
        self.available.contains(class)
    }

    /// `class` if available, else its nearest available ancestor, else the
    /// foundational class
    pub fn resolve_class(&self, class: &str) -> String {
        if self.is_available(class) {
            return class.to_string();
        }
        let fallback = self
            .schema
            .ancestors(class)
            .into_iter()
            .find(|ancestor| self.is_available(ancestor))
            .unwrap_or(self.foundational);
        tracing::warn!("`{}` is not available here, using `{}`", class, fallback);
        fallback.to_string()
    }

    /// Where the enum named `qualified` is emitted, or `None` if it cannot be
    /// referenced from this module
    pub fn enum_owner(&self, qualified: &str) -> Option<EnumOwner> {
        let desc = self.schema.find_enum(qualified)?;
        if self.schema.global_enums.iter().any(|e| e.name == qualified) {
            return Some(EnumOwner::Module(naming::flat_enum_name(qualified)));
        }
        let (owner, _) = qualified.split_once('.')?;
        if self.schema.builtin(owner).is_some() {
            return Some(EnumOwner::Module(naming::flat_enum_name(qualified)));
        }
        if self.is_available(owner) {
            return Some(EnumOwner::Class {
                class: owner.to_string(),
                name: desc.name.clone(),
            });
        }
        None
    }

    /// Rewrite `ty` into the shape the wrappers expose
    fn normalize(&self, ty: &DeclaredType) -> DeclaredType {
        match ty {
            DeclaredType::Named { name, args } if args.is_empty() => {
                if self.schema.contains_class(name) {
                    DeclaredType::optional(DeclaredType::named(self.resolve_class(name)))
                } else {
                    ty.clone()
                }
            }
            DeclaredType::Named { name, args } if name == "TypedArray" => {
                let args = args
                    .iter()
                    .map(|arg| match self.normalize(arg) {
                        DeclaredType::Optional(inner) => *inner,
                        other => other,
                    })
                    .collect();
                DeclaredType::generic(name.clone(), args)
            }
            DeclaredType::Enum { name, .. } if self.enum_owner(name).is_none() => {
                tracing::debug!("enum `{}` is not reachable, exposing it as i64", name);
                DeclaredType::named("i64")
            }
            other => other.clone(),
        }
    }

    fn tokens(&self, ty: &DeclaredType) -> TokenStream {
        match ty {
            DeclaredType::Named { name, args } if name == "TypedArray" => {
                let args = args.iter().map(|a| self.tokens(a));
                quote!(::gdbind_runtime::TypedArray<#(#args),*>)
            }
            DeclaredType::Named { name, .. } if name == "Variant" => quote!(::gdbind_runtime::Variant),
            DeclaredType::Named { name, .. } if self.schema.contains_class(name) => {
                let class = naming::ident(name);
                quote!(#class)
            }
            DeclaredType::Named { name, .. } => naming::host_type(name),
            DeclaredType::Optional(inner) => {
                let inner = self.tokens(inner);
                quote!(::core::option::Option<#inner>)
            }
            DeclaredType::Sequence(inner) => {
                let inner = self.tokens(inner);
                quote!(::std::vec::Vec<#inner>)
            }
            DeclaredType::Enum { name, .. } => match self.enum_owner(name) {
                Some(EnumOwner::Module(flat)) => {
                    let flat = naming::ident(&flat);
                    quote!(#flat)
                }
                Some(EnumOwner::Class { class, name }) => {
                    let module = naming::ident(&naming::module_name(&class));
                    let name = naming::ident(&name);
                    quote!(#module::#name)
                }
                None => quote!(i64),
            },
            DeclaredType::Pointer(raw) => quote!(#raw),
        }
    }

    /// Rust type and category of a declared engine type
    pub fn map(&self, ty: &DeclaredType) -> Result<MarshaledType, ClassifyError> {
        let normalized = self.normalize(ty);
        let category = classify(&normalized, self.schema)?;
        Ok(MarshaledType::new(self.tokens(&normalized), category))
    }
}
