//! Attribute parsing for the derive and attribute macros

use darling::{FromDeriveInput, FromField, FromMeta, FromVariant};
use gdbind_schema::{PropertyHint, PropertyUsage};
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, Meta, Path, Token, Type};

/// Parsed #[class(...)] attributes on a user class
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(class), supports(struct_named))]
pub struct ClassArgs {
    /// Struct identifier
    pub ident: Ident,

    pub generics: syn::Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), FieldArgs>,

    /// Engine class extended; must agree with the `Base<T>` field when given
    #[darling(default)]
    pub base: Option<Path>,

    /// Initialization tier name (`core`, `servers`, `scene`, `editor`)
    #[darling(default)]
    pub init_level: Option<String>,

    /// Class name registered with the engine, defaults to the struct name
    #[darling(default)]
    pub rename: Option<String>,
}

/// A field of a user class, with its export markers forwarded unparsed
#[derive(Debug, FromField)]
#[darling(forward_attrs(export, export_group, export_subgroup))]
pub struct FieldArgs {
    pub ident: Option<Ident>,
    pub ty: Type,
    pub attrs: Vec<Attribute>,
}

/// #[export(...)] on a field
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
pub struct ExportArgs {
    /// Property hint by snake_case name (`range`, `file`, `multiline_text`, ...)
    pub hint: Option<String>,
    pub hint_string: Option<String>,
    /// Usage flags separated by `|` (`storage|editor`)
    pub usage: Option<String>,
    /// Marks the field as an enum stored in 32 or 64 bits
    pub enum_width: Option<u32>,
    /// Property name registered with the engine, defaults to the field name
    pub rename: Option<String>,
}

impl ExportArgs {
    pub fn property_hint(&self) -> darling::Result<Option<PropertyHint>> {
        self.hint
            .as_deref()
            .map(|name| {
                PropertyHint::from_name(name)
                    .ok_or_else(|| darling::Error::unknown_value(name))
            })
            .transpose()
    }

    pub fn property_usage(&self) -> darling::Result<PropertyUsage> {
        let Some(usage) = &self.usage else {
            return Ok(PropertyUsage::DEFAULT);
        };
        usage
            .split('|')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .try_fold(PropertyUsage::empty(), |acc, flag| {
                PropertyUsage::from_name(&flag.to_ascii_uppercase())
                    .map(|f| acc | f)
                    .ok_or_else(|| darling::Error::unknown_value(flag))
            })
    }
}

/// #[export_group(...)] and #[export_subgroup(...)]
#[derive(Debug, Clone, FromMeta)]
pub struct GroupArgs {
    pub name: String,
    #[darling(default)]
    pub prefix: String,
}

/// A marker found on a field, in attribute order
#[derive(Debug)]
pub enum FieldMarker {
    Group(GroupArgs),
    Subgroup(GroupArgs),
}

/// Everything attached to one field
#[derive(Debug, Default)]
pub struct FieldMarkers {
    /// Group markers taking effect before this field
    pub groups: Vec<FieldMarker>,
    pub export: Option<ExportArgs>,
}

impl FieldArgs {
    pub fn markers(&self) -> darling::Result<FieldMarkers> {
        let mut markers = FieldMarkers::default();
        let mut errors = darling::Error::accumulator();

        for attr in &self.attrs {
            let Some(name) = attr.path().get_ident().map(Ident::to_string) else {
                continue;
            };
            match name.as_str() {
                "export" => {
                    let args = match &attr.meta {
                        Meta::Path(_) => Ok(ExportArgs::default()),
                        meta => ExportArgs::from_meta(meta),
                    };
                    if let Some(args) = errors.handle(args.map_err(|e| e.with_span(attr))) {
                        markers.export = Some(args);
                    }
                }
                "export_group" | "export_subgroup" => {
                    let group = GroupArgs::from_meta(&attr.meta).map_err(|e| e.with_span(attr));
                    if let Some(group) = errors.handle(group) {
                        markers.groups.push(if name == "export_group" {
                            FieldMarker::Group(group)
                        } else {
                            FieldMarker::Subgroup(group)
                        });
                    }
                }
                _ => {}
            }
        }

        errors.finish_with(markers)
    }
}

/// Parsed #[godot_enum(...)] attributes on a user enum
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(godot_enum), supports(enum_unit), forward_attrs(repr))]
pub struct EnumArgs {
    pub ident: Ident,

    pub data: darling::ast::Data<EnumVariantArgs, ()>,

    pub attrs: Vec<Attribute>,

    /// Cases are bit flags
    #[darling(default)]
    pub bitfield: bool,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(godot_enum))]
pub struct EnumVariantArgs {
    pub ident: Ident,

    /// Case name shown in the editor hint, defaults to the variant name
    #[darling(default)]
    pub rename: Option<String>,
}

impl EnumArgs {
    /// Raw width from `#[repr(...)]`; 64 bits unless a 32-bit or narrower
    /// integer representation is declared
    pub fn width(&self) -> u32 {
        self.attrs
            .iter()
            .filter(|a| a.path().is_ident("repr"))
            .filter_map(|a| a.parse_args::<Ident>().ok())
            .find_map(|repr| match repr.to_string().as_str() {
                "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => Some(32),
                "i64" | "u64" | "isize" | "usize" => Some(64),
                _ => None,
            })
            .unwrap_or(64)
    }
}

/// Arguments to the godot_api attribute
///
/// Usage:
/// - `#[godot_api]`
/// - `#[godot_api(virtuals = node::dispatch_node_virtual)]`
#[derive(Debug, Default)]
pub struct ApiArgs {
    /// Dispatcher tried for names no callable matches
    pub virtuals: Option<Path>,
}

impl Parse for ApiArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(Self::default());
        }
        let key: Ident = input.parse()?;
        if key != "virtuals" {
            return Err(syn::Error::new(key.span(), "expected `virtuals`"));
        }
        input.parse::<Token![=]>()?;
        let virtuals: Path = input.parse()?;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        Ok(Self {
            virtuals: Some(virtuals),
        })
    }
}

/// Parse a DeriveInput into ClassArgs
pub fn parse_class(input: &syn::DeriveInput) -> darling::Result<ClassArgs> {
    ClassArgs::from_derive_input(input)
}

/// Parse a DeriveInput into EnumArgs
pub fn parse_enum(input: &syn::DeriveInput) -> darling::Result<EnumArgs> {
    EnumArgs::from_derive_input(input)
}
