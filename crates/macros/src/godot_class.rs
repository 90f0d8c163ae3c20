//! GodotClass derive macro implementation

use std::str::FromStr;

use gdbind_codegen::classes::level_tokens;
use gdbind_codegen::{emit_members, ClassMember, ExportedField, PropertySpec};
use gdbind_schema::InitializationLevel;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{DeriveInput, GenericArgument, Ident, PathArguments, Type};

use crate::parse::{parse_class, ClassArgs, ExportArgs, FieldArgs, FieldMarker};
use crate::types::{self, MacroContext};

/// Generate GodotClass and ExportedClass for a user struct
pub fn derive_godot_class(input: DeriveInput) -> TokenStream {
    let args = match parse_class(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors(),
    };
    match generate_impl(&args) {
        Ok(tokens) => tokens,
        Err(e) => e.write_errors(),
    }
}

/// `T` of a `Base<T>` field type
fn base_of(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Base" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn last_ident(tokens: &impl ToTokens) -> String {
    let text = tokens.to_token_stream().to_string().replace(' ', "");
    text.rsplit("::").next().unwrap_or_default().to_string()
}

fn generate_impl(args: &ClassArgs) -> darling::Result<TokenStream> {
    let struct_name = &args.ident;
    let mut errors = darling::Error::accumulator();

    if !args.generics.params.is_empty() {
        errors.push(
            darling::Error::custom("engine classes cannot be generic").with_span(&args.generics),
        );
    }

    let fields = match &args.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        darling::ast::Data::Enum(_) => {
            return Err(darling::Error::custom("GodotClass can only be derived for structs")
                .with_span(struct_name))
        }
    };

    let mut base: Option<(&Ident, &Type)> = None;
    for field in fields {
        let (Some(ident), Some(inner)) = (&field.ident, base_of(&field.ty)) else {
            continue;
        };
        if base.is_some() {
            errors.push(darling::Error::custom("only one `Base<T>` field is allowed").with_span(ident));
        } else {
            base = Some((ident, inner));
        }
    }
    let Some((base_field, base_ty)) = base else {
        errors.push(
            darling::Error::custom("a class needs a `base: Base<T>` field naming the engine class it extends")
                .with_span(struct_name),
        );
        return Err(darling::Error::multiple(errors.into_inner()));
    };

    if let Some(declared) = &args.base {
        if last_ident(declared) != last_ident(base_ty) {
            errors.push(
                darling::Error::custom(format!(
                    "`base = {}` does not match the `Base<{}>` field",
                    last_ident(declared),
                    last_ident(base_ty)
                ))
                .with_span(declared),
            );
        }
    }

    let level = match args.init_level.as_deref().map(InitializationLevel::from_str) {
        None => InitializationLevel::Scene,
        Some(Ok(level)) => level,
        Some(Err(message)) => {
            errors.push(darling::Error::custom(message).with_span(struct_name));
            InitializationLevel::Scene
        }
    };

    let class_name = args.rename.clone().unwrap_or_else(|| struct_name.to_string());

    let mut members = Vec::new();
    for field in fields {
        if field.ident.as_ref() == Some(base_field) {
            continue;
        }
        if let Some(field_members) = errors.handle(field_members(field)) {
            members.extend(field_members);
        }
    }

    errors.finish()?;

    let emission = emit_members(&class_name, &members);
    let registrations = &emission.registrations;
    let accessors = &emission.accessors;
    let arms = &emission.dispatch_arms;
    let level = level_tokens(level);

    Ok(quote! {
        impl ::gdbind_runtime::GodotClass for #struct_name {
            const CLASS_NAME: &'static str = #class_name;
            const PARENT_CLASS: ::core::option::Option<&'static str> =
                ::core::option::Option::Some(<#base_ty as ::gdbind_runtime::GodotClass>::CLASS_NAME);
            const REF_COUNTED: bool = <#base_ty as ::gdbind_runtime::GodotClass>::REF_COUNTED;
            const INIT_LEVEL: ::gdbind_runtime::InitializationLevel = #level;
        }

        impl ::gdbind_runtime::ExportedClass for #struct_name {
            type Base = #base_ty;

            #[allow(unused_variables)]
            fn register_properties(builder: &mut ::gdbind_runtime::ClassBuilder) {
                #(#registrations)*
            }

            #[allow(unused_variables)]
            fn dispatch_property(
                &mut self,
                name: &str,
                args: &::gdbind_runtime::Arguments<'_>,
            ) -> ::gdbind_runtime::CallOutcome {
                match name {
                    #(#arms)*
                    _ => ::gdbind_runtime::CallOutcome::NotFound,
                }
            }

            fn base_handle(&self) -> ::gdbind_runtime::ObjectHandle {
                ::gdbind_runtime::Base::handle(&self.#base_field)
            }
        }

        impl #struct_name {
            #(#accessors)*
        }
    })
}

/// Group markers and the exported property of one field, in attribute order
fn field_members(field: &FieldArgs) -> darling::Result<Vec<ClassMember>> {
    let markers = field.markers()?;
    let mut members: Vec<ClassMember> = markers
        .groups
        .into_iter()
        .map(|marker| match marker {
            FieldMarker::Group(g) => ClassMember::Group {
                name: g.name,
                prefix: g.prefix,
            },
            FieldMarker::Subgroup(g) => ClassMember::Subgroup {
                name: g.name,
                prefix: g.prefix,
            },
        })
        .collect();

    if let Some(export) = &markers.export {
        members.push(ClassMember::Property(exported_field(field, export)?));
    }
    Ok(members)
}

fn exported_field(field: &FieldArgs, export: &ExportArgs) -> darling::Result<ExportedField> {
    let Some(ident) = field.ident.clone() else {
        return Err(darling::Error::custom("exported fields must be named").with_span(&field.ty));
    };

    let declared = types::declared_type(&field.ty);
    let mut ctx = MacroContext::new();
    if let Some(bits) = export.enum_width {
        let width = types::enum_width(bits).ok_or_else(|| {
            darling::Error::custom(format!("`enum_width` must be 32 or 64, not {}", bits))
                .with_span(&ident)
        })?;
        ctx = ctx.with_enum(&declared, width);
    }
    let ty = types::classified(&field.ty, &declared, &ctx)?;

    let spec = PropertySpec {
        hint: export.property_hint().map_err(|e| e.with_span(&ident))?,
        hint_string: export.hint_string.clone(),
        usage: export.property_usage().map_err(|e| e.with_span(&ident))?,
    };

    let name = export
        .rename
        .clone()
        .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());

    Ok(ExportedField {
        field: ident,
        name,
        ty,
        spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        derive_godot_class(input)
            .to_string()
            .split_whitespace()
            .collect()
    }

    #[test]
    fn test_class_identity_and_registration_order() {
        let text = expand(parse_quote! {
            #[class(base = Node, init_level = "servers")]
            struct Car {
                base: Base<Node>,
                #[export_group(name = "Year Made", prefix = "ymms_")]
                #[export]
                ymms_year: i64,
                #[export(hint = "multiline_text")]
                non_prefixed_bool: bool,
                cache: i64,
            }
        });

        assert!(text.contains("constCLASS_NAME:&'staticstr=\"Car\""));
        assert!(text.contains("<Nodeas::gdbind_runtime::GodotClass>::REF_COUNTED"));
        assert!(text.contains("::gdbind_runtime::InitializationLevel::Servers"));
        assert!(text.contains("typeBase=Node;"));

        let group = text.find("add_property_group(\"YearMade\",\"ymms_\")").unwrap();
        let year = text.find("\"set_year\",\"get_year\"").unwrap();
        let flag = text.find("\"set_non_prefixed_bool\"").unwrap();
        assert!(group < year && year < flag);
        assert!(text.contains("::gdbind_runtime::PropertyHint::MultilineText"));
        assert!(!text.contains("cache\""));
        assert!(text.contains("::gdbind_runtime::Base::handle(&self.base)"));
    }

    #[test]
    fn test_object_field_transfers_ownership() {
        let text = expand(parse_quote! {
            struct Holder {
                base: Base<Node>,
                #[export]
                target: Option<Gd<Player>>,
            }
        });
        let retain = text.find("object::retain_if_ref_counted").unwrap();
        let release = text.find("object::release_if_ref_counted").unwrap();
        assert!(retain < release);
    }

    #[test]
    fn test_enum_field_needs_width() {
        let text = expand(parse_quote! {
            struct Unit {
                base: Base<Node>,
                #[export(enum_width = 32)]
                team: Team,
            }
        });
        assert!(text.contains("args.try_enum32(0usize)"));
        assert!(text.contains("<Teamas::gdbind_runtime::GodotEnum>::hint_string()"));

        let text = expand(parse_quote! {
            struct Unit {
                base: Base<Node>,
                #[export(enum_width = 16)]
                team: Team,
            }
        });
        assert!(text.contains("compile_error"));
        assert!(text.contains("32or64"));
    }

    #[test]
    fn test_rejected_field_types() {
        let text = expand(parse_quote! {
            struct Bag {
                base: Base<Node>,
                #[export]
                items: Vec<i64>,
                #[export]
                maybe: Option<i64>,
            }
        });
        assert_eq!(text.matches("compile_error").count(), 2);
        assert!(text.contains("TypedArray"));
    }

    #[test]
    fn test_base_field_required_and_consistent() {
        let text = expand(parse_quote! {
            struct Loose {
                #[export]
                health: i64,
            }
        });
        assert!(text.contains("compile_error"));
        assert!(text.contains("Base<T>"));

        let text = expand(parse_quote! {
            #[class(base = Node2D)]
            struct Sprite {
                base: Base<Node>,
            }
        });
        assert!(text.contains("doesnotmatch"));

        let text = expand(parse_quote! {
            #[class(init_level = "gameplay")]
            struct Sprite {
                base: Base<Node>,
            }
        });
        assert!(text.contains("unknowninitializationlevel"));
    }

    #[test]
    fn test_rename_class_and_property() {
        let text = expand(parse_quote! {
            #[class(rename = "PlayerCharacter")]
            struct Player {
                base: Base<Node>,
                #[export(rename = "hp")]
                health: i64,
            }
        });
        assert!(text.contains("=\"PlayerCharacter\""));
        assert!(text.contains("\"set_hp\""));
        assert!(text.contains("self.health=value;"));
    }
}
