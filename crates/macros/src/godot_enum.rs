//! GodotEnum derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{parse_enum, EnumArgs};

/// Generate GodotEnum and the Variant conversions for a fieldless enum
pub fn derive_godot_enum(input: DeriveInput) -> TokenStream {
    match parse_enum(&input) {
        Ok(args) => generate_impl(&args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: &EnumArgs) -> TokenStream {
    let enum_name = &args.ident;
    let variants = match &args.data {
        darling::ast::Data::Enum(variants) => variants,
        darling::ast::Data::Struct(_) => {
            return syn::Error::new_spanned(enum_name, "GodotEnum can only be derived for enums")
                .to_compile_error()
        }
    };
    if variants.is_empty() {
        return syn::Error::new_spanned(enum_name, "GodotEnum needs at least one case")
            .to_compile_error();
    }

    let width = args.width();
    let bitfield = args.bitfield;
    let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let labels: Vec<String> = variants
        .iter()
        .map(|v| v.rename.clone().unwrap_or_else(|| v.ident.to_string()))
        .collect();

    quote! {
        impl ::gdbind_runtime::GodotEnum for #enum_name {
            const WIDTH: u32 = #width;
            const IS_BITFIELD: bool = #bitfield;

            fn from_raw(raw: i64) -> ::core::option::Option<Self> {
                #(
                    if raw == #enum_name::#idents as i64 {
                        return ::core::option::Option::Some(#enum_name::#idents);
                    }
                )*
                ::core::option::Option::None
            }

            fn to_raw(self) -> i64 {
                self as i64
            }

            fn hint_string() -> ::std::string::String {
                [#(::std::format!("{}:{}", #labels, #enum_name::#idents as i64)),*].join(",")
            }
        }

        impl ::gdbind_runtime::ToVariant for #enum_name {
            fn to_variant(&self) -> ::gdbind_runtime::Variant {
                ::gdbind_runtime::Variant::Int(::gdbind_runtime::GodotEnum::to_raw(*self))
            }
        }

        impl ::gdbind_runtime::FromVariant for #enum_name {
            fn from_variant(
                variant: &::gdbind_runtime::Variant,
            ) -> ::core::result::Result<Self, ::gdbind_runtime::VariantConversionError> {
                match variant {
                    ::gdbind_runtime::Variant::Int(raw) => {
                        <Self as ::gdbind_runtime::GodotEnum>::from_raw(*raw)
                            .ok_or(::gdbind_runtime::VariantConversionError::UnknownEnumValue(*raw))
                    }
                    other => ::core::result::Result::Err(
                        ::gdbind_runtime::VariantConversionError::mismatch(
                            ::gdbind_runtime::VariantType::Int,
                            other,
                        ),
                    ),
                }
            }
        }

        impl ::gdbind_runtime::ArrayElement for #enum_name {
            fn element_type() -> ::gdbind_runtime::VariantType {
                ::gdbind_runtime::VariantType::Int
            }
        }
    }
}
