//! Engine enums
//!
//! Engine enums are emitted as `i64` newtypes with associated constants rather
//! than Rust enums: the engine may hand back values added in later versions,
//! and bitfields combine freely.

use std::collections::HashSet;

use gdbind_schema::EnumDescriptor;
use proc_macro2::TokenStream;
use quote::quote;

use crate::naming;

/// Emit the newtype for `desc` under the name `type_name`
pub fn emit_enum(type_name: &str, desc: &EnumDescriptor) -> TokenStream {
    let name = naming::ident(type_name);
    let is_bitfield = desc.is_bitfield;

    let mut seen_names = HashSet::new();
    let constants = desc.values.iter().filter_map(|(value_name, value)| {
        let constant = naming::enum_constant_name(&desc.name, value_name);
        if !seen_names.insert(constant.clone()) {
            return None;
        }
        let constant = naming::ident(&constant);
        Some(quote!(pub const #constant: #name = #name(#value);))
    });

    let mut seen_values = HashSet::new();
    let known: Vec<i64> = desc
        .values
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| seen_values.insert(*v))
        .collect();

    let from_raw = if is_bitfield {
        quote!(Some(Self(raw)))
    } else if known.is_empty() {
        quote!(None)
    } else {
        quote! {
            match raw {
                #(#known)|* => Some(Self(raw)),
                _ => None,
            }
        }
    };

    let hint = desc
        .values
        .iter()
        .map(|(n, v)| format!("{}:{}", n, v))
        .collect::<Vec<_>>()
        .join(",");

    let bit_ops = is_bitfield.then(|| {
        quote! {
            impl ::core::ops::BitOr for #name {
                type Output = Self;

                fn bitor(self, rhs: Self) -> Self {
                    Self(self.0 | rhs.0)
                }
            }

            impl ::core::ops::BitOrAssign for #name {
                fn bitor_assign(&mut self, rhs: Self) {
                    self.0 |= rhs.0;
                }
            }
        }
    });

    let variant_int = crate::marshal::variant_type_tokens(gdbind_schema::VariantType::Int);

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct #name(pub i64);

        impl #name {
            #(#constants)*
        }

        #bit_ops

        impl ::gdbind_runtime::GodotEnum for #name {
            const WIDTH: u32 = 64;
            const IS_BITFIELD: bool = #is_bitfield;

            fn from_raw(raw: i64) -> Option<Self> {
                #from_raw
            }

            fn to_raw(self) -> i64 {
                self.0
            }

            fn hint_string() -> ::std::string::String {
                ::std::string::String::from(#hint)
            }
        }

        impl ::gdbind_runtime::ToVariant for #name {
            fn to_variant(&self) -> ::gdbind_runtime::Variant {
                ::gdbind_runtime::Variant::Int(self.0)
            }
        }

        impl ::gdbind_runtime::FromVariant for #name {
            fn from_variant(
                variant: &::gdbind_runtime::Variant,
            ) -> Result<Self, ::gdbind_runtime::VariantConversionError> {
                match variant {
                    ::gdbind_runtime::Variant::Int(raw) => {
                        <Self as ::gdbind_runtime::GodotEnum>::from_raw(*raw)
                            .ok_or(::gdbind_runtime::VariantConversionError::UnknownEnumValue(*raw))
                    }
                    other => Err(::gdbind_runtime::VariantConversionError::mismatch(#variant_int, other)),
                }
            }
        }

        impl ::gdbind_runtime::ArrayElement for #name {
            fn element_type() -> ::gdbind_runtime::VariantType {
                #variant_int
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, bitfield: bool, values: &[(&str, i64)]) -> EnumDescriptor {
        EnumDescriptor {
            name: name.to_string(),
            is_bitfield: bitfield,
            values: values.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_enum_constants_and_validation() {
        let desc = descriptor(
            "ProcessMode",
            false,
            &[
                ("PROCESS_MODE_INHERIT", 0),
                ("PROCESS_MODE_PAUSABLE", 1),
                ("PROCESS_MODE_ALWAYS", 3),
            ],
        );
        let tokens = emit_enum("ProcessMode", &desc);
        let file: syn::File = syn::parse2(tokens.clone()).unwrap();
        assert_eq!(file.items.len(), 6);

        let text: String = tokens.to_string().split_whitespace().collect();
        assert!(text.contains("pubconstINHERIT:ProcessMode=ProcessMode(0i64);"));
        assert!(text.contains("0i64|1i64|3i64=>Some(Self(raw))"));
        assert!(text.contains("constIS_BITFIELD:bool=false"));
        assert!(!text.contains("BitOr"));
    }

    #[test]
    fn test_bitfield_accepts_any_combination() {
        let desc = descriptor(
            "MouseButtonMask",
            true,
            &[("MOUSE_BUTTON_MASK_LEFT", 1), ("MOUSE_BUTTON_MASK_RIGHT", 2)],
        );
        let text: String = emit_enum("MouseButtonMask", &desc)
            .to_string()
            .split_whitespace()
            .collect();
        assert!(text.contains("pubconstLEFT:MouseButtonMask=MouseButtonMask(1i64);"));
        assert!(text.contains("fnfrom_raw(raw:i64)->Option<Self>{Some(Self(raw))}"));
        assert!(text.contains("impl::core::ops::BitOrforMouseButtonMask"));
    }

    #[test]
    fn test_aliases_are_deduplicated() {
        let desc = descriptor("Key", false, &[("KEY_A", 65), ("KEY_ALIAS_A", 65), ("KEY_A", 65)]);
        let text: String = emit_enum("Key", &desc)
            .to_string()
            .split_whitespace()
            .collect();
        assert!(text.contains("65i64=>Some(Self(raw))"));
        assert_eq!(text.matches("pubconstA:").count(), 1);
        assert!(text.contains("pubconstALIAS_A:"));
    }
}
