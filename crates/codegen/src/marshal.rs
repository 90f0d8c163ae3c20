//! Marshaling rules per type category
//!
//! Every fragment here is written against `::gdbind_runtime` and shared by the
//! generator (engine wrappers, virtual dispatch) and the derive macros (user
//! property accessors, method proxies, registration metadata).
//!
//! Decoding never panics: a value that does not convert is reported through
//! `print_err` with the class, the member and the expected type, and the
//! setter or call becomes a no-op.

use gdbind_core::{EnumWidth, RefCounting, TypeCategory};
use gdbind_schema::{PropertyHint, PropertyUsage, VariantType};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

/// A Rust type as written, paired with the category selecting its rules
#[derive(Debug, Clone)]
pub struct MarshaledType {
    pub ty: TokenStream,
    pub category: TypeCategory,
}

impl MarshaledType {
    pub fn new(ty: TokenStream, category: TypeCategory) -> Self {
        Self { ty, category }
    }
}

/// Editor metadata attached to a registered property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySpec {
    /// `None` lets the category choose (enums hint their cases)
    pub hint: Option<PropertyHint>,
    pub hint_string: Option<String>,
    pub usage: PropertyUsage,
}

/// How strictly an enum argument is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumDecode {
    /// Unknown raw values are an error
    Strict,
    /// Unknown raw values decode to `None`
    Lenient,
}

fn decode_argument(category: &TypeCategory, index: usize, enums: EnumDecode) -> TokenStream {
    match (category, enums) {
        (TypeCategory::Enum(EnumWidth::Int32), EnumDecode::Strict) => quote!(args.enum32(#index)),
        (TypeCategory::Enum(EnumWidth::Int64), EnumDecode::Strict) => quote!(args.enum64(#index)),
        (TypeCategory::Enum(EnumWidth::Int32), EnumDecode::Lenient) => {
            quote!(args.try_enum32(#index))
        }
        (TypeCategory::Enum(EnumWidth::Int64), EnumDecode::Lenient) => {
            quote!(args.try_enum64(#index))
        }
        (TypeCategory::HomogeneousCollection(_), _) => quote!(args.typed_array(#index)),
        _ => quote!(args.value(#index)),
    }
}

/// Encode a value for the calling convention
pub fn encode_argument(expr: TokenStream) -> TokenStream {
    quote!(::gdbind_runtime::ToVariant::to_variant(&#expr))
}

/// Decode the `ret` variant of an engine call, reporting mismatches under `context`
pub fn decode_return(ty: &MarshaledType, context: &str) -> TokenStream {
    let rust_ty = &ty.ty;
    quote!(::gdbind_runtime::decode_return::<#rust_ty>(ret, #context))
}

/// Body of a property setter taking `args` and assigning `self.<field>`.
///
/// Returns early, leaving the field untouched, when the value does not decode.
/// An unknown enum value is ignored without a diagnostic.
pub fn property_setter(class: &str, property: &str, field: &Ident, ty: &MarshaledType) -> TokenStream {
    let rust_ty = &ty.ty;
    let context = format!("{}.{}", class, property);
    let expected = ty.category.to_string();
    let report = quote! {
        ::gdbind_runtime::print_err(format!(
            "Error setting `{}`: expected {}, {}", #context, #expected, err
        ));
        return;
    };

    let decode = match &ty.category {
        TypeCategory::Enum(_) => {
            let call = decode_argument(&ty.category, 0, EnumDecode::Lenient);
            quote! {
                let value: #rust_ty = match #call {
                    Ok(Some(value)) => value,
                    Ok(None) => return,
                    Err(err) => { #report }
                };
            }
        }
        category => {
            let call = decode_argument(category, 0, EnumDecode::Strict);
            quote! {
                let value: #rust_ty = match #call {
                    Ok(value) => value,
                    Err(err) => { #report }
                };
            }
        }
    };

    let assign = match &ty.category {
        TypeCategory::ObjectReference {
            nullable,
            ref_counting,
            ..
        } => ownership_transfer(field, *nullable, *ref_counting),
        _ => quote!(self.#field = value;),
    };

    quote! {
        #decode
        #assign
    }
}

/// Store `value` into `self.<field>`, retaining the new object before the old
/// one is released so that reassigning the same object never drops it.
fn ownership_transfer(field: &Ident, nullable: bool, ref_counting: RefCounting) -> TokenStream {
    let (retain, release) = match ref_counting {
        RefCounting::No => return quote!(self.#field = value;),
        RefCounting::Yes => (
            quote!(::gdbind_runtime::object::retain),
            quote!(::gdbind_runtime::object::release),
        ),
        RefCounting::Dynamic => (
            quote!(::gdbind_runtime::object::retain_if_ref_counted),
            quote!(::gdbind_runtime::object::release_if_ref_counted),
        ),
    };

    if nullable {
        quote! {
            if let Some(new) = &value {
                #retain(::gdbind_runtime::ObjectRef::handle(new));
            }
            if let Some(old) = &self.#field {
                #release(::gdbind_runtime::ObjectRef::handle(old));
            }
            self.#field = value;
        }
    } else {
        quote! {
            #retain(::gdbind_runtime::ObjectRef::handle(&value));
            #release(::gdbind_runtime::ObjectRef::handle(&self.#field));
            self.#field = value;
        }
    }
}

/// Body of a property getter returning a `Variant`
pub fn property_getter(field: &Ident) -> TokenStream {
    quote!(::gdbind_runtime::ToVariant::to_variant(&self.#field))
}

/// An `Option<Variant>` expression decoding `args` positionally and invoking
/// `call` with the decoded locals.
///
/// All parameters are decoded before the call happens; the first failure
/// reports `Error calling `<context>`` and yields `None`. Void methods yield
/// `None`.
pub fn method_proxy(
    context: &str,
    params: &[MarshaledType],
    returns: Option<&MarshaledType>,
    call: impl FnOnce(&[Ident]) -> TokenStream,
) -> TokenStream {
    let locals: Vec<Ident> = (0..params.len()).map(|i| format_ident!("arg{}", i)).collect();
    let decodes = params.iter().zip(&locals).enumerate().map(|(index, (param, local))| {
        let rust_ty = &param.ty;
        let decode = decode_argument(&param.category, index, EnumDecode::Strict);
        quote! {
            let #local: #rust_ty = match #decode {
                Ok(value) => value,
                Err(err) => {
                    ::gdbind_runtime::print_err(format!("Error calling `{}`: {}", #context, err));
                    break 'call None;
                }
            };
        }
    });
    let invoke = call(&locals);

    let finish = match returns {
        None => quote! {
            #invoke;
            None
        },
        Some(_) => quote! {
            let result = #invoke;
            Some(::gdbind_runtime::ToVariant::to_variant(&result))
        },
    };

    quote! {
        {
            #[allow(unused_labels)]
            let outcome: Option<::gdbind_runtime::Variant> = 'call: {
                #(#decodes)*
                #finish
            };
            outcome
        }
    }
}

/// Tokens naming a variant kind
pub fn variant_type_tokens(ty: VariantType) -> TokenStream {
    let name = format_ident!("{}", format!("{:?}", ty));
    quote!(::gdbind_runtime::VariantType::#name)
}

fn hint_tokens(hint: PropertyHint) -> TokenStream {
    let name = format_ident!("{}", format!("{:?}", hint));
    quote!(::gdbind_runtime::PropertyHint::#name)
}

fn element_hint(element: &TypeCategory) -> String {
    match element {
        TypeCategory::ObjectReference { class, .. } => class.clone(),
        other => other.variant_type().engine_name().to_string(),
    }
}

/// A `PropInfo` expression describing a property, argument or return value
pub fn prop_info(name: &str, ty: &MarshaledType, spec: &PropertySpec) -> TokenStream {
    let rust_ty = &ty.ty;
    let variant_type = variant_type_tokens(ty.category.variant_type());

    let class_name = match &ty.category {
        TypeCategory::ObjectReference { class, .. } => quote!(Some(::std::string::String::from(#class))),
        TypeCategory::HomogeneousCollection(element) => match element.as_ref() {
            TypeCategory::ObjectReference { class, .. } => {
                quote!(Some(::std::string::String::from(#class)))
            }
            _ => quote!(None),
        },
        _ => quote!(None),
    };

    let (hint, hint_string) = match (&ty.category, spec.hint) {
        (_, Some(hint)) => {
            let text = spec.hint_string.clone().unwrap_or_default();
            (hint_tokens(hint), quote!(::std::string::String::from(#text)))
        }
        (TypeCategory::Enum(_), None) => (
            quote! {
                if <#rust_ty as ::gdbind_runtime::GodotEnum>::IS_BITFIELD {
                    ::gdbind_runtime::PropertyHint::Flags
                } else {
                    ::gdbind_runtime::PropertyHint::Enum
                }
            },
            match &spec.hint_string {
                Some(text) => quote!(::std::string::String::from(#text)),
                None => quote!(<#rust_ty as ::gdbind_runtime::GodotEnum>::hint_string()),
            },
        ),
        (TypeCategory::HomogeneousCollection(element), None) => {
            let text = spec
                .hint_string
                .clone()
                .unwrap_or_else(|| element_hint(element));
            (
                hint_tokens(PropertyHint::ArrayType),
                quote!(::std::string::String::from(#text)),
            )
        }
        (_, None) => {
            let text = spec.hint_string.clone().unwrap_or_default();
            (
                hint_tokens(PropertyHint::None),
                quote!(::std::string::String::from(#text)),
            )
        }
    };

    let mut usage = spec.usage;
    if matches!(ty.category, TypeCategory::OpaqueVariant { nullable: true }) {
        usage |= PropertyUsage::NIL_IS_VARIANT;
    }
    let usage_bits = usage.bits();

    quote! {
        ::gdbind_runtime::PropInfo {
            name: ::std::string::String::from(#name),
            variant_type: #variant_type,
            class_name: #class_name,
            hint: #hint,
            hint_string: #hint_string,
            usage: ::gdbind_runtime::PropertyUsage::from_bits_retain(#usage_bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbind_core::PrimitiveKind;

    fn normalized(tokens: TokenStream) -> String {
        tokens.to_string().split_whitespace().collect()
    }

    fn object(ref_counting: RefCounting, nullable: bool) -> MarshaledType {
        MarshaledType::new(
            quote!(Option<Gd<Texture>>),
            TypeCategory::ObjectReference {
                class: "Texture".to_string(),
                nullable,
                ref_counting,
            },
        )
    }

    #[test]
    fn test_primitive_setter_reports_and_returns() {
        let ty = MarshaledType::new(quote!(i64), TypeCategory::Primitive(PrimitiveKind::I64));
        let body = normalized(property_setter("Player", "health", &format_ident!("health"), &ty));
        assert!(body.contains("args.value(0usize)"));
        assert!(body.contains("Errorsetting`{}`"));
        assert!(body.contains("\"Player.health\""));
        assert!(body.contains("return;"));
        assert!(body.ends_with("self.health=value;"));
    }

    #[test]
    fn test_enum_setter_ignores_unknown_values() {
        let ty = MarshaledType::new(quote!(Mode), TypeCategory::Enum(EnumWidth::Int32));
        let body = normalized(property_setter("Player", "mode", &format_ident!("mode"), &ty));
        assert!(body.contains("args.try_enum32(0usize)"));
        assert!(body.contains("Ok(None)=>return"));
    }

    #[test]
    fn test_ref_counted_setter_retains_before_release() {
        let body = normalized(property_setter(
            "Player",
            "skin",
            &format_ident!("skin"),
            &object(RefCounting::Yes, true),
        ));
        let retain = body.find("object::retain(").unwrap();
        let release = body.find("object::release(").unwrap();
        let assign = body.find("self.skin=value").unwrap();
        assert!(retain < release && release < assign);
    }

    #[test]
    fn test_dynamic_and_unmanaged_objects() {
        let body = normalized(property_setter(
            "Player",
            "target",
            &format_ident!("target"),
            &object(RefCounting::Dynamic, true),
        ));
        assert!(body.contains("retain_if_ref_counted"));
        assert!(body.contains("release_if_ref_counted"));

        let body = normalized(property_setter(
            "Player",
            "target",
            &format_ident!("target"),
            &object(RefCounting::No, true),
        ));
        assert!(!body.contains("retain"));
        assert!(!body.contains("release"));
    }

    #[test]
    fn test_collection_setter_uses_typed_array() {
        let ty = MarshaledType::new(
            quote!(TypedArray<i64>),
            TypeCategory::HomogeneousCollection(Box::new(TypeCategory::Primitive(
                PrimitiveKind::I64,
            ))),
        );
        let body = normalized(property_setter("Player", "scores", &format_ident!("scores"), &ty));
        assert!(body.contains("args.typed_array(0usize)"));
    }

    #[test]
    fn test_proxy_decodes_before_call() {
        let params = [
            MarshaledType::new(quote!(i64), TypeCategory::Primitive(PrimitiveKind::I64)),
            MarshaledType::new(quote!(Mode), TypeCategory::Enum(EnumWidth::Int64)),
        ];
        let ret = MarshaledType::new(quote!(bool), TypeCategory::Primitive(PrimitiveKind::Bool));
        let proxy = normalized(method_proxy("Player.jump", &params, Some(&ret), |locals| {
            quote!(self.jump(#(#locals),*))
        }));
        let first = proxy.find("args.value(0usize)").unwrap();
        let second = proxy.find("args.enum64(1usize)").unwrap();
        let call = proxy.find("self.jump(arg0,arg1)").unwrap();
        assert!(first < second && second < call);
        assert!(proxy.contains("break'callNone"));
        assert!(proxy.contains("Some(::gdbind_runtime::ToVariant::to_variant(&result))"));
    }

    #[test]
    fn test_void_proxy_yields_none() {
        let proxy = normalized(method_proxy("Player.reset", &[], None, |_| quote!(self.reset())));
        assert!(proxy.contains("self.reset();None"));
        assert!(!proxy.contains("result"));
    }

    #[test]
    fn test_prop_info_flags() {
        let ty = MarshaledType::new(
            quote!(Option<Variant>),
            TypeCategory::OpaqueVariant { nullable: true },
        );
        let info = normalized(prop_info("payload", &ty, &PropertySpec::default()));
        let bits = (PropertyUsage::DEFAULT | PropertyUsage::NIL_IS_VARIANT).bits();
        assert!(info.contains(&format!("from_bits_retain({}u32)", bits)));
        assert!(info.contains("VariantType::Nil"));

        let spec = PropertySpec {
            hint: Some(PropertyHint::Range),
            hint_string: Some("0,100".to_string()),
            usage: PropertyUsage::DEFAULT,
        };
        let ty = MarshaledType::new(quote!(i64), TypeCategory::Primitive(PrimitiveKind::I64));
        let info = normalized(prop_info("health", &ty, &spec));
        assert!(info.contains("PropertyHint::Range"));
        assert!(info.contains("\"0,100\""));
        assert!(info.contains("class_name:None"));
    }

    #[test]
    fn test_prop_info_object_array_names_element_class() {
        let ty = MarshaledType::new(
            quote!(TypedArray<Gd<Enemy>>),
            TypeCategory::HomogeneousCollection(Box::new(TypeCategory::ObjectReference {
                class: "Enemy".to_string(),
                nullable: false,
                ref_counting: RefCounting::Dynamic,
            })),
        );
        let info = normalized(prop_info("enemies", &ty, &PropertySpec::default()));
        assert!(info.contains("VariantType::Array"));
        assert!(info.contains("PropertyHint::ArrayType"));
        assert!(info.contains("Some(::std::string::String::from(\"Enemy\"))"));
    }
}
