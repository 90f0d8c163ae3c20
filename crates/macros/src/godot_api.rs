//! godot_api attribute macro implementation
//!
//! Collects `#[callable]` methods and `#[signal]` declarations from an inherent
//! impl and generates the class's `ClassMethods` implementation: registration
//! metadata in declaration order plus a by-name dispatcher built from the same
//! method proxies the generator uses for engine virtuals.

use gdbind_codegen::marshal::{self, MarshaledType};
use gdbind_codegen::PropertySpec;
use gdbind_schema::MethodFlags;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Pat, ReturnType, Type};

use crate::parse::ApiArgs;
use crate::types::{self, MacroContext};

/// How a method is exposed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exposure {
    Callable,
    Signal,
}

fn take_exposure(method: &mut ImplItemFn) -> syn::Result<Option<Exposure>> {
    let mut exposure = None;
    let mut error: Option<syn::Error> = None;
    method.attrs.retain(|attr| {
        let found = if attr.path().is_ident("callable") {
            Exposure::Callable
        } else if attr.path().is_ident("signal") {
            Exposure::Signal
        } else {
            return true;
        };
        if exposure.is_some() {
            let err = syn::Error::new_spanned(attr, "a method is either `#[callable]` or `#[signal]`, once");
            match &mut error {
                Some(e) => e.combine(err),
                None => error = Some(err),
            }
        }
        exposure = Some(found);
        false
    });
    match error {
        Some(e) => Err(e),
        None => Ok(exposure),
    }
}

/// A method parameter as seen by the engine
struct Param {
    ident: syn::Ident,
    ty: MarshaledType,
}

fn params(method: &ImplItemFn) -> syn::Result<Vec<Param>> {
    let ctx = MacroContext::new();
    let mut out = Vec::new();
    let mut error: Option<syn::Error> = None;
    for input in &method.sig.inputs {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.clone(),
            other => {
                let err = syn::Error::new_spanned(other, "exposed parameters must be plain names");
                match &mut error {
                    Some(e) => e.combine(err),
                    None => error = Some(err),
                }
                continue;
            }
        };
        match types::marshaled(&typed.ty, &ctx) {
            Ok(ty) => out.push(Param { ident, ty }),
            Err(err) => match &mut error {
                Some(e) => e.combine(err),
                None => error = Some(err),
            },
        }
    }
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

fn return_type(method: &ImplItemFn) -> syn::Result<Option<MarshaledType>> {
    match &method.sig.output {
        ReturnType::Default => Ok(None),
        ReturnType::Type(_, ty) if is_unit(ty) => Ok(None),
        ReturnType::Type(_, ty) => types::marshaled(ty, &MacroContext::new()).map(Some),
    }
}

fn prop_infos(params: &[Param]) -> Vec<TokenStream> {
    params
        .iter()
        .map(|p| {
            let name = p.ident.to_string();
            marshal::prop_info(name.trim_start_matches("r#"), &p.ty, &PropertySpec::default())
        })
        .collect()
}

/// Registration statement and dispatch arm for a `#[callable]`
fn callable(class: &str, method: &ImplItemFn) -> syn::Result<(TokenStream, TokenStream)> {
    let fn_ident = &method.sig.ident;
    let name = fn_ident.to_string();

    let mut flags = MethodFlags::NORMAL;
    let receiver = method.sig.receiver();
    match receiver {
        None => flags |= MethodFlags::STATIC,
        Some(recv) if recv.colon_token.is_some() || recv.reference.is_none() => {
            return Err(syn::Error::new_spanned(
                recv,
                "callables take `&self`, `&mut self` or no receiver",
            ));
        }
        Some(recv) if recv.mutability.is_none() => flags |= MethodFlags::CONST,
        Some(_) => {}
    }

    let params = params(method)?;
    let returns = return_type(method)?;

    let arg_infos = prop_infos(&params);
    let return_info = match &returns {
        Some(ty) => {
            let info = marshal::prop_info("", ty, &PropertySpec::default());
            quote!(::core::option::Option::Some(#info))
        }
        None => quote!(::core::option::Option::None),
    };
    let bits = flags.bits();
    let registration = quote! {
        builder.add_method(::gdbind_runtime::MethodInfo {
            name: ::std::string::String::from(#name),
            arguments: ::std::vec![#(#arg_infos),*],
            return_value: #return_info,
            flags: ::gdbind_runtime::MethodFlags::from_bits_retain(#bits),
        });
    };

    let types: Vec<MarshaledType> = params.iter().map(|p| p.ty.clone()).collect();
    let context = format!("{}.{}", class, name);
    let is_static = receiver.is_none();
    let proxy = marshal::method_proxy(&context, &types, returns.as_ref(), |locals| {
        if is_static {
            quote!(Self::#fn_ident(#(#locals),*))
        } else {
            quote!(Self::#fn_ident(self, #(#locals),*))
        }
    });
    let arm = quote! {
        #name => ::gdbind_runtime::CallOutcome::Returned(#proxy),
    };

    Ok((registration, arm))
}

/// Registration statement for a `#[signal]`; its body becomes the emission
fn signal(method: &mut ImplItemFn) -> syn::Result<TokenStream> {
    let shared_ref = method
        .sig
        .receiver()
        .is_some_and(|r| r.colon_token.is_none() && r.reference.is_some() && r.mutability.is_none());
    if !shared_ref {
        return Err(syn::Error::new_spanned(&method.sig, "signals take `&self`"));
    }
    if return_type(method)?.is_some() {
        return Err(syn::Error::new_spanned(&method.sig.output, "signals return nothing"));
    }
    if !method.block.stmts.is_empty() {
        return Err(syn::Error::new_spanned(
            &method.block,
            "signal bodies are generated, leave the body empty",
        ));
    }

    let params = params(method)?;
    let name = method.sig.ident.to_string();
    let values = params.iter().map(|p| {
        let ident = &p.ident;
        marshal::encode_argument(quote!(#ident))
    });
    method.block = syn::parse_quote!({
        ::gdbind_runtime::backend::emit_signal(
            ::gdbind_runtime::ExportedClass::base_handle(self),
            #name,
            &[#(#values),*],
        );
    });

    let arg_infos = prop_infos(&params);
    Ok(quote! {
        builder.add_signal(::gdbind_runtime::SignalInfo {
            name: ::std::string::String::from(#name),
            arguments: ::std::vec![#(#arg_infos),*],
        });
    })
}

/// Generate the ClassMethods implementation for an inherent impl
pub fn generate_godot_api(args: ApiArgs, mut item: ItemImpl) -> TokenStream {
    if let Some((_, path, _)) = &item.trait_ {
        return syn::Error::new_spanned(path, "#[godot_api] goes on an inherent impl")
            .to_compile_error();
    }
    if !item.generics.params.is_empty() {
        return syn::Error::new_spanned(&item.generics, "engine classes cannot be generic")
            .to_compile_error();
    }

    let self_ty = item.self_ty.clone();
    let class = quote!(#self_ty).to_string().replace(' ', "");

    let mut registrations = Vec::new();
    let mut arms = Vec::new();
    let mut error: Option<syn::Error> = None;
    let mut push_error = |err: syn::Error| match &mut error {
        Some(e) => e.combine(err),
        None => error = Some(err),
    };

    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let exposure = match take_exposure(method) {
            Ok(Some(exposure)) => exposure,
            Ok(None) => continue,
            Err(err) => {
                push_error(err);
                continue;
            }
        };
        match exposure {
            Exposure::Callable => match callable(&class, method) {
                Ok((registration, arm)) => {
                    registrations.push(registration);
                    arms.push(arm);
                }
                Err(err) => push_error(err),
            },
            Exposure::Signal => match signal(method) {
                Ok(registration) => registrations.push(registration),
                Err(err) => push_error(err),
            },
        }
    }

    let errors = error.map(|e| e.to_compile_error());
    let fallback = match &args.virtuals {
        Some(dispatcher) => quote!(#dispatcher(self, method, args)),
        None => quote!(::gdbind_runtime::CallOutcome::NotFound),
    };

    quote! {
        #item

        #errors

        impl ::gdbind_runtime::ClassMethods for #self_ty {
            #[allow(unused_variables)]
            fn register_methods(builder: &mut ::gdbind_runtime::ClassBuilder) {
                #(#registrations)*
            }

            #[allow(unused_variables)]
            fn dispatch_method(
                &mut self,
                method: &str,
                args: &::gdbind_runtime::Arguments<'_>,
            ) -> ::gdbind_runtime::CallOutcome {
                match method {
                    #(#arms)*
                    _ => #fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(args: ApiArgs, item: ItemImpl) -> String {
        generate_godot_api(args, item)
            .to_string()
            .split_whitespace()
            .collect()
    }

    #[test]
    fn test_callables_register_and_dispatch() {
        let text = expand(
            ApiArgs::default(),
            parse_quote! {
                impl Player {
                    #[callable]
                    fn heal(&mut self, amount: i64) -> i64 {
                        self.health += amount;
                        self.health
                    }

                    #[callable]
                    fn health(&self) -> i64 {
                        self.health
                    }

                    #[callable]
                    fn spawn_count() -> i64 {
                        3
                    }

                    fn private_helper(&self) {}
                }
            },
        );

        // NORMAL, NORMAL|CONST, NORMAL|STATIC
        assert!(text.contains("from_bits_retain(1u32)"));
        assert!(text.contains("from_bits_retain(5u32)"));
        assert!(text.contains("from_bits_retain(33u32)"));
        assert!(text.contains("\"heal\"=>::gdbind_runtime::CallOutcome::Returned("));
        assert!(text.contains("Self::heal(self,arg0)"));
        assert!(text.contains("Self::spawn_count()"));
        assert!(text.contains("Errorcalling`{}`"));
        assert!(text.contains("\"Player.heal\""));
        assert!(!text.contains("\"private_helper\""));
        assert!(!text.contains("#[callable]"));
        assert!(text.contains("_=>::gdbind_runtime::CallOutcome::NotFound"));
    }

    #[test]
    fn test_signal_body_emits() {
        let text = expand(
            ApiArgs::default(),
            parse_quote! {
                impl Player {
                    #[signal]
                    fn died(&self, killer: Option<Gd<Enemy>>, score: i64) {}
                }
            },
        );
        assert!(text.contains(
            "::gdbind_runtime::backend::emit_signal(::gdbind_runtime::ExportedClass::base_handle(self),\"died\""
        ));
        assert!(text.contains("::gdbind_runtime::ToVariant::to_variant(&killer)"));
        assert!(text.contains("builder.add_signal(::gdbind_runtime::SignalInfo{"));
        assert!(text.contains("name:::std::string::String::from(\"killer\")"));
        assert!(!text.contains("\"died\"=>"));
    }

    #[test]
    fn test_signal_shape_errors() {
        let text = expand(
            ApiArgs::default(),
            parse_quote! {
                impl Player {
                    #[signal]
                    fn died(&mut self) {}

                    #[signal]
                    fn scored(&self) -> i64 { 1 }
                }
            },
        );
        assert!(text.contains("signalstake`&self`"));
        assert!(text.contains("signalsreturnnothing"));
    }

    #[test]
    fn test_rejected_parameter_types() {
        let text = expand(
            ApiArgs::default(),
            parse_quote! {
                impl Player {
                    #[callable]
                    fn load(&mut self, items: Vec<i64>, level: Option<u8>) {}
                }
            },
        );
        assert_eq!(text.matches("compile_error").count(), 2);
        assert!(text.contains("impl::gdbind_runtime::ClassMethodsforPlayer"));
    }

    #[test]
    fn test_virtual_fallback_and_trait_impl() {
        let args: ApiArgs = syn::parse_str("virtuals = node::dispatch_node_virtual").unwrap();
        let text = expand(args, parse_quote!(impl Player {}));
        assert!(text.contains("_=>node::dispatch_node_virtual(self,method,args)"));

        let text = expand(ApiArgs::default(), parse_quote!(impl node::NodeVirtual for Player {}));
        assert!(text.contains("inherentimpl"));
    }
}
