//! Per-module initialization entry points

use gdbind_core::InitializationPlan;
use proc_macro2::TokenStream;
use quote::quote;

use crate::classes::level_tokens;
use crate::naming;

/// `initialize_level` and `deinitialize_level` for a module's classes.
///
/// Registration walks each tier parents first; deregistration walks the
/// exact reverse.
pub fn emit_entry(plan: &InitializationPlan) -> TokenStream {
    let register_arms = plan.tiers().iter().map(|tier| {
        let level = level_tokens(tier.level);
        let classes = tier.classes.iter().map(|c| naming::ident(c));
        quote! {
            #level => {
                #(::gdbind_runtime::ClassDb::register_engine_class::<#classes>();)*
            }
        }
    });

    let unregister_arms = plan.tiers().iter().map(|tier| {
        let level = level_tokens(tier.level);
        let classes = tier.classes.iter().rev().map(|c| naming::ident(c));
        quote! {
            #level => {
                #(::gdbind_runtime::ClassDb::unregister_class(
                    <#classes as ::gdbind_runtime::GodotClass>::CLASS_NAME,
                );)*
            }
        }
    });

    quote! {
        /// Register this module's engine classes belonging to `level`
        pub fn initialize_level(level: ::gdbind_runtime::InitializationLevel) {
            match level {
                #(#register_arms)*
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }

        /// Unregister this module's engine classes belonging to `level`, in
        /// reverse registration order
        pub fn deinitialize_level(level: ::gdbind_runtime::InitializationLevel) {
            match level {
                #(#unregister_arms)*
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }
    }
}
