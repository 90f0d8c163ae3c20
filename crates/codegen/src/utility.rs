//! Global utility functions
//!
//! Each engine utility function (`sin`, `print`, `type_convert`, ...) becomes a
//! free function forwarding through `backend::call_utility`. Vararg functions
//! take their fixed arguments followed by a `rest` slice.

use gdbind_core::GenerateResult;
use gdbind_schema::UtilityFunction;
use proc_macro2::TokenStream;
use quote::quote;
use tracing::warn;

use crate::classes::{map_params, map_return};
use crate::mapping::TypeMapper;
use crate::marshal;
use crate::naming;

/// Owner name used in diagnostics for utility functions
const OWNER: &str = "@GlobalScope";

fn emit_function(mapper: &TypeMapper<'_>, function: &UtilityFunction) -> GenerateResult<Option<TokenStream>> {
    if function.uses_pointers() {
        warn!("Skipping utility function `{}`: raw pointer signature", function.name);
        return Ok(None);
    }
    let params = map_params(mapper, OWNER, &function.name, &function.params)?;
    let returns = map_return(mapper, OWNER, &function.name, function.returns.as_ref())?;

    let fn_name = naming::ident(&function.name);
    let mut inputs: Vec<TokenStream> = params
        .iter()
        .map(|p| {
            let (ident, ty) = (&p.ident, &p.ty.ty);
            quote!(#ident: #ty)
        })
        .collect();
    let encoded: Vec<TokenStream> = params
        .iter()
        .map(|p| {
            let ident = &p.ident;
            marshal::encode_argument(quote!(#ident))
        })
        .collect();

    let args = if function.is_vararg {
        inputs.push(quote!(rest: &[::gdbind_runtime::Variant]));
        quote! {
            let mut args: ::std::vec::Vec<::gdbind_runtime::Variant> = ::std::vec![#(#encoded),*];
            args.extend_from_slice(rest);
        }
    } else {
        let count = encoded.len();
        quote! {
            let args: [::gdbind_runtime::Variant; #count] = [#(#encoded),*];
        }
    };

    let name = &function.name;
    let call = quote!(::gdbind_runtime::backend::call_utility(#name, &args));
    let (output, body) = match &returns {
        None => (None, quote! {
            #args
            #call;
        }),
        Some(ret) => {
            let ty = &ret.ty;
            let decode = marshal::decode_return(ret, name);
            (Some(quote!(-> #ty)), quote! {
                #args
                let ret = #call;
                #decode
            })
        }
    };

    let doc = format!(" `{}` ({})", name, function.category);
    Ok(Some(quote! {
        #[doc = #doc]
        pub fn #fn_name(#(#inputs),*) #output {
            #body
        }
    }))
}

/// Body of the `utility` module
pub fn emit_utility(mapper: &TypeMapper<'_>, functions: &[UtilityFunction]) -> GenerateResult<TokenStream> {
    let mut items = Vec::with_capacity(functions.len());
    for function in functions {
        if let Some(item) = emit_function(mapper, function)? {
            items.push(item);
        }
    }
    Ok(quote! {
        use super::*;

        #(#items)*
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbind_schema::Schema;

    const FIXTURE: &str = include_str!("../../schema/fixtures/mini_extension_api.json");

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().split_whitespace().collect()
    }

    #[test]
    fn test_utility_functions_forward_to_backend() {
        let schema = Schema::load_from_str(FIXTURE).unwrap();
        let available = vec!["Object".to_string()];
        let mapper = TypeMapper::new(&schema, &available, "Object");

        let tokens = emit_utility(&mapper, &schema.utility_functions).unwrap();
        syn::parse2::<syn::File>(tokens.clone()).unwrap();
        let text = compact(&tokens);

        assert!(text.contains("pubfnsin(angle_rad:f64)->f64{"));
        assert!(text.contains("call_utility(\"sin\",&args)"));
        assert!(text.contains("decode_return::<f64>(ret,\"sin\")"));
        assert!(text.contains(
            "pubfntype_convert(variant:::gdbind_runtime::Variant,r#type:i64)->::gdbind_runtime::Variant{"
        ));
    }

    #[test]
    fn test_vararg_and_pointer_functions() {
        let schema = Schema::load_from_str(FIXTURE).unwrap();
        let available = vec!["Object".to_string()];
        let mapper = TypeMapper::new(&schema, &available, "Object");

        let text = compact(&emit_utility(&mapper, &schema.utility_functions).unwrap());
        assert!(text.contains("pubfnprint(arg1:::gdbind_runtime::Variant,rest:&[::gdbind_runtime::Variant]){"));
        assert!(text.contains("args.extend_from_slice(rest);"));
        assert!(!text.contains("bytes_to_var_with_objects"));
    }
}
