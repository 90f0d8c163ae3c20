//! Engine class wrappers
//!
//! Each engine class becomes a `Copy` handle struct that derefs to its parent,
//! with inherent methods forwarding to the engine, property accessors, signal
//! accessors and constants. Overridable methods are collected into a
//! `<Class>Virtual` trait plus a dispatcher that decodes engine arguments and
//! calls the override.

use std::collections::HashSet;

use gdbind_core::{GenerateError, GenerateResult};
use gdbind_schema::{
    ClassDescriptor, DeclaredType, InitializationLevel, MethodDescriptor, MethodScope, ParamDescriptor,
    PropertyDescriptor,
};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::{debug, warn};

use crate::enums::emit_enum;
use crate::mapping::TypeMapper;
use crate::marshal::{self, MarshaledType};
use crate::naming;

/// A parameter after type mapping
pub(crate) struct MappedParam {
    pub ident: Ident,
    pub ty: MarshaledType,
}

pub(crate) fn map_params(
    mapper: &TypeMapper<'_>,
    owner: &str,
    member: &str,
    params: &[ParamDescriptor],
) -> GenerateResult<Vec<MappedParam>> {
    params
        .iter()
        .map(|p| {
            let ty = mapper
                .map(&p.declared_type)
                .map_err(|e| GenerateError::classify(owner, member, e))?;
            Ok(MappedParam {
                ident: naming::ident(&p.name),
                ty,
            })
        })
        .collect()
}

pub(crate) fn map_return(
    mapper: &TypeMapper<'_>,
    owner: &str,
    member: &str,
    returns: Option<&DeclaredType>,
) -> GenerateResult<Option<MarshaledType>> {
    returns
        .map(|ty| mapper.map(ty).map_err(|e| GenerateError::classify(owner, member, e)))
        .transpose()
}

/// Whether a method can be expressed as a typed wrapper
pub(crate) fn is_bindable(owner: &str, method: &MethodDescriptor) -> bool {
    if method.is_vararg {
        warn!("Skipping vararg method `{}.{}`", owner, method.name);
        return false;
    }
    if method.uses_pointers() {
        warn!("Skipping `{}.{}`: raw pointer signature", owner, method.name);
        return false;
    }
    true
}

/// `let args: [Variant; N] = [...];` over the mapped parameters
pub(crate) fn encoded_args(params: &[MappedParam]) -> TokenStream {
    let count = params.len();
    let encoded = params.iter().map(|p| {
        let ident = &p.ident;
        marshal::encode_argument(quote!(#ident))
    });
    quote! {
        let args: [::gdbind_runtime::Variant; #count] = [#(#encoded),*];
    }
}

fn has_bindable_virtuals(class: &ClassDescriptor) -> bool {
    class
        .methods
        .iter()
        .any(|m| m.scope == MethodScope::Virtual && !m.is_vararg && !m.uses_pointers())
}

/// Emits the module body for one engine class
pub struct ClassEmitter<'a> {
    mapper: &'a TypeMapper<'a>,
    class: &'a ClassDescriptor,
    level: InitializationLevel,
    module: &'a str,
    /// Inherent function names already taken
    used: HashSet<String>,
}

impl<'a> ClassEmitter<'a> {
    pub fn new(
        mapper: &'a TypeMapper<'a>,
        class: &'a ClassDescriptor,
        level: InitializationLevel,
        module: &'a str,
    ) -> Self {
        Self {
            mapper,
            class,
            level,
            module,
            used: HashSet::new(),
        }
    }

    fn name(&self) -> &str {
        &self.class.name
    }

    fn claim(&mut self, name: &str) -> bool {
        if self.used.insert(name.to_string()) {
            true
        } else {
            debug!("`{}.{}` is already defined, skipping", self.name(), name);
            false
        }
    }

    /// Items of the class's module
    pub fn emit(mut self) -> GenerateResult<TokenStream> {
        let class = self.class;
        let definition = self.emit_definition()?;

        let mut inherent = Vec::new();
        for constant in &class.constants {
            let name = naming::ident(&constant.name);
            let value = constant.value;
            inherent.push(quote!(pub const #name: i64 = #value;));
        }
        inherent.extend(self.emit_constructors());
        for method in &class.methods {
            if method.scope == MethodScope::Virtual {
                continue;
            }
            if let Some(tokens) = self.emit_method(method)? {
                inherent.push(tokens);
            }
        }
        for property in &class.properties {
            inherent.extend(self.emit_property(property)?);
        }
        for signal in &class.signals {
            inherent.extend(self.emit_signal(&signal.name, &signal.params)?);
        }

        let class_ident = naming::ident(&class.name);
        let enums = class.enums.iter().map(|e| emit_enum(&e.name, e));
        let virtuals = self.emit_virtuals()?;

        Ok(quote! {
            #definition

            impl #class_ident {
                #(#inherent)*
            }

            #(#enums)*

            #virtuals
        })
    }

    fn emit_definition(&self) -> GenerateResult<TokenStream> {
        let name = self.name();
        let class_ident = naming::ident(name);
        let doc = match &self.class.parent {
            Some(parent) => format!(" Engine class `{}`, inheriting `{}`.", name, parent),
            None => format!(" Engine class `{}`.", name),
        };
        let ref_counted = self.class.is_ref_counted;
        let level = level_tokens(self.level);

        let (fields, parent_const, handle_impl, from_handle, deref) = match &self.class.parent {
            None => (
                quote!(handle: ::gdbind_runtime::ObjectHandle),
                quote!(None),
                quote!(self.handle),
                quote!(Self { handle }),
                None,
            ),
            Some(parent) => {
                if !self.mapper.is_available(parent) {
                    return Err(GenerateError::ParentUnavailable {
                        class: name.to_string(),
                        parent: parent.clone(),
                        module: self.module.to_string(),
                    });
                }
                let parent_ident = naming::ident(parent);
                (
                    quote!(base: #parent_ident),
                    quote!(Some(#parent)),
                    quote!(::gdbind_runtime::ObjectRef::handle(&self.base)),
                    quote! {
                        Self {
                            base: <#parent_ident as ::gdbind_runtime::ObjectRef>::from_handle_unchecked(handle),
                        }
                    },
                    Some(quote! {
                        impl ::core::ops::Deref for #class_ident {
                            type Target = #parent_ident;

                            fn deref(&self) -> &#parent_ident {
                                &self.base
                            }
                        }
                    }),
                )
            }
        };

        Ok(quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct #class_ident {
                #fields
            }

            #deref

            impl ::gdbind_runtime::GodotClass for #class_ident {
                const CLASS_NAME: &'static str = #name;
                const PARENT_CLASS: Option<&'static str> = #parent_const;
                const REF_COUNTED: bool = #ref_counted;
                const INIT_LEVEL: ::gdbind_runtime::InitializationLevel = #level;
            }

            impl ::gdbind_runtime::ObjectRef for #class_ident {
                const CLASS: &'static str = #name;

                fn from_handle_unchecked(handle: ::gdbind_runtime::ObjectHandle) -> Self {
                    #from_handle
                }

                fn handle(&self) -> ::gdbind_runtime::ObjectHandle {
                    #handle_impl
                }
            }
        })
    }

    fn emit_constructors(&mut self) -> Vec<TokenStream> {
        let mut out = Vec::new();
        if self.class.is_instantiable && self.claim("new") {
            out.push(quote! {
                /// Create a new engine object of this class
                pub fn new() -> Self {
                    let handle = ::gdbind_runtime::object::create(
                        <Self as ::gdbind_runtime::GodotClass>::CLASS_NAME,
                        <Self as ::gdbind_runtime::GodotClass>::REF_COUNTED,
                    );
                    <Self as ::gdbind_runtime::ObjectRef>::from_handle_unchecked(handle)
                }
            });
        }
        if self.mapper.schema().singleton(self.name()).is_some() && self.claim("singleton") {
            let name = self.name();
            out.push(quote! {
                /// The engine's single instance, if the engine provides one
                pub fn singleton() -> Option<Self> {
                    ::gdbind_runtime::backend::singleton(#name)
                        .map(<Self as ::gdbind_runtime::ObjectRef>::from_handle_unchecked)
                }
            });
        }
        out
    }

    fn emit_method(&mut self, method: &MethodDescriptor) -> GenerateResult<Option<TokenStream>> {
        if !is_bindable(self.name(), method) || !self.claim(&method.name) {
            return Ok(None);
        }
        let params = map_params(self.mapper, self.name(), &method.name, &method.params)?;
        let returns = map_return(self.mapper, self.name(), &method.name, method.returns.as_ref())?;

        let is_static = method.scope == MethodScope::Static;
        let mut inputs = Vec::new();
        if !is_static {
            inputs.push(quote!(&self));
        }
        inputs.extend(params.iter().map(|p| {
            let (ident, ty) = (&p.ident, &p.ty.ty);
            quote!(#ident: #ty)
        }));
        let object = if is_static {
            quote!(None)
        } else {
            quote!(Some(::gdbind_runtime::ObjectRef::handle(self)))
        };

        let fn_name = naming::ident(&method.name);
        let args = encoded_args(&params);
        let call = self.call(object, &method.name);
        let context = format!("{}.{}", self.name(), method.name);

        Ok(Some(signature_with_body(&fn_name, &inputs, returns.as_ref(), &args, &call, &context)))
    }

    fn call(&self, object: TokenStream, method: &str) -> TokenStream {
        let class = self.name();
        quote!(::gdbind_runtime::backend::call_method(#object, #class, #method, &args))
    }

    /// Find `name` on this class or the nearest ancestor declaring it
    fn lookup_method(&self, name: &str) -> Option<&'a MethodDescriptor> {
        let schema = self.mapper.schema();
        std::iter::once(self.class.name.as_str())
            .chain(schema.ancestors(&self.class.name))
            .filter_map(|class| schema.class(class))
            .find_map(|class| class.method(name))
    }

    fn emit_property(&mut self, property: &PropertyDescriptor) -> GenerateResult<Vec<TokenStream>> {
        let class = self.name().to_string();
        let index_args = usize::from(property.index.is_some());

        if property.getter.is_empty() || property.getter.starts_with('_') {
            warn!("Skipping property `{}.{}`: no public getter", class, property.name);
            return Ok(Vec::new());
        }
        let Some(getter) = self.lookup_method(&property.getter) else {
            warn!(
                "Skipping property `{}.{}`: getter `{}` not found",
                class, property.name, property.getter
            );
            return Ok(Vec::new());
        };
        if getter.params.len() > index_args {
            warn!(
                "Skipping property `{}.{}`: getter `{}` takes {} arguments",
                class,
                property.name,
                property.getter,
                getter.params.len()
            );
            return Ok(Vec::new());
        }
        let Some(declared) = getter.returns.as_ref() else {
            warn!("Skipping property `{}.{}`: getter returns nothing", class, property.name);
            return Ok(Vec::new());
        };
        if getter.uses_pointers() {
            return Ok(Vec::new());
        }
        let ty = self
            .mapper
            .map(declared)
            .map_err(|e| GenerateError::classify(&class, &property.name, e))?;
        let rust_ty = &ty.ty;

        let index = property.index.map(|i| quote!(::gdbind_runtime::Variant::Int(#i)));
        let object = quote!(Some(::gdbind_runtime::ObjectRef::handle(self)));
        let mut out = Vec::new();

        if self.claim(&property.name) {
            let fn_name = naming::ident(&property.name);
            let count = index_args;
            let call = self.call(object.clone(), &property.getter);
            let decode = marshal::decode_return(&ty, &format!("{}.{}", class, property.name));
            out.push(quote! {
                pub fn #fn_name(&self) -> #rust_ty {
                    let args: [::gdbind_runtime::Variant; #count] = [#index];
                    let ret = #call;
                    #decode
                }
            });
        }

        let setter_name = format!("set_{}", property.name);
        if let Some(setter) = &property.setter {
            if !setter.starts_with('_') && self.claim(&setter_name) {
                let fn_name = naming::ident(&setter_name);
                let count = index_args + 1;
                let value = marshal::encode_argument(quote!(value));
                let index = index.iter();
                let call = self.call(object, setter);
                out.push(quote! {
                    pub fn #fn_name(&self, value: #rust_ty) {
                        let args: [::gdbind_runtime::Variant; #count] = [#(#index,)* #value];
                        #call;
                    }
                });
            }
        }
        Ok(out)
    }

    fn emit_signal(&mut self, signal: &str, params: &[ParamDescriptor]) -> GenerateResult<Vec<TokenStream>> {
        let class = self.name().to_string();
        let mut out = Vec::new();

        let accessor = format!("signal_{}", signal);
        if self.claim(&accessor) {
            let fn_name = naming::ident(&accessor);
            let doc = format!(" The `{}` signal of this object", signal);
            out.push(quote! {
                #[doc = #doc]
                pub fn #fn_name(&self) -> ::gdbind_runtime::Signal {
                    ::gdbind_runtime::Signal {
                        object: Some(::gdbind_runtime::ObjectRef::handle(self)),
                        name: ::gdbind_runtime::StringName::from(#signal),
                    }
                }
            });
        }

        let emitter = format!("emit_{}", signal);
        if self.claim(&emitter) {
            let params = map_params(self.mapper, &class, signal, params)?;
            let fn_name = naming::ident(&emitter);
            let inputs = params.iter().map(|p| {
                let (ident, ty) = (&p.ident, &p.ty.ty);
                quote!(#ident: #ty)
            });
            let args = encoded_args(&params);
            out.push(quote! {
                pub fn #fn_name(&self, #(#inputs),*) {
                    #args
                    ::gdbind_runtime::backend::emit_signal(
                        ::gdbind_runtime::ObjectRef::handle(self),
                        #signal,
                        &args,
                    );
                }
            });
        }
        Ok(out)
    }

    /// Nearest available ancestor that has its own virtual trait
    fn virtual_parent(&self) -> Option<&'a str> {
        let schema = self.mapper.schema();
        schema
            .ancestors(&self.class.name)
            .into_iter()
            .filter(|a| self.mapper.is_available(a))
            .find(|a| schema.class(a).is_some_and(has_bindable_virtuals))
    }

    fn emit_virtuals(&self) -> GenerateResult<TokenStream> {
        let virtuals: Vec<&MethodDescriptor> = self
            .class
            .methods
            .iter()
            .filter(|m| m.scope == MethodScope::Virtual && is_bindable(self.name(), m))
            .collect();
        if virtuals.is_empty() {
            return Ok(TokenStream::new());
        }

        let class = self.name();
        let trait_ident = naming::ident(&naming::virtual_trait_name(class));
        let dispatcher = naming::ident(&naming::virtual_dispatcher_name(class));

        let (supertrait, fallback) = match self.virtual_parent() {
            Some(parent) => {
                let module = naming::ident(&naming::module_name(parent));
                let parent_trait = naming::ident(&naming::virtual_trait_name(parent));
                let parent_dispatcher = naming::ident(&naming::virtual_dispatcher_name(parent));
                (
                    quote!(: #module::#parent_trait),
                    quote!(#module::#parent_dispatcher(instance, method, args)),
                )
            }
            None => (quote!(), quote!(::gdbind_runtime::CallOutcome::NotFound)),
        };

        let mut methods = Vec::new();
        let mut arms = Vec::new();
        for method in virtuals {
            let params = map_params(self.mapper, class, &method.name, &method.params)?;
            let returns = map_return(self.mapper, class, &method.name, method.returns.as_ref())?;
            let fn_name = naming::ident(naming::virtual_method_name(&method.name));

            let receiver = if method.is_const { quote!(&self) } else { quote!(&mut self) };
            let inputs = params.iter().map(|p| {
                let ident = format_ident!("_{}", p.ident.to_string().trim_start_matches("r#"));
                let ty = &p.ty.ty;
                quote!(#ident: #ty)
            });
            let output = returns.as_ref().map(|r| {
                let ty = &r.ty;
                quote!(-> #ty)
            });
            let body = returns.as_ref().map(|_| quote!(::core::default::Default::default()));
            methods.push(quote! {
                fn #fn_name(#receiver, #(#inputs),*) #output {
                    #body
                }
            });

            let types: Vec<MarshaledType> = params.iter().map(|p| p.ty.clone()).collect();
            let context = format!("{}.{}", class, method.name);
            let proxy = marshal::method_proxy(&context, &types, returns.as_ref(), |locals| {
                quote!(#trait_ident::#fn_name(instance, #(#locals),*))
            });
            let engine_name = &method.name;
            arms.push(quote! {
                #engine_name => ::gdbind_runtime::CallOutcome::Returned(#proxy),
            });
        }

        let trait_doc = format!(" Overridable methods of `{}`", class);
        Ok(quote! {
            #[doc = #trait_doc]
            pub trait #trait_ident #supertrait {
                #(#methods)*
            }

            /// Route an engine virtual call to the matching override
            pub fn #dispatcher<T: #trait_ident>(
                instance: &mut T,
                method: &str,
                args: &::gdbind_runtime::Arguments<'_>,
            ) -> ::gdbind_runtime::CallOutcome {
                match method {
                    #(#arms)*
                    _ => #fallback,
                }
            }
        })
    }
}

/// `pub fn name(inputs) -> R { args; call; decode }`
pub(crate) fn signature_with_body(
    fn_name: &Ident,
    inputs: &[TokenStream],
    returns: Option<&MarshaledType>,
    args: &TokenStream,
    call: &TokenStream,
    context: &str,
) -> TokenStream {
    match returns {
        None => quote! {
            pub fn #fn_name(#(#inputs),*) {
                #args
                #call;
            }
        },
        Some(ret) => {
            let ty = &ret.ty;
            let decode = marshal::decode_return(ret, context);
            quote! {
                pub fn #fn_name(#(#inputs),*) -> #ty {
                    #args
                    let ret = #call;
                    #decode
                }
            }
        }
    }
}

pub fn level_tokens(level: InitializationLevel) -> TokenStream {
    let variant = match level {
        InitializationLevel::Core => quote!(Core),
        InitializationLevel::Servers => quote!(Servers),
        InitializationLevel::Scene => quote!(Scene),
        InitializationLevel::Editor => quote!(Editor),
    };
    quote!(::gdbind_runtime::InitializationLevel::#variant)
}

/// Module body for `class`, generated as part of `module`
pub fn emit_class(
    mapper: &TypeMapper<'_>,
    class: &ClassDescriptor,
    level: InitializationLevel,
    module: &str,
) -> GenerateResult<TokenStream> {
    ClassEmitter::new(mapper, class, level, module).emit()
}
