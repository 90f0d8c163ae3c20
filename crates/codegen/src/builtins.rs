//! Builtin value type methods
//!
//! The runtime already defines the value types themselves; what is generated is
//! an extension trait per builtin exposing its engine constants, constructors,
//! operators and methods. Methods forward through `backend::call_builtin` on the
//! receiver converted to a `Variant`. Constants and field-wise constructors of
//! the plain vector types are built in place; every other constructor and all
//! operators go through the backend.

use std::collections::HashSet;

use gdbind_core::GenerateResult;
use gdbind_schema::{
    BuiltinConstantDescriptor, BuiltinDescriptor, ConstructorDescriptor, DeclaredType, MethodScope,
    OperatorDescriptor, VariantType,
};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use tracing::debug;

use crate::classes::{encoded_args, is_bindable, map_params, map_return, MappedParam};
use crate::enums::emit_enum;
use crate::mapping::TypeMapper;
use crate::marshal;
use crate::naming;

/// Whether `builtin` gets a generated method trait
pub fn has_methods_trait(builtin: &BuiltinDescriptor) -> bool {
    !matches!(builtin.variant_type, VariantType::Nil | VariantType::Object)
}

/// Scalar type every field of a plain vector builtin has, with the field names
/// in declaration order
fn literal_fields(ty: VariantType) -> Option<(&'static [&'static str], Scalar)> {
    const XY: &[&str] = &["x", "y"];
    const XYZ: &[&str] = &["x", "y", "z"];
    const XYZW: &[&str] = &["x", "y", "z", "w"];
    let fields = match ty {
        VariantType::Vector2 => (XY, Scalar::F32),
        VariantType::Vector2i => (XY, Scalar::I32),
        VariantType::Vector3 => (XYZ, Scalar::F32),
        VariantType::Vector3i => (XYZ, Scalar::I32),
        VariantType::Vector4 | VariantType::Quaternion => (XYZW, Scalar::F32),
        VariantType::Vector4i => (XYZW, Scalar::I32),
        _ => return None,
    };
    Some(fields)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    F32,
    I32,
}

impl Scalar {
    fn ty(self) -> TokenStream {
        match self {
            Scalar::F32 => quote!(f32),
            Scalar::I32 => quote!(i32),
        }
    }

    /// Literal for one argument of a constant's constructor syntax
    fn literal(self, text: &str) -> Option<TokenStream> {
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let sign = negative.then(|| quote!(-));
        match self {
            Scalar::F32 => {
                if digits == "inf" {
                    return Some(if negative {
                        quote!(f32::NEG_INFINITY)
                    } else {
                        quote!(f32::INFINITY)
                    });
                }
                if digits == "nan" {
                    return Some(quote!(f32::NAN));
                }
                let value = digits.parse::<f32>().ok().filter(|v| v.is_finite())?;
                let lit = Literal::f32_unsuffixed(value);
                Some(quote!(#sign #lit))
            }
            Scalar::I32 => {
                let lit = Literal::i32_unsuffixed(digits.parse::<i32>().ok()?);
                Some(quote!(#sign #lit))
            }
        }
    }
}

/// Whether `ty` is the engine `int` or `float`
fn is_numeric(ty: &DeclaredType) -> bool {
    matches!(ty, DeclaredType::Named { name, args } if args.is_empty() && naming::is_scalar(name) && name != "bool")
}

/// Emission state of one builtin trait
struct BuiltinEmitter<'a> {
    mapper: &'a TypeMapper<'a>,
    builtin: &'a BuiltinDescriptor,
    /// Trait item names already taken
    used: HashSet<String>,
    declarations: Vec<TokenStream>,
    definitions: Vec<TokenStream>,
}

impl<'a> BuiltinEmitter<'a> {
    fn new(mapper: &'a TypeMapper<'a>, builtin: &'a BuiltinDescriptor) -> Self {
        Self {
            mapper,
            builtin,
            used: HashSet::new(),
            declarations: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// `base`, or `base_<n>` when `base` is already taken
    fn claim(&mut self, base: String, n: u32) -> String {
        let name = if self.used.contains(&base) {
            format!("{}_{}", base, n)
        } else {
            base
        };
        self.used.insert(name.clone());
        name
    }

    fn emit_constant(&mut self, constant: &BuiltinConstantDescriptor) {
        let builtin = self.builtin;
        let Some((fields, scalar)) = literal_fields(builtin.variant_type) else {
            debug!("Skipping constant `{}.{}`: no literal form", builtin.name, constant.name);
            return;
        };
        let same_type = constant.declared_type.name() == Some(builtin.host_name());
        let values = constant
            .constructor_call()
            .filter(|(ty, args)| same_type && *ty == builtin.name && args.len() == fields.len())
            .and_then(|(_, args)| {
                args.iter()
                    .map(|arg| scalar.literal(arg))
                    .collect::<Option<Vec<_>>>()
            });
        let Some(values) = values else {
            debug!(
                "Skipping constant `{}.{}`: unsupported value `{}`",
                builtin.name, constant.name, constant.value
            );
            return;
        };

        let name = self.claim(constant.name.clone(), 0);
        let ident = naming::ident(&name);
        let fields = fields.iter().map(|f| format_ident!("{}", f));
        self.declarations.push(quote!(const #ident: Self;));
        self.definitions.push(quote! {
            const #ident: Self = Self { #(#fields: #values),* };
        });
    }

    /// `from_<args>`, naming a lone `from` argument after its type
    fn constructor_name(ctor: &ConstructorDescriptor) -> String {
        let parts: Vec<String> = ctor
            .params
            .iter()
            .map(|p| match (&p.declared_type, p.name.as_str()) {
                (DeclaredType::Named { name, .. }, "from") => name.to_lowercase(),
                (_, name) => name.to_string(),
            })
            .collect();
        format!("from_{}", parts.join("_"))
    }

    fn emit_constructor(&mut self, ctor: &ConstructorDescriptor) -> GenerateResult<()> {
        let builtin = self.builtin;
        if ctor.params.is_empty() {
            // Default covers the no-argument constructor
            return Ok(());
        }
        if let [only] = ctor.params.as_slice() {
            if only.declared_type.name() == Some(builtin.host_name()) {
                return Ok(());
            }
        }

        let name = self.claim(Self::constructor_name(ctor), ctor.index);
        let context = format!("{}.{}", builtin.name, name);
        let params = map_params(self.mapper, &builtin.name, &name, &ctor.params)?;
        let fn_name = naming::ident(&name);
        let inputs = typed_inputs(&params);

        let field_wise = literal_fields(builtin.variant_type).filter(|(fields, _)| {
            fields.len() == ctor.params.len()
                && fields
                    .iter()
                    .zip(&ctor.params)
                    .all(|(field, p)| p.name == *field && is_numeric(&p.declared_type))
        });
        let body = match field_wise {
            Some((fields, scalar)) => {
                let scalar = scalar.ty();
                let fields = fields.iter().map(|f| format_ident!("{}", f));
                let values = params.iter().map(|p| &p.ident);
                quote!(Self { #(#fields: #values as #scalar),* })
            }
            None => {
                let args = encoded_args(&params);
                let variant_type = format_ident!("{}", format!("{:?}", builtin.variant_type));
                let index = ctor.index;
                quote! {
                    #args
                    let ret = ::gdbind_runtime::backend::construct_builtin(
                        ::gdbind_runtime::VariantType::#variant_type,
                        #index,
                        &args,
                    );
                    ::gdbind_runtime::decode_return::<Self>(ret, #context)
                }
            }
        };

        self.declarations.push(quote!(fn #fn_name(#(#inputs),*) -> Self;));
        self.definitions.push(quote! {
            fn #fn_name(#(#inputs),*) -> Self {
                #body
            }
        });
        Ok(())
    }

    fn emit_operator(&mut self, op: &OperatorDescriptor, n: u32) {
        let builtin = self.builtin;
        if op.right.as_ref().and_then(DeclaredType::name) == Some("Variant") {
            return;
        }
        let right = match op.right.as_ref().map(|ty| self.mapper.map(ty)).transpose() {
            Ok(right) => right,
            Err(err) => {
                debug!("Skipping operator `{}` of `{}`: {}", op.operator, builtin.name, err);
                return;
            }
        };
        let returns = match self.mapper.map(&op.returns) {
            Ok(returns) => returns,
            Err(err) => {
                debug!("Skipping operator `{}` of `{}`: {}", op.operator, builtin.name, err);
                return;
            }
        };

        let base = match &op.right {
            Some(ty) => format!("op_{}_{}", op.operator.method_suffix(), ty.to_string().to_lowercase()),
            None => format!("op_{}", op.operator.method_suffix()),
        };
        let name = self.claim(base, n);
        let fn_name = naming::ident(&name);
        let context = match &op.right {
            Some(ty) => format!("{} {} {}", builtin.name, op.operator, ty),
            None => format!("{} {}", op.operator, builtin.name),
        };
        let operator = format_ident!("{}", format!("{:?}", op.operator));
        let ret_ty = &returns.ty;
        let decode = marshal::decode_return(&returns, &context);

        let (inputs, rhs) = match &right {
            Some(right) => {
                let ty = &right.ty;
                (quote!(&self, rhs: #ty), marshal::encode_argument(quote!(rhs)))
            }
            None => (quote!(&self), quote!(::gdbind_runtime::Variant::Nil)),
        };
        self.declarations.push(quote!(fn #fn_name(#inputs) -> #ret_ty;));
        self.definitions.push(quote! {
            fn #fn_name(#inputs) -> #ret_ty {
                let ret = ::gdbind_runtime::backend::evaluate_operator(
                    ::gdbind_runtime::VariantOperator::#operator,
                    &::gdbind_runtime::ToVariant::to_variant(self),
                    &#rhs,
                );
                #decode
            }
        });
    }

    fn emit_methods(&mut self) -> GenerateResult<()> {
        let builtin = self.builtin;
        let name = &builtin.name;
        for method in &builtin.methods {
            if method.scope == MethodScope::Static {
                debug!("Skipping static builtin method `{}.{}`", name, method.name);
                continue;
            }
            if !is_bindable(name, method) {
                continue;
            }
            let params = map_params(self.mapper, name, &method.name, &method.params)?;
            let returns = map_return(self.mapper, name, &method.name, method.returns.as_ref())?;

            let fn_name = naming::ident(&method.name);
            let inputs = typed_inputs(&params);
            let output = returns.as_ref().map(|r| {
                let ty = &r.ty;
                quote!(-> #ty)
            });
            self.declarations.push(quote! {
                fn #fn_name(&self, #(#inputs),*) #output;
            });

            let args = encoded_args(&params);
            let method_name = &method.name;
            let call = quote! {
                ::gdbind_runtime::backend::call_builtin(
                    &::gdbind_runtime::ToVariant::to_variant(self),
                    #method_name,
                    &args,
                )
            };
            let body = match &returns {
                None => quote! {
                    #args
                    #call;
                },
                Some(ret) => {
                    let decode = marshal::decode_return(ret, &format!("{}.{}", name, method.name));
                    quote! {
                        #args
                        let ret = #call;
                        #decode
                    }
                }
            };
            self.definitions.push(quote! {
                fn #fn_name(&self, #(#inputs),*) #output {
                    #body
                }
            });
        }
        Ok(())
    }
}

fn typed_inputs(params: &[MappedParam]) -> Vec<TokenStream> {
    params
        .iter()
        .map(|p| {
            let (ident, ty) = (&p.ident, &p.ty.ty);
            quote!(#ident: #ty)
        })
        .collect()
}

/// Module body for one builtin
pub fn emit_builtin(mapper: &TypeMapper<'_>, builtin: &BuiltinDescriptor) -> GenerateResult<TokenStream> {
    if !has_methods_trait(builtin) {
        return Ok(TokenStream::new());
    }

    let host = builtin.host_name();
    let trait_ident = naming::ident(&naming::builtin_trait_name(&builtin.name, host));
    let receiver = naming::host_type(host);

    let mut emitter = BuiltinEmitter::new(mapper, builtin);
    // Engine method names are kept as is; generated names yield to them
    emitter.used.extend(
        builtin
            .methods
            .iter()
            .filter(|m| m.scope != MethodScope::Static)
            .map(|m| m.name.clone()),
    );
    for constant in &builtin.constants {
        emitter.emit_constant(constant);
    }
    if !naming::is_scalar(host) {
        for ctor in &builtin.constructors {
            emitter.emit_constructor(ctor)?;
        }
        for (n, op) in builtin.operators.iter().enumerate() {
            emitter.emit_operator(op, n as u32);
        }
    }
    emitter.emit_methods()?;

    let BuiltinEmitter {
        declarations,
        definitions,
        ..
    } = emitter;
    let doc = format!(" Engine constants, constructors, operators and methods of `{}`", builtin.name);
    Ok(quote! {
        #[doc = #doc]
        pub trait #trait_ident: Sized {
            #(#declarations)*
        }

        impl #trait_ident for #receiver {
            #(#definitions)*
        }
    })
}

/// Enums declared inside builtins, emitted at module scope under flattened
/// names (`Vector2.Axis` -> `Vector2Axis`)
pub fn emit_builtin_enums(builtins: &[BuiltinDescriptor]) -> TokenStream {
    let enums = builtins.iter().flat_map(|b| {
        b.enums.iter().map(move |e| {
            let flat = naming::flat_enum_name(&format!("{}.{}", b.name, e.name));
            emit_enum(&flat, e)
        })
    });
    quote!(#(#enums)*)
}
