//! The pluggable engine backend
//!
//! Generated engine wrappers route every method call, builtin call, utility
//! function, builtin construction, operator evaluation, singleton lookup and
//! signal emission through the backend installed at startup. With no backend
//! installed a call reports a diagnostic and yields `Nil`.

use std::sync::OnceLock;

use crate::diagnostics::print_err;
use crate::object::ObjectHandle;
use crate::variant::{FromVariant, Variant};
use gdbind_schema::{VariantOperator, VariantType};

/// Failures of a dynamic call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("no engine backend installed")]
    NoBackend,

    #[error("object is no longer alive")]
    DeadObject,

    #[error("`{0}` object has no script instance")]
    NoInstance(String),

    #[error("`{class}` has no method `{method}`")]
    UnknownMethod { class: String, method: String },

    #[error("{0}")]
    Engine(String),
}

/// The engine side of the calling convention
pub trait EngineBackend: Send + Sync {
    /// Call `class::method` on `object`, or statically when `object` is `None`
    fn call_method(
        &self,
        object: Option<ObjectHandle>,
        class: &str,
        method: &str,
        args: &[Variant],
    ) -> Result<Variant, CallError>;

    /// Call a method of a builtin value type on `receiver`
    fn call_builtin(&self, receiver: &Variant, method: &str, args: &[Variant]) -> Result<Variant, CallError>;

    /// Call a global utility function such as `sin` or `print`
    fn call_utility(&self, function: &str, args: &[Variant]) -> Result<Variant, CallError>;

    /// Build a value of `ty` with the engine constructor at `constructor`
    fn construct_builtin(&self, ty: VariantType, constructor: u32, args: &[Variant]) -> Result<Variant, CallError>;

    /// Evaluate `left <op> right`; unary operators get `Nil` on the right
    fn evaluate_operator(
        &self,
        op: VariantOperator,
        left: &Variant,
        right: &Variant,
    ) -> Result<Variant, CallError>;

    /// Look up an engine singleton by class name
    fn singleton(&self, class: &str) -> Option<ObjectHandle>;

    fn emit_signal(&self, object: ObjectHandle, signal: &str, args: &[Variant]) -> Result<(), CallError>;
}

static BACKEND: OnceLock<Box<dyn EngineBackend>> = OnceLock::new();

/// Install the process-wide backend. Returns `false` if one is already installed.
pub fn install_backend(backend: Box<dyn EngineBackend>) -> bool {
    let installed = BACKEND.set(backend).is_ok();
    if installed {
        tracing::info!("Engine backend installed");
    } else {
        tracing::warn!("Engine backend already installed");
    }
    installed
}

pub fn has_backend() -> bool {
    BACKEND.get().is_some()
}

fn backend() -> Result<&'static dyn EngineBackend, CallError> {
    BACKEND.get().map(|b| b.as_ref()).ok_or(CallError::NoBackend)
}

fn report<T: Default>(context: &str, result: Result<T, CallError>) -> T {
    result.unwrap_or_else(|err| {
        print_err(format!("Error calling `{}`: {}", context, err));
        T::default()
    })
}

/// Call an engine method; failures are reported and yield `Nil`
pub fn call_method(object: Option<ObjectHandle>, class: &str, method: &str, args: &[Variant]) -> Variant {
    let result = backend().and_then(|b| b.call_method(object, class, method, args));
    report(&format!("{}.{}", class, method), result)
}

/// Call a builtin value method; failures are reported and yield `Nil`
pub fn call_builtin(receiver: &Variant, method: &str, args: &[Variant]) -> Variant {
    let result = backend().and_then(|b| b.call_builtin(receiver, method, args));
    report(&format!("{}.{}", receiver.variant_type(), method), result)
}

/// Call a utility function; failures are reported and yield `Nil`
pub fn call_utility(function: &str, args: &[Variant]) -> Variant {
    let result = backend().and_then(|b| b.call_utility(function, args));
    report(function, result)
}

/// Run a builtin constructor; failures are reported and yield `Nil`
pub fn construct_builtin(ty: VariantType, constructor: u32, args: &[Variant]) -> Variant {
    let result = backend().and_then(|b| b.construct_builtin(ty, constructor, args));
    report(&format!("{} constructor {}", ty, constructor), result)
}

/// Evaluate an operator; failures are reported and yield `Nil`
pub fn evaluate_operator(op: VariantOperator, left: &Variant, right: &Variant) -> Variant {
    let result = backend().and_then(|b| b.evaluate_operator(op, left, right));
    report(&format!("{} {} {}", left.variant_type(), op, right.variant_type()), result)
}

pub fn singleton(class: &str) -> Option<ObjectHandle> {
    match backend() {
        Ok(b) => b.singleton(class),
        Err(err) => {
            print_err(format!("Error fetching singleton `{}`: {}", class, err));
            None
        }
    }
}

pub fn emit_signal(object: ObjectHandle, signal: &str, args: &[Variant]) {
    let result = backend().and_then(|b| b.emit_signal(object, signal, args));
    report(signal, result)
}

/// Decode an engine return value; a mismatch is reported and yields the default
pub fn decode_return<T: FromVariant + Default>(value: Variant, context: &str) -> T {
    T::from_variant(&value).unwrap_or_else(|err| {
        print_err(format!("Error calling `{}`: return value: {}", context, err));
        T::default()
    })
}
