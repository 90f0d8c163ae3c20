//! gdbind runtime
//!
//! The support library generated bindings and derived classes call into:
//!
//! - [`Variant`] and the builtin value types, with [`ToVariant`]/[`FromVariant`]
//! - [`VariantArray`] and the element-typed [`TypedArray`]
//! - the object table ([`object`]) with explicit reference counting
//! - the class database ([`ClassDb`]) recording registered members in order
//! - [`Arguments`] decoding and the [`print_err`] diagnostics channel
//! - the tiered [`ExtensionEntry`]
//! - the pluggable [`EngineBackend`]
//!
//! # Example
//!
//! ```ignore
//! use gdbind_runtime::prelude::*;
//!
//! #[derive(GodotClass)]
//! #[class(base = Node)]
//! struct Player {
//!     base: Base<Node>,
//!     #[export(hint = "range", hint_string = "0,100")]
//!     health: i64,
//! }
//!
//! #[godot_api]
//! impl Player {
//!     #[callable]
//!     fn heal(&mut self, amount: i64) -> i64 {
//!         self.health += amount;
//!         self.health
//!     }
//! }
//! ```

extern crate self as gdbind_runtime;

mod args;
mod array;
pub mod backend;
mod builtins;
mod class;
mod classdb;
mod diagnostics;
mod entry;
pub mod object;
mod variant;

#[cfg(test)]
mod derive_tests;

pub use args::{ArgumentError, Arguments};
pub use array::{ArrayElement, ArrayTypeError, ArrayTyping, TypedArray, VariantArray};
pub use backend::{decode_return, install_backend, CallError, EngineBackend};
pub use builtins::*;
pub use class::{CallOutcome, ClassMethods, ExportedClass, GodotClass, GodotEnum};
pub use classdb::{ClassBuilder, ClassDb, MethodInfo, PropInfo, RegisteredMember, SignalInfo};
pub use diagnostics::{print_err, take_diagnostics};
pub use entry::{registration, ClassRegistration, ExtensionEntry};
pub use object::{Base, Gd, ObjectHandle, ObjectRef};
pub use variant::{FromVariant, ToVariant, Variant, VariantConversionError};

pub use gdbind_core::levels::LevelError;
pub use gdbind_schema::{
    InitializationLevel, MethodFlags, PropertyHint, PropertyUsage, VariantOperator, VariantType,
};

pub use gdbind_macros::{godot_api, GodotClass, GodotEnum};

/// Commonly used items
pub mod prelude {
    pub use crate::{
        godot_api, Base, ClassMethods, ExportedClass, FromVariant, Gd, GodotClass, GodotEnum,
        ObjectRef, ToVariant, TypedArray, Variant, VariantArray,
    };
    pub use crate::{GString, NodePath, StringName, Vector2, Vector3};
}
