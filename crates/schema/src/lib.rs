//! gdbind schema model
//!
//! In-memory representation of the engine's reflection surface as described by
//! `extension_api.json`: classes, builtin value types, enums and their member
//! signatures, plus the engine's global utility functions. Everything here is
//! plain data, built once and never mutated.
//!
//! The crate also owns the small vocabulary shared by every other gdbind crate:
//! [`DeclaredType`] (the syntactic shape of a declared type), [`VariantType`],
//! [`InitializationLevel`] and the property/method flag sets.
//!
//! # Example
//!
//! ```ignore
//! use gdbind_schema::Schema;
//!
//! let schema = Schema::load_from_file("extension_api.json")?;
//! let node = schema.class("Node2D").unwrap();
//! println!("{} inherits {:?}", node.name, node.parent);
//! ```

pub mod api;
mod error;
mod flags;
mod level;
mod model;
mod types;
mod variant;

pub use error::SchemaError;
pub use flags::{MethodFlags, PropertyHint, PropertyUsage};
pub use level::InitializationLevel;
pub use model::{
    ApiType, BuiltinConstantDescriptor, BuiltinDescriptor, ClassDescriptor, ConstantDescriptor,
    ConstructorDescriptor, EnumDescriptor, GroupRef, Header, MemberDescriptor, MethodDescriptor,
    MethodScope, OperatorDescriptor, ParamDescriptor, PropertyDescriptor, Schema,
    SignalDescriptor, SingletonDescriptor, UtilityFunction,
};
pub use types::DeclaredType;
pub use variant::{VariantOperator, VariantType};
