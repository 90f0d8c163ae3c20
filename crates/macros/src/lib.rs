//! gdbind Proc Macros
//!
//! This crate provides the macros user classes are declared with. They share
//! the type classifier and marshaling emitter with the binding generator, so a
//! user property or method is converted exactly like an engine one:
//!
//! - `#[derive(GodotClass)]` - Class identity, exported properties and groups
//! - `#[derive(GodotEnum)]` - Integer enums usable as properties and arguments
//! - `#[godot_api]` - Callable methods and signals
//!
//! # Example
//!
//! ```ignore
//! use gdbind_runtime::prelude::*;
//!
//! #[derive(GodotEnum, Clone, Copy)]
//! #[repr(i32)]
//! enum Team {
//!     Red,
//!     Blue,
//! }
//!
//! #[derive(GodotClass)]
//! #[class(base = Node, init_level = "scene")]
//! struct Player {
//!     base: Base<Node>,
//!
//!     #[export_group(name = "Stats", prefix = "stat_")]
//!     #[export(hint = "range", hint_string = "0,100")]
//!     stat_health: i64,
//!
//!     #[export(enum_width = 32)]
//!     team: Team,
//! }
//!
//! #[godot_api(virtuals = node::dispatch_node_virtual)]
//! impl Player {
//!     #[callable]
//!     fn heal(&mut self, amount: i64) -> i64 {
//!         self.stat_health += amount;
//!         self.stat_health
//!     }
//!
//!     #[signal]
//!     fn died(&self, killer: Option<Node>) {}
//! }
//!
//! // Registered members, in order:
//! // - group "Stats" (prefix "stat_")
//! // - property stat_health with set_health / get_health
//! // - property team with set_team / get_team
//! // - method heal
//! // - signal died
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes (GodotClass)
//!
//! - `#[class(base = Node)]` - Optional. Must agree with the `Base<T>` field.
//! - `#[class(init_level = "servers")]` - Optional. Initialization tier (default: "scene").
//! - `#[class(rename = "Name")]` - Optional. Class name registered with the engine.
//!
//! ## Field Attributes (GodotClass)
//!
//! - `#[export]` - Register the field as a property.
//! - `#[export(hint = "range", hint_string = "0,10", usage = "storage|editor")]` - Editor metadata.
//! - `#[export(enum_width = 32)]` - The field is a `GodotEnum` stored in 32 or 64 bits.
//! - `#[export_group(name = "Name", prefix = "pre_")]` - Start a property group.
//! - `#[export_subgroup(name = "Name", prefix = "pre_")]` - Start a subgroup in the current group.

mod godot_api;
mod godot_class;
mod godot_enum;
mod parse;
mod types;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl};

/// Derive macro for user classes
///
/// Implements `GodotClass` and `ExportedClass` for a struct with a
/// `Base<T>` field. Each `#[export]` field becomes a property with a
/// generated setter and getter reachable by name; the setter decodes the
/// incoming value by the field's type category and leaves the field untouched
/// when decoding fails.
///
/// # Generated Code
///
/// - `GodotClass` with the class name, parent, ref-counting and tier
/// - `ExportedClass::register_properties` recording groups and properties in declaration order
/// - `ExportedClass::dispatch_property` routing `set_<name>` / `get_<name>`
/// - hidden `__set_<name>` / `__get_<name>` helpers on the struct
///
/// Inside a group or subgroup, the registry accessor names drop the active
/// prefix (`ymms_year` under prefix `ymms_` is reached as `set_year`).
#[proc_macro_derive(GodotClass, attributes(class, export, export_group, export_subgroup))]
pub fn derive_godot_class(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    godot_class::derive_godot_class(input).into()
}

/// Derive macro for fieldless enums
///
/// The enum is marshaled as its raw integer. Add `#[repr(i32)]` (or any
/// integer of 32 bits or fewer) for a 32-bit enum; anything else is 64-bit.
/// `#[godot_enum(bitfield)]` marks the cases as flags.
#[proc_macro_derive(GodotEnum, attributes(godot_enum))]
pub fn derive_godot_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    godot_enum::derive_godot_enum(input).into()
}

/// Attribute macro for a class's methods and signals
///
/// Goes on the inherent impl of a `#[derive(GodotClass)]` struct and
/// implements `ClassMethods` for it.
///
/// - `#[callable]` methods are registered and dispatched by name. Arguments are
///   all decoded before the call; a failure reports a diagnostic and the call
///   returns nothing.
/// - `#[signal]` methods take `&self`, return nothing and have an empty body;
///   the body is replaced with the emission of the signal.
///
/// # Arguments
///
/// - `virtuals = path` - Optional. Dispatcher tried for names no callable
///   matches, typically the generated `dispatch_<class>_virtual` of the base.
#[proc_macro_attribute]
pub fn godot_api(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as parse::ApiArgs);
    let item = parse_macro_input!(item as ItemImpl);
    godot_api::generate_godot_api(args, item).into()
}
