//! gdbind codegen - Rust emission
//!
//! Everything that turns planned bindings into Rust tokens lives here, shared
//! by the generator binary and the derive macros so both follow the same
//! marshaling and registration rules:
//!
//! - [`marshal`] - per-category argument decoding, property setters and method proxies
//! - [`groups`] - property group/subgroup prefix handling and member registration
//! - [`enums`] - engine enums as newtypes with associated constants
//! - [`mapping`] - declared engine types to Rust types for one module
//! - [`classes`] / [`builtins`] - engine class wrappers and builtin method traits
//! - [`utility`] - global utility functions
//! - [`entry`] - per-module `initialize_level` / `deinitialize_level`
//! - [`assemble`] - file layout, formatting and write-if-changed output

pub mod assemble;
pub mod builtins;
pub mod classes;
pub mod entry;
pub mod enums;
pub mod groups;
pub mod mapping;
pub mod marshal;
pub mod naming;
pub mod utility;

use std::path::Path;

use gdbind_core::config::GenerationSettings;
use gdbind_core::{GenerateResult, ModulePlan, TierAssignment};
use gdbind_schema::Schema;

pub use assemble::{GeneratedFile, ModuleAssembler, OutputSet, WriteReport};
pub use groups::{emit_members, ClassMember, ExportedField, MemberEmission, PropertyGroupState};
pub use mapping::TypeMapper;
pub use marshal::{MarshaledType, PropertySpec};

/// Assemble `plan` and write it under `out_dir/<module>/`
pub fn generate_module(
    schema: &Schema,
    plan: &ModulePlan,
    tiers: &TierAssignment,
    settings: &GenerationSettings,
    out_dir: &Path,
) -> GenerateResult<WriteReport> {
    ModuleAssembler::new(schema, plan, tiers, settings)
        .assemble()?
        .write_to(out_dir)
}
