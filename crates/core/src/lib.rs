//! gdbind core - generation planning
//!
//! This crate holds the parts of the binding compiler that decide *what* to
//! generate, shared by the generator binary and the proc-macro crate:
//!
//! - [`classify`] - map a declared type to its marshaling strategy
//! - [`partition`] - split classes across output modules
//! - [`levels`] - order class registration across initialization tiers
//! - [`config`] - the TOML module configuration
//! - [`filters`] - per-module filter files consumed by the generator process
//!
//! # Re-exports
//!
//! The schema crate is re-exported as [`schema`] for convenience.

pub use gdbind_schema as schema;

pub mod classify;
pub mod config;
mod error;
pub mod filters;
pub mod levels;
pub mod output;
pub mod partition;

pub use classify::{
    classify, ClassifyError, EnumWidth, PrimitiveKind, RefCounting, TypeCategory, TypeContext,
};
pub use config::{ConfigError, ConfigResult, ModuleConfig};
pub use error::{GenerateError, GenerateResult};
pub use filters::FilterSet;
pub use levels::{resolve, ClassNode, InitializationPlan, LevelError, TierAssignment};
pub use output::write_if_changed;
pub use partition::{partition, FileLayout, ModuleDefinition, ModulePlan, ModulePlanSet, PartitionOptions};
