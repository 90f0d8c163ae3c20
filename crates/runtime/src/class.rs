//! Traits implemented by generated and derived classes

use gdbind_schema::InitializationLevel;

use crate::args::Arguments;
use crate::classdb::ClassBuilder;
use crate::object::{ObjectHandle, ObjectRef};
use crate::variant::Variant;

/// Static identity of a class, engine-provided or user-defined
pub trait GodotClass: 'static {
    const CLASS_NAME: &'static str;
    const PARENT_CLASS: Option<&'static str>;
    const REF_COUNTED: bool;
    const INIT_LEVEL: InitializationLevel = InitializationLevel::Scene;
}

/// Result of dispatching a call by name
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The member exists; `None` for void members and for calls that failed
    /// after reporting a diagnostic
    Returned(Option<Variant>),
    NotFound,
}

impl CallOutcome {
    pub fn is_found(&self) -> bool {
        !matches!(self, CallOutcome::NotFound)
    }
}

/// Methods and signals of a user class, implemented by `#[godot_api]`
pub trait ClassMethods {
    fn register_methods(builder: &mut ClassBuilder);

    fn dispatch_method(&mut self, method: &str, args: &Arguments<'_>) -> CallOutcome;
}

/// A user-defined class, implemented by `#[derive(GodotClass)]`
pub trait ExportedClass: GodotClass + ClassMethods + Send + Sized {
    /// The engine class this class extends
    type Base: ObjectRef + GodotClass;

    /// Record property groups and properties in declaration order
    fn register_properties(builder: &mut ClassBuilder);

    /// Invoke a generated property getter or setter by registry name
    fn dispatch_property(&mut self, name: &str, args: &Arguments<'_>) -> CallOutcome;

    /// Handle of the engine object this instance is attached to
    fn base_handle(&self) -> ObjectHandle;
}

/// An enumeration marshaled as its raw integer
pub trait GodotEnum: Copy + Sized + 'static {
    /// Raw storage width in bits, 32 or 64
    const WIDTH: u32;

    const IS_BITFIELD: bool = false;

    /// `None` when `raw` names no case
    fn from_raw(raw: i64) -> Option<Self>;

    fn to_raw(self) -> i64;

    /// Editor hint listing the cases, `Name:value,...`
    fn hint_string() -> String;
}
