//! The extension entry point
//!
//! An extension lists its classes once; the entry orders them with the shared
//! initialization-level resolver and registers them tier by tier as the engine
//! walks its initialization levels, then unregisters them in exact reverse.

use gdbind_core::levels::{self, ClassNode, InitializationPlan, LevelError, TierAssignment};
use gdbind_schema::InitializationLevel;

use crate::class::ExportedClass;
use crate::classdb::{ClassBuilder, ClassDb};

/// Everything needed to register one user class
#[derive(Debug, Clone, Copy)]
pub struct ClassRegistration {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub ref_counted: bool,
    pub level: InitializationLevel,
    register: fn(&mut ClassBuilder),
}

impl ClassRegistration {
    pub fn of<T: ExportedClass>() -> Self {
        Self {
            name: T::CLASS_NAME,
            parent: T::PARENT_CLASS,
            ref_counted: T::REF_COUNTED,
            level: T::INIT_LEVEL,
            register: register_members::<T>,
        }
    }
}

fn register_members<T: ExportedClass>(builder: &mut ClassBuilder) {
    T::register_properties(builder);
    T::register_methods(builder);
}

impl ClassNode for ClassRegistration {
    fn name(&self) -> &str {
        self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent
    }
}

/// Registers an extension's classes level by level
#[derive(Debug)]
pub struct ExtensionEntry {
    classes: Vec<ClassRegistration>,
    plan: InitializationPlan,
}

impl ExtensionEntry {
    pub fn new(classes: Vec<ClassRegistration>) -> Result<Self, LevelError> {
        // Engine parents are registered by the engine before any extension level
        let mut tiers = TierAssignment::new(InitializationLevel::Core);
        for class in &classes {
            tiers.assign(class.name, class.level);
        }
        let plan = levels::resolve(&tiers, &classes)?;
        tracing::debug!("Extension entry with {} classes", plan.len());
        Ok(Self { classes, plan })
    }

    pub fn plan(&self) -> &InitializationPlan {
        &self.plan
    }

    fn registration(&self, name: &str) -> Option<&ClassRegistration> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Register the classes of `level`, parents first
    pub fn initialize(&self, level: InitializationLevel) {
        for name in self.plan.tier(level) {
            let Some(class) = self.registration(name) else {
                continue;
            };
            if ClassDb::register_class(class.name, class.parent, class.ref_counted) {
                let mut builder = ClassBuilder::new(class.name);
                (class.register)(&mut builder);
            }
        }
    }

    /// Unregister the classes of `level` in exact reverse registration order
    pub fn deinitialize(&self, level: InitializationLevel) {
        for name in self.plan.tier(level).iter().rev() {
            ClassDb::unregister_class(name);
        }
    }
}

/// Registration data for the class `T`, for use in [`extension_entry!`]
pub fn registration<T: ExportedClass>() -> ClassRegistration {
    ClassRegistration::of::<T>()
}

/// Declare a function building the extension's [`ExtensionEntry`]
///
/// ```ignore
/// gdbind_runtime::extension_entry!(pub fn entry { Player, Enemy });
/// ```
#[macro_export]
macro_rules! extension_entry {
    ($vis:vis fn $name:ident { $($class:ty),* $(,)? }) => {
        $vis fn $name() -> ::core::result::Result<$crate::ExtensionEntry, $crate::LevelError> {
            $crate::ExtensionEntry::new(::std::vec![$($crate::registration::<$class>()),*])
        }
    };
}
