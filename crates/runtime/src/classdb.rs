//! The class database
//!
//! Records every registered class with its parent and, in declaration order,
//! the property groups, properties, methods and signals it exposes. Subclass
//! queries are cached per (class, ancestor) pair.

use std::collections::HashMap;
use std::sync::LazyLock;

use dashmap::DashMap;
use gdbind_schema::{MethodFlags, PropertyHint, PropertyUsage, VariantType};
use parking_lot::RwLock;

use crate::class::GodotClass;

/// Registration-time description of a property, argument or return value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropInfo {
    pub name: String,
    pub variant_type: VariantType,
    /// Class of object values or typed-array elements
    pub class_name: Option<String>,
    pub hint: PropertyHint,
    pub hint_string: String,
    pub usage: PropertyUsage,
}

impl PropInfo {
    pub fn new(name: impl Into<String>, variant_type: VariantType) -> Self {
        Self {
            name: name.into(),
            variant_type,
            class_name: None,
            hint: PropertyHint::None,
            hint_string: String::new(),
            usage: PropertyUsage::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub arguments: Vec<PropInfo>,
    pub return_value: Option<PropInfo>,
    pub flags: MethodFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalInfo {
    pub name: String,
    pub arguments: Vec<PropInfo>,
}

/// One registration entry, in the order it was recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisteredMember {
    Group { name: String, prefix: String },
    Subgroup { name: String, prefix: String },
    Property {
        info: PropInfo,
        setter: String,
        getter: String,
    },
    Method(MethodInfo),
    Signal(SignalInfo),
}

#[derive(Debug, Clone)]
struct ClassRecord {
    parent: Option<String>,
    ref_counted: bool,
    members: Vec<RegisteredMember>,
}

#[derive(Default)]
struct Registry {
    classes: HashMap<String, ClassRecord>,
    order: Vec<String>,
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::default()));

static SUBCLASS_CACHE: LazyLock<DashMap<(String, String), bool>> = LazyLock::new(DashMap::new);

/// Global class database
pub struct ClassDb;

impl ClassDb {
    /// Register a class. Returns `false` if it is already registered.
    pub fn register_class(name: &str, parent: Option<&str>, ref_counted: bool) -> bool {
        let mut registry = REGISTRY.write();
        if registry.classes.contains_key(name) {
            tracing::warn!("Class '{}' already registered", name);
            return false;
        }
        registry.classes.insert(
            name.to_string(),
            ClassRecord {
                parent: parent.map(str::to_string),
                ref_counted,
                members: Vec::new(),
            },
        );
        registry.order.push(name.to_string());
        // Cleared under the write guard so no reader can re-insert a stale answer
        SUBCLASS_CACHE.clear();
        drop(registry);

        tracing::debug!("Registered class: {}", name);
        true
    }

    /// Register the class `T` describes
    pub fn register_engine_class<T: GodotClass>() -> bool {
        Self::register_class(T::CLASS_NAME, T::PARENT_CLASS, T::REF_COUNTED)
    }

    pub fn unregister_class(name: &str) -> bool {
        let mut registry = REGISTRY.write();
        let removed = registry.classes.remove(name).is_some();
        registry.order.retain(|c| c != name);
        if removed {
            SUBCLASS_CACHE.clear();
        }
        drop(registry);

        if removed {
            tracing::debug!("Unregistered class: {}", name);
        }
        removed
    }

    pub fn is_registered(name: &str) -> bool {
        REGISTRY.read().classes.contains_key(name)
    }

    pub fn parent_of(name: &str) -> Option<String> {
        REGISTRY.read().classes.get(name).and_then(|r| r.parent.clone())
    }

    pub fn is_ref_counted(name: &str) -> Option<bool> {
        REGISTRY.read().classes.get(name).map(|r| r.ref_counted)
    }

    /// Whether `class` is `ancestor` or inherits from it
    pub fn is_subclass(class: &str, ancestor: &str) -> bool {
        if class == ancestor {
            return true;
        }
        let key = (class.to_string(), ancestor.to_string());
        if let Some(cached) = SUBCLASS_CACHE.get(&key) {
            return *cached;
        }

        let registry = REGISTRY.read();
        let mut current = registry.classes.get(class).and_then(|r| r.parent.as_deref());
        let mut found = false;
        let mut steps = 0;
        while let Some(name) = current {
            if name == ancestor {
                found = true;
                break;
            }
            steps += 1;
            if steps > registry.classes.len() {
                break;
            }
            current = registry.classes.get(name).and_then(|r| r.parent.as_deref());
        }

        // Inserted before the read guard is released; writers clear under the write guard
        SUBCLASS_CACHE.insert(key, found);
        drop(registry);
        found
    }

    /// Registered classes in registration order
    pub fn registered_classes() -> Vec<String> {
        REGISTRY.read().order.clone()
    }

    /// Members recorded for `class`, in order
    pub fn members(class: &str) -> Vec<RegisteredMember> {
        REGISTRY
            .read()
            .classes
            .get(class)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    fn record(class: &str, member: RegisteredMember) {
        match REGISTRY.write().classes.get_mut(class) {
            Some(record) => record.members.push(member),
            None => tracing::warn!("Member registered on unknown class '{}'", class),
        }
    }
}

/// Registration handle for one class, passed to generated registration code
#[derive(Debug)]
pub struct ClassBuilder {
    class: String,
}

impl ClassBuilder {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn add_property_group(&mut self, name: &str, prefix: &str) {
        ClassDb::record(
            &self.class,
            RegisteredMember::Group {
                name: name.to_string(),
                prefix: prefix.to_string(),
            },
        );
    }

    pub fn add_property_subgroup(&mut self, name: &str, prefix: &str) {
        ClassDb::record(
            &self.class,
            RegisteredMember::Subgroup {
                name: name.to_string(),
                prefix: prefix.to_string(),
            },
        );
    }

    pub fn add_property(&mut self, info: PropInfo, setter: &str, getter: &str) {
        ClassDb::record(
            &self.class,
            RegisteredMember::Property {
                info,
                setter: setter.to_string(),
                getter: getter.to_string(),
            },
        );
    }

    pub fn add_method(&mut self, info: MethodInfo) {
        ClassDb::record(&self.class, RegisteredMember::Method(info));
    }

    pub fn add_signal(&mut self, info: SignalInfo) {
        ClassDb::record(&self.class, RegisteredMember::Signal(info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subclass_queries() {
        ClassDb::register_class("DbTestBase", None, false);
        ClassDb::register_class("DbTestMid", Some("DbTestBase"), false);
        ClassDb::register_class("DbTestLeaf", Some("DbTestMid"), false);

        assert!(ClassDb::is_subclass("DbTestLeaf", "DbTestBase"));
        assert!(ClassDb::is_subclass("DbTestLeaf", "DbTestLeaf"));
        assert!(!ClassDb::is_subclass("DbTestBase", "DbTestLeaf"));
        assert_eq!(ClassDb::parent_of("DbTestLeaf").as_deref(), Some("DbTestMid"));

        ClassDb::unregister_class("DbTestMid");
        assert!(!ClassDb::is_subclass("DbTestLeaf", "DbTestBase"));
        ClassDb::unregister_class("DbTestLeaf");
        ClassDb::unregister_class("DbTestBase");
    }

    #[test]
    fn test_subclass_cache_follows_concurrent_registration() {
        ClassDb::register_class("DbRaceBase", None, false);

        let writer = std::thread::spawn(|| {
            for _ in 0..200 {
                ClassDb::register_class("DbRaceChild", Some("DbRaceBase"), false);
                ClassDb::unregister_class("DbRaceChild");
            }
            ClassDb::register_class("DbRaceChild", Some("DbRaceBase"), false);
        });
        let readers: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    for _ in 0..500 {
                        ClassDb::is_subclass("DbRaceChild", "DbRaceBase");
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert!(ClassDb::is_subclass("DbRaceChild", "DbRaceBase"));
        ClassDb::unregister_class("DbRaceChild");
        assert!(!ClassDb::is_subclass("DbRaceChild", "DbRaceBase"));
        ClassDb::unregister_class("DbRaceBase");
    }

    #[test]
    fn test_members_recorded_in_order() {
        ClassDb::register_class("DbTestMembers", None, false);
        let mut builder = ClassBuilder::new("DbTestMembers");
        builder.add_property_group("Stats", "stat_");
        builder.add_property(
            PropInfo::new("stat_health", VariantType::Int),
            "set_health",
            "get_health",
        );
        builder.add_signal(SignalInfo {
            name: "died".to_string(),
            arguments: Vec::new(),
        });

        let members = ClassDb::members("DbTestMembers");
        assert_eq!(members.len(), 3);
        assert!(matches!(&members[0], RegisteredMember::Group { name, .. } if name == "Stats"));
        assert!(matches!(
            &members[1],
            RegisteredMember::Property { getter, .. } if getter == "get_health"
        ));
        assert!(!ClassDb::register_class("DbTestMembers", None, false));
        ClassDb::unregister_class("DbTestMembers");
        assert!(ClassDb::members("DbTestMembers").is_empty());
    }
}
