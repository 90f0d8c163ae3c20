//! Property groups and the registration order of exported members
//!
//! A class's members are walked once, in declaration order. Group and subgroup
//! markers are registered the moment they are seen and update the per-class
//! [`PropertyGroupState`]; each exported property that follows is registered
//! under its full stored name, while its registry accessors
//! (`get_<accessor>` / `set_<accessor>`) use the name with the active prefix
//! stripped.

use std::collections::HashSet;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::marshal::{self, MarshaledType, PropertySpec};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveGroup {
    name: String,
    prefix: String,
}

/// The group and subgroup currently in effect while walking one class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyGroupState {
    group: Option<ActiveGroup>,
    subgroup: Option<ActiveGroup>,
}

impl PropertyGroupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a group; any active subgroup ends
    pub fn enter_group(&mut self, name: &str, prefix: &str) {
        self.group = Some(ActiveGroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
        self.subgroup = None;
    }

    /// Start a subgroup inside the active group
    pub fn enter_subgroup(&mut self, name: &str, prefix: &str) {
        self.subgroup = Some(ActiveGroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.name.as_str())
    }

    pub fn subgroup(&self) -> Option<&str> {
        self.subgroup.as_ref().map(|g| g.name.as_str())
    }

    /// `stored` without the active prefix, if it carries one. The subgroup
    /// prefix is tried first.
    fn strip<'a>(&self, stored: &'a str) -> Option<&'a str> {
        [&self.subgroup, &self.group]
            .into_iter()
            .flatten()
            .filter(|g| !g.prefix.is_empty())
            .find_map(|g| stored.strip_prefix(g.prefix.as_str()))
    }

    /// Registry accessor name for a property stored as `stored`.
    ///
    /// A property that does not start with the active prefix keeps its name.
    pub fn accessor_name(&self, stored: &str) -> String {
        match self.strip(stored) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => stored.to_string(),
        }
    }
}

/// An exported stored property of a user class
#[derive(Debug, Clone)]
pub struct ExportedField {
    /// Rust field holding the value
    pub field: Ident,
    /// Name registered with the engine
    pub name: String,
    pub ty: MarshaledType,
    pub spec: PropertySpec,
}

/// One entry of a class's ordered member list
#[derive(Debug, Clone)]
pub enum ClassMember {
    Group { name: String, prefix: String },
    Subgroup { name: String, prefix: String },
    Property(ExportedField),
}

/// Everything emitted for a class's members
#[derive(Debug, Default)]
pub struct MemberEmission {
    /// Statements run against `builder` in declaration order
    pub registrations: Vec<TokenStream>,
    /// Setter and getter functions for the class's inherent impl
    pub accessors: Vec<TokenStream>,
    /// `match` arms dispatching registry accessor names
    pub dispatch_arms: Vec<TokenStream>,
    /// `(stored name, accessor name)` for every property
    pub properties: Vec<(String, String)>,
}

/// Walk `members` in order and emit registration, accessors and dispatch.
///
/// The accessor name falls back to the full stored name when stripping would
/// collide with another property's stored name or an accessor already emitted.
pub fn emit_members(class: &str, members: &[ClassMember]) -> MemberEmission {
    let stored: HashSet<&str> = members
        .iter()
        .filter_map(|m| match m {
            ClassMember::Property(field) => Some(field.name.as_str()),
            _ => None,
        })
        .collect();

    let mut state = PropertyGroupState::new();
    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = MemberEmission::default();

    for member in members {
        match member {
            ClassMember::Group { name, prefix } => {
                state.enter_group(name, prefix);
                out.registrations
                    .push(quote!(builder.add_property_group(#name, #prefix);));
            }
            ClassMember::Subgroup { name, prefix } => {
                state.enter_subgroup(name, prefix);
                out.registrations
                    .push(quote!(builder.add_property_subgroup(#name, #prefix);));
            }
            ClassMember::Property(field) => {
                let mut accessor = state.accessor_name(&field.name);
                if accessor != field.name
                    && (stored.contains(accessor.as_str()) || emitted.contains(&accessor))
                {
                    tracing::debug!(
                        "{}.{}: accessor `{}` is taken, keeping the full name",
                        class,
                        field.name,
                        accessor
                    );
                    accessor = field.name.clone();
                }
                emitted.insert(accessor.clone());
                emit_property(class, field, &accessor, &mut out);
                out.properties.push((field.name.clone(), accessor));
            }
        }
    }

    out
}

fn emit_property(class: &str, field: &ExportedField, accessor: &str, out: &mut MemberEmission) {
    let setter_name = format!("set_{}", accessor);
    let getter_name = format!("get_{}", accessor);
    let setter_fn = format_ident!("__set_{}", accessor);
    let getter_fn = format_ident!("__get_{}", accessor);

    let info = marshal::prop_info(&field.name, &field.ty, &field.spec);
    out.registrations
        .push(quote!(builder.add_property(#info, #setter_name, #getter_name);));

    let setter_body = marshal::property_setter(class, &field.name, &field.field, &field.ty);
    let getter_body = marshal::property_getter(&field.field);
    out.accessors.push(quote! {
        #[doc(hidden)]
        fn #setter_fn(&mut self, args: &::gdbind_runtime::Arguments<'_>) {
            #setter_body
        }

        #[doc(hidden)]
        fn #getter_fn(&self) -> ::gdbind_runtime::Variant {
            #getter_body
        }
    });

    out.dispatch_arms.push(quote! {
        #setter_name => {
            self.#setter_fn(args);
            ::gdbind_runtime::CallOutcome::Returned(None)
        }
        #getter_name => ::gdbind_runtime::CallOutcome::Returned(Some(self.#getter_fn())),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbind_core::{PrimitiveKind, TypeCategory};

    fn property(name: &str) -> ClassMember {
        ClassMember::Property(ExportedField {
            field: format_ident!("{}", name),
            name: name.to_string(),
            ty: MarshaledType::new(quote!(i64), TypeCategory::Primitive(PrimitiveKind::I64)),
            spec: PropertySpec::default(),
        })
    }

    fn group(name: &str, prefix: &str) -> ClassMember {
        ClassMember::Group {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    fn subgroup(name: &str, prefix: &str) -> ClassMember {
        ClassMember::Subgroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    fn accessors(out: &MemberEmission) -> Vec<&str> {
        out.properties.iter().map(|(_, a)| a.as_str()).collect()
    }

    #[test]
    fn test_prefix_stripping_and_fallback() {
        let out = emit_members(
            "Car",
            &[
                group("Year Made", "ymms_"),
                property("ymms_year"),
                property("non_prefixed_bool"),
            ],
        );
        assert_eq!(accessors(&out), ["year", "non_prefixed_bool"]);
    }

    #[test]
    fn test_group_resets_subgroup() {
        let mut state = PropertyGroupState::new();
        state.enter_group("Stats", "stat_");
        state.enter_subgroup("Speed", "stat_speed_");
        assert_eq!(state.group(), Some("Stats"));
        assert_eq!(state.accessor_name("stat_speed_max"), "max");
        assert_eq!(state.accessor_name("stat_health"), "health");

        state.enter_group("Looks", "");
        assert_eq!(state.subgroup(), None);
        assert_eq!(state.accessor_name("stat_speed_max"), "stat_speed_max");
    }

    #[test]
    fn test_empty_and_colliding_names_keep_full_name() {
        let out = emit_members(
            "Car",
            &[
                property("color"),
                group("Paint", "paint_"),
                property("paint_"),
                property("paint_color"),
            ],
        );
        assert_eq!(accessors(&out), ["color", "paint_", "paint_color"]);
    }

    #[test]
    fn test_registration_follows_declaration_order() {
        let out = emit_members(
            "Car",
            &[
                property("speed"),
                group("Engine", "engine_"),
                property("engine_power"),
                subgroup("Fuel", "engine_fuel_"),
                property("engine_fuel_level"),
            ],
        );
        let calls: Vec<String> = out
            .registrations
            .iter()
            .map(|r| {
                let text = r.to_string();
                let start = text.find("add_").unwrap();
                text[start..].split_whitespace().next().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            calls,
            [
                "add_property",
                "add_property_group",
                "add_property",
                "add_property_subgroup",
                "add_property"
            ]
        );
        assert_eq!(accessors(&out), ["speed", "power", "level"]);
        assert_eq!(out.dispatch_arms.len(), 3);
        assert!(out.dispatch_arms[2].to_string().contains("\"set_level\""));
    }

    #[test]
    fn test_state_does_not_leak_between_classes() {
        emit_members("First", &[group("Stats", "stat_"), property("stat_hp")]);
        let out = emit_members("Second", &[property("stat_hp")]);
        assert_eq!(accessors(&out), ["stat_hp"]);
    }
}
