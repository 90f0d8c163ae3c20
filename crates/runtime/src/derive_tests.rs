//! The derive and attribute macros expanded against this crate

use std::sync::{LazyLock, Once};

use parking_lot::Mutex;

use crate::prelude::*;
use crate::{
    object, registration, take_diagnostics, CallError, ClassDb, EngineBackend, ExtensionEntry,
    GString, InitializationLevel, MethodFlags, ObjectHandle, PropertyHint, RegisteredMember,
    VariantOperator, VariantType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    handle: ObjectHandle,
}

impl GodotClass for Node {
    const CLASS_NAME: &'static str = "Node";
    const PARENT_CLASS: Option<&'static str> = Some("Object");
    const REF_COUNTED: bool = false;
}

impl ObjectRef for Node {
    const CLASS: &'static str = "Node";

    fn from_handle_unchecked(handle: ObjectHandle) -> Self {
        Self { handle }
    }

    fn handle(&self) -> ObjectHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resource {
    handle: ObjectHandle,
}

impl GodotClass for Resource {
    const CLASS_NAME: &'static str = "Resource";
    const PARENT_CLASS: Option<&'static str> = Some("RefCounted");
    const REF_COUNTED: bool = true;
}

impl ObjectRef for Resource {
    const CLASS: &'static str = "Resource";

    fn from_handle_unchecked(handle: ObjectHandle) -> Self {
        Self { handle }
    }

    fn handle(&self) -> ObjectHandle {
        self.handle
    }
}

#[derive(GodotEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
enum Team {
    Red,
    Blue = 4,
}

#[derive(GodotClass)]
#[class(base = Node)]
struct Car {
    base: Base<Node>,

    #[export_group(name = "Year Made", prefix = "ymms_")]
    #[export]
    ymms_year: i64,

    #[export]
    non_prefixed_bool: bool,

    #[export_subgroup(name = "Engine", prefix = "engine_")]
    #[export(hint = "range", hint_string = "0,500")]
    engine_power: f64,

    #[export(enum_width = 32)]
    team: Team,

    #[export]
    resource: Option<Resource>,

    #[export]
    passengers: TypedArray<i64>,

    #[export]
    tag: Variant,

    honks: i64,
}

#[godot_api]
impl Car {
    #[callable]
    fn honk(&mut self, times: i64, team: Team) -> i64 {
        if team == self.team {
            self.honks += times;
        }
        self.honks
    }

    #[callable]
    fn wheel_count() -> i64 {
        4
    }

    #[signal]
    fn crashed(&self, speed: f64) {}
}

#[derive(GodotClass)]
#[class(init_level = "servers")]
struct Radio {
    base: Base<Node>,
}

#[godot_api]
impl Radio {}

type Emission = (ObjectHandle, String, Vec<Variant>);

static EMITTED: LazyLock<Mutex<Vec<Emission>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Records signal emissions; every other engine call fails
struct RecordingBackend;

impl EngineBackend for RecordingBackend {
    fn call_method(
        &self,
        _object: Option<ObjectHandle>,
        class: &str,
        method: &str,
        _args: &[Variant],
    ) -> Result<Variant, CallError> {
        Err(CallError::Engine(format!("{}.{} is not scripted", class, method)))
    }

    fn call_builtin(&self, _receiver: &Variant, method: &str, _args: &[Variant]) -> Result<Variant, CallError> {
        Err(CallError::Engine(format!("{} is not scripted", method)))
    }

    fn call_utility(&self, function: &str, _args: &[Variant]) -> Result<Variant, CallError> {
        Err(CallError::Engine(format!("{} is not scripted", function)))
    }

    fn construct_builtin(&self, ty: VariantType, _constructor: u32, _args: &[Variant]) -> Result<Variant, CallError> {
        Err(CallError::Engine(format!("{} is not scripted", ty)))
    }

    fn evaluate_operator(
        &self,
        op: VariantOperator,
        _left: &Variant,
        _right: &Variant,
    ) -> Result<Variant, CallError> {
        Err(CallError::Engine(format!("`{}` is not scripted", op)))
    }

    fn singleton(&self, _class: &str) -> Option<ObjectHandle> {
        None
    }

    fn emit_signal(&self, object: ObjectHandle, signal: &str, args: &[Variant]) -> Result<(), CallError> {
        EMITTED.lock().push((object, signal.to_string(), args.to_vec()));
        Ok(())
    }
}

fn install_recording_backend() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        crate::install_backend(Box::new(RecordingBackend));
    });
}

fn new_car() -> Gd<Car> {
    Gd::new_with(|base| Car {
        base,
        ymms_year: 0,
        non_prefixed_bool: false,
        engine_power: 0.0,
        team: Team::Red,
        resource: None,
        passengers: TypedArray::new(),
        tag: Variant::Nil,
        honks: 0,
    })
}

fn new_resource() -> Resource {
    Resource::from_handle_unchecked(object::create("Resource", true))
}

#[test]
fn test_prefixed_accessors() {
    let car = new_car();
    assert_eq!(car.call("set_year", &[Variant::Int(1999)]), Ok(None));
    assert_eq!(car.call("get_year", &[]), Ok(Some(Variant::Int(1999))));
    assert_eq!(car.call("set_power", &[Variant::Float(120.5)]), Ok(None));
    assert_eq!(car.bind(|c| c.engine_power), Some(120.5));

    // Outside the prefix the name is kept whole
    assert_eq!(car.call("set_non_prefixed_bool", &[Variant::Bool(true)]), Ok(None));
    assert_eq!(car.bind(|c| c.non_prefixed_bool), Some(true));

    assert!(matches!(
        car.call("set_ymms_year", &[Variant::Int(1)]),
        Err(CallError::UnknownMethod { .. })
    ));
}

#[test]
fn test_object_property_retains_before_release() {
    let car = new_car();
    let first = new_resource();
    let second = new_resource();

    car.call("set_resource", &[first.to_variant()]).unwrap();
    assert_eq!(object::reference_count(first.handle()), Some(1));

    // Reassigning the same object must not drop it
    car.call("set_resource", &[first.to_variant()]).unwrap();
    assert_eq!(object::reference_count(first.handle()), Some(1));
    assert!(object::is_alive(first.handle()));

    car.call("set_resource", &[second.to_variant()]).unwrap();
    assert!(!object::is_alive(first.handle()));
    assert_eq!(object::reference_count(second.handle()), Some(1));
    assert_eq!(car.call("get_resource", &[]), Ok(Some(second.to_variant())));

    car.call("set_resource", &[Variant::Nil]).unwrap();
    assert!(!object::is_alive(second.handle()));
    assert_eq!(car.call("get_resource", &[]), Ok(Some(Variant::Nil)));
}

#[test]
fn test_collection_property_rejects_mismatch() {
    let car = new_car();
    let passengers: TypedArray<i64> = [1, 2, 3].into_iter().collect();
    car.call("set_passengers", &[passengers.to_variant()]).unwrap();
    assert_eq!(car.call("get_passengers", &[]), Ok(Some(passengers.to_variant())));

    take_diagnostics();
    let names: TypedArray<GString> = [GString::from("ann")].into_iter().collect();
    assert_eq!(car.call("set_passengers", &[names.to_variant()]), Ok(None));
    let diagnostics = take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("Error setting `Car.passengers`"));
    assert_eq!(car.bind(|c| c.passengers.len()), Some(3));
}

#[test]
fn test_enum_property_ignores_unknown_values() {
    let car = new_car();
    take_diagnostics();

    car.call("set_team", &[Variant::Int(4)]).unwrap();
    assert_eq!(car.bind(|c| c.team), Some(Team::Blue));

    car.call("set_team", &[Variant::Int(2)]).unwrap();
    assert_eq!(car.bind(|c| c.team), Some(Team::Blue));
    assert!(take_diagnostics().is_empty());

    // Wider than the 32-bit storage is a conversion error
    car.call("set_team", &[Variant::Int(i64::MAX)]).unwrap();
    assert_eq!(car.bind(|c| c.team), Some(Team::Blue));
    assert_eq!(take_diagnostics().len(), 1);

    assert_eq!(car.call("get_team", &[]), Ok(Some(Variant::Int(4))));
}

#[test]
fn test_opaque_property_accepts_anything() {
    let car = new_car();
    car.call("set_tag", &[Variant::String(GString::from("fast"))]).unwrap();
    assert_eq!(car.call("get_tag", &[]), Ok(Some(Variant::String(GString::from("fast")))));
    car.call("set_tag", &[Variant::Int(3)]).unwrap();
    assert_eq!(car.call("get_tag", &[]), Ok(Some(Variant::Int(3))));
}

#[test]
fn test_callable_proxy() {
    let car = new_car();
    assert_eq!(
        car.call("honk", &[Variant::Int(2), Team::Red.to_variant()]),
        Ok(Some(Variant::Int(2)))
    );
    assert_eq!(car.call("wheel_count", &[]), Ok(Some(Variant::Int(4))));

    take_diagnostics();
    assert_eq!(car.call("honk", &[Variant::Bool(true), Team::Red.to_variant()]), Ok(None));
    assert_eq!(car.call("honk", &[Variant::Int(1)]), Ok(None));
    let diagnostics = take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics[0].starts_with("Error calling `Car.honk`: argument 0"));
    assert!(diagnostics[1].contains("missing argument 1"));
    assert_eq!(car.bind(|c| c.honks), Some(2));
}

#[test]
fn test_signal_emission() {
    install_recording_backend();
    let car = new_car();
    car.bind(|c| c.crashed(88.0)).unwrap();

    let emitted = EMITTED.lock();
    let (_, signal, args) = emitted
        .iter()
        .find(|(handle, _, _)| *handle == car.handle())
        .unwrap();
    assert_eq!(signal, "crashed");
    assert_eq!(args, &vec![Variant::Float(88.0)]);
}

#[test]
fn test_entry_registers_members_in_order() {
    let entry = ExtensionEntry::new(vec![registration::<Car>(), registration::<Radio>()]).unwrap();
    assert_eq!(entry.plan().tier(InitializationLevel::Servers), ["Radio"]);
    assert_eq!(entry.plan().tier(InitializationLevel::Scene), ["Car"]);

    entry.initialize(InitializationLevel::Servers);
    assert!(ClassDb::is_registered("Radio"));
    assert!(!ClassDb::is_registered("Car"));

    entry.initialize(InitializationLevel::Scene);
    assert_eq!(ClassDb::parent_of("Car").as_deref(), Some("Node"));

    let members = ClassDb::members("Car");
    let outline: Vec<String> = members
        .iter()
        .map(|m| match m {
            RegisteredMember::Group { name, .. } => format!("group {}", name),
            RegisteredMember::Subgroup { name, .. } => format!("subgroup {}", name),
            RegisteredMember::Property { setter, .. } => format!("property {}", setter),
            RegisteredMember::Method(info) => format!("method {}", info.name),
            RegisteredMember::Signal(info) => format!("signal {}", info.name),
        })
        .collect();
    assert_eq!(
        outline,
        [
            "group Year Made",
            "property set_year",
            "property set_non_prefixed_bool",
            "subgroup Engine",
            "property set_power",
            "property set_team",
            "property set_resource",
            "property set_passengers",
            "property set_tag",
            "method honk",
            "method wheel_count",
            "signal crashed",
        ]
    );

    let team = members.iter().find_map(|m| match m {
        RegisteredMember::Property { info, .. } if info.name == "team" => Some(info),
        _ => None,
    });
    let team = team.unwrap();
    assert_eq!(team.hint, PropertyHint::Enum);
    assert_eq!(team.hint_string, "Red:0,Blue:4");

    let flags: Vec<MethodFlags> = members
        .iter()
        .filter_map(|m| match m {
            RegisteredMember::Method(info) => Some(info.flags),
            _ => None,
        })
        .collect();
    assert_eq!(flags, [MethodFlags::NORMAL, MethodFlags::NORMAL | MethodFlags::STATIC]);

    entry.deinitialize(InitializationLevel::Scene);
    assert!(!ClassDb::is_registered("Car"));
    entry.deinitialize(InitializationLevel::Servers);
    assert!(!ClassDb::is_registered("Radio"));
}
