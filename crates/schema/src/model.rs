//! Descriptor model built from the raw API layout

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::api::{self, ExtensionApi};
use crate::error::SchemaError;
use crate::flags::{PropertyHint, PropertyUsage};
use crate::types::DeclaredType;
use crate::variant::{VariantOperator, VariantType};

/// Engine version the schema was exported from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub version_major: u32,
    pub version_minor: u32,
    pub version_patch: u32,
    pub version_status: String,
    pub version_full_name: String,
}

/// Which API surface a class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiType {
    #[default]
    Core,
    Editor,
}

/// A property group or subgroup a property was declared under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupRef {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Stored property name
    pub name: String,
    pub declared_type: DeclaredType,
    pub hint: PropertyHint,
    pub hint_string: String,
    pub usage: PropertyUsage,
    /// Getter member name
    pub getter: String,
    /// Setter member name, absent for read-only properties
    pub setter: Option<String>,
    /// Index passed to the getter/setter of indexed properties
    pub index: Option<i64>,
    pub group: Option<GroupRef>,
    pub subgroup: Option<GroupRef>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            hint: PropertyHint::None,
            hint_string: String::new(),
            usage: PropertyUsage::DEFAULT,
            getter: String::new(),
            setter: None,
            index: None,
            group: None,
            subgroup: None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    pub default_value: Option<String>,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default_value: None,
        }
    }
}

/// How a method is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodScope {
    /// Called on an instance
    #[default]
    Instance,
    /// Called without an instance
    Static,
    /// Overridable per class; dispatched through the instance's class
    Virtual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamDescriptor>,
    /// Absent for `Void`
    pub returns: Option<DeclaredType>,
    pub scope: MethodScope,
    pub is_const: bool,
    pub is_vararg: bool,
    /// Method-bind hash; absent for virtual methods
    pub hash: Option<u32>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            scope: MethodScope::Instance,
            is_const: false,
            is_vararg: false,
            hash: None,
        }
    }

    /// Whether any parameter or the return type uses a raw pointer
    pub fn uses_pointers(&self) -> bool {
        self.params.iter().any(|p| p.declared_type.contains_pointer())
            || self.returns.as_ref().is_some_and(DeclaredType::contains_pointer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDescriptor {
    pub name: String,
    pub params: Vec<ParamDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub is_bitfield: bool,
    pub values: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantDescriptor {
    pub name: String,
    pub value: i64,
}

/// A data member of a builtin value type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
}

/// A builtin constructor, addressed by its engine index
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    pub index: u32,
    pub params: Vec<ParamDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDescriptor {
    pub operator: VariantOperator,
    /// Absent for unary operators
    pub right: Option<DeclaredType>,
    pub returns: DeclaredType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinConstantDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    /// Engine constructor syntax, `"Vector2(0, 0)"`
    pub value: String,
}

impl BuiltinConstantDescriptor {
    /// Type name and arguments of the constructor syntax in `value`.
    ///
    /// `"Vector2(inf, 0)"` gives `("Vector2", ["inf", "0"])`.
    pub fn constructor_call(&self) -> Option<(&str, Vec<&str>)> {
        let open = self.value.find('(')?;
        let inner = self.value[open + 1..].strip_suffix(')')?;
        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };
        Some((self.value[..open].trim(), args))
    }
}

/// A global engine function
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityFunction {
    pub name: String,
    /// `"math"`, `"random"` or `"general"`
    pub category: String,
    pub params: Vec<ParamDescriptor>,
    pub returns: Option<DeclaredType>,
    pub is_vararg: bool,
    pub hash: Option<u32>,
}

impl UtilityFunction {
    pub fn uses_pointers(&self) -> bool {
        self.params.iter().any(|p| p.declared_type.contains_pointer())
            || self.returns.as_ref().is_some_and(DeclaredType::contains_pointer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    /// Absent only for the root class
    pub parent: Option<String>,
    pub is_ref_counted: bool,
    pub is_instantiable: bool,
    pub api_type: ApiType,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
    pub signals: Vec<SignalDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub constants: Vec<ConstantDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            is_ref_counted: false,
            is_instantiable: true,
            api_type: ApiType::Core,
            methods: Vec::new(),
            properties: Vec::new(),
            signals: Vec::new(),
            enums: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn enum_descriptor(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinDescriptor {
    /// Engine name (`"String"`, `"Vector2"`)
    pub name: String,
    pub variant_type: VariantType,
    pub methods: Vec<MethodDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub members: Vec<MemberDescriptor>,
    pub is_keyed: bool,
    pub indexing_return_type: Option<DeclaredType>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub operators: Vec<OperatorDescriptor>,
    pub constants: Vec<BuiltinConstantDescriptor>,
}

impl BuiltinDescriptor {
    /// Name of the runtime type representing this builtin
    pub fn host_name(&self) -> &'static str {
        self.variant_type.host_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonDescriptor {
    pub name: String,
    pub class: String,
}

/// The complete reflection surface of one engine version
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub header: Header,
    pub classes: Vec<ClassDescriptor>,
    pub builtins: Vec<BuiltinDescriptor>,
    pub global_enums: Vec<EnumDescriptor>,
    pub singletons: Vec<SingletonDescriptor>,
    pub utility_functions: Vec<UtilityFunction>,
    class_index: HashMap<String, usize>,
    builtin_index: HashMap<String, usize>,
}

impl Schema {
    /// Load a schema from an `extension_api.json` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    /// Load a schema from an `extension_api.json` string
    pub fn load_from_str(json: &str) -> Result<Self, SchemaError> {
        let api: ExtensionApi = serde_json::from_str(json)?;
        Self::from_api(api)
    }

    /// Convert the raw API layout into the descriptor model
    pub fn from_api(api: ExtensionApi) -> Result<Self, SchemaError> {
        let header = Header {
            version_major: api.header.version_major,
            version_minor: api.header.version_minor,
            version_patch: api.header.version_patch,
            version_status: api.header.version_status,
            version_full_name: api.header.version_full_name,
        };

        let classes = api.classes.into_iter().map(convert_class).collect();

        let builtins = api
            .builtin_classes
            .into_iter()
            .filter_map(|builtin| {
                // Scalars stay in the model; emitters decide what they produce
                let Some(variant_type) = VariantType::from_engine_name(&builtin.name) else {
                    tracing::warn!("Skipping builtin `{}` with no variant kind", builtin.name);
                    return None;
                };
                Some(convert_builtin(builtin, variant_type))
            })
            .collect();

        let global_enums = api.global_enums.into_iter().map(convert_enum).collect();

        let singletons = api
            .singletons
            .into_iter()
            .map(|s| SingletonDescriptor {
                name: s.name,
                class: s.ty,
            })
            .collect();

        let mut schema = Self::new(header, classes, builtins, global_enums, singletons)?;
        schema.utility_functions = api
            .utility_functions
            .into_iter()
            .map(|f| UtilityFunction {
                returns: f.return_type.as_deref().map(|ty| DeclaredType::parse_engine(ty, None)),
                params: f.arguments.into_iter().map(convert_param).collect(),
                category: f.category,
                is_vararg: f.is_vararg,
                hash: f.hash,
                name: f.name,
            })
            .collect();

        tracing::info!(
            "Loaded schema {}: {} classes, {} builtins, {} global enums",
            schema.header.version_full_name,
            schema.classes.len(),
            schema.builtins.len(),
            schema.global_enums.len()
        );

        Ok(schema)
    }

    /// Build a schema from already-constructed descriptors, validating the
    /// inheritance graph.
    pub fn new(
        header: Header,
        classes: Vec<ClassDescriptor>,
        builtins: Vec<BuiltinDescriptor>,
        global_enums: Vec<EnumDescriptor>,
        singletons: Vec<SingletonDescriptor>,
    ) -> Result<Self, SchemaError> {
        let mut class_index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if class_index.insert(class.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateClass(class.name.clone()));
            }
        }

        let mut builtin_index = HashMap::with_capacity(builtins.len());
        for (i, builtin) in builtins.iter().enumerate() {
            if builtin_index.insert(builtin.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateBuiltin(builtin.name.clone()));
            }
        }

        let schema = Self {
            header,
            classes,
            builtins,
            global_enums,
            singletons,
            utility_functions: Vec::new(),
            class_index,
            builtin_index,
        };
        schema.check_inheritance()?;
        Ok(schema)
    }

    /// Every parent chain must terminate at the root or at a class defined
    /// outside this schema.
    fn check_inheritance(&self) -> Result<(), SchemaError> {
        for class in &self.classes {
            let mut seen = HashSet::new();
            seen.insert(class.name.as_str());
            let mut current = class.parent.as_deref();
            while let Some(parent) = current {
                if !seen.insert(parent) {
                    return Err(SchemaError::CyclicInheritance(class.name.clone()));
                }
                current = self.class(parent).and_then(|c| c.parent.as_deref());
            }
        }
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.class_index.get(name).map(|&i| &self.classes[i])
    }

    pub fn builtin(&self, name: &str) -> Option<&BuiltinDescriptor> {
        self.builtin_index.get(name).map(|&i| &self.builtins[i])
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.class_index.contains_key(name)
    }

    /// Ancestors of a class, nearest first
    pub fn ancestors<'a>(&'a self, name: &str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut current = self.class(name).and_then(|c| c.parent.as_deref());
        while let Some(parent) = current {
            chain.push(parent);
            current = self.class(parent).and_then(|c| c.parent.as_deref());
        }
        chain
    }

    /// Whether `name` is `ancestor` or inherits from it
    pub fn inherits_from(&self, name: &str, ancestor: &str) -> bool {
        name == ancestor || self.ancestors(name).contains(&ancestor)
    }

    pub fn is_ref_counted(&self, name: &str) -> Option<bool> {
        self.class(name).map(|c| c.is_ref_counted)
    }

    pub fn singleton(&self, class: &str) -> Option<&SingletonDescriptor> {
        self.singletons.iter().find(|s| s.class == class)
    }

    /// Look up an enum by the name used in `enum::` type strings: either a
    /// global enum (`"Error"`) or a class-scoped one (`"Node.ProcessMode"`).
    pub fn find_enum(&self, qualified: &str) -> Option<&EnumDescriptor> {
        // Some global enums are themselves dotted ("Variant.Type")
        if let Some(global) = self.global_enums.iter().find(|e| e.name == qualified) {
            return Some(global);
        }
        match qualified.split_once('.') {
            Some((owner, name)) => self
                .class(owner)
                .and_then(|c| c.enum_descriptor(name))
                .or_else(|| {
                    self.builtin(owner)
                        .and_then(|b| b.enums.iter().find(|e| e.name == name))
                }),
            None => None,
        }
    }
}

fn convert_enum(raw: api::ApiEnum) -> EnumDescriptor {
    EnumDescriptor {
        name: raw.name,
        is_bitfield: raw.is_bitfield,
        values: raw.values.into_iter().map(|v| (v.name, v.value)).collect(),
    }
}

fn convert_param(raw: api::ApiArgument) -> ParamDescriptor {
    ParamDescriptor {
        declared_type: DeclaredType::parse_engine(&raw.ty, raw.meta.as_deref()),
        name: raw.name,
        default_value: raw.default_value,
    }
}

fn convert_class(raw: api::ApiClass) -> ClassDescriptor {
    let methods = raw
        .methods
        .into_iter()
        .map(|m| MethodDescriptor {
            scope: if m.is_virtual {
                MethodScope::Virtual
            } else if m.is_static {
                MethodScope::Static
            } else {
                MethodScope::Instance
            },
            returns: m
                .return_value
                .map(|r| DeclaredType::parse_engine(&r.ty, r.meta.as_deref())),
            params: m.arguments.into_iter().map(convert_param).collect(),
            is_const: m.is_const,
            is_vararg: m.is_vararg,
            hash: m.hash,
            name: m.name,
        })
        .collect();

    let properties = raw
        .properties
        .into_iter()
        .map(|p| PropertyDescriptor {
            declared_type: DeclaredType::parse_engine(&p.ty, None),
            getter: p.getter,
            setter: p.setter.filter(|s| !s.is_empty()),
            index: p.index,
            ..PropertyDescriptor::new(p.name, DeclaredType::named("Variant"))
        })
        .collect();

    let signals = raw
        .signals
        .into_iter()
        .map(|s| SignalDescriptor {
            name: s.name,
            params: s.arguments.into_iter().map(convert_param).collect(),
        })
        .collect();

    ClassDescriptor {
        name: raw.name,
        parent: raw.inherits,
        is_ref_counted: raw.is_refcounted,
        is_instantiable: raw.is_instantiable,
        api_type: if raw.api_type == "editor" {
            ApiType::Editor
        } else {
            ApiType::Core
        },
        methods,
        properties,
        signals,
        enums: raw.enums.into_iter().map(convert_enum).collect(),
        constants: raw
            .constants
            .into_iter()
            .map(|c| ConstantDescriptor {
                name: c.name,
                value: c.value,
            })
            .collect(),
    }
}

fn convert_builtin(raw: api::ApiBuiltinClass, variant_type: VariantType) -> BuiltinDescriptor {
    let methods = raw
        .methods
        .into_iter()
        .map(|m| MethodDescriptor {
            scope: if m.is_static {
                MethodScope::Static
            } else {
                MethodScope::Instance
            },
            returns: m
                .return_type
                .as_deref()
                .map(|ty| DeclaredType::parse_engine(ty, None)),
            params: m.arguments.into_iter().map(convert_param).collect(),
            is_const: m.is_const,
            is_vararg: m.is_vararg,
            hash: m.hash,
            name: m.name,
        })
        .collect();

    let operators = raw
        .operators
        .into_iter()
        .filter_map(|op| {
            let Some(operator) = VariantOperator::from_engine_name(&op.name) else {
                tracing::warn!("Skipping unknown operator `{}` of `{}`", op.name, raw.name);
                return None;
            };
            Some(OperatorDescriptor {
                operator,
                right: op
                    .right_type
                    .as_deref()
                    .filter(|ty| !ty.is_empty())
                    .map(|ty| DeclaredType::parse_engine(ty, None)),
                returns: DeclaredType::parse_engine(&op.return_type, None),
            })
        })
        .collect();

    BuiltinDescriptor {
        name: raw.name,
        variant_type,
        methods,
        enums: raw.enums.into_iter().map(convert_enum).collect(),
        members: raw
            .members
            .into_iter()
            .map(|m| MemberDescriptor {
                declared_type: DeclaredType::parse_engine(&m.ty, m.meta.as_deref()),
                name: m.name,
            })
            .collect(),
        is_keyed: raw.is_keyed,
        indexing_return_type: raw
            .indexing_return_type
            .as_deref()
            .map(|ty| DeclaredType::parse_engine(ty, None)),
        constructors: raw
            .constructors
            .into_iter()
            .map(|c| ConstructorDescriptor {
                index: c.index,
                params: c.arguments.into_iter().map(convert_param).collect(),
            })
            .collect(),
        operators,
        constants: raw
            .constants
            .into_iter()
            .map(|c| BuiltinConstantDescriptor {
                declared_type: DeclaredType::parse_engine(&c.ty, None),
                name: c.name,
                value: c.value,
            })
            .collect(),
    }
}
