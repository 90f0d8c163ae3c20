//! Raw `extension_api.json` layout
//!
//! These structs mirror the JSON file one-to-one and are only used as a parsing
//! stage; [`crate::Schema`] converts them into the descriptor model. Keys the
//! generator has no use for are ignored by serde.

use serde::Deserialize;

/// Top level of `extension_api.json`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtensionApi {
    pub header: ApiHeader,
    pub global_enums: Vec<ApiEnum>,
    pub utility_functions: Vec<ApiUtilityFunction>,
    pub builtin_classes: Vec<ApiBuiltinClass>,
    pub classes: Vec<ApiClass>,
    pub singletons: Vec<ApiSingleton>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiHeader {
    pub version_major: u32,
    pub version_minor: u32,
    pub version_patch: u32,
    pub version_status: String,
    pub version_full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiEnum {
    pub name: String,
    #[serde(default)]
    pub is_bitfield: bool,
    #[serde(default)]
    pub values: Vec<ApiEnumValue>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEnumValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApiBuiltinClass {
    pub name: String,
    #[serde(default)]
    pub is_keyed: bool,
    #[serde(default)]
    pub indexing_return_type: Option<String>,
    #[serde(default)]
    pub methods: Vec<ApiBuiltinMethod>,
    #[serde(default)]
    pub members: Vec<ApiArgument>,
    #[serde(default)]
    pub enums: Vec<ApiEnum>,
    #[serde(default)]
    pub constructors: Vec<ApiConstructor>,
    #[serde(default)]
    pub operators: Vec<ApiOperator>,
    #[serde(default)]
    pub constants: Vec<ApiBuiltinConstant>,
}

#[derive(Debug, Deserialize)]
pub struct ApiConstructor {
    pub index: u32,
    #[serde(default)]
    pub arguments: Vec<ApiArgument>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOperator {
    pub name: String,
    #[serde(default)]
    pub right_type: Option<String>,
    pub return_type: String,
}

/// A builtin constant; `value` is engine constructor syntax (`"Vector2(0, 0)"`)
#[derive(Debug, Deserialize)]
pub struct ApiBuiltinConstant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUtilityFunction {
    pub name: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_vararg: bool,
    #[serde(default)]
    pub hash: Option<u32>,
    #[serde(default)]
    pub arguments: Vec<ApiArgument>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBuiltinMethod {
    pub name: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub is_vararg: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub hash: Option<u32>,
    #[serde(default)]
    pub arguments: Vec<ApiArgument>,
}

#[derive(Debug, Deserialize)]
pub struct ApiArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiClass {
    pub name: String,
    #[serde(default)]
    pub is_refcounted: bool,
    #[serde(default)]
    pub is_instantiable: bool,
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default = "default_api_type")]
    pub api_type: String,
    #[serde(default)]
    pub enums: Vec<ApiEnum>,
    #[serde(default)]
    pub methods: Vec<ApiClassMethod>,
    #[serde(default)]
    pub properties: Vec<ApiProperty>,
    #[serde(default)]
    pub signals: Vec<ApiSignal>,
    #[serde(default)]
    pub constants: Vec<ApiEnumValue>,
}

fn default_api_type() -> String {
    "core".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ApiClassMethod {
    pub name: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_vararg: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub hash: Option<u32>,
    #[serde(default)]
    pub return_value: Option<ApiReturnValue>,
    #[serde(default)]
    pub arguments: Vec<ApiArgument>,
}

#[derive(Debug, Deserialize)]
pub struct ApiReturnValue {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub meta: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProperty {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    #[serde(default)]
    pub setter: Option<String>,
    #[serde(default)]
    pub getter: String,
    #[serde(default)]
    pub index: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSignal {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ApiArgument>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSingleton {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}
