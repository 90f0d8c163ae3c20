//! Property usage flags, property hints and method flags

use bitflags::bitflags;

bitflags! {
    /// How a registered property is stored, shown and serialized by the engine
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyUsage: u32 {
        const NONE = 0;
        const STORAGE = 1 << 1;
        const EDITOR = 1 << 2;
        const INTERNAL = 1 << 3;
        const CHECKABLE = 1 << 4;
        const CHECKED = 1 << 5;
        /// Registration entry is a property group marker
        const GROUP = 1 << 6;
        const CATEGORY = 1 << 7;
        /// Registration entry is a property subgroup marker
        const SUBGROUP = 1 << 8;
        const CLASS_IS_BITFIELD = 1 << 9;
        const NO_INSTANCE_STATE = 1 << 10;
        const RESTART_IF_CHANGED = 1 << 11;
        const SCRIPT_VARIABLE = 1 << 12;
        const STORE_IF_NULL = 1 << 13;
        const UPDATE_ALL_IF_MODIFIED = 1 << 14;
        const CLASS_IS_ENUM = 1 << 16;
        /// `Nil` is a legitimate value of this property, not "absent"
        const NIL_IS_VARIANT = 1 << 17;
        const ARRAY = 1 << 18;
        const READ_ONLY = 1 << 27;

        const DEFAULT = Self::STORAGE.bits() | Self::EDITOR.bits();
    }
}

impl Default for PropertyUsage {
    fn default() -> Self {
        Self::DEFAULT
    }
}

bitflags! {
    /// Method registration flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        const NORMAL = 1;
        const EDITOR = 1 << 1;
        const CONST = 1 << 2;
        const VIRTUAL = 1 << 3;
        const VARARG = 1 << 4;
        const STATIC = 1 << 5;

        const DEFAULT = Self::NORMAL.bits();
    }
}

impl Default for MethodFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Editor hint attached to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum PropertyHint {
    #[default]
    None = 0,
    Range = 1,
    Enum = 2,
    EnumSuggestion = 3,
    ExpEasing = 4,
    Link = 5,
    Flags = 6,
    Layers2DRender = 7,
    Layers2DPhysics = 8,
    Layers2DNavigation = 9,
    Layers3DRender = 10,
    Layers3DPhysics = 11,
    Layers3DNavigation = 12,
    File = 13,
    Dir = 14,
    GlobalFile = 15,
    GlobalDir = 16,
    ResourceType = 17,
    MultilineText = 18,
    Expression = 19,
    PlaceholderText = 20,
    ColorNoAlpha = 21,
    ObjectId = 22,
    TypeString = 23,
    NodePathToEditedNode = 24,
    ObjectTooBig = 25,
    NodePathValidTypes = 26,
    SaveFile = 27,
    GlobalSaveFile = 28,
    IntIsObjectId = 29,
    IntIsPointer = 30,
    ArrayType = 31,
    LocaleId = 32,
    LocalizableString = 33,
    NodeType = 34,
}

impl PropertyHint {
    /// Look up a hint by its snake_case name as written in attributes
    pub fn from_name(name: &str) -> Option<Self> {
        let hint = match name {
            "none" => Self::None,
            "range" => Self::Range,
            "enum" => Self::Enum,
            "enum_suggestion" => Self::EnumSuggestion,
            "exp_easing" => Self::ExpEasing,
            "link" => Self::Link,
            "flags" => Self::Flags,
            "layers_2d_render" => Self::Layers2DRender,
            "layers_2d_physics" => Self::Layers2DPhysics,
            "layers_2d_navigation" => Self::Layers2DNavigation,
            "layers_3d_render" => Self::Layers3DRender,
            "layers_3d_physics" => Self::Layers3DPhysics,
            "layers_3d_navigation" => Self::Layers3DNavigation,
            "file" => Self::File,
            "dir" => Self::Dir,
            "global_file" => Self::GlobalFile,
            "global_dir" => Self::GlobalDir,
            "resource_type" => Self::ResourceType,
            "multiline_text" => Self::MultilineText,
            "expression" => Self::Expression,
            "placeholder_text" => Self::PlaceholderText,
            "color_no_alpha" => Self::ColorNoAlpha,
            "object_id" => Self::ObjectId,
            "type_string" => Self::TypeString,
            "node_path_to_edited_node" => Self::NodePathToEditedNode,
            "object_too_big" => Self::ObjectTooBig,
            "node_path_valid_types" => Self::NodePathValidTypes,
            "save_file" => Self::SaveFile,
            "global_save_file" => Self::GlobalSaveFile,
            "int_is_object_id" => Self::IntIsObjectId,
            "int_is_pointer" => Self::IntIsPointer,
            "array_type" => Self::ArrayType,
            "locale_id" => Self::LocaleId,
            "localizable_string" => Self::LocalizableString,
            "node_type" => Self::NodeType,
            _ => return None,
        };
        Some(hint)
    }

    /// The snake_case name accepted by [`PropertyHint::from_name`]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Range => "range",
            Self::Enum => "enum",
            Self::EnumSuggestion => "enum_suggestion",
            Self::ExpEasing => "exp_easing",
            Self::Link => "link",
            Self::Flags => "flags",
            Self::Layers2DRender => "layers_2d_render",
            Self::Layers2DPhysics => "layers_2d_physics",
            Self::Layers2DNavigation => "layers_2d_navigation",
            Self::Layers3DRender => "layers_3d_render",
            Self::Layers3DPhysics => "layers_3d_physics",
            Self::Layers3DNavigation => "layers_3d_navigation",
            Self::File => "file",
            Self::Dir => "dir",
            Self::GlobalFile => "global_file",
            Self::GlobalDir => "global_dir",
            Self::ResourceType => "resource_type",
            Self::MultilineText => "multiline_text",
            Self::Expression => "expression",
            Self::PlaceholderText => "placeholder_text",
            Self::ColorNoAlpha => "color_no_alpha",
            Self::ObjectId => "object_id",
            Self::TypeString => "type_string",
            Self::NodePathToEditedNode => "node_path_to_edited_node",
            Self::ObjectTooBig => "object_too_big",
            Self::NodePathValidTypes => "node_path_valid_types",
            Self::SaveFile => "save_file",
            Self::GlobalSaveFile => "global_save_file",
            Self::IntIsObjectId => "int_is_object_id",
            Self::IntIsPointer => "int_is_pointer",
            Self::ArrayType => "array_type",
            Self::LocaleId => "locale_id",
            Self::LocalizableString => "localizable_string",
            Self::NodeType => "node_type",
        }
    }

    /// Raw engine value
    pub fn bits(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usage_is_storage_and_editor() {
        let usage = PropertyUsage::default();
        assert!(usage.contains(PropertyUsage::STORAGE));
        assert!(usage.contains(PropertyUsage::EDITOR));
        assert!(!usage.contains(PropertyUsage::NIL_IS_VARIANT));
        assert_eq!(usage.bits(), 6);
    }

    #[test]
    fn test_hint_names_round_trip() {
        for hint in [
            PropertyHint::None,
            PropertyHint::Range,
            PropertyHint::Enum,
            PropertyHint::ArrayType,
            PropertyHint::NodeType,
        ] {
            assert_eq!(PropertyHint::from_name(hint.name()), Some(hint));
        }
        assert_eq!(PropertyHint::from_name("bogus"), None);
        assert_eq!(PropertyHint::ArrayType.bits(), 31);
    }
}
