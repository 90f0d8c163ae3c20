//! Module configuration
//!
//! A single TOML file declares the output modules, their native class lists and
//! dependencies, the umbrella module, and the initialization tier of classes:
//!
//! ```toml
//! [generation]
//! foundational_class = "Object"
//! umbrella_module = "godot"
//! layout = "auto"
//!
//! [tiers]
//! default = "scene"
//! core = ["Object", "RefCounted"]
//!
//! [[modules]]
//! name = "godot_runtime"
//! native_classes = ["Object", "RefCounted"]
//! builtins = ["Vector2"]
//! ```

mod loader;

use std::collections::HashSet;
use std::path::Path;

use gdbind_schema::{ApiType, InitializationLevel, Schema};
use serde::{Deserialize, Serialize};

use crate::levels::TierAssignment;
use crate::partition::{FileLayout, ModuleDefinition, PartitionOptions};

pub use loader::{filters_dir, find_config, module_output_dir, DEFAULT_CONFIG_NAME};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A setting names a module that is not declared
    #[error("unknown module `{0}`")]
    UnknownModule(String),

    /// Two `[[modules]]` entries share a name
    #[error("module `{0}` is declared more than once")]
    DuplicateModule(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which file layout the umbrella module uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutChoice {
    /// Buckets on platforms with tight toolchain limits, per type elsewhere
    #[default]
    Auto,
    PerType,
    Buckets,
}

impl LayoutChoice {
    pub fn resolve(self) -> FileLayout {
        match self {
            Self::Auto if cfg!(windows) => FileLayout::Buckets,
            Self::Auto | Self::PerType => FileLayout::PerType,
            Self::Buckets => FileLayout::Buckets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// The runtime's universal root class
    pub foundational_class: String,

    /// Module that aggregates everything its dependencies do not provide
    pub umbrella_module: Option<String>,

    pub layout: LayoutChoice,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            foundational_class: "Object".to_string(),
            umbrella_module: None,
            layout: LayoutChoice::Auto,
        }
    }
}

/// Explicit tier lists; anything unlisted registers at `default`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub default: InitializationLevel,
    pub core: Vec<String>,
    pub servers: Vec<String>,
    pub scene: Vec<String>,
    pub editor: Vec<String>,
}

/// The whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub generation: GenerationSettings,
    pub tiers: TierSettings,
    pub modules: Vec<ModuleDefinition>,
}

impl ModuleConfig {
    /// Load and validate a configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&content)?;
        tracing::debug!(
            "Loaded module config from {:?} ({} modules)",
            path,
            config.modules.len()
        );
        Ok(config)
    }

    pub fn load_from_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved module config to {:?}", path);
        Ok(())
    }

    /// Module names are unique and the umbrella, if set, is declared
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateModule(module.name.clone()));
            }
        }
        if let Some(umbrella) = &self.generation.umbrella_module {
            if !seen.contains(umbrella.as_str()) {
                return Err(ConfigError::UnknownModule(umbrella.clone()));
            }
        }
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn partition_options(&self) -> PartitionOptions {
        PartitionOptions {
            umbrella: self.generation.umbrella_module.clone(),
            foundational_class: self.generation.foundational_class.clone(),
            umbrella_layout: self.generation.layout.resolve(),
        }
    }

    /// Tier of every class. Explicit lists win; classes of the editor API
    /// surface default to the editor tier.
    pub fn tier_assignment(&self, schema: Option<&Schema>) -> TierAssignment {
        let mut tiers = TierAssignment::new(self.tiers.default);
        let lists = [
            (InitializationLevel::Core, &self.tiers.core),
            (InitializationLevel::Servers, &self.tiers.servers),
            (InitializationLevel::Scene, &self.tiers.scene),
            (InitializationLevel::Editor, &self.tiers.editor),
        ];
        for (level, classes) in lists {
            for class in classes {
                tiers.assign(class.as_str(), level);
            }
        }

        if let Some(schema) = schema {
            for class in schema.classes.iter().filter(|c| c.api_type == ApiType::Editor) {
                tiers.assign_if_absent(&class.name, InitializationLevel::Editor);
            }
        }
        tiers
    }
}
