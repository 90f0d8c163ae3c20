//! Engine initialization tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A phase of the engine's startup sequence.
///
/// Tiers are totally ordered: a class registered at some tier may only depend on
/// classes registered at the same or an earlier tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InitializationLevel {
    Core,
    Servers,
    #[default]
    Scene,
    Editor,
}

impl InitializationLevel {
    /// All tiers in startup order
    pub const ALL: [InitializationLevel; 4] = [
        InitializationLevel::Core,
        InitializationLevel::Servers,
        InitializationLevel::Scene,
        InitializationLevel::Editor,
    ];

    /// Lowercase name used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            InitializationLevel::Core => "core",
            InitializationLevel::Servers => "servers",
            InitializationLevel::Scene => "scene",
            InitializationLevel::Editor => "editor",
        }
    }

    /// Engine ordinal of this tier
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for InitializationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InitializationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InitializationLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown initialization level: {s}"))
    }
}
