//! Subcommand implementations

pub mod build;
pub mod generate;
pub mod plan;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    pub fn api_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../schema/fixtures/mini_extension_api.json")
    }

    pub const CONFIG: &str = r#"
[generation]
umbrella_module = "godot"
layout = "per_type"

[tiers]
core = ["Object", "RefCounted"]
servers = ["RenderingServer"]

[[modules]]
name = "godot_runtime"
native_classes = ["Object", "RefCounted", "Engine", "RenderingServer"]
builtins = ["Vector2", "String"]

[[modules]]
name = "godot_core"
native_classes = ["Node", "CanvasItem", "Node2D", "Resource", "Texture2D"]
dependencies = ["godot_runtime"]
preamble = "use crate::prelude::*;"

[[modules]]
name = "godot"
native_classes = ["EditorPlugin"]
dependencies = ["godot_runtime"]
"#;

    /// Write the sample configuration into `dir`
    pub fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("gdbind.toml");
        std::fs::write(&path, content).unwrap();
        path
    }
}
