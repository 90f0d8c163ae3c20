//! Config path resolution
//!
//! Handles locating the module configuration and the directories derived from
//! a build's working directory.

use std::path::{Path, PathBuf};

/// Conventional file name of the module configuration
pub const DEFAULT_CONFIG_NAME: &str = "gdbind.toml";

/// Directory the per-module filter files are written to.
///
/// Path: `{workdir}/filters/`
pub fn filters_dir(workdir: &Path) -> PathBuf {
    workdir.join("filters")
}

/// Directory a module's generated sources are written to.
///
/// Path: `{workdir}/{module}/`
pub fn module_output_dir(workdir: &Path, module: &str) -> PathBuf {
    workdir.join(module)
}

/// Walk up from `start` looking for [`DEFAULT_CONFIG_NAME`]
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let workdir = PathBuf::from("/build/gen");
        assert!(filters_dir(&workdir).ends_with("gen/filters"));
        assert!(module_output_dir(&workdir, "godot_core").ends_with("gen/godot_core"));
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_config(&nested), None);

        let config = dir.path().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&config, "").unwrap();
        assert_eq!(find_config(&nested), Some(config));
    }
}
