//! `gdbind build` - Plan and generate every module

use std::path::Path;

use anyhow::Context;
use gdbind_codegen::{generate_module, WriteReport};
use gdbind_core::config::filters_dir;
use gdbind_core::filters::write_module_filters;
use gdbind_core::{FileLayout, ModulePlan};
use tracing::{info, warn};

use crate::commands::generate::load_schema;
use crate::commands::plan::load_plans;

pub fn execute(config_path: &Path, api: &Path, workdir: &Path, combined: bool) -> anyhow::Result<WriteReport> {
    let (config, plans) = load_plans(config_path)?;
    let schema = load_schema(api)?;
    let tiers = config.tier_assignment(Some(&schema));

    let filters = filters_dir(workdir);
    for plan in plans.iter() {
        write_module_filters(&filters, plan)
            .with_context(|| format!("writing filters of module `{}`", plan.module))?;
    }

    // A bucketed umbrella is the only module compiled; the split modules are
    // skipped entirely.
    let umbrella_only = combined || plans.umbrella().is_some_and(|u| u.layout == FileLayout::Buckets);
    let selected: Vec<ModulePlan> = match (umbrella_only, plans.umbrella()) {
        (true, Some(umbrella)) => {
            let mut umbrella = umbrella.clone();
            umbrella.layout = FileLayout::Buckets;
            vec![umbrella]
        }
        (true, None) => {
            warn!("No umbrella module is configured; generating every module");
            plans.iter().cloned().collect()
        }
        (false, _) => plans.iter().cloned().collect(),
    };

    let mut report = WriteReport::default();
    for plan in &selected {
        let written = generate_module(&schema, plan, &tiers, &config.generation, workdir)
            .with_context(|| format!("generating module `{}`", plan.module))?;
        report.merge(written);
    }

    info!(
        "Built {} modules into {}: {} files written, {} unchanged",
        selected.len(),
        workdir.display(),
        report.written,
        report.unchanged
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn test_build_every_module() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_config(dir.path(), fixtures::CONFIG);
        let workdir = dir.path().join("gen");

        let report = execute(&config, &fixtures::api_path(), &workdir, false).unwrap();
        assert!(report.written > 0);
        for module in ["godot_runtime", "godot_core", "godot"] {
            assert!(workdir.join(module).join("mod.rs").is_file(), "{module}");
        }
        assert!(workdir.join("filters/godot_core-classes.txt").is_file());

        // Tiers from the configuration drive the entry point
        let runtime = std::fs::read_to_string(workdir.join("godot_runtime/mod.rs")).unwrap();
        assert!(runtime.contains("InitializationLevel::Core"));
        assert!(runtime.contains("InitializationLevel::Servers"));

        let again = execute(&config, &fixtures::api_path(), &workdir, false).unwrap();
        assert_eq!(again.written, 0);
    }

    #[test]
    fn test_build_combined_writes_umbrella_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_config(dir.path(), fixtures::CONFIG);
        let workdir = dir.path().join("gen");

        execute(&config, &fixtures::api_path(), &workdir, true).unwrap();
        assert!(workdir.join("godot/godot_n.rs").is_file());
        assert!(!workdir.join("godot_core").exists());
        assert!(!workdir.join("godot_runtime").exists());
    }
}
