//! `gdbind generate` - Write one module from filter files

use std::path::{Path, PathBuf};

use anyhow::Context;
use gdbind_codegen::{generate_module, WriteReport};
use gdbind_core::filters::read_filter;
use gdbind_core::partition::uniqued;
use gdbind_core::{FileLayout, ModuleConfig, ModulePlan};
use gdbind_schema::Schema;
use tracing::info;

/// Inputs of one generator run
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub api: PathBuf,
    pub out_dir: PathBuf,
    pub module: String,
    pub class_filter: PathBuf,
    pub available_class_filter: PathBuf,
    pub builtin_filter: PathBuf,
    pub preamble_file: Option<PathBuf>,
    pub combined: bool,
    pub tiers: Option<PathBuf>,
}

pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    Schema::load_from_file(path).with_context(|| format!("loading engine API {}", path.display()))
}

fn read_list(path: &Path) -> anyhow::Result<Vec<String>> {
    read_filter(path).with_context(|| format!("reading filter {}", path.display()))
}

/// The plan described by the filter files of `args`
fn plan_from_filters(args: &GenerateArgs) -> anyhow::Result<ModulePlan> {
    let generated_classes = read_list(&args.class_filter)?;
    let available = read_list(&args.available_class_filter)?;
    let builtins = read_list(&args.builtin_filter)?;
    let preamble = match &args.preamble_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading preamble {}", path.display()))?,
        None => String::new(),
    };

    Ok(ModulePlan {
        module: args.module.clone(),
        available_classes: uniqued(generated_classes.iter().chain(&available)),
        generated_classes,
        builtins,
        preamble,
        dependencies: Vec::new(),
        is_umbrella: args.combined,
        layout: if args.combined {
            FileLayout::Buckets
        } else {
            FileLayout::PerType
        },
    })
}

pub fn execute(args: &GenerateArgs) -> anyhow::Result<WriteReport> {
    let schema = load_schema(&args.api)?;
    let config = match &args.tiers {
        Some(path) => ModuleConfig::load_from_file(path)
            .with_context(|| format!("loading module configuration {}", path.display()))?,
        None => ModuleConfig::default(),
    };
    let plan = plan_from_filters(args)?;
    let tiers = config.tier_assignment(Some(&schema));

    let report = generate_module(&schema, &plan, &tiers, &config.generation, &args.out_dir)
        .with_context(|| format!("generating module `{}`", plan.module))?;
    info!(
        "Generated `{}`: {} classes, {} builtins",
        plan.module,
        plan.generated_classes.len(),
        plan.builtins.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    fn write_filter(dir: &Path, name: &str, lines: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, lines).unwrap();
        path
    }

    fn args(dir: &Path, combined: bool) -> GenerateArgs {
        GenerateArgs {
            api: fixtures::api_path(),
            out_dir: dir.join("out"),
            module: "godot_runtime".to_string(),
            class_filter: write_filter(dir, "classes.txt", "Object\nRefCounted\n# comment\n\nEngine.rs\n"),
            available_class_filter: write_filter(dir, "available.txt", "Object\nRefCounted\nEngine\n"),
            builtin_filter: write_filter(dir, "builtins.txt", "Vector2\n"),
            preamble_file: Some(write_filter(dir, "preamble.txt", "use crate::prelude::*;\n")),
            combined,
            tiers: None,
        }
    }

    #[test]
    fn test_generate_per_type_module() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), false);

        let report = execute(&args).unwrap();
        assert!(report.written > 0);
        assert_eq!(report.unchanged, 0);

        let root = args.out_dir.join("godot_runtime");
        assert!(root.join("classes/engine.rs").is_file());
        assert!(root.join("builtins/vector2.rs").is_file());
        let module = std::fs::read_to_string(root.join("mod.rs")).unwrap();
        assert!(module.contains("use crate::prelude::*;"));
        assert!(module.contains("pub fn initialize_level"));

        // A second run leaves every file alone
        let again = execute(&args).unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(again.unchanged, report.written);
    }

    #[test]
    fn test_generate_combined_uses_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), true);
        execute(&args).unwrap();

        let root = args.out_dir.join("godot_runtime");
        assert!(root.join("godot_runtime_e.rs").is_file());
        assert!(root.join("godot_runtime_z.rs").is_file());
        assert!(!root.join("classes").exists());
    }

    #[test]
    fn test_unknown_class_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), false);
        args.class_filter = write_filter(dir.path(), "classes.txt", "Object\nSpaceship\n");
        let err = execute(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("Spaceship"));
    }
}
