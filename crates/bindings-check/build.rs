use std::env;
use std::fs;
use std::path::PathBuf;

use gdbind_codegen::generate_module;
use gdbind_core::config::GenerationSettings;
use gdbind_core::{FileLayout, ModulePlan, TierAssignment};
use gdbind_schema::{InitializationLevel, Schema};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let fixture = manifest_dir.join("../schema/fixtures/mini_extension_api.json");
    println!("cargo:rerun-if-changed={}", fixture.display());
    println!("cargo:rerun-if-changed=build.rs");

    let schema = Schema::load_from_file(&fixture).unwrap();
    let classes: Vec<String> = schema.classes.iter().map(|c| c.name.clone()).collect();
    let builtins: Vec<String> = schema.builtins.iter().map(|b| b.name.clone()).collect();
    let tiers = TierAssignment::new(InitializationLevel::Scene)
        .with("Object", InitializationLevel::Core)
        .with("EditorPlugin", InitializationLevel::Editor);
    let settings = GenerationSettings::default();

    // Every class and builtin of the fixture, once per file layout
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut bindings = String::new();
    for (module, layout) in [("per_type", FileLayout::PerType), ("buckets", FileLayout::Buckets)] {
        let plan = ModulePlan {
            module: module.to_string(),
            generated_classes: classes.clone(),
            available_classes: classes.clone(),
            builtins: builtins.clone(),
            preamble: String::new(),
            dependencies: Vec::new(),
            is_umbrella: false,
            layout,
        };
        generate_module(&schema, &plan, &tiers, &settings, &out_dir).unwrap();

        let root = out_dir.join(module).join("mod.rs");
        bindings.push_str(&format!("#[path = {:?}]\npub mod {};\n", root.display().to_string(), module));
    }

    fs::write(out_dir.join("bindings.rs"), bindings).unwrap();
}
