//! `gdbind plan` - Partition modules and write their filter files

use std::path::Path;

use anyhow::Context;
use gdbind_core::config::filters_dir;
use gdbind_core::filters::write_module_filters;
use gdbind_core::{partition, ModuleConfig, ModulePlanSet};
use tracing::info;

/// Load `config_path` and partition its modules
pub fn load_plans(config_path: &Path) -> anyhow::Result<(ModuleConfig, ModulePlanSet)> {
    let config = ModuleConfig::load_from_file(config_path)
        .with_context(|| format!("loading module configuration {}", config_path.display()))?;
    let plans = partition(&config.modules, &config.partition_options())?;
    Ok((config, plans))
}

pub fn execute(config_path: &Path, workdir: &Path) -> anyhow::Result<ModulePlanSet> {
    let (_, plans) = load_plans(config_path)?;

    let dir = filters_dir(workdir);
    let mut changed = 0;
    for plan in plans.iter() {
        changed += write_module_filters(&dir, plan)
            .with_context(|| format!("writing filters of module `{}`", plan.module))?;
    }

    info!(
        "Planned {} modules into {} ({} filter files changed)",
        plans.len(),
        dir.display(),
        changed
    );
    Ok(plans)
}
