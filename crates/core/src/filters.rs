//! Filter files
//!
//! The planner hands each module's class, available-class and builtin lists to
//! the generator process as plain text files, one name per line.

use std::io;
use std::path::{Path, PathBuf};

use crate::output::write_if_changed;
use crate::partition::{uniqued, ModulePlan};

/// The name lists one generator run works from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub classes: Vec<String>,
    pub available_classes: Vec<String>,
    pub builtins: Vec<String>,
    pub preamble: String,
}

impl FilterSet {
    pub fn from_plan(plan: &ModulePlan) -> Self {
        Self {
            classes: plan.generated_classes.clone(),
            available_classes: plan.available_classes.clone(),
            builtins: plan.builtins.clone(),
            preamble: plan.preamble.clone(),
        }
    }

    /// Read the filter files of `module` from `dir`
    pub fn read(dir: &Path, module: &str) -> io::Result<Self> {
        let paths = FilterPaths::new(dir, module);
        let preamble = match std::fs::read_to_string(&paths.preamble) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            classes: read_filter(&paths.classes)?,
            available_classes: read_filter(&paths.available_classes)?,
            builtins: read_filter(&paths.builtins)?,
            preamble,
        })
    }
}

/// File names of one module's filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPaths {
    pub classes: PathBuf,
    pub available_classes: PathBuf,
    pub builtins: PathBuf,
    pub preamble: PathBuf,
}

impl FilterPaths {
    pub fn new(dir: &Path, module: &str) -> Self {
        Self {
            classes: dir.join(format!("{}-classes.txt", module)),
            available_classes: dir.join(format!("{}-available-classes.txt", module)),
            builtins: dir.join(format!("{}-builtins.txt", module)),
            preamble: dir.join(format!("{}-preamble.txt", module)),
        }
    }
}

fn render_list(names: &[String]) -> String {
    let mut out = names.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Write the filter files of `plan` into `dir`. Returns the number of files
/// whose contents changed.
pub fn write_module_filters(dir: &Path, plan: &ModulePlan) -> io::Result<usize> {
    let paths = FilterPaths::new(dir, &plan.module);
    let mut changed = 0;

    for (path, names) in [
        (&paths.classes, &plan.generated_classes),
        (&paths.available_classes, &plan.available_classes),
        (&paths.builtins, &plan.builtins),
    ] {
        if write_if_changed(path, render_list(names))? {
            changed += 1;
        }
    }

    if !plan.preamble.is_empty() && write_if_changed(&paths.preamble, &plan.preamble)? {
        changed += 1;
    }

    tracing::debug!("Filters for {}: {} changed", plan.module, changed);
    Ok(changed)
}

/// Read a filter file: one name per line, blanks and `#` comments skipped, a
/// trailing `.rs` stripped, duplicates dropped.
pub fn read_filter(path: &Path) -> io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_filter(&text))
}

pub fn parse_filter(text: &str) -> Vec<String> {
    uniqued(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.strip_suffix(".rs").unwrap_or(line)),
    )
}
