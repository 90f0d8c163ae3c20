//! Dependency partitioning
//!
//! The class list of an engine version is split across several output modules.
//! Each module generates the classes it natively owns and may reference the
//! classes owned by the modules it (transitively) depends on. One module can be
//! marked as the umbrella: it generates everything not provided by its own
//! dependencies in a single unit, which is the fallback used where many small
//! interdependent modules cannot be built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GenerateError, GenerateResult};

/// One output module as declared in the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleDefinition {
    pub name: String,
    /// Classes this module owns, in declaration order. May contain duplicates.
    pub native_classes: Vec<String>,
    /// Builtin value types this module owns
    pub builtins: Vec<String>,
    /// Text injected verbatim at the top of the generated unit
    pub preamble: String,
    /// Modules whose classes this module may reference
    pub dependencies: Vec<String>,
}

/// How a module's generated code is split into files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileLayout {
    /// One file per class and per builtin
    #[default]
    PerType,
    /// One file per first letter of the type name, `A` to `Z`
    Buckets,
}

impl FileLayout {
    /// Bucket keys of the constrained layout
    pub const BUCKETS: [char; 26] = [
        'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q',
        'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    ];

    /// Bucket a type name belongs to. Names not starting with an ASCII letter
    /// go to the first bucket.
    pub fn bucket_for(name: &str) -> char {
        name.chars()
            .next()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or(Self::BUCKETS[0])
    }
}

/// Partitioning settings taken from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Name of the umbrella module, if any
    pub umbrella: Option<String>,
    /// The runtime's universal root class
    pub foundational_class: String,
    /// Layout used by the umbrella module
    pub umbrella_layout: FileLayout,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            umbrella: None,
            foundational_class: "Object".to_string(),
            umbrella_layout: FileLayout::PerType,
        }
    }
}

/// What one module generates and may reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
    pub module: String,
    /// Classes generated in this module, unique, first occurrence wins
    pub generated_classes: Vec<String>,
    /// Generated classes followed by every dependency's classes, unique
    pub available_classes: Vec<String>,
    pub builtins: Vec<String>,
    pub preamble: String,
    /// Transitive dependencies in resolution order
    pub dependencies: Vec<String>,
    pub is_umbrella: bool,
    pub layout: FileLayout,
}

impl ModulePlan {
    pub fn generates(&self, class: &str) -> bool {
        self.generated_classes.iter().any(|c| c == class)
    }

    pub fn is_available(&self, class: &str) -> bool {
        self.available_classes.iter().any(|c| c == class)
    }
}

/// Plans for every module, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePlanSet {
    plans: Vec<ModulePlan>,
}

impl ModulePlanSet {
    pub fn get(&self, module: &str) -> Option<&ModulePlan> {
        self.plans.iter().find(|p| p.module == module)
    }

    pub fn umbrella(&self) -> Option<&ModulePlan> {
        self.plans.iter().find(|p| p.is_umbrella)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModulePlan> {
        self.plans.iter()
    }

    /// Plans compiled together in the regular (non-umbrella) configuration
    pub fn split_modules(&self) -> impl Iterator<Item = &ModulePlan> {
        self.plans.iter().filter(|p| !p.is_umbrella)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl IntoIterator for ModulePlanSet {
    type Item = ModulePlan;
    type IntoIter = std::vec::IntoIter<ModulePlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.into_iter()
    }
}

/// Deduplicate preserving first-seen order
pub fn uniqued<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.as_ref();
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    out
}

/// Compute the plan of every module
#[tracing::instrument(skip_all)]
pub fn partition(
    modules: &[ModuleDefinition],
    options: &PartitionOptions,
) -> GenerateResult<ModulePlanSet> {
    let mut names = HashSet::new();
    for module in modules {
        if !names.insert(module.name.as_str()) {
            return Err(GenerateError::DuplicateModule(module.name.clone()));
        }
    }
    if let Some(umbrella) = &options.umbrella {
        if !names.contains(umbrella.as_str()) {
            return Err(GenerateError::UnknownModule(umbrella.clone()));
        }
    }

    let mut plans = Vec::with_capacity(modules.len());
    for module in modules {
        let dependencies = transitive_dependencies(modules, module)?;
        let is_umbrella = options.umbrella.as_deref() == Some(module.name.as_str());

        let (generated_classes, builtins) = if is_umbrella {
            let aggregated: Vec<&ModuleDefinition> = std::iter::once(module)
                .chain(modules.iter().filter(|m| {
                    m.name != module.name && !dependencies.contains(&m.name)
                }))
                .collect();
            (
                uniqued(aggregated.iter().flat_map(|m| m.native_classes.iter())),
                uniqued(aggregated.iter().flat_map(|m| m.builtins.iter())),
            )
        } else {
            (uniqued(&module.native_classes), uniqued(&module.builtins))
        };

        if generated_classes.is_empty() && builtins.is_empty() {
            return Err(GenerateError::EmptyModule(module.name.clone()));
        }

        let dependency_classes = dependencies
            .iter()
            .filter_map(|name| modules.iter().find(|m| &m.name == name))
            .flat_map(|m| m.native_classes.iter());
        let available_classes = uniqued(generated_classes.iter().chain(dependency_classes));

        let layout = if is_umbrella {
            options.umbrella_layout
        } else {
            FileLayout::PerType
        };

        debug!(
            "Module {}: {} generated, {} available, {} builtins",
            module.name,
            generated_classes.len(),
            available_classes.len(),
            builtins.len()
        );

        plans.push(ModulePlan {
            module: module.name.clone(),
            generated_classes,
            available_classes,
            builtins,
            preamble: module.preamble.clone(),
            dependencies,
            is_umbrella,
            layout,
        });
    }

    check_foundational_class(modules, &plans, &options.foundational_class)?;
    check_single_ownership(&plans)?;

    info!("Partitioned {} modules", plans.len());
    Ok(ModulePlanSet { plans })
}

fn transitive_dependencies(
    modules: &[ModuleDefinition],
    root: &ModuleDefinition,
) -> GenerateResult<Vec<String>> {
    fn visit(
        modules: &[ModuleDefinition],
        module: &ModuleDefinition,
        stack: &mut Vec<String>,
        out: &mut Vec<String>,
    ) -> GenerateResult<()> {
        stack.push(module.name.clone());
        for dep in &module.dependencies {
            if stack.contains(dep) {
                return Err(GenerateError::DependencyCycle(dep.clone()));
            }
            let definition = modules.iter().find(|m| &m.name == dep).ok_or_else(|| {
                GenerateError::UnknownDependency {
                    module: module.name.clone(),
                    dependency: dep.clone(),
                }
            })?;
            if !out.contains(dep) {
                out.push(dep.clone());
                visit(modules, definition, stack, out)?;
            }
        }
        stack.pop();
        Ok(())
    }

    let mut out = Vec::new();
    visit(modules, root, &mut Vec::new(), &mut out)?;
    Ok(out)
}

/// A module must never generate the root class when one of its dependencies
/// already provides it.
fn check_foundational_class(
    modules: &[ModuleDefinition],
    plans: &[ModulePlan],
    foundational: &str,
) -> GenerateResult<()> {
    for plan in plans {
        let provided_by_dependency = plan.dependencies.iter().any(|dep| {
            modules
                .iter()
                .find(|m| &m.name == dep)
                .is_some_and(|m| m.native_classes.iter().any(|c| c == foundational))
        });
        if provided_by_dependency && plan.generates(foundational) {
            return Err(GenerateError::FoundationalClassGenerated {
                module: plan.module.clone(),
                class: foundational.to_string(),
            });
        }
    }
    Ok(())
}

/// Modules compiled together must not both generate the same class
fn check_single_ownership(plans: &[ModulePlan]) -> GenerateResult<()> {
    let mut owners: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();
    for plan in plans.iter().filter(|p| !p.is_umbrella) {
        for class in &plan.generated_classes {
            if let Some(first) = owners.insert(class, &plan.module) {
                return Err(GenerateError::ClassOwnedTwice {
                    class: class.clone(),
                    first: first.to_string(),
                    second: plan.module.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, classes: &[&str], deps: &[&str]) -> ModuleDefinition {
        ModuleDefinition {
            name: name.to_string(),
            native_classes: classes.iter().map(|s| s.to_string()).collect(),
            builtins: Vec::new(),
            preamble: String::new(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn layered() -> Vec<ModuleDefinition> {
        vec![
            module("runtime", &["Object", "RefCounted", "Engine"], &[]),
            module("core", &["Node", "Resource"], &["runtime"]),
            module("two_d", &["Node2D", "Sprite2D"], &["core"]),
            module("godot", &["EditorPlugin"], &["runtime"]),
        ]
    }

    #[test]
    fn test_uniqued_keeps_first_occurrence() {
        assert_eq!(uniqued(["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let modules = vec![module("runtime", &["Object", "Node", "Object", "Node"], &[])];
        let plans = partition(&modules, &PartitionOptions::default()).unwrap();
        let plan = plans.get("runtime").unwrap();
        assert_eq!(plan.generated_classes, vec!["Object", "Node"]);
        assert_eq!(plan.available_classes, vec!["Object", "Node"]);
    }

    #[test]
    fn test_available_includes_transitive_dependencies() {
        let plans = partition(&layered(), &PartitionOptions::default()).unwrap();
        let two_d = plans.get("two_d").unwrap();
        assert_eq!(two_d.generated_classes, vec!["Node2D", "Sprite2D"]);
        assert_eq!(two_d.dependencies, vec!["core", "runtime"]);
        assert_eq!(
            two_d.available_classes,
            vec!["Node2D", "Sprite2D", "Node", "Resource", "Object", "RefCounted", "Engine"]
        );
        for class in &two_d.generated_classes {
            assert!(two_d.is_available(class));
        }
    }

    #[test]
    fn test_umbrella_aggregates_non_dependencies() {
        let options = PartitionOptions {
            umbrella: Some("godot".to_string()),
            umbrella_layout: FileLayout::Buckets,
            ..PartitionOptions::default()
        };
        let plans = partition(&layered(), &options).unwrap();
        let umbrella = plans.umbrella().unwrap();
        assert_eq!(umbrella.module, "godot");
        assert_eq!(
            umbrella.generated_classes,
            vec!["EditorPlugin", "Node", "Resource", "Node2D", "Sprite2D"]
        );
        assert!(!umbrella.generates("Object"));
        assert_eq!(umbrella.layout, FileLayout::Buckets);
        assert_eq!(plans.get("core").unwrap().layout, FileLayout::PerType);
        assert_eq!(plans.split_modules().count(), 3);
        assert_eq!(plans.len(), 4);
    }

    #[test]
    fn test_foundational_class_violation_is_fatal() {
        let modules = vec![
            module("runtime", &["Object", "RefCounted"], &[]),
            module("core", &["Object", "Node"], &["runtime"]),
        ];
        let err = partition(&modules, &PartitionOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::FoundationalClassGenerated { ref module, ref class }
                if module == "core" && class == "Object"
        ));
    }

    #[test]
    fn test_umbrella_generating_root_with_runtime_dependency_is_fatal() {
        let mut modules = layered();
        modules[3].native_classes.push("Object".to_string());
        let options = PartitionOptions {
            umbrella: Some("godot".to_string()),
            ..PartitionOptions::default()
        };
        assert!(matches!(
            partition(&modules, &options),
            Err(GenerateError::FoundationalClassGenerated { .. })
        ));
    }

    #[test]
    fn test_class_owned_twice_is_fatal() {
        let modules = vec![
            module("runtime", &["Object"], &[]),
            module("a", &["Node"], &["runtime"]),
            module("b", &["Node"], &["runtime"]),
        ];
        assert!(matches!(
            partition(&modules, &PartitionOptions::default()),
            Err(GenerateError::ClassOwnedTwice { ref class, .. }) if class == "Node"
        ));
    }

    #[test]
    fn test_dependency_errors() {
        let unknown = vec![module("a", &["Node"], &["missing"])];
        assert!(matches!(
            partition(&unknown, &PartitionOptions::default()),
            Err(GenerateError::UnknownDependency { .. })
        ));

        let cyclic = vec![module("a", &["A"], &["b"]), module("b", &["B"], &["a"])];
        assert!(matches!(
            partition(&cyclic, &PartitionOptions::default()),
            Err(GenerateError::DependencyCycle(_))
        ));

        let duplicate = vec![module("a", &["A"], &[]), module("a", &["B"], &[])];
        assert!(matches!(
            partition(&duplicate, &PartitionOptions::default()),
            Err(GenerateError::DuplicateModule(_))
        ));

        let empty = vec![module("a", &[], &[])];
        assert!(matches!(
            partition(&empty, &PartitionOptions::default()),
            Err(GenerateError::EmptyModule(_))
        ));
    }

    #[test]
    fn test_partition_is_deterministic() {
        let first = partition(&layered(), &PartitionOptions::default()).unwrap();
        let second = partition(&layered(), &PartitionOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bucket_for() {
        assert_eq!(FileLayout::bucket_for("Node"), 'N');
        assert_eq!(FileLayout::bucket_for("aabb"), 'A');
        assert_eq!(FileLayout::bucket_for("_Private"), 'A');
        assert_eq!(FileLayout::bucket_for(""), 'A');
    }
}
