//! Module assembly
//!
//! Turns one [`ModulePlan`] into the set of files making up that module's
//! generated code. Every unit is validated with `syn` and pretty-printed, so a
//! malformed emission is reported as [`GenerateError::Format`] instead of
//! surfacing later as a compile error in the user's crate.

use std::path::{Path, PathBuf};

use gdbind_core::config::GenerationSettings;
use gdbind_core::{
    levels, write_if_changed, FileLayout, GenerateError, GenerateResult, ModulePlan, TierAssignment,
};
use gdbind_schema::{BuiltinDescriptor, ClassDescriptor, Schema};
use proc_macro2::TokenStream;
use quote::quote;
use tracing::{debug, info, instrument};

use crate::builtins::{emit_builtin, emit_builtin_enums, has_methods_trait};
use crate::classes::emit_class;
use crate::entry::emit_entry;
use crate::enums::emit_enum;
use crate::mapping::TypeMapper;
use crate::naming;
use crate::utility::emit_utility;

/// Lints silenced for the whole generated module tree
const ROOT_ALLOW: &str =
    "#![allow(unused_imports, non_camel_case_types, clippy::all)]\n";

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative to the generation directory, starting with the module name
    pub path: PathBuf,
    pub contents: String,
}

/// Files of one module, in a stable order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    module: String,
    files: Vec<GeneratedFile>,
}

/// Outcome of [`OutputSet::write_to`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    pub unchanged: usize,
}

impl WriteReport {
    pub fn merge(&mut self, other: WriteReport) {
        self.written += other.written;
        self.unchanged += other.unchanged;
    }
}

impl OutputSet {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Contents of the file at `path`, relative to the generation directory
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        let path = path.as_ref();
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.contents.as_str())
    }

    /// Write every file under `dir`, skipping files whose bytes are unchanged
    pub fn write_to(&self, dir: &Path) -> GenerateResult<WriteReport> {
        let mut report = WriteReport::default();
        for file in &self.files {
            let path = dir.join(&file.path);
            let written = write_if_changed(&path, &file.contents)
                .map_err(|source| GenerateError::Write { path, source })?;
            if written {
                report.written += 1;
            } else {
                report.unchanged += 1;
            }
        }
        info!(
            "Module `{}`: {} files written, {} unchanged",
            self.module, report.written, report.unchanged
        );
        Ok(report)
    }

    fn push(&mut self, path: PathBuf, contents: String) {
        self.files.push(GeneratedFile { path, contents });
    }
}

/// Parse `tokens` as a file and pretty-print it
fn render(path: &Path, tokens: TokenStream) -> GenerateResult<String> {
    let file = syn::parse2::<syn::File>(tokens).map_err(|e| GenerateError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(prettyplease::unparse(&file))
}

/// A generated type ready to be placed in a file
struct TypeUnit {
    /// Type name, used for bucketing
    name: String,
    module: String,
    /// Item re-exported from the type's module
    export: Option<String>,
    body: TokenStream,
}

/// Builds the [`OutputSet`] for one module
pub struct ModuleAssembler<'a> {
    schema: &'a Schema,
    plan: &'a ModulePlan,
    tiers: &'a TierAssignment,
    settings: &'a GenerationSettings,
}

impl<'a> ModuleAssembler<'a> {
    pub fn new(
        schema: &'a Schema,
        plan: &'a ModulePlan,
        tiers: &'a TierAssignment,
        settings: &'a GenerationSettings,
    ) -> Self {
        Self {
            schema,
            plan,
            tiers,
            settings,
        }
    }

    fn classes(&self) -> GenerateResult<Vec<&'a ClassDescriptor>> {
        self.plan
            .generated_classes
            .iter()
            .map(|name| {
                self.schema.class(name).ok_or_else(|| GenerateError::UnknownClass {
                    module: self.plan.module.clone(),
                    class: name.clone(),
                })
            })
            .collect()
    }

    fn builtins(&self) -> GenerateResult<Vec<&'a BuiltinDescriptor>> {
        self.plan
            .builtins
            .iter()
            .map(|name| {
                self.schema.builtin(name).ok_or_else(|| GenerateError::UnknownBuiltin {
                    module: self.plan.module.clone(),
                    builtin: name.clone(),
                })
            })
            .collect()
    }

    fn check_parents(&self, classes: &[&ClassDescriptor]) -> GenerateResult<()> {
        for class in classes {
            if let Some(parent) = &class.parent {
                if !self.plan.is_available(parent) {
                    return Err(GenerateError::ParentUnavailable {
                        class: class.name.clone(),
                        parent: parent.clone(),
                        module: self.plan.module.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn header(&self) -> String {
        format!(
            "// Generated by gdbind from {} for module `{}`. Do not edit.\n",
            self.schema.header.version_full_name, self.plan.module
        )
    }

    #[instrument(skip_all, fields(module = %self.plan.module))]
    pub fn assemble(&self) -> GenerateResult<OutputSet> {
        let classes = self.classes()?;
        let builtins = self.builtins()?;
        self.check_parents(&classes)?;

        let mapper = TypeMapper::new(
            self.schema,
            &self.plan.available_classes,
            &self.settings.foundational_class,
        );

        let mut units = Vec::with_capacity(classes.len() + builtins.len());
        let mut class_units = Vec::with_capacity(classes.len());
        for class in &classes {
            let level = self.tiers.tier_of(&class.name);
            let body = emit_class(&mapper, class, level, &self.plan.module)?;
            class_units.push(TypeUnit {
                name: class.name.clone(),
                module: naming::module_name(&class.name),
                export: Some(class.name.clone()),
                body,
            });
        }
        let mut builtin_units = Vec::with_capacity(builtins.len());
        for builtin in builtins.iter().filter(|b| has_methods_trait(b)) {
            let body = emit_builtin(&mapper, builtin)?;
            builtin_units.push(TypeUnit {
                name: builtin.name.clone(),
                module: naming::module_name(&builtin.name),
                export: Some(naming::builtin_trait_name(&builtin.name, builtin.host_name())),
                body,
            });
        }

        let plan = levels::resolve(self.tiers, &classes).map_err(|source| GenerateError::Level {
            module: self.plan.module.clone(),
            source,
        })?;
        let entry = emit_entry(&plan);

        let core_defs = (!builtins.is_empty()).then(|| {
            let globals = self
                .schema
                .global_enums
                .iter()
                .map(|e| emit_enum(&naming::flat_enum_name(&e.name), e));
            let owned = emit_builtin_enums(&self.schema.builtins);
            quote! {
                use super::*;

                #(#globals)*
                #owned
            }
        });

        // Utility functions travel with the builtins they take and return
        let utility = if !builtins.is_empty() && !self.schema.utility_functions.is_empty() {
            Some(emit_utility(&mapper, &self.schema.utility_functions)?)
        } else {
            None
        };

        let root = PathBuf::from(&self.plan.module);
        let mut output = OutputSet {
            module: self.plan.module.clone(),
            files: Vec::new(),
        };

        let mut root_items = Vec::new();
        match self.plan.layout {
            FileLayout::PerType => {
                for (dir, group) in [("classes", class_units), ("builtins", builtin_units)] {
                    if group.is_empty() {
                        continue;
                    }
                    self.write_per_type(&mut output, &root.join(dir), &group)?;
                    let dir = naming::ident(dir);
                    root_items.push(quote! {
                        pub mod #dir;
                        pub use #dir::*;
                    });
                }
            }
            FileLayout::Buckets => {
                units.extend(class_units);
                units.extend(builtin_units);
                for letter in FileLayout::BUCKETS {
                    let stem = format!("{}_{}", self.plan.module, letter.to_ascii_lowercase());
                    let members: Vec<&TypeUnit> = units
                        .iter()
                        .filter(|u| FileLayout::bucket_for(&u.name) == letter)
                        .collect();
                    let path = root.join(format!("{}.rs", stem));
                    let inline = members.iter().map(|u| inline_module(u));
                    let tokens = quote! {
                        use super::*;

                        #(#inline)*
                    };
                    output.push(path.clone(), render(&path, tokens)?);
                    let stem = naming::ident(&stem);
                    root_items.push(quote! {
                        mod #stem;
                        pub use #stem::*;
                    });
                }
            }
        }

        if let Some(tokens) = core_defs {
            let path = root.join("core_defs.rs");
            output.push(path.clone(), render(&path, tokens)?);
            root_items.push(quote! {
                pub mod core_defs;
                pub use core_defs::*;
            });
        }

        if let Some(tokens) = utility {
            let path = root.join("utility.rs");
            output.push(path.clone(), render(&path, tokens)?);
            root_items.push(quote! {
                pub mod utility;
            });
        }

        let path = root.join("mod.rs");
        let body = render(
            &path,
            quote! {
                #(#root_items)*

                #entry
            },
        )?;
        let mut contents = self.header();
        contents.push_str(ROOT_ALLOW);
        if !self.plan.preamble.trim().is_empty() {
            contents.push('\n');
            contents.push_str(self.plan.preamble.trim_end());
            contents.push('\n');
        }
        contents.push('\n');
        contents.push_str(&body);
        output.push(path, contents);

        debug!("Assembled {} files", output.len());
        Ok(output)
    }

    fn write_per_type(&self, output: &mut OutputSet, dir: &Path, units: &[TypeUnit]) -> GenerateResult<()> {
        let mut declarations = Vec::with_capacity(units.len());
        for unit in units {
            let path = dir.join(format!("{}.rs", unit.module));
            let body = &unit.body;
            output.push(
                path.clone(),
                render(
                    &path,
                    quote! {
                        use super::*;

                        #body
                    },
                )?,
            );

            let module = naming::ident(&unit.module);
            let export = unit.export.as_deref().map(|e| {
                let e = naming::ident(e);
                quote!(pub use #module::#e;)
            });
            declarations.push(quote! {
                pub mod #module;
                #export
            });
        }

        let path = dir.join("mod.rs");
        output.push(
            path.clone(),
            render(
                &path,
                quote! {
                    use super::*;

                    #(#declarations)*
                },
            )?,
        );
        Ok(())
    }
}

fn inline_module(unit: &TypeUnit) -> TokenStream {
    let module = naming::ident(&unit.module);
    let body = &unit.body;
    let export = unit.export.as_deref().map(|e| {
        let e = naming::ident(e);
        quote!(pub use #module::#e;)
    });
    quote! {
        pub mod #module {
            use super::*;

            #body
        }
        #export
    }
}
