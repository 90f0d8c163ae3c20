//! Fatal generation errors

use std::path::PathBuf;

use gdbind_schema::SchemaError;

use crate::classify::ClassifyError;
use crate::config::ConfigError;
use crate::levels::LevelError;

/// Any error that aborts generation of a module
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("module `{module}`: {source}")]
    Level {
        module: String,
        #[source]
        source: LevelError,
    },

    #[error("{context}: {source}")]
    Classify {
        context: String,
        #[source]
        source: ClassifyError,
    },

    #[error("module `{module}` generates `{class}`, which one of its dependencies already provides")]
    FoundationalClassGenerated { module: String, class: String },

    #[error("class `{class}` is generated by both `{first}` and `{second}`")]
    ClassOwnedTwice {
        class: String,
        first: String,
        second: String,
    },

    #[error("module `{module}` depends on unknown module `{dependency}`")]
    UnknownDependency { module: String, dependency: String },

    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("module dependency cycle through `{0}`")]
    DependencyCycle(String),

    #[error("module `{0}` is declared more than once")]
    DuplicateModule(String),

    #[error("module `{0}` owns no classes and no builtins")]
    EmptyModule(String),

    #[error("module `{module}` lists class `{class}`, which the schema does not define")]
    UnknownClass { module: String, class: String },

    #[error("module `{module}` lists builtin `{builtin}`, which the schema does not define")]
    UnknownBuiltin { module: String, builtin: String },

    #[error("class `{class}` derives from `{parent}`, which is not available to module `{module}`")]
    ParentUnavailable {
        class: String,
        parent: String,
        module: String,
    },

    #[error("generated `{}` is not valid Rust: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for generation
pub type GenerateResult<T> = Result<T, GenerateError>;

impl GenerateError {
    /// Attach the class and member being emitted to a classification failure
    pub fn classify(class: &str, member: &str, source: ClassifyError) -> Self {
        Self::Classify {
            context: format!("`{}.{}`", class, member),
            source,
        }
    }
}
