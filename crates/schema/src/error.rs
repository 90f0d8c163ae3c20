//! Error types for schema loading

/// Errors that can occur when loading or validating a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Failed to read the schema file
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the schema JSON
    #[error("Failed to parse schema JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two classes share a name
    #[error("Duplicate class in schema: {0}")]
    DuplicateClass(String),

    /// Two builtin value types share a name
    #[error("Duplicate builtin type in schema: {0}")]
    DuplicateBuiltin(String),

    /// A parent chain loops back onto itself
    #[error("Cyclic inheritance detected at class {0}")]
    CyclicInheritance(String),
}
