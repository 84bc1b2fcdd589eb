//! Error types for transmuter-core
//!
//! Two kinds of failure exist. A [`ConfigurationError`] fires while a
//! transformer is being constructed and makes it unusable. A
//! [`ResolutionError`] fires while records flow through `map`, `map_list` or
//! `aggregate` and aborts the whole call. [`Error`] wraps both together with
//! the failures of the declarative definition layer.

use thiserror::Error;

/// Boxed error returned by user supplied functions and target constructors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for transmuter-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A transformer whose instructions do not fully and exclusively cover its target schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Neither mappings nor aggregations were declared
    #[error("transformer for target '{target}' declares no mapping or aggregation instructions")]
    EmptyInstructions {
        /// Target schema name
        target: String,
    },

    /// The same field is declared both as a mapping and as an aggregation
    #[error(
        "fields {} are declared both in the mappings and the aggregations of target '{target}'",
        .fields.join(", ")
    )]
    OverlappingFields {
        /// Target schema name
        target: String,
        /// Offending field names, sorted
        fields: Vec<String>,
    },

    /// Required target fields without an instruction
    #[error(
        "fields {} in target '{target}' do not have a mapping or aggregation",
        .fields.join(", ")
    )]
    MissingFields {
        /// Target schema name
        target: String,
        /// Offending field names, sorted
        fields: Vec<String>,
    },

    /// Instructions for fields the target schema does not declare
    #[error("fields {} do not exist in target '{target}'", .fields.join(", "))]
    UnknownFields {
        /// Target schema name
        target: String,
        /// Offending field names, sorted
        fields: Vec<String>,
    },
}

impl ConfigurationError {
    /// Field names the error is about (empty for [`ConfigurationError::EmptyInstructions`])
    pub fn fields(&self) -> &[String] {
        match self {
            Self::EmptyInstructions { .. } => &[],
            Self::OverlappingFields { fields, .. }
            | Self::MissingFields { fields, .. }
            | Self::UnknownFields { fields, .. } => fields,
        }
    }

    /// Name of the target schema being validated
    pub fn target(&self) -> &str {
        match self {
            Self::EmptyInstructions { target }
            | Self::OverlappingFields { target, .. }
            | Self::MissingFields { target, .. }
            | Self::UnknownFields { target, .. } => target,
        }
    }
}

/// Failure while resolving instructions against records or building a target
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A source record has no field with the requested name
    #[error("source record has no field '{field}'")]
    MissingField {
        /// Field that was looked up
        field: String,
    },

    /// A user supplied function failed
    #[error("function for '{instruction}' failed: {source}")]
    Function {
        /// Target field, or `sort_by` / `group_by` for key selectors
        instruction: String,
        /// Error raised by the function
        #[source]
        source: BoxError,
    },

    /// The target schema rejected the resolved field mapping
    #[error("failed to construct target '{target}': {source}")]
    Construct {
        /// Target schema name
        target: String,
        /// Error raised by the schema
        #[source]
        source: BoxError,
    },

    /// Two sort keys have no natural ordering between them
    #[error("cannot order sort keys {left} and {right}")]
    Incomparable {
        /// Rendered left key component
        left: String,
        /// Rendered right key component
        right: String,
    },
}

/// Errors that can occur in transmuter-core
#[derive(Error, Debug)]
pub enum Error {
    /// Transformer construction failed
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Running a transformer failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Definition file could not be found
    #[error("definition file not found: {path}")]
    DefinitionNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse a YAML definition
    #[error("failed to parse definition: {0}")]
    DefinitionParse(#[from] serde_yaml::Error),

    /// Definition parsed but is not usable
    #[error("invalid definition '{name}': {message}")]
    DefinitionInvalid {
        /// Definition name
        name: String,
        /// Description of what's invalid
        message: String,
    },

    /// A definition references a built-in function that does not exist
    #[error("unknown {kind} function '{name}'")]
    UnknownFunction {
        /// Function family (`value`, `list` or `group`)
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// Template compilation error
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
