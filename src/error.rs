//! Error types for operation loading, compilation and variable validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading schemas, operation files or configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } | LoadError::Walk { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while compiling a schema or an operation file.
///
/// Everything except [`CompileError::InvalidSchema`] is scoped to a single
/// operation file: the pipeline logs it and moves on to the next file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("cannot parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("{file} does not validate against the schema: {message}")]
    Validation { file: String, message: String },

    #[error("schema has no root type for {operation_type} operations")]
    MissingRootType { operation_type: String },

    #[error("unknown fragment '{name}'")]
    UnknownFragment { name: String },

    #[error("variable path '{path}' cannot be resolved: no field '{component}' (available: {available})")]
    UnresolvedVariablePath {
        path: String,
        component: String,
        available: String,
    },

    #[error("@{directive} is missing required argument '{argument}'")]
    MissingDirectiveArgument { directive: String, argument: String },

    #[error("@{directive} argument '{argument}' must be {expected}, got {actual}")]
    InvalidDirectiveArgument {
        directive: String,
        argument: String,
        expected: String,
        actual: String,
    },

    #[error("@{directive} arguments '{first}' and '{second}' are mutually exclusive")]
    ConflictingDirectiveArguments {
        directive: String,
        first: String,
        second: String,
    },

    #[error("@{directive} argument '{argument}' has unknown value '{value}'")]
    UnknownEnumValue {
        directive: String,
        argument: String,
        value: String,
    },

    #[error("unknown claim '{name}'")]
    UnknownClaim { name: String },

    #[error("jsonSchema keyword '{keyword}' is already set on {path}")]
    KeywordAlreadySet { keyword: String, path: String },

    #[error("invalid @transform path '{path}' for schema {schema}")]
    InvalidTransformPath { path: String, schema: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::InvalidSchema { .. } => 2,
            _ => 1,
        }
    }
}

/// Errors during variable validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[error("invalid variables schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<VariableError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VariableError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for VariableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::UnknownOperation { .. } | ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
