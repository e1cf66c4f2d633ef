use std::result;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "function '{reference}' could not be resolved: {reason}. Functions defined outside of \
         the built-in namespace must be referenced with their full namespace"
    )]
    UnresolvedFunction { reference: String, reason: String },

    #[error("dimension '{0}' not found in the dataset")]
    DimensionNotFound(String),

    #[error("error chunking dataset")]
    Chunking(#[source] Box<Error>),

    #[error("expected a single field or a collection of fields, but got {0}")]
    InvalidDerivedField(String),

    #[error(
        "the attribute '{attribute}' has not been set for the derived variable '{field}' and \
         is not defined in the 'attributes' section of its configuration either; add it to the \
         'attributes' section of the derived variable '{field}'"
    )]
    MissingAttribute { attribute: String, field: String },

    #[error("variable '{0}' not found in the dataset")]
    VariableNotFound(String),

    #[error("a variable named '{0}' already exists in the dataset")]
    DuplicateVariable(String),

    #[error("size mismatch for dimension '{dim}': {expected} != {found}")]
    ShapeMismatch {
        dim: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid chunk size {size} for dimension '{dim}'")]
    InvalidChunkSize { dim: String, size: usize },

    #[error("expected {expected} data, found {found}")]
    DataType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("unexpected argument(s): {}", .0.join(", "))]
    UnexpectedArgument(Vec<String>),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("error deriving '{variable}'")]
    Derivation {
        variable: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Strip any context added on the way up and return the error that started it all.
    ///
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Derivation { source, .. } => source.root_cause(),
            _ => self,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
