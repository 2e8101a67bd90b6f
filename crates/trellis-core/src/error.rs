//! Error types for Trellis Core

use thiserror::Error;

/// Result type alias using Trellis Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Trellis graph catalog
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from storage operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LMDB/heed database errors
    #[error("Database error: {0}")]
    Database(#[from] heed::Error),

    /// Invalid argument (empty name, unsupported operation keyword)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Graph does not exist
    #[error("Unknown graph: {0}")]
    UnknownGraph(String),

    /// Graph, namespace, relation, or label name already taken in its scope
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Restrict-mode drop blocked by objects still contained in the namespace
    #[error("Dependent objects exist: {0}")]
    DependentObjectsExist(String),

    /// Every value of the label id cycle is in use for the graph
    #[error("Label id space exhausted: {0}")]
    LabelIdSpaceExhausted(String),

    /// Generic internal error (broken catalog/namespace invariant)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unknown graph error
    pub fn unknown_graph(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::UnknownGraph(format!("graph \"{name}\" does not exist"))
    }

    /// Create a duplicate name error
    pub fn duplicate_name(msg: impl Into<String>) -> Self {
        Self::DuplicateName(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
