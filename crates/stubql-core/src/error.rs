//! Error types for stubql

use std::sync::Arc;
use thiserror::Error;

/// Core error type for stubql operations.
///
/// The enum is `Clone` so a failure registered against a query can be handed
/// back, unchanged, every time that query is issued.
#[derive(Error, Debug, Clone)]
pub enum StubqlError {
    /// Neither a responder hook nor a registered stub matched the query
    #[error("query not stubbed: {query}")]
    NotStubbed { query: String },

    /// A fixture record does not have one field per column
    #[error("malformed fixture at record {record}: expected {expected} fields, found {found}")]
    MalformedFixture {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("fixture error: {0}")]
    Fixture(String),

    /// A cursor was read after it reported end-of-data or was closed
    #[error("rows are closed")]
    RowsClosed,

    /// The destination slots handed to `Rows::next` do not match the column count
    #[error("destination has {found} slots but the row set has {expected} columns")]
    Destination { expected: usize, found: usize },

    #[error("expected {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("statement is closed")]
    StatementClosed,

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("driver not registered: {0}")]
    DriverNotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// An error authored by a test, passed through verbatim
    #[error(transparent)]
    Custom(Arc<dyn std::error::Error + Send + Sync>),

    #[error("{0}")]
    Other(String),
}

impl StubqlError {
    /// Wrap an arbitrary error so it can be registered as a stubbed failure
    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StubqlError::Custom(Arc::new(err))
    }

    /// Build a plain message error
    pub fn other(message: impl Into<String>) -> Self {
        StubqlError::Other(message.into())
    }

    pub fn is_not_stubbed(&self) -> bool {
        matches!(self, StubqlError::NotStubbed { .. })
    }
}

/// Result type alias for stubql operations
pub type Result<T> = std::result::Result<T, StubqlError>;
