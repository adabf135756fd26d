use std::fmt;

use thiserror::Error;

use crate::driver::DriverError;

/// Portable classification of a translated driver failure.
///
/// Every driver error surfaces as exactly one of these kinds; codes the
/// dialect's table does not recognize fall through to [`ErrorKind::General`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unique/foreign-key or other integrity constraint violation.
    ConstraintViolation,
    /// Timeout, deadlock, or other failure worth retrying.
    Transient,
    /// The connection to the backend was lost or could not be used.
    Connectivity,
    /// The backend rejected the statement as malformed.
    Syntax,
    /// Anything the dialect's code table does not classify.
    General,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::ConstraintViolation => "constraint violation",
            ErrorKind::Transient => "transient failure",
            ErrorKind::Connectivity => "connectivity failure",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::General => "data access failure",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum SqlConduitError {
    /// Malformed statement or API misuse, detected before any driver
    /// interaction.
    #[error("usage error: {0}")]
    Usage(String),

    /// No registered dialect provider matched the connection metadata.
    /// The caller must register a provider or supply a dialect explicitly.
    #[error("no dialect registered for product `{product}`")]
    UnresolvedDialect { product: String },

    /// Row-to-object or object-to-row conversion failed.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// A driver failure, classified into the portable taxonomy. The original
    /// driver error is retained as the source for diagnostics.
    #[error("{kind}: {source}")]
    DataAccess {
        kind: ErrorKind,
        #[source]
        source: DriverError,
    },
}

impl SqlConduitError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        SqlConduitError::Usage(message.into())
    }

    pub(crate) fn mapping(message: impl Into<String>) -> Self {
        SqlConduitError::Mapping(message.into())
    }

    /// The portable kind, for translated driver failures.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SqlConduitError::DataAccess { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The original driver error, for translated driver failures.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            SqlConduitError::DataAccess { source, .. } => Some(source),
            _ => None,
        }
    }
}
