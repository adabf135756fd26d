use tracing::warn;

use crate::dialect::Dialect;
use crate::driver::DriverError;
use crate::error::{ErrorKind, SqlConduitError};

/// Per-dialect table mapping vendor SQLSTATE classes and error codes to the
/// portable [`ErrorKind`] taxonomy.
///
/// Classification is code-driven only; message text is never inspected.
/// Adding a backend means adding a table, not an error-type hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodes {
    /// SQLSTATE prefixes (classes or full states) per kind.
    constraint_states: &'static [&'static str],
    transient_states: &'static [&'static str],
    connectivity_states: &'static [&'static str],
    syntax_states: &'static [&'static str],
    /// Vendor-specific numeric codes per kind.
    constraint_codes: &'static [i32],
    transient_codes: &'static [i32],
    connectivity_codes: &'static [i32],
    syntax_codes: &'static [i32],
}

impl ErrorCodes {
    pub(crate) const fn new(
        constraint_states: &'static [&'static str],
        transient_states: &'static [&'static str],
        connectivity_states: &'static [&'static str],
        syntax_states: &'static [&'static str],
        constraint_codes: &'static [i32],
        transient_codes: &'static [i32],
        connectivity_codes: &'static [i32],
        syntax_codes: &'static [i32],
    ) -> Self {
        Self {
            constraint_states,
            transient_states,
            connectivity_states,
            syntax_states,
            constraint_codes,
            transient_codes,
            connectivity_codes,
            syntax_codes,
        }
    }

    /// Classify a driver error. Unrecognized codes map to
    /// [`ErrorKind::General`] rather than being dropped.
    #[must_use]
    pub fn classify(&self, error: &DriverError) -> ErrorKind {
        if let Some(state) = error.sqlstate.as_deref() {
            if matches_state(self.constraint_states, state) {
                return ErrorKind::ConstraintViolation;
            }
            if matches_state(self.transient_states, state) {
                return ErrorKind::Transient;
            }
            if matches_state(self.connectivity_states, state) {
                return ErrorKind::Connectivity;
            }
            if matches_state(self.syntax_states, state) {
                return ErrorKind::Syntax;
            }
        }
        if let Some(code) = error.code {
            if self.constraint_codes.contains(&code) {
                return ErrorKind::ConstraintViolation;
            }
            if self.transient_codes.contains(&code) {
                return ErrorKind::Transient;
            }
            if self.connectivity_codes.contains(&code) {
                return ErrorKind::Connectivity;
            }
            if self.syntax_codes.contains(&code) {
                return ErrorKind::Syntax;
            }
        }
        ErrorKind::General
    }
}

fn matches_state(prefixes: &[&str], state: &str) -> bool {
    prefixes.iter().any(|p| state.starts_with(p))
}

/// Translate a driver error into a portable [`SqlConduitError`], keeping the
/// original error as the source.
#[must_use]
pub fn translate(dialect: &Dialect, error: DriverError) -> SqlConduitError {
    let kind = dialect.error_codes().classify(&error);
    if kind == ErrorKind::General && (error.sqlstate.is_some() || error.code.is_some()) {
        warn!(
            dialect = dialect.name(),
            sqlstate = error.sqlstate.as_deref(),
            code = error.code,
            "unrecognized driver error code, classifying as general failure"
        );
    }
    SqlConduitError::DataAccess {
        kind,
        source: error,
    }
}
