//! The driver SPI the engine executes through.
//!
//! The core never opens sockets or manages pools: an already-connected,
//! non-blocking data source is supplied as a [`ConnectionFactory`] and the
//! engine drives one acquired [`Connection`] per execute call.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::dialect::ConnectionMetadata;
use crate::row::Row;
use crate::value::SqlValue;

/// Error surfaced by a driver, carrying the vendor diagnostics the
/// translator classifies on: SQLSTATE and/or a numeric vendor code.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub sqlstate: Option<String>,
    pub code: Option<i32>,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sqlstate: None,
            code: None,
        }
    }

    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

/// Outcome of executing one driver statement.
pub enum ExecuteResult {
    /// Row-producing statement. Rows arrive in driver order; the stream is
    /// pulled one row at a time, so demand propagates to the driver.
    Rows(BoxStream<'static, Result<Row, DriverError>>),
    /// Count of rows affected by a DML statement.
    RowsUpdated(u64),
}

/// One prepared driver statement. Single-use: execution consumes it.
#[async_trait]
pub trait Statement: Send {
    /// Bind the value for the 0-based parameter slot `index`.
    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), DriverError>;

    /// Execute the statement against its connection.
    async fn execute(self: Box<Self>) -> Result<ExecuteResult, DriverError>;
}

/// One connection-bound session. Dropping the connection releases it back
/// to whatever supplied it.
#[async_trait]
pub trait Connection: Send {
    /// Create a statement for already-rendered SQL text.
    fn create_statement(&mut self, sql: &str) -> Result<Box<dyn Statement>, DriverError>;
}

/// The supplied, already-connected data source abstraction.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Product name and version, used once per factory for dialect
    /// resolution.
    fn metadata(&self) -> ConnectionMetadata;

    /// Acquire one connection for the duration of a single execute call.
    async fn acquire(&self) -> Result<Box<dyn Connection>, DriverError>;
}
