//! The execution engine: dialect resolution, render, bind, submit, and the
//! lazy row stream.

use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use async_stream::try_stream;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::dialect::{Dialect, DialectRegistry};
use crate::driver::{Connection, ConnectionFactory, ExecuteResult};
use crate::error::SqlConduitError;
use crate::mapping::convert::ConversionService;
use crate::mapping::{Mapped, RowMapper};
use crate::row::Row;
use crate::statement::{render, RenderedStatement, Sql, StatementSpec};
use crate::translate::translate;

struct ClientInner {
    factory: Arc<dyn ConnectionFactory>,
    registry: DialectRegistry,
    // Resolved once per factory; the provider chain never re-runs per
    // statement.
    dialect: OnceLock<Arc<Dialect>>,
    conversions: Arc<ConversionService>,
}

/// Entry point for executing statements against one connection factory.
///
/// Cheap to clone; all shared state (the resolved dialect, the conversion
/// service) is read-only after first use, so concurrent operations against
/// different connections proceed fully in parallel.
#[derive(Clone)]
pub struct DatabaseClient {
    inner: Arc<ClientInner>,
}

impl DatabaseClient {
    /// A client using the built-in dialect catalog and standard conversions.
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self::with_registry(factory, DialectRegistry::builtin())
    }

    /// A client resolving dialects from an explicit registry.
    #[must_use]
    pub fn with_registry(factory: Arc<dyn ConnectionFactory>, registry: DialectRegistry) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                factory,
                registry,
                dialect: OnceLock::new(),
                conversions: Arc::new(ConversionService::standard()),
            }),
        }
    }

    /// A client with a caller-supplied dialect, bypassing resolution. Use
    /// this when resolution reported an unresolved product.
    #[must_use]
    pub fn with_dialect(factory: Arc<dyn ConnectionFactory>, dialect: Arc<Dialect>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(dialect);
        Self {
            inner: Arc::new(ClientInner {
                factory,
                registry: DialectRegistry::empty(),
                dialect: cell,
                conversions: Arc::new(ConversionService::standard()),
            }),
        }
    }

    /// The dialect for this factory, resolved on first use and cached.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::UnresolvedDialect`] if no registered
    /// provider matches the factory's metadata.
    pub fn dialect(&self) -> Result<Arc<Dialect>, SqlConduitError> {
        resolve_dialect(&self.inner)
    }

    /// Begin an operation from a structured statement builder.
    pub fn execute(&self, spec: impl Into<StatementSpec>) -> Operation {
        Operation {
            inner: self.inner.clone(),
            spec: spec.into(),
        }
    }

    /// Escape hatch: an operation from pre-rendered SQL text with neutral
    /// `?` / `:name` placeholders.
    pub fn sql(&self, sql: impl Into<String>) -> Operation {
        self.execute(Sql::raw(sql))
    }
}

fn resolve_dialect(inner: &ClientInner) -> Result<Arc<Dialect>, SqlConduitError> {
    if let Some(dialect) = inner.dialect.get() {
        return Ok(dialect.clone());
    }
    let resolved = inner.registry.resolve(&inner.factory.metadata())?;
    Ok(inner.dialect.get_or_init(|| resolved).clone())
}

/// One logical operation, ready to trigger.
///
/// Triggering is single-shot: every terminal method consumes the operation,
/// so a second trigger of the same instance is a compile-time error, and
/// each call builds a fresh execution. Building an operation performs no
/// work; nothing touches the driver until the returned stream is polled or
/// the returned future awaited.
pub struct Operation {
    inner: Arc<ClientInner>,
    spec: StatementSpec,
}

impl Operation {
    /// Bind the next positional parameter of a raw statement.
    #[must_use]
    pub fn bind(mut self, value: impl Into<crate::value::SqlValue>) -> Self {
        self.spec.positional.push(value.into());
        self
    }

    /// Bind a named parameter of a raw statement.
    #[must_use]
    pub fn bind_named(
        mut self,
        name: impl Into<String>,
        value: impl Into<crate::value::SqlValue>,
    ) -> Self {
        self.spec.named.push((name.into(), value.into()));
        self
    }

    /// Execute a row-producing statement as a lazy stream of rows.
    ///
    /// The connection is acquired on first poll, rows are delivered in
    /// driver order with one row of lookahead, and the connection is
    /// released when the stream completes, fails, or is dropped before
    /// exhaustion.
    #[must_use]
    pub fn fetch(self) -> RowStream<Row> {
        let Operation { inner, spec } = self;
        let stream = try_stream! {
            let dialect = resolve_dialect(&inner)?;
            let rendered = render(&spec, &dialect)?;
            debug!(sql = %rendered.sql, dialect = dialect.name(), "executing row query");
            let mut conn = inner
                .factory
                .acquire()
                .await
                .map_err(|e| translate(&dialect, e))?;
            let result = submit(conn.as_mut(), rendered, &dialect).await?;
            match result {
                ExecuteResult::Rows(mut rows) => {
                    while let Some(row) = rows.next().await {
                        let row = row.map_err(|e| translate(&dialect, e))?;
                        yield row;
                    }
                }
                ExecuteResult::RowsUpdated(_) => {
                    Err::<(), _>(SqlConduitError::usage(
                        "statement produced an update count; use rows_updated()",
                    ))?;
                }
            }
            // `conn` lives until here, so the session spans the whole stream
            // and is dropped on completion, error, or cancellation alike.
        };
        let inner: BoxStream<'static, Result<Row, SqlConduitError>> = Box::pin(stream);
        RowStream { inner }
    }

    /// Execute a row-producing statement, mapping each row to `T`.
    ///
    /// A row that fails to map surfaces as an error item; rows already
    /// delivered are unaffected and the stream continues with the next row.
    #[must_use]
    pub fn fetch_as<T: Mapped>(self) -> RowStream<T> {
        let mapper = RowMapper::new(self.inner.conversions.clone());
        let rows = self.fetch();
        let inner: BoxStream<'static, Result<T, SqlConduitError>> = Box::pin(
            rows.inner
                .map(move |item| item.and_then(|row| mapper.map_row::<T>(&row))),
        );
        RowStream { inner }
    }

    /// Execute a DML statement and return the affected-row count, available
    /// once the driver signals completion.
    ///
    /// # Errors
    /// Usage errors for malformed specs, an unresolved dialect, or any
    /// translated driver failure.
    pub async fn rows_updated(self) -> Result<u64, SqlConduitError> {
        let Operation { inner, spec } = self;
        let dialect = resolve_dialect(&inner)?;
        let rendered = render(&spec, &dialect)?;
        debug!(sql = %rendered.sql, dialect = dialect.name(), "executing update");
        let mut conn = inner
            .factory
            .acquire()
            .await
            .map_err(|e| translate(&dialect, e))?;
        let result = submit(conn.as_mut(), rendered, &dialect).await?;
        match result {
            ExecuteResult::RowsUpdated(count) => Ok(count),
            ExecuteResult::Rows(_) => Err(SqlConduitError::usage(
                "statement produced rows; use fetch()",
            )),
        }
    }
}

async fn submit(
    conn: &mut dyn Connection,
    rendered: RenderedStatement,
    dialect: &Dialect,
) -> Result<ExecuteResult, SqlConduitError> {
    let mut stmt = conn
        .create_statement(&rendered.sql)
        .map_err(|e| translate(dialect, e))?;
    for (index, value) in rendered.bindings.into_iter().enumerate() {
        stmt.bind(index, value).map_err(|e| translate(dialect, e))?;
    }
    stmt.execute().await.map_err(|e| translate(dialect, e))
}

/// A lazy, pull-driven sequence of results.
///
/// No work happens until the first poll. Dropping the stream before
/// exhaustion releases the underlying connection; it does not guarantee the
/// server-side statement is aborted.
pub struct RowStream<T = Row> {
    inner: BoxStream<'static, Result<T, SqlConduitError>>,
}

impl<T> Stream for RowStream<T> {
    type Item = Result<T, SqlConduitError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T> RowStream<T> {
    /// Collect every remaining result, stopping at the first error.
    ///
    /// # Errors
    /// The first stream error, translated.
    pub async fn fetch_all(mut self) -> Result<Vec<T>, SqlConduitError> {
        let mut rows = Vec::new();
        while let Some(item) = self.inner.next().await {
            rows.push(item?);
        }
        Ok(rows)
    }

    /// The first result, if any, releasing the connection immediately after.
    ///
    /// # Errors
    /// The first stream error, translated.
    pub async fn fetch_optional(mut self) -> Result<Option<T>, SqlConduitError> {
        match self.inner.next().await {
            Some(item) => Ok(Some(item?)),
            None => Ok(None),
        }
    }

    /// Exactly the first result.
    ///
    /// # Errors
    /// A usage error if the query produced no rows, otherwise the first
    /// stream error.
    pub async fn fetch_one(self) -> Result<T, SqlConduitError> {
        self.fetch_optional()
            .await?
            .ok_or_else(|| SqlConduitError::usage("query produced no rows"))
    }
}
