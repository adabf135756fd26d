//! Async, driver-pluggable SQL access core.
//!
//! The crate covers three concerns: detecting which SQL dialect a backend
//! speaks and rewriting parameter placeholders for it, composing and lazily
//! executing logical statements over an abstract non-blocking driver, and
//! mapping rows to application objects and back.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sql_conduit::{DatabaseClient, Select, Predicate};
//! # use sql_conduit::ConnectionFactory;
//!
//! # async fn demo(factory: Arc<dyn ConnectionFactory>) -> Result<(), sql_conduit::SqlConduitError> {
//! let client = DatabaseClient::new(factory);
//! let adults = client
//!     .execute(Select::from_table("person").filter(Predicate::gt("age", 30_i64)))
//!     .fetch()
//!     .fetch_all()
//!     .await?;
//! # let _ = adults;
//! # Ok(()) }
//! ```

pub mod dialect;
pub mod driver;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod prelude;
pub mod row;
pub mod statement;
pub mod translate;
pub mod value;

pub use dialect::{
    BindMarker, BindMarkers, ConnectionMetadata, Dialect, DialectProvider, DialectRegistry,
    MarkerStyle, PagingStyle,
};
pub use driver::{Connection, ConnectionFactory, DriverError, ExecuteResult, Statement};
pub use engine::{DatabaseClient, Operation, RowStream};
pub use error::{ErrorKind, SqlConduitError};
pub use mapping::convert::{ConversionService, Converter};
pub use mapping::{EntityWriter, Mapped, MappingDescriptor, PropertyDescriptor, RowMapper};
pub use row::Row;
pub use statement::{
    render, Comparison, Delete, Insert, Predicate, RenderedStatement, Select, Sort, Sql,
    StatementKind, StatementSpec, Update,
};
pub use translate::{translate, ErrorCodes};
pub use value::{SqlType, SqlValue};
