//! Convenient imports for common functionality.

pub use crate::dialect::{ConnectionMetadata, Dialect, DialectProvider, DialectRegistry};
pub use crate::driver::{Connection, ConnectionFactory, DriverError, ExecuteResult, Statement};
pub use crate::engine::{DatabaseClient, Operation, RowStream};
pub use crate::error::{ErrorKind, SqlConduitError};
pub use crate::mapping::convert::ConversionService;
pub use crate::mapping::{EntityWriter, Mapped, MappingDescriptor, PropertyDescriptor, RowMapper};
pub use crate::row::Row;
pub use crate::statement::{Delete, Insert, Predicate, Select, Sql, Update};
pub use crate::value::{SqlType, SqlValue};
