//! Row/object mapping: precomputed per-type descriptors driving
//! row-to-object construction and object-to-assignment extraction.
//!
//! A [`MappingDescriptor`] is built once per application type (typically in
//! a `OnceLock` inside the type's [`Mapped`] impl) and is immutable after
//! that, so concurrent lookups need no locking.

use std::sync::Arc;

use crate::error::SqlConduitError;
use crate::mapping::convert::ConversionService;
use crate::row::Row;
use crate::value::{SqlType, SqlValue};

pub mod convert;

/// Default column-name convention: camel case to snake case.
/// Rust field names are usually snake case already; this covers explicitly
/// camel-cased property names and passes snake case through unchanged.
#[must_use]
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One persistable property of an application type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: &'static str,
    column: String,
    sql_type: SqlType,
    id: bool,
    generated: bool,
    nullable: bool,
    transient: bool,
}

impl PropertyDescriptor {
    /// A property whose column name follows the default convention.
    #[must_use]
    pub fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            column: camel_to_snake(name),
            sql_type,
            id: false,
            generated: false,
            nullable: false,
            transient: false,
        }
    }

    /// Override the mapped column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Mark as the identifier property.
    #[must_use]
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Mark the identifier as database-generated; excluded from INSERT
    /// assignments.
    #[must_use]
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Allow NULL to be written for this property.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Exclude from both reading and writing.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    #[must_use]
    pub fn is_id(&self) -> bool {
        self.id
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

type ConstructorFn<T> = fn(Vec<SqlValue>) -> Result<T, String>;
type CreateFn<T> = fn() -> T;
type AssignFn<T> = fn(&mut T, &str, SqlValue) -> Result<(), String>;
type ReadFn<T> = fn(&T, &str) -> Option<SqlValue>;

/// Precomputed mapping metadata for one application type.
///
/// Construction prefers the positional path when the row covers every
/// non-transient property; otherwise it falls back to create-then-assign,
/// leaving missing properties at their defaults.
pub struct MappingDescriptor<T> {
    table: String,
    properties: Vec<PropertyDescriptor>,
    constructor: Option<ConstructorFn<T>>,
    create: Option<CreateFn<T>>,
    assign: Option<AssignFn<T>>,
    read: Option<ReadFn<T>>,
}

impl<T> MappingDescriptor<T> {
    #[must_use]
    pub fn builder(table: impl Into<String>) -> MappingDescriptorBuilder<T> {
        MappingDescriptorBuilder {
            descriptor: MappingDescriptor {
                table: table.into(),
                properties: Vec::new(),
                constructor: None,
                create: None,
                assign: None,
                read: None,
            },
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// The identifier property, if one is marked.
    #[must_use]
    pub fn id_property(&self) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.is_id())
    }
}

/// Builder for [`MappingDescriptor`]; finished descriptors are immutable.
pub struct MappingDescriptorBuilder<T> {
    descriptor: MappingDescriptor<T>,
}

impl<T> MappingDescriptorBuilder<T> {
    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.descriptor.properties.push(property);
        self
    }

    /// Positional construction: receives one converted value per
    /// non-transient property, in declaration order.
    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorFn<T>) -> Self {
        self.descriptor.constructor = Some(constructor);
        self
    }

    /// Fallback construction: create a default instance, then assign
    /// matching properties one by one.
    #[must_use]
    pub fn assignable(mut self, create: CreateFn<T>, assign: AssignFn<T>) -> Self {
        self.descriptor.create = Some(create);
        self.descriptor.assign = Some(assign);
        self
    }

    /// Property read-back, required for entity writing.
    #[must_use]
    pub fn read_with(mut self, read: ReadFn<T>) -> Self {
        self.descriptor.read = Some(read);
        self
    }

    #[must_use]
    pub fn build(self) -> MappingDescriptor<T> {
        self.descriptor
    }
}

/// A type with a process-lifetime mapping descriptor.
pub trait Mapped: Sized + Send + 'static {
    fn descriptor() -> &'static MappingDescriptor<Self>;
}

/// Converts rows into mapped application objects.
pub struct RowMapper {
    conversions: Arc<ConversionService>,
}

impl RowMapper {
    #[must_use]
    pub fn new(conversions: Arc<ConversionService>) -> Self {
        Self { conversions }
    }

    /// Map one row to `T`.
    ///
    /// Columns with no matching property are tolerated; properties with no
    /// matching column stay at their defaults on the assign path. The
    /// positional path is taken only when the row covers every
    /// non-transient property.
    ///
    /// # Errors
    /// [`SqlConduitError::Mapping`] when a value has no applicable
    /// converter or the type offers no construction path for this row.
    pub fn map_row<T: Mapped>(&self, row: &Row) -> Result<T, SqlConduitError> {
        let descriptor = T::descriptor();
        let mut values: Vec<Option<SqlValue>> = Vec::with_capacity(descriptor.properties().len());
        for property in descriptor.properties() {
            if property.is_transient() {
                values.push(None);
                continue;
            }
            match row.get(property.column_name()) {
                Some(value) => {
                    let converted = self
                        .conversions
                        .convert(value.clone(), property.sql_type())
                        .map_err(|e| {
                            SqlConduitError::mapping(format!(
                                "column `{}`: {e}",
                                property.column_name()
                            ))
                        })?;
                    values.push(Some(converted));
                }
                None => values.push(None),
            }
        }

        let complete = descriptor
            .properties()
            .iter()
            .zip(&values)
            .all(|(p, v)| p.is_transient() || v.is_some());

        if complete {
            if let Some(constructor) = descriptor.constructor {
                let args = values.into_iter().flatten().collect();
                return constructor(args).map_err(SqlConduitError::mapping);
            }
        }
        if let (Some(create), Some(assign)) = (descriptor.create, descriptor.assign) {
            let mut instance = create();
            for (property, value) in descriptor.properties().iter().zip(values) {
                if let Some(value) = value {
                    assign(&mut instance, property.name(), value)
                        .map_err(SqlConduitError::mapping)?;
                }
            }
            return Ok(instance);
        }
        Err(SqlConduitError::mapping(format!(
            "type `{}` has no applicable construction for this row",
            std::any::type_name::<T>()
        )))
    }
}

/// Extracts ordered column/value assignments from mapped objects, the
/// inverse of [`RowMapper`].
pub struct EntityWriter;

impl EntityWriter {
    /// All writable assignments, in property declaration order. NULL values
    /// are skipped unless the property is explicitly nullable; transient
    /// properties are always skipped.
    ///
    /// # Errors
    /// [`SqlConduitError::Mapping`] when the type has no property reader or
    /// a property cannot be read back.
    pub fn to_assignments<T: Mapped>(entity: &T) -> Result<Vec<(String, SqlValue)>, SqlConduitError> {
        Self::assignments(entity, false)
    }

    /// Assignments for an INSERT: like [`EntityWriter::to_assignments`],
    /// additionally excluding a database-generated identifier.
    ///
    /// # Errors
    /// Same as [`EntityWriter::to_assignments`].
    pub fn insert_assignments<T: Mapped>(
        entity: &T,
    ) -> Result<Vec<(String, SqlValue)>, SqlConduitError> {
        Self::assignments(entity, true)
    }

    fn assignments<T: Mapped>(
        entity: &T,
        for_insert: bool,
    ) -> Result<Vec<(String, SqlValue)>, SqlConduitError> {
        let descriptor = T::descriptor();
        let read = descriptor.read.ok_or_else(|| {
            SqlConduitError::mapping(format!(
                "type `{}` has no property reader",
                std::any::type_name::<T>()
            ))
        })?;
        let mut assignments = Vec::with_capacity(descriptor.properties().len());
        for property in descriptor.properties() {
            if property.is_transient() {
                continue;
            }
            if for_insert && property.is_id() && property.is_generated() {
                continue;
            }
            let value = read(entity, property.name()).ok_or_else(|| {
                SqlConduitError::mapping(format!(
                    "property `{}` could not be read back",
                    property.name()
                ))
            })?;
            if value.is_null() && !property.is_nullable() {
                continue;
            }
            assignments.push((property.column_name().to_string(), value));
        }
        Ok(assignments)
    }
}
