//! Immutable statement descriptions and their fluent builders.
//!
//! A [`StatementSpec`] is a value: builders consume and return it by value,
//! so no mutable builder state is ever shared. Rendering happens later, once
//! a dialect is known.

use crate::value::SqlValue;

mod raw;
mod render;

pub use render::{RenderedStatement, render};

/// The kind of logical operation a spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Raw,
    Insert,
    Select,
    Update,
    Delete,
}

/// Comparison operators usable in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Comparison {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Like => "LIKE",
        }
    }
}

/// A predicate tree: column/operator/value comparisons combined with
/// conjunctions and disjunctions.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: Comparison,
        value: SqlValue,
    },
    IsNull {
        column: String,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn compare(column: impl Into<String>, op: Comparison, value: impl Into<SqlValue>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    #[must_use]
    pub fn ne(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ne, value)
    }

    #[must_use]
    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Gt, value)
    }

    #[must_use]
    pub fn ge(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ge, value)
    }

    #[must_use]
    pub fn lt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Lt, value)
    }

    #[must_use]
    pub fn le(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Le, value)
    }

    #[must_use]
    pub fn like(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Like, value)
    }

    #[must_use]
    pub fn is_null(column: impl Into<String>) -> Self {
        Predicate::IsNull {
            column: column.into(),
        }
    }

    /// Conjoin with another predicate, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Disjoin with another predicate, flattening nested disjunctions.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub descending: bool,
}

/// An immutable description of one logical database operation, prior to SQL
/// rendering. Carries no execution state; it is rendered once per execution
/// attempt and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpec {
    pub(crate) kind: StatementKind,
    pub(crate) table: String,
    /// Projected (SELECT) or assigned (INSERT) columns.
    pub(crate) columns: Vec<String>,
    /// INSERT rows; every row matches `columns` in length and order.
    pub(crate) rows: Vec<Vec<SqlValue>>,
    /// UPDATE SET pairs.
    pub(crate) assignments: Vec<(String, SqlValue)>,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) sort: Vec<Sort>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    /// RAW statement text with neutral `?` / `:name` placeholders.
    pub(crate) sql: Option<String>,
    /// RAW positional bind values, in declaration order.
    pub(crate) positional: Vec<SqlValue>,
    /// RAW named bind values.
    pub(crate) named: Vec<(String, SqlValue)>,
}

impl StatementSpec {
    fn empty(kind: StatementKind, table: String) -> Self {
        Self {
            kind,
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            assignments: Vec::new(),
            predicate: None,
            sort: Vec::new(),
            limit: None,
            offset: None,
            sql: None,
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }
}

/// Builder for raw SQL with neutral placeholders.
///
/// Positional parameters use `?`, named parameters use `:name`; both are
/// substituted with the dialect's markers at render time.
#[derive(Debug, Clone)]
pub struct Sql {
    spec: StatementSpec,
}

impl Sql {
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        let mut spec = StatementSpec::empty(StatementKind::Raw, String::new());
        spec.sql = Some(sql.into());
        Self { spec }
    }

    /// Bind the next positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.spec.positional.push(value.into());
        self
    }

    /// Bind a named parameter, referenced as `:name` in the SQL text.
    #[must_use]
    pub fn bind_named(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.spec.named.push((name.into(), value.into()));
        self
    }
}

impl From<Sql> for StatementSpec {
    fn from(builder: Sql) -> Self {
        builder.spec
    }
}

/// Builder for structured INSERT statements.
#[derive(Debug, Clone)]
pub struct Insert {
    spec: StatementSpec,
}

impl Insert {
    #[must_use]
    pub fn into_table(table: impl Into<String>) -> Self {
        Self {
            spec: StatementSpec::empty(StatementKind::Insert, table.into()),
        }
    }

    /// Add a single column/value pair to the first row.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.spec.columns.push(column.into());
        if self.spec.rows.is_empty() {
            self.spec.rows.push(Vec::new());
        }
        self.spec.rows[0].push(value.into());
        self
    }

    /// Set the column list for multi-row inserts.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one VALUES tuple; must match the column list in length.
    #[must_use]
    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.spec
            .rows
            .push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Add all column/value pairs from a prebuilt assignment list, e.g. the
    /// output of an entity writer.
    #[must_use]
    pub fn values(mut self, assignments: Vec<(String, SqlValue)>) -> Self {
        for (column, value) in assignments {
            self = self.value(column, value);
        }
        self
    }
}

impl From<Insert> for StatementSpec {
    fn from(builder: Insert) -> Self {
        builder.spec
    }
}

/// Builder for structured SELECT statements.
#[derive(Debug, Clone)]
pub struct Select {
    spec: StatementSpec,
}

impl Select {
    #[must_use]
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            spec: StatementSpec::empty(StatementKind::Select, table.into()),
        }
    }

    /// Set the projected columns; an empty projection renders `*`.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a predicate, conjoined with any already present.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.spec.predicate = Some(match self.spec.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.spec.sort.push(Sort {
            column: column.into(),
            descending: false,
        });
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.spec.sort.push(Sort {
            column: column.into(),
            descending: true,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = Some(offset);
        self
    }
}

impl From<Select> for StatementSpec {
    fn from(builder: Select) -> Self {
        builder.spec
    }
}

/// Builder for structured UPDATE statements.
#[derive(Debug, Clone)]
pub struct Update {
    spec: StatementSpec,
}

impl Update {
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            spec: StatementSpec::empty(StatementKind::Update, table.into()),
        }
    }

    /// Add one SET assignment. An UPDATE with no assignments fails at
    /// render time rather than silently doing nothing.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.spec.assignments.push((column.into(), value.into()));
        self
    }

    /// Add all assignments from a prebuilt list.
    #[must_use]
    pub fn set_all(mut self, assignments: Vec<(String, SqlValue)>) -> Self {
        self.spec.assignments.extend(assignments);
        self
    }

    /// Add a predicate, conjoined with any already present.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.spec.predicate = Some(match self.spec.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }
}

impl From<Update> for StatementSpec {
    fn from(builder: Update) -> Self {
        builder.spec
    }
}

/// Builder for structured DELETE statements.
#[derive(Debug, Clone)]
pub struct Delete {
    spec: StatementSpec,
}

impl Delete {
    #[must_use]
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            spec: StatementSpec::empty(StatementKind::Delete, table.into()),
        }
    }

    /// Add a predicate, conjoined with any already present.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.spec.predicate = Some(match self.spec.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }
}

impl From<Delete> for StatementSpec {
    fn from(builder: Delete) -> Self {
        builder.spec
    }
}
