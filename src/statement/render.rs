use std::borrow::Cow;

use crate::dialect::{BindMarkers, Dialect};
use crate::error::SqlConduitError;
use crate::statement::{raw, Predicate, StatementKind, StatementSpec};
use crate::value::SqlValue;

/// Literal SQL text plus the bind values in marker order, ready for the
/// driver.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

/// Compile a statement spec against a dialect.
///
/// Rendering is a pure function of `(spec, dialect)`: the same inputs always
/// produce the same SQL text and bind ordering. A fresh marker factory is
/// used per call so positional numbering restarts at 1.
///
/// # Errors
/// Returns a usage error for malformed specs: unbound or surplus
/// placeholders, an UPDATE with no assignments, an INSERT with no columns or
/// mismatched rows, or a multi-row INSERT against a dialect without
/// multi-row support.
pub fn render(spec: &StatementSpec, dialect: &Dialect) -> Result<RenderedStatement, SqlConduitError> {
    if spec.kind != StatementKind::Raw && (!spec.positional.is_empty() || !spec.named.is_empty()) {
        return Err(SqlConduitError::usage(
            "positional/named parameters are only valid on raw statements",
        ));
    }
    let mut markers = dialect.bind_markers();
    match spec.kind {
        StatementKind::Raw => render_raw(spec, dialect, &mut markers),
        StatementKind::Insert => render_insert(spec, dialect, &mut markers),
        StatementKind::Select => render_select(spec, dialect, &mut markers),
        StatementKind::Update => render_update(spec, dialect, &mut markers),
        StatementKind::Delete => render_delete(spec, dialect, &mut markers),
    }
}

fn render_raw(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
) -> Result<RenderedStatement, SqlConduitError> {
    let text = spec
        .sql
        .as_deref()
        .ok_or_else(|| SqlConduitError::usage("raw statement has no SQL text"))?;
    let (sql, bindings) = raw::substitute(text, markers, &spec.positional, &spec.named)?;
    let bindings = bindings
        .into_iter()
        .map(|v| encode_for(dialect, v))
        .collect();
    Ok(RenderedStatement { sql, bindings })
}

fn render_insert(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
) -> Result<RenderedStatement, SqlConduitError> {
    if spec.columns.is_empty() {
        return Err(SqlConduitError::usage("INSERT requires at least one column"));
    }
    if spec.rows.is_empty() {
        return Err(SqlConduitError::usage("INSERT requires at least one row"));
    }
    if spec.rows.len() > 1 && !dialect.supports_multi_row_insert() {
        return Err(SqlConduitError::usage(format!(
            "dialect `{}` does not support multi-row INSERT",
            dialect.name()
        )));
    }

    let mut sql = format!("INSERT INTO {} (", ident(dialect, &spec.table));
    for (i, column) in spec.columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&ident(dialect, column));
    }
    sql.push_str(") VALUES ");

    let mut bindings = Vec::with_capacity(spec.columns.len() * spec.rows.len());
    for (r, row) in spec.rows.iter().enumerate() {
        if row.len() != spec.columns.len() {
            return Err(SqlConduitError::usage(format!(
                "INSERT row {} has {} values for {} columns",
                r + 1,
                row.len(),
                spec.columns.len()
            )));
        }
        if r > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&markers.next().placeholder);
            bindings.push(encode_for(dialect, value.clone()));
        }
        sql.push(')');
    }
    Ok(RenderedStatement { sql, bindings })
}

fn render_select(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
) -> Result<RenderedStatement, SqlConduitError> {
    let mut sql = String::from("SELECT ");
    if spec.columns.is_empty() {
        sql.push('*');
    } else {
        for (i, column) in spec.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&ident(dialect, column));
        }
    }
    sql.push_str(" FROM ");
    sql.push_str(&ident(dialect, &spec.table));

    let mut bindings = Vec::new();
    push_where(spec, dialect, markers, &mut sql, &mut bindings)?;

    if !spec.sort.is_empty() {
        sql.push_str(" ORDER BY ");
        for (i, sort) in spec.sort.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&ident(dialect, &sort.column));
            if sort.descending {
                sql.push_str(" DESC");
            }
        }
    }

    if let Some(paging) = dialect.render_paging(spec.limit, spec.offset) {
        sql.push(' ');
        sql.push_str(&paging);
    }
    Ok(RenderedStatement { sql, bindings })
}

fn render_update(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
) -> Result<RenderedStatement, SqlConduitError> {
    if spec.assignments.is_empty() {
        return Err(SqlConduitError::usage(
            "UPDATE with no assignments would be a silent no-op",
        ));
    }
    let mut sql = format!("UPDATE {} SET ", ident(dialect, &spec.table));
    let mut bindings = Vec::with_capacity(spec.assignments.len());
    for (i, (column, value)) in spec.assignments.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&ident(dialect, column));
        sql.push_str(" = ");
        sql.push_str(&markers.next().placeholder);
        bindings.push(encode_for(dialect, value.clone()));
    }
    push_where(spec, dialect, markers, &mut sql, &mut bindings)?;
    Ok(RenderedStatement { sql, bindings })
}

fn render_delete(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
) -> Result<RenderedStatement, SqlConduitError> {
    let mut sql = format!("DELETE FROM {}", ident(dialect, &spec.table));
    let mut bindings = Vec::new();
    push_where(spec, dialect, markers, &mut sql, &mut bindings)?;
    Ok(RenderedStatement { sql, bindings })
}

// An empty predicate renders no WHERE clause at all.
fn push_where(
    spec: &StatementSpec,
    dialect: &Dialect,
    markers: &mut BindMarkers,
    sql: &mut String,
    bindings: &mut Vec<SqlValue>,
) -> Result<(), SqlConduitError> {
    if let Some(predicate) = &spec.predicate {
        sql.push_str(" WHERE ");
        render_predicate(predicate, dialect, markers, sql, bindings)?;
    }
    Ok(())
}

fn render_predicate(
    predicate: &Predicate,
    dialect: &Dialect,
    markers: &mut BindMarkers,
    sql: &mut String,
    bindings: &mut Vec<SqlValue>,
) -> Result<(), SqlConduitError> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            sql.push_str(&ident(dialect, column));
            sql.push(' ');
            sql.push_str(op.sql());
            sql.push(' ');
            sql.push_str(&markers.next().placeholder);
            bindings.push(encode_for(dialect, value.clone()));
        }
        Predicate::IsNull { column } => {
            sql.push_str(&ident(dialect, column));
            sql.push_str(" IS NULL");
        }
        Predicate::And(parts) => {
            if parts.is_empty() {
                return Err(SqlConduitError::usage("empty conjunction in predicate"));
            }
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                render_predicate(part, dialect, markers, sql, bindings)?;
            }
        }
        Predicate::Or(parts) => {
            if parts.is_empty() {
                return Err(SqlConduitError::usage("empty disjunction in predicate"));
            }
            sql.push('(');
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" OR ");
                }
                render_predicate(part, dialect, markers, sql, bindings)?;
            }
            sql.push(')');
        }
    }
    Ok(())
}

// Quote only identifiers that need it, so plain names render bare.
fn ident<'a>(dialect: &Dialect, name: &'a str) -> Cow<'a, str> {
    let plain = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(dialect.quote_identifier(name))
    }
}

/// Apply the dialect's bind-type filter: values the backend cannot bind
/// directly are encoded to a bindable representation.
fn encode_for(dialect: &Dialect, value: SqlValue) -> SqlValue {
    let Some(sql_type) = value.sql_type() else {
        return value;
    };
    if dialect.binds_directly(sql_type) {
        return value;
    }
    match value {
        SqlValue::Json(json) => SqlValue::Text(json.to_string()),
        SqlValue::Timestamp(ts) => SqlValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        SqlValue::Bool(b) => SqlValue::Int(i64::from(b)),
        other => other,
    }
}
