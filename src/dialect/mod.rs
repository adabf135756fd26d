//! SQL dialects: bind-marker syntax, identifier quoting, paging clauses,
//! capability flags, and the per-dialect error-code table.

use std::sync::{Arc, LazyLock};

use crate::translate::ErrorCodes;
use crate::value::SqlType;

mod bind;
mod resolver;

pub use bind::{BindMarker, BindMarkers, MarkerStyle};
pub use resolver::{ConnectionMetadata, DialectProvider, DialectRegistry};

/// How a dialect renders a limit/offset directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `LIMIT n [OFFSET m]` (PostgreSQL, MySQL, SQLite).
    LimitOffset,
    /// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]` (SQL Server).
    OffsetFetch,
}

/// A named bundle of syntax rules for one database product.
///
/// Immutable once constructed and shared read-only across every operation
/// against connections of that product.
#[derive(Debug)]
pub struct Dialect {
    name: &'static str,
    marker_style: MarkerStyle,
    quote_open: char,
    quote_close: char,
    paging: PagingStyle,
    multi_row_insert: bool,
    // Value types that must be encoded to text before binding.
    encoded_types: &'static [SqlType],
    codes: ErrorCodes,
}

impl Dialect {
    /// Construct a custom dialect for a backend outside the built-in catalog.
    #[must_use]
    pub fn custom(
        name: &'static str,
        marker_style: MarkerStyle,
        quote: (char, char),
        paging: PagingStyle,
        multi_row_insert: bool,
        encoded_types: &'static [SqlType],
        codes: ErrorCodes,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            marker_style,
            quote_open: quote.0,
            quote_close: quote.1,
            paging,
            multi_row_insert,
            encoded_types,
            codes,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn marker_style(&self) -> MarkerStyle {
        self.marker_style
    }

    /// A fresh marker factory for one statement render.
    #[must_use]
    pub fn bind_markers(&self) -> BindMarkers {
        BindMarkers::new(self.marker_style)
    }

    /// Whether one INSERT may carry multiple VALUES tuples.
    #[must_use]
    pub fn supports_multi_row_insert(&self) -> bool {
        self.multi_row_insert
    }

    /// Whether a value of this type may be bound as-is, or must be encoded
    /// to text first.
    #[must_use]
    pub fn binds_directly(&self, sql_type: SqlType) -> bool {
        !self.encoded_types.contains(&sql_type)
    }

    #[must_use]
    pub fn error_codes(&self) -> &ErrorCodes {
        &self.codes
    }

    /// Quote an identifier with the dialect's quote characters, doubling any
    /// embedded closing quote.
    #[must_use]
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(self.quote_open);
        for c in identifier.chars() {
            quoted.push(c);
            if c == self.quote_close {
                quoted.push(self.quote_close);
            }
        }
        quoted.push(self.quote_close);
        quoted
    }

    /// Render the paging clause for the given limit/offset, without a
    /// leading space. Returns `None` when neither is set.
    #[must_use]
    pub fn render_paging(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (self.paging, limit, offset) {
            (_, None, None) => None,
            (PagingStyle::LimitOffset, Some(l), Some(o)) => Some(format!("LIMIT {l} OFFSET {o}")),
            (PagingStyle::LimitOffset, Some(l), None) => Some(format!("LIMIT {l}")),
            (PagingStyle::LimitOffset, None, Some(o)) => Some(format!("OFFSET {o}")),
            (PagingStyle::OffsetFetch, l, o) => {
                let mut clause = format!("OFFSET {} ROWS", o.unwrap_or(0));
                if let Some(l) = l {
                    clause.push_str(&format!(" FETCH NEXT {l} ROWS ONLY"));
                }
                Some(clause)
            }
        }
    }

    /// The built-in PostgreSQL dialect (`$n` markers).
    #[must_use]
    pub fn postgres() -> Arc<Dialect> {
        static DIALECT: LazyLock<Arc<Dialect>> = LazyLock::new(|| {
            Dialect::custom(
                "postgres",
                MarkerStyle::IndexedDollar,
                ('"', '"'),
                PagingStyle::LimitOffset,
                true,
                &[],
                ErrorCodes::new(
                    &["23"],
                    &["40", "55P03", "57014"],
                    &["08", "53300", "57P01"],
                    &["42"],
                    &[],
                    &[],
                    &[],
                    &[],
                ),
            )
        });
        DIALECT.clone()
    }

    /// The built-in MySQL/MariaDB dialect (anonymous `?` markers).
    #[must_use]
    pub fn mysql() -> Arc<Dialect> {
        static DIALECT: LazyLock<Arc<Dialect>> = LazyLock::new(|| {
            Dialect::custom(
                "mysql",
                MarkerStyle::Anonymous,
                ('`', '`'),
                PagingStyle::LimitOffset,
                true,
                &[SqlType::Json],
                ErrorCodes::new(
                    &["23"],
                    &[],
                    &["08"],
                    &["42"],
                    &[1048, 1062, 1451, 1452],
                    &[1205, 1213],
                    &[1042, 1043, 2002, 2003, 2006, 2013],
                    &[1054, 1064, 1146],
                ),
            )
        });
        DIALECT.clone()
    }

    /// The built-in SQLite dialect (`?n` markers).
    #[must_use]
    pub fn sqlite() -> Arc<Dialect> {
        static DIALECT: LazyLock<Arc<Dialect>> = LazyLock::new(|| {
            Dialect::custom(
                "sqlite",
                MarkerStyle::IndexedQuestion,
                ('"', '"'),
                PagingStyle::LimitOffset,
                true,
                &[SqlType::Json],
                ErrorCodes::new(
                    &[],
                    &[],
                    &[],
                    &[],
                    &[19, 787, 1555, 2067],
                    &[5, 6],
                    &[14],
                    &[1],
                ),
            )
        });
        DIALECT.clone()
    }

    /// The built-in SQL Server dialect (`@Pn` markers, no multi-row
    /// VALUES via this renderer).
    #[must_use]
    pub fn mssql() -> Arc<Dialect> {
        static DIALECT: LazyLock<Arc<Dialect>> = LazyLock::new(|| {
            Dialect::custom(
                "mssql",
                MarkerStyle::NamedAt,
                ('[', ']'),
                PagingStyle::OffsetFetch,
                false,
                &[SqlType::Json],
                ErrorCodes::new(
                    &["23"],
                    &[],
                    &["08"],
                    &["42"],
                    &[547, 2601, 2627],
                    &[1205, -2],
                    &[53, 10054],
                    &[102, 105, 207, 208],
                ),
            )
        });
        DIALECT.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(Dialect::postgres().quote_identifier("order"), "\"order\"");
        assert_eq!(
            Dialect::postgres().quote_identifier("we\"ird"),
            "\"we\"\"ird\""
        );
        assert_eq!(Dialect::mssql().quote_identifier("select"), "[select]");
    }

    #[test]
    fn paging_clauses() {
        let pg = Dialect::postgres();
        assert_eq!(pg.render_paging(None, None), None);
        assert_eq!(
            pg.render_paging(Some(10), Some(5)).as_deref(),
            Some("LIMIT 10 OFFSET 5")
        );
        assert_eq!(pg.render_paging(Some(10), None).as_deref(), Some("LIMIT 10"));

        let ms = Dialect::mssql();
        assert_eq!(
            ms.render_paging(Some(10), Some(5)).as_deref(),
            Some("OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY")
        );
        assert_eq!(
            ms.render_paging(Some(10), None).as_deref(),
            Some("OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY")
        );
    }

    #[test]
    fn json_requires_encoding_outside_postgres() {
        assert!(Dialect::postgres().binds_directly(SqlType::Json));
        assert!(!Dialect::mysql().binds_directly(SqlType::Json));
        assert!(Dialect::mysql().binds_directly(SqlType::Text));
    }
}
