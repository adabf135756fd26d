use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::SqlConduitError;

/// Product name and version reported by a live connection, used to pick a
/// dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetadata {
    pub product_name: String,
    pub version: String,
}

impl ConnectionMetadata {
    #[must_use]
    pub fn new(product_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            version: version.into(),
        }
    }
}

/// One entry in the resolution chain: a predicate over connection metadata
/// and the dialect it selects.
pub struct DialectProvider {
    dialect: Arc<Dialect>,
    predicate: Box<dyn Fn(&ConnectionMetadata) -> bool + Send + Sync>,
}

impl DialectProvider {
    /// A provider with an arbitrary predicate.
    pub fn new(
        dialect: Arc<Dialect>,
        predicate: impl Fn(&ConnectionMetadata) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            dialect,
            predicate: Box::new(predicate),
        }
    }

    /// A provider matching on a case-insensitive product-name substring.
    pub fn product_contains(dialect: Arc<Dialect>, needle: &'static str) -> Self {
        Self::new(dialect, move |meta| {
            meta.product_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
    }

    #[must_use]
    pub fn matches(&self, metadata: &ConnectionMetadata) -> bool {
        (self.predicate)(metadata)
    }
}

impl fmt::Debug for DialectProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectProvider")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

/// Ordered list of dialect providers.
///
/// Resolution walks the list in registration order; the first matching
/// provider wins. An unmatched product yields an explicit
/// [`SqlConduitError::UnresolvedDialect`] rather than a guessed default,
/// since rendering with the wrong marker syntax produces an opaque backend
/// error instead of a clear one.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    providers: Vec<DialectProvider>,
}

impl DialectRegistry {
    /// An empty registry; providers must be registered explicitly.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry preloaded with the built-in catalog, in order:
    /// PostgreSQL, MySQL/MariaDB, SQLite, SQL Server.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(DialectProvider::product_contains(
            Dialect::postgres(),
            "postgres",
        ));
        registry.register(DialectProvider::new(Dialect::mysql(), |meta| {
            let product = meta.product_name.to_lowercase();
            product.contains("mysql") || product.contains("mariadb")
        }));
        registry.register(DialectProvider::product_contains(
            Dialect::sqlite(),
            "sqlite",
        ));
        registry.register(DialectProvider::product_contains(
            Dialect::mssql(),
            "sql server",
        ));
        registry
    }

    /// Append a provider to the chain. Order matters: first registered,
    /// first matched.
    pub fn register(&mut self, provider: DialectProvider) {
        self.providers.push(provider);
    }

    /// Resolve a dialect for the given metadata. Deterministic: the same
    /// metadata always yields the same dialect.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::UnresolvedDialect`] when no provider
    /// matches; the caller may then supply a dialect explicitly.
    pub fn resolve(&self, metadata: &ConnectionMetadata) -> Result<Arc<Dialect>, SqlConduitError> {
        for provider in &self.providers {
            if provider.matches(metadata) {
                debug!(
                    product = %metadata.product_name,
                    dialect = provider.dialect.name(),
                    "resolved dialect"
                );
                return Ok(provider.dialect.clone());
            }
        }
        Err(SqlConduitError::UnresolvedDialect {
            product: metadata.product_name.clone(),
        })
    }
}
