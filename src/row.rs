use std::collections::HashMap;
use std::sync::Arc;

use crate::value::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set, together with a
/// case-insensitive name-to-index map built once per column list. A row is
/// read-only once constructed.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    // Lowercased name -> index, shared by every row of the result set.
    index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a row, building its own column index.
    ///
    /// When producing many rows with the same columns, build the index once
    /// with [`Row::index_for`] and use [`Row::from_parts`] instead.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let index = Self::index_for(&column_names);
        Self {
            column_names,
            values,
            index,
        }
    }

    /// Build the shared case-insensitive column index for a column list.
    ///
    /// The first of two columns with the same case-folded name wins.
    #[must_use]
    pub fn index_for(column_names: &Arc<Vec<String>>) -> Arc<HashMap<String, usize>> {
        let mut index = HashMap::with_capacity(column_names.len());
        for (i, name) in column_names.iter().enumerate() {
            index.entry(name.to_lowercase()).or_insert(i);
        }
        Arc::new(index)
    }

    /// Create a row reusing a prebuilt column index.
    #[must_use]
    pub fn from_parts(
        column_names: Arc<Vec<String>>,
        index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            index,
        }
    }

    /// The column names, in driver order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    /// Index of a column by name, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(column_name) {
            return Some(idx);
        }
        self.index.get(&column_name.to_lowercase()).copied()
    }

    /// Value of a column by name, matched case-insensitively.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value of a column by position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
