//! # Parameter tables
//!
//! Defines the column-oriented container for posterior draws: one named
//! column per parameter, one row per posterior draw, columns aligned by
//! draw index.
//!
//! # Examples
//!
//! ```
//! use posterior_summaries::ParameterTable;
//!
//! let table = ParameterTable::from_columns(vec![
//!     ("b_Intercept", vec![0.1, 0.2, 0.3]),
//!     ("b_x", vec![1.0, 1.1, 0.9]),
//! ])
//! .expect("aligned columns");
//!
//! assert_eq!(table.n_rows(), 3);
//! assert_eq!(table.names().collect::<Vec<_>>(), vec!["b_Intercept", "b_x"]);
//! ```
//!
//! ```
//! use posterior_summaries::ParameterTable;
//!
//! let table = ParameterTable::from_columns(vec![
//!     ("a", vec![0.1, 0.2, 0.3]),
//!     ("b", vec![1.0, 1.1]),
//! ]);
//!
//! assert!(table.is_err());
//! ```

use faer::Mat;
use indexmap::IndexMap;
use thiserror::Error;

pub mod groups;

pub use groups::ParameterGroups;

/// Errors returned when building or slicing parameter tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("parameter `{name}` appears more than once")]
    DuplicateParameter { name: String },
    #[error("parameter `{name}` has {len} draws but the table has {rows} rows")]
    LengthMismatch { name: String, len: usize, rows: usize },
    #[error("row index {index} is out of bounds for a table with {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },
    #[error("parameter `{name}` is not present in the table")]
    UnknownParameter { name: String },
    #[error("parameter `{name}` is not assigned to any group")]
    UngroupedParameter { name: String },
    #[error("parameter `{name}` is already assigned to group `{existing}`, not `{requested}`")]
    ConflictingGroup {
        name: String,
        existing: String,
        requested: String,
    },
}

/// Posterior draws keyed by parameter name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    columns: IndexMap<String, Vec<f64>>,
    n_rows: usize,
}

impl ParameterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding one column.
    #[must_use]
    pub fn from_column(name: impl Into<String>, values: Vec<f64>) -> Self {
        let n_rows = values.len();
        let mut columns = IndexMap::with_capacity(1);
        columns.insert(name.into(), values);
        Self { columns, n_rows }
    }

    /// Build a table from `(name, draws)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if a name repeats or column lengths differ.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if the name already exists or the length does not
    /// match the existing rows.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(TableError::DuplicateParameter { name });
        }
        if self.columns.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                name,
                len: values.len(),
                rows: self.n_rows,
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the table holds no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Copy the given rows, in the given order, into a new table.
    ///
    /// # Errors
    ///
    /// Returns `TableError::RowOutOfBounds` if any index exceeds the row count.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self, TableError> {
        if let Some(&index) = indices.iter().find(|&&index| index >= self.n_rows) {
            return Err(TableError::RowOutOfBounds {
                index,
                rows: self.n_rows,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let selected = indices.iter().map(|&row| values[row]).collect();
                (name.clone(), selected)
            })
            .collect();
        Ok(Self {
            columns,
            n_rows: indices.len(),
        })
    }

    /// Copy the named columns, in the given order, into a new table.
    ///
    /// # Errors
    ///
    /// Returns `TableError::UnknownParameter` if a name is absent.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, TableError> {
        let mut selected = Self::new();
        for name in names {
            let name = name.as_ref();
            let values = self
                .columns
                .get(name)
                .ok_or_else(|| TableError::UnknownParameter {
                    name: name.to_string(),
                })?;
            selected.push_column(name, values.clone())?;
        }
        if selected.is_empty() {
            selected.n_rows = self.n_rows;
        }
        Ok(selected)
    }

    /// Draws as an `n_rows x n_cols` matrix in column order.
    #[must_use]
    pub fn to_matrix(&self) -> Mat<f64> {
        let columns: Vec<&Vec<f64>> = self.columns.values().collect();
        Mat::from_fn(self.n_rows, columns.len(), |i, j| columns[j][i])
    }
}
