//! In-memory rectangular record table.
//!
//! [`RecordTable`] is the single result type of both retrieval paths: live
//! query responses become tables of JSON records, bulk archives become tables
//! of tab-separated text cells. Tables support column assignment,
//! concatenation across fragments and row-index reset.
//!
//! Concatenation aligns columns by name. Columns missing from one fragment are
//! filled with [`Cell::Null`], and row labels keep their per-fragment values
//! until [`RecordTable::reset_index`] renumbers them.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by table construction and reshaping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// A record in a JSON array was not an object.
    #[error("record {position} is not a JSON object")]
    NotARecord {
        /// Zero-based position of the offending record.
        position: usize,
    },

    /// Column assignment with the wrong number of names.
    #[error("cannot assign {actual} column names to a table with {expected} columns")]
    ColumnCountMismatch {
        /// Current table width.
        expected: usize,
        /// Number of names supplied.
        actual: usize,
    },

    /// A pushed row does not match the table width.
    #[error("row has {actual} cells but the table has {expected} columns")]
    RowWidthMismatch {
        /// Current table width.
        expected: usize,
        /// Number of cells in the row.
        actual: usize,
    },
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Normalized timestamp (UTC, second resolution).
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Returns the text content, if this is a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns true for [`Cell::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Value::String(s) => Self::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Text(nested.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered collection of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    index: Vec<usize>,
    rows: Vec<Vec<Cell>>,
}

impl RecordTable {
    /// Creates an empty table with the given column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty table whose columns are labelled by position.
    #[must_use]
    pub fn with_width(width: usize) -> Self {
        Self::new((0..width).map(|i| i.to_string()))
    }

    /// Builds a table from an array of JSON objects.
    ///
    /// Columns appear in first-seen key order across all records.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotARecord`] if an element is not an object.
    pub fn from_json_records(records: Vec<Value>) -> Result<Self, TableError> {
        let mut objects = Vec::with_capacity(records.len());
        let mut columns: Vec<String> = Vec::new();
        for (position, record) in records.into_iter().enumerate() {
            let Value::Object(object) = record else {
                return Err(TableError::NotARecord { position });
            };
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
            objects.push(object);
        }

        let mut table = Self::new(columns);
        for mut object in objects {
            let row = table
                .columns
                .iter()
                .map(|column| object.remove(column).map_or(Cell::Null, Cell::from))
                .collect();
            table.push_row_unchecked(row);
        }
        Ok(table)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowWidthMismatch`] if the row width differs
    /// from the table width.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.width() {
            return Err(TableError::RowWidthMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }
        self.push_row_unchecked(row);
        Ok(())
    }

    fn push_row_unchecked(&mut self, row: Vec<Cell>) {
        self.index.push(self.rows.len());
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row labels in order.
    #[must_use]
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the cells of one column, or `None` if the column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let position = self.column_position(name)?;
        Some(self.rows.iter().map(|row| &row[position]).collect())
    }

    /// Replaces every cell of a column with the output of `f`.
    ///
    /// Returns `Ok(false)` without calling `f` if the column is absent.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`; earlier cells stay converted.
    pub fn map_column<F, E>(&mut self, name: &str, mut f: F) -> Result<bool, E>
    where
        F: FnMut(&Cell) -> Result<Cell, E>,
    {
        let Some(position) = self.column_position(name) else {
            return Ok(false);
        };
        for row in &mut self.rows {
            row[position] = f(&row[position])?;
        }
        Ok(true)
    }

    /// Assigns new column names.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnCountMismatch`] if the number of names
    /// differs from the table width.
    pub fn set_columns<I, S>(&mut self, names: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.width() {
            return Err(TableError::ColumnCountMismatch {
                expected: self.width(),
                actual: names.len(),
            });
        }
        self.columns = names;
        Ok(())
    }

    /// Renumbers row labels to `0..len`.
    pub fn reset_index(&mut self) {
        self.index = (0..self.rows.len()).collect();
    }

    /// Concatenates tables in iteration order.
    ///
    /// The result's columns are the union of all input columns in first-seen
    /// order. Row labels are carried over unchanged.
    #[must_use]
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = RecordTable>,
    {
        let tables: Vec<RecordTable> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let total_rows = tables.iter().map(RecordTable::len).sum();
        let mut merged = Self {
            columns,
            index: Vec::with_capacity(total_rows),
            rows: Vec::with_capacity(total_rows),
        };

        for table in tables {
            let aligned = table.columns == merged.columns;
            let positions: Vec<Option<usize>> = merged
                .columns
                .iter()
                .map(|c| table.column_position(c))
                .collect();
            merged.index.extend(table.index);
            for mut row in table.rows {
                if aligned {
                    merged.rows.push(row);
                    continue;
                }
                let reordered = positions
                    .iter()
                    .map(|p| p.map_or(Cell::Null, |i| std::mem::replace(&mut row[i], Cell::Null)))
                    .collect();
                merged.rows.push(reordered);
            }
        }
        merged
    }

    /// Converts each row into a JSON object keyed by column name.
    #[must_use]
    pub fn to_json_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = serde_json::to_value(cell).unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
