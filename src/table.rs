//! In-memory tabular data loaded from a dataset.

use crate::error::DatasetError;
use crate::types::{TryFromValue, Value};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use hashbrown::HashMap;

/// A single row, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Returns true if the row has a value (possibly null) for the column.
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Returns the raw value of a column.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Returns the value of a required, non-null column.
    ///
    /// # Arguments
    ///
    /// * `column`: Column name
    pub fn get<T: TryFromValue>(&self, column: &str) -> Result<T, DatasetError> {
        self.get_opt(column)?.ok_or_else(|| DatasetError::ColumnType {
            column: column.to_string(),
            expected: T::TYPE_NAME,
        })
    }

    /// Returns the value of a column, or `None` for null and NaN values.
    ///
    /// # Arguments
    ///
    /// * `column`: Column name
    pub fn get_opt<T: TryFromValue>(&self, column: &str) -> Result<Option<T>, DatasetError> {
        let value = self
            .values
            .get(column)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: column.to_string(),
            })?;
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value)
            .map(Some)
            .ok_or_else(|| DatasetError::ColumnType {
                column: column.to_string(),
                expected: T::TYPE_NAME,
            })
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        }
    }
}

/// Rows loaded from one or more files, in load order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Create a table without columns or rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert an arrow record batch into a table.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self, DatasetError> {
        let schema = batch.schema();
        let columns: Vec<String> = schema
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect();
        let mut rows = vec![Row::new(); batch.num_rows()];
        for (name, array) in columns.iter().zip(batch.columns()) {
            for (row, value) in rows.iter_mut().zip(column_values(name, array)?) {
                row.insert(name.as_str(), value);
            }
        }
        Ok(Self { columns, rows })
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Column names, in order of first appearance.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns true if the table has the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    /// Rows of the table.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the table, returning its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Append the rows of another table, extending the columns as needed.
    pub fn append(&mut self, other: Table) {
        for column in other.columns {
            if !self.has_column(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Set a column to a constant value in every row that lacks it.
    ///
    /// # Arguments
    ///
    /// * `column`: Column name
    /// * `value`: Value to set
    pub fn fill_column(&mut self, column: &str, value: Value) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for row in self.rows.iter_mut().filter(|row| !row.contains(column)) {
            row.insert(column, value.clone());
        }
    }
}

/// Convert one arrow column into [Value]s.
fn column_values(name: &str, array: &ArrayRef) -> Result<Vec<Value>, DatasetError> {
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => {
            let array = array.as_boolean();
            (0..array.len())
                .map(|i| nullable(array, i, || Value::Bool(array.value(i))))
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let array = cast(array, &DataType::Int64)?;
            let array = array.as_primitive::<Int64Type>();
            (0..array.len())
                .map(|i| nullable(array, i, || Value::Int(array.value(i))))
                .collect()
        }
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => {
            let array = cast(array, &DataType::Float64)?;
            let array = array.as_primitive::<Float64Type>();
            (0..array.len())
                .map(|i| nullable(array, i, || Value::Float(array.value(i))))
                .collect()
        }
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Dictionary(_, _)
        | DataType::Date32
        | DataType::Date64
        | DataType::Timestamp(_, _) => {
            let array = cast(array, &DataType::Utf8)?;
            let array = array.as_string::<i32>();
            (0..array.len())
                .map(|i| nullable(array, i, || Value::Str(array.value(i).to_string())))
                .collect()
        }
        other => {
            return Err(DatasetError::UnsupportedColumnType {
                column: name.to_string(),
                data_type: other.to_string(),
            })
        }
    };
    Ok(values)
}

fn nullable(array: &dyn Array, i: usize, value: impl FnOnce() -> Value) -> Value {
    if array.is_null(i) {
        Value::Null
    } else {
        value()
    }
}
