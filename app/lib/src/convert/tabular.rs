//! Format-agnostic tabular data.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ConvertError, Result};

// stands in for cells missing from a column shorter than the table
static MISSING: Value = Value::Null;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    String(String),
}

impl Value {
    /// Infer a typed value from cell text.
    ///
    /// The rule, applied in order:
    /// 1. the empty string is `Null`;
    /// 2. `true`, `True`, `TRUE` and `false`, `False`, `FALSE` are `Bool`;
    /// 3. an optional sign followed by ASCII digits that fits in `i64` is `Integer`;
    /// 4. text that parses as a finite `f64` and contains a digit is `Float`;
    /// 5. anything else is kept verbatim as `String`.
    ///
    /// Steps 2 to 4 ignore leading and trailing whitespace, so `" 2"` is
    /// `Integer(2)`. Text that falls through to `String` keeps its spaces.
    ///
    /// Null tokens other than the empty string (`NA`, `null`, ...) are handled by
    /// the CSV reader, which knows the configured token list.
    pub fn infer(text: &str) -> Value {
        if text.is_empty() {
            return Value::Null;
        }
        let trimmed = text.trim();
        match trimmed {
            "true" | "True" | "TRUE" => return Value::Bool(true),
            "false" | "False" | "FALSE" => return Value::Bool(false),
            _ => {}
        }
        if is_integer_literal(trimmed) {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Value::Integer(n);
            }
        }
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Value::Float(f);
                }
            }
        }
        Value::String(text.to_string())
    }

    /// Whether the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The cell's type, `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::String(_) => Some(ColumnType::String),
        }
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Text form used by the CSV writer. Nulls render empty; integral floats keep a
/// trailing `.0` so they stay distinguishable from integers.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) if x.is_nan() => Ok(()),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// Summary type of a column's non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every cell is null.
    Null,
    /// Booleans only.
    Bool,
    /// Integers only.
    Integer,
    /// Floats, or a mix of integers and floats.
    Float,
    /// Strings only.
    String,
    /// Any other combination.
    Mixed,
}

impl ColumnType {
    fn merge(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Null, t) | (t, Null) => t,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Mixed,
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Cells in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Whether every cell is null (vacuously true for an empty column).
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }

    /// The cell at `index`, null past the end of the column.
    pub fn cell(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&MISSING)
    }

    /// Type summary across non-null cells.
    pub fn inferred_type(&self) -> ColumnType {
        self.values
            .iter()
            .filter_map(Value::column_type)
            .fold(ColumnType::Null, ColumnType::merge)
    }
}

/// An in-memory table: ordered named columns sharing one row count.
///
/// The fields are public for building tables by hand. A column shorter than
/// `row_count` reads as null past its end, and [`TabularData::normalize`]
/// brings every column back to exactly `row_count` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularData {
    /// Columns in source order.
    pub columns: Vec<Column>,
    /// Number of rows; every column holds exactly this many cells.
    pub row_count: usize,
}

impl TabularData {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, padding shorter columns with nulls.
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(Column::len).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(row_count, Value::Null);
        }
        Self { columns, row_count }
    }

    /// Build a table from column names and row-major cells. Short rows are
    /// padded with nulls; cells past the last name are ignored.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        let row_count = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(Value::Null));
            }
        }
        Self { columns, row_count }
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| c.cell(index)).collect())
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).map(move |idx| self.columns.iter().map(|c| c.cell(idx)).collect())
    }

    /// Drop all-null columns, then rows that are null in every remaining column.
    pub fn normalize(&mut self) {
        for column in &mut self.columns {
            column.values.resize(self.row_count, Value::Null);
        }
        self.columns.retain(|c| !c.is_all_null());

        let keep: Vec<bool> = (0..self.row_count)
            .map(|idx| self.columns.iter().any(|c| !c.cell(idx).is_null()))
            .collect();
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| flags.next().copied().unwrap_or(false));
        }
        self.row_count = keep.iter().filter(|k| **k).count();
    }

    /// Normalize and reject a table left without rows.
    pub fn into_normalized(mut self) -> Result<Self> {
        self.normalize();
        if self.row_count == 0 {
            return Err(ConvertError::EmptyResult);
        }
        Ok(self)
    }
}

/// Make header names usable as column names: blanks become `Unnamed: {index}`
/// and repeats get `.1`, `.2`, ... suffixes.
pub(crate) fn unique_names<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let raw: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            }
        })
        .collect();

    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());
    for name in raw {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }
    names
}
