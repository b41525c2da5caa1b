//! Data conversion types and utilities.
//!
//! This module contains the format-agnostic table model and one reader/writer
//! pair per supported format (CSV, JSON, XLSX).

pub mod csv;
pub mod excel;
pub mod json;
mod tabular;

pub use tabular::{Column, ColumnType, TabularData, Value};
