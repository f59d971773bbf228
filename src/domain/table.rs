// Tabular domain models produced by normalization
use chrono::{DateTime, Timelike, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Human readable form used for axis labels and list entries
    pub fn label(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Timestamp(t) if t.hour() == 0 && t.minute() == 0 && t.second() == 0 => {
                t.format("%Y-%m-%d").to_string()
            }
            Scalar::Timestamp(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Timestamp(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Scalar>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Scalar>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// True when the row has exactly the given columns
    pub fn matches_schema(&self, schema: &[String]) -> bool {
        self.values.len() == schema.len() && schema.iter().all(|c| self.values.contains_key(c))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("row columns {found:?} do not match table schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Ordered rows sharing one fixed schema
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn empty<S: AsRef<str>>(schema: &[S]) -> Self {
        Self {
            schema: schema.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) -> Result<(), TableError> {
        if !row.matches_schema(&self.schema) {
            return Err(TableError::SchemaMismatch {
                expected: self.schema.clone(),
                found: row.columns().map(str::to_string).collect(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.schema.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
