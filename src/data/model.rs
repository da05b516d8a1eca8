use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::error::PanelError;

/// Moneyness column shared by every result table (strike over forward).
pub const MONEYNESS: &str = "K/F";
/// Trading date key.
pub const DATE: &str = "date";
/// Option expiry key, present in every table except the primary method's.
pub const EXPIRY: &str = "exdate";

// ---------------------------------------------------------------------------
// CellValue – a single cell of a result table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes found in the result files.
/// Group keys live in `BTreeMap`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date, kept as text so it orders chronologically.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so a CellValue can be part of a group key --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for plotting and sorting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed-per-cell column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Numeric view of the column; non-numeric cells become NaN.
    pub fn to_f64(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ResultTable – one method's output (or one diagnostic dataset)
// ---------------------------------------------------------------------------

/// Immutable columnar table. All columns have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    /// Label used in logs and error messages (usually the file stem).
    pub name: String,
    columns: Vec<Column>,
    n_rows: usize,
}

impl ResultTable {
    /// Build a table from columns, rejecting ragged or duplicated columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> anyhow::Result<Self> {
        let name = name.into();
        let n_rows = columns.first().map_or(0, |c| c.values.len());

        let mut seen = BTreeSet::new();
        for col in &columns {
            if col.values.len() != n_rows {
                anyhow::bail!(
                    "{name}: column '{}' has {} rows, expected {n_rows}",
                    col.name,
                    col.values.len()
                );
            }
            if !seen.insert(col.name.as_str()) {
                anyhow::bail!("{name}: duplicate column '{}'", col.name);
            }
        }

        Ok(Self {
            name,
            columns,
            n_rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Self::column`] but reports a schema mismatch.
    pub fn require_column(&self, name: &str) -> Result<&Column, PanelError> {
        self.column(name).ok_or_else(|| PanelError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// New table holding the given rows, in the given order, with all columns.
    pub fn take(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(&c.name, rows.iter().map(|&r| c.values[r].clone()).collect()))
            .collect();
        Self {
            name: self.name.clone(),
            columns,
            n_rows: rows.len(),
        }
    }

    /// New table restricted to `names`, in that column order.
    pub fn project(&self, names: &[&str]) -> Result<Self, PanelError> {
        let columns = names
            .iter()
            .map(|n| self.require_column(n).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: self.name.clone(),
            columns,
            n_rows: self.n_rows,
        })
    }
}
