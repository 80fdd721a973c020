//! # Host Frame
//!
//! The host data environment's view of a table: named columns, each with
//! a native dtype and a run of cells.
//!
//! A `HostFrame` is what DataMarshaller imports from and exports to. It
//! carries no causal typing; that is decided by `marshal::data`.

use crate::CausewayError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// DTYPE
// =============================================================================

/// Native column dtype in the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float16,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    String,
    /// Heterogeneous cells.
    Object,
}

impl Dtype {
    /// True for the floating-point dtypes.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// True for the signed and unsigned integer dtypes.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    /// Host-side dtype name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Object => "object",
        }
    }

    /// Whether a cell may appear in a column of this dtype.
    ///
    /// Float columns accept integer cells (widened on read).
    #[must_use]
    pub fn admits(self, cell: &Cell) -> bool {
        match cell {
            Cell::Float(_) => self.is_float() || self == Self::Object,
            Cell::Int(_) => self.is_float() || self.is_integer() || self == Self::Object,
            Cell::Bool(_) => matches!(self, Self::Bool | Self::Object),
            Cell::Str(_) => matches!(self, Self::String | Self::Object),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CELL
// =============================================================================

/// One host cell value.
///
/// Serialized untagged so JSON frames read naturally (`[1, 2.5, "red"]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

// =============================================================================
// HOST COLUMN
// =============================================================================

/// A named host column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostColumn {
    pub name: String,
    pub dtype: Dtype,
    pub cells: Vec<Cell>,
}

impl HostColumn {
    /// Create a column, checking every cell against the dtype.
    pub fn new(
        name: impl Into<String>,
        dtype: Dtype,
        cells: Vec<Cell>,
    ) -> Result<Self, CausewayError> {
        let column = Self {
            name: name.into(),
            dtype,
            cells,
        };
        column.validate()?;
        Ok(column)
    }

    /// Convenience constructor for a `float64` column.
    #[must_use]
    pub fn float64(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            dtype: Dtype::Float64,
            cells: values.iter().map(|v| Cell::Float(*v)).collect(),
        }
    }

    /// Convenience constructor for an `int64` column.
    #[must_use]
    pub fn int64(name: impl Into<String>, values: &[i64]) -> Self {
        Self {
            name: name.into(),
            dtype: Dtype::Int64,
            cells: values.iter().map(|v| Cell::Int(*v)).collect(),
        }
    }

    /// Convenience constructor for a `string` column.
    #[must_use]
    pub fn strings<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self {
            name: name.into(),
            dtype: Dtype::String,
            cells: values
                .iter()
                .map(|v| Cell::Str(v.as_ref().to_string()))
                .collect(),
        }
    }

    /// Convenience constructor for a `bool` column.
    #[must_use]
    pub fn bools(name: impl Into<String>, values: &[bool]) -> Self {
        Self {
            name: name.into(),
            dtype: Dtype::Bool,
            cells: values.iter().map(|v| Cell::Bool(*v)).collect(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the column has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check every cell against the declared dtype.
    pub fn validate(&self) -> Result<(), CausewayError> {
        for (row, cell) in self.cells.iter().enumerate() {
            if !self.dtype.admits(cell) {
                return Err(CausewayError::CellTypeMismatch {
                    column: self.name.clone(),
                    row,
                    expected: self.dtype.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// HOST FRAME
// =============================================================================

/// A host tabular frame: equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostFrame {
    columns: Vec<HostColumn>,
}

impl HostFrame {
    /// Create a frame, validating names, lengths and cell dtypes.
    pub fn new(columns: Vec<HostColumn>) -> Result<Self, CausewayError> {
        let frame = Self { columns };
        frame.validate()?;
        Ok(frame)
    }

    /// Validate the frame invariants.
    ///
    /// Frames deserialized from JSON are not validated implicitly; callers
    /// reading untrusted frames should call this.
    pub fn validate(&self) -> Result<(), CausewayError> {
        let mut seen = BTreeSet::new();
        let n_rows = self.n_rows();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CausewayError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != n_rows {
                return Err(CausewayError::ShapeMismatch {
                    entity: format!("column {}", column.name),
                    expected: n_rows,
                    found: column.len(),
                });
            }
            column.validate()?;
        }
        Ok(())
    }

    /// Number of rows (length of the first column, 0 if none).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, HostColumn::len)
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Columns in left-to-right order.
    #[must_use]
    pub fn columns(&self) -> &[HostColumn] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&HostColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell at `(row, col)`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.columns.get(col)?.cells.get(row)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_classes() {
        assert!(Dtype::Float32.is_float());
        assert!(!Dtype::Float32.is_integer());
        assert!(Dtype::UInt16.is_integer());
        assert!(!Dtype::Bool.is_integer());
        assert_eq!(Dtype::UInt64.name(), "uint64");
    }

    #[test]
    fn float_column_accepts_int_cells() {
        let column = HostColumn::new("x", Dtype::Float64, vec![Cell::Int(1), Cell::Float(2.5)]);
        assert!(column.is_ok());
    }

    #[test]
    fn string_column_rejects_numbers() {
        let err = HostColumn::new(
            "y",
            Dtype::String,
            vec![Cell::Str("a".to_string()), Cell::Int(2)],
        )
        .expect_err("mismatch");
        assert!(matches!(
            err,
            CausewayError::CellTypeMismatch { ref column, row: 1, .. } if column == "y"
        ));
    }

    #[test]
    fn frame_rejects_ragged_columns() {
        let result = HostFrame::new(vec![
            HostColumn::float64("x", &[1.0, 2.0]),
            HostColumn::float64("y", &[1.0]),
        ]);
        assert!(matches!(
            result,
            Err(CausewayError::ShapeMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn frame_rejects_duplicate_names() {
        let result = HostFrame::new(vec![
            HostColumn::float64("x", &[1.0]),
            HostColumn::int64("x", &[1]),
        ]);
        assert!(matches!(result, Err(CausewayError::DuplicateColumn(name)) if name == "x"));
    }

    #[test]
    fn frame_accessors() {
        let frame = HostFrame::new(vec![
            HostColumn::float64("x", &[1.0, 2.0, 3.0]),
            HostColumn::strings("y", &["red", "blue", "red"]),
        ])
        .expect("frame");

        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_cols(), 2);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(frame.cell(1, 1), Some(&Cell::Str("blue".to_string())));
        assert!(frame.cell(3, 0).is_none());
    }

    #[test]
    fn cells_deserialize_untagged() {
        let frame: HostFrame = serde_json::from_str(
            r#"{"columns":[{"name":"x","dtype":"float64","cells":[1.5,2]},
                           {"name":"y","dtype":"object","cells":["a",true,3]}]}"#,
        )
        .expect("json");

        assert_eq!(frame.cell(0, 0), Some(&Cell::Float(1.5)));
        assert_eq!(frame.cell(1, 0), Some(&Cell::Int(2)));
        assert_eq!(frame.cell(1, 1), Some(&Cell::Bool(true)));
        assert!(frame.validate().is_ok());
    }
}
