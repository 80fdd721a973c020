//! # Typed Tabular Dataset
//!
//! The engine-facing table: an `n × p` block of values plus one typed
//! column descriptor per matrix column.
//!
//! ## Storage Modes
//!
//! - all columns continuous → `DataBox::Double` (dense `f64`)
//! - all columns discrete → `DataBox::Int` (dense `u32` codes)
//! - mixed → `DataBox::Mixed` (per-column stores)
//!
//! An empty column set is stored as `DataBox::Int`.
//!
//! A dataset is immutable once built; re-typing a column means building a
//! new dataset.

use crate::{CausewayError, VariableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// CATEGORY VALUES
// =============================================================================

/// A raw categorical value observed in a discrete column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for CategoryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

// =============================================================================
// CATEGORY MAP
// =============================================================================

/// Bijection between observed category values and codes `0..k-1`.
///
/// Codes are assigned in first-observation order. Once built the map
/// never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CategoryValue>", into = "Vec<CategoryValue>")]
pub struct CategoryMap {
    /// Category for each code, indexed by code.
    categories: Vec<CategoryValue>,
    /// Reverse lookup: category -> code.
    codes: BTreeMap<CategoryValue, u32>,
}

impl CategoryMap {
    /// Build a map from values in observation order.
    ///
    /// Repeated values reuse the code of their first appearance.
    pub fn from_observed<I>(values: I) -> Self
    where
        I: IntoIterator<Item = CategoryValue>,
    {
        let mut categories = Vec::new();
        let mut codes = BTreeMap::new();
        for value in values {
            if !codes.contains_key(&value) {
                codes.insert(value.clone(), categories.len() as u32);
                categories.push(value);
            }
        }
        Self { categories, codes }
    }

    /// Code assigned to a category.
    #[must_use]
    pub fn code(&self, value: &CategoryValue) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Category for a code.
    #[must_use]
    pub fn category(&self, code: u32) -> Option<&CategoryValue> {
        self.categories.get(code as usize)
    }

    /// Categories in code order.
    #[must_use]
    pub fn categories(&self) -> &[CategoryValue] {
        &self.categories
    }

    /// Number of categories (`k`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if no category has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl TryFrom<Vec<CategoryValue>> for CategoryMap {
    type Error = CausewayError;

    fn try_from(categories: Vec<CategoryValue>) -> Result<Self, Self::Error> {
        let expected = categories.len();
        let map = Self::from_observed(categories);
        if map.len() != expected {
            return Err(CausewayError::DeserializationError(
                "category map lists a category twice".to_string(),
            ));
        }
        Ok(map)
    }
}

impl From<CategoryMap> for Vec<CategoryValue> {
    fn from(map: CategoryMap) -> Self {
        map.categories
    }
}

// =============================================================================
// TYPED COLUMN
// =============================================================================

/// Column kind plus, for discrete columns, its category map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "categories", rename_all = "lowercase")]
pub enum ColumnKind {
    Continuous,
    Discrete(CategoryMap),
}

/// A named, typed variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedColumn {
    name: String,
    kind: ColumnKind,
}

impl TypedColumn {
    /// A continuous column.
    #[must_use]
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Continuous,
        }
    }

    /// A discrete column with its category map.
    #[must_use]
    pub fn discrete(name: impl Into<String>, categories: CategoryMap) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Discrete(categories),
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> VariableKind {
        match self.kind {
            ColumnKind::Continuous => VariableKind::Continuous,
            ColumnKind::Discrete(_) => VariableKind::Discrete,
        }
    }

    /// True for discrete columns.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, ColumnKind::Discrete(_))
    }

    /// Category map of a discrete column.
    #[must_use]
    pub fn category_map(&self) -> Option<&CategoryMap> {
        match &self.kind {
            ColumnKind::Continuous => None,
            ColumnKind::Discrete(map) => Some(map),
        }
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Which storage layout a dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Double,
    Int,
    Mixed,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double => f.write_str("double"),
            Self::Int => f.write_str("int"),
            Self::Mixed => f.write_str("mixed"),
        }
    }
}

/// Per-column store inside a mixed box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStore {
    Continuous(Vec<f64>),
    Discrete(Vec<u32>),
}

impl ColumnStore {
    fn len(&self) -> usize {
        match self {
            Self::Continuous(v) => v.len(),
            Self::Discrete(v) => v.len(),
        }
    }
}

/// Underlying value storage (row-major for the dense boxes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBox {
    Double {
        rows: usize,
        cols: usize,
        values: Vec<f64>,
    },
    Int {
        rows: usize,
        cols: usize,
        values: Vec<u32>,
    },
    Mixed {
        rows: usize,
        columns: Vec<ColumnStore>,
    },
}

impl DataBox {
    /// Storage mode of this box.
    #[must_use]
    pub fn mode(&self) -> StorageMode {
        match self {
            Self::Double { .. } => StorageMode::Double,
            Self::Int { .. } => StorageMode::Int,
            Self::Mixed { .. } => StorageMode::Mixed,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Double { rows, .. } | Self::Int { rows, .. } | Self::Mixed { rows, .. } => *rows,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        match self {
            Self::Double { cols, .. } | Self::Int { cols, .. } => *cols,
            Self::Mixed { columns, .. } => columns.len(),
        }
    }

    /// Value at `(row, col)`, typed by where it is stored.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<DataValue> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        match self {
            Self::Double { cols, values, .. } => {
                values.get(row * cols + col).copied().map(DataValue::Continuous)
            }
            Self::Int { cols, values, .. } => {
                values.get(row * cols + col).copied().map(DataValue::Discrete)
            }
            Self::Mixed { columns, .. } => match columns.get(col)? {
                ColumnStore::Continuous(v) => v.get(row).copied().map(DataValue::Continuous),
                ColumnStore::Discrete(v) => v.get(row).copied().map(DataValue::Discrete),
            },
        }
    }

    /// Check that the backing vectors hold exactly `rows × cols` values.
    fn check_extent(&self) -> Result<(), CausewayError> {
        match self {
            Self::Double { rows, cols, values } => {
                check_len("double storage", rows.saturating_mul(*cols), values.len())
            }
            Self::Int { rows, cols, values } => {
                check_len("int storage", rows.saturating_mul(*cols), values.len())
            }
            Self::Mixed { rows, columns } => {
                for (col, store) in columns.iter().enumerate() {
                    check_len(&format!("mixed storage column {col}"), *rows, store.len())?;
                }
                Ok(())
            }
        }
    }
}

fn check_len(entity: &str, expected: usize, found: usize) -> Result<(), CausewayError> {
    if expected != found {
        return Err(CausewayError::ShapeMismatch {
            entity: entity.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// A value read out of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataValue {
    Continuous(f64),
    Discrete(u32),
}

// =============================================================================
// TYPED DATASET
// =============================================================================

/// An immutable typed table consumable by the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetParts", into = "DatasetParts")]
pub struct TypedDataset {
    columns: Vec<TypedColumn>,
    data: DataBox,
}

/// Serialized form; converted through `TypedDataset::new` so invariants hold.
#[derive(Serialize, Deserialize)]
struct DatasetParts {
    columns: Vec<TypedColumn>,
    data: DataBox,
}

impl TryFrom<DatasetParts> for TypedDataset {
    type Error = CausewayError;

    fn try_from(parts: DatasetParts) -> Result<Self, Self::Error> {
        Self::new(parts.columns, parts.data)
    }
}

impl From<TypedDataset> for DatasetParts {
    fn from(dataset: TypedDataset) -> Self {
        Self {
            columns: dataset.columns,
            data: dataset.data,
        }
    }
}

impl TypedDataset {
    /// Build a dataset, enforcing every structural invariant.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the storage width differs from the column count
    ///   or a backing vector has the wrong length
    /// - `ShapeMismatch` if the storage mode disagrees with the column kinds
    /// - `CellTypeMismatch` if a discrete code is outside its category map
    pub fn new(columns: Vec<TypedColumn>, data: DataBox) -> Result<Self, CausewayError> {
        check_len("dataset columns", columns.len(), data.cols())?;
        data.check_extent()?;

        let expected = storage_mode_for(&columns);
        if data.mode() != expected {
            return Err(CausewayError::StorageMismatch {
                expected: expected.to_string(),
                found: data.mode().to_string(),
            });
        }

        for (col, column) in columns.iter().enumerate() {
            if let DataBox::Mixed { columns: stores, .. } = &data {
                let store_is_discrete = matches!(stores.get(col), Some(ColumnStore::Discrete(_)));
                if store_is_discrete != column.is_discrete() {
                    return Err(CausewayError::CellTypeMismatch {
                        column: column.name().to_string(),
                        row: 0,
                        expected: column.kind().to_string(),
                    });
                }
            }
            if let Some(map) = column.category_map() {
                for row in 0..data.rows() {
                    if let Some(DataValue::Discrete(code)) = data.get(row, col) {
                        if code as usize >= map.len() {
                            return Err(CausewayError::CellTypeMismatch {
                                column: column.name().to_string(),
                                row,
                                expected: format!("code below {}", map.len()),
                            });
                        }
                    }
                }
            }
        }

        Ok(Self { columns, data })
    }

    /// Number of rows (`n`).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.rows()
    }

    /// Number of columns (`p`).
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Typed columns in order.
    #[must_use]
    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    /// Typed column by position.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&TypedColumn> {
        self.columns.get(index)
    }

    /// Variable names in column order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(TypedColumn::name)
    }

    /// Storage mode in use.
    #[must_use]
    pub fn storage_mode(&self) -> StorageMode {
        self.data.mode()
    }

    /// Underlying storage.
    #[must_use]
    pub fn data(&self) -> &DataBox {
        &self.data
    }

    /// Value at `(row, col)`.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> Option<DataValue> {
        self.data.get(row, col)
    }

    /// Continuous value at `(row, col)`; `None` for discrete columns.
    #[must_use]
    pub fn double(&self, row: usize, col: usize) -> Option<f64> {
        match self.value(row, col)? {
            DataValue::Continuous(v) => Some(v),
            DataValue::Discrete(_) => None,
        }
    }

    /// Discrete code at `(row, col)`; `None` for continuous columns.
    #[must_use]
    pub fn code(&self, row: usize, col: usize) -> Option<u32> {
        match self.value(row, col)? {
            DataValue::Discrete(v) => Some(v),
            DataValue::Continuous(_) => None,
        }
    }
}

/// Storage mode implied by a column set.
#[must_use]
pub fn storage_mode_for(columns: &[TypedColumn]) -> StorageMode {
    let discrete = columns.iter().filter(|c| c.is_discrete()).count();
    if discrete == columns.len() {
        StorageMode::Int
    } else if discrete == 0 {
        StorageMode::Double
    } else {
        StorageMode::Mixed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> CategoryMap {
        CategoryMap::from_observed(["red", "blue", "red"].into_iter().map(CategoryValue::from))
    }

    #[test]
    fn category_map_first_appearance_order() {
        let map = colors();
        assert_eq!(map.len(), 2);
        assert_eq!(map.code(&"red".into()), Some(0));
        assert_eq!(map.code(&"blue".into()), Some(1));
        assert_eq!(map.category(1), Some(&CategoryValue::from("blue")));
        assert!(map.category(2).is_none());
    }

    #[test]
    fn category_map_rejects_duplicate_on_deserialize() {
        let result: Result<CategoryMap, _> = serde_json::from_str(r#"["a","b","a"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn storage_mode_selection() {
        let c = TypedColumn::continuous("x");
        let d = TypedColumn::discrete("y", colors());
        assert_eq!(storage_mode_for(&[c.clone(), c.clone()]), StorageMode::Double);
        assert_eq!(storage_mode_for(&[d.clone(), d.clone()]), StorageMode::Int);
        assert_eq!(storage_mode_for(&[c, d]), StorageMode::Mixed);
        assert_eq!(storage_mode_for(&[]), StorageMode::Int);
    }

    #[test]
    fn mixed_dataset_reads_typed_values() {
        let dataset = TypedDataset::new(
            vec![TypedColumn::continuous("x"), TypedColumn::discrete("y", colors())],
            DataBox::Mixed {
                rows: 3,
                columns: vec![
                    ColumnStore::Continuous(vec![1.0, 2.0, 3.0]),
                    ColumnStore::Discrete(vec![0, 1, 0]),
                ],
            },
        )
        .expect("dataset");

        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.n_cols(), 2);
        assert_eq!(dataset.double(1, 0), Some(2.0));
        assert_eq!(dataset.code(1, 1), Some(1));
        assert_eq!(dataset.double(1, 1), None);
        assert_eq!(dataset.value(3, 0), None);
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let result = TypedDataset::new(
            vec![TypedColumn::continuous("x")],
            DataBox::Double {
                rows: 2,
                cols: 2,
                values: vec![0.0; 4],
            },
        );
        assert!(matches!(result, Err(CausewayError::ShapeMismatch { .. })));

        let result = TypedDataset::new(
            vec![TypedColumn::continuous("x")],
            DataBox::Double {
                rows: 2,
                cols: 1,
                values: vec![0.0; 3],
            },
        );
        assert!(matches!(result, Err(CausewayError::ShapeMismatch { .. })));
    }

    #[test]
    fn storage_mode_must_match_kinds() {
        let result = TypedDataset::new(
            vec![TypedColumn::continuous("x")],
            DataBox::Int {
                rows: 1,
                cols: 1,
                values: vec![0],
            },
        );
        assert!(matches!(result, Err(CausewayError::StorageMismatch { .. })));
    }

    #[test]
    fn code_outside_map_rejected() {
        let result = TypedDataset::new(
            vec![TypedColumn::discrete("y", colors())],
            DataBox::Int {
                rows: 1,
                cols: 1,
                values: vec![2],
            },
        );
        assert!(matches!(
            result,
            Err(CausewayError::CellTypeMismatch { ref column, .. }) if column == "y"
        ));
    }

    #[test]
    fn serde_roundtrip_revalidates() {
        let dataset = TypedDataset::new(
            vec![TypedColumn::discrete("y", colors())],
            DataBox::Int {
                rows: 3,
                cols: 1,
                values: vec![0, 1, 0],
            },
        )
        .expect("dataset");

        let json = serde_json::to_string(&dataset).expect("serialize");
        let restored: TypedDataset = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, dataset);

        let corrupted = json.replace("[0,1,0]", "[0,1,7]");
        assert!(serde_json::from_str::<TypedDataset>(&corrupted).is_err());
    }
}
