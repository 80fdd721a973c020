//! # DataMarshaller
//!
//! Converts a host frame into a typed dataset and back.
//!
//! - Classify each column as continuous or discrete under a `TypingPolicy`
//! - Build category maps in first-appearance order
//! - Replace raw discrete values with codes
//! - Pick the storage mode from the column kinds
//!
//! Column order is preserved; no value is dropped or reordered.

use crate::dataset::{
    CategoryMap, CategoryValue, ColumnStore, DataBox, DataValue, StorageMode, TypedColumn,
    TypedDataset, storage_mode_for,
};
use crate::frame::{Cell, Dtype, HostColumn, HostFrame};
use crate::session::EngineSession;
use crate::{CausewayError, VariableKind};
use serde::{Deserialize, Serialize};

// =============================================================================
// TYPING POLICY
// =============================================================================

/// Which host dtypes count as continuous.
///
/// Float dtypes are always continuous. Integer dtypes are discrete unless
/// `int_as_continuous` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypingPolicy {
    pub int_as_continuous: bool,
}

impl TypingPolicy {
    /// Float dtypes only.
    #[must_use]
    pub const fn floats_only() -> Self {
        Self {
            int_as_continuous: false,
        }
    }

    /// Float and integer dtypes.
    #[must_use]
    pub const fn with_int_as_continuous() -> Self {
        Self {
            int_as_continuous: true,
        }
    }

    /// Classify one host column.
    ///
    /// # Errors
    /// `AmbiguousType` for an object column holding float cells: such a
    /// column is neither reliably real-valued nor reliably categorical.
    pub fn classify(&self, column: &HostColumn) -> Result<VariableKind, CausewayError> {
        let kind = match column.dtype {
            d if d.is_float() => VariableKind::Continuous,
            d if d.is_integer() && self.int_as_continuous => VariableKind::Continuous,
            Dtype::Object => {
                if column.cells.iter().any(|c| matches!(c, Cell::Float(_))) {
                    return Err(CausewayError::AmbiguousType {
                        column: column.name.clone(),
                        reason: "object column holds float cells".to_string(),
                    });
                }
                VariableKind::Discrete
            }
            _ => VariableKind::Discrete,
        };
        Ok(kind)
    }
}

// =============================================================================
// EXPORT MODE
// =============================================================================

/// How discrete columns are written back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryExport {
    /// Integer codes (`int64`).
    #[default]
    Codes,
    /// Original category values, decoded through the category map.
    Decoded,
}

// =============================================================================
// IMPORT
// =============================================================================

/// Per-column intermediate produced during import.
enum Imported {
    Continuous(Vec<f64>),
    Discrete(Vec<u32>),
}

/// Import a host frame under a typing policy.
pub fn import_frame(
    frame: &HostFrame,
    policy: &TypingPolicy,
) -> Result<TypedDataset, CausewayError> {
    frame.validate()?;
    let n_rows = frame.n_rows();

    let mut columns = Vec::with_capacity(frame.n_cols());
    let mut imported = Vec::with_capacity(frame.n_cols());
    for column in frame.columns() {
        match policy.classify(column)? {
            VariableKind::Continuous => {
                columns.push(TypedColumn::continuous(&column.name));
                imported.push(Imported::Continuous(continuous_values(column)?));
            }
            VariableKind::Discrete => {
                let raw = category_values(column)?;
                let map = CategoryMap::from_observed(raw.iter().cloned());
                let codes = encode_categories(&column.name, &map, &raw)?;
                columns.push(TypedColumn::discrete(&column.name, map));
                imported.push(Imported::Discrete(codes));
            }
        }
    }

    let data = match storage_mode_for(&columns) {
        StorageMode::Double => {
            let mut values = vec![0.0; n_rows * columns.len()];
            for (col, column) in imported.iter().enumerate() {
                if let Imported::Continuous(v) = column {
                    for (row, value) in v.iter().enumerate() {
                        values[row * columns.len() + col] = *value;
                    }
                }
            }
            DataBox::Double {
                rows: n_rows,
                cols: columns.len(),
                values,
            }
        }
        StorageMode::Int => {
            let mut values = vec![0; n_rows * columns.len()];
            for (col, column) in imported.iter().enumerate() {
                if let Imported::Discrete(v) = column {
                    for (row, code) in v.iter().enumerate() {
                        values[row * columns.len() + col] = *code;
                    }
                }
            }
            DataBox::Int {
                rows: n_rows,
                cols: columns.len(),
                values,
            }
        }
        StorageMode::Mixed => DataBox::Mixed {
            rows: n_rows,
            columns: imported
                .into_iter()
                .map(|column| match column {
                    Imported::Continuous(v) => ColumnStore::Continuous(v),
                    Imported::Discrete(v) => ColumnStore::Discrete(v),
                })
                .collect(),
        },
    };

    let dataset = TypedDataset::new(columns, data)?;
    tracing::debug!(
        rows = dataset.n_rows(),
        cols = dataset.n_cols(),
        storage = %dataset.storage_mode(),
        "imported host frame"
    );
    Ok(dataset)
}

fn continuous_values(column: &HostColumn) -> Result<Vec<f64>, CausewayError> {
    column
        .cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Float(v) => Ok(*v),
            Cell::Int(v) => Ok(*v as f64),
            Cell::Bool(_) | Cell::Str(_) => Err(CausewayError::CellTypeMismatch {
                column: column.name.clone(),
                row,
                expected: "numeric".to_string(),
            }),
        })
        .collect()
}

fn category_values(column: &HostColumn) -> Result<Vec<CategoryValue>, CausewayError> {
    column
        .cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Int(v) => Ok(CategoryValue::Int(*v)),
            Cell::Bool(v) => Ok(CategoryValue::Bool(*v)),
            Cell::Str(v) => Ok(CategoryValue::Str(v.clone())),
            Cell::Float(_) => Err(CausewayError::CellTypeMismatch {
                column: column.name.clone(),
                row,
                expected: "categorical".to_string(),
            }),
        })
        .collect()
}

/// Replace each raw value with its code in `map`.
fn encode_categories(
    column: &str,
    map: &CategoryMap,
    raw: &[CategoryValue],
) -> Result<Vec<u32>, CausewayError> {
    raw.iter()
        .enumerate()
        .map(|(row, value)| {
            map.code(value).ok_or_else(|| CausewayError::CellTypeMismatch {
                column: column.to_string(),
                row,
                expected: "category present in the column's category map".to_string(),
            })
        })
        .collect()
}

// =============================================================================
// EXPORT
// =============================================================================

/// Export a typed dataset back to a host frame.
///
/// Continuous columns become `float64`. Discrete columns become `int64`
/// codes, or their decoded categories under `CategoryExport::Decoded`.
pub fn export_frame(
    dataset: &TypedDataset,
    mode: CategoryExport,
) -> Result<HostFrame, CausewayError> {
    let mut columns = Vec::with_capacity(dataset.n_cols());
    for (col, typed) in dataset.columns().iter().enumerate() {
        let mut cells = Vec::with_capacity(dataset.n_rows());
        for row in 0..dataset.n_rows() {
            let value = dataset
                .value(row, col)
                .ok_or_else(|| CausewayError::ShapeMismatch {
                    entity: format!("column {}", typed.name()),
                    expected: dataset.n_rows(),
                    found: row,
                })?;
            cells.push(export_cell(typed, row, value, mode)?);
        }
        let dtype = match (typed.category_map(), mode) {
            (None, _) => Dtype::Float64,
            (Some(_), CategoryExport::Codes) => Dtype::Int64,
            (Some(map), CategoryExport::Decoded) => decoded_dtype(map),
        };
        columns.push(HostColumn::new(typed.name(), dtype, cells)?);
    }
    HostFrame::new(columns)
}

fn export_cell(
    typed: &TypedColumn,
    row: usize,
    value: DataValue,
    mode: CategoryExport,
) -> Result<Cell, CausewayError> {
    match (value, typed.category_map(), mode) {
        (DataValue::Continuous(v), _, _) => Ok(Cell::Float(v)),
        (DataValue::Discrete(code), _, CategoryExport::Codes) => Ok(Cell::Int(i64::from(code))),
        (DataValue::Discrete(code), Some(map), CategoryExport::Decoded) => {
            let category = map
                .category(code)
                .ok_or_else(|| CausewayError::CellTypeMismatch {
                    column: typed.name().to_string(),
                    row,
                    expected: format!("code below {}", map.len()),
                })?;
            Ok(match category {
                CategoryValue::Bool(v) => Cell::Bool(*v),
                CategoryValue::Int(v) => Cell::Int(*v),
                CategoryValue::Str(v) => Cell::Str(v.clone()),
            })
        }
        (DataValue::Discrete(_), None, CategoryExport::Decoded) => {
            Err(CausewayError::CellTypeMismatch {
                column: typed.name().to_string(),
                row,
                expected: "continuous".to_string(),
            })
        }
    }
}

/// Host dtype able to hold every category of a map.
fn decoded_dtype(map: &CategoryMap) -> Dtype {
    let categories = map.categories();
    if categories.iter().all(|c| matches!(c, CategoryValue::Str(_))) {
        Dtype::String
    } else if categories.iter().all(|c| matches!(c, CategoryValue::Int(_))) {
        Dtype::Int64
    } else if categories.iter().all(|c| matches!(c, CategoryValue::Bool(_))) {
        Dtype::Bool
    } else {
        Dtype::Object
    }
}

// =============================================================================
// DATA MARSHALLER
// =============================================================================

/// Session-bound data marshaller.
///
/// Takes its default typing policy from the session configuration.
#[derive(Debug, Clone, Copy)]
pub struct DataMarshaller<'s> {
    session: &'s EngineSession,
    policy: TypingPolicy,
}

impl<'s> DataMarshaller<'s> {
    /// Create a marshaller on an open session.
    pub fn new(session: &'s EngineSession) -> Result<Self, CausewayError> {
        session.ensure_open()?;
        Ok(Self {
            session,
            policy: session.config().typing,
        })
    }

    /// Override the typing policy for this marshaller.
    #[must_use]
    pub fn with_policy(mut self, policy: TypingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active typing policy.
    #[must_use]
    pub fn policy(&self) -> TypingPolicy {
        self.policy
    }

    /// Host frame → typed dataset.
    pub fn to_typed_dataset(&self, frame: &HostFrame) -> Result<TypedDataset, CausewayError> {
        self.session.ensure_open()?;
        import_frame(frame, &self.policy)
    }

    /// Typed dataset → host frame.
    pub fn to_host_frame(
        &self,
        dataset: &TypedDataset,
        mode: CategoryExport,
    ) -> Result<HostFrame, CausewayError> {
        self.session.ensure_open()?;
        export_frame(dataset, mode)
    }
}

// =============================================================================
// TESTS
// =============================================================================
