//! # Delimited Text
//!
//! Host frames and endpoint matrices as delimiter-separated text with a
//! header row.
//!
//! Fields may be wrapped in double quotes; a quote inside a quoted field
//! is written twice. Reading a frame infers one dtype per column:
//!
//! | cells                       | dtype     |
//! |-----------------------------|-----------|
//! | all parse as `i64`          | `int64`   |
//! | all parse as `f64`          | `float64` |
//! | all `true` / `false`        | `bool`    |
//! | anything else               | `string`  |

use crate::frame::{Cell, Dtype, HostColumn, HostFrame};
use crate::matrix::EndpointMatrix;
use crate::CausewayError;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

// =============================================================================
// RECORDS
// =============================================================================

fn parse_error(line: usize, message: impl Into<String>) -> CausewayError {
    CausewayError::DelimitedParse {
        line,
        message: message.into(),
    }
}

/// Split one line into fields, honouring double quotes.
fn split_record(text: &str, delimiter: char, line: usize) -> Result<Vec<String>, CausewayError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();
    let mut quoted = false;
    let mut was_quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() && !was_quoted {
            quoted = true;
            was_quoted = true;
        } else if c == delimiter {
            fields.push(finish_field(&mut field, was_quoted));
            was_quoted = false;
        } else if was_quoted {
            return Err(parse_error(line, "text after closing quote"));
        } else {
            field.push(c);
        }
    }
    if quoted {
        return Err(parse_error(line, "unterminated quoted field"));
    }
    fields.push(finish_field(&mut field, was_quoted));
    Ok(fields)
}

fn finish_field(field: &mut String, was_quoted: bool) -> String {
    let value = std::mem::take(field);
    if was_quoted {
        value
    } else {
        value.trim().to_string()
    }
}

fn quote_field(value: &str, delimiter: char) -> String {
    let needs_quotes = value.contains(delimiter)
        || value.contains('"')
        || value.contains('\n')
        || value.trim() != value;
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn join_record<'a>(fields: impl Iterator<Item = &'a str>, delimiter: char) -> String {
    let mut out = String::new();
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote_field(field, delimiter));
    }
    out.push('\n');
    out
}

/// Non-blank lines with their 1-based line numbers, header first.
fn records(
    source: &str,
    delimiter: char,
) -> Result<(Vec<String>, Vec<(usize, Vec<String>)>), CausewayError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Err(parse_error(1, "missing header row"));
    };
    let header = split_record(header, delimiter, header_line)?;

    let mut rows = Vec::new();
    for (line, text) in lines {
        let fields = split_record(text, delimiter, line)?;
        if fields.len() != header.len() {
            return Err(parse_error(
                line,
                format!("expected {} fields, found {}", header.len(), fields.len()),
            ));
        }
        rows.push((line, fields));
    }
    Ok((header, rows))
}

// =============================================================================
// HOST FRAMES
// =============================================================================

fn infer_column(name: String, raw: Vec<String>) -> HostColumn {
    if let Some(ints) = raw
        .iter()
        .map(|v| v.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()
    {
        return HostColumn::int64(name, &ints);
    }
    if let Some(floats) = raw
        .iter()
        .map(|v| v.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()
    {
        return HostColumn::float64(name, &floats);
    }
    if let Some(bools) = raw
        .iter()
        .map(|v| v.parse::<bool>().ok())
        .collect::<Option<Vec<_>>>()
    {
        return HostColumn::bools(name, &bools);
    }
    HostColumn::strings(name, &raw)
}

/// Read a host frame, inferring column dtypes.
///
/// A header with no data rows yields `int64` columns of length zero.
pub fn read_frame(source: &str, delimiter: char) -> Result<HostFrame, CausewayError> {
    let (header, rows) = records(source, delimiter)?;
    let mut raw: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); header.len()];
    for (_, fields) in rows {
        for (column, value) in raw.iter_mut().zip(fields) {
            column.push(value);
        }
    }
    let columns = header
        .into_iter()
        .zip(raw)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    HostFrame::new(columns)
}

fn render_cell(cell: &Cell, dtype: Dtype) -> String {
    match cell {
        // Keep a decimal point so float columns read back as floats.
        Cell::Float(v) => format!("{v:?}"),
        Cell::Int(v) if dtype.is_float() => format!("{:?}", *v as f64),
        other => other.to_string(),
    }
}

/// Write a host frame with a header row.
#[must_use]
pub fn write_frame(frame: &HostFrame, delimiter: char) -> String {
    let mut out = join_record(frame.column_names(), delimiter);
    for row in 0..frame.n_rows() {
        let cells: Vec<String> = frame
            .columns()
            .iter()
            .map(|c| {
                c.cells
                    .get(row)
                    .map_or_else(String::new, |cell| render_cell(cell, c.dtype))
            })
            .collect();
        out.push_str(&join_record(cells.iter().map(String::as_str), delimiter));
    }
    out
}

// =============================================================================
// ENDPOINT MATRICES
// =============================================================================

/// Read an endpoint matrix: a header of node names, then one row of
/// integer codes per node.
pub fn read_matrix(source: &str, delimiter: char) -> Result<EndpointMatrix, CausewayError> {
    let (nodes, rows) = records(source, delimiter)?;
    if rows.len() != nodes.len() {
        return Err(CausewayError::ShapeMismatch {
            entity: "endpoint matrix rows".to_string(),
            expected: nodes.len(),
            found: rows.len(),
        });
    }
    let mut cells = Vec::with_capacity(nodes.len() * nodes.len());
    for (line, fields) in rows {
        for value in fields {
            let code = value
                .parse::<i32>()
                .map_err(|_| parse_error(line, format!("'{value}' is not an integer code")))?;
            cells.push(code);
        }
    }
    EndpointMatrix::new(nodes, cells)
}

/// Write an endpoint matrix with a header row of node names.
#[must_use]
pub fn write_matrix(matrix: &EndpointMatrix, delimiter: char) -> String {
    let mut out = join_record(matrix.nodes().iter().map(String::as_str), delimiter);
    for row in matrix.rows() {
        let codes: Vec<String> = row.iter().map(i32::to_string).collect();
        out.push_str(&join_record(codes.iter().map(String::as_str), delimiter));
    }
    out
}
