//! # CLI Command Implementations
//!
//! Every command runs against a detached engine session built from the
//! resolved configuration, so endpoint codes, typing policy and knowledge
//! conventions all come from one place.

use super::GraphFormat;
use crate::config::CausewayConfig;
use causeway_core::formats::{delimited, knowledge as knowledge_file, text};
use causeway_core::formats::{snapshot_from_bytes, snapshot_to_bytes};
use causeway_core::marshal::CategoryExport;
use causeway_core::{
    CausalGraph, CausewayError, DataMarshaller, DetachedEngine, Endpoint, EngineOutput,
    EngineSession, GraphMarshaller, KnowledgeBuilder, TypedDataset,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size for delimited data and dataset JSON (100 MB).
const MAX_DATA_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum size for graph files, snapshots included (256 MB).
const MAX_GRAPH_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum size for knowledge files (10 MB).
const MAX_KNOWLEDGE_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CausewayError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CausewayError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CausewayError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CausewayError> {
    let canonical = path.canonicalize().map_err(|e| {
        CausewayError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CausewayError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, CausewayError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CausewayError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CausewayError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CausewayError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_bytes(path: &Path, max_size: u64) -> Result<Vec<u8>, CausewayError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, max_size)?;
    std::fs::read(&path).map_err(|e| {
        CausewayError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })
}

fn read_text(path: &Path, max_size: u64) -> Result<String, CausewayError> {
    String::from_utf8(read_bytes(path, max_size)?).map_err(|e| {
        CausewayError::DeserializationError(format!("'{}' is not UTF-8: {}", path.display(), e))
    })
}

fn write_bytes(path: &Path, contents: &[u8]) -> Result<PathBuf, CausewayError> {
    let path = validate_output_path(path)?;
    std::fs::write(&path, contents).map_err(|e| {
        CausewayError::IoError(format!("Cannot write '{}': {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(path)
}

/// Write to a file, or to stdout when no path is given.
fn emit(target: Option<&Path>, contents: &str) -> Result<(), CausewayError> {
    match target {
        Some(path) => write_bytes(path, contents.as_bytes()).map(|_| ()),
        None => {
            print!("{}", contents);
            Ok(())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CausewayError> {
    serde_json::to_string_pretty(value).map_err(|e| CausewayError::SerializationError(e.to_string()))
}

// =============================================================================
// SESSION AND OUTPUT
// =============================================================================

/// Presentation flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json_mode: bool,
    pub quiet: bool,
}

impl Output {
    /// Human-readable status line, skipped in quiet and JSON modes.
    fn status(self, message: &str) {
        if !self.quiet && !self.json_mode {
            eprintln!("{}", message);
        }
    }
}

/// Open a marshalling-only session from the resolved configuration.
pub fn open_session(config: &CausewayConfig) -> Result<EngineSession, CausewayError> {
    EngineSession::open(Box::new(DetachedEngine), config.to_session_config()?)
}

// =============================================================================
// DATA COMMANDS
// =============================================================================

/// Import delimited text, print a column summary, optionally save the
/// typed dataset as JSON.
pub fn cmd_data_import(
    session: &EngineSession,
    output: Output,
    input: &Path,
    delimiter: char,
    target: Option<&Path>,
) -> Result<(), CausewayError> {
    let source = read_text(input, MAX_DATA_FILE_SIZE)?;
    let frame = delimited::read_frame(&source, delimiter)?;
    let dataset = DataMarshaller::new(session)?.to_typed_dataset(&frame)?;
    tracing::info!(
        rows = dataset.n_rows(),
        columns = dataset.n_cols(),
        "dataset imported"
    );

    if let Some(path) = target {
        let written = write_bytes(path, to_json(&dataset)?.as_bytes())?;
        output.status(&format!("Wrote typed dataset to {}", written.display()));
    }

    if output.json_mode {
        let columns: Vec<serde_json::Value> = dataset
            .columns()
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "kind": c.kind(),
                    "categories": c.category_map().map(|m| m.len()),
                })
            })
            .collect();

        let summary = serde_json::json!({
            "rows": dataset.n_rows(),
            "columns": columns,
        });
        println!("{}", to_json(&summary)?);
        return Ok(());
    }

    if !output.quiet {
        println!("Rows:    {}", dataset.n_rows());
        println!("Columns: {}", dataset.n_cols());
        for column in dataset.columns() {
            match column.category_map() {
                Some(map) => println!(
                    "  {:<20} {} ({} categories)",
                    column.name(),
                    column.kind(),
                    map.len()
                ),
                None => println!("  {:<20} {}", column.name(), column.kind()),
            }
        }
    }
    Ok(())
}

/// Export a typed dataset JSON file back to delimited text.
pub fn cmd_data_export(
    session: &EngineSession,
    input: &Path,
    target: Option<&Path>,
    delimiter: char,
    decoded: bool,
) -> Result<(), CausewayError> {
    let source = read_text(input, MAX_DATA_FILE_SIZE)?;
    let dataset: TypedDataset = serde_json::from_str(&source)
        .map_err(|e| CausewayError::DeserializationError(e.to_string()))?;

    let mode = if decoded {
        CategoryExport::Decoded
    } else {
        CategoryExport::Codes
    };
    let frame = DataMarshaller::new(session)?.to_host_frame(&dataset, mode)?;
    emit(target, &delimited::write_frame(&frame, delimiter))
}

// =============================================================================
// GRAPH COMMANDS
// =============================================================================

/// Arguments of `graph convert`.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    pub input: &'a Path,
    pub from: GraphFormat,
    pub output: Option<&'a Path>,
    pub to: GraphFormat,
    pub delimiter: char,
}

/// Read a graph (plus any bootstrap graphs a snapshot carries).
fn read_graph(
    marshaller: &GraphMarshaller<'_>,
    path: &Path,
    format: GraphFormat,
    delimiter: char,
) -> Result<EngineOutput, CausewayError> {
    if format == GraphFormat::Snapshot {
        return snapshot_from_bytes(&read_bytes(path, MAX_GRAPH_FILE_SIZE)?);
    }

    let source = read_text(path, MAX_GRAPH_FILE_SIZE)?;
    let graph = match format {
        GraphFormat::Text => text::parse_graph(&source)?,
        GraphFormat::Matrix => {
            marshaller.from_matrix(&delimited::read_matrix(&source, delimiter)?)?
        }
        GraphFormat::Json => serde_json::from_str::<CausalGraph>(&source)
            .map_err(|e| CausewayError::DeserializationError(e.to_string()))?,
        GraphFormat::Dot | GraphFormat::Lavaan | GraphFormat::Xml | GraphFormat::Snapshot => {
            return Err(CausewayError::InvalidParameter {
                name: "from".to_string(),
                message: format!("{:?} is an output-only format", format),
            });
        }
    };
    Ok(EngineOutput {
        graph,
        bootstrap_graphs: Vec::new(),
    })
}

/// Convert a graph file between formats.
pub fn cmd_graph_convert(
    session: &EngineSession,
    output: Output,
    request: &Conversion<'_>,
) -> Result<(), CausewayError> {
    let marshaller = GraphMarshaller::new(session)?;
    let loaded = read_graph(&marshaller, request.input, request.from, request.delimiter)?;
    let graph = &loaded.graph;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        from = ?request.from,
        to = ?request.to,
        "graph loaded"
    );

    let rendered = match request.to {
        GraphFormat::Text => marshaller.to_text(graph)?,
        GraphFormat::Matrix => {
            delimited::write_matrix(&marshaller.to_matrix(graph)?, request.delimiter)
        }
        GraphFormat::Dot => marshaller.to_dot(graph)?,
        GraphFormat::Lavaan => marshaller.to_lavaan(graph)?,
        GraphFormat::Xml => marshaller.to_xml(graph)?,
        GraphFormat::Json => {
            let mut json = to_json(graph)?;
            json.push('\n');
            json
        }
        GraphFormat::Snapshot => {
            let path = request.output.ok_or_else(|| CausewayError::InvalidParameter {
                name: "output".to_string(),
                message: "snapshots are binary and need an output file".to_string(),
            })?;
            let bytes = snapshot_to_bytes(graph, &loaded.bootstrap_graphs)?;
            let written = write_bytes(path, &bytes)?;
            output.status(&format!(
                "Wrote snapshot ({} bytes) to {}",
                bytes.len(),
                written.display()
            ));
            return Ok(());
        }
    };
    emit(request.output, &rendered)
}

// =============================================================================
// KNOWLEDGE COMMANDS
// =============================================================================

fn load_knowledge(session: &EngineSession, path: &Path) -> Result<KnowledgeBuilder, CausewayError> {
    let config = session.config();
    let source = read_text(path, MAX_KNOWLEDGE_FILE_SIZE)?;
    let mut builder = knowledge_file::parse_knowledge(&source, &config.comment_marker)?;
    builder.set_ordering(config.tier_ordering);
    Ok(builder)
}

/// Parse a knowledge file and, when data is given, report variables on
/// either side that the other does not mention.
///
/// Knowledge variables missing from the data are an error.
pub fn cmd_knowledge_check(
    session: &EngineSession,
    output: Output,
    knowledge: &Path,
    data: Option<&Path>,
    delimiter: char,
) -> Result<(), CausewayError> {
    let builder = load_knowledge(session, knowledge)?;
    let snapshot = builder.knowledge();

    let (missing, uncovered) = match data {
        Some(path) => {
            let frame = delimited::read_frame(&read_text(path, MAX_DATA_FILE_SIZE)?, delimiter)?;
            let variables: Vec<&str> = frame.column_names().collect();
            (builder.check(&variables), builder.uncovered(&variables))
        }
        None => (Vec::new(), Vec::new()),
    };

    if output.json_mode {
        let report = serde_json::json!({
            "tiers": snapshot.tiers().count(),
            "forbidden": snapshot.forbidden().count(),
            "required": snapshot.required().count(),
            "missing_from_data": missing,
            "not_in_knowledge": uncovered,
        });
        println!("{}", to_json(&report)?);
    } else if !output.quiet {
        println!("Tiers:     {}", snapshot.tiers().count());
        println!("Forbidden: {}", snapshot.forbidden().count());
        println!("Required:  {}", snapshot.required().count());
        if !uncovered.is_empty() {
            println!("Not in knowledge: {}", uncovered.join(", "));
        }
    }

    if !missing.is_empty() {
        return Err(CausewayError::InvalidParameter {
            name: "knowledge".to_string(),
            message: format!("variables not in data: {}", missing.join(", ")),
        });
    }
    output.status("Knowledge OK");
    Ok(())
}

/// Print a knowledge file in normalized form.
pub fn cmd_knowledge_show(
    session: &EngineSession,
    output: Output,
    knowledge: &Path,
) -> Result<(), CausewayError> {
    let snapshot = load_knowledge(session, knowledge)?.build();
    if output.json_mode {
        println!("{}", to_json(&snapshot)?);
    } else {
        print!("{}", knowledge_file::write_knowledge(&snapshot));
    }
    Ok(())
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Show the resolved configuration.
pub fn cmd_config(config: &CausewayConfig, output: Output) -> Result<(), CausewayError> {
    let session = config.to_session_config()?;

    if output.json_mode {
        println!("{}", to_json(&session)?);
        return Ok(());
    }

    let codes = &session.endpoint_codes;
    let star = codes
        .encode(Endpoint::Star)
        .map(|s| format!(" star={}", s))
        .unwrap_or_default();
    println!("Causeway Configuration");
    println!("======================");
    println!("Integers as continuous: {}", session.typing.int_as_continuous);
    println!(
        "Endpoint codes:         null={} circle={} arrow={} tail={}{}",
        codes.null(),
        codes.encode(Endpoint::Circle)?,
        codes.encode(Endpoint::Arrow)?,
        codes.encode(Endpoint::Tail)?,
        star
    );
    println!("Tier ordering:          {:?}", session.tier_ordering);
    println!("Comment marker:         {}", session.comment_marker);
    Ok(())
}
