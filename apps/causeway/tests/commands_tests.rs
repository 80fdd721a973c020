//! Tests for CLI command implementations against temporary files.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use causeway::cli::{
    Conversion, GraphFormat, Output, cmd_data_export, cmd_data_import, cmd_graph_convert,
    cmd_knowledge_check, cmd_knowledge_show, open_session,
};
use causeway::config::CausewayConfig;
use causeway_core::formats::{delimited, text};
use causeway_core::{CausalGraph, CausewayError, Edge, EngineSession};
use std::path::{Path, PathBuf};

const QUIET: Output = Output {
    json_mode: false,
    quiet: true,
};

fn session() -> EngineSession {
    open_session(&CausewayConfig::default()).unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn chain_text() -> String {
    let mut graph = CausalGraph::with_nodes(["A", "B", "C"]).unwrap();
    graph.add_edge(Edge::directed("A", "B")).unwrap();
    graph.add_edge(Edge::bidirected("B", "C")).unwrap();
    text::write_graph(&graph)
}

fn convert(
    session: &EngineSession,
    input: &Path,
    from: GraphFormat,
    output: Option<&Path>,
    to: GraphFormat,
) -> Result<(), CausewayError> {
    cmd_graph_convert(
        session,
        QUIET,
        &Conversion {
            input,
            from,
            output,
            to,
            delimiter: ',',
        },
    )
}

// =============================================================================
// DATA COMMANDS
// =============================================================================

#[test]
fn test_data_import_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "x,label\n1.5,red\n2.5,blue\n0.5,red\n";
    let input = write(dir.path(), "data.csv", csv);
    let dataset = dir.path().join("data.json");
    let exported = dir.path().join("out.csv");

    let session = session();
    cmd_data_import(&session, QUIET, &input, ',', Some(&dataset)).unwrap();
    assert!(dataset.is_file());

    cmd_data_export(&session, &dataset, Some(&exported), ',', true).unwrap();
    let back = std::fs::read_to_string(&exported).unwrap();
    assert_eq!(
        delimited::read_frame(&back, ',').unwrap(),
        delimited::read_frame(csv, ',').unwrap()
    );
}

#[test]
fn test_data_export_writes_codes_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "data.csv", "label\nred\nblue\nred\n");
    let dataset = dir.path().join("data.json");
    let exported = dir.path().join("codes.csv");

    let session = session();
    cmd_data_import(&session, QUIET, &input, ',', Some(&dataset)).unwrap();
    cmd_data_export(&session, &dataset, Some(&exported), ',', false).unwrap();

    let back = std::fs::read_to_string(&exported).unwrap();
    assert_eq!(back, "label\n0\n1\n0\n");
}

#[test]
fn test_data_import_rejects_directory_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = cmd_data_import(&session(), QUIET, dir.path(), ',', None);
    assert!(matches!(result, Err(CausewayError::IoError(_))));
}

#[test]
fn test_data_import_reports_ragged_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "ragged.csv", "a,b\n1,2\n3\n");
    let result = cmd_data_import(&session(), QUIET, &input, ',', None);
    assert!(matches!(
        result,
        Err(CausewayError::DelimitedParse { line: 3, .. })
    ));
}

// =============================================================================
// GRAPH COMMANDS
// =============================================================================

#[test]
fn test_graph_text_matrix_text_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.txt", &chain_text());
    let matrix = dir.path().join("graph.csv");
    let again = dir.path().join("again.txt");

    let session = session();
    convert(&session, &input, GraphFormat::Text, Some(&matrix), GraphFormat::Matrix).unwrap();
    let codes = std::fs::read_to_string(&matrix).unwrap();
    assert!(codes.starts_with("A,B,C\n"));

    convert(&session, &matrix, GraphFormat::Matrix, Some(&again), GraphFormat::Text).unwrap();
    assert_eq!(
        text::parse_graph(&std::fs::read_to_string(&again).unwrap()).unwrap(),
        text::parse_graph(&chain_text()).unwrap()
    );
}

#[test]
fn test_graph_snapshot_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.txt", &chain_text());
    let snapshot = dir.path().join("graph.cwgs");
    let json = dir.path().join("graph.json");

    let session = session();
    convert(&session, &input, GraphFormat::Text, Some(&snapshot), GraphFormat::Snapshot).unwrap();
    convert(&session, &snapshot, GraphFormat::Snapshot, Some(&json), GraphFormat::Json).unwrap();

    let graph: CausalGraph =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(graph, text::parse_graph(&chain_text()).unwrap());
}

#[test]
fn test_graph_lavaan_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.txt", &chain_text());
    let model = dir.path().join("model.lav");

    convert(&session(), &input, GraphFormat::Text, Some(&model), GraphFormat::Lavaan).unwrap();
    assert_eq!(std::fs::read_to_string(&model).unwrap(), "B ~ A\nB ~~ C\n");
}

#[test]
fn test_graph_xml_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.txt", &chain_text());
    let xml = dir.path().join("graph.xml");

    convert(&session(), &input, GraphFormat::Text, Some(&xml), GraphFormat::Xml).unwrap();
    let written = std::fs::read_to_string(&xml).unwrap();
    assert!(written.contains("<variable name=\"A\"/>"));
    assert!(written.contains("<edge>B &lt;-&gt; C</edge>"));

    let result = convert(&session(), &xml, GraphFormat::Xml, None, GraphFormat::Text);
    assert!(matches!(result, Err(CausewayError::InvalidParameter { .. })));
}

#[test]
fn test_snapshot_output_needs_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.txt", &chain_text());
    let result = convert(&session(), &input, GraphFormat::Text, None, GraphFormat::Snapshot);
    assert!(matches!(result, Err(CausewayError::InvalidParameter { .. })));
}

#[test]
fn test_write_only_formats_are_rejected_as_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "graph.dot", "digraph g {\n}\n");
    let result = convert(&session(), &input, GraphFormat::Dot, None, GraphFormat::Text);
    assert!(matches!(result, Err(CausewayError::InvalidParameter { .. })));
}

// =============================================================================
// KNOWLEDGE COMMANDS
// =============================================================================

const KNOWLEDGE: &str = "/knowledge\naddtemporal\n1 A\n2 B C\n\nforbiddirect\nA C\n";

#[test]
fn test_knowledge_check_against_matching_data() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge = write(dir.path(), "prior.txt", KNOWLEDGE);
    let data = write(dir.path(), "data.csv", "A,B,C,D\n1,2,3,4\n");

    cmd_knowledge_check(&session(), QUIET, &knowledge, Some(&data), ',').unwrap();
}

#[test]
fn test_knowledge_check_fails_on_missing_variables() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge = write(dir.path(), "prior.txt", KNOWLEDGE);
    let data = write(dir.path(), "data.csv", "A,B\n1,2\n");

    let result = cmd_knowledge_check(&session(), QUIET, &knowledge, Some(&data), ',');
    assert!(matches!(
        result,
        Err(CausewayError::InvalidParameter { ref message, .. }) if message.contains('C')
    ));
}

#[test]
fn test_knowledge_parse_errors_carry_line_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge = write(dir.path(), "bad.txt", "addtemporal\n1 A\nforbiddirect\nA\n");

    let result = cmd_knowledge_show(&session(), QUIET, &knowledge);
    assert!(matches!(
        result,
        Err(CausewayError::KnowledgeParse { line: 4, .. })
    ));
}
