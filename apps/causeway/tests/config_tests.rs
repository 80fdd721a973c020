//! Tests for layered configuration resolution.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use causeway::config::{CONFIG_FILE_NAME, CausewayConfig, CliOverrides};
use causeway_core::{CausewayError, Endpoint, SessionConfig, TierOrdering};
use std::collections::BTreeMap;
use std::path::Path;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_project_config(dir: &Path, contents: &str) {
    std::fs::write(dir.join(CONFIG_FILE_NAME), contents).unwrap();
}

// =============================================================================
// LAYERS
// =============================================================================

#[test]
fn test_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = CausewayConfig::load(None, dir.path(), no_env, &CliOverrides::default()).unwrap();
    assert_eq!(config.to_session_config().unwrap(), SessionConfig::default());
}

#[test]
fn test_project_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(
        dir.path(),
        "[endpoints]\nnull = -1\ncircle = 5\narrow = 6\ntail = 7\n\n[knowledge]\ntier_ordering = \"backward\"\n",
    );

    let config = CausewayConfig::load(None, dir.path(), no_env, &CliOverrides::default()).unwrap();
    let session = config.to_session_config().unwrap();
    assert_eq!(session.endpoint_codes.null(), -1);
    assert_eq!(session.endpoint_codes.encode(Endpoint::Tail).unwrap(), 7);
    assert_eq!(session.tier_ordering, TierOrdering::Backward);
}

#[test]
fn test_explicit_file_replaces_project_file() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(dir.path(), "[typing]\nint_as_continuous = true\n");
    let explicit = dir.path().join("other.toml");
    std::fs::write(&explicit, "[knowledge]\ncomment_marker = \"#\"\n").unwrap();

    let config =
        CausewayConfig::load(Some(&explicit), dir.path(), no_env, &CliOverrides::default())
            .unwrap();
    let session = config.to_session_config().unwrap();
    assert_eq!(session.comment_marker, "#");
    assert!(!session.typing.int_as_continuous);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let result = CausewayConfig::load(Some(&missing), dir.path(), no_env, &CliOverrides::default());
    assert!(matches!(result, Err(CausewayError::IoError(_))));
}

#[test]
fn test_env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(dir.path(), "[endpoints]\narrow = 20\n[knowledge]\ncomment_marker = \"#\"\n");
    let env = env_from(&[("CAUSEWAY_ARROW_CODE", "30"), ("CAUSEWAY_STAR_CODE", "9")]);

    let config = CausewayConfig::load(None, dir.path(), env, &CliOverrides::default()).unwrap();
    let session = config.to_session_config().unwrap();
    assert_eq!(session.endpoint_codes.encode(Endpoint::Arrow).unwrap(), 30);
    assert_eq!(session.endpoint_codes.encode(Endpoint::Star).unwrap(), 9);
    assert_eq!(session.comment_marker, "#");
}

#[test]
fn test_cli_overrides_env() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_from(&[
        ("CAUSEWAY_TIER_ORDERING", "backward"),
        ("CAUSEWAY_INT_AS_CONTINUOUS", "false"),
    ]);
    let cli = CliOverrides {
        int_as_continuous: Some(true),
        tier_ordering: Some(TierOrdering::Forward),
        comment_marker: None,
    };

    let config = CausewayConfig::load(None, dir.path(), env, &cli).unwrap();
    let session = config.to_session_config().unwrap();
    assert!(session.typing.int_as_continuous);
    assert_eq!(session.tier_ordering, TierOrdering::Forward);
}

// =============================================================================
// VALIDATION
// =============================================================================

#[test]
fn test_duplicate_codes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(dir.path(), "[endpoints]\narrow = 3\n");
    let result = CausewayConfig::load(None, dir.path(), no_env, &CliOverrides::default());
    assert!(matches!(
        result,
        Err(CausewayError::DuplicateEndpointCode(_, _, 3))
    ));
}

#[test]
fn test_unparseable_env_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_from(&[("CAUSEWAY_NULL_CODE", "zero")]);
    let result = CausewayConfig::load(None, dir.path(), env, &CliOverrides::default());
    assert!(matches!(
        result,
        Err(CausewayError::InvalidConfig { ref field, .. }) if field == "CAUSEWAY_NULL_CODE"
    ));
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(matches!(
        CausewayConfig::from_toml("[endpoints]\nnull = \"zero\"\n"),
        Err(CausewayError::InvalidConfig { .. })
    ));
}

#[test]
fn test_whitespace_comment_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cli = CliOverrides {
        comment_marker: Some("# ".to_string()),
        ..CliOverrides::default()
    };
    let result = CausewayConfig::load(None, dir.path(), no_env, &cli);
    assert!(matches!(result, Err(CausewayError::InvalidConfig { .. })));
}
