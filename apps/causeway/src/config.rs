//! # Configuration
//!
//! `causeway.toml` with three sections:
//!
//! ```toml
//! [typing]
//! int_as_continuous = false
//!
//! [endpoints]
//! null = 0
//! circle = 1
//! arrow = 2
//! tail = 3
//! # star = 4
//!
//! [knowledge]
//! tier_ordering = "forward"
//! comment_marker = "//"
//! ```
//!
//! Resolution order (highest priority first):
//! 1. CLI flags
//! 2. Environment variables (`CAUSEWAY_*`)
//! 3. Config file (`--config`, or `causeway.toml` in the working directory)
//! 4. Compiled defaults
//!
//! Every field is optional at every layer; an unset field falls through
//! to the layer below.

use causeway_core::primitives::{
    DEFAULT_ARROW_CODE, DEFAULT_CIRCLE_CODE, DEFAULT_COMMENT_MARKER, DEFAULT_NULL_CODE,
    DEFAULT_TAIL_CODE,
};
use causeway_core::{CausewayError, EndpointCodes, SessionConfig, TierOrdering, TypingPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "causeway.toml";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingSection {
    pub int_as_continuous: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSection {
    pub null: Option<i32>,
    pub circle: Option<i32>,
    pub arrow: Option<i32>,
    pub tail: Option<i32>,
    pub star: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSection {
    pub tier_ordering: Option<TierOrdering>,
    pub comment_marker: Option<String>,
}

/// Layered CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausewayConfig {
    pub typing: TypingSection,
    pub endpoints: EndpointSection,
    pub knowledge: KnowledgeSection,
}

/// Overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub int_as_continuous: Option<bool>,
    pub tier_ordering: Option<TierOrdering>,
    pub comment_marker: Option<String>,
}

// =============================================================================
// LOADING
// =============================================================================

impl CausewayConfig {
    /// Resolve the configuration.
    ///
    /// `explicit` must exist if given. Otherwise `root/causeway.toml` is
    /// read when present. `env` looks up environment variables, so tests
    /// can pass a map instead of the process environment.
    pub fn load<F>(
        explicit: Option<&Path>,
        root: &Path,
        env: F,
        cli: &CliOverrides,
    ) -> Result<Self, CausewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match explicit {
            Some(path) => config.merge(&Self::from_file(path)?),
            None => {
                let project = root.join(CONFIG_FILE_NAME);
                if project.is_file() {
                    config.merge(&Self::from_file(&project)?);
                }
            }
        }

        config.apply_env(env)?;
        config.apply_cli(cli);
        config.to_session_config()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// Parse a TOML string.
    pub fn from_toml(source: &str) -> Result<Self, CausewayError> {
        toml::from_str(source).map_err(|e| CausewayError::InvalidConfig {
            field: "<toml>".to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(path: &Path) -> Result<Self, CausewayError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            CausewayError::IoError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CausewayError::InvalidConfig {
                field: path.display().to_string(),
                message: format!("file exceeds {MAX_CONFIG_FILE_SIZE} bytes"),
            });
        }
        let source = std::fs::read_to_string(path).map_err(|e| {
            CausewayError::IoError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&source).map_err(|e| match e {
            CausewayError::InvalidConfig { message, .. } => CausewayError::InvalidConfig {
                field: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Overlay the fields `other` sets.
    fn merge(&mut self, other: &Self) {
        if other.typing.int_as_continuous.is_some() {
            self.typing.int_as_continuous = other.typing.int_as_continuous;
        }

        let (base, top) = (&mut self.endpoints, &other.endpoints);
        for (slot, value) in [
            (&mut base.null, top.null),
            (&mut base.circle, top.circle),
            (&mut base.arrow, top.arrow),
            (&mut base.tail, top.tail),
            (&mut base.star, top.star),
        ] {
            if value.is_some() {
                *slot = value;
            }
        }

        if other.knowledge.tier_ordering.is_some() {
            self.knowledge.tier_ordering = other.knowledge.tier_ordering;
        }
        if other.knowledge.comment_marker.is_some() {
            self.knowledge
                .comment_marker
                .clone_from(&other.knowledge.comment_marker);
        }
    }

    /// Apply `CAUSEWAY_*` variables.
    fn apply_env<F>(&mut self, env: F) -> Result<(), CausewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env("CAUSEWAY_INT_AS_CONTINUOUS") {
            self.typing.int_as_continuous = Some(parse_env("CAUSEWAY_INT_AS_CONTINUOUS", &v)?);
        }
        let endpoints = &mut self.endpoints;
        for (name, slot) in [
            ("CAUSEWAY_NULL_CODE", &mut endpoints.null),
            ("CAUSEWAY_CIRCLE_CODE", &mut endpoints.circle),
            ("CAUSEWAY_ARROW_CODE", &mut endpoints.arrow),
            ("CAUSEWAY_TAIL_CODE", &mut endpoints.tail),
            ("CAUSEWAY_STAR_CODE", &mut endpoints.star),
        ] {
            if let Some(v) = env(name) {
                *slot = Some(parse_env(name, &v)?);
            }
        }
        if let Some(v) = env("CAUSEWAY_TIER_ORDERING") {
            self.knowledge.tier_ordering = Some(parse_ordering("CAUSEWAY_TIER_ORDERING", &v)?);
        }
        if let Some(v) = env("CAUSEWAY_COMMENT_MARKER") {
            self.knowledge.comment_marker = Some(v);
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        if cli.int_as_continuous.is_some() {
            self.typing.int_as_continuous = cli.int_as_continuous;
        }
        if cli.tier_ordering.is_some() {
            self.knowledge.tier_ordering = cli.tier_ordering;
        }
        if cli.comment_marker.is_some() {
            self.knowledge.comment_marker.clone_from(&cli.comment_marker);
        }
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Fill unset fields from compiled defaults and validate.
    pub fn to_session_config(&self) -> Result<SessionConfig, CausewayError> {
        let e = &self.endpoints;
        let (null, circle, arrow, tail) = (
            e.null.unwrap_or(DEFAULT_NULL_CODE),
            e.circle.unwrap_or(DEFAULT_CIRCLE_CODE),
            e.arrow.unwrap_or(DEFAULT_ARROW_CODE),
            e.tail.unwrap_or(DEFAULT_TAIL_CODE),
        );
        let endpoint_codes = match e.star {
            Some(star) => EndpointCodes::with_star(null, circle, arrow, tail, star)?,
            None => EndpointCodes::new(null, circle, arrow, tail)?,
        };

        let config = SessionConfig {
            typing: TypingPolicy {
                int_as_continuous: self.typing.int_as_continuous.unwrap_or(false),
            },
            endpoint_codes,
            tier_ordering: self.knowledge.tier_ordering.unwrap_or_default(),
            comment_marker: self
                .knowledge
                .comment_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMENT_MARKER.to_string()),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CausewayError> {
    value.trim().parse().map_err(|_| CausewayError::InvalidConfig {
        field: name.to_string(),
        message: format!("cannot parse '{value}'"),
    })
}

/// `forward` or `backward`, case-insensitive.
pub fn parse_ordering(field: &str, value: &str) -> Result<TierOrdering, CausewayError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "forward" => Ok(TierOrdering::Forward),
        "backward" => Ok(TierOrdering::Backward),
        _ => Err(CausewayError::InvalidConfig {
            field: field.to_string(),
            message: format!("expected 'forward' or 'backward', got '{value}'"),
        }),
    }
}
