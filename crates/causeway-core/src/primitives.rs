//! # Interchange Primitives
//!
//! Hardcoded constants for the Causeway interchange layer.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Anything a caller may override (endpoint codes, comment marker, typing
//! policy) lives in `session::SessionConfig` and only takes its default
//! from here.

// =============================================================================
// ENDPOINT MATRIX CODES (PCALG convention)
// =============================================================================

/// Default code for the NULL endpoint (and for "no edge").
pub const DEFAULT_NULL_CODE: i32 = 0;

/// Default code for the CIRCLE endpoint.
pub const DEFAULT_CIRCLE_CODE: i32 = 1;

/// Default code for the ARROW endpoint.
pub const DEFAULT_ARROW_CODE: i32 = 2;

/// Default code for the TAIL endpoint.
pub const DEFAULT_TAIL_CODE: i32 = 3;

/// Maximum number of nodes an endpoint matrix may span.
///
/// A `p × p` matrix is allocated densely; this bounds the allocation.
pub const MAX_MATRIX_NODES: usize = 10_000;

// =============================================================================
// KNOWLEDGE FILE GRAMMAR
// =============================================================================

/// Default comment marker for knowledge files.
pub const DEFAULT_COMMENT_MARKER: &str = "//";

/// Optional first line of a knowledge file.
pub const KNOWLEDGE_HEADER: &str = "/knowledge";

/// Section header introducing tier lines.
pub const SECTION_TIERS: &str = "addtemporal";

/// Section header introducing forbidden edges.
pub const SECTION_FORBIDDEN: &str = "forbiddirect";

/// Section header introducing required edges.
pub const SECTION_REQUIRED: &str = "requiredirect";

/// Tier-token suffix marking a tier as forbidden-within.
pub const TIER_FORBIDDEN_WITHIN_MARK: char = '*';

/// Tier-token suffix marking a tier as "can cause only next tier".
pub const TIER_ONLY_NEXT_MARK: char = '-';

// =============================================================================
// GRAPH SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the graph snapshot header.
///
/// - File Header = Magic Bytes ("CWGS") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"CWGS";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot payload.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the snapshot header (magic + version).
pub const HEADER_LEN: usize = 5;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of a serialized snapshot payload (256 MB).
///
/// Validated before decoding to bound allocation on corrupted input.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Maximum number of resamples a bootstrap request may ask for.
pub const MAX_BOOTSTRAP_RESAMPLES: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_codes_are_distinct() {
        let codes = [
            DEFAULT_NULL_CODE,
            DEFAULT_CIRCLE_CODE,
            DEFAULT_ARROW_CODE,
            DEFAULT_TAIL_CODE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"CWGS");
        assert_eq!(HEADER_LEN, MAGIC_BYTES.len() + 1);
    }
}
