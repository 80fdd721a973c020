//! # Knowledge Files
//!
//! Whitespace-delimited, line-oriented:
//!
//! ```text
//! /knowledge
//! addtemporal
//! 1 A B
//! 2* C
//! forbiddirect
//! A C
//! requiredirect
//! B C
//! ```
//!
//! - Tier numbers are 1-based; tier `n` is tier index `n - 1`
//! - A `*` suffix marks the tier forbidden-within, `-` marks it only-next
//! - Everything after the comment marker on a line is ignored
//! - `/knowledge` may appear only as the first line
//!
//! Builder errors raised while applying a line (tier conflicts,
//! contradictions, reflexive rules) are reported as `KnowledgeParse`
//! with that line number.

use crate::knowledge::{Knowledge, KnowledgeBuilder};
use crate::primitives::{
    KNOWLEDGE_HEADER, SECTION_FORBIDDEN, SECTION_REQUIRED, SECTION_TIERS,
    TIER_FORBIDDEN_WITHIN_MARK, TIER_ONLY_NEXT_MARK,
};
use crate::CausewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Tiers,
    Forbidden,
    Required,
}

impl Section {
    fn from_header(token: &str) -> Option<Self> {
        match token {
            SECTION_TIERS => Some(Self::Tiers),
            SECTION_FORBIDDEN => Some(Self::Forbidden),
            SECTION_REQUIRED => Some(Self::Required),
            _ => None,
        }
    }
}

/// Parse a knowledge file into a builder.
pub fn parse_knowledge(
    source: &str,
    comment_marker: &str,
) -> Result<KnowledgeBuilder, CausewayError> {
    let mut builder = KnowledgeBuilder::new();
    let mut section = None;
    let mut seen_content = false;

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let text = strip_comment(raw, comment_marker).trim();
        if text.is_empty() {
            continue;
        }
        let first_content = !seen_content;
        seen_content = true;

        if text == KNOWLEDGE_HEADER {
            if !first_content {
                return Err(parse_error(line, "'/knowledge' must be the first line"));
            }
            continue;
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        if let [single] = tokens.as_slice() {
            if let Some(next) = Section::from_header(single) {
                section = Some(next);
                continue;
            }
        }

        match section {
            None => {
                return Err(parse_error(line, format!("'{text}' is outside any section")));
            }
            Some(Section::Tiers) => apply_tier_line(&mut builder, line, &tokens)?,
            Some(Section::Forbidden | Section::Required) => {
                let [a, b] = tokens.as_slice() else {
                    return Err(parse_error(
                        line,
                        format!("expected exactly two names, found {}", tokens.len()),
                    ));
                };
                let applied = if section == Some(Section::Forbidden) {
                    builder.forbid(*a, *b)
                } else {
                    builder.require(*a, *b)
                };
                applied.map_err(|e| parse_error(line, e.to_string()))?;
            }
        }
    }

    tracing::debug!(
        variables = builder.knowledge().variables().len(),
        "knowledge file parsed"
    );
    Ok(builder)
}

fn apply_tier_line(
    builder: &mut KnowledgeBuilder,
    line: usize,
    tokens: &[&str],
) -> Result<(), CausewayError> {
    let Some((tier_token, members)) = tokens.split_first() else {
        return Ok(());
    };
    let (index, forbidden_within, only_next) = parse_tier_token(tier_token)
        .ok_or_else(|| parse_error(line, format!("malformed tier token '{tier_token}'")))?;

    let (was_forbidden, was_only_next) = builder
        .knowledge()
        .tiers()
        .find(|(i, _)| *i == index)
        .map_or((false, false), |(_, t)| {
            (t.is_forbidden_within(), t.is_only_next())
        });
    builder.set_tier_forbidden_within(index, was_forbidden || forbidden_within);
    builder.set_tier_only_next(index, was_only_next || only_next);

    for name in members {
        builder
            .add_to_tier(index, *name)
            .map_err(|e| parse_error(line, e.to_string()))?;
    }
    Ok(())
}

/// `"2*-"` → `(1, true, true)`. Tier numbers start at 1.
fn parse_tier_token(token: &str) -> Option<(usize, bool, bool)> {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, suffix) = token.split_at(digits_end);
    let number: usize = digits.parse().ok()?;
    let index = number.checked_sub(1)?;

    let mut forbidden_within = false;
    let mut only_next = false;
    for c in suffix.chars() {
        match c {
            TIER_FORBIDDEN_WITHIN_MARK if !forbidden_within => forbidden_within = true,
            TIER_ONLY_NEXT_MARK if !only_next => only_next = true,
            _ => return None,
        }
    }
    Some((index, forbidden_within, only_next))
}

fn strip_comment<'a>(line: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return line;
    }
    line.find(marker).map_or(line, |at| &line[..at])
}

fn parse_error(line: usize, message: impl Into<String>) -> CausewayError {
    CausewayError::KnowledgeParse {
        line,
        message: message.into(),
    }
}

/// Render knowledge in file form. Re-parsing the output yields an equal
/// knowledge set under forward ordering.
#[must_use]
pub fn write_knowledge(knowledge: &Knowledge) -> String {
    let mut out = String::new();
    out.push_str(KNOWLEDGE_HEADER);
    out.push('\n');

    out.push_str(SECTION_TIERS);
    out.push('\n');
    for (index, tier) in knowledge.tiers() {
        out.push_str(&(index + 1).to_string());
        if tier.is_forbidden_within() {
            out.push(TIER_FORBIDDEN_WITHIN_MARK);
        }
        if tier.is_only_next() {
            out.push(TIER_ONLY_NEXT_MARK);
        }
        for member in tier.members() {
            out.push(' ');
            out.push_str(member);
        }
        out.push('\n');
    }

    for (header, rules) in [
        (SECTION_FORBIDDEN, knowledge.forbidden().collect::<Vec<_>>()),
        (SECTION_REQUIRED, knowledge.required().collect::<Vec<_>>()),
    ] {
        out.push('\n');
        out.push_str(header);
        out.push('\n');
        for (a, b) in rules {
            out.push_str(a);
            out.push(' ');
            out.push_str(b);
            out.push('\n');
        }
    }
    out
}
