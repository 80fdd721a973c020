//! # Knowledge
//!
//! Background-knowledge constraint sets and their builder.
//!
//! A `Knowledge` value holds:
//! - Tiers partitioning variable names (a name is in at most one tier)
//! - Explicit forbidden and required directed edges
//!
//! Tier-implied rules, in the default `Forward` ordering:
//! - An edge may not point from a higher tier into a lower one
//! - A forbidden-within tier disallows edges between its own members
//! - An only-next tier's members may not point more than one tier ahead
//!
//! Explicit rules take precedence over tier-implied ones. Required edges
//! are never reported as forbidden.

use crate::CausewayError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TIER ORDERING
// =============================================================================

/// Direction in which tiers may cause one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierOrdering {
    /// Lower tiers cause higher tiers.
    #[default]
    Forward,
    /// Higher tiers cause lower tiers.
    Backward,
}

impl TierOrdering {
    /// Signed number of tiers an edge `from → to` moves in the permitted
    /// direction. Negative means it moves against it.
    fn steps(self, from: usize, to: usize) -> i128 {
        let (from, to) = (from as i128, to as i128);
        match self {
            Self::Forward => to - from,
            Self::Backward => from - to,
        }
    }
}

// =============================================================================
// TIER
// =============================================================================

/// One tier of variables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tier {
    members: Vec<String>,
    forbidden_within: bool,
    only_next: bool,
}

impl Tier {
    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    #[must_use]
    pub fn is_forbidden_within(&self) -> bool {
        self.forbidden_within
    }

    #[must_use]
    pub fn is_only_next(&self) -> bool {
        self.only_next
    }
}

// =============================================================================
// KNOWLEDGE
// =============================================================================

/// Immutable background-knowledge snapshot handed to a search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Knowledge {
    tiers: BTreeMap<usize, Tier>,
    #[serde(skip)]
    tier_of: BTreeMap<String, usize>,
    forbidden: BTreeSet<(String, String)>,
    required: BTreeSet<(String, String)>,
    ordering: TierOrdering,
}

impl Knowledge {
    /// True if no variable is tiered and no forbidden or required rule exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tier_of.is_empty() && self.forbidden.is_empty() && self.required.is_empty()
    }

    /// Every variable the knowledge mentions, sorted.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.tier_of.keys().map(String::as_str).collect();
        for (a, b) in self.forbidden.iter().chain(&self.required) {
            names.insert(a);
            names.insert(b);
        }
        names
    }

    /// Tier index of a variable.
    #[must_use]
    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tier_of.get(name).copied()
    }

    /// Tiers by index.
    pub fn tiers(&self) -> impl Iterator<Item = (usize, &Tier)> {
        self.tiers.iter().map(|(i, t)| (*i, t))
    }

    /// Explicitly forbidden edges.
    pub fn forbidden(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forbidden.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Explicitly required edges.
    pub fn required(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    #[must_use]
    pub fn ordering(&self) -> TierOrdering {
        self.ordering
    }

    /// True if the directed edge `a → b` is explicitly required.
    #[must_use]
    pub fn is_required(&self, a: &str, b: &str) -> bool {
        self.required.contains(&(a.to_string(), b.to_string()))
    }

    /// True if the directed edge `a → b` is forbidden, explicitly or by
    /// tier.
    #[must_use]
    pub fn is_forbidden(&self, a: &str, b: &str) -> bool {
        if self.is_required(a, b) {
            return false;
        }
        if self.forbidden.contains(&(a.to_string(), b.to_string())) {
            return true;
        }
        let (Some(ta), Some(tb)) = (self.tier_of(a), self.tier_of(b)) else {
            return false;
        };
        let steps = self.ordering.steps(ta, tb);
        if steps < 0 {
            return true;
        }
        let Some(tier) = self.tiers.get(&ta) else {
            return false;
        };
        (steps == 0 && tier.forbidden_within) || (steps > 1 && tier.only_next)
    }

    /// Knowledge variables that do not appear in `names`, sorted.
    #[must_use]
    pub fn check<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let present: BTreeSet<&str> = names.iter().map(AsRef::as_ref).collect();
        self.variables()
            .into_iter()
            .filter(|v| !present.contains(v))
            .map(str::to_string)
            .collect()
    }

    /// Entries of `names` the knowledge never mentions, in input order.
    #[must_use]
    pub fn uncovered<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let known = self.variables();
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| !known.contains(n))
            .map(str::to_string)
            .collect()
    }
}

// =============================================================================
// KNOWLEDGE BUILDER
// =============================================================================

/// Incremental builder for a `Knowledge` set.
///
/// Every operation validates eagerly: a tier conflict or a contradictory
/// forbidden/required pair is reported by the call that introduces it.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBuilder {
    knowledge: Knowledge,
}

impl KnowledgeBuilder {
    /// Create an empty builder with forward tier ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with the given tier ordering.
    #[must_use]
    pub fn with_ordering(ordering: TierOrdering) -> Self {
        let mut builder = Self::default();
        builder.knowledge.ordering = ordering;
        builder
    }

    /// Change the tier ordering.
    pub fn set_ordering(&mut self, ordering: TierOrdering) {
        self.knowledge.ordering = ordering;
    }

    /// Place a variable in a tier.
    ///
    /// # Errors
    /// `TierConflict` if the variable is already in a different tier.
    pub fn add_to_tier(
        &mut self,
        tier: usize,
        name: impl Into<String>,
    ) -> Result<(), CausewayError> {
        let name = name.into();
        match self.knowledge.tier_of.get(&name) {
            Some(existing) if *existing == tier => return Ok(()),
            Some(existing) => {
                return Err(CausewayError::TierConflict {
                    variable: name,
                    existing: *existing,
                    requested: tier,
                });
            }
            None => {}
        }
        self.knowledge.tier_of.insert(name.clone(), tier);
        self.knowledge
            .tiers
            .entry(tier)
            .or_default()
            .members
            .push(name);
        Ok(())
    }

    /// Mark a tier as forbidding edges among its own members.
    ///
    /// Clearing the flag on a tier that does not exist is a no-op.
    pub fn set_tier_forbidden_within(&mut self, tier: usize, forbidden: bool) {
        if let Some(t) = self.tier_for_flag(tier, forbidden) {
            t.forbidden_within = forbidden;
        }
    }

    /// Mark a tier's members as able to cause only the next tier.
    ///
    /// Clearing the flag on a tier that does not exist is a no-op.
    pub fn set_tier_only_next(&mut self, tier: usize, only_next: bool) {
        if let Some(t) = self.tier_for_flag(tier, only_next) {
            t.only_next = only_next;
        }
    }

    fn tier_for_flag(&mut self, tier: usize, flag: bool) -> Option<&mut Tier> {
        if flag {
            Some(self.knowledge.tiers.entry(tier).or_default())
        } else {
            self.knowledge.tiers.get_mut(&tier)
        }
    }

    /// Forbid the directed edge `a → b`.
    pub fn forbid(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> Result<(), CausewayError> {
        let pair = rule_pair(a, b)?;
        if self.knowledge.required.contains(&pair) {
            return Err(CausewayError::ContradictoryKnowledge(pair.0, pair.1));
        }
        self.knowledge.forbidden.insert(pair);
        Ok(())
    }

    /// Require the directed edge `a → b`.
    pub fn require(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> Result<(), CausewayError> {
        let pair = rule_pair(a, b)?;
        if self.knowledge.forbidden.contains(&pair) {
            return Err(CausewayError::ContradictoryKnowledge(pair.0, pair.1));
        }
        self.knowledge.required.insert(pair);
        Ok(())
    }

    /// Drop every tier and rule. The tier ordering is kept.
    pub fn clear(&mut self) {
        let ordering = self.knowledge.ordering;
        self.knowledge = Knowledge {
            ordering,
            ..Knowledge::default()
        };
    }

    /// Knowledge variables missing from `names`, sorted.
    #[must_use]
    pub fn check<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        self.knowledge.check(names)
    }

    /// Entries of `names` the knowledge never mentions, in input order.
    #[must_use]
    pub fn uncovered<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        self.knowledge.uncovered(names)
    }

    /// Current state, borrowed.
    #[must_use]
    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    /// Immutable snapshot of the current state.
    #[must_use]
    pub fn build(&self) -> Knowledge {
        self.knowledge.clone()
    }
}

fn rule_pair(
    a: impl Into<String>,
    b: impl Into<String>,
) -> Result<(String, String), CausewayError> {
    let (a, b) = (a.into(), b.into());
    if a == b {
        return Err(CausewayError::ReflexiveRule(a));
    }
    Ok((a, b))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered() -> KnowledgeBuilder {
        let mut builder = KnowledgeBuilder::new();
        builder.add_to_tier(0, "A").expect("tier");
        builder.add_to_tier(0, "B").expect("tier");
        builder.add_to_tier(1, "C").expect("tier");
        builder.add_to_tier(2, "D").expect("tier");
        builder
    }

    #[test]
    fn tiers_forbid_backward_edges() {
        let knowledge = tiered().build();
        assert!(knowledge.is_forbidden("C", "A"));
        assert!(!knowledge.is_forbidden("A", "C"));
        assert!(!knowledge.is_forbidden("A", "B"));
        assert!(!knowledge.is_forbidden("A", "Z"));
    }

    #[test]
    fn forbidden_within_applies_to_one_tier() {
        let mut builder = tiered();
        builder.set_tier_forbidden_within(0, true);
        let knowledge = builder.build();
        assert!(knowledge.is_forbidden("A", "B"));
        assert!(knowledge.is_forbidden("B", "A"));
        assert!(!knowledge.is_forbidden("A", "C"));
        assert!(!knowledge.is_forbidden("B", "C"));
    }

    #[test]
    fn only_next_limits_reach() {
        let mut builder = tiered();
        builder.set_tier_only_next(0, true);
        let knowledge = builder.build();
        assert!(!knowledge.is_forbidden("A", "C"));
        assert!(knowledge.is_forbidden("A", "D"));
        assert!(!knowledge.is_forbidden("C", "D"));
    }

    #[test]
    fn backward_ordering_flips_direction() {
        let mut builder = tiered();
        builder.set_ordering(TierOrdering::Backward);
        let knowledge = builder.build();
        assert!(knowledge.is_forbidden("A", "C"));
        assert!(!knowledge.is_forbidden("C", "A"));
    }

    #[test]
    fn explicit_rules_override_tiers() {
        let mut builder = tiered();
        builder.require("C", "A").expect("require");
        builder.forbid("A", "C").expect("forbid");
        let knowledge = builder.build();
        assert!(!knowledge.is_forbidden("C", "A"));
        assert!(knowledge.is_required("C", "A"));
        assert!(knowledge.is_forbidden("A", "C"));
    }

    #[test]
    fn second_tier_is_a_conflict() {
        let mut builder = tiered();
        assert!(builder.add_to_tier(0, "A").is_ok());
        let err = builder.add_to_tier(3, "A").expect_err("conflict");
        assert!(matches!(
            err,
            CausewayError::TierConflict {
                existing: 0,
                requested: 3,
                ..
            }
        ));
        assert_eq!(builder.knowledge().tier_of("A"), Some(0));
    }

    #[test]
    fn contradictions_fail_in_either_order() {
        let mut builder = KnowledgeBuilder::new();
        builder.forbid("A", "B").expect("forbid");
        assert!(matches!(
            builder.require("A", "B"),
            Err(CausewayError::ContradictoryKnowledge(..))
        ));

        let mut builder = KnowledgeBuilder::new();
        builder.require("A", "B").expect("require");
        assert!(matches!(
            builder.forbid("A", "B"),
            Err(CausewayError::ContradictoryKnowledge(..))
        ));
        assert!(builder.forbid("B", "A").is_ok());
    }

    #[test]
    fn reflexive_rules_are_rejected() {
        let mut builder = KnowledgeBuilder::new();
        assert!(matches!(
            builder.forbid("A", "A"),
            Err(CausewayError::ReflexiveRule(_))
        ));
        assert!(builder.require("B", "B").is_err());
    }

    #[test]
    fn check_and_uncovered_are_opposite_directions() {
        let mut builder = tiered();
        builder.forbid("A", "Q").expect("forbid");

        assert_eq!(builder.check(&["A", "B", "C"]), vec!["D", "Q"]);
        assert_eq!(builder.uncovered(&["E", "A", "F"]), vec!["E", "F"]);
    }

    #[test]
    fn clear_keeps_ordering() {
        let mut builder = KnowledgeBuilder::with_ordering(TierOrdering::Backward);
        builder.add_to_tier(0, "A").expect("tier");
        builder.clear();
        assert!(builder.knowledge().is_empty());
        assert_eq!(builder.knowledge().ordering(), TierOrdering::Backward);
        assert!(builder.add_to_tier(4, "A").is_ok());
    }

    #[test]
    fn tier_flags_alone_do_not_make_knowledge_non_empty() {
        let mut builder = KnowledgeBuilder::new();
        builder.set_tier_forbidden_within(3, false);
        builder.set_tier_only_next(5, false);
        assert_eq!(builder.knowledge().tiers().count(), 0);
        assert!(builder.knowledge().is_empty());

        builder.set_tier_forbidden_within(2, true);
        assert_eq!(builder.knowledge().tiers().count(), 1);
        assert!(builder.knowledge().is_empty());

        builder.add_to_tier(2, "A").expect("tier");
        assert!(!builder.knowledge().is_empty());
    }
}
