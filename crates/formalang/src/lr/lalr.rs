//! LALR(1) state merging.
//!
//! The LALR(1) collection is obtained from the canonical LR(1) collection by
//! merging states that share the same core, the set of (rule, dot) pairs
//! with lookaheads erased. Merged states union their items, which unions the
//! lookahead sets per core entry, and the transition graph is remapped onto
//! the merged representatives.

use super::build::{CanonicalCollection, ItemSet, StateId};
use crate::{
    grammar::{RuleId, Symbol},
    types::Map,
};
use std::collections::BTreeSet;

type Core = BTreeSet<(RuleId, usize)>;

fn core_of(items: &ItemSet) -> Core {
    items.iter().map(|item| (item.rule, item.dot)).collect()
}

/// Collapse an LR(1) canonical collection into its LALR(1) counterpart.
///
/// Merged state ids are assigned in order of first appearance, so a
/// collection that is already core-distinct comes back unchanged up to
/// renumbering (and in fact keeps its numbering).
#[tracing::instrument(skip_all)]
pub fn merge_by_core(collection: CanonicalCollection) -> CanonicalCollection {
    let mut groups: Map<Core, Vec<usize>> = Map::default();
    for (i, state) in collection.states.iter().enumerate() {
        groups.entry(core_of(state)).or_default().push(i);
    }

    let mut remap = vec![0usize; collection.states.len()];
    let mut states: Vec<ItemSet> = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let id = states.len();
        let mut merged = ItemSet::default();
        for &member in members {
            remap[member] = id;
            merged.extend(collection.states[member].iter().cloned());
        }
        states.push(merged);
    }

    // States with equal cores have pairwise-equal-core successors, so the
    // remapped transitions never disagree on a target.
    let mut transitions: Map<(StateId, Symbol), StateId> = Map::default();
    for ((from, symbol), to) in collection.transitions {
        transitions.insert(
            (StateId::new(remap[from.index()]), symbol),
            StateId::new(remap[to.index()]),
        );
    }

    tracing::debug!(
        before = remap.len(),
        after = states.len(),
        "cores merged"
    );

    CanonicalCollection {
        grammar: collection.grammar,
        accept_rule: collection.accept_rule,
        states,
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::Grammar,
        lr::{build::canonical_lr1, LrTable},
    };

    /// A -> z is reached after both `a` and `b`, with lookaheads c and d
    /// respectively. LR(1) keeps the two finished states apart; LALR(1)
    /// merges them.
    fn split_lookahead_grammar() -> Grammar {
        Grammar::builder()
            .rule("S", ["a", "A", "c"])
            .rule("S", ["b", "A", "d"])
            .rule("A", ["z"])
            .build()
            .unwrap()
    }

    #[test]
    fn merging_reduces_state_count() {
        let grammar = split_lookahead_grammar();
        let lr1 = canonical_lr1(&grammar);
        let lalr = merge_by_core(canonical_lr1(&grammar));

        assert_eq!(lalr.states.len(), lr1.states.len() - 1);
    }

    #[test]
    fn merged_state_unions_lookaheads() {
        let grammar = split_lookahead_grammar();
        let lalr = merge_by_core(canonical_lr1(&grammar));

        let merged = lalr
            .states
            .iter()
            .find(|state| {
                state
                    .iter()
                    .any(|item| item.is_finished(&lalr.grammar)
                        && lalr.grammar.rule(item.rule).lhs() == "A")
            })
            .expect("a finished A state exists");
        let lookaheads: Vec<&str> = merged
            .iter()
            .filter_map(|item| item.lookahead.as_ref())
            .map(|s| s.name())
            .collect();
        assert!(lookaheads.contains(&"c"));
        assert!(lookaheads.contains(&"d"));
    }

    #[test]
    fn merging_preserves_conflict_freedom_here() {
        let grammar = split_lookahead_grammar();
        let table = LrTable::lalr1(&grammar);

        assert!(table.conflicts.is_conflict_free());
        assert_eq!(table.conclusions, vec!["This grammar is LALR(1)"]);
    }

    #[test]
    fn core_distinct_collection_survives_unchanged() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "S"])
            .rule("S", ["b"])
            .build()
            .unwrap();
        let lr1 = canonical_lr1(&grammar);
        let before = lr1.states.len();
        let lalr = merge_by_core(lr1);

        assert_eq!(lalr.states.len(), before);
    }
}
