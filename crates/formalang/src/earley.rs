//! Earley chart recognizer.
//!
//! The chart holds one item set per input position (token count + 1).
//! Position 0 is seeded with every rule of the start nonterminal; each
//! position then runs a worklist applying the classic three operations plus
//! a shift-over-nullable step that keeps null rules from stalling the
//! completer. Scanning past the last token hits a sentinel that matches
//! nothing, which forces the final completions without a special case.

use crate::{
    grammar::{Grammar, Symbol, START_SYMBOL},
    item::Item,
    types::Set,
};

pub struct Recognizer<'g> {
    grammar: &'g Grammar,
}

impl<'g> Recognizer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Build the full chart for `tokens`.
    #[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
    pub fn chart(&self, tokens: &[&str]) -> Vec<Set<Item>> {
        let grammar = self.grammar;
        let mut sets: Vec<Set<Item>> = vec![Set::default(); tokens.len() + 1];

        for (id, _) in grammar.rules_for(START_SYMBOL) {
            sets[0].insert(Item::with_origin(id, 0));
        }

        for k in 0..sets.len() {
            let mut extension: Vec<Item> = sets[k].drain(..).collect();

            while let Some(item) = extension.pop() {
                if !sets[k].insert(item.clone()) {
                    continue;
                }

                if item.next_is_empty(grammar) {
                    extension.push(item.shifted());
                }

                if item.is_finished(grammar) {
                    // Completer: advance every committed item at the origin
                    // position that was waiting on this left-hand side.
                    let origin = item.origin.unwrap_or(0);
                    let lhs = grammar.rule(item.rule).lhs();
                    let waiting: Vec<Item> = sets[origin]
                        .iter()
                        .filter(|parent| {
                            matches!(
                                parent.next_symbol(grammar),
                                Some(Symbol::Nonterminal(name)) if name == lhs
                            )
                        })
                        .cloned()
                        .collect();
                    extension.extend(waiting.into_iter().map(|parent| parent.shifted()));
                } else if let Some(Symbol::Nonterminal(name)) = item.next_symbol(grammar) {
                    // Predictor, with the extra shift over a nullable
                    // nonterminal so that null derivations complete within
                    // the same position.
                    let name = name.clone();
                    for (id, _) in grammar.rules_for(&name) {
                        extension.push(Item::with_origin(id, k));
                    }
                    if grammar.is_nullable(&name) {
                        extension.push(item.shifted());
                    }
                } else if let Some(token) = tokens.get(k) {
                    // Scanner. Beyond the input `tokens.get(k)` is the
                    // sentinel; nothing scans and the chart settles.
                    let matches_token = matches!(
                        item.next_symbol(grammar),
                        Some(Symbol::Terminal(t)) if t == token
                    );
                    if matches_token {
                        sets[k + 1].insert(item.shifted());
                    }
                }
            }
        }

        sets
    }

    /// The number of finished start-symbol items with origin 0 in the last
    /// chart set: 0 rejects, 1 is a clean accept, more than 1 means the
    /// input has several leftmost derivations.
    pub fn derivations(&self, tokens: &[&str]) -> usize {
        let sets = self.chart(tokens);
        let last = sets.last().expect("chart has at least one set");
        last.iter()
            .filter(|item| {
                item.is_finished(self.grammar)
                    && item.origin == Some(0)
                    && self.grammar.rule(item.rule).lhs() == START_SYMBOL
            })
            .count()
    }

    pub fn accepts(&self, tokens: &[&str]) -> bool {
        self.derivations(tokens) > 0
    }
}
