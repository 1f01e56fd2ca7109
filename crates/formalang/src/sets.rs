//! FIRST and FOLLOW set computation.
//!
//! Both computations are fixed-point iterations: sets only ever grow and the
//! symbol space is finite, so iteration runs until no set changes size.

use crate::{
    grammar::{Grammar, Symbol, START_SYMBOL},
    types::{Map, Set},
};

/// FIRST sets of every declared nonterminal.
///
/// `FIRST(X)` holds the terminals (and possibly the empty symbol) that can
/// begin a string derived from `X`.
#[derive(Debug)]
pub struct FirstSets {
    map: Map<String, Set<Symbol>>,
}

impl FirstSets {
    #[tracing::instrument(skip_all)]
    pub fn new(grammar: &Grammar) -> Self {
        let mut map: Map<String, Set<Symbol>> = Map::default();
        for (_, rule) in grammar.rules() {
            map.entry(rule.lhs().to_owned()).or_default();
        }

        let empty_only: Set<Symbol> = Some(Symbol::Empty).into_iter().collect();
        let mut changed = true;
        while changed {
            changed = false;
            for (_, rule) in grammar.rules() {
                let collected =
                    collect_first(&map, rule.rhs(), &empty_only);
                let set = map.get_mut(rule.lhs()).expect("lhs registered above");
                for symbol in collected {
                    changed |= set.insert(symbol);
                }
            }
        }

        tracing::trace!(nonterminals = map.len(), "first sets converged");
        Self { map }
    }

    /// `FIRST(nonterminal)`, or an empty set for an undeclared name.
    pub fn get(&self, nonterminal: &str) -> Option<&Set<Symbol>> {
        self.map.get(nonterminal)
    }

    /// FIRST of a symbol sequence, treating nullable nonterminals as
    /// transparent. If the entire sequence is nullable, `additional` is
    /// unioned in; this is how callers wire in inherited FOLLOW or epsilon
    /// context.
    pub fn of_sequence(&self, symbols: &[Symbol], additional: &Set<Symbol>) -> Set<Symbol> {
        collect_first(&self.map, symbols, additional)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Set<Symbol>)> + '_ {
        self.map.iter().map(|(name, set)| (name.as_str(), set))
    }
}

/// FIRST of a symbol sequence against a snapshot of per-nonterminal sets.
///
/// Walks the sequence left to right: a terminal (or explicit empty symbol)
/// contributes itself and stops; a nonterminal contributes its FIRST minus
/// the empty symbol and stops unless that set contains the empty symbol, in
/// which case the walk continues. Falling off the end of a fully nullable
/// sequence contributes `additional`.
fn collect_first(
    map: &Map<String, Set<Symbol>>,
    symbols: &[Symbol],
    additional: &Set<Symbol>,
) -> Set<Symbol> {
    let mut out = Set::default();
    let mut iter = symbols.iter().peekable();
    while let Some(symbol) = iter.next() {
        match symbol {
            Symbol::Nonterminal(name) => {
                let Some(first) = map.get(name) else {
                    // Undeclared nonterminal; semantic analysis reports it.
                    break;
                };
                out.extend(first.iter().filter(|s| !s.is_empty()).cloned());
                if first.contains(&Symbol::Empty) {
                    if iter.peek().is_some() {
                        continue;
                    }
                    out.extend(additional.iter().cloned());
                }
                break;
            }
            other => {
                out.insert(other.clone());
                break;
            }
        }
    }
    out
}

/// FOLLOW sets of every declared nonterminal.
///
/// `FOLLOW(X)` holds the terminals (and possibly the end marker) that can
/// immediately follow `X` in a derivation from the start symbol.
#[derive(Debug)]
pub struct FollowSets {
    map: Map<String, Set<Symbol>>,
}

impl FollowSets {
    #[tracing::instrument(skip_all)]
    pub fn new(grammar: &Grammar, first_sets: &FirstSets) -> Self {
        let mut map: Map<String, Set<Symbol>> = Map::default();
        for (_, rule) in grammar.rules() {
            let seed = map.entry(rule.lhs().to_owned()).or_default();
            if rule.lhs() == START_SYMBOL {
                seed.insert(Symbol::Eoi);
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (_, rule) in grammar.rules() {
                let lhs_follow = match map.get(rule.lhs()) {
                    Some(set) => set.clone(),
                    None => Set::default(),
                };
                for (i, symbol) in rule.rhs().iter().enumerate() {
                    let Symbol::Nonterminal(name) = symbol else {
                        continue;
                    };
                    let collected = if i + 1 < rule.rhs().len() {
                        first_sets.of_sequence(&rule.rhs()[i + 1..], &lhs_follow)
                    } else {
                        lhs_follow.clone()
                    };
                    let Some(set) = map.get_mut(name) else {
                        continue;
                    };
                    for sym in collected {
                        if !sym.is_empty() {
                            changed |= set.insert(sym);
                        }
                    }
                }
            }
        }

        tracing::trace!(nonterminals = map.len(), "follow sets converged");
        Self { map }
    }

    pub fn get(&self, nonterminal: &str) -> Option<&Set<Symbol>> {
        self.map.get(nonterminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Set<Symbol>)> + '_ {
        self.map.iter().map(|(name, set)| (name.as_str(), set))
    }
}
