//! Canonical-collection construction via CLOSURE and GOTO.

use crate::{
    grammar::{Grammar, RuleId, Symbol},
    item::Item,
    sets::FirstSets,
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::BTreeSet, fmt};

/// Identifier of a state in the canonical collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId {
    raw: usize,
}

impl StateId {
    /// The start state of every canonical collection.
    pub const START: Self = Self::new(0);

    pub(crate) const fn new(raw: usize) -> Self {
        Self { raw }
    }

    pub fn index(&self) -> usize {
        self.raw
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.raw)
    }
}

/// A deduplicated, insertion-ordered collection of items, closed under
/// CLOSURE once constructed.
pub type ItemSet = Set<Item>;

/// Two item sets denote the same automaton state iff their canonical keys
/// (the sorted item sets) are equal. This is the merging mechanism during
/// canonical-collection construction.
pub(crate) fn canonical_key(items: &ItemSet) -> BTreeSet<Item> {
    items.iter().cloned().collect()
}

/// The canonical collection: every discovered automaton state plus the
/// transition graph over them. States are owned here; the augmented grammar
/// travels along so that item rule ids stay resolvable.
#[derive(Debug)]
pub struct CanonicalCollection {
    /// The augmented grammar (`_S -> S` appended) the items refer to.
    pub grammar: Grammar,
    /// Id of the synthetic accept rule within [`Self::grammar`].
    pub accept_rule: RuleId,
    pub states: Vec<ItemSet>,
    pub transitions: Map<(StateId, Symbol), StateId>,
}

impl CanonicalCollection {
    pub fn state(&self, id: StateId) -> &ItemSet {
        &self.states[id.raw]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId::new)
    }

    pub fn transition(&self, from: StateId, symbol: &Symbol) -> Option<StateId> {
        self.transitions.get(&(from, symbol.clone())).copied()
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for (i, state) in self.states.iter().enumerate() {
                writeln!(f, "#### State {:02}", i)?;
                for item in state {
                    writeln!(f, "- {}", item.display(&self.grammar))?;
                }
                for ((from, symbol), to) in &self.transitions {
                    if from.raw == i {
                        writeln!(f, "  {} -> {}", symbol, to)?;
                    }
                }
            }
            Ok(())
        })
    }
}

/// CLOSURE without lookahead: every nonterminal after a dot pulls in all of
/// its rules at dot position 0. Rules whose body is the explicit empty
/// symbol enter already shifted, collapsing the immediately-satisfied null
/// production. Worklist over the growing set, since added items may trigger
/// further closure.
pub(crate) fn closure(items: &mut ItemSet, grammar: &Grammar) {
    let mut i = 0;
    while i < items.len() {
        let item = items.get_index(i).expect("index in bounds").clone();
        i += 1;

        let Some(Symbol::Nonterminal(name)) = item.next_symbol(grammar).cloned() else {
            continue;
        };
        for (id, _) in grammar.rules_for(&name) {
            let mut new_item = Item::new(id);
            if new_item.next_is_empty(grammar) {
                new_item = new_item.shifted();
            }
            items.insert(new_item);
        }
    }
}

/// CLOSURE with one lookahead symbol: for an item `[X -> α . Y β, a]`,
/// every rule of `Y` is added once per terminal in `FIRST(β a)`.
pub(crate) fn closure_lookahead(items: &mut ItemSet, grammar: &Grammar, first_sets: &FirstSets) {
    let empty_only: Set<Symbol> = Some(Symbol::Empty).into_iter().collect();

    let mut i = 0;
    while i < items.len() {
        let item = items.get_index(i).expect("index in bounds").clone();
        i += 1;

        let Some(Symbol::Nonterminal(name)) = item.next_symbol(grammar).cloned() else {
            continue;
        };

        let mut after: Vec<Symbol> = grammar.rule(item.rule).rhs()[item.dot + 1..].to_vec();
        after.push(item.lookahead.clone().unwrap_or(Symbol::Eoi));
        let firsts = first_sets.of_sequence(&after, &empty_only);

        for (id, _) in grammar.rules_for(&name) {
            for lookahead in &firsts {
                if lookahead.is_empty() {
                    continue;
                }
                let mut new_item = Item::with_lookahead(id, lookahead.clone());
                if new_item.next_is_empty(grammar) {
                    new_item = new_item.shifted();
                }
                items.insert(new_item);
            }
        }
    }
}

/// GOTO: shift every unfinished item whose next symbol matches, then close.
fn goto<F>(items: &ItemSet, symbol: &Symbol, grammar: &Grammar, closure_op: &F) -> ItemSet
where
    F: Fn(&mut ItemSet, &Grammar),
{
    let mut result = ItemSet::default();
    for item in items {
        if item.next_symbol(grammar) == Some(symbol) {
            result.insert(item.shifted());
        }
    }
    closure_op(&mut result, grammar);
    result
}

/// Build the canonical LR(0) collection of `grammar`.
pub fn canonical_lr0(grammar: &Grammar) -> CanonicalCollection {
    build_collection(grammar, false)
}

/// Build the canonical LR(1) collection of `grammar`.
pub fn canonical_lr1(grammar: &Grammar) -> CanonicalCollection {
    build_collection(grammar, true)
}

#[tracing::instrument(skip_all, fields(lookahead = lookahead))]
fn build_collection(grammar: &Grammar, lookahead: bool) -> CanonicalCollection {
    let (augmented, accept_rule) = grammar.augmented();
    let first_sets = lookahead.then(|| FirstSets::new(&augmented));

    let closure_op = move |items: &mut ItemSet, g: &Grammar| match &first_sets {
        Some(first_sets) => closure_lookahead(items, g, first_sets),
        None => closure(items, g),
    };

    let seed = if lookahead {
        Item::with_lookahead(accept_rule, Symbol::Eoi)
    } else {
        Item::new(accept_rule)
    };
    let mut start: ItemSet = Some(seed).into_iter().collect();
    closure_op(&mut start, &augmented);

    let mut states = vec![start];
    let mut seen: Map<BTreeSet<Item>, StateId> = Map::default();
    seen.insert(canonical_key(&states[0]), StateId::new(0));
    let mut transitions: Map<(StateId, Symbol), StateId> = Map::default();

    // The state list grows while we iterate; item sets are finite and
    // canonicalized by structural equality, so this converges.
    let mut i = 0;
    while i < states.len() {
        let from = StateId::new(i);

        let mut symbols: Set<Symbol> = Set::default();
        for item in &states[i] {
            if let Some(symbol) = item.next_symbol(&augmented) {
                if !symbol.is_empty() {
                    symbols.insert(symbol.clone());
                }
            }
        }

        for symbol in symbols {
            let next = goto(&states[i], &symbol, &augmented, &closure_op);
            if next.is_empty() {
                continue;
            }

            let key = canonical_key(&next);
            let to = match seen.get(&key) {
                Some(existing) => *existing,
                None => {
                    let id = StateId::new(states.len());
                    states.push(next);
                    seen.insert(key, id);
                    id
                }
            };
            transitions.insert((from, symbol), to);
        }

        i += 1;
    }

    tracing::debug!(
        states = states.len(),
        transitions = transitions.len(),
        "canonical collection built"
    );

    CanonicalCollection {
        grammar: augmented,
        accept_rule,
        states,
        transitions,
    }
}
