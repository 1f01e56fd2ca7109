//! Finite-automaton pipeline for right-linear grammars.
//!
//! The pipeline turns a right-linear grammar into an NFA, prunes it, removes
//! epsilon transitions, determinizes, minimizes, and finally extracts a
//! regular expression. Each stage consumes the previous stage's graph and
//! returns a fresh one; nothing is mutated across stages, so every
//! transformation is independently testable and [`run`] can record all of
//! them as [`Step`]s.

pub mod epsilon;
pub mod minimize;
pub mod nfa;
pub mod optimize;
pub mod regex;
pub mod subset;

pub use regex::Regex;

use crate::{
    grammar::Grammar,
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

/// The epsilon transition label.
pub const EPSILON: &str = "#";
/// The start state, named after the grammar's start symbol.
pub const START_STATE: &str = "S";
/// The shared final sink targeted by purely-terminal rules.
pub const FINAL_STATE: &str = "_FIN";
/// The synthetic dead state that makes DFA transition functions total.
pub const DEAD_STATE: &str = "Φ";

#[derive(Debug, thiserror::Error)]
pub enum FaError {
    #[error("rule `{0}` is not right-linear")]
    NotRightLinear(String),
}

/// One automaton state: labeled transitions to target-state sets, plus a
/// finality flag. Multiple targets per label and epsilon labels make this
/// general enough for every stage; DFAs simply keep the target sets at one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateNode {
    pub transitions: Map<String, Set<String>>,
    pub is_final: bool,
}

/// A finite automaton as an adjacency map from state name to node.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Automaton {
    pub states: Map<String, StateNode>,
}

impl Automaton {
    pub fn ensure_state(&mut self, name: &str) -> &mut StateNode {
        if !self.states.contains_key(name) {
            self.states.insert(name.to_owned(), StateNode::default());
        }
        self.states.get_mut(name).expect("inserted above")
    }

    pub fn add_transition(&mut self, from: &str, symbol: &str, to: &str) {
        self.ensure_state(to);
        self.ensure_state(from)
            .transitions
            .entry(symbol.to_owned())
            .or_default()
            .insert(to.to_owned());
    }

    pub fn mark_final(&mut self, name: &str) {
        self.ensure_state(name).is_final = true;
    }

    pub fn is_final(&self, name: &str) -> bool {
        self.states.get(name).map_or(false, |node| node.is_final)
    }

    /// All transition labels except epsilon, in first-use order.
    pub fn alphabet(&self) -> Set<String> {
        let mut alphabet = Set::default();
        for node in self.states.values() {
            for symbol in node.transitions.keys() {
                if symbol != EPSILON {
                    alphabet.insert(symbol.clone());
                }
            }
        }
        alphabet
    }

    fn epsilon_closure(&self, mut states: Set<String>) -> Set<String> {
        let mut i = 0;
        while i < states.len() {
            let state = states.get_index(i).expect("index in bounds").clone();
            i += 1;
            let Some(node) = self.states.get(&state) else {
                continue;
            };
            if let Some(targets) = node.transitions.get(EPSILON) {
                for target in targets {
                    states.insert(target.clone());
                }
            }
        }
        states
    }

    /// Direct simulation from [`START_STATE`], epsilon transitions included.
    /// Works unchanged on NFAs and DFAs.
    pub fn accepts(&self, input: &[&str]) -> bool {
        if !self.states.contains_key(START_STATE) {
            return false;
        }
        let mut current: Set<String> = Some(START_STATE.to_owned()).into_iter().collect();
        current = self.epsilon_closure(current);

        for token in input {
            let mut next = Set::default();
            for state in &current {
                let Some(node) = self.states.get(state) else {
                    continue;
                };
                if let Some(targets) = node.transitions.get(*token) {
                    next.extend(targets.iter().cloned());
                }
            }
            current = self.epsilon_closure(next);
            if current.is_empty() {
                return false;
            }
        }

        current.iter().any(|state| self.is_final(state))
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, node) in &self.states {
            write!(f, "{}{}", name, if node.is_final { "*" } else { "" })?;
            for (symbol, targets) in &node.transitions {
                let targets = display_fn(move |f| {
                    for (i, target) in targets.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        f.write_str(target)?;
                    }
                    Ok(())
                });
                write!(f, " | {} -> {{{}}}", symbol, targets)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One recorded pipeline stage.
#[derive(Debug)]
pub struct Step {
    pub description: &'static str,
    pub automaton: Automaton,
}

/// All pipeline products at once. `steps` holds every intermediate graph in
/// order, suitable for stepping through the transformation.
#[derive(Debug)]
pub struct PipelineOutput {
    pub nfa: Automaton,
    pub dfa: Automaton,
    pub minimized: Automaton,
    pub regex: Option<Regex>,
    pub steps: Vec<Step>,
}

/// Run the whole pipeline on a right-linear grammar.
#[tracing::instrument(skip_all)]
pub fn run(grammar: &Grammar) -> Result<PipelineOutput, FaError> {
    let mut steps = Vec::new();
    let mut record = |description: &'static str, automaton: &Automaton| {
        tracing::debug!(states = automaton.states.len(), description);
        steps.push(Step {
            description,
            automaton: automaton.clone(),
        });
    };

    let nfa = nfa::build(grammar)?;
    record("NFA construction", &nfa);

    let pruned = optimize::prune_unreachable(&nfa);
    record("unreachable-state pruning", &pruned);
    let pruned = optimize::prune_dead(&pruned);
    record("dead-state pruning", &pruned);

    let epsilon_free = epsilon::eliminate(&pruned);
    record("epsilon elimination", &epsilon_free);

    let dfa = subset::to_dfa(&epsilon_free);
    record("subset construction", &dfa);

    let minimized = minimize::minimize(&dfa);
    record("minimization", &minimized);

    // Brzozowski elimination wants the epsilon-free pruned graph; the dead
    // state of the total DFA would only contribute vacuous terms.
    let regex = regex::extract(&epsilon_free);

    Ok(PipelineOutput {
        nfa,
        dfa,
        minimized,
        regex,
        steps,
    })
}
