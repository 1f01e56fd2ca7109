//! Epsilon-transition elimination.

use super::{Automaton, StateNode, EPSILON};
use crate::types::Set;

/// Walks chains of epsilon transitions and splices whatever they reach back
/// onto the chain's origin. A visited set per origin keeps epsilon cycles
/// from looping.
struct EpsilonEliminator<'a> {
    input: &'a Automaton,
}

impl<'a> EpsilonEliminator<'a> {
    /// The epsilon-free replacement for `origin`: the union of all
    /// non-epsilon transitions and finality flags reachable from it along
    /// epsilon chains, `origin` itself included.
    fn resolve(&self, origin: &str) -> StateNode {
        let mut node = StateNode::default();
        let mut visited: Set<String> = Set::default();
        visited.insert(origin.to_owned());

        let mut i = 0;
        while i < visited.len() {
            let state = visited.get_index(i).expect("index in bounds").clone();
            i += 1;
            let Some(source) = self.input.states.get(&state) else {
                continue;
            };
            node.is_final |= source.is_final;
            for (symbol, targets) in &source.transitions {
                if symbol == EPSILON {
                    for target in targets {
                        visited.insert(target.clone());
                    }
                } else {
                    node.transitions
                        .entry(symbol.clone())
                        .or_default()
                        .extend(targets.iter().cloned());
                }
            }
        }
        node
    }
}

/// Produce an epsilon-free automaton accepting the same language.
#[tracing::instrument(skip_all)]
pub fn eliminate(automaton: &Automaton) -> Automaton {
    let eliminator = EpsilonEliminator { input: automaton };
    let mut out = Automaton::default();
    for name in automaton.states.keys() {
        let node = eliminator.resolve(name);
        out.states.insert(name.clone(), node);
    }
    out
}
