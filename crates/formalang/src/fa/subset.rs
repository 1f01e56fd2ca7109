//! Subset construction (NFA to DFA).

use super::{Automaton, DEAD_STATE, START_STATE};
use crate::types::Set;
use std::collections::BTreeSet;

// DFA states are sets of NFA state names; sorting and joining the members
// gives the canonical map key. The singleton start set keeps the name `S`.
fn name_of(members: &BTreeSet<String>) -> String {
    members.iter().cloned().collect::<Vec<_>>().join(",")
}

/// Determinize an epsilon-free NFA. The transition function of the result
/// is total: missing moves go to the synthetic dead state [`DEAD_STATE`],
/// which loops to itself on every symbol.
#[tracing::instrument(skip_all)]
pub fn to_dfa(nfa: &Automaton) -> Automaton {
    let mut dfa = Automaton::default();
    if !nfa.states.contains_key(START_STATE) {
        return dfa;
    }
    let alphabet = nfa.alphabet();

    let start: BTreeSet<String> = Some(START_STATE.to_owned()).into_iter().collect();
    let mut seen: Set<String> = Some(name_of(&start)).into_iter().collect();
    let mut pending = vec![start];
    let mut needs_dead = false;

    while let Some(members) = pending.pop() {
        let name = name_of(&members);
        dfa.ensure_state(&name).is_final = members.iter().any(|m| nfa.is_final(m));

        for symbol in &alphabet {
            let mut targets: BTreeSet<String> = BTreeSet::new();
            for member in &members {
                let Some(node) = nfa.states.get(member) else {
                    continue;
                };
                if let Some(outgoing) = node.transitions.get(symbol) {
                    targets.extend(outgoing.iter().cloned());
                }
            }

            if targets.is_empty() {
                dfa.add_transition(&name, symbol, DEAD_STATE);
                needs_dead = true;
            } else {
                let target_name = name_of(&targets);
                if seen.insert(target_name.clone()) {
                    pending.push(targets);
                }
                dfa.add_transition(&name, symbol, &target_name);
            }
        }
    }

    if needs_dead {
        for symbol in &alphabet {
            dfa.add_transition(DEAD_STATE, symbol, DEAD_STATE);
        }
    }

    tracing::trace!(states = dfa.states.len(), "subset construction done");
    dfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::FINAL_STATE;

    fn sample_nfa() -> Automaton {
        // Accepts strings over {a, b} ending in b, nondeterministically.
        let mut nfa = Automaton::default();
        nfa.add_transition("S", "a", "S");
        nfa.add_transition("S", "b", "S");
        nfa.add_transition("S", "b", FINAL_STATE);
        nfa.mark_final(FINAL_STATE);
        nfa
    }

    #[test]
    fn transition_function_is_total() {
        let dfa = to_dfa(&sample_nfa());
        let alphabet = dfa.alphabet();

        for (name, node) in &dfa.states {
            for symbol in &alphabet {
                let targets = node.transitions.get(symbol);
                assert_eq!(
                    targets.map(|t| t.len()),
                    Some(1),
                    "missing or nondeterministic move from {} on {}",
                    name,
                    symbol
                );
            }
        }
    }

    #[test]
    fn member_sets_are_canonicalized_by_sorting() {
        let dfa = to_dfa(&sample_nfa());
        assert!(dfa.states.contains_key("S"));
        assert!(dfa.states.contains_key("S,_FIN"));
    }

    #[test]
    fn finality_is_any_member_final() {
        let dfa = to_dfa(&sample_nfa());
        assert!(!dfa.is_final("S"));
        assert!(dfa.is_final("S,_FIN"));
    }

    #[test]
    fn dead_state_loops_on_every_symbol() {
        let mut nfa = Automaton::default();
        nfa.add_transition("S", "a", FINAL_STATE);
        nfa.add_transition("S", "b", FINAL_STATE);
        nfa.mark_final(FINAL_STATE);
        let dfa = to_dfa(&nfa);

        let dead = &dfa.states[DEAD_STATE];
        assert!(!dead.is_final);
        for symbol in dfa.alphabet().iter() {
            assert!(dead.transitions[symbol].contains(DEAD_STATE));
        }
    }

    #[test]
    fn language_is_preserved() {
        let nfa = sample_nfa();
        let dfa = to_dfa(&nfa);

        for input in [&["b"][..], &["a", "b"], &["b", "a"], &["a", "b", "a", "b"], &[]] {
            assert_eq!(nfa.accepts(input), dfa.accepts(input), "{:?}", input);
        }
    }
}
