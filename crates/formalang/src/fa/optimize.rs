//! Reachability and co-reachability pruning.

use super::{Automaton, START_STATE};
use crate::types::Set;

/// Drop every state not reachable from [`START_STATE`], epsilon transitions
/// included, and filter dangling targets out of the kept states.
#[tracing::instrument(skip_all)]
pub fn prune_unreachable(automaton: &Automaton) -> Automaton {
    let mut reached: Set<String> = Set::default();
    if automaton.states.contains_key(START_STATE) {
        reached.insert(START_STATE.to_owned());
    }
    let mut i = 0;
    while i < reached.len() {
        let state = reached.get_index(i).expect("index in bounds").clone();
        i += 1;
        if let Some(node) = automaton.states.get(&state) {
            for targets in node.transitions.values() {
                for target in targets {
                    if automaton.states.contains_key(target) {
                        reached.insert(target.clone());
                    }
                }
            }
        }
    }

    retain(automaton, &reached)
}

/// Drop every state from which no final state is reachable, found by
/// backward fixed-point propagation from the final states. The start state
/// survives even when dead, so the automaton keeps a valid entry point.
#[tracing::instrument(skip_all)]
pub fn prune_dead(automaton: &Automaton) -> Automaton {
    let mut alive: Set<String> = automaton
        .states
        .iter()
        .filter(|(_, node)| node.is_final)
        .map(|(name, _)| name.clone())
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (name, node) in &automaton.states {
            if alive.contains(name) {
                continue;
            }
            let leads_to_alive = node
                .transitions
                .values()
                .flatten()
                .any(|target| alive.contains(target));
            if leads_to_alive {
                alive.insert(name.clone());
                changed = true;
            }
        }
    }

    if automaton.states.contains_key(START_STATE) {
        alive.insert(START_STATE.to_owned());
    }
    retain(automaton, &alive)
}

fn retain(automaton: &Automaton, keep: &Set<String>) -> Automaton {
    let mut out = Automaton::default();
    for (name, node) in &automaton.states {
        if !keep.contains(name) {
            continue;
        }
        let kept = out.ensure_state(name);
        kept.is_final = node.is_final;
        for (symbol, targets) in &node.transitions {
            for target in targets {
                if keep.contains(target) {
                    kept.transitions
                        .entry(symbol.clone())
                        .or_default()
                        .insert(target.clone());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::{EPSILON, FINAL_STATE};

    #[test]
    fn unreachable_states_are_dropped() {
        let mut automaton = Automaton::default();
        automaton.add_transition("S", "a", FINAL_STATE);
        automaton.mark_final(FINAL_STATE);
        automaton.add_transition("Z", "b", FINAL_STATE);

        let pruned = prune_unreachable(&automaton);
        assert!(!pruned.states.contains_key("Z"));
        assert!(pruned.states.contains_key("S"));
        assert!(pruned.accepts(&["a"]));
    }

    #[test]
    fn reachability_follows_epsilon_edges() {
        let mut automaton = Automaton::default();
        automaton.add_transition("S", EPSILON, "A");
        automaton.add_transition("A", "a", FINAL_STATE);
        automaton.mark_final(FINAL_STATE);

        let pruned = prune_unreachable(&automaton);
        assert!(pruned.states.contains_key("A"));
    }

    #[test]
    fn states_with_no_path_to_final_are_dropped() {
        let mut automaton = Automaton::default();
        automaton.add_transition("S", "a", FINAL_STATE);
        automaton.add_transition("S", "b", "T");
        automaton.add_transition("T", "b", "T");
        automaton.mark_final(FINAL_STATE);

        let pruned = prune_dead(&automaton);
        assert!(!pruned.states.contains_key("T"));
        // The dangling transition into T went with it.
        assert!(!pruned.states["S"].transitions.contains_key("b"));
    }

    #[test]
    fn start_state_survives_dead_pruning() {
        let mut automaton = Automaton::default();
        automaton.add_transition("S", "a", "S");

        let pruned = prune_dead(&automaton);
        assert!(pruned.states.contains_key("S"));
        assert!(!pruned.accepts(&["a"]));
    }
}
