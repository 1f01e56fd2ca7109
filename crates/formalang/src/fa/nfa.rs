//! NFA construction from a right-linear grammar.
//!
//! Four rule shapes are handled:
//!
//! 1. `A -> w V` (terminals `w`, nonterminal `V`): a chain of transitions
//!    from `A` through fresh intermediate states, ending at `V`.
//! 2. `A -> w`: the same chain, but the last transition targets the shared
//!    final sink [`FINAL_STATE`].
//! 3. `A -> #`: `A` itself is marked final.
//! 4. `A -> V`: an epsilon transition from `A` to `V`.

use super::{Automaton, FaError, EPSILON, FINAL_STATE};
use crate::grammar::{Grammar, Rule, Symbol};

struct NfaBuilder {
    automaton: Automaton,
    // Intermediate names never collide with declared nonterminals: they are
    // prefixed with `_S-` and numbered by this counter.
    mid_states: usize,
}

impl NfaBuilder {
    fn fresh_state(&mut self) -> String {
        self.mid_states += 1;
        format!("_S-{}", self.mid_states)
    }

    fn add_rule(&mut self, rule: &Rule) -> Result<(), FaError> {
        self.automaton.ensure_state(rule.lhs());

        if rule.is_empty_rule() {
            self.automaton.mark_final(rule.lhs());
            return Ok(());
        }
        if let [Symbol::Nonterminal(target)] = rule.rhs() {
            self.automaton.add_transition(rule.lhs(), EPSILON, target);
            return Ok(());
        }

        let mut current = rule.lhs().to_owned();
        let last = rule.rhs().len() - 1;
        for (i, symbol) in rule.rhs().iter().enumerate() {
            match symbol {
                Symbol::Terminal(label) => {
                    let target = match rule.rhs().get(i + 1) {
                        None => FINAL_STATE.to_owned(),
                        Some(Symbol::Nonterminal(name)) => name.clone(),
                        Some(_) => self.fresh_state(),
                    };
                    self.automaton.add_transition(&current, label, &target);
                    current = target;
                }
                Symbol::Nonterminal(_) if i == last => {
                    // Reached as the target of the previous transition.
                }
                _ => return Err(FaError::NotRightLinear(rule.to_string())),
            }
        }
        if let Some(Symbol::Terminal(_)) = rule.rhs().last() {
            self.automaton.mark_final(FINAL_STATE);
        }
        Ok(())
    }
}

/// Build the NFA of a right-linear grammar.
#[tracing::instrument(skip_all)]
pub fn build(grammar: &Grammar) -> Result<Automaton, FaError> {
    let mut builder = NfaBuilder {
        automaton: Automaton::default(),
        mid_states: 0,
    };
    for (_, rule) in grammar.rules() {
        builder.add_rule(rule)?;
    }
    tracing::trace!(states = builder.automaton.states.len(), "NFA built");
    Ok(builder.automaton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::START_STATE;

    #[test]
    fn terminal_chain_ends_in_final_sink() {
        let grammar = Grammar::builder().rule("S", ["a", "b"]).build().unwrap();
        let nfa = build(&grammar).unwrap();

        // a goes to a fresh intermediate, b from there to the sink.
        let start = &nfa.states[START_STATE];
        let mid = start.transitions["a"].first().unwrap().clone();
        assert_eq!(mid, "_S-1");
        assert!(nfa.states[&mid].transitions["b"].contains(FINAL_STATE));
        assert!(nfa.is_final(FINAL_STATE));
        assert!(nfa.accepts(&["a", "b"]));
        assert!(!nfa.accepts(&["a"]));
    }

    #[test]
    fn trailing_nonterminal_reuses_its_state() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "A"])
            .rule("A", ["b"])
            .build()
            .unwrap();
        let nfa = build(&grammar).unwrap();

        assert!(nfa.states[START_STATE].transitions["a"].contains("A"));
        assert!(nfa.accepts(&["a", "b"]));
    }

    #[test]
    fn unit_rule_becomes_epsilon_transition() {
        let grammar = Grammar::builder()
            .rule("S", ["A"])
            .rule("A", ["a"])
            .build()
            .unwrap();
        let nfa = build(&grammar).unwrap();

        assert!(nfa.states[START_STATE].transitions[EPSILON].contains("A"));
        assert!(nfa.accepts(&["a"]));
    }

    #[test]
    fn empty_rule_marks_the_state_final() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "S"])
            .rule("S", ["#"])
            .build()
            .unwrap();
        let nfa = build(&grammar).unwrap();

        assert!(nfa.is_final(START_STATE));
        assert!(nfa.accepts(&[]));
        assert!(nfa.accepts(&["a", "a"]));
    }

    #[test]
    fn interior_nonterminal_is_rejected() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "A", "b"])
            .rule("A", ["a"])
            .build()
            .unwrap();
        assert!(matches!(
            build(&grammar),
            Err(FaError::NotRightLinear(_))
        ));
    }

    #[test]
    fn intermediate_names_are_unique_across_rules() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "b"])
            .rule("S", ["c", "d"])
            .build()
            .unwrap();
        let nfa = build(&grammar).unwrap();

        assert!(nfa.states.contains_key("_S-1"));
        assert!(nfa.states.contains_key("_S-2"));
    }
}
