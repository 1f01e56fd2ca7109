//! DFA minimization by partition refinement.

use super::{Automaton, START_STATE};
use crate::types::Map;
use bit_set::BitSet;
use std::collections::VecDeque;

/// Minimize a total DFA.
///
/// Seeds the partition with the final/non-final split, then refines against
/// inverse-transition splitter sets until no block splits further, requeuing
/// both halves of every split. The block containing the original start
/// state is renamed back to `S`; other blocks take the sorted join of their
/// member names.
#[tracing::instrument(skip_all)]
pub fn minimize(dfa: &Automaton) -> Automaton {
    let states: Vec<String> = dfa.states.keys().cloned().collect();
    let index: Map<String, usize> = states
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();
    let alphabet: Vec<String> = dfa.alphabet().into_iter().collect();

    let mut inverse = vec![vec![BitSet::default(); states.len()]; alphabet.len()];
    for (i, name) in states.iter().enumerate() {
        let node = &dfa.states[name];
        for (s, symbol) in alphabet.iter().enumerate() {
            let Some(targets) = node.transitions.get(symbol) else {
                continue;
            };
            for target in targets {
                if let Some(&j) = index.get(target) {
                    inverse[s][j].insert(i);
                }
            }
        }
    }

    let mut finals = BitSet::default();
    let mut non_finals = BitSet::default();
    for (i, name) in states.iter().enumerate() {
        if dfa.states[name].is_final {
            finals.insert(i);
        } else {
            non_finals.insert(i);
        }
    }
    let mut blocks: Vec<BitSet> = [finals, non_finals]
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect();

    let mut queue: VecDeque<usize> = (0..blocks.len()).collect();
    while let Some(w) = queue.pop_front() {
        let splitter = blocks[w].clone();
        for (s, _) in alphabet.iter().enumerate() {
            let mut sources = BitSet::default();
            for q in splitter.iter() {
                sources.union_with(&inverse[s][q]);
            }
            if sources.is_empty() {
                continue;
            }

            let mut b = 0;
            while b < blocks.len() {
                let inside: BitSet = blocks[b].intersection(&sources).collect();
                if inside.is_empty() || inside == blocks[b] {
                    b += 1;
                    continue;
                }
                let outside: BitSet = blocks[b].difference(&sources).collect();
                blocks[b] = inside;
                blocks.push(outside);
                queue.push_back(b);
                queue.push_back(blocks.len() - 1);
                b += 1;
            }
        }
    }

    let mut block_of = vec![0usize; states.len()];
    for (bi, block) in blocks.iter().enumerate() {
        for q in block.iter() {
            block_of[q] = bi;
        }
    }

    let start_index = index.get(START_STATE).copied();
    let names: Vec<String> = blocks
        .iter()
        .map(|block| {
            if start_index.map_or(false, |s| block.contains(s)) {
                START_STATE.to_owned()
            } else {
                let mut members: Vec<&str> =
                    block.iter().map(|q| states[q].as_str()).collect();
                members.sort_unstable();
                members.join(",")
            }
        })
        .collect();

    let mut out = Automaton::default();
    for (bi, block) in blocks.iter().enumerate() {
        let Some(rep) = block.iter().next() else {
            continue;
        };
        let node = &dfa.states[&states[rep]];
        out.ensure_state(&names[bi]).is_final = node.is_final;
        for (symbol, targets) in &node.transitions {
            let Some(target) = targets.first() else {
                continue;
            };
            if let Some(&j) = index.get(target) {
                out.add_transition(&names[bi], symbol, &names[block_of[j]]);
            }
        }
    }

    tracing::debug!(
        before = states.len(),
        after = out.states.len(),
        "minimization done"
    );
    out
}
