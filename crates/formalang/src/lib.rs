//! Formal-language toolkit.
//!
//! Given a grammar (regular or context-free) expressed as an ordered list of
//! production rules, this crate builds the classical analysis artifacts:
//! FIRST/FOLLOW sets, LL(1) and LR-family parser tables, the finite-automaton
//! transformation pipeline for right-linear grammars (NFA, DFA, minimized DFA,
//! extracted regular expression), and an Earley recognizer for
//! ambiguity-aware membership testing.
//!
//! The surface syntax of grammar files is out of scope: callers hand over
//! rule structures (see [`grammar::Grammar::builder`]) and receive plain
//! result values back.

pub mod earley;
pub mod fa;
pub mod grammar;
pub mod item;
pub mod ll1;
pub mod lr;
pub mod semantics;
pub mod sets;
pub mod types;
pub mod util;
