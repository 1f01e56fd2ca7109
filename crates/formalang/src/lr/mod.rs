//! The LR family of parser-table builders.
//!
//! LR(0), SLR(1), LR(1) and LALR(1) all share the same skeleton: build the
//! canonical collection of item sets over the augmented grammar
//! ([`build`]), then synthesize an action/goto table from the collection
//! ([`table`]). The flavors differ only in how items carry lookahead and in
//! which columns finished items place their reduce actions.

pub mod build;
pub mod lalr;
pub mod table;

pub use build::{canonical_lr0, canonical_lr1, CanonicalCollection, ItemSet, StateId};
pub use lalr::merge_by_core;
pub use table::{Action, ConflictSummary, LrTable, TableKind};
