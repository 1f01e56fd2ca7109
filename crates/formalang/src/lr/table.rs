//! Action/goto table synthesis from a canonical collection.

use super::{
    build::{canonical_lr0, canonical_lr1, CanonicalCollection, StateId},
    lalr::merge_by_core,
};
use crate::{
    grammar::{Grammar, RuleId, Symbol, AUGMENTED_START},
    sets::{FirstSets, FollowSets},
    util::display_fn,
};
use std::fmt;

/// Which table flavor a [`LrTable`] was synthesized as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableKind {
    Lr0,
    Slr1,
    Lr1,
    Lalr1,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lr0 => "LR(0)",
            Self::Slr1 => "SLR(1)",
            Self::Lr1 => "LR(1)",
            Self::Lalr1 => "LALR(1)",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(RuleId),
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(state) => write!(f, "s{}", state.index()),
            Self::Reduce(rule) => write!(f, "r{}", rule.index()),
            Self::Accept => f.write_str("acc"),
        }
    }
}

/// Per-category conflict counts. A cell with both shifts and reduces counts
/// once as shift/reduce; a cell with several reduce-or-accept entries counts
/// once as reduce/reduce; several shifts in one cell count as shift/shift.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ConflictSummary {
    pub shift_reduce: usize,
    pub reduce_reduce: usize,
    pub shift_shift: usize,
}

impl ConflictSummary {
    pub fn total(&self) -> usize {
        self.shift_reduce + self.reduce_reduce + self.shift_shift
    }

    pub fn is_conflict_free(&self) -> bool {
        self.total() == 0
    }
}

/// An LR-family parse table. Conflicting cells keep every candidate action;
/// nothing is resolved silently.
#[derive(Debug)]
pub struct LrTable {
    pub kind: TableKind,
    pub collection: CanonicalCollection,
    pub action_columns: Vec<Symbol>,
    pub goto_columns: Vec<String>,
    actions: Vec<Vec<Vec<Action>>>,
    gotos: Vec<Vec<Vec<StateId>>>,
    pub conflicts: ConflictSummary,
    pub conclusions: Vec<String>,
}

impl LrTable {
    pub fn lr0(grammar: &Grammar) -> Self {
        Self::synthesize(TableKind::Lr0, canonical_lr0(grammar))
    }

    pub fn slr1(grammar: &Grammar) -> Self {
        Self::synthesize(TableKind::Slr1, canonical_lr0(grammar))
    }

    pub fn lr1(grammar: &Grammar) -> Self {
        Self::synthesize(TableKind::Lr1, canonical_lr1(grammar))
    }

    pub fn lalr1(grammar: &Grammar) -> Self {
        Self::synthesize(TableKind::Lalr1, merge_by_core(canonical_lr1(grammar)))
    }

    #[tracing::instrument(skip_all, fields(kind = %kind))]
    fn synthesize(kind: TableKind, collection: CanonicalCollection) -> Self {
        let grammar = &collection.grammar;

        let mut action_columns: Vec<Symbol> = grammar
            .terminals()
            .into_iter()
            .map(Symbol::Terminal)
            .collect();
        action_columns.push(Symbol::Eoi);
        let goto_columns: Vec<String> = grammar
            .nonterminals()
            .into_iter()
            .filter(|n| n != AUGMENTED_START)
            .collect();

        let states = collection.states.len();
        let mut actions = vec![vec![Vec::new(); action_columns.len()]; states];
        let mut gotos = vec![vec![Vec::new(); goto_columns.len()]; states];

        for ((from, symbol), to) in &collection.transitions {
            match symbol {
                Symbol::Nonterminal(name) => {
                    if let Some(col) = goto_columns.iter().position(|c| c == name) {
                        gotos[from.index()][col].push(*to);
                    }
                }
                _ => {
                    if let Some(col) = action_columns.iter().position(|c| c == symbol) {
                        actions[from.index()][col].push(Action::Shift(*to));
                    }
                }
            }
        }

        let follow_sets = match kind {
            TableKind::Slr1 => {
                let first_sets = FirstSets::new(grammar);
                Some(FollowSets::new(grammar, &first_sets))
            }
            _ => None,
        };
        let eoi_col = action_columns.len() - 1;

        for (i, state) in collection.states.iter().enumerate() {
            for item in state {
                if !item.is_finished(grammar) {
                    continue;
                }
                let accept = item.rule == collection.accept_rule;
                match kind {
                    // Without lookahead the reduce (or accept) lands in
                    // every terminal column of the row.
                    TableKind::Lr0 => {
                        let action = if accept {
                            Action::Accept
                        } else {
                            Action::Reduce(item.rule)
                        };
                        for cell in &mut actions[i] {
                            cell.push(action);
                        }
                    }
                    TableKind::Slr1 => {
                        if accept {
                            actions[i][eoi_col].push(Action::Accept);
                            continue;
                        }
                        let follow = follow_sets
                            .as_ref()
                            .expect("follow sets computed for SLR(1)")
                            .get(grammar.rule(item.rule).lhs());
                        let Some(follow) = follow else { continue };
                        for symbol in follow {
                            if let Some(col) =
                                action_columns.iter().position(|c| c == symbol)
                            {
                                actions[i][col].push(Action::Reduce(item.rule));
                            }
                        }
                    }
                    TableKind::Lr1 | TableKind::Lalr1 => {
                        if accept {
                            actions[i][eoi_col].push(Action::Accept);
                            continue;
                        }
                        let lookahead =
                            item.lookahead.clone().unwrap_or(Symbol::Eoi);
                        if let Some(col) =
                            action_columns.iter().position(|c| *c == lookahead)
                        {
                            actions[i][col].push(Action::Reduce(item.rule));
                        }
                    }
                }
            }
        }

        let mut conflicts = ConflictSummary::default();
        for row in &actions {
            for cell in row {
                let shifts = cell
                    .iter()
                    .filter(|a| matches!(a, Action::Shift(_)))
                    .count();
                let reduces = cell.len() - shifts;
                if shifts > 0 && reduces > 0 {
                    conflicts.shift_reduce += 1;
                }
                if reduces > 1 {
                    conflicts.reduce_reduce += 1;
                }
                if shifts > 1 {
                    conflicts.shift_shift += 1;
                }
            }
        }

        let mut conclusions = Vec::new();
        if conflicts.is_conflict_free() {
            conclusions.push(format!("This grammar is {}", kind));
        } else {
            conclusions.push(format!("This grammar is not {}", kind));
            if conflicts.shift_shift > 0 {
                conclusions.push(format!(
                    "{} shift/shift conflicts found",
                    conflicts.shift_shift
                ));
            }
            if conflicts.reduce_reduce > 0 {
                conclusions.push(format!(
                    "{} reduce/reduce conflicts found",
                    conflicts.reduce_reduce
                ));
            }
            if conflicts.shift_reduce > 0 {
                conclusions.push(format!(
                    "{} shift/reduce conflicts found",
                    conflicts.shift_reduce
                ));
            }
        }

        tracing::debug!(
            states,
            shift_reduce = conflicts.shift_reduce,
            reduce_reduce = conflicts.reduce_reduce,
            shift_shift = conflicts.shift_shift,
            "{} table built",
            kind
        );

        Self {
            kind,
            collection,
            action_columns,
            goto_columns,
            actions,
            gotos,
            conflicts,
            conclusions,
        }
    }

    pub fn state_count(&self) -> usize {
        self.collection.states.len()
    }

    /// All candidate actions in the cell at (`state`, `symbol`).
    pub fn actions(&self, state: StateId, symbol: &Symbol) -> &[Action] {
        match self.action_columns.iter().position(|c| c == symbol) {
            Some(col) => &self.actions[state.index()][col],
            None => &[],
        }
    }

    /// All goto targets in the cell at (`state`, `nonterminal`).
    pub fn gotos(&self, state: StateId, nonterminal: &str) -> &[StateId] {
        match self.goto_columns.iter().position(|c| c == nonterminal) {
            Some(col) => &self.gotos[state.index()][col],
            None => &[],
        }
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for i in 0..self.state_count() {
                write!(f, "{:02}:", i)?;
                for (col, symbol) in self.action_columns.iter().enumerate() {
                    for action in &self.actions[i][col] {
                        write!(f, " {}={}", symbol, action)?;
                    }
                }
                for (col, name) in self.goto_columns.iter().enumerate() {
                    for target in &self.gotos[i][col] {
                        write!(f, " {}={}", name, target)?;
                    }
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}
