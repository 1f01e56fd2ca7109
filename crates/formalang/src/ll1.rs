//! LL(1) parse-table construction.

use crate::{
    grammar::{Grammar, RuleId, Symbol},
    sets::{FirstSets, FollowSets},
    types::Set,
    util::display_fn,
};
use std::fmt;

/// The LL(1) table: one row per nonterminal, one column per terminal plus
/// the end marker. Cells hold every applicable rule; more than one entry in
/// a cell is a conflict, which is reported rather than resolved.
#[derive(Debug)]
pub struct Ll1Table {
    pub rows: Vec<String>,
    pub columns: Vec<Symbol>,
    cells: Vec<Vec<Vec<RuleId>>>,
    pub conflicts: usize,
    pub conclusions: Vec<String>,
}

impl Ll1Table {
    #[tracing::instrument(skip_all)]
    pub fn build(grammar: &Grammar) -> Self {
        let first_sets = FirstSets::new(grammar);
        let follow_sets = FollowSets::new(grammar, &first_sets);

        let rows: Vec<String> = grammar.nonterminals().into_iter().collect();
        let mut columns: Vec<Symbol> = grammar
            .terminals()
            .into_iter()
            .map(Symbol::Terminal)
            .collect();
        columns.push(Symbol::Eoi);

        let mut cells = vec![vec![Vec::new(); columns.len()]; rows.len()];
        let empty_only: Set<Symbol> = Some(Symbol::Empty).into_iter().collect();

        for (row, nonterminal) in rows.iter().enumerate() {
            for (id, rule) in grammar.rules_for(nonterminal) {
                if rule.is_empty_rule() {
                    // An epsilon rule applies wherever the nonterminal may end.
                    let Some(follow) = follow_sets.get(nonterminal) else {
                        continue;
                    };
                    for symbol in follow {
                        if let Some(col) = columns.iter().position(|c| c == symbol) {
                            cells[row][col].push(id);
                        }
                    }
                } else {
                    let firsts = first_sets.of_sequence(rule.rhs(), &empty_only);
                    for symbol in &firsts {
                        if symbol.is_empty() {
                            continue;
                        }
                        if let Some(col) = columns.iter().position(|c| c == symbol) {
                            cells[row][col].push(id);
                        }
                    }
                }
            }
        }

        let conflicts = cells
            .iter()
            .flatten()
            .filter(|cell| cell.len() > 1)
            .count();

        let mut conclusions = Vec::new();
        if conflicts == 0 {
            conclusions.push("This grammar is LL(1)".to_owned());
        } else {
            conclusions.push("This grammar is not LL(1)".to_owned());
            conclusions.push(format!("{} conflicts found", conflicts));
        }

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            conflicts,
            "LL(1) table built"
        );

        Self {
            rows,
            columns,
            cells,
            conflicts,
            conclusions,
        }
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts == 0
    }

    /// The rules filling the cell at (`nonterminal`, `symbol`).
    pub fn entries(&self, nonterminal: &str, symbol: &Symbol) -> &[RuleId] {
        let row = self.rows.iter().position(|r| r == nonterminal);
        let col = self.columns.iter().position(|c| c == symbol);
        match (row, col) {
            (Some(row), Some(col)) => &self.cells[row][col],
            _ => &[],
        }
    }

    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (row, nonterminal) in self.rows.iter().enumerate() {
                for (col, symbol) in self.columns.iter().enumerate() {
                    for id in &self.cells[row][col] {
                        writeln!(
                            f,
                            "M[{}, {}] = {}",
                            nonterminal,
                            symbol,
                            grammar.display_rule(*id)
                        )?;
                    }
                }
            }
            Ok(())
        })
    }
}
