//! Dotted items.
//!
//! A single item type serves every flavor used in this crate: plain LR(0)
//! items leave both optional fields unset, LR(1) items carry a lookahead,
//! and Earley items carry an origin position. Equality and hashing are
//! structural over all four components, which is what makes items usable as
//! set members during canonical-collection and chart construction.

use crate::{
    grammar::{Grammar, RuleId, Symbol},
    util::display_fn,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub rule: RuleId,
    pub dot: usize,
    pub lookahead: Option<Symbol>,
    pub origin: Option<usize>,
}

impl Item {
    pub fn new(rule: RuleId) -> Self {
        Self {
            rule,
            dot: 0,
            lookahead: None,
            origin: None,
        }
    }

    pub fn with_lookahead(rule: RuleId, lookahead: Symbol) -> Self {
        Self {
            rule,
            dot: 0,
            lookahead: Some(lookahead),
            origin: None,
        }
    }

    pub fn with_origin(rule: RuleId, origin: usize) -> Self {
        Self {
            rule,
            dot: 0,
            lookahead: None,
            origin: Some(origin),
        }
    }

    /// Whether the dot has reached the end of the right-hand side.
    pub fn is_finished(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.rule(self.rule).rhs().len()
    }

    /// The symbol immediately after the dot, or `None` if finished.
    pub fn next_symbol<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
        grammar.rule(self.rule).rhs().get(self.dot)
    }

    pub fn next_is_nonterminal(&self, grammar: &Grammar) -> bool {
        self.next_symbol(grammar).map_or(false, Symbol::is_nonterminal)
    }

    pub fn next_is_empty(&self, grammar: &Grammar) -> bool {
        self.next_symbol(grammar).map_or(false, Symbol::is_empty)
    }

    /// The same item with the dot advanced by one position.
    pub fn shifted(&self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self.clone()
        }
    }

    /// `"A -> x . y [la, origin]"` rendering against the owning grammar.
    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let rule = grammar.rule(self.rule);
            write!(f, "{} ->", rule.lhs())?;
            for (i, symbol) in rule.rhs().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if self.dot == rule.rhs().len() {
                f.write_str(" .")?;
            }
            if let Some(lookahead) = &self.lookahead {
                write!(f, " [{}]", lookahead)?;
            }
            if let Some(origin) = self.origin {
                write!(f, " ({})", origin)?;
            }
            Ok(())
        })
    }
}
