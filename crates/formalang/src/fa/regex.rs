//! Regular-expression extraction by Brzozowski's algebraic method.

use super::{Automaton, EPSILON, START_STATE};
use std::fmt;

/// A regular expression over string-labeled symbols.
///
/// Values are built through the simplifying constructors, so trivial
/// identities (`ε.r = r`, `r|r = r`, `∅* = ε`, …) never survive into the
/// rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    Empty,
    Epsilon,
    Symbol(String),
    Concat(Box<Regex>, Box<Regex>),
    Union(Box<Regex>, Box<Regex>),
    Star(Box<Regex>),
}

impl Regex {
    pub fn symbol(label: &str) -> Self {
        Self::Symbol(label.to_owned())
    }

    pub fn concat(lhs: Self, rhs: Self) -> Self {
        match (lhs, rhs) {
            (Self::Empty, _) | (_, Self::Empty) => Self::Empty,
            (Self::Epsilon, r) | (r, Self::Epsilon) => r,
            (lhs, rhs) => Self::Concat(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn union(lhs: Self, rhs: Self) -> Self {
        match (lhs, rhs) {
            (Self::Empty, r) | (r, Self::Empty) => r,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => Self::Union(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn star(inner: Self) -> Self {
        match inner {
            Self::Empty | Self::Epsilon => Self::Epsilon,
            star @ Self::Star(_) => star,
            inner => Self::Star(Box::new(inner)),
        }
    }

    /// Whether the denoted language contains the empty string.
    pub fn nullable(&self) -> bool {
        match self {
            Self::Empty | Self::Symbol(_) => false,
            Self::Epsilon | Self::Star(_) => true,
            Self::Concat(lhs, rhs) => lhs.nullable() && rhs.nullable(),
            Self::Union(lhs, rhs) => lhs.nullable() || rhs.nullable(),
        }
    }

    /// The Brzozowski derivative with respect to one input symbol.
    pub fn derivative(&self, symbol: &str) -> Self {
        match self {
            Self::Empty | Self::Epsilon => Self::Empty,
            Self::Symbol(label) => {
                if label == symbol {
                    Self::Epsilon
                } else {
                    Self::Empty
                }
            }
            Self::Concat(lhs, rhs) => {
                let step = Self::concat(lhs.derivative(symbol), (**rhs).clone());
                if lhs.nullable() {
                    Self::union(step, rhs.derivative(symbol))
                } else {
                    step
                }
            }
            Self::Union(lhs, rhs) => {
                Self::union(lhs.derivative(symbol), rhs.derivative(symbol))
            }
            Self::Star(inner) => {
                Self::concat(inner.derivative(symbol), Self::Star(inner.clone()))
            }
        }
    }

    /// Membership test by successive derivatives.
    pub fn matches(&self, input: &[&str]) -> bool {
        let mut current = self.clone();
        for symbol in input {
            current = current.derivative(symbol);
            if current == Self::Empty {
                return false;
            }
        }
        current.nullable()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("∅"),
            Self::Epsilon => f.write_str("ε"),
            Self::Symbol(label) => f.write_str(label),
            Self::Concat(lhs, rhs) => write!(f, "{}.{}", lhs, rhs),
            Self::Union(lhs, rhs) => write!(f, "({}|{})", lhs, rhs),
            Self::Star(inner) => match **inner {
                // Unions print their own parentheses.
                Self::Symbol(_) | Self::Union(..) | Self::Epsilon => {
                    write!(f, "{}*", inner)
                }
                _ => write!(f, "({})*", inner),
            },
        }
    }
}

/// Extract a regular expression from an epsilon-free, pruned automaton by
/// state elimination over matrices A (inter-state path expressions) and B
/// (immediate acceptance). States are ordered with the start state first;
/// elimination runs from the last state down, and the survivor `B[0]` is the
/// answer. `None` means the automaton accepts nothing.
#[tracing::instrument(skip_all)]
pub fn extract(automaton: &Automaton) -> Option<Regex> {
    if !automaton.states.contains_key(START_STATE) {
        return None;
    }

    let mut states: Vec<&str> = vec![START_STATE];
    states.extend(
        automaton
            .states
            .keys()
            .map(String::as_str)
            .filter(|name| *name != START_STATE),
    );
    let count = states.len();

    let mut a = vec![vec![Regex::Empty; count]; count];
    let mut b = vec![Regex::Empty; count];
    for (i, name) in states.iter().enumerate() {
        let node = &automaton.states[*name];
        if node.is_final {
            b[i] = Regex::Epsilon;
        }
        for (symbol, targets) in &node.transitions {
            let label = if symbol == EPSILON {
                Regex::Epsilon
            } else {
                Regex::symbol(symbol)
            };
            for target in targets {
                let Some(j) = states.iter().position(|s| s == target) else {
                    continue;
                };
                a[i][j] = Regex::union(a[i][j].clone(), label.clone());
            }
        }
    }

    for n in (0..count).rev() {
        let loop_free = Regex::star(a[n][n].clone());
        b[n] = Regex::concat(loop_free.clone(), b[n].clone());
        for j in 0..n {
            a[n][j] = Regex::concat(loop_free.clone(), a[n][j].clone());
        }
        for i in 0..n {
            let via = a[i][n].clone();
            b[i] = Regex::union(b[i].clone(), Regex::concat(via.clone(), b[n].clone()));
            for j in 0..n {
                a[i][j] = Regex::union(
                    a[i][j].clone(),
                    Regex::concat(via.clone(), a[n][j].clone()),
                );
            }
        }
    }

    match b.into_iter().next().expect("start state present") {
        Regex::Empty => None,
        regex => Some(regex),
    }
}
