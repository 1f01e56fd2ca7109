//! Grammar types.
//!
//! A [`Grammar`] is the simplified representation every algorithm in this
//! crate consumes: an ordered list of production rules plus the cached set of
//! nullable nonterminals. Rules are immutable once constructed; downstream
//! algorithms reference them through [`RuleId`]s and never copy them
//! destructively.

use crate::{types::Set, util::display_fn};
use std::fmt;

/// Name of the conventional start nonterminal.
pub const START_SYMBOL: &str = "S";

/// Name of the synthetic start nonterminal introduced by [`Grammar::augmented`].
pub const AUGMENTED_START: &str = "_S";

/// A grammar symbol.
///
/// Token classification follows the shared DSL conventions: nonterminals
/// start with an uppercase letter, `#`/`ε`/`λ` denote the empty string,
/// `$` is the end-of-input marker, and any other token is a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
    Empty,
    Eoi,
}

impl Symbol {
    /// Classify a raw token into a symbol.
    pub fn classify(token: &str) -> Self {
        match token {
            "#" | "ε" | "λ" => Self::Empty,
            "$" => Self::Eoi,
            _ if token.chars().next().map_or(false, |c| c.is_ascii_uppercase()) => {
                Self::Nonterminal(token.to_owned())
            }
            _ => Self::Terminal(token.to_owned()),
        }
    }

    /// The surface spelling of this symbol.
    pub fn name(&self) -> &str {
        match self {
            Self::Terminal(name) | Self::Nonterminal(name) => name,
            Self::Empty => "#",
            Self::Eoi => "$",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(..))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Self::Nonterminal(..))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a production rule within its owning [`Grammar`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleId {
    raw: usize,
}

impl RuleId {
    pub(crate) const fn new(raw: usize) -> Self {
        Self { raw }
    }

    pub fn index(&self) -> usize {
        self.raw
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// A production rule: a left-hand nonterminal and the ordered sequence of
/// symbols it derives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule {
    lhs: String,
    rhs: Vec<Symbol>,
}

impl Rule {
    pub fn new(lhs: impl Into<String>, rhs: Vec<Symbol>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs,
        }
    }

    /// Build a rule by classifying raw tokens.
    pub fn from_tokens<I, T>(lhs: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::new(
            lhs,
            tokens
                .into_iter()
                .map(|tok| Symbol::classify(tok.as_ref()))
                .collect(),
        )
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    /// Whether the right-hand side is the explicit empty string.
    pub fn is_empty_rule(&self) -> bool {
        matches!(self.rhs.first(), Some(Symbol::Empty))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for symbol in &self.rhs {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("the grammar has no rules")]
    NoRules,

    #[error("rule for `{lhs}' has an empty right-hand side")]
    EmptyRhs { lhs: String },

    #[error("rule for `{lhs}' mixes the empty symbol with other symbols")]
    MisplacedEmpty { lhs: String },

    #[error("rule for `{lhs}' uses the end-of-input marker")]
    EndMarkerInRule { lhs: String },
}

/// The simplified grammar representation shared by every algorithm.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    nullables: Set<String>,
}

impl Grammar {
    /// Start building a grammar rule by rule.
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder { rules: Vec::new() }
    }

    pub(crate) fn from_rules(rules: Vec<Rule>) -> Self {
        let nullables = compute_nullables(&rules);
        Self { rules, nullables }
    }

    /// All rules, in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (RuleId::new(i), rule))
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.raw]
    }

    /// Rules whose left-hand side is `nonterminal`, in declaration order.
    ///
    /// Every algorithm that must enumerate productions deterministically
    /// goes through this accessor.
    pub fn rules_for<'g>(
        &'g self,
        nonterminal: &'g str,
    ) -> impl Iterator<Item = (RuleId, &'g Rule)> + 'g {
        self.rules().filter(move |(_, rule)| rule.lhs() == nonterminal)
    }

    /// Terminal symbols in use, in order of first occurrence.
    pub fn terminals(&self) -> Set<String> {
        let mut set = Set::default();
        for rule in &self.rules {
            for symbol in rule.rhs() {
                if let Symbol::Terminal(name) = symbol {
                    set.insert(name.clone());
                }
            }
        }
        set
    }

    /// Nonterminal symbols with at least one rule, in declaration order.
    pub fn nonterminals(&self) -> Set<String> {
        self.rules.iter().map(|rule| rule.lhs.clone()).collect()
    }

    /// Whether `nonterminal` can derive the empty string.
    pub fn is_nullable(&self, nonterminal: &str) -> bool {
        self.nullables.contains(nonterminal)
    }

    /// Append a rule and recompute the nullable set from scratch.
    ///
    /// Grammars are small; no incremental update is attempted.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.nullables = compute_nullables(&self.rules);
    }

    /// Clone this grammar augmented with the synthetic start rule `_S -> S`,
    /// returning the new grammar and the id of the added rule.
    pub fn augmented(&self) -> (Grammar, RuleId) {
        let mut augmented = self.clone();
        augmented.add_rule(Rule::new(
            AUGMENTED_START,
            vec![Symbol::Nonterminal(START_SYMBOL.to_owned())],
        ));
        let accept = RuleId::new(augmented.rules.len() - 1);
        (augmented, accept)
    }

    /// `"A -> x B"` rendering of a single rule.
    pub fn display_rule(&self, id: RuleId) -> impl fmt::Display + '_ {
        display_fn(move |f| write!(f, "{}", self.rule(id)))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

/// Fixed-point computation of the nullable set.
///
/// A nonterminal is nullable if some rule reduces it to the empty symbol or
/// to a sequence of already-nullable nonterminals. The set grows
/// monotonically and the nonterminal set is finite, so the loop terminates.
fn compute_nullables(rules: &[Rule]) -> Set<String> {
    let mut nullables = Set::default();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            if nullables.contains(rule.lhs()) {
                continue;
            }
            let derives_empty = rule.is_empty_rule()
                || rule.rhs().iter().all(|symbol| match symbol {
                    Symbol::Nonterminal(n) => nullables.contains(n),
                    Symbol::Empty => true,
                    _ => false,
                });
            if derives_empty {
                nullables.insert(rule.lhs().to_owned());
                changed = true;
            }
        }
    }
    nullables
}

/// The contextual values for building a [`Grammar`].
#[derive(Debug)]
pub struct GrammarBuilder {
    rules: Vec<Rule>,
}

impl GrammarBuilder {
    /// Add a rule, classifying each token per the DSL conventions.
    pub fn rule<I, T>(&mut self, lhs: &str, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.rules.push(Rule::from_tokens(lhs, tokens));
        self
    }

    /// Add an already-constructed rule.
    pub fn rule_with(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn build(&mut self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::NoRules);
        }
        for rule in &self.rules {
            if rule.rhs().is_empty() {
                return Err(GrammarError::EmptyRhs {
                    lhs: rule.lhs().to_owned(),
                });
            }
            if rule.rhs().len() > 1 && rule.rhs().iter().any(Symbol::is_empty) {
                return Err(GrammarError::MisplacedEmpty {
                    lhs: rule.lhs().to_owned(),
                });
            }
            if rule.rhs().iter().any(|s| matches!(s, Symbol::Eoi)) {
                return Err(GrammarError::EndMarkerInRule {
                    lhs: rule.lhs().to_owned(),
                });
            }
        }
        Ok(Grammar::from_rules(std::mem::take(&mut self.rules)))
    }
}
