//! Semantic analysis of a grammar.
//!
//! Issues are collected, never thrown: errors make downstream algorithms
//! meaningless (an undeclared nonterminal, a missing start symbol), while
//! warnings flag properties the caller may still want to act on
//! (unreachable nonterminals, cyclic dependencies, left recursion).

use crate::{
    grammar::{Grammar, Symbol, START_SYMBOL},
    types::{Map, Set},
};
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticIssue {
    #[error("{0} is not defined")]
    UndeclaredNonterminal(String),

    #[error("start symbol `{}` is not defined", START_SYMBOL)]
    MissingStartSymbol,

    #[error("{0} is unreachable")]
    UnreachableNonterminal(String),

    #[error("cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("left recursion exists in {}", .symbols.join(", "))]
    LeftRecursion { symbols: Vec<String> },
}

impl SemanticIssue {
    pub fn severity(&self) -> Severity {
        match self {
            Self::UndeclaredNonterminal(_) | Self::MissingStartSymbol => Severity::Error,
            Self::UnreachableNonterminal(_)
            | Self::CyclicDependency { .. }
            | Self::LeftRecursion { .. } => Severity::Warning,
        }
    }
}

#[derive(Debug)]
pub struct Analysis {
    pub issues: Vec<SemanticIssue>,
}

impl Analysis {
    pub fn errors(&self) -> impl Iterator<Item = &SemanticIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SemanticIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Run every check and collect the issues in a fixed order: declaration
/// errors, reachability, cyclic dependencies, left recursion.
#[tracing::instrument(skip_all)]
pub fn analyze(grammar: &Grammar) -> Analysis {
    let mut issues = Vec::new();
    check_declarations(grammar, &mut issues);
    check_unreachable(grammar, &mut issues);
    check_cycles(grammar, &mut issues);
    if let Some(issue) = check_left_recursion(grammar) {
        issues.push(issue);
    }
    tracing::debug!(issues = issues.len(), "analysis done");
    Analysis { issues }
}

fn check_declarations(grammar: &Grammar, issues: &mut Vec<SemanticIssue>) {
    let declared: Set<&str> = grammar.rules().map(|(_, rule)| rule.lhs()).collect();

    let mut undeclared: Set<&str> = Set::default();
    for (_, rule) in grammar.rules() {
        for symbol in rule.rhs() {
            if let Symbol::Nonterminal(name) = symbol {
                if !declared.contains(name.as_str()) {
                    undeclared.insert(name);
                }
            }
        }
    }
    issues.extend(
        undeclared
            .into_iter()
            .map(|name| SemanticIssue::UndeclaredNonterminal(name.to_owned())),
    );

    if !declared.contains(START_SYMBOL) {
        issues.push(SemanticIssue::MissingStartSymbol);
    }
}

/// The dependency graph over declared nonterminals: an edge per nonterminal
/// occurrence on a right-hand side.
fn dependency_graph(grammar: &Grammar) -> Map<String, Set<String>> {
    let mut graph: Map<String, Set<String>> = Map::default();
    for (_, rule) in grammar.rules() {
        let targets = graph.entry(rule.lhs().to_owned()).or_default();
        for symbol in rule.rhs() {
            if let Symbol::Nonterminal(name) = symbol {
                targets.insert(name.clone());
            }
        }
    }
    graph
}

fn check_unreachable(grammar: &Grammar, issues: &mut Vec<SemanticIssue>) {
    let graph = dependency_graph(grammar);

    let mut visited: Set<&str> = Set::default();
    let mut stack = vec![START_SYMBOL];
    while let Some(current) = stack.pop() {
        let Some(targets) = graph.get(current) else {
            continue;
        };
        if !visited.insert(current) {
            continue;
        }
        stack.extend(targets.iter().map(String::as_str));
    }

    issues.extend(
        graph
            .keys()
            .filter(|name| !visited.contains(name.as_str()))
            .map(|name| SemanticIssue::UnreachableNonterminal(name.clone())),
    );
}

fn check_cycles(grammar: &Grammar, issues: &mut Vec<SemanticIssue>) {
    let graph = dependency_graph(grammar);
    let mut visited: Set<String> = Set::default();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    fn visit(
        node: &str,
        graph: &Map<String, Set<String>>,
        visited: &mut Set<String>,
        stack: &mut Vec<String>,
        cycles: &mut Vec<Vec<String>>,
    ) -> bool {
        if !visited.insert(node.to_owned()) {
            return false;
        }
        stack.push(node.to_owned());

        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(start) = stack.iter().position(|n| n == target) {
                    cycles.push(stack[start..].to_vec());
                    stack.pop();
                    return true;
                }
                if visit(target, graph, visited, stack, cycles) {
                    stack.pop();
                    return true;
                }
            }
        }

        stack.pop();
        false
    }

    for node in graph.keys() {
        if !visited.contains(node) {
            let mut stack = Vec::new();
            visit(node, &graph, &mut visited, &mut stack, &mut cycles);
        }
    }

    issues.extend(
        cycles
            .into_iter()
            .map(|cycle| SemanticIssue::CyclicDependency { cycle }),
    );
}

/// Indirect left recursion: a chain `A0 -> β0 A1 …`, `A1 -> β1 A2 …`, …,
/// `An -> βn A0 …` where every `βi` is nullable. BFS from the start symbol
/// over leftmost nullable-prefix nonterminals; a revisit closes a cycle.
/// Only the first cycle found is reported, and a nonterminal's back
/// reference keeps only the parent that most recently realized it.
fn check_left_recursion(grammar: &Grammar) -> Option<SemanticIssue> {
    let mut queue: VecDeque<String> = VecDeque::from([START_SYMBOL.to_owned()]);
    let mut back_ref: Map<String, String> = Map::default();
    let mut visited: Set<String> = Set::default();
    let mut cyclic: Option<Set<String>> = None;

    while let Some(current) = queue.pop_front() {
        for (_, rule) in grammar.rules_for(&current) {
            for symbol in rule.rhs() {
                let Symbol::Nonterminal(name) = symbol else {
                    break;
                };

                visited.insert(current.clone());
                back_ref.insert(name.clone(), current.clone());

                if !visited.contains(name) {
                    queue.push_back(name.clone());
                } else {
                    let mut members: Set<String> = Set::default();
                    members.insert(name.clone());
                    members.insert(current.clone());
                    let mut cursor = current.clone();
                    while cursor != *name {
                        let Some(parent) = back_ref.get(&cursor) else {
                            break;
                        };
                        cursor = parent.clone();
                        if !members.insert(cursor.clone()) {
                            break;
                        }
                    }
                    cyclic = Some(members);
                }

                if !grammar.is_nullable(name) {
                    break;
                }
            }
        }
    }

    cyclic.map(|members| SemanticIssue::LeftRecursion {
        symbols: members.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_nonterminal_is_an_error() {
        let grammar = Grammar::builder().rule("S", ["A", "b"]).build().unwrap();
        let analysis = analyze(&grammar);

        assert!(analysis.has_errors());
        assert!(analysis
            .issues
            .contains(&SemanticIssue::UndeclaredNonterminal("A".into())));
    }

    #[test]
    fn missing_start_symbol_is_an_error() {
        let grammar = Grammar::builder().rule("A", ["a"]).build().unwrap();
        let analysis = analyze(&grammar);

        assert!(analysis.issues.contains(&SemanticIssue::MissingStartSymbol));
        assert!(analysis
            .issues
            .contains(&SemanticIssue::UnreachableNonterminal("A".into())));
    }

    #[test]
    fn unreachable_nonterminal_is_a_warning() {
        let grammar = Grammar::builder()
            .rule("S", ["a"])
            .rule("B", ["b"])
            .build()
            .unwrap();
        let analysis = analyze(&grammar);

        assert!(!analysis.has_errors());
        let warnings: Vec<_> = analysis.warnings().collect();
        assert_eq!(
            warnings,
            vec![&SemanticIssue::UnreachableNonterminal("B".into())]
        );
    }

    #[test]
    fn recursion_reports_a_cyclic_dependency() {
        let grammar = Grammar::builder()
            .rule("S", ["a", "S"])
            .rule("S", ["b"])
            .build()
            .unwrap();
        let analysis = analyze(&grammar);

        assert!(analysis
            .issues
            .contains(&SemanticIssue::CyclicDependency { cycle: vec!["S".into()] }));
        // Right recursion is not left recursion.
        assert!(!analysis
            .issues
            .iter()
            .any(|issue| matches!(issue, SemanticIssue::LeftRecursion { .. })));
    }

    #[test]
    fn direct_left_recursion_is_detected() {
        let grammar = Grammar::builder()
            .rule("S", ["S", "a"])
            .rule("S", ["a"])
            .build()
            .unwrap();
        let issue = check_left_recursion(&grammar).unwrap();

        assert!(matches!(
            issue,
            SemanticIssue::LeftRecursion { ref symbols } if symbols.contains(&"S".to_owned())
        ));
    }

    #[test]
    fn indirect_left_recursion_through_nullable_prefix() {
        let grammar = Grammar::builder()
            .rule("S", ["A", "a"])
            .rule("A", ["S", "b"])
            .rule("A", ["#"])
            .build()
            .unwrap();
        let issue = check_left_recursion(&grammar).unwrap();

        let SemanticIssue::LeftRecursion { symbols } = issue else {
            panic!("expected left recursion");
        };
        assert!(symbols.contains(&"S".to_owned()));
        assert!(symbols.contains(&"A".to_owned()));
    }

    #[test]
    fn issue_messages_render_for_display() {
        assert_eq!(
            SemanticIssue::UndeclaredNonterminal("A".into()).to_string(),
            "A is not defined"
        );
        assert_eq!(
            SemanticIssue::CyclicDependency { cycle: vec!["S".into(), "A".into()] }.to_string(),
            "cyclic dependency detected: S -> A"
        );
        assert_eq!(
            SemanticIssue::LeftRecursion { symbols: vec!["S".into(), "A".into()] }.to_string(),
            "left recursion exists in S, A"
        );
    }
}
