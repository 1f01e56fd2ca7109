use formalang::{
    earley::Recognizer,
    fa,
    grammar::{Grammar, Symbol},
    ll1::Ll1Table,
    lr::LrTable,
    semantics,
    sets::{FirstSets, FollowSets},
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `S -> 0 1 S | 1 0 S | A. A -> 0 1 A | 1 0 A | #.`
fn canonical() -> Grammar {
    Grammar::builder()
        .rule("S", ["0", "1", "S"])
        .rule("S", ["1", "0", "S"])
        .rule("S", ["A"])
        .rule("A", ["0", "1", "A"])
        .rule("A", ["1", "0", "A"])
        .rule("A", ["#"])
        .build()
        .unwrap()
}

/// Dangling-else shape: after `i S`, an `e` may extend the current rule or
/// belong to an enclosing one.
fn dangling_else() -> Grammar {
    Grammar::builder()
        .rule("S", ["i", "S", "e", "S"])
        .rule("S", ["i", "S"])
        .rule("S", ["x"])
        .build()
        .unwrap()
}

/// Right-linear: `a* b+`.
fn regular() -> Grammar {
    Grammar::builder()
        .rule("S", ["a", "S"])
        .rule("S", ["b", "A"])
        .rule("A", ["b", "A"])
        .rule("A", ["#"])
        .build()
        .unwrap()
}

macro_rules! define_table_smoketests {
    ($($name:ident => $grammar:expr,)*) => {$(
        #[test]
        fn $name() {
            init_tracing();
            let grammar: Grammar = $grammar;
            let ll1 = Ll1Table::build(&grammar);
            assert!(!ll1.conclusions.is_empty());
            for table in [
                LrTable::lr0(&grammar),
                LrTable::slr1(&grammar),
                LrTable::lr1(&grammar),
                LrTable::lalr1(&grammar),
            ] {
                assert!(!table.conclusions.is_empty(), "{}", table.kind);
                // A deterministic GOTO function cannot produce two shifts
                // in one cell.
                assert_eq!(table.conflicts.shift_shift, 0, "{}", table.kind);
            }
        }
    )*};
}

define_table_smoketests! {
    tables_canonical => canonical(),
    tables_dangling_else => dangling_else(),
    tables_regular => regular(),
    tables_expression => Grammar::builder()
        .rule("S", ["S", "+", "T"])
        .rule("S", ["T"])
        .rule("T", ["T", "*", "U"])
        .rule("T", ["U"])
        .rule("U", ["(", "S", ")"])
        .rule("U", ["x"])
        .build()
        .unwrap(),
    tables_nullable_heavy => Grammar::builder()
        .rule("S", ["A", "B", "c"])
        .rule("A", ["a"])
        .rule("A", ["#"])
        .rule("B", ["b"])
        .rule("B", ["#"])
        .build()
        .unwrap(),
}

#[test]
fn canonical_fixture_first_follow() {
    init_tracing();
    let grammar = canonical();
    let first = FirstSets::new(&grammar);
    let follow = FollowSets::new(&grammar, &first);

    for name in ["S", "A"] {
        let first = first.get(name).unwrap();
        assert!(first.contains(&Symbol::Terminal("0".into())));
        assert!(first.contains(&Symbol::Terminal("1".into())));
        assert!(first.contains(&Symbol::Empty));

        let follow = follow.get(name).unwrap();
        assert_eq!(follow.len(), 1);
        assert!(follow.contains(&Symbol::Eoi));
    }
}

#[test]
fn canonical_fixture_is_ambiguous_everywhere() {
    init_tracing();
    let grammar = canonical();

    // Not LL(1), and not LR(k) for any flavor built here: ambiguous
    // grammars always carry conflicts.
    assert!(!Ll1Table::build(&grammar).is_ll1());
    for table in [
        LrTable::lr0(&grammar),
        LrTable::slr1(&grammar),
        LrTable::lr1(&grammar),
        LrTable::lalr1(&grammar),
    ] {
        assert!(!table.conflicts.is_conflict_free(), "{}", table.kind);
    }

    // The Earley recognizer sees the ambiguity directly: `0 1` derives
    // once through S and once through A.
    let recognizer = Recognizer::new(&grammar);
    assert_eq!(recognizer.derivations(&[]), 1);
    assert_eq!(recognizer.derivations(&["0", "1"]), 2);
    assert_eq!(recognizer.derivations(&["0"]), 0);
}

#[test]
fn dangling_else_is_one_shift_reduce_conflict() {
    init_tracing();
    let grammar = dangling_else();

    for table in [LrTable::lr0(&grammar), LrTable::slr1(&grammar)] {
        assert_eq!(table.conflicts.shift_reduce, 1, "{}", table.kind);
        assert_eq!(table.conflicts.reduce_reduce, 0, "{}", table.kind);
    }
    for table in [LrTable::lr1(&grammar), LrTable::lalr1(&grammar)] {
        assert!(table.conflicts.shift_reduce >= 1, "{}", table.kind);
        assert_eq!(table.conflicts.shift_shift, 0, "{}", table.kind);
    }
}

#[test]
fn lalr_state_count_matches_the_lr0_collection() {
    init_tracing();
    // A -> z finishes with lookahead c after `a` and d after `b`; LR(1)
    // keeps those states apart, LALR(1) folds them onto the LR(0) shape.
    let grammar = Grammar::builder()
        .rule("S", ["a", "A", "c"])
        .rule("S", ["b", "A", "d"])
        .rule("A", ["z"])
        .build()
        .unwrap();

    let lr0 = LrTable::lr0(&grammar);
    let lr1 = LrTable::lr1(&grammar);
    let lalr = LrTable::lalr1(&grammar);

    assert!(lalr.state_count() < lr1.state_count());
    assert_eq!(lalr.state_count(), lr0.state_count());
    assert!(lalr.conflicts.is_conflict_free());
}

#[test]
fn automaton_pipeline_end_to_end() {
    init_tracing();
    let grammar = regular();
    let output = fa::run(&grammar).unwrap();

    assert_eq!(output.steps.len(), 6);

    // The DFA transition function is total and deterministic.
    let alphabet = output.dfa.alphabet();
    for (name, node) in &output.dfa.states {
        for symbol in &alphabet {
            assert_eq!(
                node.transitions.get(symbol).map(|t| t.len()),
                Some(1),
                "state {} on {}",
                name,
                symbol
            );
        }
    }

    // NFA, DFA, minimized DFA, and the extracted regex agree on every
    // string over the alphabet up to length 6.
    let regex = output.regex.expect("language is non-empty");
    for len in 0..=6usize {
        for mask in 0..(1u32 << len) {
            let input: Vec<&str> = (0..len)
                .map(|i| if mask & (1 << i) != 0 { "b" } else { "a" })
                .collect();
            let expected = output.nfa.accepts(&input);
            assert_eq!(output.dfa.accepts(&input), expected, "{:?}", input);
            assert_eq!(output.minimized.accepts(&input), expected, "{:?}", input);
            assert_eq!(regex.matches(&input), expected, "{:?}", input);
        }
    }
}

#[test]
fn earley_agrees_with_the_automaton_on_a_regular_language() {
    init_tracing();
    let grammar = regular();
    let output = fa::run(&grammar).unwrap();
    let recognizer = Recognizer::new(&grammar);

    for len in 0..=5usize {
        for mask in 0..(1u32 << len) {
            let input: Vec<&str> = (0..len)
                .map(|i| if mask & (1 << i) != 0 { "b" } else { "a" })
                .collect();
            assert_eq!(
                recognizer.accepts(&input),
                output.minimized.accepts(&input),
                "{:?}",
                input
            );
        }
    }
}

#[test]
fn semantic_analysis_gates_the_toolkit() {
    init_tracing();

    let broken = Grammar::builder().rule("S", ["A", "b"]).build().unwrap();
    assert!(semantics::analyze(&broken).has_errors());

    let clean = regular();
    let analysis = semantics::analyze(&clean);
    assert!(!analysis.has_errors());
    // The recursion in S and A is still surfaced as a warning.
    assert!(analysis.warnings().count() > 0);
}
