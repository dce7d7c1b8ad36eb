use std::collections::BTreeSet;

use proptest::prelude::*;

/// Shell-flavoured text: words, quotes, operators, substitutions, heredocs.
fn shellish() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-z]{1,6}",
        Just("defects4j test".to_string()),
        Just("git diff".to_string()),
        Just("VAR=1".to_string()),
        Just("./run.sh".to_string()),
        Just(" && ".to_string()),
        Just(" || ".to_string()),
        Just(" | ".to_string()),
        Just("; ".to_string()),
        Just(" & ".to_string()),
        Just("\n".to_string()),
        Just("'".to_string()),
        Just("\"".to_string()),
        Just("$(".to_string()),
        Just(")".to_string()),
        Just("(".to_string()),
        Just("`".to_string()),
        Just(" <<EOF\n".to_string()),
        Just("EOF\n".to_string()),
        Just("if ".to_string()),
        Just("; then ".to_string()),
        Just("; fi".to_string()),
        Just(" { ".to_string()),
        Just(" } ".to_string()),
        Just("\\\n".to_string()),
        Just(" ".to_string()),
    ];
    prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn parse_never_panics(input in "\\PC{0,300}") {
        let _ = cmdseq::parse(&input, true);
        let _ = cmdseq::parse(&input, false);
    }

    #[test]
    fn parse_never_panics_on_shell_text(input in shellish()) {
        let _ = cmdseq::parse(&input, true);
    }

    #[test]
    fn unique_is_subsequence_with_same_values(input in shellish()) {
        let full = cmdseq::parse(&input, true);
        let unique = cmdseq::parse(&input, false);

        let mut rest = full.iter();
        prop_assert!(unique.iter().all(|u| rest.any(|f| f == u)));

        let full_set: BTreeSet<&String> = full.iter().collect();
        let unique_set: BTreeSet<&String> = unique.iter().collect();
        prop_assert_eq!(&full_set, &unique_set);
        prop_assert_eq!(unique_set.len(), unique.len());
    }

    #[test]
    fn no_empty_identifiers_without_quotes(
        input in shellish().prop_map(|s| s.replace(['\'', '"'], " ")),
    ) {
        prop_assert!(cmdseq::parse(&input, true).iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn operator_free_input_is_one_command(
        head in "x[a-z0-9_.-]{0,8}",
        args in prop::collection::vec("[a-z0-9_./-]{1,10}", 0..6),
    ) {
        let input = std::iter::once(head).chain(args).collect::<Vec<_>>().join(" ");
        prop_assert_eq!(cmdseq::parse(&input, true).len(), 1);
    }

    #[test]
    fn chained_commands_keep_order(
        names in prop::collection::vec("x[a-z]{0,6}", 1..8),
        op in prop::sample::select(vec![" && ", " || ", "; ", " & ", " | ", "\n"]),
    ) {
        let input = names.join(op);
        prop_assert_eq!(cmdseq::parse(&input, true), names);
    }
}
