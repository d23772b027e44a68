use proptest::prelude::*;
use scriptrun::annotate::parse_line;
use scriptrun::cache::ScriptHash;

proptest! {
    #[test]
    fn hash_is_deterministic(script in ".*") {
        prop_assert_eq!(ScriptHash::of(&script), ScriptHash::of(&script));
    }

    #[test]
    fn appended_whitespace_changes_the_hash(script in ".*") {
        let padded = format!("{script} ");
        prop_assert_ne!(ScriptHash::of(&script), ScriptHash::of(&padded));
    }

    #[test]
    fn reference_positions_are_zero_based(
        file in "[a-zA-Z_/]{1,20}\\.kts?",
        line in 1usize..100_000,
        col in 1usize..1_000,
        message in "[ -~]{0,40}",
        offset in 0usize..10_000,
    ) {
        let text = format!("{file}:{line}:{col}: {message}");

        let reference = parse_line(&text, offset).expect("reference is recognised");

        prop_assert_eq!(reference.line, line - 1);
        prop_assert_eq!(reference.column, col - 1);
        prop_assert_eq!(reference.span.start, offset);
        prop_assert_eq!(reference.span.len(), text.chars().count());
    }

    #[test]
    fn text_without_two_numbers_is_ignored(text in "[a-zA-Z .]{0,60}") {
        prop_assert!(parse_line(&text, 0).is_none());
    }
}
