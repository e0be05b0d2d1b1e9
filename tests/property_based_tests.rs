use proptest::prelude::*;
use regcmd::registry::token_count;
use regcmd::{handler, Command, CommandRegistry, RegistrationError};

fn keyword_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}".prop_filter("help is reserved", |k| k != "help")
}

fn names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..5)
}

fn wildcard_phrase(keyword: &str, arity: usize) -> String {
    std::iter::once(keyword.to_string())
        .chain(std::iter::repeat("(.*)".to_string()).take(arity))
        .collect::<Vec<_>>()
        .join(" ")
}

proptest! {
    /// Property: each wildcard token is replaced by its name, in order
    #[test]
    fn descriptions_substitute_names_in_order(
        keyword in keyword_strategy(),
        names in names_strategy(),
    ) {
        let phrase = wildcard_phrase(&keyword, names.len());
        let command = Command::compile(&phrase, &names[..], vec![handler(|_, _| {})]).unwrap();

        let expected = std::iter::once(keyword.clone())
            .chain(names.iter().map(|name| format!("<{name}>")))
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(command.description(), expected.as_str());
        prop_assert_eq!(command.keyword(), keyword.as_str());
        prop_assert_eq!(command.token_count(), names.len() + 1);
    }

    /// Property: fewer names than capture groups is always rejected
    #[test]
    fn missing_names_are_rejected(
        keyword in keyword_strategy(),
        arity in 1usize..5,
        missing in 1usize..5,
    ) {
        let missing = missing.min(arity);
        let phrase = wildcard_phrase(&keyword, arity);
        let names = vec!["n"; arity - missing];
        let registry = CommandRegistry::new();

        let result = registry.register(&phrase, &names[..], vec![handler(|_, _| {})]);

        let is_arity_error = matches!(
            result,
            Err(RegistrationError::Arity { expected, provided, .. })
                if expected == arity && provided == arity - missing
        );
        prop_assert!(is_arity_error);
        prop_assert!(registry.is_empty());
    }

    /// Property: wildcard phrases capture every whitespace-free token verbatim
    #[test]
    fn wildcard_phrases_capture_tokens(
        keyword in keyword_strategy(),
        values in prop::collection::vec("[A-Za-z0-9.,:-]{0,10}", 0..5),
    ) {
        // A lone "help" argument is claimed by the keyword help command
        prop_assume!(values.len() != 1 || values[0] != "help");
        let names = vec!["v"; values.len()];
        let phrase = wildcard_phrase(&keyword, values.len());
        let registry = CommandRegistry::new();
        registry.register(&phrase, &names[..], vec![handler(|_, _| {})]).unwrap();

        let line = std::iter::once(keyword.clone())
            .chain(values.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(token_count(&line), values.len() + 1);

        let (command, args) = registry.find(&line).unwrap();
        prop_assert_eq!(command.phrase(), phrase.as_str());
        prop_assert_eq!(args, values);
    }
}
