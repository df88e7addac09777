//! Error taxonomy tests: every compile-time error carries a kind and,
//! where available, the offending token's position.

use quarry::ErrorKind;

fn kind_of(path: &str) -> ErrorKind {
    quarry::compile(path).expect_err("should not compile").kind
}

mod syntax {
    use super::*;

    #[test]
    fn unterminated_brackets() {
        assert_eq!(kind_of("$["), ErrorKind::Syntax);
        assert_eq!(kind_of("$['a'"), ErrorKind::Syntax);
    }

    #[test]
    fn empty_bracketed_segment() {
        assert_eq!(kind_of("$[]"), ErrorKind::Syntax);
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(kind_of("$['a"), ErrorKind::Syntax);
    }

    #[test]
    fn unterminated_filter() {
        assert_eq!(kind_of("$[?@.a"), ErrorKind::Syntax);
        assert_eq!(kind_of("$[?(@.a]"), ErrorKind::Syntax);
    }

    #[test]
    fn empty_filter() {
        assert_eq!(kind_of("$[?]"), ErrorKind::Syntax);
    }

    #[test]
    fn leading_zero_in_index() {
        assert_eq!(kind_of("$[01]"), ErrorKind::Syntax);
        assert_eq!(kind_of("$[-01]"), ErrorKind::Syntax);
    }

    #[test]
    fn too_many_colons() {
        assert_eq!(kind_of("$[1:2:3:4]"), ErrorKind::Syntax);
    }

    #[test]
    fn trailing_compound_operator() {
        assert_eq!(kind_of("$.a |"), ErrorKind::Syntax);
    }

    #[test]
    fn unexpected_characters() {
        assert_eq!(kind_of("$.a %"), ErrorKind::Syntax);
    }

    #[test]
    fn non_singular_embedded_query() {
        assert_eq!(kind_of("$.a[$.b.*]"), ErrorKind::Syntax);
    }

    #[test]
    fn chained_comparisons_are_rejected() {
        assert_eq!(kind_of("$[?@.a == @.b in [1]]"), ErrorKind::Syntax);
        assert_eq!(kind_of("$[?@.a < @.b < @.c]"), ErrorKind::Syntax);
        assert_eq!(kind_of("$[?(@.a == 1) == true]"), ErrorKind::Syntax);
        // A grammar rule, not a well-typedness check.
        let env = quarry::Environment::builder().well_typed(false).build();
        assert_eq!(
            env.compile("$[?@.a == @.b in [1]]").expect_err("syntax error").kind,
            ErrorKind::Syntax
        );
    }

    #[test]
    fn errors_carry_line_and_column() {
        let err = quarry::compile("$.a\n  .b[?]").expect_err("syntax error");
        let message = err.to_string();
        assert!(message.contains("line 2"), "message: {message}");
    }
}

mod types {
    use super::*;

    #[test]
    fn non_singular_comparison_operands() {
        assert_eq!(kind_of("$[?@..a == 1]"), ErrorKind::Type);
        assert_eq!(kind_of("$[?$.a.* == 1]"), ErrorKind::Type);
        assert_eq!(kind_of("$[?@[*] > 2]"), ErrorKind::Type);
    }

    #[test]
    fn value_function_in_test_position() {
        assert_eq!(kind_of("$[?length(@)]"), ErrorKind::Type);
        assert_eq!(kind_of("$[?value(@.a)]"), ErrorKind::Type);
    }

    #[test]
    fn logical_function_in_comparison_position() {
        assert_eq!(kind_of("$[?match(@.a, 'x') == true]"), ErrorKind::Type);
    }

    #[test]
    fn wrong_function_argument_types() {
        assert_eq!(kind_of("$[?count(1) > 0]"), ErrorKind::Type);
        assert_eq!(kind_of("$[?match(@.a)]"), ErrorKind::Type);
        assert_eq!(kind_of("$[?length(@.a, @.b) == 1]"), ErrorKind::Type);
    }

    #[test]
    fn regex_operand_must_be_a_regex_literal() {
        assert_eq!(kind_of("$[?@.a =~ 'x']"), ErrorKind::Type);
    }

    #[test]
    fn invalid_regex_literals_fail_at_compile_time() {
        assert_eq!(kind_of("$[?@.a =~ /(bad/]"), ErrorKind::Type);
    }

    #[test]
    fn checks_disabled_without_well_typed() {
        let env = quarry::Environment::builder().well_typed(false).build();
        assert!(env.compile("$[?@..a == 1]").is_ok());
        assert!(env.compile("$[?length(@)]").is_ok());
    }
}

mod indices {
    use super::*;

    #[test]
    fn out_of_range_index_literals() {
        assert_eq!(kind_of("$[9007199254740992]"), ErrorKind::Index);
        assert_eq!(kind_of("$[-9007199254740992]"), ErrorKind::Index);
        assert_eq!(kind_of("$[0:9007199254740992]"), ErrorKind::Index);
    }

    #[test]
    fn limits_are_configurable() {
        let env = quarry::Environment::builder().max_int_index(10).build();
        assert_eq!(
            env.compile("$[11]").expect_err("index error").kind,
            ErrorKind::Index
        );
        assert!(env.compile("$[10]").is_ok());
    }
}

mod names {
    use super::*;

    #[test]
    fn unknown_functions() {
        assert_eq!(kind_of("$[?frobnicate(@)]"), ErrorKind::Name);
    }
}
