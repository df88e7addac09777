//! Strict mode and environment configuration tests.
//!
//! Strict mode disables every non-standard selector, identifier and
//! tolerant parsing behavior; the default environment accepts them.

use serde_json::json;

use quarry::Environment;

fn strict() -> Environment {
    Environment::strict()
}

mod strict_rejections {
    use super::*;

    #[test]
    fn non_standard_syntax_is_rejected() {
        let env = strict();
        for path in [
            "users.name",            // missing root identifier
            "$.users[?@.a in [1]]",  // membership and list literals
            "$[?@.a =~ /x/]",        // regex operator
            "$[?@.a <> 1]",          // alternative not-equal
            "$[~]",                  // keys selector
            "$.~a",                  // key selector
            "$[~?@ > 1]",            // keys filter selector
            "$[?# == 'a']",          // current key
            "$[?_.limit > 1]",       // filter context
            "^[0]",                  // pseudo root
            "$['a',]",               // trailing comma
            "$..",                   // bare descendant segment
            "$[a]",                  // unquoted name selector
            "$.a[$.b]",              // embedded singular query
            "$[?@.a == undefined]",  // undefined literal
        ] {
            assert!(
                env.compile(path).is_err(),
                "{path:?} should be rejected in strict mode"
            );
        }
    }

    #[test]
    fn compound_queries_are_rejected() {
        let env = strict();
        assert!(env.compile("$.a | $.b").is_err());
        assert!(env.compile("$.a & $.b").is_err());
    }

    #[test]
    fn standard_queries_still_work() {
        let env = strict();
        let data = json!({"users": [{"name": "Sue", "score": 100}, {"name": "Jane", "score": 55}]});
        assert_eq!(
            env.findall("$.users[?@.score < 100].name", &data).expect("compile"),
            vec![json!("Jane")]
        );
        assert_eq!(
            env.findall("$..name", &data).expect("compile"),
            vec![json!("Sue"), json!("Jane")]
        );
    }
}

mod default_tolerance {
    use super::*;

    #[test]
    fn the_default_environment_accepts_the_extensions() {
        let env = Environment::new();
        let data = json!({"a": {"b": 1}});
        for path in [
            "a.b",
            "$[~]",
            "$.a[?# == 'b']",
            "^[0].a.b",
            "$['a',]",
            "$..",
        ] {
            assert!(env.compile(path).is_ok(), "{path:?} should compile");
        }
    }

    #[test]
    fn missing_root_is_prepended() {
        let data = json!({"a": {"b": 42}});
        assert_eq!(
            quarry::findall("a.b", &data).expect("compile"),
            vec![json!(42)]
        );
    }
}

mod configured_tokens {
    use super::*;

    #[test]
    fn root_and_self_tokens_are_configurable() {
        let env = Environment::builder()
            .root_token("€")
            .self_token("%")
            .build();
        let data = json!({"items": [{"n": 1}, {"n": 5}]});
        let values = env
            .findall("€.items[?%.n > 2].n", &data)
            .expect("compile");
        assert_eq!(values, vec![json!(5)]);
    }

    #[test]
    fn longer_configured_tokens_win() {
        // `$$` for the filter context while `$` stays the root.
        let env = Environment::builder().context_token("$$").build();
        let data = json!([{"price": 5}, {"price": 15}]);
        let context = json!({"limit": 10});
        let values = env
            .findall_with("$[?@.price < $$.limit].price", &data, Some(&context))
            .expect("compile");
        assert_eq!(values, vec![json!(5)]);
    }

    #[test]
    fn empty_tokens_are_disabled() {
        let env = Environment::builder().keys_token("").build();
        assert!(env.compile("$[~]").is_err());
    }

    #[test]
    fn logical_words_are_configurable() {
        let env = Environment::builder()
            .and_word("also")
            .or_word("either")
            .build();
        let data = json!([{"a": 1, "b": 1}, {"a": 1}]);
        let values = env
            .findall("$[?@.a also @.b]", &data)
            .expect("compile");
        assert_eq!(values, vec![json!({"a": 1, "b": 1})]);
        // The default words are plain names now.
        assert!(env.compile("$[?@.a either @.b]").is_ok());
    }

    #[test]
    fn unicode_escapes_can_be_disabled() {
        let data = json!({"\\u00e9": 1, "é": 2});
        let env = Environment::builder().unicode_escape(false).build();
        assert_eq!(
            env.findall("$['\\u00e9']", &data).expect("compile"),
            vec![json!(1)]
        );
        assert_eq!(
            quarry::findall("$['\\u00e9']", &data).expect("compile"),
            vec![json!(2)]
        );
    }

    #[test]
    fn filter_caching_can_be_disabled() {
        let env = Environment::builder().filter_caching(false).build();
        let data = json!({"cap": 2, "items": [1, 2, 3]});
        assert_eq!(
            env.findall("$.items[?@ < $.cap]", &data).expect("compile"),
            vec![json!(1)]
        );
    }
}
