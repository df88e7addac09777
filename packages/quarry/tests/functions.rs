//! Function extension tests: the standard functions, the opt-in
//! `keys` function, and custom extensions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use quarry::{Environment, ExpressionType, ExpressionValue, FilterFunction};

fn findall(path: &str, data: &Value) -> Vec<Value> {
    quarry::findall(path, data).expect("query should compile")
}

mod length {
    use super::*;

    #[test]
    fn strings_arrays_and_objects_have_lengths() {
        let data = json!([
            {"v": "hello"},
            {"v": [1, 2]},
            {"v": {"a": 1, "b": 2, "c": 3}}
        ]);
        assert_eq!(findall("$[?length(@.v) == 5].v", &data), vec![json!("hello")]);
        assert_eq!(findall("$[?length(@.v) == 2].v", &data), vec![json!([1, 2])]);
        assert_eq!(
            findall("$[?length(@.v) == 3].v", &data),
            vec![json!({"a": 1, "b": 2, "c": 3})]
        );
    }

    #[test]
    fn string_length_counts_code_points() {
        let data = json!([{"v": "héllo"}]);
        assert_eq!(findall("$[?length(@.v) == 5].v", &data), vec![json!("héllo")]);
    }

    #[test]
    fn other_types_have_no_length() {
        let data = json!([{"v": 5}, {"v": true}, {"v": null}]);
        assert_eq!(findall("$[?length(@.v) >= 0]", &data), Vec::<Value>::new());
    }
}

mod count {
    use super::*;

    #[test]
    fn counts_the_node_list() {
        let data = json!([
            {"items": [1, 2, 3]},
            {"items": []},
            {"items": [4]}
        ]);
        assert_eq!(
            findall("$[?count(@.items[*]) > 1].items", &data),
            vec![json!([1, 2, 3])]
        );
        assert_eq!(
            findall("$[?count(@.items[*]) == 0].items", &data),
            vec![json!([])]
        );
    }
}

mod regex_functions {
    use super::*;

    #[test]
    fn match_is_anchored() {
        let data = json!([{"n": "ab"}, {"n": "abc"}, {"n": "xabx"}]);
        assert_eq!(findall("$[?match(@.n, 'ab.')].n", &data), vec![json!("abc")]);
    }

    #[test]
    fn search_is_substring() {
        let data = json!([{"n": "ab"}, {"n": "abc"}, {"n": "xyz"}]);
        assert_eq!(
            findall("$[?search(@.n, 'ab')].n", &data),
            vec![json!("ab"), json!("abc")]
        );
    }

    #[test]
    fn invalid_runtime_patterns_do_not_match() {
        let data = json!([{"n": "abc", "p": "(unclosed"}]);
        assert_eq!(findall("$[?match(@.n, @.p)]", &data), Vec::<Value>::new());
    }
}

mod value_function {
    use super::*;

    #[test]
    fn value_unwraps_singular_node_lists() {
        let data = json!([{"a": [1]}, {"a": [1, 2]}]);
        assert_eq!(
            findall("$[?value(@.a[*]) == 1].a", &data),
            vec![json!([1])]
        );
    }
}

mod type_predicates {
    use super::*;

    #[test]
    fn typeof_names_json_types() {
        let data = json!([
            {"v": "s"},
            {"v": 1},
            {"v": [1]},
            {"v": {"a": 1}},
            {"v": true},
            {"v": null},
            {}
        ]);
        assert_eq!(findall("$[?typeof(@.v) == 'string'].v", &data), vec![json!("s")]);
        assert_eq!(findall("$[?typeof(@.v) == 'number'].v", &data), vec![json!(1)]);
        assert_eq!(findall("$[?typeof(@.v) == 'array'].v", &data), vec![json!([1])]);
        assert_eq!(
            findall("$[?typeof(@.v) == 'object'].v", &data),
            vec![json!({"a": 1})]
        );
        assert_eq!(findall("$[?typeof(@.v) == 'boolean'].v", &data), vec![json!(true)]);
        assert_eq!(findall("$[?typeof(@.v) == 'null'].v", &data), vec![json!(null)]);
        assert_eq!(findall("$[?typeof(@.v) == 'undefined']", &data), vec![json!({})]);
        // `type` is an alias.
        assert_eq!(findall("$[?type(@.v) == 'string'].v", &data), vec![json!("s")]);
    }

    #[test]
    fn isinstance_accepts_aliases() {
        let data = json!([{"v": "s"}, {"v": 1}, {}]);
        assert_eq!(findall("$[?isinstance(@.v, 'str')].v", &data), vec![json!("s")]);
        assert_eq!(findall("$[?is(@.v, 'number')].v", &data), vec![json!(1)]);
        assert_eq!(findall("$[?is(@.v, 'missing')]", &data), vec![json!({})]);
    }

    #[test]
    fn container_aliases_cover_tuple_and_dict() {
        let data = json!([{"v": [1, 2]}, {"v": {"a": 1}}]);
        for alias in ["array", "list", "sequence", "tuple"] {
            assert_eq!(
                findall(&format!("$[?is(@.v, '{alias}')].v"), &data),
                vec![json!([1, 2])],
                "alias {alias:?}"
            );
        }
        for alias in ["object", "dict", "mapping"] {
            assert_eq!(
                findall(&format!("$[?is(@.v, '{alias}')].v"), &data),
                vec![json!({"a": 1})],
                "alias {alias:?}"
            );
        }
    }
}

mod starts_with {
    use super::*;

    #[test]
    fn prefix_check() {
        let data = json!([{"n": "foobar"}, {"n": "barfoo"}, {"n": 3}]);
        assert_eq!(
            findall("$[?startswith(@.n, 'foo')].n", &data),
            vec![json!("foobar")]
        );
    }
}

mod keys_function {
    use super::*;

    #[test]
    fn unregistered_by_default() {
        let err = quarry::compile("$[?keys(@) == ['a']]").expect_err("name error");
        assert_eq!(err.kind, quarry::ErrorKind::Name);
    }

    #[test]
    fn register_keys_function_opts_in() {
        let mut env = Environment::new();
        env.register_keys_function();
        let data = json!([{"a": 1, "b": 2}, {"c": 3}]);
        let values = env
            .findall("$[?keys(@) == ['a', 'b']]", &data)
            .expect("compile");
        assert_eq!(values, vec![json!({"a": 1, "b": 2})]);
    }
}

mod custom_extensions {
    use super::*;

    struct Recorder(Arc<AtomicUsize>);

    impl FilterFunction for Recorder {
        fn arg_types(&self) -> &[ExpressionType] {
            &[ExpressionType::Nodes]
        }

        fn return_type(&self) -> ExpressionType {
            ExpressionType::Logical
        }

        fn call<'a>(&self, _args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
            self.0.fetch_add(1, Ordering::SeqCst);
            ExpressionValue::Logical(true)
        }
    }

    #[test]
    fn custom_functions_are_callable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut env = Environment::new();
        env.register_function("rec", Arc::new(Recorder(Arc::clone(&calls))));

        let data = json!([{"a": 1}, {"a": 2}]);
        let values = env.findall("$[?rec(@)]", &data).expect("compile");
        assert_eq!(values.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn logical_or_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut env = Environment::new();
        env.register_function("rec", Arc::new(Recorder(Arc::clone(&calls))));

        let data = json!([{"a": 1}, {"b": 2}]);
        // The recorder only runs for the element where `@.a` is absent.
        let values = env.findall("$[?@.a || rec(@)]", &data).expect("compile");
        assert_eq!(values.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_functions_become_name_errors() {
        let mut env = Environment::new();
        env.remove_function("length");
        let err = env.compile("$[?length(@) > 0]").expect_err("name error");
        assert_eq!(err.kind, quarry::ErrorKind::Name);
    }
}
