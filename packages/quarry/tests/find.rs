//! End-to-end query tests: selectors, segments, ordering and
//! normalized locations.

use serde_json::{json, Value};

fn findall(path: &str, data: &Value) -> Vec<Value> {
    quarry::findall(path, data).expect("query should compile")
}

fn paths(path: &str, data: &Value) -> Vec<String> {
    quarry::find(path, data)
        .expect("query should compile")
        .iter()
        .map(|m| m.path())
        .collect()
}

mod root_and_scalars {
    use super::*;

    #[test]
    fn root_selects_the_whole_document() {
        for data in [
            json!({"a": 1}),
            json!([1, 2]),
            json!("hello"),
            json!(42),
            json!(true),
            json!(null),
        ] {
            assert_eq!(findall("$", &data), vec![data.clone()]);
        }
    }

    #[test]
    fn descendants_of_a_scalar_yield_nothing() {
        assert_eq!(findall("$..*", &json!(42)), Vec::<Value>::new());
    }

    #[test]
    fn null_values_are_selectable() {
        let data = json!({"a": null});
        assert_eq!(findall("$.a", &data), vec![json!(null)]);
    }
}

mod name_and_index {
    use super::*;

    #[test]
    fn shorthand_and_bracketed_names() {
        let data = json!({"store": {"book": "b"}});
        assert_eq!(findall("$.store.book", &data), vec![json!("b")]);
        assert_eq!(findall("$['store']['book']", &data), vec![json!("b")]);
        assert_eq!(findall(r#"$["store"]["book"]"#, &data), vec![json!("b")]);
    }

    #[test]
    fn missing_members_yield_no_matches() {
        let data = json!({"a": 1});
        assert_eq!(findall("$.b", &data), Vec::<Value>::new());
        assert_eq!(findall("$.a.b.c", &data), Vec::<Value>::new());
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let data = json!([10, 20, 30]);
        assert_eq!(findall("$[-1]", &data), vec![json!(30)]);
        assert_eq!(findall("$[-3]", &data), vec![json!(10)]);
    }

    #[test]
    fn out_of_range_indices_yield_no_matches() {
        let data = json!([10, 20, 30]);
        assert_eq!(findall("$[3]", &data), Vec::<Value>::new());
        assert_eq!(findall("$[-4]", &data), Vec::<Value>::new());
    }

    #[test]
    fn index_locations_are_normalized() {
        let data = json!([10, 20, 30]);
        assert_eq!(paths("$[-1]", &data), vec!["$[2]"]);
    }
}

mod slices_and_wildcards {
    use super::*;

    #[test]
    fn slice_selects_a_range() {
        let data = json!([0, 1, 2, 3, 4]);
        assert_eq!(findall("$[1:4]", &data), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(findall("$[:2]", &data), vec![json!(0), json!(1)]);
        assert_eq!(findall("$[::2]", &data), vec![json!(0), json!(2), json!(4)]);
        assert_eq!(
            findall("$[::-1]", &data),
            vec![json!(4), json!(3), json!(2), json!(1), json!(0)]
        );
    }

    #[test]
    fn slices_on_mappings_yield_nothing() {
        assert_eq!(findall("$[0:2]", &json!({"a": 1})), Vec::<Value>::new());
    }

    #[test]
    fn wildcard_preserves_member_order() {
        let data = json!({"b": 1, "a": 2, "c": 3});
        assert_eq!(findall("$.*", &data), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn wildcard_on_empty_containers() {
        assert_eq!(findall("$.*", &json!({})), Vec::<Value>::new());
        assert_eq!(findall("$[*]", &json!([])), Vec::<Value>::new());
    }

    #[test]
    fn multiple_selectors_concatenate_in_order() {
        let data = json!({"a": 1, "b": 2});
        assert_eq!(findall("$['b', 'a', 'b']", &data), vec![json!(2), json!(1), json!(2)]);
    }
}

mod descendants {
    use super::*;

    #[test]
    fn descendant_is_depth_first_self_before_children() {
        let data = json!({"a": {"x": 1, "b": {"x": 2}}, "x": 0});
        assert_eq!(
            findall("$..x", &data),
            vec![json!(0), json!(1), json!(2)]
        );
    }

    #[test]
    fn descendant_on_empty_containers_visits_only_self() {
        assert_eq!(findall("$..*", &json!({})), Vec::<Value>::new());
        assert_eq!(findall("$..x", &json!({"x": 1})), vec![json!(1)]);
    }

    #[test]
    fn bare_descendant_is_every_value() {
        let data = json!({"a": [1]});
        assert_eq!(findall("$..", &data), findall("$..*", &data));
    }
}

mod keys_selectors {
    use super::*;

    #[test]
    fn keys_selector_yields_key_strings() {
        let data = json!({"a": 1, "b": 2});
        assert_eq!(findall("$[~]", &data), vec![json!("a"), json!("b")]);
        assert_eq!(paths("$[~]", &data), vec!["$[~'a']", "$[~'b']"]);
    }

    #[test]
    fn keys_selector_on_sequences_yields_nothing() {
        assert_eq!(findall("$[~]", &json!([1, 2])), Vec::<Value>::new());
    }

    #[test]
    fn key_selector_selects_one_key() {
        let data = json!({"a": 1, "b": 2});
        assert_eq!(findall("$[~'b']", &data), vec![json!("b")]);
        assert_eq!(findall("$.~b", &data), vec![json!("b")]);
        assert_eq!(findall("$[~'missing']", &data), Vec::<Value>::new());
    }

    #[test]
    fn keys_filter_selects_matching_keys() {
        let data = json!({"a": [1, 2], "b": [], "c": [3]});
        assert_eq!(
            findall("$[~?length(@) > 0]", &data),
            vec![json!("a"), json!("c")]
        );
    }
}

mod embedded_singular_queries {
    use super::*;

    #[test]
    fn integer_result_acts_as_an_index_selector() {
        let data = json!({
            "a": {"j": [1, 2, 3], "p": {"q": [4, 5, 6]}},
            "b": ["j", "p", "q"],
            "c d": {"x": {"y": 1}}
        });
        let matches = quarry::find("$.a.j[$['c d'].x.y]", &data).expect("compile");
        assert_eq!(matches.values(), vec![json!(2)]);
        assert_eq!(matches.nodes()[0].path(), "$['a']['j'][1]");
    }

    #[test]
    fn string_result_acts_as_a_name_selector() {
        let data = json!({
            "a": {"j": [1, 2, 3], "p": {"q": [4, 5, 6]}},
            "b": ["j", "p", "q"]
        });
        assert_eq!(findall("$.a[$.b[1]].q[-1]", &data), vec![json!(6)]);
    }

    #[test]
    fn unresolvable_embedded_query_selects_nothing() {
        let data = json!({"a": [1, 2]});
        assert_eq!(findall("$.a[$.missing]", &data), Vec::<Value>::new());
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn filter_scores_below_cap() {
        let data = json!({"users": [
            {"name": "Sue", "score": 100},
            {"name": "John", "score": 86},
            {"name": "Sally", "score": 84},
            {"name": "Jane", "score": 55}
        ]});
        assert_eq!(
            findall("$.users[?@.score < 100].name", &data),
            vec![json!("John"), json!("Sally"), json!("Jane")]
        );
    }

    #[test]
    fn wildcard_names_with_locations() {
        let data = json!({"users": [
            {"name": "Sue", "score": 100},
            {"name": "John", "score": 86},
            {"name": "Sally", "score": 84},
            {"name": "Jane", "score": 55}
        ]});
        assert_eq!(
            findall("$.users.*.name", &data),
            vec![json!("Sue"), json!("John"), json!("Sally"), json!("Jane")]
        );
        assert_eq!(
            paths("$.users.*.name", &data),
            vec![
                "$['users'][0]['name']",
                "$['users'][1]['name']",
                "$['users'][2]['name']",
                "$['users'][3]['name']",
            ]
        );
    }

    #[test]
    fn descendant_filter_against_the_root() {
        let data = json!({
            "price_cap": 10,
            "products": [
                {"n": "apple", "price": 5},
                {"n": "orange", "price": 12},
                {"n": "banana", "price": 8}
            ]
        });
        assert_eq!(
            findall("$..products[?(@.price < $.price_cap)]", &data),
            vec![
                json!({"n": "apple", "price": 5}),
                json!({"n": "banana", "price": 8})
            ]
        );
    }

    #[test]
    fn current_key_with_length_guard() {
        let data = json!({"abc": [1, 2, 3], "def": [4, 5], "abx": [6], "aby": []});
        let matches =
            quarry::find("$[?match(#, '^ab.*') && length(@) > 0 ]", &data).expect("compile");
        assert_eq!(matches.values(), vec![json!([1, 2, 3]), json!([6])]);
        let locations: Vec<String> = matches.iter().map(|m| m.path()).collect();
        assert_eq!(locations, vec!["$['abc']", "$['abx']"]);
    }
}

mod invariants {
    use super::*;

    #[test]
    fn findall_agrees_with_finditer() {
        let data = json!({"a": {"b": [1, 2, {"c": 3}]}});
        let compiled = quarry::compile("$..*").expect("compile");
        let values: Vec<Value> = compiled.find(&data, None).values();
        assert_eq!(compiled.findall(&data), values);
    }

    #[test]
    fn concrete_locations_resolve_to_their_values() {
        let data = json!({"a": {"b": [1, 2, {"c": [true, null]}]}});
        for m in quarry::find("$..*", &data).expect("compile").iter() {
            let pointer = m.pointer();
            let resolved = pointer.resolve(&data).expect("pointer resolves");
            assert_eq!(resolved.as_ref(), m.value(), "location {}", m.path());
        }
    }

    #[test]
    fn locations_round_trip_through_parse() {
        let data = json!({"a": {"b": [1, 2]}, "c": 3});
        for m in quarry::find("$..*", &data).expect("compile").iter() {
            let parsed = quarry::Location::parse(&m.path()).expect("parse location");
            assert_eq!(&parsed, m.location());
        }
    }

    #[test]
    fn canonical_text_compiles_to_the_same_query() {
        let data = json!({
            "users": [{"name": "Sue", "score": 100}, {"name": "Jane", "score": 55}]
        });
        for text in [
            "$.users[?@.score < 100].name",
            "$['users'][0, 1]['name']",
            "$..users[1:]",
        ] {
            let first = quarry::compile(text).expect("compile");
            let second = quarry::compile(&first.to_string()).expect("recompile");
            assert_eq!(first.findall(&data), second.findall(&data), "query {text}");
        }
    }

    #[test]
    fn parents_link_back_to_the_root() {
        let data = json!({"a": {"b": 1}});
        let matches = quarry::find("$.a.b", &data).expect("compile");
        let m = &matches.nodes()[0];
        let parent = m.parent().expect("has parent");
        assert_eq!(parent.path(), "$['a']");
        let grandparent = parent.parent().expect("has grandparent");
        assert_eq!(grandparent.path(), "$");
        assert!(grandparent.parent().is_none());
    }
}

mod pseudo_root {
    use super::*;

    #[test]
    fn pseudo_root_wraps_the_document() {
        let data = json!({"a": 1});
        assert_eq!(findall("^[0].a", &data), vec![json!(1)]);
        assert_eq!(findall("^[0]", &data), vec![data.clone()]);
        assert_eq!(findall("^[1]", &data), Vec::<Value>::new());
    }

    #[test]
    fn root_inside_pseudo_root_filter_is_the_wrapper() {
        let data = json!([1, 2, 3]);
        // `$` resolves through the same wrapper, so `$[0]` is the
        // document itself.
        assert_eq!(
            findall("^[?count($[0][*]) == 3][0]", &data),
            vec![json!(1)]
        );
    }
}
