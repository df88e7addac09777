//! JSON Patch (RFC 6902) tests.

use serde_json::json;

use quarry::{JsonPatch, PatchError};

mod operations {
    use super::*;

    #[test]
    fn add_a_member() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "add", "path": "/baz", "value": "qux"}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&json!({"foo": "bar"})).expect("apply"),
            json!({"foo": "bar", "baz": "qux"})
        );
    }

    #[test]
    fn add_an_array_element() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "add", "path": "/foo/1", "value": "qux"}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&json!({"foo": ["bar", "baz"]})).expect("apply"),
            json!({"foo": ["bar", "qux", "baz"]})
        );
    }

    #[test]
    fn add_replaces_the_root() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "add", "path": "", "value": {"new": "doc"}}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&json!({"old": 1})).expect("apply"),
            json!({"new": "doc"})
        );
    }

    #[test]
    fn remove_a_member_and_an_element() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "remove", "path": "/baz"},
            {"op": "remove", "path": "/foo/0"}
        ]))
        .expect("build");
        assert_eq!(
            patch
                .apply(&json!({"baz": "qux", "foo": ["bar", "keep"]}))
                .expect("apply"),
            json!({"foo": ["keep"]})
        );
    }

    #[test]
    fn replace_a_value() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "replace", "path": "/baz", "value": "boo"}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&json!({"baz": "qux", "foo": "bar"})).expect("apply"),
            json!({"baz": "boo", "foo": "bar"})
        );
    }

    #[test]
    fn move_a_value() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "move", "from": "/foo/waldo", "path": "/qux/thud"}
        ]))
        .expect("build");
        assert_eq!(
            patch
                .apply(&json!({"foo": {"bar": "baz", "waldo": "fred"}, "qux": {"corge": "grault"}}))
                .expect("apply"),
            json!({"foo": {"bar": "baz"}, "qux": {"corge": "grault", "thud": "fred"}})
        );
    }

    #[test]
    fn move_an_array_element() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "move", "from": "/foo/1", "path": "/foo/3"}
        ]))
        .expect("build");
        assert_eq!(
            patch
                .apply(&json!({"foo": ["all", "grass", "cows", "eat"]}))
                .expect("apply"),
            json!({"foo": ["all", "cows", "eat", "grass"]})
        );
    }

    #[test]
    fn copy_a_value() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "copy", "from": "/a", "path": "/b"}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&json!({"a": [1, 2]})).expect("apply"),
            json!({"a": [1, 2], "b": [1, 2]})
        );
    }

    #[test]
    fn test_op_checks_structural_equality() {
        let data = json!({"baz": "qux", "foo": ["a", 2, "c"]});
        let ok = JsonPatch::from_value(&json!([
            {"op": "test", "path": "/baz", "value": "qux"},
            {"op": "test", "path": "/foo/1", "value": 2}
        ]))
        .expect("build");
        assert!(ok.apply(&data).is_ok());

        let bad = JsonPatch::from_value(&json!([
            {"op": "test", "path": "/baz", "value": "bar"}
        ]))
        .expect("build");
        assert!(matches!(bad.apply(&data), Err(PatchError::TestFailure(_))));
    }

    #[test]
    fn unknown_operations_are_rejected() {
        assert!(matches!(
            JsonPatch::from_value(&json!([{"op": "frobnicate", "path": "/a"}])),
            Err(PatchError::Op(_))
        ));
    }

    #[test]
    fn add_to_a_missing_target_fails() {
        let patch = JsonPatch::from_value(&json!([
            {"op": "add", "path": "/missing/child", "value": 1}
        ]))
        .expect("build");
        assert!(patch.apply(&json!({"a": 1})).is_err());
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn build_up_nested_structure() {
        let data = json!({"some": {"other": "thing"}});
        let patch = JsonPatch::from_value(&json!([
            {"op": "add", "path": "/some/foo", "value": {"bar": []}},
            {"op": "copy", "from": "/some/other", "path": "/some/foo/else"},
            {"op": "add", "path": "/some/foo/bar/-", "value": 1}
        ]))
        .expect("build");
        assert_eq!(
            patch.apply(&data).expect("apply"),
            json!({"some": {"other": "thing", "foo": {"bar": [1], "else": "thing"}}})
        );
    }

    #[test]
    fn builder_methods_mirror_the_document_form() {
        let patch = JsonPatch::new()
            .add("/some/foo", json!({"bar": []}))
            .and_then(|p| p.copy_from("/some/other", "/some/foo/else"))
            .and_then(|p| p.add("/some/foo/bar/-", json!(1)))
            .expect("build");
        let data = json!({"some": {"other": "thing"}});
        assert_eq!(
            patch.apply(&data).expect("apply"),
            json!({"some": {"other": "thing", "foo": {"bar": [1], "else": "thing"}}})
        );
    }

    #[test]
    fn apply_in_place_mutates_the_document() {
        let mut data = json!({"a": 1});
        JsonPatch::new()
            .replace("/a", json!(2))
            .expect("build")
            .apply_in_place(&mut data)
            .expect("apply");
        assert_eq!(data, json!({"a": 2}));
    }
}
