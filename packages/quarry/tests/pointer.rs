//! JSON Pointer (RFC 6901) and Relative JSON Pointer tests.

use serde_json::{json, Value};

use quarry::{JsonPointer, PointerError, RelativePointerError, RelativeJsonPointer};

fn rfc_document() -> Value {
    json!({
        "foo": ["bar", "baz"],
        "": 0,
        "a/b": 1,
        "c%d": 2,
        "e^f": 3,
        "g|h": 4,
        "i\\j": 5,
        "k\"l": 6,
        " ": 7,
        "m~n": 8
    })
}

mod resolution {
    use super::*;

    #[test]
    fn rfc_6901_examples() {
        let data = rfc_document();
        let cases: Vec<(&str, Value)> = vec![
            ("", data.clone()),
            ("/foo", json!(["bar", "baz"])),
            ("/foo/0", json!("bar")),
            ("/", json!(0)),
            ("/a~1b", json!(1)),
            ("/c%d", json!(2)),
            ("/e^f", json!(3)),
            ("/g|h", json!(4)),
            ("/i\\j", json!(5)),
            ("/k\"l", json!(6)),
            ("/ ", json!(7)),
            ("/m~0n", json!(8)),
        ];
        for (pointer, expected) in cases {
            let resolved = quarry::resolve(pointer, &data).expect("resolve");
            assert_eq!(resolved.as_ref(), &expected, "pointer {pointer:?}");
        }
    }

    #[test]
    fn uri_decoded_pointers() {
        let data = rfc_document();
        let pointer = JsonPointer::parse_opts("/c%25d", true, true).expect("parse");
        assert_eq!(pointer.resolve(&data).expect("resolve").as_ref(), &json!(2));
    }

    #[test]
    fn missing_keys_are_key_errors() {
        let data = json!({"a": 1});
        assert!(matches!(
            quarry::resolve("/b", &data),
            Err(PointerError::Key(_))
        ));
    }

    #[test]
    fn out_of_range_indices_are_index_errors() {
        let data = json!([1, 2]);
        assert!(matches!(
            quarry::resolve("/2", &data),
            Err(PointerError::Index(_))
        ));
        // `-` is only valid when appending with JSON Patch.
        assert!(matches!(
            quarry::resolve("/-", &data),
            Err(PointerError::Index(_))
        ));
    }

    #[test]
    fn resolving_through_scalars_is_a_type_error() {
        let data = json!({"a": 1});
        assert!(matches!(
            quarry::resolve("/a/b", &data),
            Err(PointerError::Type(_))
        ));
    }

    #[test]
    fn leading_zero_indices_stay_names() {
        let data = json!([1, 2]);
        assert!(matches!(
            quarry::resolve("/01", &data),
            Err(PointerError::Type(_))
        ));
    }

    #[test]
    fn index_markers_require_a_non_zero_leading_digit() {
        let data = json!({"foo": ["bar", "baz"]});
        let resolved = quarry::resolve("/foo/#1", &data).expect("resolve");
        assert_eq!(resolved.as_ref(), &json!(1));
        for pointer in ["/foo/#0", "/foo/#01"] {
            assert!(
                matches!(quarry::resolve(pointer, &data), Err(PointerError::Type(_))),
                "pointer {pointer:?} should not resolve"
            );
        }
    }

    #[test]
    fn non_pointer_strings_are_parse_errors() {
        assert!(matches!(
            JsonPointer::parse("foo/bar"),
            Err(PointerError::Parse(_))
        ));
    }
}

mod manipulation {
    use super::*;

    #[test]
    fn serialization_round_trips() {
        for text in ["", "/foo", "/foo/0", "/a~1b/m~0n", "/"] {
            let pointer = JsonPointer::parse(text).expect("parse");
            assert_eq!(pointer.to_string(), text);
            assert_eq!(JsonPointer::parse(&pointer.to_string()).expect("reparse"), pointer);
        }
    }

    #[test]
    fn exists_is_true_for_falsy_values() {
        let data = json!({"a": 0, "b": false, "c": null});
        for pointer in ["/a", "/b", "/c"] {
            assert!(JsonPointer::parse(pointer).expect("parse").exists(&data));
        }
        assert!(!JsonPointer::parse("/d").expect("parse").exists(&data));
    }

    #[test]
    fn parent_of_root_is_root() {
        let root = JsonPointer::parse("").expect("parse");
        assert_eq!(root.parent(), root);
    }

    #[test]
    fn join_resets_on_leading_slash() {
        let pointer = JsonPointer::parse("/a/b").expect("parse");
        let joined = pointer.join(&["c", "/x", "y"]).expect("join");
        assert_eq!(joined.to_string(), "/x/y");
    }

    #[test]
    fn appended_suffix_resolves_like_traversal() {
        let data = json!({"a": {"b": {"c": 42}}});
        let base = JsonPointer::parse("/a").expect("parse");
        let appended = (&base / "b/c").expect("append");
        let direct = base.resolve(&data).expect("resolve");
        let via_suffix = quarry::resolve("/b/c", direct.as_ref()).expect("resolve suffix");
        assert_eq!(
            appended.resolve(&data).expect("resolve").as_ref(),
            via_suffix.as_ref()
        );
    }

    #[test]
    fn is_relative_to_is_a_strict_prefix_test() {
        let parent = JsonPointer::parse("/a").expect("parse");
        let child = JsonPointer::parse("/a/b").expect("parse");
        let sibling = JsonPointer::parse("/ab").expect("parse");
        assert!(child.is_relative_to(&parent));
        assert!(!parent.is_relative_to(&child));
        assert!(!sibling.is_relative_to(&parent));
        assert!(!parent.is_relative_to(&parent));
    }

    #[test]
    fn match_pointers_resolve_to_match_values() {
        let data = json!({"users": [{"name": "Sue"}, {"name": "Jane"}]});
        for m in quarry::find("$.users[*].name", &data).expect("find").iter() {
            let resolved = m.pointer().resolve(&data).expect("resolve");
            assert_eq!(resolved.as_ref(), m.value());
        }
    }
}

mod relative_pointers {
    use super::*;

    fn base_document() -> Value {
        json!({
            "foo": ["bar", "baz"],
            "highly": {"nested": {"objects": true}}
        })
    }

    #[test]
    fn ietf_draft_examples() {
        let data = base_document();
        let base = JsonPointer::parse("/foo/1").expect("parse");
        let cases: Vec<(&str, Value)> = vec![
            ("0", json!("baz")),
            ("1/0", json!("bar")),
            ("2/highly/nested/objects", json!(true)),
            ("0#", json!(1)),
            ("1#", json!("foo")),
        ];
        for (rel, expected) in cases {
            let relative = RelativeJsonPointer::parse(rel).expect("parse relative");
            let pointer = base.to(&relative).expect("apply");
            let resolved = pointer.resolve(&data).expect("resolve");
            assert_eq!(resolved.as_ref(), &expected, "relative {rel:?}");
        }
    }

    #[test]
    fn index_offsets_move_within_an_array() {
        let data = base_document();
        let base = JsonPointer::parse("/foo/1").expect("parse");
        let back = RelativeJsonPointer::parse("0-1").expect("parse");
        let resolved = base.to(&back).expect("apply").resolve(&data).expect("resolve");
        assert_eq!(resolved.as_ref(), &json!("bar"));
    }

    #[test]
    fn origin_past_the_root_is_an_error() {
        let base = JsonPointer::parse("/foo").expect("parse");
        let relative = RelativeJsonPointer::parse("2/bar").expect("parse");
        assert!(matches!(
            relative.to(&base),
            Err(RelativePointerError::Index(_))
        ));
    }

    #[test]
    fn syntax_errors() {
        for text in ["", "abc", "1+0/x", "-1/x", "01/x"] {
            assert!(
                matches!(
                    RelativeJsonPointer::parse(text),
                    Err(RelativePointerError::Syntax(_))
                ),
                "expected syntax error for {text:?}"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["0", "1/0", "2/highly/nested", "0#", "0-1", "3+2/foo"] {
            let relative = RelativeJsonPointer::parse(text).expect("parse");
            assert_eq!(relative.to_string(), text);
        }
    }
}
