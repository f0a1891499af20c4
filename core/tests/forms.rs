use flatland_core::{ErrorCategory, FlatlandError, Schema, Value};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn signup() -> Schema {
    Schema::dict([
        Schema::string().named("name"),
        Schema::integer().named("age"),
        Schema::boolean().named("subscribe"),
        Schema::array(Schema::string().named("tag")).named("tags"),
        Schema::list(Schema::dict([
            Schema::string().named("title"),
            Schema::integer().named("qty"),
        ]))
        .named("items"),
    ])
    .named("form")
}

#[test]
fn test_flatten_round_trip() {
    let schema = signup();
    let el = schema
        .create_with(Value::map([
            ("name", Value::from("Ada")),
            ("age", Value::from(36)),
            ("subscribe", Value::from(true)),
            ("tags", Value::list(["math", "engines"])),
            (
                "items",
                Value::list([
                    Value::map([("title", Value::from("gear")), ("qty", Value::from(2))]),
                    Value::map([("title", Value::from("cam")), ("qty", Value::from(5))]),
                ]),
            ),
        ]))
        .unwrap();

    let flat = el.flatten();
    assert_eq!(
        flat,
        pairs(&[
            ("form_name", "Ada"),
            ("form_age", "36"),
            ("form_subscribe", "1"),
            ("form_tags_tag", "math"),
            ("form_tags_tag", "engines"),
            ("form_items_0_title", "gear"),
            ("form_items_0_qty", "2"),
            ("form_items_1_title", "cam"),
            ("form_items_1_qty", "5"),
        ])
    );

    let back = schema.from_flat(flat.clone()).unwrap();
    assert_eq!(back.flatten(), flat);
    assert_eq!(back.value(), el.value());
}

#[test]
fn test_round_trip_keeps_rejected_text() {
    let schema = signup();
    let el = schema
        .from_flat([("form_age", "thirty"), ("form_name", "Bo")])
        .unwrap();
    assert_eq!(el.get("age").unwrap().value(), Value::None);
    assert_eq!(el.get("age").unwrap().u(), "thirty");

    let again = schema.from_flat(el.flatten()).unwrap();
    assert_eq!(again.get("age").unwrap().u(), "thirty");
}

#[test]
fn test_set_default_is_idempotent() {
    let schema = Schema::dict([
        Schema::string().named("fname").with_default("FN"),
        Schema::integer().named("count").with_default(3),
        Schema::array(Schema::string().named("s")).named("a"),
    ]);
    let mut el = schema.from_defaults().unwrap();
    let first = el.value();
    el.set_default().unwrap();
    assert_eq!(el.value(), first);
    assert_eq!(el.get("count").unwrap().u(), "3");
}

#[test]
fn test_duplicate_key_first_wins() {
    let schema = Schema::dict([Schema::integer().named("x")]).named("s");
    let el = schema.from_flat([("s_x", "1"), ("s_x", "2")]).unwrap();
    assert_eq!(el.get("x").unwrap().value(), Value::Int(1));
}

#[test]
fn test_sequence_reconstruction_and_pruning() {
    let input = [("a_s", "x"), ("a_s", ""), ("a_s", "y")];

    let pruned = Schema::array(Schema::string().named("s")).named("a");
    let el = pruned.from_flat(input).unwrap();
    assert_eq!(el.value(), Value::list(["x", "y"]));

    let kept = pruned.prune_empty(false);
    let el = kept.from_flat(input).unwrap();
    assert_eq!(el.value(), Value::list(["x", "", "y"]));
}

#[test]
fn test_list_rehydrates_in_index_order() {
    let schema = Schema::list(Schema::string().named("s")).named("l");
    let el = schema
        .from_flat([("l_2_s", "c"), ("l_0_s", "a"), ("l_x_s", "bogus")])
        .unwrap();
    assert_eq!(el.value(), Value::list(["a", "c"]));
    assert_eq!(el.el("1").unwrap().flat_name(), "l_1_s");
}

#[test]
fn test_strict_dict_set() {
    let schema = Schema::dict([Schema::integer().named("x"), Schema::integer().named("y")])
        .policy("strict");
    let mut el = schema.create();

    let err = el.set(Value::map([("x", 1)])).unwrap_err();
    assert_eq!(err, FlatlandError::MissingFields(vec!["y".to_string()]));

    let err = el.set(Value::map([("x", 1), ("y", 2), ("z", 3)])).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Domain);

    assert!(el.set(Value::map([("x", 1), ("y", 2)])).unwrap());
    assert_eq!(el.value(), Value::map([("x", 1), ("y", 2)]));
}

#[test]
fn test_sparse_required_minimum() {
    let schema = Schema::sparse_dict([
        Schema::integer().named("x"),
        Schema::integer().named("y").optional(true),
    ])
    .minimum_fields("required");

    let mut el = schema.create();
    assert!(!el.is_empty());
    assert_eq!(el.root().keys(), vec!["x"]);
    assert_eq!(
        el.root_mut().remove_key("x"),
        Err(FlatlandError::ImmutableKey("x".to_string()))
    );
    assert!(!el.validate());

    el.set(Value::map([("x", 1), ("y", 2)])).unwrap();
    el.root_mut().remove_key("y").unwrap();
    assert_eq!(el.value(), Value::map([("x", 1)]));
    assert!(el.validate());

    // A required key whose text fails to coerce holds no value.
    let mut el = schema.from_flat([("x", "abc")]).unwrap();
    assert_eq!(el.get("x").unwrap().value(), Value::None);
    assert_eq!(el.get("x").unwrap().u(), "abc");
    assert!(!el.validate());
    assert_eq!(
        el.all_errors(),
        vec![("x".to_string(), "x is not a valid integer".to_string())]
    );

    let mut el = schema.create_with(Value::map([("x", "abc")])).unwrap();
    assert!(!el.validate());
    assert_eq!(el.get("x").unwrap().is_valid(), Some(false));
}

#[test]
fn test_multi_value_projects_first_child() {
    let schema = Schema::multi_value(Schema::string().named("s")).named("m");
    let el = schema.from_flat([("m_s", "a"), ("m_s", "b")]).unwrap();
    assert_eq!(el.len(), 2);
    assert_eq!(el.value(), Value::from("a"));
    assert_eq!(el.u(), "a");
    assert_eq!(el.flatten(), pairs(&[("m_s", "a"), ("m_s", "b")]));
}

#[test]
fn test_anonymous_form_keys_are_unprefixed() {
    let form = Schema::dict([Schema::string().named("fname"), Schema::string().named("surname")]);
    let el = form
        .from_flat([("fname", "Ada"), ("surname", "Lovelace")])
        .unwrap();
    assert_eq!(el.flatten(), pairs(&[("fname", "Ada"), ("surname", "Lovelace")]));

    let namespaced = form.named("ns");
    let el = namespaced.from_flat([("fname", "Ada"), ("ns_fname", "Bo")]).unwrap();
    assert_eq!(el.get("fname").unwrap().u(), "Bo");
}

#[test]
fn test_nested_array_member_is_structural_error() {
    let schema = Schema::array(Schema::dict([Schema::string().named("x")])).named("a");
    let err = schema.from_flat([("a_x", "1")]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structure);
}

#[test]
fn test_json_interop() {
    let el = signup()
        .create_with(Value::from(serde_json::json!({
            "name": "Ada",
            "age": 36,
            "tags": ["x"],
        })))
        .unwrap();
    let json = el.value().to_json();
    assert_eq!(json["age"], serde_json::json!(36));
    assert_eq!(json["tags"], serde_json::json!(["x"]));
}
