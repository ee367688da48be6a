//! End-to-end generation tests over a small domain model

use specimen::error::Warning;
use specimen::registry::{collection, map, strings};
use specimen::schema::{ClassId, Introspector};
use specimen::{create, create_with_report, Binding, ClassDecl, GenerationError, ModelContext, Schema, Settings, TypeDesc, Value};
use std::sync::{Arc, Mutex};

fn schema() -> Arc<dyn Introspector> {
    let schema = Schema::builder()
        .class(ClassDecl::record("Point").field("x", "int").field("y", "int"))
        .class(ClassDecl::record("Item").type_params(["T"]).field("value", "T"))
        .class(
            ClassDecl::record("Lists")
                .field("list1", "List<Item<String>>")
                .field("list2", "List<Item<String>>"),
        )
        .class(
            ClassDecl::record("Maps")
                .field("map1", "Map<Integer, Item<String>>")
                .field("map2", "Map<Integer, Item<String>>"),
        )
        .class(ClassDecl::record("Owner").field("map1", "Map<Integer, Item<String>>"))
        .class(ClassDecl::record("Parent").field("child", "Child").field("name", "String"))
        .class(ClassDecl::record("Child").field("parent", "Parent"))
        .class(
            ClassDecl::record("Pair")
                .type_params(["L", "R"])
                .field("left", "L")
                .field("right", "R"),
        )
        .class(
            ClassDecl::record("PairContainer")
                .type_params(["X", "Y"])
                .field("pairValue", "Pair<X, Y>"),
        )
        .class(ClassDecl::abstract_class("Pet").field("name", "String"))
        .class(ClassDecl::record("Dog").extends("Pet").field("goodBoy", "boolean"))
        .class(ClassDecl::record("Home").field("pet", "Pet").field("pets", "List<Pet>"))
        .class(ClassDecl::record("Base").type_params(["T"]).field("value", "T"))
        .class(ClassDecl::record("Derived").extends("Base<String>").field("count", "int"))
        .class(ClassDecl::record("Chain").type_params(["T"]).field("next", "Chain<List<T>>"))
        .class(ClassDecl::record("Lookup").field("byFlag", "Map<Boolean, String>"))
        .class(
            ClassDecl::record("Wild")
                .field("any", "List<?>")
                .field("ints", "List<? extends Integer>"),
        )
        .class(ClassDecl::record("Holder").type_params(["T"]).field("xs", "List<? extends T>"))
        .build()
        .unwrap();
    Arc::new(schema)
}

fn builder(root: &str) -> specimen::ModelContextBuilder {
    ModelContext::builder_for(schema(), root).unwrap().seed(42)
}

fn is_string(value: &Value) -> bool {
    matches!(value, Value::Str(_))
}

#[test]
fn test_scalar_record_is_deterministic() {
    let ctx = builder("Point").build().unwrap();
    let first = create(&ctx).unwrap();
    let second = create(&ctx).unwrap();

    assert_eq!(first, second);
    let x = first.field("x").and_then(Value::as_int).unwrap();
    let y = first.field("y").and_then(Value::as_int).unwrap();
    assert!((1..=10_000).contains(&x));
    assert!((1..=10_000).contains(&y));
}

#[test]
fn test_different_seeds_differ() {
    let a = create(&builder("Point").seed(1).build().unwrap()).unwrap();
    let b = create(&builder("Point").seed(2).build().unwrap()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_collection_size_override_applies_to_one_field() {
    let ctx = builder("Lists")
        .generate(Binding::field("list1"), collection().size(7))
        .build()
        .unwrap();
    let lists = create(&ctx).unwrap();

    let list1 = lists.field("list1").and_then(Value::items).unwrap();
    let list2 = lists.field("list2").and_then(Value::items).unwrap();
    assert_eq!(list1.len(), 7);
    assert!((2..=6).contains(&list2.len()));
    for item in list1.iter().chain(list2) {
        assert!(item.field("value").is_some_and(is_string));
    }
}

#[test]
fn test_map_size_override_by_class() {
    let ctx = builder("Maps")
        .generate(Binding::class("Map"), map().size(5))
        .build()
        .unwrap();
    let maps = create(&ctx).unwrap();

    for name in ["map1", "map2"] {
        let entries = maps.field(name).and_then(Value::entries).unwrap();
        assert_eq!(entries.len(), 5, "{name}");
        for (key, value) in entries {
            assert!(matches!(key, Value::Int(_)));
            assert!(value.field("value").is_some_and(is_string));
        }
    }
}

#[test]
fn test_bidirectional_cycle_terminates_with_null_back_reference() {
    let parent = create(&builder("Parent").build().unwrap()).unwrap();

    let child = parent.field("child").unwrap();
    assert!(!child.is_null());
    let back = child.field("parent").unwrap();
    assert!(!back.is_null());
    assert_eq!(back.field("child"), Some(&Value::Null));
    assert!(back.field("name").is_some_and(is_string));
}

#[test]
fn test_type_mismatch_names_field_and_path() {
    let ctx = builder("Owner")
        .set(Binding::field("map1"), "invalid arg")
        .build()
        .unwrap();
    let err = create(&ctx).unwrap_err();

    let GenerationError::ProducerRejection { mismatch, path } = &err else {
        panic!("expected a producer rejection, got {err:?}");
    };
    assert_eq!(mismatch.target, "Map<Integer, Item<String>> map1 (in Owner)");
    assert_eq!(mismatch.provided_type, "String");
    assert_eq!(mismatch.provided_value, "\"invalid arg\"");
    assert_eq!(
        path.lines(),
        vec!["<1:Owner: Map<Integer, Item<String>> map1>", "<0:Owner>"]
    );

    let message = err.to_string();
    assert!(message.starts_with("Error assigning value to: field Owner.map1 (depth=1)"));
    assert!(message.contains("<0:Owner>   <-- Root"));
    assert!(message.contains(" -> Provided argument value ..: \"invalid arg\""));
}

#[test]
fn test_two_parameter_generic_container() {
    let container = create(&builder("PairContainer<Integer, String>").build().unwrap()).unwrap();
    let pair = container.field("pairValue").unwrap();

    assert_eq!(pair.runtime_class(), Some(ClassId::new("Pair")));
    assert!(matches!(pair.field("left"), Some(Value::Int(_))));
    assert!(pair.field("right").is_some_and(is_string));
}

#[test]
fn test_root_type_params_match_parameterized_root() {
    let parameterized = create(&builder("Item<String>").build().unwrap()).unwrap();
    let positional = create(
        &builder("Item")
            .root_type_params([TypeDesc::class("String")])
            .build()
            .unwrap(),
    )
    .unwrap();

    assert_eq!(parameterized, positional);
    assert!(positional.field("value").is_some_and(is_string));
}

#[test]
fn test_inherited_generic_field_is_resolved() {
    let derived = create(&builder("Derived").build().unwrap()).unwrap();

    assert!(derived.field("value").is_some_and(is_string));
    assert!(matches!(derived.field("count"), Some(Value::Int(_))));
}

#[test]
fn test_ignored_fields_keep_defaults() {
    let point = create(&builder("Point").ignore(Binding::field("y")).build().unwrap()).unwrap();
    assert_eq!(point.field("y"), Some(&Value::Int(0)));

    let parent = create(&builder("Parent").ignore(Binding::field("name")).build().unwrap()).unwrap();
    assert_eq!(parent.field("name"), Some(&Value::Null));
}

#[test]
fn test_ignored_class_leaves_positions_null() {
    let parent = create(&builder("Parent").ignore(Binding::class("Child")).build().unwrap()).unwrap();

    assert_eq!(parent.field("child"), Some(&Value::Null));
    assert!(parent.field("name").is_some_and(is_string));
}

fn null_ratio(base: &ModelContext, field: &str) -> f64 {
    let runs = 400;
    let nulls = (0..runs)
        .filter(|seed| {
            let ctx = base.to_builder().seed(*seed).build().unwrap();
            create(&ctx).unwrap().field(field).is_some_and(Value::is_null)
        })
        .count();
    nulls as f64 / runs as f64
}

#[test]
fn test_nullable_field_is_null_about_half_the_time() {
    let base = builder("Parent")
        .ignore(Binding::field("child"))
        .with_nullable(Binding::field("name"))
        .build()
        .unwrap();
    let ratio = null_ratio(&base, "name");
    assert!((0.4..=0.6).contains(&ratio), "null ratio {ratio}");
}

#[test]
fn test_nullable_class_is_null_about_half_the_time() {
    let base = builder("Parent")
        .ignore(Binding::field("child"))
        .with_nullable(Binding::class("String"))
        .build()
        .unwrap();
    let ratio = null_ratio(&base, "name");
    assert!((0.4..=0.6).contains(&ratio), "null ratio {ratio}");
}

#[test]
fn test_nullable_class_applies_to_mapped_positions() {
    let base = builder("Home")
        .subtype("Pet", "Dog")
        .with_nullable(Binding::class("Pet"))
        .build()
        .unwrap();
    let ratio = null_ratio(&base, "pet");
    assert!((0.4..=0.6).contains(&ratio), "null ratio {ratio}");
}

#[test]
fn test_wildcard_fields_use_their_bounds() {
    let wild = create(&builder("Wild").build().unwrap()).unwrap();

    let any = wild.field("any").and_then(Value::items).unwrap();
    assert!(!any.is_empty());
    for item in any {
        assert_eq!(item.runtime_class(), Some(ClassId::new("Object")));
    }
    let ints = wild.field("ints").and_then(Value::items).unwrap();
    assert!(!ints.is_empty());
    assert!(ints.iter().all(|v| matches!(v, Value::Int(_))));

    let holder = create(&builder("Holder<String>").build().unwrap()).unwrap();
    let xs = holder.field("xs").and_then(Value::items).unwrap();
    assert!(!xs.is_empty());
    assert!(xs.iter().all(is_string));
}

#[test]
fn test_subtype_mapping_applies_to_every_position() {
    let ctx = builder("Home").subtype("Pet", "Dog").build().unwrap();
    let home = create(&ctx).unwrap();

    let pet = home.field("pet").unwrap();
    assert_eq!(pet.runtime_class(), Some(ClassId::new("Dog")));
    assert!(pet.field("name").is_some_and(is_string));
    assert!(matches!(pet.field("goodBoy"), Some(Value::Bool(_))));
    for pet in home.field("pets").and_then(Value::items).unwrap() {
        assert_eq!(pet.runtime_class(), Some(ClassId::new("Dog")));
    }
}

#[test]
fn test_abstract_field_without_mapping_fails() {
    let err = create(&builder("Home").build().unwrap()).unwrap_err();
    assert!(matches!(err, GenerationError::UnconstructibleType { ref class, .. } if class.as_str() == "Pet"));
}

#[test]
fn test_container_subtype_changes_runtime_class() {
    let ctx = builder("Lists").subtype("List", "LinkedList").build().unwrap();
    let lists = create(&ctx).unwrap();
    assert_eq!(
        lists.field("list1").and_then(Value::runtime_class),
        Some(ClassId::new("LinkedList"))
    );
}

#[test]
fn test_context_round_trip_generates_same_value() {
    let ctx = builder("Lists")
        .generate(Binding::field("list1"), collection().size(3))
        .generate(Binding::class("String"), strings().length(4, 4))
        .build()
        .unwrap();
    let rebuilt = ctx.to_builder().build().unwrap();

    assert_eq!(ctx, rebuilt);
    let value = create(&rebuilt).unwrap();
    assert_eq!(create(&ctx).unwrap(), value);
    for item in value.field("list1").and_then(Value::items).unwrap() {
        assert_eq!(item.field("value").and_then(Value::as_str).map(str::len), Some(4));
    }
}

#[test]
fn test_growing_recursion_stops_at_max_depth() {
    fn depth(mut value: &Value) -> usize {
        let mut steps = 0;
        while let Some(next) = value.field("next") {
            steps += 1;
            value = next;
        }
        steps
    }

    let deep = create(&builder("Chain<String>").build().unwrap()).unwrap();
    assert_eq!(depth(&deep), 9);

    let shallow = builder("Chain<String>")
        .settings(Settings::default().max_depth(3))
        .build()
        .unwrap();
    assert_eq!(depth(&create(&shallow).unwrap()), 4);
}

#[test]
fn test_partial_map_warns_through_hook() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = builder("Lookup")
        .generate(Binding::field("byFlag"), map().size(5))
        .settings(Settings::default().retry_factor(3))
        .on_warning(move |warning| sink.lock().unwrap().push(warning.clone()))
        .build()
        .unwrap();

    let report = create_with_report(&ctx).unwrap();
    let entries = report.value.field("byFlag").and_then(Value::entries).unwrap();
    assert_eq!(entries.len(), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, report.warnings);
    assert!(matches!(
        seen.as_slice(),
        [Warning::PartiallyFilledContainer { requested: 5, actual: 2, .. }]
    ));
}
