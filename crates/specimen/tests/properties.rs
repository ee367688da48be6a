//! Property-based tests for generation invariants
//!
//! For arbitrary seeds and size hints these check that:
//! 1. The same context and seed always produce the same value
//! 2. The produced value is an instance of the root class
//! 3. Size hints are honoured exactly when the key domain is large enough

use proptest::prelude::*;
use specimen::registry::{collection, map};
use specimen::schema::{ClassId, Introspector};
use specimen::{create, create_list, Binding, ClassDecl, ModelContext, Schema, Value};
use std::sync::Arc;

fn schema() -> Arc<dyn Introspector> {
    let schema = Schema::builder()
        .class(ClassDecl::record("Item").type_params(["T"]).field("value", "T"))
        .class(
            ClassDecl::record("Order")
                .field("id", "UUID")
                .field("lines", "List<Item<Double>>")
                .field("tags", "SortedSet<String>")
                .field("totals", "Map<String, Item<Long>>")
                .field("placed", "LocalDateTime"),
        )
        .class(ClassDecl::record("Node").field("next", "Node").field("label", "String"))
        .build()
        .unwrap();
    Arc::new(schema)
}

fn is_instance(schema: &dyn Introspector, value: &Value, root: &str) -> bool {
    value
        .runtime_class()
        .is_some_and(|class| schema.is_assignable(&class, &ClassId::new(root)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: identical context and seed give structurally equal values
    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let ctx = ModelContext::builder_for(schema(), "Order").unwrap().seed(seed).build().unwrap();
        let first = create(&ctx).unwrap();
        prop_assert_eq!(&first, &create(&ctx).unwrap());
        prop_assert!(is_instance(ctx.schema(), &first, "Order"));
    }

    /// Property: a self-referencing record always terminates
    #[test]
    fn prop_self_reference_terminates(seed in any::<u64>()) {
        let ctx = ModelContext::builder_for(schema(), "Node").unwrap().seed(seed).build().unwrap();
        let node = create(&ctx).unwrap();
        let next = node.field("next").unwrap();
        prop_assert!(!next.is_null());
        prop_assert_eq!(next.field("next"), Some(&Value::Null));
    }

    /// Property: size hints are exact for large key domains
    #[test]
    fn prop_size_hints_are_exact(seed in any::<u64>(), lines in 0usize..12, totals in 0usize..12) {
        let ctx = ModelContext::builder_for(schema(), "Order")
            .unwrap()
            .seed(seed)
            .generate(Binding::field("lines"), collection().size(lines))
            .generate(Binding::field("totals"), map().size(totals))
            .build()
            .unwrap();
        let order = create(&ctx).unwrap();
        prop_assert_eq!(order.field("lines").and_then(Value::len), Some(lines));
        prop_assert_eq!(order.field("totals").and_then(Value::len), Some(totals));
    }

    /// Property: list generation is reproducible and sized
    #[test]
    fn prop_create_list_is_reproducible(seed in any::<u64>(), count in 0usize..5) {
        let ctx = ModelContext::builder_for(schema(), "Order").unwrap().seed(seed).build().unwrap();
        let values = create_list(&ctx, count).unwrap();
        prop_assert_eq!(values.len(), count);
        prop_assert_eq!(values, create_list(&ctx, count).unwrap());
    }
}
