use super::*;
use crate::test_fixtures::order_schema;
use proptest::prelude::*;

fn list_schema(name: &str) -> ModelSchema {
    ModelSchema::register(
        ModelDescriptor::new("Listing")
            .attribute(AttributeSpec::string("ID").partition_key())
            .attribute(AttributeSpec::list(name)),
    )
    .unwrap()
}

fn garbage_suffix() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\[-[0-9]{1,4}\\]",
        "\\[[0-9]{1,3}\\]\\[[0-9]{1,3}\\]",
        "\\[[0-9]{1,3}\\][ ;,=()#:]{1,3}",
        "[ ;,=()#:.]{1,3}[a-z0-9]{0,4}",
        "\\[[0-9]{0,2}[a-z ;,]{1,3}[0-9]{0,2}\\]",
        Just(" OR attribute_exists(ID)".to_string()),
    ]
}

proptest! {
    #[test]
    fn list_subscripts_compile_to_one_name(
        name in "L[a-zA-Z0-9_]{0,12}",
        index in 0u32..100_000,
    ) {
        let schema = list_schema(&name);
        let request = ExpressionRequest::new()
            .update(UpdateOperation::set(format!("{name}[{index}]"), "x"))
            .filter(Condition::eq(format!("{name}[{index}]"), "x"));
        let out = compile(&schema, &request).unwrap();

        let expected = format!("#n0[{index}]");
        prop_assert_eq!(out.names.len(), 1);
        prop_assert_eq!(out.names.get("#n0"), Some(&name));
        prop_assert_eq!(out.update, Some(format!("SET {expected} = :v1")));
        prop_assert_eq!(out.filter, Some(format!("{expected} = :v0")));
        prop_assert!(out.names.keys().all(|k| !k.contains('[')));
    }

    #[test]
    fn malformed_paths_are_rejected(suffix in garbage_suffix()) {
        let path = format!("Items{suffix}");
        let schema = order_schema();

        for request in [
            ExpressionRequest::new().update(UpdateOperation::set(path.clone(), "x")),
            ExpressionRequest::new().filter(Condition::eq(path.clone(), "x")),
            ExpressionRequest::new().project(path.clone()),
        ] {
            let err = compile(&schema, &request).unwrap_err();
            prop_assert_eq!(err.kind, ErrorKind::InvalidOperator, "{}", path);
        }
    }

    #[test]
    fn compile_is_deterministic(
        total in any::<i64>(),
        statuses in proptest::collection::vec("[a-z]{1,8}", 1..8),
        delta in any::<i32>(),
    ) {
        let schema = order_schema();
        let request = ExpressionRequest::new()
            .key(Condition::eq("ID", "o"))
            .filter(Filter::from(Condition::ge("Total", total)).or(Condition::in_(
                "Status",
                statuses.iter().map(|s| Value::from(s.as_str())).collect(),
            )))
            .update(UpdateOperation::add("Total", delta))
            .update(UpdateOperation::set("Status", statuses[0].as_str()));

        let first = compile(&schema, &request).unwrap();
        let second = compile(&schema, &request).unwrap();

        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        prop_assert_eq!(first, second);
    }
}
