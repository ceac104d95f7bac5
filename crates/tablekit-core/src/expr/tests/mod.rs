mod property;

use super::*;
use crate::{
    crypto::EncryptedEnvelope,
    error::{Error, ErrorKind},
    model::{AttributeSpec, ModelDescriptor, ModelSchema, NamingConvention},
    test_fixtures::{order_schema, vault_schema},
    value::{Value, WireKind, WireValue},
};

fn cart_schema() -> ModelSchema {
    ModelSchema::register(
        ModelDescriptor::new("Cart")
            .attribute(AttributeSpec::string("ID").partition_key())
            .attribute(AttributeSpec::list("items")),
    )
    .unwrap()
}

fn compile_err(schema: &ModelSchema, request: &ExpressionRequest) -> Error {
    compile(schema, request).unwrap_err()
}

fn sealed() -> WireValue {
    EncryptedEnvelope {
        version: 1,
        wrapped_key: vec![1; 40],
        nonce: vec![2; 12],
        ciphertext: vec![3; 20],
    }
    .to_wire()
}

///
/// PATHS
///

#[test]
fn path_accepts_name_and_single_subscript() {
    for (text, attribute, index) in [
        ("a", "a", None),
        ("Items[0]", "Items", Some(0)),
        ("snake_case-name[123]", "snake_case-name", Some(123)),
        ("x[007]", "x", Some(7)),
    ] {
        let path = DocumentPath::parse(text).unwrap();
        assert_eq!(path.attribute(), attribute, "{text}");
        assert_eq!(path.index(), index, "{text}");
    }
}

#[test]
fn path_rejects_everything_else() {
    for text in [
        "",
        "[1]",
        "a[",
        "a[]",
        "a[-1]",
        "a[1][2]",
        "a[1]x",
        "a[1 ]",
        "a[ 1]",
        "a[1x]",
        "a b",
        "a.b",
        "a;b",
        "a)",
        "a OR b",
        "a = :v0",
        "#n0",
        "a[99999999999]",
    ] {
        let err = DocumentPath::parse(text).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperator, "{text:?}");
    }
}

#[test]
fn path_overlap() {
    let p = |s: &str| DocumentPath::parse(s).unwrap();

    assert!(p("a").overlaps(&p("a[1]")));
    assert!(p("a[1]").overlaps(&p("a[1]")));
    assert!(!p("a[1]").overlaps(&p("a[2]")));
    assert!(!p("a").overlaps(&p("b")));
    assert_eq!(p("a[3]").to_string(), "a[3]");
}

///
/// CONDITIONS
///

#[test]
fn list_subscript_update_uses_name_placeholder() {
    let request = ExpressionRequest::new().update(UpdateOperation::set("items[2]", "x"));
    let out = compile(&cart_schema(), &request).unwrap();

    assert_eq!(out.update.as_deref(), Some("SET #n0[2] = :v0"));
    assert_eq!(out.names.get("#n0").map(String::as_str), Some("items"));
    assert_eq!(out.values.get(":v0"), Some(&WireValue::string("x")));
    assert!(
        out.names
            .keys()
            .chain(out.names.values())
            .all(|s| !s.contains('[') && !s.contains(']'))
    );
}

#[test]
fn encrypted_attribute_is_not_queryable() {
    let schema = order_schema();

    for request in [
        ExpressionRequest::new().filter(Condition::eq("Secret", "x")),
        ExpressionRequest::new().condition(Condition::exists("Secret")),
        ExpressionRequest::new()
            .filter(Condition::eq("Status", "open"))
            .filter(Filter::from(Condition::eq("Secret", "x")).not()),
    ] {
        let err = compile_err(&schema, &request);
        assert_eq!(err.kind, ErrorKind::EncryptedFieldNotQueryable);
    }
}

#[test]
fn renders_key_filter_and_projection_with_shared_names() {
    let request = ExpressionRequest::new()
        .key(Condition::eq("ID", "o-1"))
        .key(Condition::begins_with("CreatedAt", "2024"))
        .filter(
            Filter::from(Condition::gt("Total", 10))
                .and(Condition::ne("Status", "void"))
                .or(Condition::exists("Paid")),
        )
        .project("ID")
        .project("Total")
        .project("ID");

    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(
        out.key_condition.as_deref(),
        Some("#n0 = :v0 AND begins_with(#n1, :v1)")
    );
    assert_eq!(
        out.filter.as_deref(),
        Some("(#n2 > :v2 AND #n3 <> :v3) OR attribute_exists(#n4)")
    );
    assert_eq!(out.projection.as_deref(), Some("#n0, #n2"));
    assert_eq!(out.names.len(), 5);
    assert_eq!(out.names["#n4"], "Paid");
    assert_eq!(out.values[":v1"], WireValue::string("2024"));
    assert_eq!(out.values[":v2"], WireValue::number(10));
    assert!(out.condition.is_none() && out.update.is_none());
}

#[test]
fn repeated_attribute_shares_name_but_not_values() {
    let request = ExpressionRequest::new().filter(Filter::all([
        Condition::gt("Total", 1),
        Condition::lt("Total", 9),
    ]));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.filter.as_deref(), Some("#n0 > :v0 AND #n0 < :v1"));
    assert_eq!(out.names.len(), 1);
    assert_eq!(out.values.len(), 2);
}

#[test]
fn operator_vocabulary() {
    let schema = order_schema();
    let render = |c: Condition| {
        compile(&schema, &ExpressionRequest::new().filter(c))
            .unwrap()
            .filter
            .unwrap()
    };

    assert_eq!(render(Condition::le("Total", 1)), "#n0 <= :v0");
    assert_eq!(render(Condition::ge("Total", 1)), "#n0 >= :v0");
    assert_eq!(
        render(Condition::between("Total", 1, 5)),
        "#n0 BETWEEN :v0 AND :v1"
    );
    assert_eq!(
        render(Condition::in_("Status", vec!["a".into(), "b".into()])),
        "#n0 IN (:v0, :v1)"
    );
    assert_eq!(render(Condition::contains("Tags", "vip")), "contains(#n0, :v0)");
    assert_eq!(
        render(Condition::not_exists("Extra")),
        "attribute_not_exists(#n0)"
    );
    assert_eq!(
        render(Condition::attribute_type("Extra", WireKind::Document)),
        "attribute_type(#n0, :v0)"
    );
    assert_eq!(
        render(Condition::parse("Status", "<>", [Value::from("x")]).unwrap()),
        "#n0 <> :v0"
    );
}

#[test]
fn not_wraps_its_operand() {
    let request = ExpressionRequest::new().condition(
        Filter::any([Condition::eq("Status", "a"), Condition::eq("Status", "b")]).not(),
    );
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(
        out.condition.as_deref(),
        Some("NOT (#n0 = :v0 OR #n0 = :v1)")
    );
}

#[test]
fn contains_on_set_encodes_member() {
    let request = ExpressionRequest::new().filter(Condition::contains("Tags", "vip"));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.values[":v0"], WireValue::string("vip"));
}

#[test]
fn attribute_type_operand_is_descriptor() {
    let request =
        ExpressionRequest::new().filter(Condition::attribute_type("Extra", WireKind::Document));
    let out = compile(&order_schema(), &request).unwrap();
    assert_eq!(out.values[":v0"], WireValue::string("M"));

    let bad = Condition::parse("Extra", "attribute_type", [Value::from("Q")]).unwrap();
    let err = compile_err(&order_schema(), &ExpressionRequest::new().filter(bad));
    assert_eq!(err.kind, ErrorKind::InvalidOperator);
}

#[test]
fn stored_names_appear_in_name_table() {
    let schema = ModelSchema::register(
        ModelDescriptor::new("Account")
            .naming(NamingConvention::SnakeCase)
            .attribute(AttributeSpec::string("AccountId").partition_key())
            .attribute(AttributeSpec::number("Balance")),
    )
    .unwrap();

    let request = ExpressionRequest::new()
        .key(Condition::eq("AccountId", "a"))
        .filter(Condition::gt("balance", 0))
        .project("account_id");
    let out = compile(&schema, &request).unwrap();

    assert_eq!(out.names["#n0"], "account_id");
    assert_eq!(out.names["#n1"], "balance");
    assert_eq!(out.projection.as_deref(), Some("#n0"));
}

#[test]
fn condition_rejections() {
    let schema = order_schema();
    let filter = |c: Condition| compile_err(&schema, &ExpressionRequest::new().filter(c)).kind;
    let key = |c: Condition| compile_err(&schema, &ExpressionRequest::new().key(c)).kind;

    assert_eq!(filter(Condition::eq("Nope", 1)), ErrorKind::UnknownAttribute);
    assert_eq!(filter(Condition::eq("Total[0]", 1)), ErrorKind::InvalidOperator);
    assert_eq!(filter(Condition::eq("Total", "abc")), ErrorKind::InvalidModel);
    assert_eq!(
        filter(Condition::begins_with("Total", "1")),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        filter(Condition::in_("Status", Vec::new())),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        filter(Condition::in_(
            "Status",
            (0..=crate::MAX_IN_OPERANDS).map(|i| Value::from(i.to_string())).collect()
        )),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        key(Condition::contains("CreatedAt", "x")),
        ErrorKind::InvalidOperator
    );
    assert_eq!(key(Condition::eq("Items[0]", "x")), ErrorKind::InvalidOperator);

    let err = Condition::parse("Total", "LIKE", [Value::from(1)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperator);

    let err = compile_err(&schema, &ExpressionRequest::new().filter(Filter::And(Vec::new())));
    assert_eq!(err.kind, ErrorKind::InvalidOperator);
}

#[test]
fn in_accepts_the_operand_limit() {
    let values = (0..crate::MAX_IN_OPERANDS)
        .map(|i| Value::from(i.to_string()))
        .collect();
    let request = ExpressionRequest::new().filter(Condition::in_("Status", values));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.values.len(), crate::MAX_IN_OPERANDS);
}

///
/// UPDATES
///

#[test]
fn updates_render_in_fixed_section_order() {
    let request = ExpressionRequest::new()
        .update(UpdateOperation::add("Total", 1))
        .update(UpdateOperation::remove("Extra"))
        .update(UpdateOperation::set_delete(
            "Tags",
            Value::TextSet(vec!["old".into()]),
        ))
        .update(UpdateOperation::append("Items", vec![Value::from("y")]))
        .update(UpdateOperation::set("Status", "shipped"))
        .update(UpdateOperation::set_if_absent("Paid", false));

    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(
        out.update.as_deref(),
        Some(
            "SET #n0 = :v0, #n1 = if_not_exists(#n1, :v1), #n2 = list_append(#n2, :v2) \
             REMOVE #n3 ADD #n4 :v3 DELETE #n5 :v4"
        )
    );
    assert_eq!(out.names["#n3"], "Extra");
    assert_eq!(
        out.values[":v2"],
        WireValue::List(vec![WireValue::string("y")])
    );
    assert_eq!(
        out.values[":v4"],
        WireValue::StringSet(vec!["old".into()])
    );
}

#[test]
fn prepend_puts_operand_first() {
    let request =
        ExpressionRequest::new().update(UpdateOperation::prepend("Items", vec![Value::from(1)]));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.update.as_deref(), Some("SET #n0 = list_append(:v0, #n0)"));
}

#[test]
fn update_and_condition_share_placeholders() {
    let request = ExpressionRequest::new()
        .condition(Condition::eq("Revision", 3))
        .update(UpdateOperation::set("Revision", 4));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.condition.as_deref(), Some("#n0 = :v0"));
    assert_eq!(out.update.as_deref(), Some("SET #n0 = :v1"));
}

#[test]
fn update_rejections() {
    let schema = order_schema();
    let err = |ops: Vec<UpdateOperation>| {
        let request = ops
            .into_iter()
            .fold(ExpressionRequest::new(), ExpressionRequest::update);
        compile_err(&schema, &request).kind
    };

    assert_eq!(
        err(vec![UpdateOperation::set("ID", "x")]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![
            UpdateOperation::set("Status", "a"),
            UpdateOperation::remove("Status"),
        ]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![
            UpdateOperation::set("Items", vec![Value::from(1)]),
            UpdateOperation::set("Items[0]", 2),
        ]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![UpdateOperation::add("Status", 1)]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![UpdateOperation::set_add(
            "Tags",
            Value::TextSet(Vec::new())
        )]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![UpdateOperation::new("Status", UpdateKind::Set, None)]),
        ErrorKind::InvalidOperator
    );
    assert_eq!(
        err(vec![UpdateOperation::set("Nope", 1)]),
        ErrorKind::UnknownAttribute
    );
}

#[test]
fn distinct_list_elements_do_not_overlap() {
    let request = ExpressionRequest::new()
        .update(UpdateOperation::set("Items[1]", "a"))
        .update(UpdateOperation::set("Items[2]", "b"));
    let out = compile(&order_schema(), &request).unwrap();

    assert_eq!(out.update.as_deref(), Some("SET #n0[1] = :v0, #n0[2] = :v1"));
}

#[test]
fn encrypted_updates_require_sealed_assignment() {
    let schema = vault_schema();
    let kind = |op: UpdateOperation| {
        compile(&schema, &ExpressionRequest::new().update(op))
            .map(|_| ())
            .map_err(|e| e.kind)
    };

    assert_eq!(kind(UpdateOperation::set_sealed("Secret", sealed())), Ok(()));
    assert_eq!(kind(UpdateOperation::remove("Secret")), Ok(()));
    assert_eq!(
        kind(UpdateOperation::set("Secret", "plain")),
        Err(ErrorKind::InvalidModel)
    );
    assert_eq!(
        kind(UpdateOperation::set_sealed("Score", sealed())),
        Err(ErrorKind::InvalidModel)
    );
    assert_eq!(
        kind(UpdateOperation::set_sealed("Secret", WireValue::string("x"))),
        Err(ErrorKind::InvalidEncryptedEnvelope)
    );
    assert_eq!(
        kind(UpdateOperation::set_add(
            "Codes",
            Value::TextSet(vec!["a".into()])
        )),
        Err(ErrorKind::InvalidOperator)
    );
}

///
/// DETERMINISM
///

#[test]
fn compilation_is_idempotent() {
    let schema = order_schema();
    let request = ExpressionRequest::new()
        .key(Condition::eq("ID", "o-1"))
        .filter(Condition::in_("Status", vec!["a".into(), "b".into()]))
        .condition(Condition::exists("ID"))
        .update(UpdateOperation::add("Total", 2))
        .update(UpdateOperation::set("Status", "b"));

    let first = compile(&schema, &request).unwrap();
    let second = compile(&schema, &request).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());

    let other = compile(&schema, &request.clone().project("Total")).unwrap();
    assert_ne!(first.fingerprint(), other.fingerprint());
}

#[test]
fn empty_request_compiles_to_nothing() {
    let out = compile(&order_schema(), &ExpressionRequest::new()).unwrap();

    assert!(out.is_empty());
    assert!(out.names.is_empty() && out.values.is_empty());
}
