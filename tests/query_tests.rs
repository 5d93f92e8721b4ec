// Query serialization and functional update tests

use odata_expr::ast::*;

fn member(name: &str, ty: ExpressionType) -> MemberAccessExpression {
    MemberAccessExpression::root(Member::declared(name, ty))
}

fn age_over(n: i32) -> ODataExpression {
    ODataExpression::binary(
        member("Age", ExpressionType::Int32).into(),
        BinaryOp::GreaterThan,
        ODataExpression::constant(n, ExpressionType::Int32).unwrap(),
    )
    .unwrap()
}

fn name_key(direction: SortDirection) -> SortKeyExpression {
    SortKeyExpression::new(member("Name", ExpressionType::String).into(), direction)
}

#[test]
fn test_empty_query() {
    let query = QueryExpression::default();
    assert_eq!(query.to_string(), "?");
    assert!(query.to_params().is_empty());
    assert_eq!(query.ty(), ExpressionType::Complex);
}

#[test]
fn test_top_and_skip() {
    let query = QueryExpression::default().update().top(10).skip(5).apply().unwrap();
    assert_eq!(query.to_string(), "?$top=10&$skip=5");
}

#[test]
fn test_zero_skip_and_no_inline_count_are_omitted() {
    let query = QueryExpression::default()
        .update()
        .skip(0)
        .inline_count(InlineCount::None)
        .top(3)
        .apply()
        .unwrap();
    assert_eq!(query.to_string(), "?$top=3");
}

#[test]
fn test_parameter_order_is_fixed() {
    let age = SortKeyExpression::new(member("Age", ExpressionType::Int32).into(), SortDirection::Descending);
    let orders = SelectColumnExpression::new(Some(member("Orders", ExpressionType::Complex)), true).unwrap();

    // set in reverse wire order
    let query = QueryExpression::default()
        .update()
        .select([SelectColumnExpression::column(member("Name", ExpressionType::String)), orders])
        .inline_count(InlineCount::AllPages)
        .format("json")
        .skip(20)
        .top(10)
        .order_by([name_key(SortDirection::Ascending), age])
        .filter(age_over(18))
        .apply()
        .unwrap();

    let names: Vec<_> = query.to_params().into_iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        ["$filter", "$orderby", "$top", "$skip", "$format", "$inlinecount", "$select"]
    );
    assert_eq!(
        query.to_string(),
        "?$filter=Age+gt+18&$orderby=Name%2cAge+desc&$top=10&$skip=20\
         &$format=json&$inlinecount=allpages&$select=Name%2cOrders%2f*"
    );
}

#[test]
fn test_params_are_unencoded() {
    let query = QueryExpression::default()
        .update()
        .order_by([name_key(SortDirection::Descending)])
        .apply()
        .unwrap();
    assert_eq!(query.to_params(), vec![("$orderby", "Name desc".to_string())]);
}

#[test]
fn test_string_constants_are_percent_encoded() {
    let filter = ODataExpression::binary(
        member("Name", ExpressionType::String).into(),
        BinaryOp::Equal,
        ODataExpression::constant("O'Brien", ExpressionType::String).unwrap(),
    )
    .unwrap();
    let query = QueryExpression::default().update().filter(filter).apply().unwrap();
    assert_eq!(query.to_string(), "?$filter=Name+eq+%27O%27%27Brien%27");
}

#[test]
fn test_spaces_become_plus_and_escapes_are_lowercase() {
    let filter = ODataExpression::binary(
        member("Name", ExpressionType::String).into(),
        BinaryOp::Equal,
        ODataExpression::constant("a b,\u{fc}+c", ExpressionType::String).unwrap(),
    )
    .unwrap();
    let query = QueryExpression::default().update().filter(filter).apply().unwrap();
    assert_eq!(
        query.to_string(),
        "?$filter=Name+eq+%27a+b%2c%c3%bc%2bc%27"
    );
}

#[test]
fn test_update_keeps_omitted_fields() {
    let original = QueryExpression::default()
        .update()
        .filter(age_over(18))
        .top(10)
        .format("json")
        .apply()
        .unwrap();

    let updated = original.update().skip(30).apply().unwrap();
    assert_eq!(updated.filter(), original.filter());
    assert_eq!(updated.top(), Some(10));
    assert_eq!(updated.format(), Some("json"));
    assert_eq!(updated.skip(), 30);

    // the source query is untouched
    assert_eq!(original.skip(), 0);
}

#[test]
fn test_clearing_top_differs_from_omitting_it() {
    let limited = QueryExpression::default().update().top(10).apply().unwrap();

    let kept = limited.update().skip(1).apply().unwrap();
    assert_eq!(kept.top(), Some(10));

    let cleared = limited.update().clear_top().apply().unwrap();
    assert_eq!(cleared.top(), None);
    assert_eq!(cleared.to_string(), "?");
}

#[test]
fn test_clear_filter_and_format() {
    let query = QueryExpression::default()
        .update()
        .filter(age_over(1))
        .format("atom")
        .apply()
        .unwrap();
    let cleared = query.update().clear_filter().clear_format().apply().unwrap();
    assert!(cleared.filter().is_none());
    assert!(cleared.format().is_none());
}

#[test]
fn test_non_boolean_filter_is_rejected() {
    let err = QueryExpression::default()
        .update()
        .filter(member("Age", ExpressionType::Int32).into())
        .apply()
        .unwrap_err();
    assert_eq!(err, ExpressionError::NonBooleanFilter(ExpressionType::Int32));
}

#[test]
fn test_query_as_expression_node() {
    let query = QueryExpression::default().update().top(1).apply().unwrap();
    let node = ODataExpression::from(query);
    assert_eq!(node.kind(), ExpressionKind::Query);
    assert_eq!(node.ty(), ExpressionType::Complex);
    assert_eq!(node.to_string(), "?$top=1");
}
