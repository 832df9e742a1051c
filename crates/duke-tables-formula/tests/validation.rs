//! Type checking formulas against table snapshots

use async_trait::async_trait;
use duke_tables_core::{
    Column, FormulaDataType, GenericSqlTypes, RollupFunction, TableMeta, TableStore, UiType,
};
use duke_tables_formula::{
    substitute_alias_with_id, substitute_id_with_alias, to_formula, validate_formula, FormulaError,
    FormulaErrorKind, MetaError, TableMetaSource, ValidationContext, ValidationOptions,
};
use pretty_assertions::assert_eq;

fn products() -> Vec<Column> {
    vec![
        Column::new("c_title", "Title", UiType::SingleLineText),
        Column::new("c_price", "Price", UiType::Currency),
        Column::new("c_qty", "Qty", UiType::Number),
        Column::new("c_due", "Due", UiType::Date),
        Column::new("c_done", "Done", UiType::Checkbox),
        Column::new("c_id", "Id", UiType::Id).with_db_type("bigint"),
    ]
}

async fn type_of(formula: &str, columns: &[Column]) -> Result<FormulaDataType, FormulaError> {
    let store = TableStore::new();
    let ctx = ValidationContext::new(columns, &store);
    let tree = validate_formula(formula, &ctx).await?;
    Ok(tree.data_type.unwrap_or(FormulaDataType::Unknown))
}

async fn kind_of(formula: &str, columns: &[Column]) -> FormulaErrorKind {
    match type_of(formula, columns).await {
        Ok(t) => panic!("{} validated as {}", formula, t),
        Err(e) => e.kind(),
    }
}

#[tokio::test]
async fn test_function_return_types() {
    let columns = products();
    assert_eq!(type_of("ADD(5, 5)", &columns).await.unwrap(), FormulaDataType::Numeric);
    assert_eq!(
        type_of("CONCAT(\"AA\", \"BB\")", &columns).await.unwrap(),
        FormulaDataType::String
    );
    assert_eq!(
        type_of("IF(5 > 1, \"YES\", \"NO\")", &columns).await.unwrap(),
        FormulaDataType::String
    );
    assert_eq!(
        type_of("SWITCH({Qty}, 1, \"One\", 2, \"Two\", \"N/A\")", &columns)
            .await
            .unwrap(),
        FormulaDataType::String
    );
    assert_eq!(
        type_of("AND({Qty} > 1, {Done})", &columns).await.unwrap(),
        FormulaDataType::ConditionalExpression
    );
    assert_eq!(
        type_of("DATEADD({Due}, 1, 'day')", &columns).await.unwrap(),
        FormulaDataType::Date
    );
    assert_eq!(
        type_of("WEEKDAY(NOW(), 'monday')", &columns).await.unwrap(),
        FormulaDataType::Numeric
    );
}

#[tokio::test]
async fn test_branch_unification() {
    let columns = products();
    // IF: numeric branches stay numeric, a blank branch is ignored
    assert_eq!(
        type_of("IF({Done}, {Price}, BLANK())", &columns).await.unwrap(),
        FormulaDataType::Numeric
    );
    // IF: mixed branches become a string
    assert_eq!(
        type_of("IF({Done}, {Price}, {Due})", &columns).await.unwrap(),
        FormulaDataType::String
    );
    // SWITCH: patterns are not branches
    assert_eq!(
        type_of("SWITCH({Title}, 'a', 1, 'b', 2)", &columns).await.unwrap(),
        FormulaDataType::Numeric
    );
    // Ternary: date on both sides
    assert_eq!(
        type_of("{Done} ? {Due} : NOW()", &columns).await.unwrap(),
        FormulaDataType::Date
    );
}

#[tokio::test]
async fn test_plus_concatenates_strings() {
    let columns = products();
    assert_eq!(type_of("1 + \"2\"", &columns).await.unwrap(), FormulaDataType::String);
    assert_eq!(type_of("1 + 2", &columns).await.unwrap(), FormulaDataType::Numeric);
    assert_eq!(type_of("{Title} + {Qty}", &columns).await.unwrap(), FormulaDataType::String);
    assert_eq!(type_of("{Done} + {Qty}", &columns).await.unwrap(), FormulaDataType::Numeric);
}

#[tokio::test]
async fn test_invalid_column() {
    let err = type_of("{doesNotExist}", &products()).await.unwrap_err();
    assert!(matches!(&err, FormulaError::InvalidColumn(name) if name == "doesNotExist"));
    assert_eq!(
        err.to_string(),
        "Invalid column name/id \"doesNotExist\" in formula"
    );
}

#[tokio::test]
async fn test_invalid_calls() {
    let columns = products();
    assert_eq!(kind_of("FOO(1)", &columns).await, FormulaErrorKind::InvalidFunctionName);

    let err = type_of("LEFT(\"AB\")", &columns).await.unwrap_err();
    assert_eq!(err.kind(), FormulaErrorKind::InvalidArgCount);
    assert!(matches!(
        &err,
        FormulaError::RequiredArgs { function, required: 2, actual: 1 } if function == "LEFT"
    ));

    assert_eq!(kind_of("UPPER({Qty})", &columns).await, FormulaErrorKind::TypeMismatch);
    assert_eq!(kind_of("LEFT({Title}, 'x')", &columns).await, FormulaErrorKind::TypeMismatch);
    assert_eq!(
        kind_of("REGEX_MATCH({Title}, {Qty})", &columns).await,
        FormulaErrorKind::TypeMismatch
    );
    assert!(type_of("REGEX_MATCH({Title}, '^(?=A)[A-Z]+$')", &columns).await.is_ok());
    assert_eq!(
        kind_of("DATETIME_DIFF({Due}, NOW(), 'fortnights')", &columns).await,
        FormulaErrorKind::InvalidArgValue
    );
    assert_eq!(kind_of("1 +", &columns).await, FormulaErrorKind::ParseError);
}

#[tokio::test]
async fn test_type_mismatch_names_the_column() {
    let err = type_of("ABS({Title})", &products()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "ABS: field Title with string type is found but numeric type is expected"
    );
}

#[tokio::test]
async fn test_sql_typed_columns() {
    let columns = products();
    let store = TableStore::new();

    let ctx = ValidationContext::new(&columns, &store);
    let tree = validate_formula("{Id}", &ctx).await.unwrap();
    assert_eq!(tree.data_type, Some(FormulaDataType::Unknown));

    let ctx = ValidationContext::new(&columns, &store).with_sql_types(&GenericSqlTypes);
    let tree = validate_formula("{Id}", &ctx).await.unwrap();
    assert_eq!(tree.data_type, Some(FormulaDataType::Numeric));
}

#[tokio::test]
async fn test_nested_formula_columns() {
    let mut columns = products();
    columns.push(Column::formula("f_total", "Total", "{Price} * {Qty}"));
    columns.push(Column::formula("f_double", "Double", "{{Total}} * 2"));
    columns.push(Column::formula("f_label", "Label", "CONCAT({{Title}}, ' each')"));

    assert_eq!(type_of("{Total}", &columns).await.unwrap(), FormulaDataType::Numeric);
    assert_eq!(type_of("{Double} + 1", &columns).await.unwrap(), FormulaDataType::Numeric);
    // A nested formula that fails to type check fails the reference
    columns.push(Column::formula("f_bad", "Bad", "CONCAT({Total})"));
    assert_eq!(kind_of("{Bad}", &columns).await, FormulaErrorKind::TypeMismatch);
    // A string formula column cannot feed a numeric function
    assert_eq!(kind_of("ROUND({Label}, 2)", &columns).await, FormulaErrorKind::TypeMismatch);
}

#[tokio::test]
async fn test_circular_reference() {
    let a = Column::formula("f_a", "A", "{B}");
    let b = Column::formula("f_b", "B", "{A}");
    let columns = vec![a.clone(), b.clone()];
    let store = TableStore::new();

    for (target, formula) in [(&a, "{B}"), (&b, "{A}")] {
        let ctx = ValidationContext::new(&columns, &store).with_target_column(target);
        let err = validate_formula(formula, &ctx).await.unwrap_err();
        assert_eq!(err.kind(), FormulaErrorKind::CircularReference);
    }

    // Without the graph check the visiting stack still catches the loop
    let ctx = ValidationContext::new(&columns, &store)
        .with_target_column(&a)
        .with_options(ValidationOptions {
            check_circular_references: false,
            ..Default::default()
        });
    let err = validate_formula("{B}", &ctx).await.unwrap_err();
    assert!(matches!(err, FormulaError::CircularReference(id) if id == "f_a"));
}

#[tokio::test]
async fn test_reference_to_plain_column_is_not_circular() {
    let a = Column::formula("f_a", "A", "{B}");
    let b = Column::new("c_b", "B", UiType::Number);
    let columns = vec![a.clone(), b];
    let store = TableStore::new();

    let ctx = ValidationContext::new(&columns, &store).with_target_column(&a);
    let tree = validate_formula("{B} * 2", &ctx).await.unwrap();
    assert_eq!(tree.data_type, Some(FormulaDataType::Numeric));
    assert_eq!(to_formula(&tree), "({c_b} * 2)");
}

fn orders_and_customers() -> (Vec<Column>, TableStore) {
    let customers = TableMeta::new("t_customers", "Customers")
        .with_column(Column::new("cu_name", "Name", UiType::SingleLineText))
        .with_column(Column::new("cu_since", "Since", UiType::Date))
        .with_column(Column::formula("cu_tag", "Tag", "UPPER({Name})"));

    let orders = vec![
        Column::new("o_amount", "Amount", UiType::Currency),
        Column::link("o_customer", "Customer", "t_customers"),
        Column::rollup(
            "o_count",
            "Customer Count",
            "o_customer",
            "cu_name",
            RollupFunction::Count,
        ),
        Column::rollup(
            "o_first",
            "First Since",
            "o_customer",
            "cu_since",
            RollupFunction::Min,
        ),
        Column::lookup("o_name", "Customer Name", "o_customer", "cu_name"),
        Column::lookup("o_tag", "Customer Tag", "o_customer", "cu_tag"),
    ];

    (orders, vec![customers].into_iter().collect())
}

#[tokio::test]
async fn test_rollup_and_lookup_columns() {
    let (columns, store) = orders_and_customers();
    let ctx = ValidationContext::new(&columns, &store);

    let cases = [
        ("{Customer Count}", FormulaDataType::Numeric),
        ("{First Since}", FormulaDataType::Date),
        ("{Customer Name}", FormulaDataType::String),
        ("{Customer Tag}", FormulaDataType::String),
        ("{Customer}", FormulaDataType::Unknown),
    ];
    for (formula, expected) in cases {
        let tree = validate_formula(formula, &ctx).await.unwrap();
        assert_eq!(tree.data_type, Some(expected), "{}", formula);
    }
}

struct Offline;

#[async_trait]
impl TableMetaSource for Offline {
    async fn table_meta(&self, _table_id: &str) -> Result<TableMeta, MetaError> {
        Err("connection refused".into())
    }
}

#[tokio::test]
async fn test_metadata_unavailable() {
    let (columns, _) = orders_and_customers();
    let ctx = ValidationContext::new(&columns, &Offline);

    // Numeric rollups never need the related table
    assert!(validate_formula("{Customer Count}", &ctx).await.is_ok());

    let err = validate_formula("{Customer Name}", &ctx).await.unwrap_err();
    assert_eq!(err.kind(), FormulaErrorKind::NotAvailable);
    assert!(matches!(&err, FormulaError::NotAvailable { table_id, .. } if table_id == "t_customers"));
}

#[tokio::test]
async fn test_alias_id_round_trip() {
    let columns = products();
    let formula = "IF({Qty} > 10, CONCAT({Title}, \" (bulk)\"), {Title})";

    let stored = substitute_alias_with_id(formula, &columns).unwrap();
    assert_eq!(
        stored,
        "IF(({c_qty} > 10), CONCAT({c_title}, \" (bulk)\"), {c_title})"
    );

    let shown = substitute_id_with_alias(&stored, &columns, None).unwrap();
    assert_eq!(shown, "IF(({Qty} > 10), CONCAT({Title}, \" (bulk)\"), {Title})");
    assert_eq!(substitute_alias_with_id(&shown, &columns).unwrap(), stored);
}

#[tokio::test]
async fn test_concurrent_validation() {
    let columns = products();
    let store = TableStore::new();
    let ctx = ValidationContext::new(&columns, &store);

    let formulas = ["ADD({Qty}, 1)", "UPPER({Title})", "FOO()"];
    let results =
        futures::future::join_all(formulas.iter().map(|f| validate_formula(f, &ctx))).await;

    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert_eq!(
        results[2].as_ref().unwrap_err().kind(),
        FormulaErrorKind::InvalidFunctionName
    );
}
