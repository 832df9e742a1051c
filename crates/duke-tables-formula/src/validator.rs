//! Formula type checking
//!
//! Walks a parsed formula, resolving column references against a table's
//! columns and checking every function call against the registry. The result
//! is the same tree with each node's [`FormulaDataType`] filled in and every
//! column reference renamed to the referenced column's ID.
//!
//! The pass is async because rollup and lookup columns take their type from
//! another table, fetched through a [`TableMetaSource`].

use duke_tables_core::{
    BinaryOperator, Column, ColumnOptions, ExprKind, FormulaDataType, FormulaExpr, LiteralValue,
    SqlTypeMapper, UiType,
};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::dependency::check_circular_reference;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::logical::unify_branch_types;
use crate::functions::{registry, FunctionDef};
use crate::meta::TableMetaSource;
use crate::parser::{parse_formula, parse_stored_formula};
use crate::printer::to_formula;
use crate::resolver::{column_data_type, find_column};

/// Validation options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Check the target column's references for loops between formula
    /// columns (default: true)
    pub check_circular_references: bool,
    /// Maximum depth of nested formula, rollup and lookup resolution
    /// (default: 32)
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_circular_references: true,
            max_depth: 32,
        }
    }
}

/// Everything a validation run needs to know about the surrounding table
pub struct ValidationContext<'a> {
    columns: &'a [Column],
    meta: &'a dyn TableMetaSource,
    target_column: Option<&'a Column>,
    sql_types: Option<&'a dyn SqlTypeMapper>,
    options: ValidationOptions,
}

impl<'a> ValidationContext<'a> {
    /// Context for a formula over `columns`, fetching related tables from
    /// `meta`
    pub fn new(columns: &'a [Column], meta: &'a dyn TableMetaSource) -> Self {
        Self {
            columns,
            meta,
            target_column: None,
            sql_types: None,
            options: ValidationOptions::default(),
        }
    }

    /// The column the formula is being saved to. Enables the circular
    /// reference check.
    pub fn with_target_column(mut self, column: &'a Column) -> Self {
        self.target_column = Some(column);
        self
    }

    /// Classifier for `ID`, `ForeignKey` and `SpecificDBType` columns. Without
    /// one those columns are `unknown`.
    pub fn with_sql_types(mut self, sql_types: &'a dyn SqlTypeMapper) -> Self {
        self.sql_types = Some(sql_types);
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn columns(&self) -> &'a [Column] {
        self.columns
    }

    pub fn target_column(&self) -> Option<&'a Column> {
        self.target_column
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }
}

/// Parse and type-check a formula
///
/// # Example
/// ```rust
/// use duke_tables_core::{Column, FormulaDataType, TableStore, UiType};
/// use duke_tables_formula::{validate_formula, ValidationContext};
///
/// # futures::executor::block_on(async {
/// let columns = vec![Column::new("c1", "Price", UiType::Decimal)];
/// let store = TableStore::new();
/// let ctx = ValidationContext::new(&columns, &store);
///
/// let tree = validate_formula("ROUND({Price} * 1.2, 2)", &ctx).await.unwrap();
/// assert_eq!(tree.data_type, Some(FormulaDataType::Numeric));
/// # });
/// ```
pub async fn validate_formula(
    formula: &str,
    ctx: &ValidationContext<'_>,
) -> FormulaResult<FormulaExpr> {
    let tree = parse_formula(formula)?;
    validate_expr(tree, ctx).await
}

/// Type-check an already parsed formula
pub async fn validate_expr(
    expr: FormulaExpr,
    ctx: &ValidationContext<'_>,
) -> FormulaResult<FormulaExpr> {
    let scope = Scope::root(ctx);
    validate_node(expr, &scope).await
}

/// Columns visible at one level of nested resolution
struct Scope<'a> {
    ctx: &'a ValidationContext<'a>,
    columns: &'a [Column],
    /// Formula columns currently being resolved, outermost first
    visiting: Vec<String>,
    /// Set for the formula being saved, where the target column applies
    is_root: bool,
}

impl<'a> Scope<'a> {
    fn root(ctx: &'a ValidationContext<'a>) -> Self {
        Self {
            ctx,
            columns: ctx.columns,
            visiting: ctx.target_column.map(|c| c.id.clone()).into_iter().collect(),
            is_root: true,
        }
    }

    /// Scope for resolving `column`, whose references point into `columns`
    fn enter<'b>(&'b self, column: &Column, columns: &'b [Column]) -> FormulaResult<Scope<'b>> {
        if self.visiting.iter().any(|id| *id == column.id) {
            return Err(FormulaError::CircularReference(column.id.clone()));
        }
        if self.depth() >= self.ctx.options.max_depth {
            return Err(FormulaError::CircularReference(column.id.clone()));
        }

        let mut visiting = self.visiting.clone();
        visiting.push(column.id.clone());
        Ok(Scope {
            ctx: self.ctx,
            columns,
            visiting,
            is_root: false,
        })
    }

    fn depth(&self) -> usize {
        let target = usize::from(self.ctx.target_column.is_some());
        self.visiting.len().saturating_sub(target)
    }
}

fn validate_node<'a>(
    expr: FormulaExpr,
    scope: &'a Scope<'a>,
) -> BoxFuture<'a, FormulaResult<FormulaExpr>> {
    async move {
        match expr.kind {
            ExprKind::Call { callee, arguments } => {
                let def = function_def(&callee)?;
                def.check_arg_count(arguments.len())?;

                let arguments =
                    try_join_all(arguments.into_iter().map(|arg| validate_node(arg, scope)))
                        .await?;
                def.check_args(&arguments)?;

                let data_type = def.return_type(&arguments);
                Ok(typed(ExprKind::Call { callee, arguments }, data_type))
            }

            ExprKind::Identifier(mut ident) => {
                let column = find_column(scope.columns, &ident.name)
                    .ok_or_else(|| FormulaError::InvalidColumn(ident.name.clone()))?;
                let data_type = column_type(column, scope).await?;
                trace!(column = %column.id, %data_type, "resolved column reference");

                ident.name = column.id.clone();
                Ok(typed(ExprKind::Identifier(ident), data_type))
            }

            ExprKind::Literal(lit) => {
                let data_type = match lit.value {
                    LiteralValue::Number(_) => FormulaDataType::Numeric,
                    LiteralValue::Boolean(_) => FormulaDataType::Boolean,
                    LiteralValue::String(_) | LiteralValue::Null => FormulaDataType::String,
                };
                Ok(typed(ExprKind::Literal(lit), data_type))
            }

            ExprKind::Unary { operator, .. } => Err(FormulaError::NotSupported(format!(
                "Unary operator {}",
                operator.as_str()
            ))),

            ExprKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = validate_node(*left, scope).await?;
                let right = validate_node(*right, scope).await?;

                let data_type = if operator.is_comparison() {
                    FormulaDataType::ConditionalExpression
                } else if operator == BinaryOperator::Add
                    && [&left, &right].iter().any(|side| !adds_as_number(side))
                {
                    // 1 + "2" concatenates
                    FormulaDataType::String
                } else {
                    FormulaDataType::Numeric
                };

                Ok(typed(
                    ExprKind::Binary {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    data_type,
                ))
            }

            ExprKind::Logical {
                operator,
                left,
                right,
            } => {
                let left = validate_node(*left, scope).await?;
                let right = validate_node(*right, scope).await?;
                Ok(typed(
                    ExprKind::Logical {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    FormulaDataType::ConditionalExpression,
                ))
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = validate_node(*test, scope).await?;
                let consequent = validate_node(*consequent, scope).await?;
                let alternate = validate_node(*alternate, scope).await?;

                let data_type = unify_branch_types(&[
                    type_of(&consequent),
                    type_of(&alternate),
                ]);
                Ok(typed(
                    ExprKind::Conditional {
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    },
                    data_type,
                ))
            }

            ExprKind::Compound { .. } => Err(FormulaError::NotSupported(
                "Multiple expressions".to_string(),
            )),
            ExprKind::Member { .. } => Err(FormulaError::NotSupported(
                "Member expression".to_string(),
            )),
            ExprKind::Array { .. } => Err(FormulaError::NotSupported(
                "Array expression".to_string(),
            )),
        }
    }
    .boxed()
}

fn typed(kind: ExprKind, data_type: FormulaDataType) -> FormulaExpr {
    FormulaExpr::new(kind).with_type(data_type)
}

fn type_of(expr: &FormulaExpr) -> FormulaDataType {
    expr.data_type.unwrap_or(FormulaDataType::Unknown)
}

fn adds_as_number(expr: &FormulaExpr) -> bool {
    matches!(
        type_of(expr),
        FormulaDataType::Numeric
            | FormulaDataType::Boolean
            | FormulaDataType::Null
            | FormulaDataType::Unknown
    )
}

fn function_def(callee: &FormulaExpr) -> FormulaResult<&'static FunctionDef> {
    match callee.as_identifier() {
        Some(ident) => registry()
            .get(&ident.name)
            .ok_or_else(|| FormulaError::InvalidFunctionName(ident.name.clone())),
        None => Err(FormulaError::InvalidFunctionName(to_formula(callee))),
    }
}

/// Type of a reference to `column`
fn column_type<'a>(
    column: &'a Column,
    scope: &'a Scope<'a>,
) -> BoxFuture<'a, FormulaResult<FormulaDataType>> {
    async move {
        match (&column.ui_type, &column.options) {
            (UiType::Formula, _) => formula_column_type(column, scope).await,

            (
                UiType::Rollup,
                Some(ColumnOptions::Rollup {
                    relation_column_id,
                    rollup_column_id,
                    rollup_function,
                }),
            ) => {
                if rollup_function.is_numeric() {
                    return Ok(FormulaDataType::Numeric);
                }
                related_column_type(column, relation_column_id, rollup_column_id, scope).await
            }

            (
                UiType::Lookup,
                Some(ColumnOptions::Lookup {
                    relation_column_id,
                    lookup_column_id,
                }),
            ) => related_column_type(column, relation_column_id, lookup_column_id, scope).await,

            _ => Ok(column_data_type(column, scope.ctx.sql_types)),
        }
    }
    .boxed()
}

async fn formula_column_type(column: &Column, scope: &Scope<'_>) -> FormulaResult<FormulaDataType> {
    if scope.is_root && scope.ctx.options.check_circular_references {
        if let Some(target) = scope.ctx.target_column {
            check_circular_reference(target, column, scope.columns)?;
        }
    }

    let nested = scope.enter(column, scope.columns)?;

    if let Some(data_type) = column.parsed_tree().and_then(|tree| tree.data_type) {
        return Ok(data_type);
    }
    let Some(formula) = column.formula_text() else {
        return Ok(FormulaDataType::Unknown);
    };

    debug!(column = %column.id, depth = nested.depth(), "resolving nested formula");
    let tree = parse_stored_formula(formula)?;
    let tree = validate_node(tree, &nested).await?;
    Ok(type_of(&tree))
}

/// Type of the column `target_column_id` in the table `relation_column_id`
/// links to
async fn related_column_type(
    column: &Column,
    relation_column_id: &str,
    target_column_id: &str,
    scope: &Scope<'_>,
) -> FormulaResult<FormulaDataType> {
    let relation = scope
        .columns
        .iter()
        .find(|c| c.id == relation_column_id)
        .ok_or_else(|| FormulaError::InvalidColumn(relation_column_id.to_string()))?;
    let table_id = relation
        .related_table_id()
        .ok_or_else(|| FormulaError::InvalidColumn(relation_column_id.to_string()))?;

    debug!(column = %column.id, table = table_id, "fetching related table");
    let table = scope
        .ctx
        .meta
        .table_meta(table_id)
        .await
        .map_err(|source| FormulaError::NotAvailable {
            table_id: table_id.to_string(),
            source,
        })?;

    let target = table
        .column(target_column_id)
        .ok_or_else(|| FormulaError::InvalidColumn(target_column_id.to_string()))?;
    let nested = scope.enter(column, &table.columns)?;
    column_type(target, &nested).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaErrorKind;
    use duke_tables_core::TableStore;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("c1", "Title", UiType::SingleLineText),
            Column::new("c2", "Price", UiType::Currency),
            Column::new("c3", "Due", UiType::Date),
        ]
    }

    async fn data_type(formula: &str) -> FormulaResult<FormulaDataType> {
        let columns = columns();
        let store = TableStore::new();
        let ctx = ValidationContext::new(&columns, &store);
        validate_formula(formula, &ctx).await.map(|t| type_of(&t))
    }

    async fn error_kind(formula: &str) -> FormulaErrorKind {
        data_type(formula).await.unwrap_err().kind()
    }

    #[tokio::test]
    async fn test_literal_types() {
        assert_eq!(data_type("1").await.unwrap(), FormulaDataType::Numeric);
        assert_eq!(data_type("'a'").await.unwrap(), FormulaDataType::String);
        assert_eq!(data_type("true").await.unwrap(), FormulaDataType::Boolean);
        assert_eq!(data_type("null").await.unwrap(), FormulaDataType::String);
    }

    #[tokio::test]
    async fn test_binary_types() {
        assert_eq!(data_type("1 + 2").await.unwrap(), FormulaDataType::Numeric);
        assert_eq!(data_type("1 + \"2\"").await.unwrap(), FormulaDataType::String);
        assert_eq!(data_type("{Price} + true").await.unwrap(), FormulaDataType::Numeric);
        assert_eq!(data_type("{Due} + 1").await.unwrap(), FormulaDataType::String);
        assert_eq!(data_type("\"a\" * 2").await.unwrap(), FormulaDataType::Numeric);
        assert_eq!(
            data_type("{Price} >= 10").await.unwrap(),
            FormulaDataType::ConditionalExpression
        );
        // Strict equality is not a comparison here
        assert_eq!(data_type("1 === 1").await.unwrap(), FormulaDataType::Numeric);
    }

    #[tokio::test]
    async fn test_logical_and_ternary() {
        assert_eq!(
            data_type("{Price} > 1 && {Price} < 5").await.unwrap(),
            FormulaDataType::ConditionalExpression
        );
        assert_eq!(
            data_type("{Price} > 1 ? 'big' : 'small'").await.unwrap(),
            FormulaDataType::String
        );
        assert_eq!(
            data_type("{Price} > 1 ? 1 : null").await.unwrap(),
            FormulaDataType::String
        );
        assert_eq!(
            data_type("{Price} > 1 ? 1 : BLANK()").await.unwrap(),
            FormulaDataType::Numeric
        );
    }

    #[tokio::test]
    async fn test_unsupported_nodes() {
        assert_eq!(error_kind("-1").await, FormulaErrorKind::NotSupported);
        assert_eq!(error_kind("!{Price}").await, FormulaErrorKind::NotSupported);
        assert_eq!(error_kind("[1, 2]").await, FormulaErrorKind::NotSupported);
        assert_eq!(error_kind("{Title}.length").await, FormulaErrorKind::NotSupported);
        assert_eq!(error_kind("1, 2").await, FormulaErrorKind::NotSupported);
    }

    #[tokio::test]
    async fn test_calls() {
        assert_eq!(
            data_type("concat({Title}, '!')").await.unwrap(),
            FormulaDataType::String
        );
        assert_eq!(error_kind("FOO(1)").await, FormulaErrorKind::InvalidFunctionName);
        assert_eq!(error_kind("{Title}(1)").await, FormulaErrorKind::InvalidFunctionName);
        assert_eq!(error_kind("ABS({Title})").await, FormulaErrorKind::TypeMismatch);
        assert_eq!(error_kind("ROUND()").await, FormulaErrorKind::MinArg);
        assert_eq!(error_kind("ROUND(1, 2, 3)").await, FormulaErrorKind::MaxArg);
    }

    #[tokio::test]
    async fn test_argument_errors_surface_before_call_checks() {
        // The bad column inside the arguments wins over the type check
        assert_eq!(error_kind("ABS({Missing})").await, FormulaErrorKind::InvalidColumn);
        // The argument count is checked before arguments are resolved
        assert_eq!(error_kind("LEFT({Missing})").await, FormulaErrorKind::InvalidArgCount);
    }

    #[tokio::test]
    async fn test_identifier_renamed_to_id() {
        let columns = columns();
        let store = TableStore::new();
        let ctx = ValidationContext::new(&columns, &store);

        let tree = validate_formula("LEN({Title})", &ctx).await.unwrap();
        assert_eq!(to_formula(&tree), "LEN({c1})");

        let ExprKind::Call { arguments, .. } = &tree.kind else {
            panic!("expected a call");
        };
        assert_eq!(arguments[0].data_type, Some(FormulaDataType::String));
        assert_eq!(arguments[0].as_identifier().unwrap().raw, "{Title}");
    }

    #[tokio::test]
    async fn test_memoized_tree_is_used() {
        let stale = Column::formula("c9", "Cached", "{Title}")
            .with_parsed_tree(FormulaExpr::column("c2").with_type(FormulaDataType::Numeric));
        let mut columns = columns();
        columns.push(stale);
        let store = TableStore::new();
        let ctx = ValidationContext::new(&columns, &store);

        let tree = validate_formula("{Cached}", &ctx).await.unwrap();
        assert_eq!(tree.data_type, Some(FormulaDataType::Numeric));
    }

    #[tokio::test]
    async fn test_nested_cycle_without_target() {
        let mut columns = columns();
        columns.push(Column::formula("f1", "A", "{B} + 1"));
        columns.push(Column::formula("f2", "B", "{A} * 2"));
        let store = TableStore::new();
        let ctx = ValidationContext::new(&columns, &store);

        let err = validate_formula("{A}", &ctx).await.unwrap_err();
        assert!(matches!(err, FormulaError::CircularReference(ref id) if id == "f1"));
    }

    #[tokio::test]
    async fn test_max_depth() {
        let mut columns = columns();
        columns.push(Column::formula("f1", "One", "{Price}"));
        columns.push(Column::formula("f2", "Two", "{One}"));
        columns.push(Column::formula("f3", "Three", "{Two}"));
        let store = TableStore::new();

        let ctx = ValidationContext::new(&columns, &store);
        assert!(validate_formula("{Three}", &ctx).await.is_ok());

        let ctx = ValidationContext::new(&columns, &store).with_options(ValidationOptions {
            max_depth: 2,
            ..Default::default()
        });
        let err = validate_formula("{Three}", &ctx).await.unwrap_err();
        assert_eq!(err.kind(), FormulaErrorKind::CircularReference);
    }

    #[tokio::test]
    async fn test_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let columns = columns();
        let store = TableStore::new();
        let ctx = ValidationContext::new(&columns, &store);
        let fut = validate_formula("UPPER({Title})", &ctx);
        assert_send(&fut);
        assert!(fut.await.is_ok());
    }
}
