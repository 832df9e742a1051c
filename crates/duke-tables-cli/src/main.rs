//! Duke Tables CLI - formula checking and rewriting tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use duke_tables_core::{FormulaDataType, GenericSqlTypes, TableMeta, TableStore};
use duke_tables_formula::{
    parse_formula, registry, substitute_alias_with_id, substitute_id_with_alias, to_formula,
    validate_formula, FunctionDef, ValidationContext, ValidationOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DUKE_FORMULA_LOG";

#[derive(Parser)]
#[command(name = "duke-formula")]
#[command(author, version, about = "Formula checking and rewriting tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a formula against a table snapshot
    Validate {
        /// Formula text, with `{Column}` references by title or ID
        formula: String,

        /// JSON snapshot file: `{ "tables": [...] }`
        #[arg(short, long, env = "DUKE_FORMULA_SNAPSHOT")]
        snapshot: PathBuf,

        /// Table the formula belongs to (ID or title)
        #[arg(short, long)]
        table: String,

        /// Column the formula is saved to; enables the circular reference check
        #[arg(short, long)]
        column: Option<String>,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,

        /// Maximum depth of nested column resolution
        #[arg(long, env = "DUKE_FORMULA_MAX_DEPTH", default_value_t = 32)]
        max_depth: usize,

        /// Skip the circular reference check
        #[arg(long)]
        no_cycle_check: bool,
    },

    /// Reprint a formula in normalized form
    #[command(alias = "fmt")]
    Format {
        /// Formula text
        formula: String,
    },

    /// Rewrite column titles to column IDs
    ToIds {
        /// Formula text
        formula: String,

        #[arg(short, long, env = "DUKE_FORMULA_SNAPSHOT")]
        snapshot: PathBuf,

        #[arg(short, long)]
        table: String,
    },

    /// Rewrite column IDs to column titles
    ToAliases {
        /// Formula text, as stored
        formula: String,

        #[arg(short, long, env = "DUKE_FORMULA_SNAPSHOT")]
        snapshot: PathBuf,

        #[arg(short, long)]
        table: String,

        /// Formula as the user last wrote it, for deleted columns
        #[arg(long)]
        raw: Option<String>,
    },

    /// List built-in functions
    Functions {
        /// Show details for one function
        #[arg(short, long)]
        name: Option<String>,
    },
}

/// Table snapshot file
#[derive(Debug, Deserialize)]
struct Snapshot {
    tables: Vec<TableMeta>,
}

/// Result of `validate --json`
#[derive(Debug, Serialize, PartialEq)]
struct ValidationReport {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_type: Option<String>,
    /// Formula with column references rewritten to IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ErrorReport {
    kind: &'static str,
    message: String,
}

struct ValidateArgs<'a> {
    formula: &'a str,
    table: &'a str,
    column: Option<&'a str>,
    options: ValidationOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            formula,
            snapshot,
            table,
            column,
            json,
            max_depth,
            no_cycle_check,
        } => {
            let store = load_snapshot(&snapshot)?;
            let args = ValidateArgs {
                formula: &formula,
                table: &table,
                column: column.as_deref(),
                options: ValidationOptions {
                    check_circular_references: !no_cycle_check,
                    max_depth,
                },
            };
            let report = validate(&store, &args).await?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to encode report")?
                );
            } else {
                print_report(&report);
            }
            if !report.valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Format { formula } => {
            println!("{}", format_formula(&formula)?);
            Ok(())
        }
        Commands::ToIds {
            formula,
            snapshot,
            table,
        } => {
            let store = load_snapshot(&snapshot)?;
            println!("{}", to_ids(&store, &table, &formula)?);
            Ok(())
        }
        Commands::ToAliases {
            formula,
            snapshot,
            table,
            raw,
        } => {
            let store = load_snapshot(&snapshot)?;
            println!("{}", to_aliases(&store, &table, &formula, raw.as_deref())?);
            Ok(())
        }
        Commands::Functions { name } => list_functions(name.as_deref()),
    }
}

fn load_snapshot(path: &Path) -> Result<TableStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse snapshot '{}'", path.display()))?;

    debug!(tables = snapshot.tables.len(), path = %path.display(), "loaded snapshot");
    Ok(snapshot.tables.into_iter().collect())
}

fn find_table<'s>(store: &'s TableStore, table: &str) -> Result<&'s TableMeta> {
    store
        .find(table)
        .with_context(|| format!("Table '{}' is not in the snapshot", table))
}

async fn validate(store: &TableStore, args: &ValidateArgs<'_>) -> Result<ValidationReport> {
    let table = find_table(store, args.table)?;

    let mut ctx = ValidationContext::new(&table.columns, store)
        .with_sql_types(&GenericSqlTypes)
        .with_options(args.options);
    if let Some(column) = args.column {
        let target = table
            .require_column(column)
            .with_context(|| format!("Target column '{}' not found", column))?;
        ctx = ctx.with_target_column(target);
    }

    let report = match validate_formula(args.formula, &ctx).await {
        Ok(tree) => ValidationReport {
            valid: true,
            data_type: Some(
                tree.data_type
                    .unwrap_or(FormulaDataType::Unknown)
                    .to_string(),
            ),
            formula: Some(to_formula(&tree)),
            error: None,
        },
        Err(err) => ValidationReport {
            valid: false,
            data_type: None,
            formula: None,
            error: Some(ErrorReport {
                kind: err.kind().as_str(),
                message: err.to_string(),
            }),
        },
    };
    Ok(report)
}

fn print_report(report: &ValidationReport) {
    match (&report.data_type, &report.formula, &report.error) {
        (Some(data_type), Some(formula), _) => {
            println!("OK: {}", data_type);
            println!("{}", formula);
        }
        (_, _, Some(error)) => eprintln!("{}: {}", error.kind, error.message),
        _ => {}
    }
}

fn format_formula(formula: &str) -> Result<String> {
    let tree = parse_formula(formula).context("Failed to parse formula")?;
    Ok(to_formula(&tree))
}

fn to_ids(store: &TableStore, table: &str, formula: &str) -> Result<String> {
    let table = find_table(store, table)?;
    substitute_alias_with_id(formula, &table.columns).context("Failed to rewrite formula")
}

fn to_aliases(store: &TableStore, table: &str, formula: &str, raw: Option<&str>) -> Result<String> {
    let table = find_table(store, table)?;
    substitute_id_with_alias(formula, &table.columns, raw).context("Failed to rewrite formula")
}

fn list_functions(name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            let Some(def) = registry().get(name) else {
                bail!("Unknown function '{}'", name);
            };
            print!("{}", describe_function(def));
        }
        None => {
            for def in registry().iter() {
                println!("{:<16}{}", def.name, def.syntax);
            }
        }
    }
    Ok(())
}

fn describe_function(def: &FunctionDef) -> String {
    let mut text = format!("{}\n  {}\n\n  {}\n", def.name, def.syntax, def.description);
    if !def.examples.is_empty() {
        text.push_str("\nExamples:\n");
        for example in def.examples {
            text.push_str(&format!("  {}\n", example));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "tables": [
            {
                "id": "t1",
                "title": "Orders",
                "columns": [
                    { "id": "c1", "title": "Amount", "ui_type": "Currency" },
                    { "id": "c2", "title": "Customer", "ui_type": "LinkToAnotherRecord",
                      "options": { "kind": "link", "related_table_id": "t2" } },
                    { "id": "c3", "title": "Customer Name", "ui_type": "Lookup",
                      "options": { "kind": "lookup", "relation_column_id": "c2",
                                   "lookup_column_id": "c21" } },
                    { "id": "c4", "title": "Total", "ui_type": "Formula",
                      "options": { "kind": "formula", "formula": "{c1} * 2" } },
                    { "id": "c5", "title": "Row", "ui_type": "ID", "db_type": "int8" }
                ]
            },
            {
                "id": "t2",
                "title": "Customers",
                "columns": [
                    { "id": "c21", "title": "Name", "ui_type": "SingleLineText" }
                ]
            }
        ]
    }"#;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        file
    }

    fn store() -> TableStore {
        load_snapshot(snapshot_file().path()).unwrap()
    }

    fn args<'a>(formula: &'a str, column: Option<&'a str>) -> ValidateArgs<'a> {
        ValidateArgs {
            formula,
            table: "Orders",
            column,
            options: ValidationOptions::default(),
        }
    }

    #[test]
    fn test_load_snapshot() {
        let store = store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.find("Customers").unwrap().id, "t2");
    }

    #[test]
    fn test_load_snapshot_errors() {
        let err = load_snapshot(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"tables\": 3 }").unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse snapshot"));
    }

    #[tokio::test]
    async fn test_validate_ok() {
        let store = store();
        let report = validate(&store, &args("{Total} + {Row}", None)).await.unwrap();
        assert_eq!(
            report,
            ValidationReport {
                valid: true,
                data_type: Some("numeric".into()),
                formula: Some("({c4} + {c5})".into()),
                error: None,
            }
        );

        let report = validate(&store, &args("UPPER({Customer Name})", None))
            .await
            .unwrap();
        assert_eq!(report.data_type.as_deref(), Some("string"));
    }

    #[tokio::test]
    async fn test_validate_errors() {
        let store = store();

        let report = validate(&store, &args("{Missing}", None)).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.error.unwrap().kind, "INVALID_COLUMN");

        let report = validate(&store, &args("CONCAT({Amount}", None)).await.unwrap();
        assert_eq!(report.error.unwrap().kind, "PARSE_ERROR");

        let report = validate(&store, &args("{Total} + 1", Some("Total")))
            .await
            .unwrap();
        assert_eq!(report.error.unwrap().kind, "CIRCULAR_REFERENCE");

        assert!(validate(&store, &args("1", Some("Nope"))).await.is_err());

        let unknown_table = ValidateArgs {
            table: "Invoices",
            ..args("1", None)
        };
        assert!(validate(&store, &unknown_table).await.is_err());
    }

    #[test]
    fn test_validation_report_json() {
        let report = ValidationReport {
            valid: false,
            data_type: None,
            formula: None,
            error: Some(ErrorReport {
                kind: "INVALID_FUNCTION_NAME",
                message: "Function FOO is not available".into(),
            }),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": false,
                "error": {
                    "kind": "INVALID_FUNCTION_NAME",
                    "message": "Function FOO is not available"
                }
            })
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(format_formula("1+2*{a}").unwrap(), "(1 + (2 * {a}))");
        assert!(format_formula("(1 + 2").is_err());
    }

    #[test]
    fn test_alias_rewrites() {
        let store = store();
        let stored = to_ids(&store, "t1", "{Amount} * 2").unwrap();
        assert_eq!(stored, "({c1} * 2)");
        assert_eq!(to_aliases(&store, "t1", &stored, None).unwrap(), "({Amount} * 2)");
        assert_eq!(
            to_aliases(&store, "t1", "{c9} - {c1}", Some("{Tax} - {Amount}")).unwrap(),
            "({Tax} - {Amount})"
        );
        assert!(to_ids(&store, "t1", "{Tax}").is_err());
    }

    #[test]
    fn test_describe_function() {
        let def = registry().get("left").unwrap();
        let text = describe_function(def);
        assert!(text.starts_with("LEFT\n  LEFT(str, n)\n"));
        assert!(text.contains("Examples:"));
        assert!(list_functions(Some("NOPE")).is_err());
    }
}
