//! Purpose: `tabula` CLI entry point.
//! Role: Binary crate root; parses args, runs one command, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout (pretty on a TTY, compact otherwise).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Mutations are load, one `Session` operation, save; a failed operation writes nothing.
#![allow(clippy::result_large_err)]
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod color_json;
mod command_dispatch;

use color_json::colorize_json;
use tabula::api::{
    DatabaseInfo, DbRef, Difference, Error, ErrorKind, LocalClient, Row, Table, ValidationReport,
    ValidationStatus, to_exit_code,
};
use tabula::core::codec::encode_value;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let client = match cli.dir {
        Some(dir) => LocalClient::new().with_db_dir(dir),
        None => LocalClient::new(),
    };
    let color_mode = cli.color;

    command_dispatch::dispatch_command(cli.command, &client, color_mode)
        .map_err(add_codec_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

#[derive(Parser)]
#[command(
    name = "tabula",
    version,
    about = "Typed tables in a single JSON file",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A database is one JSON file holding named tables. Every table has a fixed schema
and every row is checked against it before it is stored.

Field types: int, real, char, string, date (YYYY-MM-DD), dateInvl (START;END)
"#,
    after_help = r#"EXAMPLES
  $ tabula db create shop
  $ tabula table create shop items "sku:string, qty:int, added:date"
  $ tabula row add shop items A-1 4 2024-01-15
  $ tabula table show shop items

LEARN MORE
  $ tabula <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        help = "Directory for named databases (default: ~/.tabula/databases)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Manage database files",
        after_help = r#"EXAMPLES
  $ tabula db create shop
  $ tabula db list
  $ tabula db info shop
  $ tabula db check ./backups/shop.json"#
    )]
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Create and show tables",
        after_help = r#"EXAMPLES
  $ tabula table create shop items "sku:string, qty:int"
  $ tabula table show shop items"#
    )]
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Add, replace, and delete rows",
        long_about = r#"Rows are given as one raw token per field, in schema order.

Tokens are converted to the field's type; a row that does not fit is rejected whole."#,
        after_help = r#"EXAMPLES
  $ tabula row add shop items A-1 4
  $ tabula row set shop items 0 A-1 5
  $ tabula row delete shop items 0"#
    )]
    Row {
        #[command(subcommand)]
        command: RowCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Compare the rows of two tables with the same schema",
        long_about = r#"Show rows of FIRST with no equal row in SECOND, and rows of SECOND with no equal row in FIRST.

Duplicates are kept: every occurrence is checked on its own."#,
        after_help = r#"EXAMPLES
  $ tabula diff shop items items_archive"#
    )]
    Diff {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "First table")]
        first: String,
        #[arg(help = "Second table")]
        second: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completion scripts",
        after_help = r#"EXAMPLES
  $ tabula completion bash > ~/.local/share/bash-completion/completions/tabula
  $ tabula completion zsh > ~/.zfunc/_tabula
  $ tabula completion fish > ~/.config/fish/completions/tabula.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum DbCommand {
    #[command(arg_required_else_help = true, about = "Create one or more empty databases")]
    Create {
        #[arg(required = true, help = "Database name(s) or path(s)")]
        names: Vec<String>,
    },
    #[command(
        about = "List databases in the database directory",
        long_about = r#"List databases in the database directory.

Non-.json files are ignored. Files that cannot be read include an error field."#
    )]
    List,
    #[command(arg_required_else_help = true, about = "Show tables, schemas, and row counts")]
    Info {
        #[arg(help = "Database name or path")]
        db: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Check a database file and report every problem",
        long_about = r#"Check a database file without loading it, listing every problem found.

Exits non-zero when the file would not load."#
    )]
    Check {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TableCommand {
    #[command(
        arg_required_else_help = true,
        about = "Create a table from a schema declaration",
        long_about = r#"Create a table from a schema declaration such as "id:int, name:string".

Types: int, real, char, string, date, dateInvl."#
    )]
    Create {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Schema declaration, e.g. \"id:int, name:string\"")]
        schema: String,
    },
    #[command(arg_required_else_help = true, about = "Show a table's schema and rows")]
    Show {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "Table name")]
        table: String,
    },
}

#[derive(Subcommand)]
enum RowCommand {
    #[command(arg_required_else_help = true, about = "Append a row")]
    Add {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "Table name")]
        table: String,
        #[arg(
            num_args = 0..,
            allow_hyphen_values = true,
            help = "One raw value per field, in schema order"
        )]
        values: Vec<String>,
    },
    #[command(arg_required_else_help = true, about = "Replace the row at an index")]
    Set {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Zero-based row index")]
        index: usize,
        #[arg(
            num_args = 0..,
            allow_hyphen_values = true,
            help = "One raw value per field, in schema order"
        )]
        values: Vec<String>,
    },
    #[command(arg_required_else_help = true, about = "Delete the row at an index")]
    Delete {
        #[arg(help = "Database name or path")]
        db: String,
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Zero-based row index")]
        index: usize,
    },
}

fn add_missing_db_hint(err: Error, input: &str) -> Error {
    if err.kind() != ErrorKind::NotFound || err.path().is_none() || err.table().is_some() {
        return err;
    }
    err.with_hint(format!(
        "Create it first: `tabula db create {input}` (or pass --dir for a different directory)."
    ))
}

fn add_codec_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Codec || err.hint().is_some() {
        return err;
    }
    err.with_hint("The file is not a valid database document. Run `tabula db check <db>` for details.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the path, permissions, and disk space.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn row_json(row: &Row) -> Value {
    Value::Array(row.values().iter().map(encode_value).collect())
}

fn table_json(table: &Table) -> Value {
    let schema = table
        .schema()
        .fields()
        .iter()
        .map(|field| json!({ "name": field.name, "type": field.field_type.declared_name() }))
        .collect::<Vec<_>>();
    let rows = table.rows().iter().map(row_json).collect::<Vec<_>>();
    json!({
        "table": table.name(),
        "schema": schema,
        "row_count": table.len(),
        "rows": rows,
    })
}

fn database_info_json(info: &DatabaseInfo) -> Value {
    let tables = info
        .tables
        .iter()
        .map(|table| {
            json!({
                "name": table.name,
                "schema": table.schema,
                "row_count": table.row_count,
            })
        })
        .collect::<Vec<_>>();
    json!({
        "name": info.name,
        "path": info.path.display().to_string(),
        "file_size": info.file_size,
        "tables": tables,
    })
}

fn difference_json(first: &str, second: &str, diff: &Difference) -> Value {
    json!({
        "first": first,
        "second": second,
        "only_in_first": diff.only_in_self.iter().map(row_json).collect::<Vec<_>>(),
        "only_in_second": diff.only_in_other.iter().map(row_json).collect::<Vec<_>>(),
    })
}

fn list_databases(client: &LocalClient) -> Result<Vec<Value>, Error> {
    let mut databases = Vec::new();
    for path in client.list_databases()? {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unknown")
            .to_string();
        match client.database_info(&DbRef::path(path.clone())) {
            Ok(info) => databases.push(database_info_json(&info)),
            Err(err) => databases.push(database_list_error(&name, &path, add_codec_hint(err))),
        }
    }
    Ok(databases)
}

fn database_list_error(name: &str, path: &Path, err: Error) -> Value {
    json!({
        "name": name,
        "path": path.display().to_string(),
        "error": error_json(&err)["error"].clone(),
    })
}

fn report_json(report: &ValidationReport) -> Value {
    let issues = report
        .issues
        .iter()
        .map(|issue| {
            let mut map = Map::new();
            map.insert("code".to_string(), json!(issue.code));
            map.insert("message".to_string(), json!(issue.message));
            if let Some(table) = &issue.table {
                map.insert("table".to_string(), json!(table));
            }
            if let Some(row) = issue.row {
                map.insert("row".to_string(), json!(row));
            }
            if let Some(field) = &issue.field {
                map.insert("field".to_string(), json!(field));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();
    json!({
        "db": report.db_ref,
        "path": report.path.display().to_string(),
        "status": report.status.as_str(),
        "table_count": report.table_count,
        "row_count": report.row_count,
        "issue_count": report.issue_count,
        "issues": issues,
    })
}

fn report_text(report: &ValidationReport) -> String {
    let label = report
        .db_ref
        .clone()
        .unwrap_or_else(|| report.path.display().to_string());
    match report.status {
        ValidationStatus::Ok => format!(
            "OK: {label} ({} tables, {} rows)",
            report.table_count, report.row_count
        ),
        ValidationStatus::Invalid => {
            let mut lines = vec![format!("INVALID: {label} ({} issues)", report.issue_count)];
            for issue in &report.issues {
                let mut location = Vec::new();
                if let Some(table) = &issue.table {
                    location.push(format!("table {table}"));
                }
                if let Some(row) = issue.row {
                    location.push(format!("row {row}"));
                }
                if let Some(field) = &issue.field {
                    location.push(format!("field {field}"));
                }
                if location.is_empty() {
                    lines.push(format!("  - [{}] {}", issue.code, issue.message));
                } else {
                    lines.push(format!(
                        "  - [{}] {}: {}",
                        issue.code,
                        location.join(", "),
                        issue.message
                    ));
                }
            }
            lines.join("\n")
        }
    }
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let pretty = is_tty || use_color;
    let json = if pretty {
        colorize_json(&value, use_color)
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::DuplicateTable => "table already exists".to_string(),
        ErrorKind::Schema => "invalid schema declaration".to_string(),
        ErrorKind::RowArity => "wrong number of values".to_string(),
        ErrorKind::RowType => "value does not fit field type".to_string(),
        ErrorKind::SchemaMismatch => "schemas differ".to_string(),
        ErrorKind::Index => "row index out of range".to_string(),
        ErrorKind::Codec => "invalid database document".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    let details = [
        ("path:", err.path().map(|path| path.display().to_string())),
        ("table:", err.table().map(str::to_string)),
        ("field:", err.field().map(str::to_string)),
        ("index:", err.index().map(|index| index.to_string())),
    ];
    for (label, value) in details {
        if let Some(value) = value {
            lines.push(format!(
                "{} {value}",
                colorize_label(label, use_color, AnsiColor::Yellow)
            ));
        }
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `tabula --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "tabula") else {
        return "Try `tabula --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `tabula --help`.".to_string();
    }
    format!("Try `tabula {} --help`.", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Error, ErrorKind, add_missing_db_hint, error_json, error_text, report_text,
    };
    use clap::CommandFactory;
    use std::path::PathBuf;
    use tabula::api::{ValidationIssue, ValidationReport};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn error_json_carries_location_fields() {
        let err = Error::new(ErrorKind::RowType)
            .with_message("'x' is not an int")
            .with_table("people")
            .with_field("id")
            .with_index(3);
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "RowType");
        assert_eq!(value["error"]["table"], "people");
        assert_eq!(value["error"]["field"], "id");
        assert_eq!(value["error"]["index"], 3);
        assert!(value["error"].get("path").is_none());
    }

    #[test]
    fn error_text_without_color_has_no_escapes() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("database 'shop' does not exist")
            .with_hint("Create it.")
            .with_path("/tmp/shop.json");
        let text = error_text(&err, false);
        assert!(text.starts_with("error: database 'shop' does not exist"));
        assert!(text.contains("hint: Create it."));
        assert!(text.contains("path: /tmp/shop.json"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn missing_db_hint_skips_missing_tables() {
        let missing_db = Error::new(ErrorKind::NotFound).with_path("/tmp/x.json");
        assert!(add_missing_db_hint(missing_db, "x").hint().is_some());

        let missing_table = Error::new(ErrorKind::NotFound)
            .with_path("/tmp/x.json")
            .with_table("t");
        assert!(add_missing_db_hint(missing_table, "x").hint().is_none());
    }

    #[test]
    fn report_text_lists_issue_locations() {
        let report = ValidationReport::ok(PathBuf::from("shop.json"))
            .with_db_ref("shop")
            .set_issues(vec![ValidationIssue {
                code: "row_value".to_string(),
                message: "bad".to_string(),
                table: Some("items".to_string()),
                row: Some(2),
                field: Some("qty".to_string()),
            }]);
        let text = report_text(&report);
        assert!(text.starts_with("INVALID: shop (1 issues)"));
        assert!(text.contains("[row_value] table items, row 2, field qty: bad"));
    }
}
