//! Purpose: Hold top-level CLI command dispatch for `tabula`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each mutating command saves only after its `Session` operation succeeded.
//! Invariants: Rendering helpers in `main.rs` own every output envelope.

use super::*;
use tabula::api::Session;

pub(super) fn dispatch_command(
    command: Command,
    client: &LocalClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tabula", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Db { command } => dispatch_db(command, client, color_mode),
        Command::Table { command } => match command {
            TableCommand::Create { db, table, schema } => {
                let value = mutate(client, &db, |session| {
                    session.create_table(&table, &schema).map(table_json)
                })?;
                emit_json(json!({ "created": value }), color_mode);
                Ok(RunOutcome::ok())
            }
            TableCommand::Show { db, table } => {
                let session = open_session(client, &db)?;
                let value = table_json(session.table(&table)?);
                emit_json(value, color_mode);
                Ok(RunOutcome::ok())
            }
        },
        Command::Row { command } => dispatch_row(command, client, color_mode),
        Command::Diff { db, first, second } => {
            let session = open_session(client, &db)?;
            let diff = session.difference(&first, &second)?;
            emit_json(difference_json(&first, &second, &diff), color_mode);
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_db(
    command: DbCommand,
    client: &LocalClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        DbCommand::Create { names } => {
            let mut created = Vec::with_capacity(names.len());
            for name in &names {
                let info = client.create_database(&DbRef::parse(name))?;
                created.push(database_info_json(&info));
            }
            emit_json(json!({ "created": created }), color_mode);
            Ok(RunOutcome::ok())
        }
        DbCommand::List => {
            let databases = list_databases(client)?;
            emit_json(
                json!({
                    "dir": client.db_dir().display().to_string(),
                    "databases": databases,
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        DbCommand::Info { db } => {
            let info = client
                .database_info(&DbRef::parse(&db))
                .map_err(|err| add_missing_db_hint(err, &db))?;
            emit_json(database_info_json(&info), color_mode);
            Ok(RunOutcome::ok())
        }
        DbCommand::Check { db, json } => {
            let report = client
                .validate(&DbRef::parse(&db))
                .map_err(|err| add_missing_db_hint(err, &db))?;
            if json {
                emit_json(report_json(&report), color_mode);
            } else {
                println!("{}", report_text(&report));
            }
            let exit_code = match report.status {
                ValidationStatus::Ok => 0,
                ValidationStatus::Invalid => to_exit_code(ErrorKind::Codec),
            };
            Ok(RunOutcome::with_code(exit_code))
        }
    }
}

fn dispatch_row(
    command: RowCommand,
    client: &LocalClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let value = match command {
        RowCommand::Add { db, table, values } => mutate(client, &db, |session| {
            let index = session.add_row(&table, values.as_slice())?;
            Ok(json!({ "table": table, "added": index }))
        })?,
        RowCommand::Set {
            db,
            table,
            index,
            values,
        } => mutate(client, &db, |session| {
            session.replace_row(&table, index, values.as_slice())?;
            Ok(json!({ "table": table, "replaced": index }))
        })?,
        RowCommand::Delete { db, table, index } => mutate(client, &db, |session| {
            let removed = session.delete_row(&table, index)?;
            Ok(json!({ "table": table, "deleted": index, "row": row_json(&removed) }))
        })?,
    };
    emit_json(value, color_mode);
    Ok(RunOutcome::ok())
}

fn open_session(client: &LocalClient, db: &str) -> Result<Session, Error> {
    let database = client
        .open(&DbRef::parse(db))
        .map_err(|err| add_missing_db_hint(err, db))?;
    Ok(Session::with_database(database))
}

/// Loads `db`, applies `op`, and saves only if `op` succeeded.
fn mutate<F>(client: &LocalClient, db: &str, op: F) -> Result<Value, Error>
where
    F: FnOnce(&mut Session) -> Result<Value, Error>,
{
    let mut session = open_session(client, db)?;
    let value = op(&mut session)?;
    if let Some(database) = session.database() {
        client.save(&DbRef::parse(db), database)?;
    }
    Ok(value)
}
