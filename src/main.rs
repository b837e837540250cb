//! Purpose: `affinity` CLI entry point; a thin caller over the client library.
//! Role: Binary crate root; parses args, runs one operation, emits JSON on stdout.
//! Invariants: Errors are emitted as JSON on stderr when not a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.

use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use affinity_client::api::{
    Affinity, ApiResult, Error, ErrorKind, FieldValuesQuery, FieldsQuery, PersonOptions,
    PersonsQuery, to_exit_code,
};

#[derive(Parser)]
#[command(
    name = "affinity",
    version,
    about = "Query the Affinity CRM API",
    after_help = r#"EXAMPLES
  $ affinity lists
  $ affinity list --name "Portfolio"
  $ affinity entries 450 --all
  $ affinity field-values --organization-id 64
  $ affinity persons --term ada --param min_last_email_date=2023-01-01

The API key is read from the AFFINITY_API_KEY environment variable."#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List all lists")]
    Lists,
    #[command(about = "Show one list (by id, with its fields) or find it by name")]
    List {
        #[arg(help = "List id", conflicts_with = "name")]
        id: Option<u64>,
        #[arg(long, help = "Exact list name (case-sensitive)")]
        name: Option<String>,
    },
    #[command(about = "Fetch entries of a list, one page or all pages")]
    Entries {
        list_id: u64,
        #[arg(long, help = "Entries per page (server default when omitted)")]
        page_size: Option<u32>,
        #[arg(long, help = "Continuation token from a previous page")]
        page_token: Option<String>,
        #[arg(long, help = "Follow continuation tokens until exhausted")]
        all: bool,
    },
    #[command(about = "Fetch one list entry")]
    Entry { list_id: u64, entry_id: u64 },
    #[command(about = "List fields, optionally filtered")]
    Fields {
        #[arg(long)]
        list_id: Option<u64>,
        #[arg(long)]
        value_type: Option<i64>,
        #[arg(long)]
        entity_type: Option<i64>,
        #[arg(long)]
        with_modified_names: bool,
        #[arg(long)]
        exclude_dropdown_options: bool,
    },
    #[command(about = "Fetch field values for exactly one entity")]
    FieldValues {
        #[arg(long)]
        person_id: Option<u64>,
        #[arg(long)]
        organization_id: Option<u64>,
        #[arg(long)]
        opportunity_id: Option<u64>,
        #[arg(long)]
        list_entry_id: Option<u64>,
    },
    #[command(about = "Search persons, one page or all pages")]
    Persons {
        #[arg(long, help = "Free-text search term")]
        term: Option<String>,
        #[arg(long)]
        with_interaction_dates: bool,
        #[arg(long)]
        with_interaction_persons: bool,
        #[arg(long)]
        with_opportunities: bool,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        page_token: Option<String>,
        #[arg(long, help = "Follow continuation tokens until exhausted")]
        all: bool,
        #[arg(
            long = "param",
            value_parser = parse_extra,
            help = "Extra query parameter as key=value (repeatable)"
        )]
        extra: Vec<(String, String)>,
    },
    #[command(about = "Fetch one person")]
    Person {
        person_id: u64,
        #[arg(long)]
        with_interaction_dates: bool,
        #[arg(long)]
        with_interaction_persons: bool,
        #[arg(long)]
        with_opportunities: bool,
    },
    #[command(about = "Fetch the organizations collection (raw JSON body)")]
    Organizations,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> ApiResult<()> {
    let client = Affinity::from_env()?;
    match command {
        Command::Lists => print_json(&client.lists()?),
        Command::List { id, name } => match (id, name) {
            (Some(id), None) => print_json(&client.list_by_id(id)?),
            (None, Some(name)) => print_json(&client.list_by_name(&name)?),
            _ => Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("pass either a list id or --name")),
        },
        Command::Entries {
            list_id,
            page_size,
            page_token,
            all,
        } => {
            if all {
                let entries = client.list_entry_pages(list_id, page_size).collect_all()?;
                print_json(&entries)
            } else {
                let page = client.list_entries(list_id, page_size, page_token.as_deref())?;
                print_json(&json!({
                    "list_entries": page.items,
                    "next_page_token": page.next_page_token,
                }))
            }
        }
        Command::Entry { list_id, entry_id } => {
            print_json(&client.list_entry_by_id(list_id, entry_id)?)
        }
        Command::Fields {
            list_id,
            value_type,
            entity_type,
            with_modified_names,
            exclude_dropdown_options,
        } => print_json(&client.fields(&FieldsQuery {
            list_id,
            value_type,
            entity_type,
            with_modified_names,
            exclude_dropdown_options,
        })?),
        Command::FieldValues {
            person_id,
            organization_id,
            opportunity_id,
            list_entry_id,
        } => print_json(&client.field_values(&FieldValuesQuery {
            person_id,
            organization_id,
            opportunity_id,
            list_entry_id,
        })?),
        Command::Persons {
            term,
            with_interaction_dates,
            with_interaction_persons,
            with_opportunities,
            page_size,
            page_token,
            all,
            extra,
        } => {
            let query = PersonsQuery {
                term,
                with_interaction_dates,
                with_interaction_persons,
                with_opportunities,
                page_size,
                page_token,
                extra,
            };
            if all {
                let persons = client.person_pages(query).collect_all()?;
                print_json(&persons)
            } else {
                let page = client.persons(&query)?;
                print_json(&json!({
                    "persons": page.items,
                    "next_page_token": page.next_page_token,
                }))
            }
        }
        Command::Person {
            person_id,
            with_interaction_dates,
            with_interaction_persons,
            with_opportunities,
        } => print_json(&client.person_by_id(
            person_id,
            PersonOptions {
                with_interaction_dates,
                with_interaction_persons,
                with_opportunities,
            },
        )?),
        Command::Organizations => print_json(&client.organizations()?.into_inner()),
    }
}

fn parse_extra(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err("expected key=value".to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> ApiResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("failed to encode output json")
            .with_source(err)
    })?;
    println!("{text}");
    Ok(())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }

    let value = json!({
        "error": {
            "kind": format!("{:?}", err.kind()),
            "message": err.message(),
            "status": err.status(),
            "body": err.body(),
        }
    });
    let text = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Io\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{text}");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
