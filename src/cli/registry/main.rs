use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing::info;

mod api;
mod commands;
mod config;

use api::RegistryApi;
use commands::{parse_field, RegistryCommands};
use config::Config;

fn table_arg() -> Arg<'static, 'static> {
    Arg::with_name("table")
        .value_name("TABLE")
        .help("Table name")
        .required(true)
        .index(1)
}

fn id_arg() -> Arg<'static, 'static> {
    Arg::with_name("id")
        .value_name("ID")
        .help("Row id")
        .required(true)
        .index(2)
}

fn parse_opt<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match matches.value_of(name) {
        Some(raw) => Ok(Some(raw.parse::<T>().map_err(|e| {
            anyhow::anyhow!("invalid --{} '{}': {}", name, raw, e)
        })?)),
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = App::new("Business Registry CLI")
        .version("1.0")
        .author("Business Registry Team")
        .about("Inspect and edit business registry tables")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("list")
                .about("List every row of a table")
                .arg(table_arg()),
        )
        .subcommand(
            SubCommand::with_name("get")
                .about("Show one row by id")
                .arg(table_arg())
                .arg(id_arg()),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Search rows; a row matches if any field matches")
                .arg(table_arg())
                .arg(
                    Arg::with_name("field")
                        .short("f")
                        .long("field")
                        .value_name("NAME=VALUE")
                        .help("Text values match as case-insensitive substrings, others exactly")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1),
                )
                .arg(
                    Arg::with_name("page")
                        .short("p")
                        .long("page")
                        .value_name("PAGE")
                        .help("1-based page number")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("limit")
                        .short("l")
                        .long("limit")
                        .value_name("ROWS")
                        .help("Rows per page")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("create")
                .about("Insert a row")
                .arg(table_arg())
                .arg(
                    Arg::with_name("json")
                        .value_name("JSON")
                        .help("Row as a JSON object")
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(
            SubCommand::with_name("patch")
                .about("Update fields of one row")
                .arg(table_arg())
                .arg(id_arg())
                .arg(
                    Arg::with_name("json")
                        .value_name("JSON")
                        .help("Changed fields as a JSON object")
                        .required(true)
                        .index(3),
                ),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .about("Delete one row by id")
                .arg(table_arg())
                .arg(id_arg()),
        )
        .subcommand(
            SubCommand::with_name("config")
                .about("Show or change CLI preferences")
                .arg(
                    Arg::with_name("page-size")
                        .long("page-size")
                        .value_name("ROWS")
                        .help("Default rows per page")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("pretty")
                        .long("pretty")
                        .value_name("BOOL")
                        .help("Pretty-print JSON output")
                        .takes_value(true)
                        .possible_values(&["true", "false"]),
                ),
        )
        .get_matches();

    business_registry::logging::init_tracing_from_env()?;

    // Load configuration
    let mut config = Config::load()?;

    if let ("config", Some(sub_matches)) = matches.subcommand() {
        let mut changed = false;
        if let Some(page_size) = parse_opt::<u32>(sub_matches, "page-size")? {
            config.page_size = page_size;
            changed = true;
        }
        if let Some(pretty) = parse_opt::<bool>(sub_matches, "pretty")? {
            config.pretty = pretty;
            changed = true;
        }
        if changed {
            config.save()?;
        }
        println!("page_size = {}\npretty = {}", config.page_size, config.pretty);
        return Ok(());
    }

    let api = RegistryApi::connect().await?;
    info!(backend = api.backend(), "connected");
    let commands = RegistryCommands::new(api, config);

    // Process subcommands
    match matches.subcommand() {
        ("list", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            commands.list(table).await?;
        }
        ("get", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            let id = sub_matches.value_of("id").unwrap_or_default();
            commands.get(table, id).await?;
        }
        ("search", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            let fields = sub_matches
                .values_of("field")
                .map(|values| values.map(parse_field).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            let page = parse_opt::<u32>(sub_matches, "page")?;
            let limit = parse_opt::<u32>(sub_matches, "limit")?;
            commands.search(table, &fields, page, limit).await?;
        }
        ("create", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            let json = sub_matches.value_of("json").unwrap_or_default();
            commands.create(table, json).await?;
        }
        ("patch", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            let id = sub_matches.value_of("id").unwrap_or_default();
            let json = sub_matches.value_of("json").unwrap_or_default();
            commands.patch(table, id, json).await?;
        }
        ("delete", Some(sub_matches)) => {
            let table = sub_matches.value_of("table").unwrap_or_default();
            let id = sub_matches.value_of("id").unwrap_or_default();
            commands.delete(table, id).await?;
        }
        _ => {
            println!("No subcommand specified. Use --help for usage information.");
        }
    }

    Ok(())
}
