// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use equipdesk_app::{Column, RecordId, SortDirection};
use equipdesk_client::{HttpService, MemoryService};
use equipdesk_testkit::RecordFaker;
use runtime::DeskRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "EQUIPDESK_LOG";
const DEMO_SEED: u64 = 2024;
const DEMO_RECORDS: usize = 24;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `equipdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(config.log_filter());
    debug!(
        path = %options.config_path.display(),
        role = config.role().as_str(),
        demo = options.demo,
        "config loaded"
    );

    let http;
    let memory;
    let service: &dyn equipdesk_app::RecordService = if options.demo {
        memory = MemoryService::with_records(RecordFaker::new(DEMO_SEED).records(DEMO_RECORDS));
        &memory
    } else {
        let base_url = config.base_url().ok_or_else(|| {
            anyhow!(
                "no record service configured -- set [service] base_url in {} or {}, or pass --demo",
                options.config_path.display(),
                config::SERVICE_URL_ENV
            )
        })?;
        http = HttpService::new(&base_url, config.timeout()?).with_context(|| {
            format!(
                "invalid [service] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
        if options.check_only {
            let count = http.ping()?;
            println!(
                "ok: {} answered with {count} records within {:?}",
                http.base_url(),
                http.timeout()
            );
            return Ok(());
        }
        &http
    };
    if options.check_only {
        println!("ok: demo service");
        return Ok(());
    }

    let command = options.command.unwrap_or(Command::List(ListArgs::default()));
    let mut runtime = DeskRuntime::new(config.role(), service);
    let stdout = io::stdout();
    runtime.run(&command, &mut stdout.lock())
}

/// `EQUIPDESK_LOG` wins over the config filter; output goes to stderr.
fn init_logging(config_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListArgs),
    Add(FieldArgs),
    Edit { id: RecordId, fields: FieldArgs },
    Delete { id: RecordId, confirmed: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    pub categories: Vec<String>,
    pub names: Vec<String>,
    pub statuses: Vec<String>,
    pub search: Option<(Column, String)>,
    pub sorts: Vec<(Column, SortDirection)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldArgs {
    pub category: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub time: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        command: None,
    };

    let args: Vec<String> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_owned())
        .collect();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            "list" => {
                options.command = Some(Command::List(parse_list_args(&mut iter)?));
            }
            "add" => {
                let fields = parse_field_args("add", &mut iter)?;
                for (flag, value) in [
                    ("--category", &fields.category),
                    ("--name", &fields.name),
                    ("--status", &fields.status),
                    ("--reason", &fields.reason),
                ] {
                    if value.is_none() {
                        bail!("add requires {flag}; run with --help to see the fields");
                    }
                }
                options.command = Some(Command::Add(fields));
            }
            "edit" => {
                let id = parse_id("edit", iter.next())?;
                let fields = parse_field_args("edit", &mut iter)?;
                options.command = Some(Command::Edit { id, fields });
            }
            "delete" => {
                let id = parse_id("delete", iter.next())?;
                let mut confirmed = false;
                for flag in iter.by_ref() {
                    match flag.as_str() {
                        "--yes" | "-y" => confirmed = true,
                        unknown => {
                            bail!("unknown delete argument {unknown:?}; only --yes is accepted")
                        }
                    }
                }
                options.command = Some(Command::Delete { id, confirmed });
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn parse_list_args(iter: &mut impl Iterator<Item = String>) -> Result<ListArgs> {
    let mut list = ListArgs::default();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .ok_or_else(|| anyhow!("list {flag} requires a value"))
        };
        match flag.as_str() {
            "--category" => list.categories.push(value()?),
            "--name" => list.names.push(value()?),
            "--status" => list.statuses.push(value()?),
            "--search" => {
                let raw = value()?;
                let (column, term) = raw.split_once('=').ok_or_else(|| {
                    anyhow!("--search expects COLUMN=TERM, for example reason=裂")
                })?;
                list.search = Some((parse_column(column)?, term.to_owned()));
            }
            "--sort" => {
                let raw = value()?;
                let (column, direction) = match raw.split_once(':') {
                    Some((column, "asc")) => (column, SortDirection::Asc),
                    Some((column, "desc")) => (column, SortDirection::Desc),
                    Some((_, other)) => {
                        bail!("unknown sort direction {other:?}; use asc or desc")
                    }
                    None => (raw.as_str(), SortDirection::Asc),
                };
                list.sorts.push((parse_column(column)?, direction));
            }
            unknown => bail!("unknown list argument {unknown:?}; run with --help to see filters"),
        }
    }
    Ok(list)
}

fn parse_field_args(command: &str, iter: &mut impl Iterator<Item = String>) -> Result<FieldArgs> {
    let mut fields = FieldArgs::default();
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "--category" => &mut fields.category,
            "--name" => &mut fields.name,
            "--status" => &mut fields.status,
            "--reason" => &mut fields.reason,
            "--time" => &mut fields.time,
            unknown => {
                bail!("unknown {command} argument {unknown:?}; run with --help to see fields")
            }
        };
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{command} {flag} requires a value"))?;
        *slot = Some(value);
    }
    Ok(fields)
}

fn parse_id(command: &str, raw: Option<String>) -> Result<RecordId> {
    let raw = raw.ok_or_else(|| anyhow!("{command} requires a record id"))?;
    let id: i64 = raw
        .parse()
        .with_context(|| format!("{command}: record id must be a number, got {raw:?}"))?;
    Ok(RecordId::new(id))
}

fn parse_column(raw: &str) -> Result<Column> {
    Column::parse(raw).ok_or_else(|| {
        anyhow!("unknown column {raw:?}; use one of id, type, name, status, reason, createTime")
    })
}

fn print_help() {
    println!("equipdesk: rescue equipment records");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Use seeded in-memory records instead of the service");
    println!("  --check                  Validate config and reach the record service");
    println!("  --help                   Show this help");
    println!();
    println!("commands:");
    println!("  list [--category L]... [--name N]... [--status S]...");
    println!("       [--search COL=TERM] [--sort COL[:asc|:desc]]...");
    println!("  add --category L --name N --status S --reason R [--time T]");
    println!("  edit <id> [--category L] [--name N] [--status S] [--reason R] [--time T]");
    println!("  delete <id> --yes");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, Command, FieldArgs, ListArgs, parse_cli_args};
    use anyhow::Result;
    use equipdesk_app::{Column, RecordId, SortDirection};
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/equipdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
                command: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_demo_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "--demo"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn list_collects_filters_search_and_sorts() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--demo",
                "list",
                "--category",
                "照明设备",
                "--category",
                "医疗设备",
                "--status",
                "损坏",
                "--search",
                "reason=裂",
                "--sort",
                "createTime:desc",
                "--sort",
                "name",
            ],
            default_options_path(),
        )?;
        assert!(options.demo);
        assert_eq!(
            options.command,
            Some(Command::List(ListArgs {
                categories: vec!["照明设备".to_owned(), "医疗设备".to_owned()],
                names: Vec::new(),
                statuses: vec!["损坏".to_owned()],
                search: Some((Column::Reason, "裂".to_owned())),
                sorts: vec![
                    (Column::CreatedAt, SortDirection::Desc),
                    (Column::Name, SortDirection::Asc),
                ],
            }))
        );
        Ok(())
    }

    #[test]
    fn list_rejects_malformed_search_and_sort() {
        let error = parse_cli_args(vec!["list", "--search", "reason"], default_options_path())
            .expect_err("search without '=' should fail");
        assert!(error.to_string().contains("COLUMN=TERM"));

        let error = parse_cli_args(vec!["list", "--sort", "name:up"], default_options_path())
            .expect_err("bad direction should fail");
        assert!(error.to_string().contains("asc or desc"));

        let error = parse_cli_args(vec!["list", "--sort", "color"], default_options_path())
            .expect_err("unknown column should fail");
        assert!(error.to_string().contains("unknown column"));
    }

    #[test]
    fn add_requires_every_mandatory_field() -> Result<()> {
        let error = parse_cli_args(
            vec!["add", "--category", "照明设备", "--name", "手电筒"],
            default_options_path(),
        )
        .expect_err("missing status should fail");
        assert!(error.to_string().contains("--status"));

        let options = parse_cli_args(
            vec![
                "add", "--category", "照明设备", "--name", "手电筒", "--status", "在库", "--reason",
                "新购入",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Add(FieldArgs {
                category: Some("照明设备".to_owned()),
                name: Some("手电筒".to_owned()),
                status: Some("在库".to_owned()),
                reason: Some("新购入".to_owned()),
                time: None,
            }))
        );
        Ok(())
    }

    #[test]
    fn edit_and_delete_take_numeric_ids() -> Result<()> {
        let options = parse_cli_args(
            vec!["edit", "7", "--status", "损坏"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Edit {
                id: RecordId::new(7),
                fields: FieldArgs {
                    status: Some("损坏".to_owned()),
                    ..FieldArgs::default()
                },
            })
        );

        let options = parse_cli_args(vec!["delete", "5", "--yes"], default_options_path())?;
        assert_eq!(
            options.command,
            Some(Command::Delete {
                id: RecordId::new(5),
                confirmed: true,
            })
        );

        let error = parse_cli_args(vec!["delete", "five"], default_options_path())
            .expect_err("non-numeric id should fail");
        assert!(error.to_string().contains("record id must be a number"));
        Ok(())
    }
}
