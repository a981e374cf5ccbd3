use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::Parser;
use console_core::{FileKind, Msg, Notification, Store};
use console_engine::{
    ActionOutcome, Command, EngineHandle, ExecuteOptions, RemoteService, ReqwestRemoteService,
};
use console_logging::{console_info, console_warn, Redacted};
use log::LevelFilter;

use super::cli::{Cli, CliCommand, Toggle};
use super::config::ConsoleConfig;
use super::logging;
use super::ui::render;

/// What to print once the last command has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    Table(FileKind),
    Dashboard,
    Nothing,
}

/// Commands run in order. The leading `preload` ones fill the store so the
/// main command can validate names against it.
struct Plan {
    preload: Vec<Command>,
    main: Vec<Command>,
    report: Report,
}

/// Runs one CLI invocation. `Ok(false)` means the backend or validation
/// rejected the request; the reason has already been printed.
pub fn run_app() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let config = ConsoleConfig::resolve(&cli.connection)?;
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log, level);

    console_info!(
        "Connecting to {} as {}:{} (delete as {}:{})",
        config.base_url,
        config.credentials.standard.username,
        Redacted(&config.credentials.standard.password),
        config.credentials.elevated.username,
        Redacted(&config.credentials.elevated.password),
    );

    let plan = plan_for(cli.command)?;
    let remote: Arc<dyn RemoteService> = Arc::new(
        ReqwestRemoteService::new(config.client_settings())
            .context("building http client")?,
    );
    let engine =
        EngineHandle::new(Arc::new(Store::new()), remote).context("starting engine thread")?;

    for command in plan.preload {
        if !run_one(&engine, command)? {
            console_warn!("Preload failed, not sending the requested action");
            return Ok(false);
        }
    }

    let mut succeeded = true;
    for command in plan.main {
        succeeded &= run_one(&engine, command)?;
    }

    match plan.report {
        Report::Table(kind) => {
            let (snapshot, _) = engine.store().dispatch(Msg::ShowList(kind));
            print!("{}", render::render_table(&snapshot.view()));
        }
        Report::Dashboard => print!("{}", render::render_dashboard(&engine.snapshot().view())),
        Report::Nothing => {}
    }
    Ok(succeeded)
}

fn plan_for(command: CliCommand) -> anyhow::Result<Plan> {
    let plan = match command {
        CliCommand::List { kind } => {
            let kind = FileKind::from(kind);
            Plan {
                preload: Vec::new(),
                main: vec![Command::Load(kind)],
                report: Report::Table(kind),
            }
        }
        CliCommand::Upload { kind, path } => {
            let kind = FileKind::from(kind);
            let content =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            Plan {
                preload: vec![Command::Fetch(kind)],
                main: vec![Command::Upload {
                    kind,
                    filename: file_name(&path)?,
                    content,
                }],
                report: Report::Table(kind),
            }
        }
        CliCommand::Delete { kind, names } => {
            let kind = FileKind::from(kind);
            Plan {
                preload: vec![Command::Fetch(kind)],
                main: vec![Command::Delete { kind, names }],
                report: Report::Table(kind),
            }
        }
        CliCommand::Convert { name, use_case } => Plan {
            preload: vec![Command::Fetch(FileKind::Source)],
            main: vec![Command::Convert {
                filename: name,
                use_case,
            }],
            report: Report::Table(FileKind::Converted),
        },
        CliCommand::Execute {
            names,
            wait_ms,
            screenshot,
            parallel,
        } => Plan {
            preload: vec![Command::Fetch(FileKind::Converted)],
            main: vec![Command::Execute {
                names,
                options: ExecuteOptions {
                    wait_time_ms: wait_ms,
                    capture_screenshot: screenshot,
                    parallel,
                },
            }],
            report: Report::Nothing,
        },
        CliCommand::ExecuteLegacy => Plan {
            preload: Vec::new(),
            main: vec![Command::ExecuteLegacy],
            report: Report::Nothing,
        },
        CliCommand::Record { state } => Plan {
            preload: Vec::new(),
            main: vec![Command::Record(state == Toggle::On)],
            report: Report::Nothing,
        },
        CliCommand::Dashboard => Plan {
            preload: Vec::new(),
            main: vec![
                Command::Load(FileKind::Source),
                Command::Load(FileKind::Converted),
            ],
            report: Report::Dashboard,
        },
    };
    Ok(plan)
}

fn run_one(engine: &EngineHandle, command: Command) -> anyhow::Result<bool> {
    let ticket = engine.submit(command);
    let outcome = engine
        .wait_for(ticket, print_notification)
        .ok_or_else(|| anyhow!("engine stopped before request #{ticket} settled"))?;
    Ok(outcome_succeeded(&outcome))
}

fn outcome_succeeded(outcome: &ActionOutcome) -> bool {
    match outcome {
        ActionOutcome::Succeeded => true,
        ActionOutcome::Failed(error) => {
            console_warn!("Request failed: {}", error);
            false
        }
        ActionOutcome::Rejected(reason) => {
            console_warn!("Request rejected: {}", reason);
            false
        }
    }
}

fn print_notification(notification: Notification) {
    println!("{}", render::notification(&notification, Local::now()));
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))
}
