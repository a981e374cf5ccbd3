use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console_core::FileKind;

use super::logging::LogDestination;

/// Manage automation test files on the backend.
#[derive(Debug, Parser)]
#[command(name = "console_app")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log more detail (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Values that override `console.ron`.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Configuration file
    #[arg(long, env = "CONSOLE_CONFIG", default_value = "console.ron", global = true)]
    pub config: PathBuf,

    /// Backend base URL
    #[arg(long, env = "CONSOLE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Username for regular calls
    #[arg(long, env = "CONSOLE_USER", global = true)]
    pub user: Option<String>,

    /// Password for regular calls
    #[arg(long, env = "CONSOLE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Username for delete calls
    #[arg(long, env = "CONSOLE_ADMIN_USER", global = true)]
    pub admin_user: Option<String>,

    /// Password for delete calls
    #[arg(long, env = "CONSOLE_ADMIN_PASSWORD", global = true, hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Where log lines go
    #[arg(long, value_enum, global = true)]
    pub log: Option<LogDestination>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show the files of one kind
    List { kind: KindArg },

    /// Upload a .side or .xlsx file
    Upload { kind: KindArg, path: PathBuf },

    /// Delete files by name
    Delete {
        kind: KindArg,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Convert one source file to a spreadsheet
    Convert {
        name: String,
        /// Use-case label stored with the spreadsheet
        #[arg(long)]
        use_case: String,
    },

    /// Run converted files
    Execute {
        #[arg(required = true)]
        names: Vec<String>,
        /// Wait between steps, in milliseconds
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
        /// Capture screenshots during the run
        #[arg(long)]
        screenshot: bool,
        /// Run web tests in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Trigger the legacy execute action
    ExecuteLegacy,

    /// Turn recording mode on or off
    Record { state: Toggle },

    /// Show source and converted file counts. Every invocation is its own
    /// session, so upload/delete/run counters are not shown here.
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Source,
    Converted,
}

impl From<KindArg> for FileKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Source => FileKind::Source,
            KindArg::Converted => FileKind::Converted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}
