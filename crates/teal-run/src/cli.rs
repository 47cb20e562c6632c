use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::Diagnostic;
use teal_dap::{DebugSources, SetupError};
use teal_lsp::{LspConfig, LspError};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TEALSP_LOG";

/// Flags that may also be spelled with a single dash, e.g. `-addr`.
const LONG_FLAGS: &[&str] = &["net", "addr", "debug", "config", "algod", "algod-token", "replay"];

#[derive(Parser, Debug)]
#[command(name = "tealsp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "# Examples:\n\n\
    ## To serve diagnostics over stdio:\n\
    tealsp\n\n\
    ## To connect to an editor listening on TCP:\n\
    tealsp --addr 127.0.0.1:9257\n\n\
    ## To debug a recorded simulate trace:\n\
    tealsp dbg --replay trace.json --config debug.json")]
#[command(about = "Language server and debug adapter for TEAL", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(flatten)]
    lsp: LspArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a debug adapter that replays TEAL execution traces
    Dbg(DbgArgs),
}

#[derive(Debug, Clone, Args)]
struct LspArgs {
    /// Network used to reach the editor (tcp, tcp4, tcp6 or unix)
    #[arg(long, default_value = "tcp")]
    net: String,

    /// Address to dial; serve over stdio when empty
    #[arg(long, default_value = "")]
    addr: String,

    /// Write a copy of all protocol traffic to this file; disabled when empty
    #[arg(long, default_value = "")]
    debug: String,
}

#[derive(Debug, Clone, Args)]
struct DbgArgs {
    /// Write a copy of all protocol traffic to this file; disabled when empty
    #[arg(long, default_value = "")]
    debug: String,

    /// Static debugger configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// algod endpoint used for live simulation; an empty value disables it
    #[arg(long, value_name = "URL")]
    algod: Option<String>,

    /// API token sent to the algod endpoint
    #[arg(long, default_value = "")]
    algod_token: String,

    /// Recorded simulate response to replay instead of querying a node
    #[arg(long)]
    replay: Option<PathBuf>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lsp(#[from] LspError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Dbg(#[from] SetupError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Lsp(e) => e.exit_code(),
            Self::Dbg(e) => e.exit_code(),
        }
    }
}

impl Cli {
    pub fn run(&self) -> Result<(), CliError> {
        match &self.commands {
            Some(Commands::Dbg(args)) => Ok(teal_dap::start(&args.sources())?),
            None => {
                init_stderr_logging();
                let config = LspConfig::new(
                    self.lsp.net.clone(),
                    self.lsp.addr.clone(),
                    debug_path(&self.lsp.debug),
                );
                Ok(teal_lsp::start(config)?)
            }
        }
    }
}

impl DbgArgs {
    fn sources(&self) -> DebugSources {
        DebugSources {
            debug_log: debug_path(&self.debug),
            config: self.config.clone(),
            algod: self.algod.clone(),
            algod_token: self.algod_token.clone(),
            replay: self.replay.clone(),
        }
    }
}

/// Rewrites single-dash spellings of the long flags (`-addr x`, `-addr=x`) to
/// their `--` form. Flag values and everything after `--` pass through as is.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut expects_value = false;
    let mut options_ended = false;

    for arg in args.into_iter().map(Into::into) {
        if expects_value || options_ended {
            expects_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        if text == "--" {
            options_ended = true;
            normalized.push(arg);
            continue;
        }

        let name = text
            .strip_prefix("--")
            .or_else(|| text.strip_prefix('-'))
            .map(|flag| flag.split_once('=').map_or((flag, false), |(name, _)| (name, true)));

        match name {
            Some((name, inline_value)) if LONG_FLAGS.contains(&name) => {
                expects_value = !inline_value;
                if text.starts_with("--") {
                    normalized.push(arg);
                } else {
                    normalized.push(OsString::from(format!("-{}", text)));
                }
            }
            _ => normalized.push(arg),
        }
    }

    normalized
}

fn debug_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn init_stderr_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
