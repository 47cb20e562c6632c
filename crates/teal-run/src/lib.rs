mod cli;

pub use cli::{Cli, CliError, normalize_args};
