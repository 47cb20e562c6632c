use clap::Parser;

fn main() {
    if let Err(e) = teal_run::Cli::parse_from(teal_run::normalize_args(std::env::args_os())).run() {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }
}
