//! Swiftcheck CLI entry point.

use clap::Parser;
use swiftcheck::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let run = match cli.command {
        Commands::Lint(args) => cli::run_lint(&args),
        Commands::Deps(args) => cli::run_deps(&args),
        Commands::Parse(args) => cli::run_parse(&args),
        Commands::Build(args) => cli::run_build(&args),
        Commands::MacroCheck(args) => cli::run_macro_check(&args),
        Commands::Route(args) => cli::run_route(&args),
    };

    let exit_code = match run {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
