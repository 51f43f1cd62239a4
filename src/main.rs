use clap::Parser;
use sortdir::cli::{self, Cli};
use sortdir::logging;
use sortdir::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = cli::run(cli) {
        OutputFormatter::error(&format!("Error: {}", e));
        std::process::exit(cli::exit_code(&e));
    }
}
