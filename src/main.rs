mod cli;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();
    cli::init_tracing(cli.global.verbose);

    if let Err(e) = cli::run(cli) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code() as i32);
    }
}
