//! Remote Test Parser CLI entry point.

use clap::Parser;

use remote_test_parser::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Discover(args) => {
            remote_test_parser::cli::commands::discover::execute(args, cli.json).await
        }
    };

    if let Err(err) = result {
        remote_test_parser::cli::handle_error(err, cli.json);
    }
}
