//! Refinery CLI - attach, preview and apply column transformations.

mod cli;
mod commands;
mod logging;
mod server;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Functions { category, json } => commands::functions::run(category, json),

        Commands::Preview {
            file,
            column,
            expression,
            standalone,
            json,
        } => commands::preview::run(file, column, expression, standalone, json, config),

        Commands::Add {
            file,
            column,
            expression,
            into,
            draft,
        } => commands::add::run(file, column, expression, into, draft, config),

        Commands::List { file, column, json } => commands::list::run(file, column, json, config),

        Commands::Reorder { file, column, ids } => commands::reorder::run(file, column, ids, config),

        Commands::Remove { file, id, hard } => commands::remove::run(file, id, hard, config),

        Commands::Cleanup { file } => commands::cleanup::run(file, config),

        Commands::Apply {
            file,
            output,
            format,
        } => commands::apply::run(file, output, format, config, cli.verbose),

        Commands::Serve { files, port } => commands::serve::run(files, port, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
