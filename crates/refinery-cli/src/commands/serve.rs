//! Serve command - expose the engine over HTTP.

use std::path::PathBuf;

use colored::Colorize;
use refinery::EngineConfig;

use crate::server::{AppState, run_server};

pub fn run(files: Vec<PathBuf>, port: u16, config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if files.is_empty() {
        return Err("At least one data file is required".into());
    }

    let state = AppState::open(&files, config)?;
    for (id, loaded) in state.datasets.iter() {
        println!(
            "{} {} ({} rows, {} columns)",
            "Loaded".green().bold(),
            id.white().bold(),
            loaded.dataset.row_count(),
            loaded.dataset.column_count()
        );
    }
    println!();
    println!(
        "Serving on {}",
        format!("http://127.0.0.1:{}", port).cyan().bold()
    );
    println!("Press {} to stop", "Ctrl+C".yellow());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(state, port))
}
