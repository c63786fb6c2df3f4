//! Remove command - delete a transformation.

use std::path::PathBuf;

use colored::Colorize;
use refinery::{DeleteMode, EngineConfig};

use super::Project;

pub fn run(
    file: PathBuf,
    id: String,
    hard: bool,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;
    let mode = if hard { DeleteMode::Hard } else { DeleteMode::Soft };
    let removed = project.sequencer.delete(&id, mode)?;
    project.save()?;

    let verb = if hard { "Removed" } else { "Marked deleted" };
    println!(
        "{} {} from {}",
        verb.green().bold(),
        removed.expression.white().bold(),
        removed.target_column
    );

    Ok(())
}
