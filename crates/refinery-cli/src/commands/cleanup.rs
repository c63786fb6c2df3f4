//! Cleanup command - remove duplicate transformations.

use std::path::PathBuf;

use colored::Colorize;
use refinery::EngineConfig;

use super::Project;

pub fn run(file: PathBuf, config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;
    let removed = project.sequencer.cleanup(&project.dataset.id)?;

    if removed == 0 {
        println!("{} No duplicates found.", "Clean:".green().bold());
        return Ok(());
    }

    project.save()?;
    println!(
        "{} {} duplicate transformation{}",
        "Removed".green().bold(),
        removed.to_string().white().bold(),
        if removed == 1 { "" } else { "s" }
    );

    Ok(())
}
