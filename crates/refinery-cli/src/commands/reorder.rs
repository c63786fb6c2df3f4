//! Reorder command - set the order of a column's chain.

use std::path::PathBuf;

use colored::Colorize;
use refinery::EngineConfig;

use super::{Project, describe};

pub fn run(
    file: PathBuf,
    column: String,
    ids: Vec<String>,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;
    let chain = project.sequencer.reorder(&project.dataset.id, &column, &ids)?;
    project.save()?;

    println!("{} {}", "Reordered".green().bold(), column.white().bold());
    for t in &chain {
        println!("  {}", describe(t));
    }

    Ok(())
}
