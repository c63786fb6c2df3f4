//! List command - show the chains attached to a data file.

use std::path::PathBuf;

use colored::Colorize;
use refinery::EngineConfig;

use super::{Project, describe};

pub fn run(
    file: PathBuf,
    column: Option<String>,
    json_output: bool,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;

    let all = project.sequencer.list(&project.dataset.id)?;
    let shown: Vec<_> = all
        .into_iter()
        .filter(|t| column.as_deref().is_none_or(|c| t.target_column == c))
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if shown.is_empty() {
        println!("{} No transformations.", "Note:".yellow());
        println!(
            "Run {} to add one.",
            format!("refinery add {} -c <column> '<EXPRESSION>'", file.display()).cyan()
        );
        return Ok(());
    }

    let mut current: Option<&str> = None;
    for t in &shown {
        if current != Some(t.target_column.as_str()) {
            if current.is_some() {
                println!();
            }
            println!("{}", t.target_column.yellow().bold());
            current = Some(&t.target_column);
        }
        println!("  {}", describe(t));
    }

    Ok(())
}
