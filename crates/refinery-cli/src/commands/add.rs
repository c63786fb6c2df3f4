//! Add command - attach a transformation to a column.

use std::path::PathBuf;

use colored::Colorize;
use refinery::{EngineConfig, NewTransformation, TransformationStatus};

use super::{Project, describe};

pub fn run(
    file: PathBuf,
    column: String,
    expression: String,
    into: Option<String>,
    draft: bool,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;
    project.require_column(&column)?;

    let mut request = NewTransformation::new(&project.dataset.id, &column, &expression);
    if let Some(name) = into {
        request = request.into_column(name);
    }
    if draft {
        request = request.with_status(TransformationStatus::Draft);
    }

    let created = project.sequencer.create(request)?;
    project.save()?;

    println!("{} {}", "Added".green().bold(), describe(&created));
    println!("Saved to {}", project.ledger_path.display().to_string().cyan());

    Ok(())
}
