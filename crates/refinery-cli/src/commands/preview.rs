//! Preview command - show before/after values for a candidate expression.

use std::path::PathBuf;

use colored::Colorize;
use refinery::{EngineConfig, PreviewRequest, Previewer};

use super::Project;

pub fn run(
    file: PathBuf,
    column: String,
    expression: String,
    standalone: bool,
    json_output: bool,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;
    project.require_column(&column)?;

    let request =
        PreviewRequest::new(&column, &expression).with_context(project.dataset.rows.clone());

    let previewer = Previewer::with_library(project.sequencer.library().clone());
    let preview = if standalone {
        previewer.preview(&request)
    } else {
        let chain = project.sequencer.pipeline(&project.dataset.id, &column)?;
        previewer.preview_on_chain(&chain, &request)
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!(
        "{} {} on {}",
        "Preview".cyan().bold(),
        expression.white().bold(),
        column.white()
    );
    if preview.function.as_deref().is_some_and(|f| project.sequencer.library().spec(f).is_none()) {
        println!(
            "{} Unknown function; values pass through unchanged.",
            "Note:".yellow()
        );
    }
    println!();

    for pair in &preview.pairs {
        let before = pair.before.to_text();
        let after = pair.after.to_text();
        if pair.is_changed() {
            println!("  {} {} {}", before.red(), "→".dimmed(), after.green());
        } else {
            println!("  {} {}", before.dimmed(), "(unchanged)".dimmed());
        }
    }

    println!();
    println!(
        "{} of {} values changed",
        preview.changed.to_string().white().bold(),
        preview.pairs.len()
    );
    if !preview.deterministic {
        println!(
            "{} Output is random and will differ when applied.",
            "Note:".yellow()
        );
    }

    Ok(())
}
