//! Apply command - run every chain and export the derived data.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use colored::Colorize;
use refinery::dataset::write_delimited;
use refinery::{EngineConfig, Row};

use super::Project;
use crate::cli::OutputFormat;

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    config: EngineConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(&file, config)?;

    let live: Vec<_> = project
        .sequencer
        .list(&project.dataset.id)?
        .into_iter()
        .filter(|t| t.is_live())
        .collect();

    if live.is_empty() {
        println!(
            "{} No active transformations; exporting the data unchanged.",
            "Warning:".yellow().bold()
        );
    } else {
        println!(
            "{} {} transformations",
            "Applying".cyan().bold(),
            live.len().to_string().white().bold()
        );
        if verbose {
            for t in &live {
                println!("  {}", super::describe(t));
            }
        }
    }

    let rows = project.sequencer.apply_dataset(&project.dataset)?;
    let columns = output_columns(&project.dataset.column_names(), &rows);

    let output_path = output.unwrap_or_else(|| default_output(&file, &format));
    let writer = BufWriter::new(File::create(&output_path)?);
    match format {
        OutputFormat::Tsv => write_delimited(writer, &columns, &rows, b'\t')?,
        OutputFormat::Csv => write_delimited(writer, &columns, &rows, b',')?,
        OutputFormat::Json => serde_json::to_writer_pretty(writer, &rows)?,
    }

    println!(
        "{} {} rows to {}",
        "Wrote".green().bold(),
        rows.len(),
        output_path.display().to_string().cyan()
    );

    Ok(())
}

/// `<stem>.derived.<ext>` next to the data file.
fn default_output(file: &Path, format: &OutputFormat) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{}.derived.{}", stem, format.extension()))
}

/// Source columns followed by any columns the chains added.
fn output_columns(source: &[&str], rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = source.iter().map(|c| c.to_string()).collect();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use refinery::Value;

    #[test]
    fn test_default_output() {
        let path = default_output(Path::new("/data/people.tsv"), &OutputFormat::Csv);
        assert_eq!(path, PathBuf::from("/data/people.derived.csv"));
    }

    #[test]
    fn test_output_columns_appends_new() {
        let rows = vec![Row::from([
            ("name".to_string(), Value::text("ADA")),
            ("initial".to_string(), Value::text("A")),
        ])];
        let columns = output_columns(&["name"], &rows);
        assert_eq!(columns, vec!["name", "initial"]);
    }
}
