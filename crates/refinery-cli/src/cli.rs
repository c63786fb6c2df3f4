//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Refinery: non-destructive column transformations for tabular data
#[derive(Parser)]
#[command(name = "refinery")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the function catalog
    Functions {
        /// Only show one category (string, math, date, utility, transform)
        #[arg(short, long)]
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview a transformation on sample values from a column
    Preview {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target column
        #[arg(short, long)]
        column: String,

        /// Expression, e.g. 'LEFT(name, 3)'
        #[arg(value_name = "EXPRESSION")]
        expression: String,

        /// Ignore the column's committed chain
        #[arg(long)]
        standalone: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Attach a transformation to a column
    Add {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target column
        #[arg(short, long)]
        column: String,

        /// Expression, e.g. 'UPPERCASE(name)'
        #[arg(value_name = "EXPRESSION")]
        expression: String,

        /// Write the result into a new column instead of overwriting
        #[arg(long, value_name = "NAME")]
        into: Option<String>,

        /// Save as a draft that is not part of the chain
        #[arg(long)]
        draft: bool,
    },

    /// List transformations attached to a data file
    List {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only show one column
        #[arg(short, long)]
        column: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the order of a column's chain
    Reorder {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target column
        #[arg(short, long)]
        column: String,

        /// Every active transformation id of the column, in the new order
        #[arg(value_name = "ID", required = true)]
        ids: Vec<String>,
    },

    /// Delete a transformation
    Remove {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Transformation id
        #[arg(value_name = "ID")]
        id: String,

        /// Remove the record instead of marking it deleted
        #[arg(long)]
        hard: bool,
    },

    /// Remove duplicate transformations, keeping the earliest in each chain
    Cleanup {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Apply every chain and export the derived data
    Apply {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (default: <file>.derived.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "tsv")]
        format: OutputFormat,
    },

    /// Serve the engine over HTTP
    Serve {
        /// Data files to load (CSV/TSV)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Port for the server
        #[arg(short, long, default_value = "3141")]
        port: u16,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use tsv, csv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "refinery", "add", "people.csv", "-c", "name", "TRIM(name)", "--into", "clean",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                column, expression, into, draft, ..
            } => {
                assert_eq!(column, "name");
                assert_eq!(expression, "TRIM(name)");
                assert_eq!(into.as_deref(), Some("clean"));
                assert!(!draft);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_cli_reorder_requires_ids() {
        assert!(Cli::try_parse_from(["refinery", "reorder", "people.csv", "-c", "name"]).is_err());
    }
}
