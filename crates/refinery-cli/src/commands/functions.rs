//! Functions command - list the function catalog.

use colored::Colorize;
use refinery::FunctionType;
use refinery::functions::{FunctionKind, catalog};

pub fn run(category: Option<String>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter: Option<FunctionType> = category
        .map(|c| serde_json::from_value(serde_json::Value::String(c.to_lowercase())))
        .transpose()
        .map_err(|_| "Unknown category. Use string, math, date, utility, or transform.")?;

    let specs: Vec<_> = catalog()
        .iter()
        .filter(|spec| filter.is_none_or(|f| spec.category == f))
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let mut current = None;
    for spec in specs {
        if current != Some(spec.category) {
            if current.is_some() {
                println!();
            }
            println!("{}", spec.category.label().to_uppercase().yellow().bold());
            current = Some(spec.category);
        }

        let params: Vec<String> = spec
            .params
            .iter()
            .map(|p| match p.default {
                Some(default) => format!("{}={:?}", p.name, default),
                None => p.name.to_string(),
            })
            .chain(spec.variadic.then(|| "...".to_string()))
            .collect();

        let mut tags = Vec::new();
        if spec.kind == FunctionKind::Aggregate {
            tags.push("column");
        }
        if !spec.deterministic {
            tags.push("random");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };

        println!(
            "  {}({}){}  {}",
            spec.name.cyan().bold(),
            params.join(", "),
            tags.magenta(),
            spec.description.dimmed()
        );
    }

    Ok(())
}
