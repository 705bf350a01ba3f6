use std::fs;
use std::io::Read;

use colored::Colorize;

use crate::cli::OutputFormat;
use crate::engine::{summarize, CategoryUsage};

pub fn run(
    rules_path: &str,
    input: &str,
    summary: bool,
    format: OutputFormat,
) -> Result<(), String> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| e.to_string())?;
        buffer
    } else {
        fs::read_to_string(input).map_err(|e| format!("{input}: {e}"))?
    };

    let items: Vec<(String, Option<i64>)> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| (line.to_owned(), Some(index as i64 + 1)))
        .collect();

    if items.is_empty() {
        if format == OutputFormat::Json {
            println!("[]");
        } else {
            println!("No descriptions to analyze");
        }
        return Ok(());
    }

    let descriptions: Vec<String> = items.iter().map(|(text, _)| text.clone()).collect();

    let engine = super::build_engine(rules_path, None)?;
    let rt = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    let results = rt
        .block_on(engine.analyze_batch(items))
        .map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&results)
                    .expect("failed to serialize JSON output")
            );
        }
        OutputFormat::Text => {
            for (description, result) in descriptions.iter().zip(results.iter()) {
                super::analyze::print_result(description, result);
                println!();
            }

            if summary {
                print_summary(&summarize(&results));
            }
        }
    }

    Ok(())
}

fn print_summary(usages: &[CategoryUsage]) {
    if usages.is_empty() {
        println!("{}", "No categories detected across the batch".dimmed());
        return;
    }
    println!("{}", "Category usage:".bold());
    for usage in usages {
        println!(
            "  {} {} {} {}",
            usage.category_name.cyan(),
            format!("[{}]", usage.dimension).dimmed(),
            format!("x{}", usage.occurrences),
            format!("avg {:.1}%", usage.mean_confidence).green()
        );
    }
}
