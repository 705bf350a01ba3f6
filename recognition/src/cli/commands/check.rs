use colored::Colorize;

use crate::cli::OutputFormat;
use crate::rules::json_store::JsonRuleStore;
use crate::rules::{Dimension, RuleSet};

pub fn run(rules_path: &str, format: OutputFormat) -> Result<(), String> {
    let store = JsonRuleStore::new(rules_path);
    let file = store.load_file().map_err(|e| e.to_string())?;

    let mut report = Vec::new();
    for dimension in Dimension::ALL {
        let input = file.dimension(dimension).clone();
        let raw_categories = input.categories.iter().filter(|c| c.active).count();
        let raw_keywords = input.keywords.iter().filter(|k| k.active).count();
        let set = RuleSet::build(dimension, input);
        report.push((
            dimension,
            set.categories().len(),
            set.keywords().len(),
            raw_categories - set.categories().len(),
            raw_keywords - set.keywords().len(),
        ));
    }

    if format == OutputFormat::Json {
        let json: Vec<_> = report
            .iter()
            .map(|(dimension, categories, keywords, dropped_categories, dropped_keywords)| {
                serde_json::json!({
                    "dimension": dimension,
                    "categories": categories,
                    "keywords": keywords,
                    "dropped_categories": dropped_categories,
                    "dropped_keywords": dropped_keywords,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json).expect("failed to serialize JSON output")
        );
        return Ok(());
    }

    println!("{} {}", "Rule file:".bold(), rules_path);
    for (dimension, categories, keywords, dropped_categories, dropped_keywords) in report {
        println!(
            "  {} {} categories, {} keywords{}",
            format!("{dimension}:").bold(),
            categories.to_string().cyan(),
            keywords.to_string().cyan(),
            if dropped_categories + dropped_keywords > 0 {
                format!(" ({} row(s) dropped)", dropped_categories + dropped_keywords).dimmed().to_string()
            } else {
                String::new()
            }
        );
    }

    Ok(())
}
