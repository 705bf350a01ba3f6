use colored::Colorize;

use crate::cli::OutputFormat;
use crate::engine::{AnalysisResult, DetectedCategory};

pub fn run(
    rules_path: &str,
    description: &str,
    source_id: Option<i64>,
    threshold: Option<f64>,
    format: OutputFormat,
) -> Result<(), String> {
    let engine = super::build_engine(rules_path, threshold)?;
    let result = engine
        .analyze(description, source_id)
        .map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .expect("failed to serialize JSON output")
            );
        }
        OutputFormat::Text => print_result(description, &result),
    }

    Ok(())
}

pub(crate) fn print_result(description: &str, result: &AnalysisResult) {
    println!("{} {}", "Description:".bold(), description);

    print_dimension("Parts", &result.parts_detected);
    print_dimension("Labor", &result.labor_detected);

    match result.overall_confidence {
        Some(confidence) => println!(
            "{} {} detection(s), {} overall",
            "Total:".bold(),
            result.total_detections,
            format!("{confidence:.1}%").cyan()
        ),
        None => println!("{} no categories detected", "Total:".bold()),
    }
}

fn print_dimension(label: &str, detected: &[DetectedCategory]) {
    if detected.is_empty() {
        println!("{} {}", format!("{label}:").bold(), "none".dimmed());
        return;
    }
    println!("{}", format!("{label}:").bold());
    for category in detected {
        println!(
            "  {} {} {}",
            category.category_name.cyan(),
            format!("({:.1}%)", category.confidence).green(),
            format!("via {}", category.matched_texts.join(", ")).dimmed()
        );
    }
}
