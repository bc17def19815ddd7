use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::importer::{ImportSummary, TypeStatus};

const RULE_WIDTH: usize = 60;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn print_banner(title: &str) {
    println!("{}", rule());
    println!("{}", title.bold());
    println!("{}", rule());
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Per-resource failure line, indented under the file being processed.
pub fn print_item_failure(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

pub fn print_item_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

pub fn print_item_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

pub fn print_summary(summary: &ImportSummary) {
    println!();
    print_banner("Import Completed - Statistics");
    println!("Total: {} resources", summary.stats.total);
    println!("Success: {}", summary.stats.success.to_string().green());
    println!("Failed: {}", summary.stats.failed.to_string().red());
    if summary.stats.skipped > 0 {
        println!("Skipped: {} resource types", summary.stats.skipped);
    }
    println!(
        "Dependencies: {}/{} created",
        summary.dependencies.success,
        summary.dependencies.attempted()
    );
    println!("{}", rule());

    if !summary.types.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["ResourceType", "Success", "Failed", "Status"]);
        for t in &summary.types {
            let status = match t.status {
                TypeStatus::Imported => "imported",
                TypeStatus::Empty => "no resources",
                TypeStatus::Skipped => "skipped (file missing)",
            };
            builder.push_record([
                t.resource_type.clone(),
                t.success.to_string(),
                t.failed.to_string(),
                status.to_string(),
            ]);
        }
        let table = builder.build().with(Style::rounded()).to_string();
        println!("{table}");
    }

    println!();
    if summary.stats.failed > 0 {
        print_warning("Some resources failed to import, please check error messages");
    } else {
        print_success("All resources imported successfully!");
    }
}
