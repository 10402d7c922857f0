use colored::*;

use crate::cleaner::{DeletionReport, Quota, SelectionManager};
use crate::common::format::{self, format_path, format_risk, format_size, format_size_colored};
use crate::scanner::model::{ProblemFile, RiskLevel, ScanResult};
use crate::viz::breakdown;

/// Print scan results in human-readable format
pub fn print_scan_results(result: &ScanResult, detailed: bool) {
    println!();
    println!("{}  reclaim Scan Results", "🧹");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} found  •  {}",
        format::format_duration(result.duration_secs()).cyan(),
        format_size_colored(result.total_bytes()),
        format::format_count(result.total_count()).dimmed()
    );
    if result.is_cancelled() {
        println!("  {} Scan was cancelled; results are partial", "⚠".yellow());
    }
    println!("{}", "─".repeat(60).dimmed());
    println!();

    for failure in result.root_failures() {
        println!(
            "  {} Could not scan {}: {}",
            "✗".red(),
            format_path(&failure.path),
            failure.reason.dimmed()
        );
    }

    if result.is_empty() {
        println!("  {} Nothing above the size threshold.", "✨");
        println!();
        return;
    }

    breakdown::print_breakdown(result.buckets(), result.total_bytes());

    for (risk, label) in [
        (RiskLevel::Low, "Low Risk: Safe to Remove"),
        (RiskLevel::Medium, "Medium Risk: Review Recommended"),
        (RiskLevel::High, "High Risk: Possibly In Use"),
    ] {
        let files = result.files_by_risk(risk);
        if files.is_empty() {
            continue;
        }
        let total: u64 = files.iter().map(|f| f.size()).sum();
        let dot = match risk {
            RiskLevel::Low => "●".green(),
            RiskLevel::Medium => "●".yellow(),
            RiskLevel::High => "●".red(),
        };
        println!(
            "  {} {} ({}, {})",
            dot,
            label.bold(),
            format_size_colored(total),
            format::format_count(files.len())
        );
        if detailed {
            println!();
            for file in &files {
                print_file(file);
            }
        }
        println!();
    }

    if result.skipped() > 0 {
        println!(
            "  {} {} paths could not be read and were skipped",
            "⚠".yellow(),
            result.skipped()
        );
        println!();
    }

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} Run {} to remove low-risk files",
        "💡",
        "reclaim clean".cyan()
    );
    println!();
}

fn print_file(file: &ProblemFile) {
    println!(
        "    {:<48} {:>10}  {:<20} {}",
        format::truncate(&format_path(file.path()), 48),
        format_size(file.size()),
        file.category().dimmed(),
        file.modified_at().format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
}

/// Print scan results as JSON
pub fn print_scan_json(result: &ScanResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// Print a minimal summary
pub fn print_scan_quiet(result: &ScanResult) {
    println!(
        "{}  {}  {}",
        format_size(result.total_bytes()),
        result.total_count(),
        result.skipped()
    );
}

/// Print what is about to be deleted
pub fn print_selection(selection: &SelectionManager, quota: Quota) {
    let files = selection.current_selection();
    println!(
        "  {} Selected {} ({})",
        "☑",
        format::format_count(files.len()).cyan(),
        format_size_colored(selection.selected_bytes())
    );
    for file in files.iter().take(15) {
        println!(
            "    {} {} {}",
            format_risk(file.risk()),
            format::truncate(&format_path(file.path()), 60),
            format_size(file.size()).dimmed()
        );
    }
    if files.len() > 15 {
        println!("    ... and {} more", (files.len() - 15).to_string().dimmed());
    }
    if let Quota::Limited(cap) = quota {
        println!(
            "  {} Trial mode: up to {} may be deleted per session",
            "ℹ️",
            format_size(cap)
        );
    }
    println!();
}

/// Print a deletion report
pub fn print_deletion_report(report: &DeletionReport, selection: &SelectionManager) {
    println!();
    let (icon, label) = if report.dry_run {
        ("ℹ️", "Dry run")
    } else {
        ("🔥", "Deleted")
    };
    println!(
        "  {} {}: {} files, {}",
        icon,
        label.bold(),
        report.deleted_count.to_string().cyan(),
        format_size_colored(report.deleted_bytes),
    );

    if report.cancelled {
        println!(
            "  {} Cancelled; {} file(s) left selected",
            "⚠".yellow(),
            selection.selected_count()
        );
    }

    if !report.skipped.is_empty() {
        println!();
        println!("  {} {} skipped:", "⚠".yellow(), report.skipped.len());
        for (i, (id, reason)) in report.skipped.iter().enumerate().take(10) {
            let path = selection
                .result()
                .get(*id)
                .map(|f| format_path(f.path()))
                .unwrap_or_else(|| id.to_string());
            println!(
                "    {} {} ({})",
                format!("{}.", i + 1).dimmed(),
                path.dimmed(),
                reason
            );
        }
        if report.skipped.len() > 10 {
            println!(
                "    ... and {} more",
                (report.skipped.len() - 10).to_string().dimmed()
            );
        }
    }
    println!();
}
