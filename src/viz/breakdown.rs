use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::format;
use crate::scanner::model::ProblemFile;

/// One slice of the scanned total, grouped by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpaceItem {
    pub name: String,
    pub size: u64,
    pub file_count: usize,
    /// Share of the grand total, 0–100
    pub percentage: f64,
}

/// Bucket files by category, largest first.
///
/// Buckets with no files never appear. Percentages are computed against the
/// sum of all bucket sizes, so they add up to 100 whenever that sum is
/// non-zero; a set of zero-byte files yields 0% everywhere.
pub fn aggregate(files: &[ProblemFile]) -> Vec<DiskSpaceItem> {
    let mut by_category: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for file in files {
        let entry = by_category.entry(file.category()).or_insert((0, 0));
        entry.0 += file.size();
        entry.1 += 1;
    }

    let total: u64 = by_category.values().map(|(size, _)| size).sum();

    let mut items: Vec<DiskSpaceItem> = by_category
        .into_iter()
        .map(|(name, (size, file_count))| DiskSpaceItem {
            name: name.to_string(),
            size,
            file_count,
            percentage: if total == 0 {
                0.0
            } else {
                size as f64 / total as f64 * 100.0
            },
        })
        .collect();

    // BTreeMap order breaks ties, so the output is stable
    items.sort_by(|a, b| b.size.cmp(&a.size));
    items
}

/// Render the breakdown as horizontal bars
pub fn print_breakdown(items: &[DiskSpaceItem], total: u64) {
    if items.is_empty() {
        return;
    }

    println!("  {}", "Breakdown by category".bold());
    println!();
    for item in items {
        let icon = match item.name.as_str() {
            "Cache" => "📁",
            "Logs" => "📋",
            "Temporary" => "🗑️",
            "Application Support" => "🧩",
            _ => "📄",
        };
        println!(
            "    {} {:<22} {} {:>10} {:>6.1}%",
            icon,
            item.name,
            format::percentage_bar(item.percentage, 30),
            format::format_size(item.size),
            item.percentage
        );
    }
    println!();
    println!(
        "    {:<25} {:>41}",
        "Total".dimmed(),
        format::format_size_colored(total)
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::model::RiskLevel;
    use chrono::Utc;
    use std::path::PathBuf;

    fn file(category: &str, size: u64) -> ProblemFile {
        ProblemFile::new(
            PathBuf::from(format!("/x/{}/{}", category, size)),
            size,
            Utc::now(),
            category,
            RiskLevel::Medium,
        )
    }

    #[test]
    fn test_aggregate_sums_and_percentages() {
        let files = vec![
            file("Cache", 500),
            file("Cache", 250),
            file("Logs", 200),
            file("Other", 50),
        ];
        let items = aggregate(&files);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Cache");
        assert_eq!(items[0].size, 750);
        assert_eq!(items[0].file_count, 2);
        assert!((items[0].percentage - 75.0).abs() < 1e-9);

        let size_sum: u64 = items.iter().map(|i| i.size).sum();
        assert_eq!(size_sum, 1000);
        let pct_sum: f64 = items.iter().map(|i| i.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_aggregate_zero_byte_files() {
        let items = aggregate(&[file("Temporary", 0)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].percentage, 0.0);
    }

    #[test]
    fn test_aggregate_is_stable_on_ties() {
        let files = vec![file("Logs", 100), file("Cache", 100)];
        let first = aggregate(&files);
        let second = aggregate(&files);
        assert_eq!(first, second);
        assert_eq!(first[0].name, "Cache");
    }
}
