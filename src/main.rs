use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use reclaim::cleaner::{DeletionExecutor, DeletionReport, SelectionFilter, SelectionManager};
use reclaim::cli::args::{Cli, Commands, ConfigAction, OutputFormat, ScanArgs};
use reclaim::cli::output;
use reclaim::common::config::Config;
use reclaim::common::format;
use reclaim::scanner::model::{RiskLevel, ScanResult};
use reclaim::scanner::roots::{self, ScanMode};
use reclaim::scanner::{progress, ScanEngine};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("reclaim=debug")
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Scan { ref scan, detailed } => cmd_scan(&cli, scan, detailed),
        Commands::Clean {
            ref scan,
            ref categories,
            max_risk,
            dry_run,
            yes,
        } => cmd_clean(&cli, scan, categories, max_risk, dry_run, yes),
        Commands::Config { ref action } => cmd_config(action),
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(cli: &Cli, args: &ScanArgs, detailed: bool) -> Result<()> {
    let config = Config::load()?;
    let result = run_scan(cli, &config, args)?;

    match cli.output_format() {
        OutputFormat::Human => output::print_scan_results(&result, detailed),
        OutputFormat::Json => output::print_scan_json(&result),
        OutputFormat::Quiet => output::print_scan_quiet(&result),
    }

    Ok(())
}

/// Run one scan with command-line overrides applied on top of the config
fn run_scan(cli: &Cli, config: &Config, args: &ScanArgs) -> Result<ScanResult> {
    let mut config = config.clone();
    if let Some(mb) = args.threshold_mb {
        config.scan_threshold_mb = mb;
        config = config.normalized();
    }
    config.exclude_paths.extend(args.excludes.iter().cloned());

    let mode = if args.deep {
        ScanMode::Deep
    } else {
        config.default_mode
    };
    let scan_roots = if args.roots.is_empty() {
        roots::roots_for(mode)
    } else {
        args.roots.clone()
    };

    let scan_config = config.scan_config(mode);
    if cli.output_format() != OutputFormat::Human {
        return Ok(ScanEngine::new(scan_config).scan(&scan_roots)?);
    }

    let (tx, rx) = progress::channel();
    let engine = ScanEngine::new(scan_config).with_progress(tx);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(format!("Scanning {} location(s)...", scan_roots.len()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = std::thread::scope(|s| {
        let handle = s.spawn(|| engine.scan(&scan_roots));
        while !handle.is_finished() {
            if let Ok(snapshot) = rx.recv_timeout(Duration::from_millis(100)) {
                pb.set_message(format!(
                    "{} found in {} ({} examined)  {}",
                    format::format_size(snapshot.bytes_found),
                    format::format_count(snapshot.candidates as usize),
                    snapshot.files_examined,
                    format::truncate(&format::format_path(&snapshot.current_root), 40).dimmed()
                ));
            }
        }
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("Scan thread panicked"))
    })?;
    pb.finish_and_clear();

    Ok(result?)
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    cli: &Cli,
    args: &ScanArgs,
    categories: &[String],
    max_risk: Option<RiskLevel>,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let config = Config::load()?;
    let result = run_scan(cli, &config, args)?;
    let human = cli.output_format() == OutputFormat::Human;

    let mut selection = SelectionManager::new(result);
    if categories.is_empty() {
        match max_risk {
            Some(risk) => selection.select_all(&SelectionFilter::all().with_max_risk(risk)),
            None => selection.select_defaults(),
        };
    } else {
        for category in categories {
            let filter = SelectionFilter::category(category.as_str())
                .with_max_risk(max_risk.unwrap_or(RiskLevel::Low));
            selection.select_all(&filter);
        }
    }

    if selection.selected_count() == 0 {
        if human {
            println!("  {} Nothing to clean!", "✨");
        }
        return Ok(());
    }

    if human {
        output::print_scan_results(selection.result(), false);
        output::print_selection(&selection, config.quota());
    }

    let mut executor =
        DeletionExecutor::new(config.quota()).with_concurrency(config.max_concurrency);

    if dry_run {
        let report = executor.preview(&selection)?;
        emit_report(cli, &report, &selection)?;
        return Ok(());
    }

    // Confirm unless --yes. Prompts go to stderr; stdout carries only the report
    if !yes {
        eprint!(
            "\n  {} PERMANENTLY DELETE {} ({})? [y/N] ",
            "❓",
            format::format_count(selection.selected_count()),
            format::format_size(selection.selected_bytes())
        );
        use std::io::Write;
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("  {} Cancelled", "✗".red());
            return Ok(());
        }
    }

    let report = executor
        .delete(&mut selection)
        .context("Deletion was not started")?;
    emit_report(cli, &report, &selection)
}

fn emit_report(cli: &Cli, report: &DeletionReport, selection: &SelectionManager) -> Result<()> {
    match cli.output_format() {
        OutputFormat::Human => output::print_deletion_report(report, selection),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Quiet => println!(
            "{}  {}  {}",
            report.deleted_count,
            format::format_size(report.deleted_bytes),
            report.skipped.len()
        ),
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
    }
}
