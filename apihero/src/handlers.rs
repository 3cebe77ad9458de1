use anyhow::{Context, Result};
use apihero_core::export::DEFAULT_EXPORT_FILE;
use apihero_core::{
    BuildReport, EndpointExport, ExportFormat, IndexStore, Prefix, RawRecord, RecordSource,
    SiteIndex, Snapshot, open_source,
};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const NO_ENDPOINTS: &str = "No endpoints found.";
pub const NOTHING_TO_EXPORT: &str = "No endpoints with requests to export.";

// Helper functions for the handlers

/// Expand `~` in a user supplied path
pub fn resolve_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Parse `--prefix` values, warning about ones that name no host
pub fn parse_prefixes(values: &[String]) -> Vec<Prefix> {
    values
        .iter()
        .filter_map(|value| {
            let prefix = Prefix::parse(value);
            if prefix.is_none() {
                warn!("Ignoring prefix without a host: {:?}", value);
                eprintln!("⚠️  Skipping invalid prefix '{}'", value);
            }
            prefix
        })
        .collect()
}

/// Records under the given prefixes, or under every host when none are given
pub fn select_records<'a>(index: &'a SiteIndex, prefixes: &[Prefix]) -> Vec<&'a RawRecord> {
    if prefixes.is_empty() {
        let all_hosts: Vec<Prefix> = index
            .hosts()
            .map(|host| Prefix::new(host.label(), Vec::new()))
            .collect();
        return index.query(&all_hosts);
    }
    index.query(prefixes)
}

fn prefix_values(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("prefix")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Build the site map for `source_path` off the main thread, with a spinner
/// unless `quiet` is set.
///
/// An unavailable source is reported as a warning and leaves the empty index
/// in place, so commands still run and show an empty selection.
pub async fn load_snapshot(source_path: &Path, quiet: bool) -> Result<Arc<Snapshot>> {
    let label = source_path.display().to_string();
    load_snapshot_from(open_source(source_path), &label, quiet).await
}

pub async fn load_snapshot_from(
    source: Box<dyn RecordSource>,
    label: &str,
    quiet: bool,
) -> Result<Arc<Snapshot>> {
    let store = Arc::new(IndexStore::new());

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("invalid spinner template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Indexing {}...", label));
        Some(pb)
    };

    let joined = store.spawn_rebuild(source).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match joined.context("index build task failed")? {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => {
            eprintln!(
                "{} Failed to load captured requests from {}: {}",
                "⚠".yellow().bold(),
                label,
                e
            );
            Ok(store.snapshot())
        }
    }
}

pub fn format_build_summary(report: &BuildReport) -> String {
    let mut summary = format!(
        "{} Indexed {} requests across {} hosts",
        "✓".green().bold(),
        report.indexed,
        report.hosts
    );
    if report.skipped_count() > 0 {
        summary.push_str(&format!(
            "\n{} Skipped {} malformed entries",
            "⚠".yellow().bold(),
            report.skipped_count()
        ));
    }
    summary
}

pub fn format_records(records: &[&RawRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let marker = if record.has_body { "" } else { "  (no request body)" };
        out.push_str(&format!("{:<7} {}{}\n", record.method, record.url, marker));
    }
    out
}

// Command handlers

pub fn handle_tree(args: &ArgMatches, snapshot: &Snapshot, quiet: bool) -> Result<()> {
    if !quiet {
        println!("{}", format_build_summary(snapshot.report()));
        println!();
    }
    print!("{}", snapshot.index().render_tree());

    if args.get_flag("report") {
        println!();
        println!("{}", serde_json::to_string_pretty(snapshot.report())?);
    }
    Ok(())
}

pub fn handle_query(args: &ArgMatches, snapshot: &Snapshot) -> Result<()> {
    let prefixes = parse_prefixes(&prefix_values(args));
    let records = snapshot.index().query(&prefixes);

    if records.is_empty() {
        println!("{}", NO_ENDPOINTS);
        return Ok(());
    }

    print!("{}", format_records(&records));
    Ok(())
}

pub fn handle_preview(args: &ArgMatches, snapshot: &Snapshot) -> Result<()> {
    let prefixes = parse_prefixes(&prefix_values(args));
    let export = EndpointExport::from_records(select_records(snapshot.index(), &prefixes));

    if export.is_empty() {
        println!("{}", NO_ENDPOINTS);
        return Ok(());
    }

    println!("{}", export.preview());
    Ok(())
}

pub fn handle_export(args: &ArgMatches, snapshot: &Snapshot) -> Result<()> {
    let prefixes = parse_prefixes(&prefix_values(args));
    let export = EndpointExport::from_records(select_records(snapshot.index(), &prefixes));

    if export.is_empty() {
        println!("{}", NOTHING_TO_EXPORT);
        return Ok(());
    }

    let output = args
        .get_one::<String>("output")
        .map(|raw| resolve_path(raw))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    let format = args
        .get_one::<String>("format")
        .and_then(|raw| ExportFormat::from_str(raw))
        .unwrap_or(ExportFormat::Csv);

    export
        .save(&output, format)
        .with_context(|| format!("Export failed: {}", output.display()))?;

    println!(
        "{} Exported {} endpoints to {}",
        "✓".green().bold(),
        export.len(),
        output.display().to_string().bright_white()
    );
    Ok(())
}
