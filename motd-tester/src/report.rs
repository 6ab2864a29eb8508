use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use motd_engine::{MotdEngine, ReloadSummary, RenderResult, StatEntry};

use crate::simulate::ProbeRecord;

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub probes: usize,
    pub fallbacks: usize,
    pub plain_payloads: usize,
    pub elapsed_ms: u128,
    pub warnings: Vec<String>,
    pub by_reason: BTreeMap<String, usize>,
    pub by_dialect: BTreeMap<String, usize>,
    pub by_group: BTreeMap<String, usize>,
    pub picks: Vec<StatEntry>,
    pub sticky_sizes: BTreeMap<String, usize>,
    pub samples: Vec<ProbeRecord>,
}

impl SimulationReport {
    pub fn build(
        engine: &MotdEngine,
        summary: &ReloadSummary,
        records: Vec<ProbeRecord>,
        elapsed: Duration,
    ) -> Self {
        let mut by_reason = BTreeMap::new();
        let mut by_dialect = BTreeMap::new();
        let mut by_group = BTreeMap::new();
        for record in &records {
            *by_reason.entry(label(&record.reason)).or_insert(0) += 1;
            *by_dialect.entry(label(&record.dialect)).or_insert(0) += 1;
            *by_group.entry(record.group_id.clone()).or_insert(0) += 1;
        }

        Self {
            probes: records.len(),
            fallbacks: records.iter().filter(|record| record.fallback_used).count(),
            plain_payloads: records.iter().filter(|record| !record.rich_payload).count(),
            elapsed_ms: elapsed.as_millis(),
            warnings: summary.warnings.clone(),
            by_reason,
            by_dialect,
            by_group,
            picks: engine.stats(),
            sticky_sizes: engine.sticky_sizes().into_iter().collect(),
            samples: records.into_iter().take(10).collect(),
        }
    }
}

/// Serialized name of a unit enum variant (`sticky_hit`, `tag_markup`, ...).
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn print_console(report: &SimulationReport, verbose: bool) {
    println!();
    println!("{}", "📊 Simulation Summary".bright_cyan().bold());
    println!("{}", "=====================".cyan());
    println!("Probes: {}", report.probes);
    println!("Time: {} ms", report.elapsed_ms);
    if report.fallbacks == 0 {
        println!("Fallback renders: {}", "0".green());
    } else {
        println!("Fallback renders: {}", report.fallbacks.to_string().red());
    }
    println!("Plain-text payloads: {}", report.plain_payloads);
    println!();

    print_table("Profiles", &report.by_group);
    print_table("Reasons", &report.by_reason);
    print_table("Dialects", &report.by_dialect);
    print_table("Sticky entries", &report.sticky_sizes);

    println!("{}", "Preset picks".bold());
    for entry in &report.picks {
        println!(
            "   {:>8}  {}/{}",
            entry.count,
            entry.group_id.dimmed(),
            entry.variant_id
        );
    }

    if verbose {
        println!();
        println!("{}", "Sample renders".bold());
        for sample in &report.samples {
            let marker = if sample.fallback_used {
                "⚠️ ".to_string()
            } else {
                "✅".to_string()
            };
            println!(
                "{marker} {} -> {}/{} frame {} [{}/{}] {}",
                sample.origin,
                sample.group_id,
                sample.variant_id,
                sample.frame,
                sample.online,
                sample.max,
                sample.first_line.italic()
            );
        }
    }
}

fn print_table(title: &str, rows: &BTreeMap<String, usize>) {
    println!("{}", title.bold());
    for (key, count) in rows {
        println!("   {count:>8}  {key}");
    }
    println!();
}

pub fn print_preview(result: &RenderResult, verbose: bool) {
    println!("{}", "🔍 Preview".bright_blue().bold());
    println!(
        "Profile {} / preset {} ({}, frame {})",
        result.group_id.bold(),
        result.variant_id.bold(),
        label(&result.reason),
        result.frame.index()
    );
    for line in &result.lines {
        println!("   {line}");
    }
    let dialect = label(&result.dialect);
    if result.fallback_used {
        println!("Parsed as: {} (fallback)", dialect.red());
    } else {
        println!("Parsed as: {}", dialect.green());
    }
    println!(
        "Players: {}/{}{}",
        result.counts.display_online,
        result.counts.display_max,
        if result.counts.hidden { " (hidden)" } else { "" }
    );
    if let Some(icon) = &result.icon {
        println!("Icon: {icon}");
    }
    if verbose {
        println!("{}", result.rich.to_component());
    }
}
