mod report;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use motd_engine::{JsonSource, MotdEngine};
use report::{SimulationReport, print_console, print_preview};
use simulate::{SimulationPlan, run_simulation};

const BUNDLED_SAMPLE: &str = include_str!("../assets/sample.json");

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Machine-readable JSON document
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "motd-tester", version = "0.1.0")]
#[command(about = "Fire simulated status probes at the MOTD engine and report what it renders")]
struct Args {
    /// Configuration JSON to load (defaults to the bundled sample)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of probes to simulate
    #[arg(long, default_value_t = 2_000)]
    probes: usize,

    /// Number of distinct origins the probes come from
    #[arg(long, default_value_t = 64)]
    origins: usize,

    /// Simulated milliseconds between consecutive probes
    #[arg(long, default_value_t = 25)]
    step_ms: u64,

    /// Virtual hosts to rotate through (comma-separated)
    #[arg(long, default_value = "")]
    hosts: String,

    /// Base online player count reported by the fake host
    #[arg(long, default_value_t = 12)]
    online: u32,

    /// Base max player count reported by the fake host
    #[arg(long, default_value_t = 100)]
    max: u32,

    /// Pretend the host cannot render rich text or hide counts
    #[arg(long)]
    plain_host: bool,

    /// Preview a profile or preset id instead of simulating
    #[arg(long)]
    preview: Option<String>,

    /// Exit with an error when any render fell back to plain text
    #[arg(long)]
    strict: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let engine = MotdEngine::default();
    let source = JsonSource::new(load_config_text(&args)?);
    let summary = engine
        .reload_from(&source)
        .context("configuration could not be loaded")?;

    if matches!(args.report, ReportFormat::Console) {
        announce_banner();
        println!(
            "Loaded {} profiles, {} presets ({} warnings)",
            summary.groups.to_string().bold(),
            summary.variants.to_string().bold(),
            summary.warnings.len().to_string().yellow()
        );
        for warning in &summary.warnings {
            eprintln!("⚠️  {}", warning.yellow());
        }
    }

    if let Some(target) = args.preview.as_deref() {
        let now_ms = simulate::wall_clock_ms();
        let Some(result) = engine.preview(target, Some("127.0.0.1"), now_ms) else {
            anyhow::bail!("no profile or preset named '{target}'");
        };
        print_preview(&result, args.verbose);
        return Ok(());
    }

    let plan = SimulationPlan {
        probes: args.probes,
        origins: args.origins.max(1),
        step_ms: args.step_ms,
        hosts: split_csv(&args.hosts),
        online: args.online,
        max: args.max,
        plain_host: args.plain_host,
        start_ms: simulate::wall_clock_ms(),
    };

    let started = Instant::now();
    let outcome = run_simulation(&engine, &plan);
    let report = SimulationReport::build(&engine, &summary, outcome, started.elapsed());

    write_report(&args, &report)?;

    if args.strict && report.fallbacks > 0 {
        anyhow::bail!("{} renders fell back to plain text", report.fallbacks);
    }
    Ok(())
}

fn load_config_text(args: &Args) -> Result<String> {
    match &args.config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(BUNDLED_SAMPLE.to_string()),
    }
}

fn announce_banner() {
    println!("{}", "📡 MOTD Probe Simulator".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn write_report(args: &Args, report: &SimulationReport) -> Result<()> {
    match args.report {
        ReportFormat::Console => {
            print_console(report, args.verbose);
            Ok(())
        }
        ReportFormat::Json => {
            let mut writer: Box<dyn Write> = match &args.output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                )),
                None => Box::new(BufWriter::new(stdout())),
            };
            serde_json::to_writer_pretty(&mut writer, report).context("failed to encode report")?;
            writeln!(writer)?;
            writer.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_tokens_are_trimmed() {
        assert_eq!(split_csv(" a.example, ,b.example "), vec!["a.example", "b.example"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn bundled_sample_loads_cleanly() {
        let engine = MotdEngine::default();
        let summary = engine
            .reload_from(&JsonSource::new(BUNDLED_SAMPLE))
            .expect("sample parses");
        assert_eq!(summary.groups, 3);
        assert!(
            summary
                .warnings
                .iter()
                .all(|warning| !warning.starts_with("Self-test")),
            "{:?}",
            summary.warnings
        );
    }
}
