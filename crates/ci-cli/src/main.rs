//! causalimpact CLI

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use ci_core::SplitPolicy;
use ci_report::{Engine, EngineConfig, Report, ReportKind};
use ci_report::config::{ChartFormat, DuplicatePolicy};
use ci_viz_render::theme::BuiltinTheme;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "causalimpact")]
#[command(about = "Estimate the effect of an intervention on a time series")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a report against a data source
    Run {
        /// Local path, CSV export link or drive share link
        #[arg(short, long)]
        source: String,

        /// Report kind (see `causalimpact kinds`)
        #[arg(short, long, default_value = "causal_impact")]
        kind: String,

        /// Report title. Defaults to the kind's title.
        #[arg(short, long)]
        title: Option<String>,

        /// Engine config (YAML, or JSON by `.json` extension)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output document
        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// List report kinds (JSON)
    Kinds,

    /// Print version
    Version,
}

/// Flags applied over the config file and the kind's defaults.
#[derive(Args, Default)]
struct Overrides {
    /// Pre-period = first N records
    #[arg(long, conflicts_with = "split_ratio")]
    split_count: Option<usize>,

    /// Pre-period = first ceil(n * R) records, 0 < R < 1
    #[arg(long)]
    split_ratio: Option<f64>,

    /// Remote read timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Chart theme (causalimpact, minimal, print); replaces the config's viz section
    #[arg(long)]
    theme: Option<String>,

    /// Fail on duplicate timestamps instead of passing them through
    #[arg(long)]
    reject_duplicates: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// HTML page with the summary table and an inline chart
    Html,
    /// JSON document, chart as a data URI
    Json,
    /// Chart only, PNG
    Png,
    /// Chart only, SVG
    Svg,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let result = match cli.command {
        Commands::Run { source, kind, title, config, format, output, overrides } => cmd_run(
            &source,
            &kind,
            title.as_deref(),
            config.as_deref(),
            format,
            output.as_deref(),
            &overrides,
        ),
        Commands::Kinds => cmd_kinds(),
        Commands::Version => {
            println!("causalimpact {}", ci_core::VERSION);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ci_core::Error>() {
                Some(e) => eprintln!("{}: {e}", e.kind()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(
    source: &str,
    kind: &str,
    title: Option<&str>,
    config_path: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    overrides: &Overrides,
) -> Result<()> {
    let kind = ReportKind::from_tag(kind).ok_or_else(|| {
        let known: Vec<&str> = ReportKind::ALL.iter().map(|k| k.tag()).collect();
        anyhow::anyhow!("unknown report kind {kind:?} (known: {})", known.join(", "))
    })?;

    let base = match config_path {
        Some(p) => EngineConfig::from_path(p)?,
        None => EngineConfig::default(),
    };
    let mut config = kind.engine_config(&base);
    apply_overrides(&mut config, overrides, format)?;

    let engine = Engine::new(config)?;
    let title = title.unwrap_or(kind.default_title());
    tracing::info!(kind = %kind, source = %source, "running report");
    let report = engine.run(source, title)?;

    write_report(&report, format, output)
}

fn apply_overrides(config: &mut EngineConfig, o: &Overrides, format: OutputFormat) -> Result<()> {
    if let Some(name) = &o.theme {
        let theme = BuiltinTheme::parse(name)
            .ok_or_else(|| ci_core::Error::InvalidConfig(format!("unknown theme {name:?}")))?;
        config.viz = theme.base_config();
    }
    if let Some(k) = o.split_count {
        config.split = SplitPolicy::FixedCount(k);
    }
    if let Some(r) = o.split_ratio {
        config.split = SplitPolicy::Proportional(r);
    }
    if let Some(t) = o.timeout_secs {
        config.source.timeout_secs = t;
    }
    if o.reject_duplicates {
        config.source.duplicates = DuplicatePolicy::Reject;
    }
    match format {
        OutputFormat::Png => config.viz.output.format = ChartFormat::Png,
        OutputFormat::Svg => config.viz.output.format = ChartFormat::Svg,
        OutputFormat::Html | OutputFormat::Json => {}
    }
    Ok(())
}

fn write_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let bytes = match format {
        OutputFormat::Html => report.to_html().into_bytes(),
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(&report.to_json())?;
            s.push('\n');
            s.into_bytes()
        }
        OutputFormat::Png | OutputFormat::Svg => report.chart.bytes.clone(),
    };
    match output {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?
        }
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

fn cmd_kinds() -> Result<()> {
    let kinds: Vec<serde_json::Value> = ReportKind::ALL
        .iter()
        .map(|k| {
            serde_json::json!({
                "tag": k.tag(),
                "title": k.default_title(),
                "description": k.description(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&kinds)?);
    Ok(())
}
