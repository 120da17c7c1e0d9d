use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use logweave_model::{
    DedupStrategy, Frame, LevelCounts, LogLevel, LogsModelBuilder, ModelConfig, TimeRange,
    filter_log_levels,
};

/// Logweave - builds a merged log model from tabular query results
#[derive(Parser, Debug)]
#[command(name = "logweave")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding an array of frames
    #[arg(value_name = "FRAMES")]
    frames: PathBuf,

    /// Query interval in milliseconds, used to size volume buckets
    #[arg(long)]
    interval_ms: Option<i64>,

    /// Start of the queried range, epoch milliseconds
    #[arg(long, requires = "to_ms")]
    from_ms: Option<i64>,

    /// End of the queried range, epoch milliseconds
    #[arg(long, requires = "from_ms")]
    to_ms: Option<i64>,

    /// Display time zone (utc, local, or an offset like +02:00)
    #[arg(long, default_value = "utc")]
    time_zone: String,

    /// Dedup strategy (none, exact, numbers, signature)
    #[arg(long)]
    dedup: Option<DedupStrategy>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hide rows at this level (repeatable)
    #[arg(long = "hide-level", value_name = "LEVEL")]
    hide_levels: Vec<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args);

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    // CLI flags > config file > defaults
    let mut config = match &args.config {
        Some(path) => ModelConfig::from_file(path)?,
        None => ModelConfig::default(),
    };
    if let Some(strategy) = args.dedup {
        config = config.with_dedup_strategy(strategy);
    }

    let hidden_levels = parse_hidden_levels(&args.hide_levels)?;

    let contents = fs::read_to_string(&args.frames)
        .with_context(|| format!("Failed to read {}", args.frames.display()))?;
    let frames: Vec<Frame> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse frames from {}", args.frames.display()))?;

    let mut builder = LogsModelBuilder::new(config);
    if let (Some(from), Some(to)) = (args.from_ms, args.to_ms) {
        if to <= from {
            bail!("--to-ms must be after --from-ms");
        }
        builder = builder.with_time_range(TimeRange::new(from, to));
    }

    let mut model = builder.build(&frames, args.interval_ms, &args.time_zone);
    model.rows = filter_log_levels(&model.rows, &hidden_levels);

    let counts = LevelCounts::from_rows(&model.rows);
    info!(
        rows = model.rows.len(),
        total = counts.total(),
        errors = counts.error + counts.critical,
        "model ready"
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&model)?
    } else {
        serde_json::to_string(&model)?
    };
    println!("{}", output);

    Ok(())
}

fn parse_hidden_levels(names: &[String]) -> Result<HashSet<LogLevel>> {
    let mut levels = HashSet::new();
    for name in names {
        let level = LogLevel::from_str(name);
        if level == LogLevel::Unknown && !name.trim().eq_ignore_ascii_case("unknown") {
            bail!("Unknown log level '{}'", name);
        }
        levels.insert(level);
    }
    Ok(levels)
}
