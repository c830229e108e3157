use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gramfreq::data::Dataset;
use gramfreq::{mtcars, runtime, ChartConfig, OutputFormat};
use log::{debug, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Rendered chart (PNG or SVG)
    Image,
    /// Aggregated contingency table as text
    Table,
    /// Laid-out chart scene as JSON
    Scene,
}

#[derive(Parser, Debug)]
#[command(name = "gramfreq")]
#[command(about = "Aggregate categorical data and chart it using a bar-chart DSL", long_about = None)]
struct Args {
    /// Chart DSL string (e.g., 'aes(x: cyl, fill: am) | bar(stat: "cond")')
    dsl: String,

    /// CSV (or JSON with --json) input file; stdin when absent
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Read input as a JSON array of records
    #[arg(long)]
    json: bool,

    /// Use the built-in mtcars dataset instead of reading input
    #[arg(long, conflicts_with_all = ["input", "json"])]
    mtcars: bool,

    /// What to produce
    #[arg(long, value_enum, default_value = "image")]
    emit: Emit,

    /// Output file; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Image format (png or svg)
    #[arg(long)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// JSON file with "render" and "layout" settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    // Ignore the error when a logger is already installed
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    let config = load_config(&args)?;
    let data = load_dataset(&args)?;
    debug!("loaded {} records with columns {:?}", data.len(), data.headers());

    let bytes = match args.emit {
        Emit::Image => runtime::render_chart(&args.dsl, &data, &config)?,
        Emit::Table => runtime::tabulate(&args.dsl, &data, &config.layout)?.into_bytes(),
        Emit::Scene => {
            let scene = runtime::build_scene(&args.dsl, &data, &config.layout)?;
            let mut json = serde_json::to_string_pretty(&scene).context("Failed to serialize scene")?;
            json.push('\n');
            json.into_bytes()
        }
    };

    match &args.output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ChartConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => ChartConfig::default(),
    };

    if let Some(format) = &args.format {
        config.render.format = format.clone();
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn load_dataset(args: &Args) -> Result<Dataset> {
    if args.mtcars {
        return mtcars::dataset().context("Failed to load mtcars");
    }

    let reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };

    if args.json {
        let value: serde_json::Value =
            serde_json::from_reader(reader).context("Failed to read JSON input")?;
        Dataset::from_json(&value).context("Failed to load JSON records")
    } else {
        Dataset::from_csv_reader(reader).context("Failed to read CSV input")
    }
}
