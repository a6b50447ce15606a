//! CLI for distilling FER+ labels and summarizing them.
//!
//! Usage:
//!   ferplus-labels -f fer2013new.csv                      # Summary table
//!   ferplus-labels -f fer2013new.csv --json               # JSON summary
//!   ferplus-labels -f fer2013new.csv --export-dir data    # Write per-partition label.csv

use std::path::PathBuf;

use clap::Parser;
use ferplus_labels::{
    export_partitions, Config, DegeneratePolicy, Distiller, ExportFormat, LabelLoader, Summary,
    TrainingMode,
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ferplus-labels")]
#[command(author, version, about = "Distill FER+ emotion votes into training labels", long_about = None)]
struct Args {
    /// FER+ label CSV file
    #[arg(short, long, required = true)]
    fer_label_file: PathBuf,

    /// TOML settings file
    #[arg(short, long, env = "FERPLUS_LABELS_CONFIG")]
    config: Option<PathBuf>,

    /// Header of the image name column following the usage column
    #[arg(long)]
    image_column: Option<String>,

    /// Fail on rows whose votes are all single votes instead of labelling them unknown
    #[arg(long)]
    strict: bool,

    /// Output summary as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write <dir>/<partition folder>/label.csv for each partition
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Export training targets for this mode instead of full distributions
    #[arg(long, value_enum, requires = "export_dir")]
    training_mode: Option<TrainingMode>,

    /// Seed for the probability training mode
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Save the distilled labels as a binary snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v == "json");

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    if args.image_column.is_some() {
        config.loader.image_column = args.image_column.clone();
    }
    if args.strict {
        config.loader.degenerate = DegeneratePolicy::Reject;
    }

    let loader = LabelLoader::new(Distiller::new(config.distill)?, config.loader);
    let labels = loader.load_path(&args.fer_label_file)?;

    if let Some(ref dir) = args.export_dir {
        let format = match args.training_mode {
            Some(mode) => ExportFormat::Targets {
                mode,
                seed: args.seed,
            },
            None => ExportFormat::Distribution,
        };
        export_partitions(&labels, dir, format)?;
    }

    if let Some(ref path) = args.snapshot {
        labels.save(path)?;
    }

    let summary = Summary::from_label_set(&labels)?;
    let output_str = if args.json {
        serde_json::to_string_pretty(&summary)?
    } else {
        summary.render()?
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!(path = %path.display(), "summary written");
    } else {
        print!("{}", output_str);
        if args.json {
            println!();
        }
    }

    Ok(())
}
