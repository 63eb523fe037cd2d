//! mlsim CLI: run one simulation and print the result as JSON.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use mlsim_core::{Algorithm, ConfigOverrides, SeedManager, SimulationConfig};

/// mlsim: step through classical machine-learning algorithms on 2-D data
#[derive(Parser, Debug)]
#[command(name = "mlsim", version, about, long_about = None)]
struct Cli {
    /// Algorithm tag: linearRegression, logisticRegression, kMeansClustering, decisionTree
    algorithm: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Global seed for dataset synthesis and training
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of points to synthesize
    #[arg(short, long)]
    points: Option<usize>,

    /// Iteration budget
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Gradient-descent step size
    #[arg(long)]
    learning_rate: Option<f64>,

    /// L2 strength, or the minimum split fraction for decision trees
    #[arg(long)]
    regularization: Option<f64>,

    /// Jitter scale (label-flip probability for decision-tree data)
    #[arg(long)]
    noise_level: Option<f64>,

    /// Cluster count for k-means
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print progress reports to stderr
    #[arg(long)]
    progress: bool,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> anyhow::Result<ConfigOverrides> {
        let algorithm = self
            .algorithm
            .as_deref()
            .map(str::parse::<Algorithm>)
            .transpose()?;
        Ok(ConfigOverrides {
            algorithm,
            seed: self.seed,
            points: self.points,
            learning_rate: self.learning_rate,
            iterations: self.iterations,
            regularization: self.regularization,
            noise_level: self.noise_level,
            clusters: self.clusters,
            pretty: self.compact.then_some(false),
        })
    }
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(log_filter(cli.verbose, cli.quiet)));

    // JSON file layer for structured logging, only with --log-dir
    let mut _guard = None;
    let json_layer = match &cli.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)
                .with_context(|| format!("cannot create log dir {}", log_dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "mlsim.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            _guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let overrides = cli.overrides()?;
    let config = mlsim_core::load_config(cli.config.as_deref(), &overrides)
        .context("failed to load configuration")?;
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    run(&config, cli.progress, cli.quiet).await
}

async fn run(config: &SimulationConfig, show_progress: bool, quiet: bool) -> anyhow::Result<()> {
    let mut seeds = match config.seed {
        Some(seed) => SeedManager::new(seed),
        None => SeedManager::from_entropy(),
    };
    tracing::info!(seed = seeds.global_seed, "seeded run");

    let parameters = &config.parameters;
    let data = mlsim_core::data::generate(
        config.algorithm,
        config.dataset.points,
        parameters.noise_level,
        &mut seeds.rng_for("dataset"),
    );

    let total = parameters.iterations;
    let mut reporter = |iteration: usize| {
        if show_progress {
            eprintln!("[{}] {iteration}/{total}", config.algorithm);
        }
    };
    let result = mlsim_core::run_simulation(
        config.algorithm,
        &data,
        parameters,
        &mut reporter,
        &mut seeds.rng_for("trainer"),
    )
    .await
    .with_context(|| format!("{} simulation failed", config.algorithm))?;

    println!("{}", result.to_json(config.output.pretty)?);
    if !quiet {
        eprintln!("{}: {}", config.algorithm, result.summary());
    }
    Ok(())
}
