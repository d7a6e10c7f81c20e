use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marketlens::analysis::analyze_market;
use marketlens::synthetic::{MarketScenario, SyntheticDataGenerator};
use marketlens::{DraftRecommendation, MarketSnapshot, PredictionValidator, Settings, ValidationContext};

#[derive(Parser)]
#[command(name = "marketlens")]
#[command(about = "Market structure analysis and trade-recommendation validation")]
#[command(version)]
struct Cli {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a market snapshot and print the engine output
    Analyze {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
    },
    /// Render a snapshot's analysis as the advisor prompt context
    Context {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
    },
    /// Validate a draft recommendation against a snapshot
    Validate {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Draft recommendation JSON file (a markdown code fence is accepted)
        #[arg(short, long)]
        draft: PathBuf,
    },
    /// Analyze a seeded synthetic snapshot
    Demo {
        #[arg(long, default_value = "uptrend")]
        scenario: MarketScenario,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Number of candles to generate
        #[arg(long, default_value = "200")]
        candles: usize,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    setup_logging(&settings.log_filter);

    match cli.command {
        Commands::Analyze { snapshot } => {
            let snapshot = read_snapshot(&snapshot)?;
            let analysis = analyze_market(&snapshot, &settings.engine);
            print_json(&analysis)
        }
        Commands::Context { snapshot } => {
            let snapshot = read_snapshot(&snapshot)?;
            println!("{}", analyze_market(&snapshot, &settings.engine).to_context_text());
            Ok(())
        }
        Commands::Validate { snapshot, draft } => {
            let snapshot = read_snapshot(&snapshot)?;
            let payload = std::fs::read_to_string(&draft)
                .with_context(|| format!("Failed to read draft {}", draft.display()))?;
            let draft = DraftRecommendation::from_json(&payload)
                .with_context(|| format!("Failed to parse draft {}", draft.display()))?;

            let validated = validate(&snapshot, &draft, &settings);
            print_json(&validated)
        }
        Commands::Demo {
            scenario,
            seed,
            candles,
        } => {
            tracing::info!("🧪 Generating {} snapshot (seed {})", scenario, seed);
            let snapshot = SyntheticDataGenerator::new(seed).snapshot("SYNTH", scenario, candles, 240);
            print_json(&analyze_market(&snapshot, &settings.engine))
        }
    }
}

fn setup_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_snapshot(path: &Path) -> Result<MarketSnapshot> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    MarketSnapshot::from_json(&payload)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn validate(
    snapshot: &MarketSnapshot,
    draft: &DraftRecommendation,
    settings: &Settings,
) -> marketlens::ValidatedRecommendation {
    let analysis = analyze_market(snapshot, &settings.engine);
    let validator = PredictionValidator::new(settings.validator.clone());
    validator.validate(draft, &ValidationContext::from_analysis(&analysis))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
