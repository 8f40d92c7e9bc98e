//! Win Predictor CLI
//!
//! Runs predictions against player and battle records stored as JSON files.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use win_predictor::{
    config::{BackendKind, EngineConfig},
    ml::{FeatureKey, FeatureLayout},
    types::{PreBattleContext, RawBattleContext, RawPlayerSnapshot},
    WinPredictor,
};

#[derive(Parser)]
#[command(name = "win-predictor")]
#[command(about = "Estimate match win probability from player and battle data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "predictor.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-battle prediction from a player snapshot
    Predict {
        /// Player snapshot JSON
        player: PathBuf,
        /// Opponent snapshot JSON
        #[arg(long)]
        opponent: Option<PathBuf>,
        /// Pre-battle context JSON (deck costs, synergy, recent results)
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Live prediction from a battle observation
    Live {
        /// Player tag
        tag: String,
        /// Battle context JSON
        battle: PathBuf,
    },
    /// Print the feature vector layout
    Layout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout => {
            show_layout();
            Ok(())
        }
        Commands::Predict {
            player,
            opponent,
            context,
        } => {
            let predictor = build_predictor(&cli.config).await?;
            let player: RawPlayerSnapshot = read_json(&player)?;
            let opponent: Option<RawPlayerSnapshot> = opponent.as_deref().map(read_json).transpose()?;
            let context: Option<PreBattleContext> = context.as_deref().map(read_json).transpose()?;

            let result = predictor.predict_pre_battle(&player, opponent.as_ref(), context.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Live { tag, battle } => {
            let predictor = build_predictor(&cli.config).await?;
            let battle: RawBattleContext = read_json(&battle)?;

            let result = predictor.predict_live(&win_predictor::types::clean_tag(&tag), &battle)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

async fn build_predictor(config_path: &Path) -> anyhow::Result<WinPredictor> {
    let config = EngineConfig::load(config_path)?;

    if config.backend.kind == BackendKind::Learned {
        anyhow::bail!("learned backend needs a model loader; the CLI only runs the heuristic backend");
    }

    let predictor = WinPredictor::from_config(config, None)?;
    predictor.initialize().await?;
    tracing::info!("Predictor ready (model {})", predictor.model_version());
    Ok(predictor)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn show_layout() {
    println!("Feature layout {} ({})", FeatureLayout::VERSION, FeatureLayout::fingerprint());
    for (i, key) in FeatureKey::ALL.iter().enumerate() {
        println!("{:>3}  {}", i, key.as_str());
    }
}
