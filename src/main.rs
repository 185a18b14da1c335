//! Terraform Engine - catalog tooling
//!
//! Inspects JSON card catalogs the engine consumes

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use terraform_engine::core::{BehaviorShape, Card, CardType};
use terraform_engine::repository::InMemoryCardRepository;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tfm")]
#[command(about = "Terraform Engine - card catalog tooling", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a catalog: card types and behavior shapes
    Catalog {
        /// JSON card catalog
        #[arg(value_name = "CATALOG")]
        file: PathBuf,
    },

    /// Report catalog vocabulary the engine skips (fail-open kinds)
    Check {
        /// JSON card catalog
        #[arg(value_name = "CATALOG")]
        file: PathBuf,

        /// Exit with an error if any card uses unknown vocabulary
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Catalog { file } => run_catalog(&file).await?,
        Commands::Check { file, strict } => run_check(&file, strict).await?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_catalog(path: &Path) -> anyhow::Result<InMemoryCardRepository> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let repo = InMemoryCardRepository::from_json_str(&contents)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    tracing::info!(path = %path.display(), cards = repo.len(), "catalog loaded");
    Ok(repo)
}

fn shape_name(shape: BehaviorShape) -> &'static str {
    match shape {
        BehaviorShape::Immediate => "immediate",
        BehaviorShape::Manual => "manual action",
        BehaviorShape::Passive => "passive effect",
        BehaviorShape::CorporationFirstAction => "forced first action",
        BehaviorShape::Inert => "inert",
    }
}

async fn run_catalog(path: &Path) -> anyhow::Result<()> {
    let repo = load_catalog(path).await?;

    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    let mut shapes: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut static_effects = 0;
    let mut with_choices = 0;
    let mut with_storage = 0;

    for card in repo.cards() {
        *types.entry(card.card_type.to_string()).or_default() += 1;
        for behavior in &card.behaviors {
            *shapes.entry(shape_name(behavior.shape())).or_default() += 1;
            if behavior.shape() == BehaviorShape::Immediate && behavior.has_static_modifiers() {
                static_effects += 1;
            }
        }
        if card.has_choices() {
            with_choices += 1;
        }
        if card.resource_storage.is_some() {
            with_storage += 1;
        }
    }

    println!("{}: {} cards", path.display(), repo.len());
    println!();
    println!("Card types:");
    for (card_type, count) in &types {
        println!("  {card_type:<14} {count:>5}");
    }
    println!();
    println!("Behaviors:");
    for (shape, count) in &shapes {
        println!("  {shape:<20} {count:>5}");
    }
    println!("  {:<20} {static_effects:>5}", "(static modifiers)");
    println!();
    println!("Cards with choices:  {with_choices}");
    println!("Cards with storage:  {with_storage}");

    let corporations = repo.cards().iter().filter(|c| c.card_type == CardType::Corporation).count();
    let forced = repo
        .cards()
        .iter()
        .filter(|c| c.behaviors_with_shape(BehaviorShape::CorporationFirstAction).next().is_some())
        .count();
    println!("Corporations:        {corporations} ({forced} with a forced first action)");
    Ok(())
}

async fn run_check(path: &Path, strict: bool) -> anyhow::Result<()> {
    let repo = load_catalog(path).await?;

    let flagged: Vec<(&Card, Vec<String>)> = repo
        .cards()
        .iter()
        .map(|card| (card, card.unknown_vocabulary()))
        .filter(|(_, unknown)| !unknown.is_empty())
        .collect();

    if flagged.is_empty() {
        println!("{}: all {} cards use known vocabulary", path.display(), repo.len());
        return Ok(());
    }

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for (card, unknown) in &flagged {
        println!("{} ({}): {}", card.id, card.name, unknown.join(", "));
        for term in unknown {
            *totals.entry(term.as_str()).or_default() += 1;
        }
    }
    println!();
    println!("{} of {} cards use unknown vocabulary", flagged.len(), repo.len());
    for (term, count) in &totals {
        println!("  {term:<32} {count:>5}");
    }

    if strict {
        anyhow::bail!("{} cards use unknown vocabulary", flagged.len());
    }
    Ok(())
}
