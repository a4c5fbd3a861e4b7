//! opal-replay: run captured auction pages through the bid engine.
//!
//! Reads a JSON-lines snapshot file, polls each snapshot in order against a
//! single auction, and prints the applied bid updates and session metrics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use opal_core::{AuctionBidState, EngineOptions, MemorySeenSet, SeenSet};
use opal_detection::BidEngine;
use opal_replay::{load_snapshots, MonitorSession, PageSnapshot, SessionMetrics, SqliteSeenSet};

/// Built-in option profiles.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// 1 - 10,000, no marker requirement.
    Default,
    /// 5 - 2,000, for arbitrary auction sites.
    GenericSite,
    /// 10 - 10,000, Facebook comment markers required.
    Facebook,
}

impl Profile {
    fn options(self) -> EngineOptions {
        match self {
            Profile::Default => EngineOptions::default(),
            Profile::GenericSite => EngineOptions::generic_site(),
            Profile::Facebook => EngineOptions::facebook_extension(),
        }
    }
}

/// Replay captured auction pages through the bid engine.
#[derive(Parser, Debug)]
#[command(name = "opal-replay", version, about)]
struct Cli {
    /// JSON-lines file of captured page snapshots.
    snapshots: PathBuf,

    /// Auction identifier used in seen-set keys.
    #[arg(long, default_value = "auction")]
    auction_id: String,

    /// Current highest bid when the session starts.
    #[arg(long, default_value_t = 0.0)]
    current_bid: f64,

    /// Starting bid of the auction.
    #[arg(long, default_value_t = 0.0)]
    starting_bid: f64,

    /// Option profile.
    #[arg(long, value_enum, default_value_t = Profile::Default)]
    profile: Profile,

    /// JSON engine options file. Overrides --profile.
    #[arg(long)]
    options: Option<PathBuf>,

    /// SQLite seen-set database. In-memory when omitted.
    #[arg(long)]
    seen_db: Option<PathBuf>,

    /// Print session metrics as JSON.
    #[arg(long)]
    json: bool,
}

fn replay<S: SeenSet>(
    cli: &Cli,
    engine: BidEngine,
    seen: S,
    snapshots: &[PageSnapshot],
) -> Result<SessionMetrics> {
    let state = AuctionBidState {
        current_bid: cli.current_bid,
        current_bidder: None,
        starting_bid: cli.starting_bid,
    };
    let mut session = MonitorSession::new(cli.auction_id.clone(), engine, state, seen);
    let metrics = session.run(snapshots)?;

    if !cli.json {
        for applied in session.applied() {
            println!(
                "poll {:>4}  ${:<8} {:<24} {:<26} confidence {:.2}",
                applied.poll,
                applied.update.amount,
                applied.update.bidder_name,
                applied.update.pattern_kind,
                applied.update.confidence
            );
        }
    }
    Ok(metrics)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let options = match &cli.options {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading options file {}", path.display()))?;
            EngineOptions::from_json(&json)?
        }
        None => cli.profile.options(),
    };
    let engine = BidEngine::new(options)?;

    let snapshots = load_snapshots(&cli.snapshots)
        .with_context(|| format!("loading snapshots from {}", cli.snapshots.display()))?;
    info!(
        count = snapshots.len(),
        auction_id = %cli.auction_id,
        "Loaded snapshots"
    );

    let metrics = match &cli.seen_db {
        Some(path) => {
            let seen = SqliteSeenSet::open(path)
                .with_context(|| format!("opening seen-set {}", path.display()))?;
            replay(&cli, engine, seen, &snapshots)?
        }
        None => replay(&cli, engine, MemorySeenSet::new(), &snapshots)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!();
        println!("polls          {}", metrics.polls);
        println!("updates        {}", metrics.updates);
        println!("quiet polls    {}", metrics.quiet_polls);
        println!("opening floor  {}", metrics.opening_floor);
        println!(
            "final bid      {} ({})",
            metrics.final_bid,
            metrics.final_bidder.as_deref().unwrap_or("none")
        );
        println!("total raise    {}", metrics.total_raise);
        println!("largest raise  {}", metrics.largest_raise);
        println!("bidders        {}", metrics.distinct_bidders);
        println!("avg confidence {:.2}", metrics.avg_confidence);
    }

    Ok(())
}
