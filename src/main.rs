//! Binary entrypoint for the cas_economy simulator.
//!
//! Commands:
//! - `simulate` - seed the world and run the concurrent battle/trade loop
//! - `transfer [--amount <n>]` - reset andy and beth, then move money between them
//! - `hit [--damage <n>]` - reset Jane and the grue, then land one transactional hit
//! - `init` - write a default config file
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cas_economy::game::{
    seed_customers, seed_skirmish, seed_world, transfer_record_exists, Economy, SKIRMISH_MONSTER,
    SKIRMISH_PLAYER,
};
use cas_economy::observe::{FanoutSink, Metrics, OperationKind, OutcomeSink, TracingSink};
use cas_economy::reward::{celtic_weapons, RewardTable};
use cas_economy::simulation::{Simulation, SimulationPlan};
use cas_economy::store::{InMemoryStore, VersionedStore};
use cas_economy::transaction::Outcome;
use cas_economy::SimulationConfig;

#[derive(Parser)]
#[command(name = "cas_economy")]
#[command(about = "Simulate a game economy over a versioned key-value store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults apply when the file is absent)
    #[arg(short, long, default_value = "cas_economy.toml", global = true)]
    config: PathBuf,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed players and monsters, then run battles and trades concurrently
    Simulate {
        /// Override the number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Override the iterations per worker
        #[arg(short, long)]
        iterations: Option<usize>,
    },
    /// Transfer money from andy to beth
    Transfer {
        /// Amount to move; defaults to the config value
        #[arg(short, long)]
        amount: Option<i64>,

        /// Starting balance for both customers
        #[arg(long, default_value_t = 100)]
        balance: i64,
    },
    /// Have Jane hit the grue once
    Hit {
        /// Damage dealt; random below 8000 when omitted
        #[arg(short, long)]
        damage: Option<i64>,
    },
    /// Write a default configuration file
    Init,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        SimulationConfig::write_default(&cli.config)?;
        info!(path = %cli.config.display(), "wrote default config");
        return Ok(());
    }

    let config = load_config(&cli.config)?;

    let store = InMemoryStore::new();
    store
        .ping()
        .context("store is unreachable, refusing to start")?;
    if config.store.flush {
        store.clear()?;
    }

    let rewards = Arc::new(RewardTable::new(celtic_weapons())?);
    let economy = Economy::new(store.clone(), rewards)
        .with_transaction_config(config.transaction_config())
        .with_battle_config(config.battle_config());

    match cli.command {
        Commands::Simulate {
            workers,
            iterations,
        } => simulate(&config, &store, economy, workers, iterations),
        Commands::Transfer { amount, balance } => transfer(
            &store,
            &economy,
            &TracingSink,
            amount.unwrap_or(config.transfer.amount),
            balance,
        ),
        Commands::Hit { damage } => {
            let damage = damage.unwrap_or_else(|| rand::thread_rng().gen_range(0..8000));
            hit(&store, &economy, &TracingSink, damage)
        }
        Commands::Init => Ok(()),
    }
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    if path.exists() {
        let config = SimulationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    } else {
        warn!(path = %path.display(), "config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

fn simulate(
    config: &SimulationConfig,
    store: &InMemoryStore,
    economy: Economy<InMemoryStore>,
    workers: Option<usize>,
    iterations: Option<usize>,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let world = seed_world(
        store,
        config.seed.players,
        economy.rewards().weapons(),
        &mut rng,
    )?;
    info!(
        seeded = world.seeded,
        players = world.roster.players().len(),
        monsters = world.roster.monsters().len(),
        "world ready"
    );

    let plan = SimulationPlan {
        workers: workers.unwrap_or(config.transactions.workers),
        iterations: iterations.unwrap_or(config.transactions.iterations),
        battles_per_trade: config.battle.battles_per_trade,
    };
    let metrics = Arc::new(Metrics::new());
    let sink = FanoutSink::new().with(metrics.clone()).with(TracingSink);

    let stats = Simulation::new(economy, Arc::new(world.roster), sink, plan).run();

    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
    Ok(())
}

fn hit(
    store: &InMemoryStore,
    economy: &Economy<InMemoryStore>,
    sink: &impl OutcomeSink,
    damage: i64,
) -> Result<()> {
    seed_skirmish(store)?;

    let report = economy.hit(SKIRMISH_PLAYER, SKIRMISH_MONSTER, damage);
    sink.record(OperationKind::Hit, report.outcome.tag(), report.elapsed);

    match report.outcome {
        Outcome::Committed(receipt) => {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        Outcome::Failed(failure) => {
            println!("hit failed: {}", failure);
            Ok(())
        }
        Outcome::CommitAmbiguous(ambiguity) => bail!("hit outcome unknown: {}", ambiguity),
    }
}

fn transfer(
    store: &InMemoryStore,
    economy: &Economy<InMemoryStore>,
    sink: &impl OutcomeSink,
    amount: i64,
    balance: i64,
) -> Result<()> {
    seed_customers(store, balance)?;

    let id = Uuid::new_v4().to_string();
    let report = economy.transfer_with_id(&id, "andy", "beth", amount);
    info!(
        transaction = %report.id,
        attempts = report.attempts,
        outcome = %report.outcome.tag(),
        "transfer finished"
    );
    sink.record(OperationKind::Transfer, report.outcome.tag(), report.elapsed);

    match report.outcome {
        Outcome::Committed(receipt) => {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        Outcome::Failed(failure) => {
            println!("transfer failed: {}", failure);
            Ok(())
        }
        Outcome::CommitAmbiguous(ambiguity) => {
            warn!(%ambiguity, "transfer outcome unknown, checking the ledger");
            let landed = transfer_record_exists(store, &id)?;
            bail!(
                "transfer {} outcome unknown ({}); ledger record present: {}",
                id,
                ambiguity,
                landed
            )
        }
    }
}
