//! Background daemon for the Qiankun world: loads the durable player store,
//! reconciles offline time, then advances one in-game day per tick interval
//! until asked to stop. Also ships small admin commands mirroring what a
//! chat front-end would call.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use qiankun_game::{
    CalendarStore, Clock, CultivationService, GameCalendar, GameConfig, JsonPlayerStore, PlayerId,
    PlayerProfile, SystemClock, TickScheduler,
};

#[derive(Debug, Parser)]
#[command(name = "qiankun-daemon", version)]
#[command(about = "Advance Qiankun cultivators through in-game days in real time")]
struct Args {
    /// Directory holding the durable world state
    #[arg(long, default_value = ".data")]
    data_dir: PathBuf,

    /// Optional JSON config overriding the built-in balance values
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tick scheduler until interrupted
    Run,
    /// Register a new cultivator
    Register {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: String,
    },
    /// Show a cultivator's profile
    Profile {
        #[arg(long)]
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Run => run(&args.data_dir, config).await,
        Command::Register { id, name } => register(&args.data_dir, config, PlayerId(id), &name),
        Command::Profile { id } => profile(&args.data_dir, config, PlayerId(id)),
    }
}

/// Read the optional config file, falling back to the built-in balance.
fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    config.sanitize();
    Ok(config)
}

fn open_service(
    data_dir: &Path,
    config: GameConfig,
) -> Result<CultivationService<JsonPlayerStore>> {
    let store = JsonPlayerStore::open(data_dir)
        .with_context(|| format!("failed to open player store under {}", data_dir.display()))?;
    CultivationService::load(store, config).context("failed to load player records")
}

fn open_calendar(data_dir: &Path, now: u64) -> Result<GameCalendar> {
    CalendarStore::new(data_dir)
        .load_or_create(now)
        .context("failed to open the world calendar")
}

async fn run(data_dir: &Path, config: GameConfig) -> Result<()> {
    let clock = SystemClock;
    let now = clock.now();
    let interval = config.tick_interval_secs;
    let calendar = open_calendar(data_dir, now)?;
    let service = open_service(data_dir, config)?;

    info!(
        "world opened on {}, tracking {} cultivator(s)",
        calendar.format_date(now, interval),
        service.len()
    );

    let handle = TickScheduler::spawn(service, clock);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    info!("shutdown requested, stopping after the current cycle");

    let service = handle.shutdown().await.context("scheduler task failed")?;
    info!(
        "scheduler stopped, {} cultivator(s) settled as of {}",
        service.len(),
        calendar.format_date(clock.now(), interval)
    );
    Ok(())
}

fn register(data_dir: &Path, config: GameConfig, id: PlayerId, name: &str) -> Result<()> {
    let mut service = open_service(data_dir, config)?;
    let record = service.register(id, name, SystemClock.now())?;
    println!(
        "Welcome, {}! Your cultivation journey begins in the {} stage of {}.",
        record.name, record.cultivation.stage, record.cultivation.realm
    );
    Ok(())
}

fn profile(data_dir: &Path, config: GameConfig, id: PlayerId) -> Result<()> {
    let now = SystemClock.now();
    let interval = config.tick_interval_secs;
    let calendar = open_calendar(data_dir, now)?;
    let service = open_service(data_dir, config)?;
    let profile = service.profile(id, now)?;
    print!("{}", render_profile(&profile, &calendar.format_date(now, interval)));
    Ok(())
}

fn render_profile(profile: &PlayerProfile, date: &str) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "{} (id {})", profile.name, profile.id);
    let _ = writeln!(out, "Date: {date}");
    let _ = writeln!(out, "Cultivation: {} {}", profile.stage, profile.realm);
    let _ = writeln!(
        out,
        "Progress: {:.1}/{:.1} exp at {:.1} exp/tick",
        profile.exp, profile.required_exp, profile.rate
    );
    match profile.ticks_until_next_stage {
        Some(ticks) => {
            let _ = writeln!(out, "Next stage: {ticks} tick(s)");
        }
        None => {
            let _ = writeln!(out, "Next stage: none (peak reached)");
        }
    }
    let _ = writeln!(
        out,
        "Age: {:.2} years ({:.2} remaining)",
        profile.age_years, profile.remaining_lifespan_years
    );
    let _ = writeln!(out, "Hours cultivated: {:.2}", profile.hours_cultivated);
    let _ = writeln!(
        out,
        "Battle record: {} enemies defeated, {} tribulations survived",
        profile.enemies_defeated, profile.tribulations_survived
    );
    let _ = writeln!(out, "Steps travelled: {}", profile.steps_travelled);
    out
}
