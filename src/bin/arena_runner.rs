//! Headless Arena Runner
//!
//! Spawns creatures from a bestiary around a player, runs the arena for a
//! fixed number of ticks and prints a summary.
//!
//! Usage:
//!   arena_runner --creatures brute=4,slime=2,deer --ticks 1200 --player-motion orbit
//!   arena_runner --bestiary data/bestiary.toml --format text -v

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::path::PathBuf;

use beastmind::core::config::{ArenaConfig, Bestiary};
use beastmind::core::error::{BeastError, Result};
use beastmind::core::types::AgentState;
use beastmind::simulation::Arena;
use beastmind::spatial::Aabb;
use beastmind::world::DamageLedger;
use clap::{Parser, ValueEnum};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless Arena Runner - drive creature agents against a player
#[derive(Parser, Debug)]
#[command(name = "arena_runner")]
#[command(about = "Run creature agents against a player and report what happened")]
struct Args {
    /// Bestiary TOML file (built-in creatures when omitted)
    #[arg(long)]
    bestiary: Option<PathBuf>,

    /// Comma-separated creatures, each `name` or `name=count`
    #[arg(long, default_value = "brute,slime,archer,deer")]
    creatures: String,

    /// Count for creatures listed without one
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Spawn ring radius around the player
    #[arg(long, default_value_t = 10.0)]
    spread: f32,

    /// Random pillars scattered around the arena
    #[arg(long, default_value_t = 4)]
    obstacles: usize,

    /// Random seed for placement
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// How the player moves during the run
    #[arg(long, value_enum, default_value_t = PlayerMotion::Still)]
    player_motion: PlayerMotion,

    /// Make the player immune to damage
    #[arg(long)]
    invulnerable: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Print every agent event as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlayerMotion {
    Still,
    /// Circle the origin at a fixed radius
    Orbit,
    /// Sway back and forth along x
    Strafe,
}

impl PlayerMotion {
    fn position(self, t: f32) -> Option<Vec3> {
        match self {
            PlayerMotion::Still => None,
            PlayerMotion::Orbit => {
                let angle = t * 0.5;
                Some(Vec3::new(angle.sin() * 3.0, 0.0, angle.cos() * 3.0))
            }
            PlayerMotion::Strafe => Some(Vec3::new((t * 0.8).sin() * 4.0, 0.0, 0.0)),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Serialize)]
struct RunSummary {
    ticks: u64,
    seconds: f32,
    seed: u64,
    player_damage_taken: f32,
    player_alive: bool,
    states: BTreeMap<String, usize>,
    survivors: BTreeMap<&'static str, usize>,
    events: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    fn print_text(&self) {
        println!("=== ARENA RUN ===");
        println!("Ticks: {} ({:.1}s, seed {})", self.ticks, self.seconds, self.seed);
        println!(
            "Player: {} ({:.1} damage taken)",
            if self.player_alive { "alive" } else { "dead" },
            self.player_damage_taken
        );
        println!("\nSurvivors:");
        for (archetype, n) in &self.survivors {
            println!("  {:<10} {}", archetype, n);
        }
        println!("\nStates:");
        for (state, n) in &self.states {
            println!("  {:<10} {}", state, n);
        }
        println!("\nEvents:");
        for (kind, n) in &self.events {
            println!("  {:<24} {}", kind, n);
        }
    }
}

/// Parse `brute=4,slime,deer=2` into (name, count) pairs
fn parse_roster(spec: &str, default_count: usize) -> Result<Vec<(String, usize)>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, count)) => count
                .trim()
                .parse()
                .map(|n| (name.trim().to_string(), n))
                .map_err(|_| BeastError::Config(format!("bad creature count in '{}'", entry))),
            None => Ok((entry.to_string(), default_count)),
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("beastmind=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let bestiary = match &args.bestiary {
        Some(path) => Bestiary::load(path)?,
        None => Bestiary::builtin(),
    };
    let roster = parse_roster(&args.creatures, args.count)?;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut arena = Arena::new(ArenaConfig::default(), args.dt);
    let start = args.player_motion.position(0.0).unwrap_or(Vec3::ZERO);
    let player = arena.spawn_player(start);
    if args.invulnerable {
        arena.world_mut().set_invulnerable(player, true);
    }
    let player_max = arena.world().max_health(player).unwrap_or(0.0);

    for _ in 0..args.obstacles {
        let angle = rng.gen_range(0.0..TAU);
        let distance = rng.gen_range(3.0..args.spread.max(4.0));
        let center = Vec3::new(angle.sin() * distance, 1.0, angle.cos() * distance);
        arena.add_obstacle(Aabb::from_center(center, Vec3::new(0.5, 1.0, 0.5)));
    }

    for (name, count) in &roster {
        let Some(blueprint) = bestiary.get(name) else {
            tracing::warn!("Unknown creature '{}', skipping", name);
            continue;
        };
        for _ in 0..*count {
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(args.spread * 0.5..=args.spread);
            arena.spawn_agent(blueprint, Vec3::new(angle.sin() * distance, 0.0, angle.cos() * distance));
        }
    }
    tracing::info!("Arena ready: {} agents, {} ticks", arena.agents().len(), args.ticks);

    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();
    for _ in 0..args.ticks {
        if let Some(position) = args.player_motion.position(arena.tick_count() as f32 * args.dt) {
            arena.world_mut().set_position(player, position);
        }
        for event in arena.tick() {
            if args.verbose {
                eprintln!("[{:>5}] {:?}", arena.tick_count(), event);
            }
            *tally.entry(event.kind()).or_default() += 1;
        }
        if arena.world().is_dead(player) {
            tracing::info!("Player died at tick {}", arena.tick_count());
            break;
        }
    }

    let mut states = BTreeMap::new();
    for state in [AgentState::Passive, AgentState::Aggressive, AgentState::Fleeing, AgentState::Idle] {
        let n = arena.agents().iter().filter(|a| a.state() == state).count();
        states.insert(format!("{:?}", state), n);
    }
    let mut survivors = BTreeMap::new();
    for agent in arena.agents() {
        *survivors.entry(agent.archetype().name()).or_default() += 1;
    }

    let health = arena.world().health_percentage(player).unwrap_or(0.0);
    let summary = RunSummary {
        ticks: arena.tick_count(),
        seconds: arena.tick_count() as f32 * args.dt,
        seed: args.seed,
        player_damage_taken: (1.0 - health) * player_max,
        player_alive: !arena.world().is_dead(player),
        states,
        survivors,
        events: tally,
    };
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => summary.print_text(),
    }
    Ok(())
}
