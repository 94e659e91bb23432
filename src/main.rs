use business_simulation::completion::{generate_completion, parse_shell_name};
use business_simulation::decisions::TeamDecisions;
use business_simulation::parameter_sweep::{run_monte_carlo, SweepParameter, SweepResult};
use business_simulation::replay::DecisionLog;
use business_simulation::result::standings_table;
use business_simulation::script::baseline_decisions;
use business_simulation::snapshot::GameSnapshot;
use business_simulation::{Difficulty, Game, GameConfig};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "business_simulation")]
#[command(about = "Runs a multi-team, turn-based business simulation with a deterministic round engine.")]
struct Args {
    /// Path to configuration file (YAML or TOML). CLI arguments override config file values.
    #[arg(short, long)]
    config: Option<String>,

    /// Use a difficulty preset (sandbox, easy, normal, hard, expert, nightmare)
    /// Use --list-presets to see all available presets
    #[arg(long)]
    preset: Option<String>,

    /// List all available difficulty presets and exit
    #[arg(long, default_value_t = false)]
    list_presets: bool,

    /// Number of rounds to play
    #[arg(short, long, default_value_t = 12)]
    rounds: u32,

    /// Number of teams in the game
    #[arg(short, long, default_value_t = 4)]
    teams: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Path for the JSON game-history export
    #[arg(short, long)]
    output: Option<String>,

    /// Compress JSON output using gzip (.gz extension will be added automatically)
    #[arg(long, default_value_t = false)]
    compress: bool,

    /// Number of rayon worker threads (defaults to the number of logical cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Record the game's decision log to this path
    #[arg(long)]
    record: Option<String>,

    /// Replay a recorded decision log instead of running the script
    #[arg(long)]
    replay: Option<String>,

    /// Save a game snapshot to this path after the final round
    #[arg(long)]
    snapshot: Option<String>,

    /// Run a balance sweep instead of a game.
    /// Format: "parameter:min:max:steps" (e.g., "softmax_temperature:1:8:4")
    /// Available parameters: softmax_temperature, rubber_band_trailing_boost,
    /// price_floor_penalty_max, brand_decay_rate
    #[arg(long)]
    sweep: Option<String>,

    /// Number of games per sweep point (default: 3)
    #[arg(long)]
    sweep_runs: Option<usize>,

    /// Number of Monte Carlo games with consecutive seeds
    #[arg(long)]
    monte_carlo_runs: Option<usize>,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Set the log level (error, warn, info, debug, trace)
    /// Can also be set via RUST_LOG environment variable
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Disable colored terminal output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Only print the final standings, not every round
    #[arg(long, default_value_t = false)]
    quiet_rounds: bool,

    /// Generate a shell completion script (bash, zsh, fish, powershell) and exit
    #[arg(long)]
    generate_completion: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    // If RUST_LOG is not set, use the CLI argument
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &args.log_level);
    }
    env_logger::init();

    if let Some(shell_name) = &args.generate_completion {
        let Some(shell) = parse_shell_name(shell_name) else {
            return Err(format!(
                "Unsupported shell '{}'. Supported: {}",
                shell_name,
                business_simulation::completion::get_supported_shells().join(", ")
            )
            .into());
        };
        generate_completion::<Args>(shell, "business_simulation", &mut std::io::stdout());
        return Ok(());
    }

    if args.list_presets {
        println!("Available difficulty presets:\n");
        for preset in Difficulty::all() {
            let config = GameConfig::for_difficulty(preset);
            println!("  {}", preset.as_str());
            println!("    Description: {}", preset.description());
            println!(
                "    Parameters: ${:.0}M starting cash, {:.0} total demand, event chance x{:.1}",
                config.starting.cash / 1_000_000.0,
                config.initial_market_state().total_demand(),
                config.cycle.event_chance.values().sum::<f64>() * 10.0
            );
            println!();
        }
        return Ok(());
    }

    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(num_threads).build_global()?;
    } else {
        rayon::ThreadPoolBuilder::new().build_global()?;
    }

    // Configuration priority: preset -> file -> CLI overrides.
    let mut config = if let Some(preset_name) = &args.preset {
        let preset = Difficulty::from_str(preset_name)
            .map_err(|e| format!("{}. Use --list-presets to see available presets.", e))?;
        info!("Loading difficulty preset: {}", preset.as_str());
        GameConfig::for_difficulty(preset)
    } else if let Some(path) = &args.config {
        info!("Loading configuration from {}", path);
        GameConfig::from_file(path)?
    } else {
        GameConfig::default()
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    // Replay mode: reproduce a recorded game.
    if let Some(path) = &args.replay {
        info!("Replaying decision log {}", path);
        let log = DecisionLog::load(path)?;
        let started = Instant::now();
        let reports = log.replay(config)?;
        if let Some(report) = reports.last() {
            println!("{}", standings_table(report));
        }
        println!(
            "Replayed {} rounds in {:.2?}",
            reports.len(),
            started.elapsed()
        );
        return Ok(());
    }

    // Sweep mode.
    if let Some(spec) = &args.sweep {
        let parameter = parse_sweep_spec(spec)?;
        let runs = args.sweep_runs.unwrap_or(3);
        let started = Instant::now();
        let result =
            SweepResult::run_sweep(config, parameter, args.teams, args.rounds, runs)?;
        println!("{}", result.table());
        println!("Sweep finished in {:.2?}", started.elapsed());
        return Ok(());
    }

    // Monte Carlo mode.
    if let Some(runs) = args.monte_carlo_runs {
        let started = Instant::now();
        let result = run_monte_carlo(config, args.teams, args.rounds, runs)?;
        println!("{}", "=== Monte Carlo results ===".bold());
        println!(
            "{} games, seeds {}..{}",
            result.runs,
            result.base_seed,
            result.base_seed + result.runs as u64
        );
        println!(
            "share spread: mean {:.4} (std {:.4})",
            result.share_spread.mean, result.share_spread.std_dev
        );
        for (team, wins) in &result.wins_by_team {
            println!("  {} won {} of {}", team, wins, result.runs);
        }
        println!("Finished in {:.2?}", started.elapsed());
        return Ok(());
    }

    // Scripted demo game.
    let names: Vec<String> = (1..=args.teams).map(|i| format!("Team {}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut game = Game::new(config, &name_refs)?;
    let mut log = DecisionLog::new(game.config().seed, names.clone());

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(args.rounds as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} round {pos}/{len} {msg}")
                .expect("static template is valid"),
        );
        bar
    };

    let started = Instant::now();
    for _ in 0..args.rounds {
        let decisions: BTreeMap<String, TeamDecisions> = game
            .teams
            .values()
            .map(|team| (team.id.clone(), baseline_decisions(team, &game.market)))
            .collect();
        if args.record.is_some() {
            log.record(game.round(), &decisions);
        }
        let report = game.advance(&decisions)?;
        progress.inc(1);
        if !args.quiet_rounds {
            progress.suspend(|| println!("{}", standings_table(report)));
        }
    }
    progress.finish_and_clear();

    if let Some(report) = game.history.last() {
        println!("{}", standings_table(report));
    }
    println!(
        "Played {} rounds with {} teams in {:.2?}",
        args.rounds,
        args.teams,
        started.elapsed()
    );

    if let Some(path) = &args.record {
        log.save(path)?;
        println!("Decision log written to {}", path);
    }
    if let Some(path) = &args.output {
        game.history.export_json(path, args.compress)?;
        println!("Game history written to {}", path);
    }
    if let Some(path) = &args.snapshot {
        GameSnapshot::capture(&game).save(path)?;
        println!("Snapshot written to {}", path);
    }

    Ok(())
}

/// Parses "parameter:min:max:steps" into a sweep specification.
fn parse_sweep_spec(spec: &str) -> Result<SweepParameter, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Invalid sweep spec '{}'. Expected \"parameter:min:max:steps\"",
            spec
        ));
    }
    let min: f64 = parts[1].parse().map_err(|_| format!("bad min '{}'", parts[1]))?;
    let max: f64 = parts[2].parse().map_err(|_| format!("bad max '{}'", parts[2]))?;
    let steps: usize = parts[3].parse().map_err(|_| format!("bad steps '{}'", parts[3]))?;
    match parts[0] {
        "softmax_temperature" => Ok(SweepParameter::SoftmaxTemperature { min, max, steps }),
        "rubber_band_trailing_boost" => Ok(SweepParameter::RubberBandBoost { min, max, steps }),
        "price_floor_penalty_max" => Ok(SweepParameter::PriceFloorPenalty { min, max, steps }),
        "brand_decay_rate" => Ok(SweepParameter::BrandDecay { min, max, steps }),
        other => Err(format!(
            "Unknown sweep parameter '{}'. Available: softmax_temperature, \
             rubber_band_trailing_boost, price_floor_penalty_max, brand_decay_rate",
            other
        )),
    }
}
