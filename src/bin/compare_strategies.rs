//! Strategy comparison tool
//!
//! Plays a batch of seeded headless games per strategy and reports survival,
//! growth and how each game ended. Games run in parallel on the rayon pool;
//! the same base seed always produces the same report.
//!
//! Usage: compare_strategies [--games N] [--grid N] [--max-ticks N] [--seed N]
//!                           [--strategies a,b,c] [--config <path>] [--json]

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::process;
use std::time::Instant;

use snake_autopilot::config::Config;
use snake_autopilot::engine::Engine;
use snake_autopilot::simple_profiler;
use snake_autopilot::strategy::StrategyId;
use snake_autopilot::types::TickOutcome;

struct CompareArgs {
    games: u32,
    grid_size: Option<i32>,
    max_ticks: u64,
    seed: u64,
    strategies: Vec<StrategyId>,
    config_path: Option<String>,
    json: bool,
}

/// Outcome of one headless game
struct GameResult {
    length: usize,
    ticks: u64,
    consumed: u32,
    ending: &'static str,
}

#[derive(Debug, Serialize)]
struct StrategyReport {
    strategy: StrategyId,
    games: usize,
    avg_length: f64,
    max_length: usize,
    avg_ticks: f64,
    avg_consumed: f64,
    endings: BTreeMap<&'static str, usize>,
    elapsed_ms: u128,
}

fn print_usage() {
    eprintln!("Usage: compare_strategies [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --games <n>           Games per strategy (default: 10)");
    eprintln!("  --grid <n>            Grid size override");
    eprintln!("  --max-ticks <n>       Stop a game after this many ticks (default: 5000)");
    eprintln!("  --seed <n>            Base seed; game i uses seed + i (default: 1)");
    eprintln!("  --strategies <list>   Comma-separated strategy ids (default: all)");
    eprintln!("  --config <path>       Path to Snake.toml");
    eprintln!("  --json                Print the report as JSON");
}

fn parse_args(args: &[String]) -> Result<CompareArgs, String> {
    let mut parsed = CompareArgs {
        games: 10,
        grid_size: None,
        max_ticks: 5000,
        seed: 1,
        strategies: StrategyId::all().to_vec(),
        config_path: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| format!("{} requires a value", flag));

        match flag {
            "--games" => {
                parsed.games = value?.parse().map_err(|e| format!("Invalid game count: {}", e))?;
                i += 1;
            }
            "--grid" => {
                parsed.grid_size = Some(value?.parse().map_err(|e| format!("Invalid grid size: {}", e))?);
                i += 1;
            }
            "--max-ticks" => {
                parsed.max_ticks = value?.parse().map_err(|e| format!("Invalid tick limit: {}", e))?;
                i += 1;
            }
            "--seed" => {
                parsed.seed = value?.parse().map_err(|e| format!("Invalid seed: {}", e))?;
                i += 1;
            }
            "--strategies" => {
                parsed.strategies = value?
                    .split(',')
                    .map(|s| s.parse::<StrategyId>().map_err(|e| format!("{}", e)))
                    .collect::<Result<Vec<_>, _>>()?;
                i += 1;
            }
            "--config" => {
                parsed.config_path = Some(value?);
                i += 1;
            }
            "--json" => parsed.json = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    if parsed.games == 0 {
        return Err("--games must be at least 1".to_string());
    }
    Ok(parsed)
}

fn play_game(config: Config, max_ticks: u64) -> Result<GameResult, String> {
    let mut engine = Engine::with_config(config).map_err(|e| format!("{}", e))?;

    while engine.stats().ticks < max_ticks {
        if engine.tick() == TickOutcome::Terminated {
            break;
        }
    }

    Ok(GameResult {
        length: engine.snake().len(),
        ticks: engine.stats().ticks,
        consumed: engine.stats().consumed,
        ending: engine.termination().map_or("tick limit", |r| r.as_str()),
    })
}

fn run_strategy(base: &Config, strategy: StrategyId, args: &CompareArgs) -> Result<StrategyReport, String> {
    let started = Instant::now();

    let results: Vec<GameResult> = (0..args.games)
        .into_par_iter()
        .map(|game| {
            let mut config = base.clone();
            config.game.strategy = strategy;
            config.game.seed = Some(args.seed.wrapping_add(game as u64));
            play_game(config, args.max_ticks)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let games = results.len();
    let mut endings = BTreeMap::new();
    for result in &results {
        *endings.entry(result.ending).or_insert(0) += 1;
    }

    Ok(StrategyReport {
        strategy,
        games,
        avg_length: results.iter().map(|r| r.length as f64).sum::<f64>() / games as f64,
        max_length: results.iter().map(|r| r.length).max().unwrap_or(0),
        avg_ticks: results.iter().map(|r| r.ticks as f64).sum::<f64>() / games as f64,
        avg_consumed: results.iter().map(|r| r.consumed as f64).sum::<f64>() / games as f64,
        endings,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

fn print_report(reports: &[StrategyReport], args: &CompareArgs, grid_size: i32) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("              STRATEGY COMPARISON");
    println!("═══════════════════════════════════════════════════════════");
    println!("Grid:            {}x{}", grid_size, grid_size);
    println!("Games/strategy:  {}", args.games);
    println!("Tick limit:      {}", args.max_ticks);
    println!("Base seed:       {}", args.seed);
    println!("═══════════════════════════════════════════════════════════\n");

    println!(
        "{:<16} {:>9} {:>8} {:>10} {:>10} {:>9}",
        "strategy", "avg len", "max len", "avg ticks", "avg eaten", "time ms"
    );
    println!("───────────────────────────────────────────────────────────────────");
    for report in reports {
        println!(
            "{:<16} {:>9.1} {:>8} {:>10.1} {:>10.1} {:>9}",
            report.strategy.as_str(),
            report.avg_length,
            report.max_length,
            report.avg_ticks,
            report.avg_consumed,
            report.elapsed_ms
        );
    }

    println!("\nEndings:");
    for report in reports {
        let endings: Vec<String> = report
            .endings
            .iter()
            .map(|(ending, count)| format!("{} x{}", ending, count))
            .collect();
        println!("  {:<16} {}", report.strategy.as_str(), endings.join(", "));
    }

    if let Some(best) = reports
        .iter()
        .max_by(|a, b| a.avg_length.total_cmp(&b.avg_length))
    {
        println!("\nLongest on average: {} ({:.1})", best.strategy, best.avg_length);
    }
    println!("═══════════════════════════════════════════════════════════\n");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let compare_args = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let mut base = match &compare_args.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };
    if let Some(grid_size) = compare_args.grid_size {
        base.game.grid_size = grid_size;
    }

    let started = Instant::now();
    let mut reports = Vec::with_capacity(compare_args.strategies.len());
    for strategy in &compare_args.strategies {
        if !compare_args.json {
            eprintln!("Running {} games of {}...", compare_args.games, strategy);
        }
        match run_strategy(&base, *strategy, &compare_args) {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    if compare_args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_report(&reports, &compare_args, base.game.grid_size);
    }

    simple_profiler::merge_all_threads();
    simple_profiler::print_report(started.elapsed().as_millis() as u64);
}
