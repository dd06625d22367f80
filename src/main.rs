// Headless host for the snake autopilot
//
// Owns the tick cadence: one engine tick per interval, the interval shrinks
// every time a target is consumed, and the game is reset when it terminates.
//
// Usage:
//   snake-autopilot [--config <path>] [--strategy <id>] [--games <n>] [--seed <n>] [--fast]

use log::{error, info};
use std::env;
use std::future::Future;
use std::process;
use std::time::{Duration, Instant};

use snake_autopilot::config::Config;
use snake_autopilot::engine::Engine;
use snake_autopilot::simple_profiler;
use snake_autopilot::strategy::StrategyId;
use snake_autopilot::types::TickOutcome;

struct HostArgs {
    config_path: Option<String>,
    strategy: Option<StrategyId>,
    games: u32,
    seed: Option<u64>,
    fast: bool,
}

fn print_usage() {
    eprintln!("Snake Autopilot");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  snake-autopilot [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --config <path>     Path to Snake.toml (default: Snake.toml)");
    eprintln!("  --strategy <id>     Override the configured strategy");
    eprintln!("  --games <n>         Number of games to play (default: 1)");
    eprintln!("  --seed <n>          Seed the engine RNG");
    eprintln!("  --fast              Tick as fast as possible, ignoring host timing");
    eprintln!("  --help              Show this help message");
}

fn parse_args(args: &[String]) -> Result<HostArgs, String> {
    let mut parsed = HostArgs {
        config_path: None,
        strategy: None,
        games: 1,
        seed: None,
        fast: false,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| format!("{} requires a value", flag));

        match flag {
            "--config" => {
                parsed.config_path = Some(value?);
                i += 1;
            }
            "--strategy" => {
                parsed.strategy = Some(value?.parse().map_err(|e| format!("{}", e))?);
                i += 1;
            }
            "--games" => {
                parsed.games = value?
                    .parse()
                    .map_err(|e| format!("Invalid game count: {}", e))?;
                i += 1;
            }
            "--seed" => {
                parsed.seed = Some(value?.parse().map_err(|e| format!("Invalid seed: {}", e))?);
                i += 1;
            }
            "--fast" => parsed.fast = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(parsed)
}

/// Waits out `pause` before the next tick, or only yields when there is none.
/// Returns true if `shutdown` fired first.
async fn wait_for_tick<S>(shutdown: &mut S, pause: Option<Duration>) -> bool
where
    S: Future + Unpin,
{
    match pause {
        Some(pause) => tokio::select! {
            _ = shutdown => true,
            _ = tokio::time::sleep(pause) => false,
        },
        None => tokio::select! {
            biased;
            _ = shutdown => true,
            _ = tokio::task::yield_now() => false,
        },
    }
}

#[tokio::main]
async fn main() {
    // Default to 'info' level logging unless RUST_LOG is already set
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let host_args = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let mut config = match &host_args.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };
    if let Some(strategy) = host_args.strategy {
        config.game.strategy = strategy;
    }
    if host_args.seed.is_some() {
        config.game.seed = host_args.seed;
    }

    let host = config.host.clone();
    let mut engine = match Engine::with_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    info!("Starting Snake Autopilot ({} games)...", host_args.games);

    let started = Instant::now();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut interval = Duration::from_millis(host.tick_interval_ms(0));
    let mut finished = 0;

    while finished < host_args.games {
        let pause = if host_args.fast { None } else { Some(interval) };
        if wait_for_tick(&mut shutdown, pause).await {
            info!("Interrupted, stopping");
            break;
        }

        // Search policies are CPU-bound; keep them off the async workers
        let (returned, outcome) = match tokio::task::spawn_blocking(move || {
            let outcome = engine.tick();
            (engine, outcome)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("Tick task failed: {}", e);
                process::exit(1);
            }
        };
        engine = returned;

        match outcome {
            TickOutcome::Continued => {}
            TickOutcome::Consumed => {
                interval = Duration::from_millis(host.tick_interval_ms(engine.stats().consumed));
            }
            TickOutcome::Terminated => {
                finished += 1;
                println!(
                    "Game {}: {} after {} ticks, length {}, consumed {}",
                    finished,
                    engine.termination().map_or("unknown", |r| r.as_str()),
                    engine.stats().ticks,
                    engine.snake().len(),
                    engine.stats().consumed
                );
                if finished < host_args.games {
                    engine.reset();
                    interval = Duration::from_millis(host.tick_interval_ms(0));
                }
            }
        }
    }

    info!(
        "Finished {} games in {}ms (best length {})",
        finished,
        started.elapsed().as_millis(),
        engine.stats().best_length
    );

    simple_profiler::merge_all_threads();
    simple_profiler::print_report(started.elapsed().as_millis() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    #[tokio::test]
    async fn test_fast_mode_still_sees_shutdown() {
        let mut shutdown = future::ready(());
        assert!(wait_for_tick(&mut shutdown, None).await);
    }

    #[tokio::test]
    async fn test_fast_mode_continues_without_shutdown() {
        let mut shutdown = future::pending::<()>();
        assert!(!wait_for_tick(&mut shutdown, None).await);
    }

    #[tokio::test]
    async fn test_timed_tick_waits_for_interval() {
        let mut shutdown = future::pending::<()>();
        assert!(!wait_for_tick(&mut shutdown, Some(Duration::from_millis(1))).await);

        let mut shutdown = future::ready(());
        assert!(wait_for_tick(&mut shutdown, Some(Duration::from_secs(60))).await);
    }
}
