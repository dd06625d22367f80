//! Lightweight opt-in profiling for the decision hot paths
//!
//! Enable with environment variable: SNAKE_PROFILE=1
//! Guards record elapsed time into per-thread counters; `merge_thread_local`
//! folds them into the global totals that `print_report` reads.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Instrumented code paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    AStar,
    Reachability,
    FloodFill,
    Eval,
    Lookahead,
    Expectimax,
    Rollout,
}

const CATEGORY_COUNT: usize = 7;

impl Category {
    pub fn all() -> [Category; CATEGORY_COUNT] {
        [
            Category::AStar,
            Category::Reachability,
            Category::FloodFill,
            Category::Eval,
            Category::Lookahead,
            Category::Expectimax,
            Category::Rollout,
        ]
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::AStar => "A* Pathfinding",
            Category::Reachability => "Tail Reachability",
            Category::FloodFill => "Flood Fill (Space)",
            Category::Eval => "Evaluation",
            Category::Lookahead => "Lookahead Search",
            Category::Expectimax => "Expectimax Search",
            Category::Rollout => "Rollouts",
        }
    }
}

thread_local! {
    static LOCAL_TIME: RefCell<[u64; CATEGORY_COUNT]> = const { RefCell::new([0; CATEGORY_COUNT]) };
    static LOCAL_COUNT: RefCell<[u64; CATEGORY_COUNT]> = const { RefCell::new([0; CATEGORY_COUNT]) };
}

static GLOBAL_TIME: [AtomicU64; CATEGORY_COUNT] = [const { AtomicU64::new(0) }; CATEGORY_COUNT];
static GLOBAL_COUNT: [AtomicU64; CATEGORY_COUNT] = [const { AtomicU64::new(0) }; CATEGORY_COUNT];

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("SNAKE_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: Category,
}

impl ProfileGuard {
    pub fn new(category: Category) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let idx = self.category.index();
        LOCAL_TIME.with(|t| t.borrow_mut()[idx] += elapsed_ns);
        LOCAL_COUNT.with(|c| c.borrow_mut()[idx] += 1);
    }
}

/// Folds this thread's counters into the global totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    LOCAL_TIME.with(|t| {
        let mut local = t.borrow_mut();
        for (global, value) in GLOBAL_TIME.iter().zip(local.iter_mut()) {
            global.fetch_add(*value, Ordering::Relaxed);
            *value = 0;
        }
    });
    LOCAL_COUNT.with(|c| {
        let mut local = c.borrow_mut();
        for (global, value) in GLOBAL_COUNT.iter().zip(local.iter_mut()) {
            global.fetch_add(*value, Ordering::Relaxed);
            *value = 0;
        }
    });
}

/// Merges counters on every rayon worker, then on the calling thread
pub fn merge_all_threads() {
    if !is_profiling_enabled() {
        return;
    }
    rayon::broadcast(|_| merge_thread_local());
    merge_thread_local();
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for category in Category::all() {
        let time = GLOBAL_TIME[category.index()].load(Ordering::Relaxed);
        let count = GLOBAL_COUNT[category.index()].load(Ordering::Relaxed);
        if count == 0 {
            continue;
        }

        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = time as f64 / (count * 1000) as f64;

        eprintln!("{}:", category.label());
        eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
        eprintln!("  Calls:    {}", count);
        eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
    }

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    for category in Category::all() {
        GLOBAL_TIME[category.index()].store(0, Ordering::Relaxed);
        GLOBAL_COUNT[category.index()].store(0, Ordering::Relaxed);
    }
}
