// Stagnation detection
//
// A snake that survives forever by circling in a small region without growing
// never ends a game on its own. The detector watches growth and recent head
// positions and reports a loop so the driver can terminate and reset.

use std::collections::{HashSet, VecDeque};

use crate::config::StagnationConfig;
use crate::types::{Coord, Snake};

/// Detector verdict after observing one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagnationStatus {
    /// Length increased since the previous observation
    Growing,
    /// No growth for `ticks` consecutive observations
    Stalled { ticks: u32 },
    /// No growth for too long while revisiting only a handful of cells
    LoopDetected,
}

#[derive(Debug, Clone)]
pub struct StagnationDetector {
    config: StagnationConfig,
    prev_length: usize,
    ticks_without_growth: u32,
    recent_heads: VecDeque<Coord>,
}

impl StagnationDetector {
    pub fn new(config: StagnationConfig, initial_length: usize) -> Self {
        StagnationDetector {
            recent_heads: VecDeque::with_capacity(config.window_capacity),
            config,
            prev_length: initial_length,
            ticks_without_growth: 0,
        }
    }

    /// Forgets all history; `initial_length` becomes the growth baseline
    pub fn reset(&mut self, initial_length: usize) {
        self.prev_length = initial_length;
        self.ticks_without_growth = 0;
        self.recent_heads.clear();
    }

    pub fn ticks_without_growth(&self) -> u32 {
        self.ticks_without_growth
    }

    pub fn window_len(&self) -> usize {
        self.recent_heads.len()
    }

    /// Records the snake after a committed move
    pub fn observe(&mut self, snake: &Snake) -> StagnationStatus {
        self.observe_parts(snake.len(), snake.head())
    }

    pub(crate) fn observe_parts(&mut self, length: usize, head: Coord) -> StagnationStatus {
        if length > self.prev_length {
            self.reset(length);
            return StagnationStatus::Growing;
        }

        self.ticks_without_growth += 1;
        self.recent_heads.push_back(head);
        while self.recent_heads.len() > self.config.window_capacity {
            self.recent_heads.pop_front();
        }

        if self.ticks_without_growth > self.config.stall_tick_threshold
            && self.distinct_recent_heads() < self.config.min_distinct_cells
        {
            return StagnationStatus::LoopDetected;
        }

        StagnationStatus::Stalled {
            ticks: self.ticks_without_growth,
        }
    }

    /// Distinct cells among the last `loop_window` heads
    fn distinct_recent_heads(&self) -> usize {
        let skip = self.recent_heads.len().saturating_sub(self.config.loop_window);
        self.recent_heads
            .iter()
            .skip(skip)
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn detector() -> StagnationDetector {
        StagnationDetector::new(Config::default_hardcoded().stagnation, 1)
    }

    #[test]
    fn test_window_is_capped() {
        let mut d = detector();
        for i in 0..250 {
            d.observe_parts(1, Coord::new(i % 20, i / 20));
        }
        assert_eq!(d.window_len(), 200);
        assert_eq!(d.ticks_without_growth(), 250);
    }

    #[test]
    fn test_growth_clears_history() {
        let mut d = detector();
        for _ in 0..30 {
            d.observe_parts(1, Coord::new(0, 0));
        }
        assert_eq!(d.observe_parts(2, Coord::new(0, 1)), StagnationStatus::Growing);
        assert_eq!(d.ticks_without_growth(), 0);
        assert_eq!(d.window_len(), 0);
    }

    #[test]
    fn test_wide_wandering_is_not_a_loop() {
        let mut d = StagnationDetector::new(Config::default_hardcoded().stagnation, 3);
        let mut last = StagnationStatus::Growing;
        for i in 0..300 {
            // 40 distinct cells in every 40-tick window
            last = d.observe_parts(3, Coord::new(i % 40, 0));
        }
        assert_eq!(last, StagnationStatus::Stalled { ticks: 300 });
    }
}
