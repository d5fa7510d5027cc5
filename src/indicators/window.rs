use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use crate::models::PriceSample;

/// How a [`PriceWindow`] sheds old samples.
#[derive(Debug, Clone, Copy)]
enum WindowBound {
    /// Evict entries older than the given age, relative to the newest
    /// observation.
    Age(Duration),
    /// Evict oldest entries beyond a fixed count.
    Count(usize),
}

/// Bounded rolling buffer of price samples, in chronological insertion
/// order. Samples never sit outside the bound after a push or an explicit
/// eviction pass.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    samples: VecDeque<PriceSample>,
    bound: WindowBound,
    seen: u64,
}

impl PriceWindow {
    /// Window that keeps samples no older than `max_age`.
    pub fn by_age(max_age: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            bound: WindowBound::Age(max_age),
            seen: 0,
        }
    }

    /// Window that keeps at most `max_len` samples, oldest evicted first.
    pub fn by_count(max_len: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_len + 1),
            bound: WindowBound::Count(max_len),
            seen: 0,
        }
    }

    /// Append a sample and trim the window back inside its bound.
    pub fn push(&mut self, sample: PriceSample) {
        self.seen += 1;
        let now = sample.timestamp;
        self.samples.push_back(sample);
        match self.bound {
            WindowBound::Count(max_len) => {
                while self.samples.len() > max_len {
                    self.samples.pop_front();
                }
            }
            WindowBound::Age(_) => self.evict_older_than(now),
        }
    }

    /// Drop samples that have aged out as of `now`. No-op for
    /// count-bounded windows.
    pub fn evict_older_than(&mut self, now: DateTime<Utc>) {
        if let WindowBound::Age(max_age) = self.bound {
            let cutoff = now - max_age;
            while self
                .samples
                .front()
                .is_some_and(|s| s.timestamp < cutoff)
            {
                self.samples.pop_front();
            }
        }
    }

    /// Highest price currently in the window.
    pub fn high(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.price).reduce(f64::max)
    }

    /// Lowest price currently in the window.
    pub fn low(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.price).reduce(f64::min)
    }

    /// All held prices, oldest first.
    pub fn prices(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    /// Total samples pushed over the window's lifetime, including ones
    /// already evicted. Lets callers distinguish "buffer just filled" from
    /// "buffer full and rotating".
    pub fn samples_seen(&self) -> u64 {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Discard all held samples. The lifetime counter keeps counting.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
