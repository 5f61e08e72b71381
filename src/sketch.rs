//! The relative-error quantile sketch itself
//!
//! [`Sketch`] owns a stack of [`Compactor`]s, one per level `h`, where level
//! `h` holds items of weight `2^h`. New items always enter level 0;
//! `update` triggers `compress` once a level overflows its capacity, which
//! promotes roughly half of that level's items up to the next one. When the
//! top level would overflow, the sketch `grow`s instead, adding a new level.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::common::validation::{
    validate_delta, validate_epsilon, validate_important_quantiles, validate_j,
    validate_j_requires_quantiles, validate_query_quantile,
};
use crate::common::{Result, SketchError};
use crate::compactor::{Compactor, LevelContext};

/// A snapshot of one compactor's sizing and compaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    /// Number of items currently held at this level.
    pub len: usize,
    /// Current target maximum size.
    pub capacity: usize,
    /// Current schedule block size.
    pub section_size: usize,
    /// Number of times this level has compacted.
    pub num_compactions: u64,
}

/// A streaming relative-error quantile sketch.
///
/// # Examples
///
/// ```
/// use rel_quantile_sketch::Sketch;
///
/// let mut sketch = Sketch::with_seed(0.01, 0.01, 0.0, vec![], false, 7).unwrap();
/// for i in 0..10_000 {
///     sketch.update(i);
/// }
/// let median = sketch.quantile(0.5).unwrap();
/// assert!((4000..6000).contains(&median));
/// ```
pub struct Sketch {
    epsilon: f64,
    delta: f64,
    j: f64,
    important_quantiles: Vec<f64>,
    improved: bool,
    probability_constant: f64,
    important_levels: HashSet<usize>,
    compactors: Vec<Compactor>,
    n: u64,
    rng: StdRng,
}

impl Sketch {
    /// Build a sketch seeded from the OS entropy source.
    ///
    /// `epsilon` is the target relative-rank error, `delta` the allowed
    /// failure probability, `j` the importance weight given to
    /// `important_quantiles` (`0.0` disables the important-levels boost and
    /// requires `important_quantiles` to be empty). `improved` selects the
    /// offset/shift refined compaction scheme over the baseline one.
    pub fn new(
        epsilon: f64,
        delta: f64,
        j: f64,
        important_quantiles: Vec<f64>,
        improved: bool,
    ) -> Result<Self> {
        Self::with_rng(
            epsilon,
            delta,
            j,
            important_quantiles,
            improved,
            StdRng::from_os_rng(),
        )
    }

    /// Build a sketch with a fixed RNG seed, for reproducible runs and tests.
    pub fn with_seed(
        epsilon: f64,
        delta: f64,
        j: f64,
        important_quantiles: Vec<f64>,
        improved: bool,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            epsilon,
            delta,
            j,
            important_quantiles,
            improved,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        epsilon: f64,
        delta: f64,
        j: f64,
        important_quantiles: Vec<f64>,
        improved: bool,
        rng: StdRng,
    ) -> Result<Self> {
        validate_epsilon(epsilon)?;
        validate_delta(delta)?;
        validate_j(j)?;
        validate_important_quantiles(&important_quantiles)?;
        validate_j_requires_quantiles(j, &important_quantiles)?;

        let probability_constant = (1.0_f64 / delta).ln().sqrt();
        let mut sketch = Self {
            epsilon,
            delta,
            j,
            important_quantiles,
            improved,
            probability_constant,
            important_levels: HashSet::new(),
            compactors: vec![Compactor::new(0)],
            n: 0,
            rng,
        };
        sketch.recompute_level(0);
        Ok(sketch)
    }

    /// Number of levels currently in the compactor stack.
    pub fn h(&self) -> usize {
        self.compactors.len()
    }

    /// Number of items observed since construction.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Relative-rank error target this sketch was built with.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Failure probability this sketch was built with.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Total number of items currently retained across all levels.
    pub fn size(&self) -> u64 {
        self.compactors.iter().map(|c| c.len() as u64).sum()
    }

    /// Sum of per-level capacities across all levels.
    pub fn total_capacity(&self) -> u64 {
        self.compactors.iter().map(|c| c.capacity() as u64).sum()
    }

    /// The levels currently boosted by the important-quantiles mechanism.
    pub fn important_levels(&self) -> &HashSet<usize> {
        &self.important_levels
    }

    /// Per-level diagnostics, one entry per compactor from level 0 up.
    pub fn level_stats(&self) -> Vec<LevelStats> {
        self.compactors
            .iter()
            .map(|c| LevelStats {
                len: c.len(),
                capacity: c.capacity(),
                section_size: c.section_size(),
                num_compactions: c.num_compactions(),
            })
            .collect()
    }

    fn ctx(&self) -> LevelContext<'_> {
        LevelContext {
            num_levels: self.compactors.len(),
            important_levels: &self.important_levels,
            epsilon: self.epsilon,
            probability_constant: self.probability_constant,
            j: self.j,
            improved: self.improved,
        }
    }

    fn recompute_level(&mut self, h: usize) {
        let ctx = self.ctx();
        self.compactors[h].recompute_capacity_and_section_size(&ctx);
    }

    /// Add one item to the sketch.
    pub fn update(&mut self, item: i64) {
        self.compactors[0].push(item);
        self.n += 1;
        if self.improved {
            if self.size() >= self.total_capacity() {
                self.compress();
            }
            debug_assert!(self.size() < self.total_capacity());
        } else if self.compactors[0].is_full() {
            self.compress();
        }
        debug_assert!(
            self.compactors.iter().all(|c| !c.is_full()),
            "no compactor may be over capacity once update() returns"
        );
    }

    fn compress(&mut self) {
        let n_levels = self.compactors.len();
        for h in 0..n_levels {
            if !self.compactors[h].is_full() {
                if !self.improved {
                    return;
                }
                continue;
            }
            if h + 1 == n_levels {
                self.grow();
                return;
            }
            let ctx = self.ctx();
            let promoted = self.compactors[h].normal_compaction(&ctx, &mut self.rng);
            self.compactors[h + 1].extend(promoted);
            if self.improved && self.size() < self.total_capacity() {
                return;
            }
        }
    }

    fn grow(&mut self) {
        let n_levels = self.compactors.len();
        self.compactors.push(Compactor::new(n_levels));
        self.recompute_level(n_levels);

        for h in 0..n_levels {
            let ctx = self.ctx();
            let promoted = self.compactors[h].full_compaction(&ctx, &mut self.rng);
            self.compactors[h + 1].extend(promoted);
        }
        while self.compactors.last().expect("at least one level").is_full() {
            let new_h = self.compactors.len();
            self.compactors.push(Compactor::new(new_h));
            self.recompute_level(new_h);
            let ctx = self.ctx();
            let src = self.compactors.len() - 2;
            let promoted = self.compactors[src].full_compaction(&ctx, &mut self.rng);
            self.compactors
                .last_mut()
                .expect("just pushed")
                .extend(promoted);
        }

        self.update_important_levels();
        let n_levels = self.compactors.len();
        for h in 0..n_levels {
            self.recompute_level(h);
        }
    }

    /// Recomputes which levels are "important" given the current data size.
    ///
    /// Only ever called right after [`Self::grow`], per the two variants'
    /// respective formulas: the baseline variant derives important levels
    /// from a closed-form rank estimate; the improved variant looks up the
    /// level actually holding each important quantile's current estimate.
    fn update_important_levels(&mut self) {
        self.important_levels.clear();
        let quantiles = self.important_quantiles.clone();
        if self.improved {
            for q in quantiles {
                if let Ok(item) = self.quantile(q) {
                    let level = self.important_level_for_item(item);
                    self.important_levels.insert(level);
                }
            }
        } else {
            let h = self.compactors.len() as f64;
            for q in quantiles {
                let r = (q * self.n as f64).ceil().max(1.0);
                let level = (self.epsilon * r * 8.0
                    / (self.probability_constant * h.powf(0.5 + self.j.min(1.0))))
                .log2()
                .max(0.0) as usize;
                self.important_levels.insert(level);
            }
        }
    }

    /// Binary search over compactor minimums for the level holding `x`.
    ///
    /// Relies on each compactor being sorted from the full compaction pass
    /// that immediately precedes this call in `grow`.
    fn important_level_for_item(&self, x: i64) -> usize {
        let mut i: isize = 0;
        let mut j: isize = self.compactors.len() as isize - 1;
        while i < j - 1 {
            let m = (i + j) / 2;
            let level_min = self.compactors[m as usize].items().first().copied();
            match level_min {
                Some(min) if x >= min => i = m,
                _ => j = m,
            }
        }
        i.max(0) as usize
    }

    /// All retained items paired with their cumulative weighted rank, sorted by item.
    pub fn ranks(&self) -> Vec<(i64, u64)> {
        let mut items_and_weights: Vec<(i64, u64)> = Vec::new();
        for (h, compactor) in self.compactors.iter().enumerate() {
            let weight = 1u64 << h;
            items_and_weights.extend(compactor.items().iter().map(|&item| (item, weight)));
        }
        items_and_weights.sort_unstable();

        let mut cum_weight = 0u64;
        items_and_weights
            .into_iter()
            .map(|(item, weight)| {
                cum_weight += weight;
                (item, cum_weight)
            })
            .collect()
    }

    /// Cumulative distribution function: retained items paired with a rank fraction in `[0, 1]`.
    pub fn cdf(&self) -> Vec<(i64, f64)> {
        let ranks = self.ranks();
        match ranks.last() {
            None => Vec::new(),
            Some(&(_, total_weight)) => ranks
                .into_iter()
                .map(|(item, weight)| (item, weight as f64 / total_weight as f64))
                .collect(),
        }
    }

    /// Approximate rank (count of items `<= value`, weighted by level).
    pub fn rank(&self, value: i64) -> u64 {
        self.compactors
            .iter()
            .enumerate()
            .map(|(h, c)| c.count_at_most(value) * (1u64 << h))
            .sum()
    }

    /// Approximate `q`-quantile: an input item with rank near `q * n()`.
    pub fn quantile(&self, q: f64) -> Result<i64> {
        validate_query_quantile(q)?;
        let ranks = self.ranks();
        if ranks.is_empty() {
            return Err(SketchError::InvalidParameter {
                param: "q".to_string(),
                value: q.to_string(),
                constraint: "sketch has no items yet".to_string(),
            });
        }

        let desired_rank = q * self.n as f64;
        let mut lo = 0usize;
        let mut hi = ranks.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if desired_rank > ranks[mid].1 as f64 {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(ranks[lo].0)
    }
}
