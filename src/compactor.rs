//! A single level of the compactor stack
//!
//! Each [`Compactor`] is a sorted buffer holding items of weight `2^h`. When
//! it overflows its capacity, `normal_compaction` (or, while growing,
//! `full_compaction`) sorts the buffer, keeps the smallest "protected" items,
//! and emits roughly half of the rest up to the next level.

use std::collections::HashSet;

use rand::Rng;

use crate::bits::trailing_ones;

const SMALLEST_MEANINGFUL_SECTION_SIZE: usize = 4;

/// Sketch-wide state a compactor needs to size itself and schedule compactions.
///
/// The sketch owns every compactor; rather than give each compactor a
/// back-pointer to its owner (a cyclic reference the source's subclassed-list
/// design relies on), the sketch passes this snapshot into the operations
/// that need it.
pub(crate) struct LevelContext<'a> {
    pub num_levels: usize,
    pub important_levels: &'a HashSet<usize>,
    pub epsilon: f64,
    pub probability_constant: f64,
    pub j: f64,
    pub improved: bool,
}

/// Which capacity/trigger formula this compactor follows.
///
/// `Improved` removes the `sqrt(log)` growth term from the capacity formula
/// in favor of a `H^0.5` constant, and activates the offset/shift refinement
/// in [`Compactor::compact`].
impl LevelContext<'_> {
    fn init_sections(&self) -> f64 {
        if self.improved {
            1.5
        } else {
            2.0
        }
    }
}

/// A sorted buffer at level `h`, holding items of weight `2^h`.
#[derive(Debug, Clone)]
pub(crate) struct Compactor {
    items: Vec<i64>,
    h: usize,
    capacity: usize,
    section_size: usize,
    num_compactions: u64,
    state: u64,
    // Improved-variant only: re-randomized every other compaction.
    offset: u8,
    shift: u8,
}

impl Compactor {
    pub(crate) fn new(h: usize) -> Self {
        Self {
            items: Vec::new(),
            h,
            capacity: 0,
            section_size: 0,
            num_compactions: 0,
            state: 0,
            offset: 0,
            shift: 0,
        }
    }

    pub(crate) fn h(&self) -> usize {
        self.h
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn section_size(&self) -> usize {
        self.section_size
    }

    pub(crate) fn num_compactions(&self) -> u64 {
        self.num_compactions
    }

    pub(crate) fn items(&self) -> &[i64] {
        &self.items
    }

    pub(crate) fn push(&mut self, item: i64) {
        self.items.push(item);
    }

    pub(crate) fn extend(&mut self, items: impl IntoIterator<Item = i64>) {
        self.items.extend(items);
    }

    pub(crate) fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Number of items `<= value` currently held (linear scan).
    pub(crate) fn count_at_most(&self, value: i64) -> u64 {
        self.items.iter().filter(|&&v| v <= value).count() as u64
    }

    /// Distance-scaled capacity penalty: levels far from every important
    /// level get a smaller capacity, capped at `H`.
    fn scale(&self, ctx: &LevelContext) -> f64 {
        let dist = ctx
            .important_levels
            .iter()
            .map(|&l| (self.h as i64 - l as i64).unsigned_abs())
            .min();

        let scale = match dist {
            None | Some(0) => 1.0,
            Some(1) => 1.5_f64.powf(ctx.j),
            Some(d) => (d as f64).powf(ctx.j),
        };
        scale.min(ctx.num_levels as f64)
    }

    pub(crate) fn recompute_capacity_and_section_size(&mut self, ctx: &LevelContext) {
        let scale = self.scale(ctx);
        let h = ctx.num_levels as f64;

        self.capacity = if ctx.improved {
            (ctx.probability_constant * h.powf(0.5 + ctx.j.min(1.0)) / (scale * ctx.epsilon))
                .floor() as usize
        } else {
            let log_term = (2.0 + self.num_compactions as f64).log2().sqrt();
            (ctx.probability_constant * h.powf(ctx.j.min(1.0)) * log_term / (scale * ctx.epsilon))
                .floor() as usize
        };

        self.section_size = (self.capacity as f64
            / (2.0 * ctx.init_sections() * (2.0 + self.num_compactions as f64).log2()))
        .floor() as usize;
    }

    fn reset_compaction_schedule(&mut self, ctx: &LevelContext) {
        self.state = 0;
        self.recompute_capacity_and_section_size(ctx);
    }

    /// How many of the smallest items to protect from this compaction.
    fn count_protected(&mut self, ctx: &LevelContext) -> usize {
        let right_part = self.capacity / 2;
        let rest = self.items.len().saturating_sub(self.capacity);

        let mut compacted = if self.section_size < SMALLEST_MEANINGFUL_SECTION_SIZE {
            right_part + rest
        } else {
            let sections = trailing_ones(self.state) as usize + 1;
            self.state += 1;
            let mut right_compacted = sections * self.section_size;
            if right_compacted >= right_part {
                right_compacted = right_part;
                self.reset_compaction_schedule(ctx);
            }
            right_compacted + rest
        };
        if compacted % 2 == 1 {
            compacted += 1;
        }
        self.items.len() - compacted
    }

    /// Compacts everything except the left half (plus one), for use while growing.
    ///
    /// A no-op if the level is already at or under that protected size (e.g.
    /// right after a `normal_compaction` that left it at `capacity/2`).
    pub(crate) fn full_compaction(&mut self, ctx: &LevelContext, rng: &mut impl Rng) -> Vec<i64> {
        let mut protected = self.capacity / 2 + 1;
        if self.items.len() <= protected {
            self.reset_compaction_schedule(ctx);
            return Vec::new();
        }
        if (self.items.len() - protected) % 2 == 1 {
            protected -= 1;
        }
        self.reset_compaction_schedule(ctx);
        self.compact(protected, ctx.improved, rng)
    }

    /// Compacts by the deterministic schedule. Precondition: `is_full()`.
    pub(crate) fn normal_compaction(&mut self, ctx: &LevelContext, rng: &mut impl Rng) -> Vec<i64> {
        debug_assert!(self.is_full());
        let protected = self.count_protected(ctx);
        self.compact(protected, ctx.improved, rng)
    }

    /// Compacts all items except the smallest `protected`, returning the
    /// items promoted to the next level.
    fn compact(&mut self, protected: usize, improved: bool, rng: &mut impl Rng) -> Vec<i64> {
        debug_assert_eq!((self.items.len() - protected) % 2, 0);
        self.items.sort_unstable();

        let promoted = if improved {
            // Re-randomize offset and shift independently, alternating which
            // one is random vs. flipped, each compaction.
            if self.num_compactions % 2 == 1 {
                self.offset = 1 - self.offset;
                self.shift = u8::from(rng.random_bool(0.5));
            } else {
                self.offset = u8::from(rng.random_bool(0.5));
                self.shift = 1 - self.shift;
            }

            let start = protected as isize + self.offset as isize - self.shift as isize;
            let end = self.items.len() as isize - self.shift as isize;
            let mut out = Vec::with_capacity((self.items.len() - protected) / 2);
            let mut i = start;
            while i < end {
                out.push(self.items[i as usize]);
                i += 2;
            }

            let del_start = (protected as isize - self.shift as isize) as usize;
            let del_end = (self.items.len() as isize - self.shift as isize) as usize;
            self.items.drain(del_start..del_end);
            out
        } else {
            let r = usize::from(rng.random_bool(0.5));
            let out: Vec<i64> = self.items[protected + r..].iter().step_by(2).copied().collect();
            self.items.truncate(protected);
            out
        };

        self.num_compactions += 1;
        debug_assert!(!self.is_full());
        promoted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ctx(num_levels: usize, improved: bool) -> (HashSet<usize>, LevelContext<'static>) {
        // Leaked on purpose to get a 'static borrow for these focused unit tests.
        let important: &'static HashSet<usize> = Box::leak(Box::new(HashSet::new()));
        (
            HashSet::new(),
            LevelContext {
                num_levels,
                important_levels: important,
                epsilon: 0.1,
                probability_constant: 2.0,
                j: 0.0,
                improved,
            },
        )
    }

    #[test]
    fn capacity_is_positive_for_reasonable_params() {
        let (_set, ctx) = ctx(1, false);
        let mut c = Compactor::new(0);
        c.recompute_capacity_and_section_size(&ctx);
        assert!(c.capacity() > 0);
    }

    #[test]
    fn full_compaction_leaves_compactor_under_capacity() {
        let (_set, ctx) = ctx(1, false);
        let mut c = Compactor::new(0);
        c.recompute_capacity_and_section_size(&ctx);
        for i in 0..(c.capacity() as i64 * 2) {
            c.push(i);
        }
        let mut rng = StdRng::seed_from_u64(42);
        let promoted = c.full_compaction(&ctx, &mut rng);
        assert!(!promoted.is_empty());
        assert!(!c.is_full());
    }

    #[test]
    fn normal_compaction_preserves_mass() {
        let (_set, ctx) = ctx(1, true);
        let mut c = Compactor::new(0);
        c.recompute_capacity_and_section_size(&ctx);
        let cap = c.capacity();
        for i in 0..cap as i64 {
            c.push(i);
        }
        let before = c.len();
        let mut rng = StdRng::seed_from_u64(7);
        let promoted = c.normal_compaction(&ctx, &mut rng);
        assert_eq!(c.len() + promoted.len() * 2, before);
    }

    #[test]
    fn count_at_most_counts_correctly() {
        let mut c = Compactor::new(0);
        for i in [3, 1, 5, 2, 4] {
            c.push(i);
        }
        assert_eq!(c.count_at_most(3), 3);
        assert_eq!(c.count_at_most(0), 0);
        assert_eq!(c.count_at_most(5), 5);
    }
}
