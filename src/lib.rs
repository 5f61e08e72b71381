//! rel-quantile-sketch: a streaming relative-error quantile sketch
//!
//! Implements a KLL-family compactor stack that answers approximate
//! rank/quantile/CDF queries over a data stream in a single pass, with a
//! relative (rather than additive) error guarantee, and an optional
//! "important quantiles" mechanism that shifts sketch capacity toward
//! user-chosen quantiles at the expense of accuracy elsewhere.
//!
//! Two compaction schemes are available, selected by the `improved` flag on
//! [`Sketch::new`]/[`Sketch::with_seed`]: a baseline scheme and a refined one
//! that adds an offset/shift randomization and an eager, size-triggered
//! compaction policy.
//!
//! ```
//! use rel_quantile_sketch::Sketch;
//!
//! let mut sketch = Sketch::with_seed(0.01, 0.01, 0.0, vec![], false, 42).unwrap();
//! for i in 1..=100_000i64 {
//!     sketch.update(i);
//! }
//! println!("median ~= {}", sketch.quantile(0.5).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bits;
mod compactor;
pub mod common;
mod sketch;
pub mod stream;

pub use common::{Result, SketchError};
pub use sketch::{LevelStats, Sketch};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_round_trips_a_small_stream() {
        let mut sketch = Sketch::with_seed(0.05, 0.05, 0.0, vec![], false, 99).unwrap();
        for i in 1..=1000i64 {
            sketch.update(i);
        }
        assert_eq!(sketch.n(), 1000);
        assert!(sketch.quantile(0.5).is_ok());
    }
}
