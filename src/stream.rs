//! Synthetic integer streams for exercising a [`crate::Sketch`] under
//! different arrival orders.
//!
//! Mirrors the standard stream orders used to stress-test relative-error
//! quantile sketches: several adversarial reorderings of `1..=n` plus a
//! uniform random shuffle.

use rand::seq::SliceRandom;
use rand::Rng;

/// The order in which [`generate`] emits `1..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrder {
    /// Ascending `1, 2, .., n`.
    Sorted,
    /// Descending `n, n-1, .., 1`.
    Reversed,
    /// Alternating smallest/largest remaining item.
    ZoomIn,
    /// Alternating from the middle outward.
    ZoomOut,
    /// Increasing strides of increasing length, approximating a `sqrt(n)` sawtooth.
    Sqrt,
    /// A uniform random permutation of `1..=n`.
    Random,
    /// Adversarial order built from `p` descending runs plus a mid-stream probe.
    Adv,
    /// `p`-sized ascending clusters separated by gaps of size `g`.
    Clustered,
    /// Clustered order visited inward then back outward, like [`StreamOrder::ZoomIn`].
    ClusteredZoomIn,
}

impl StreamOrder {
    /// Parses the CLI/original names for each order.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "sorted" => Self::Sorted,
            "reversed" => Self::Reversed,
            "zoomin" => Self::ZoomIn,
            "zoomout" => Self::ZoomOut,
            "sqrt" => Self::Sqrt,
            "random" => Self::Random,
            "adv" => Self::Adv,
            "clustered" => Self::Clustered,
            "clustered-zoomin" => Self::ClusteredZoomIn,
            _ => return None,
        })
    }
}

/// Extra knobs used only by [`StreamOrder::Adv`], [`StreamOrder::Clustered`]
/// and [`StreamOrder::ClusteredZoomIn`].
#[derive(Debug, Clone, Copy)]
pub struct StreamParams {
    /// Cluster/run size.
    pub p: i64,
    /// Gap between clusters.
    pub g: i64,
    /// Density of items sprinkled into the gaps.
    pub s: i64,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self { p: 1000, g: 0, s: 1 }
    }
}

/// Generates `n` items of the given [`StreamOrder`], using `rng` for
/// [`StreamOrder::Random`].
pub fn generate(n: i64, order: StreamOrder, params: StreamParams, rng: &mut impl Rng) -> Vec<i64> {
    match order {
        StreamOrder::Sorted => (1..=n).collect(),
        StreamOrder::Reversed => (1..=n).rev().collect(),
        StreamOrder::ZoomIn => zoom_in(n),
        StreamOrder::ZoomOut => zoom_out(n),
        StreamOrder::Sqrt => sqrt_order(n),
        StreamOrder::Random => {
            let mut items: Vec<i64> = (1..=n).collect();
            items.shuffle(rng);
            items
        }
        StreamOrder::Adv => adv_order(n, params),
        StreamOrder::Clustered => clustered_order(n, params, false),
        StreamOrder::ClusteredZoomIn => clustered_order(n, params, true),
    }
}

fn zoom_in(n: i64) -> Vec<i64> {
    let mut out = Vec::with_capacity(n as usize);
    for item in 1..=(n / 2) {
        out.push(item);
        out.push(n - item + 1);
    }
    out
}

fn zoom_out(n: i64) -> Vec<i64> {
    let mut out = Vec::with_capacity(n as usize);
    for item in 0..(n / 2) {
        out.push(n / 2 + item + 1);
        out.push(n / 2 - item);
    }
    out
}

fn sqrt_order(n: i64) -> Vec<i64> {
    let t = ((2 * n) as f64).sqrt() as i64;
    let mut out = Vec::new();
    let mut initial_item = 0i64;
    let mut initial_skip = 1i64;
    for i in 0..t {
        let mut item = initial_item;
        let mut skip = initial_skip;
        for _ in 0..(t - i) {
            out.push(item + 1);
            item += skip;
            skip += 1;
        }
        initial_skip += 1;
        initial_item += initial_skip;
    }
    out
}

fn adv_order(n: i64, params: StreamParams) -> Vec<i64> {
    let StreamParams { p, g, s } = params;
    let m = n.div_ceil(p);
    let mut out = Vec::new();
    for i in 0..p {
        let mut j = s * (g + p + m * (p - i));
        let stop = s * (g + p + m * (p - i - 1));
        while j > stop {
            out.push(j);
            j -= s;
        }
        out.push(i);
        if i == p / 2 {
            let stop2 = s * (g + p + m);
            let step2 = (s * (g + p + m) / 10).max(1);
            let mut j2 = p;
            while j2 < stop2 {
                out.push(j2);
                j2 += step2;
            }
        }
    }
    out
}

fn clustered_order(n: i64, params: StreamParams, zoom_in_variant: bool) -> Vec<i64> {
    let StreamParams { p, g, s } = params;
    let m = n.div_ceil(p);
    let mut out = Vec::new();

    let gap_step = (g / s).max(1);
    if zoom_in_variant {
        for i in 0..m {
            let mut j = i * g;
            while j < i * g + p {
                out.push(i * g + j / p.max(1));
                j += 2;
            }
        }
        for i in 0..m {
            let mut j = i * g + p;
            while j < (i + 1) * g {
                out.push(j);
                j += gap_step;
            }
        }
        for i in (1..m).rev() {
            let mut j = i * g + p;
            while j > i * g {
                out.push(i * g + (j + 1) / p.max(1));
                j -= 2;
            }
        }
    } else {
        for i in 0..m {
            for j in i * g..i * g + p {
                out.push(i * g + j / p.max(1));
            }
        }
        for i in 0..m {
            let mut j = i * g + p;
            while j < (i + 1) * g {
                out.push(j);
                j += gap_step;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sorted_is_ascending() {
        let mut rng = StdRng::seed_from_u64(1);
        let stream = generate(10, StreamOrder::Sorted, StreamParams::default(), &mut rng);
        assert_eq!(stream, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn reversed_is_descending() {
        let mut rng = StdRng::seed_from_u64(1);
        let stream = generate(10, StreamOrder::Reversed, StreamParams::default(), &mut rng);
        assert_eq!(stream, (1..=10).rev().collect::<Vec<_>>());
    }

    #[test]
    fn random_is_a_permutation_of_1_to_n() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut stream = generate(500, StreamOrder::Random, StreamParams::default(), &mut rng);
        stream.sort_unstable();
        assert_eq!(stream, (1..=500).collect::<Vec<_>>());
    }

    #[test]
    fn zoomin_alternates_smallest_and_largest() {
        let mut rng = StdRng::seed_from_u64(1);
        let stream = generate(6, StreamOrder::ZoomIn, StreamParams::default(), &mut rng);
        assert_eq!(&stream[..4], &[1, 6, 2, 5]);
    }

    #[test]
    fn parse_accepts_every_documented_name() {
        for name in [
            "sorted",
            "reversed",
            "zoomin",
            "zoomout",
            "sqrt",
            "random",
            "adv",
            "clustered",
            "clustered-zoomin",
        ] {
            assert!(StreamOrder::parse(name).is_some(), "{name}");
        }
        assert!(StreamOrder::parse("bogus").is_none());
    }
}
