//! Command-line harness for building and inspecting a [`Sketch`].
//!
//! Generates a synthetic stream, feeds it through a sketch, and reports the
//! resulting capacity/level layout. When `--epsilon` is left at its default
//! of `0`, epsilon is instead found by bisection so that the sketch's total
//! retained-item capacity lands near `--space`.

use clap::Parser;
use rel_quantile_sketch::stream::{self, StreamOrder, StreamParams};
use rel_quantile_sketch::Sketch;
use serde::Serialize;

/// Build and inspect a relative-error quantile sketch over a synthetic stream.
#[derive(Parser, Debug)]
#[command(name = "relq", about = "Relative-error quantile sketch harness")]
struct Cli {
    /// Number of generated stream elements
    #[arg(short = 'n', long, default_value_t = 10_000_000)]
    n: i64,

    /// Order of the streamed integers
    #[arg(long = "order", default_value = "random")]
    order: String,

    /// Number of independent sketches to build, to observe run-to-run variance
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Free-text label included in the summary
    #[arg(long, default_value = "")]
    info: String,

    /// An important quantile to boost accuracy around; may be repeated
    #[arg(short = 'q', long = "q")]
    q: Vec<f64>,

    /// Importance weight J given to important quantiles
    #[arg(short = 'j', long = "j", default_value_t = 0.5)]
    j: f64,

    /// Target relative-rank error; 0 triggers a bisection search for an
    /// epsilon that matches `--space`
    #[arg(long, default_value_t = 0.0)]
    epsilon: f64,

    /// Target total retained-item capacity, used only when bisecting epsilon
    #[arg(long, default_value_t = 10_020.0)]
    space: f64,

    /// Use the offset/shift-refined compaction scheme
    #[arg(long)]
    improved: bool,

    /// RNG seed, for reproducible streams and compaction schedules
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Cluster/run size, used by the `adv`, `clustered` and `clustered-zoomin` orders
    #[arg(short = 'p', long, default_value_t = 1000)]
    p: i64,

    /// Gap between clusters, used by the `adv`, `clustered` and `clustered-zoomin` orders
    #[arg(short = 'g', long, default_value_t = 0)]
    g: i64,

    /// Density of items sprinkled into cluster gaps
    #[arg(short = 's', long, default_value_t = 1)]
    s: i64,

    /// Emit the summary as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SketchSummary {
    n: u64,
    repeat: u32,
    total_capacity: u64,
    max_level_capacity: u64,
    levels: usize,
    j: f64,
    epsilon: f64,
    important_quantiles: Vec<f64>,
    info: String,
}

fn run_once(
    n: i64,
    order: StreamOrder,
    params: StreamParams,
    q: Vec<f64>,
    j: f64,
    epsilon: f64,
    improved: bool,
    seed: u64,
) -> Sketch {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let items = stream::generate(n, order, params, &mut rng);
    let mut sketch =
        Sketch::with_seed(epsilon, 0.01, j, q, improved, seed).expect("valid sketch parameters");
    for item in items {
        sketch.update(item);
    }
    sketch
}

/// Finds an epsilon such that the resulting sketch's total capacity lands
/// within 10 items of `space`, via binary search over `epsilon`.
#[allow(clippy::too_many_arguments)]
fn bisect_epsilon(
    n: i64,
    order: StreamOrder,
    params: StreamParams,
    q: &[f64],
    j: f64,
    space: f64,
    improved: bool,
    seed: u64,
) -> f64 {
    let mut small = 0.001_f64;
    let mut big = 0.1_f64;
    let mut avg = big;
    let mut cap = 0.0_f64;

    while big - small > 0.00001 && (cap - space).abs() > 10.0 {
        avg = ((small + big) / 2.0 * 1_000_000.0).round() / 1_000_000.0;
        let sketch = run_once(n, order, params, q.to_vec(), j, avg, improved, seed);
        cap = sketch.total_capacity() as f64;
        log::debug!("bisect: epsilon={avg} -> capacity={cap} (target {space})");
        if cap > space {
            small = avg;
        } else {
            big = avg;
        }
    }
    avg
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let order = StreamOrder::parse(&cli.order).unwrap_or_else(|| {
        eprintln!("unknown stream order '{}'", cli.order);
        std::process::exit(2);
    });
    let params = StreamParams {
        p: cli.p,
        g: cli.g,
        s: cli.s,
    };
    let q = if cli.q.is_empty() { vec![0.0] } else { cli.q };

    let epsilon = if cli.epsilon == 0.0 {
        log::info!("epsilon unset, bisecting for target space {}", cli.space);
        bisect_epsilon(
            cli.n, order, params, &q, cli.j, cli.space, cli.improved, cli.seed,
        )
    } else {
        cli.epsilon
    };

    let mut last_sketch = None;
    let mut total_capacities = Vec::with_capacity(cli.repeat as usize);
    for run in 0..cli.repeat {
        let sketch = run_once(
            cli.n,
            order,
            params,
            q.clone(),
            cli.j,
            epsilon,
            cli.improved,
            cli.seed.wrapping_add(run as u64),
        );
        total_capacities.push(sketch.total_capacity());
        last_sketch = Some(sketch);
    }
    let sketch = last_sketch.expect("repeat is always >= 1");

    let summary = SketchSummary {
        n: sketch.n(),
        repeat: cli.repeat,
        total_capacity: sketch.total_capacity(),
        max_level_capacity: total_capacities.iter().copied().max().unwrap_or(0),
        levels: sketch.h(),
        j: cli.j,
        epsilon,
        important_quantiles: q,
        info: cli.info,
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).expect("summary serializes")
        );
    } else {
        println!(
            "n={} repeat={} total_capacity={} max_capacity={} levels={} J={} epsilon={} Q={:?} info={}",
            summary.n,
            summary.repeat,
            summary.total_capacity,
            summary.max_level_capacity,
            summary.levels,
            summary.j,
            summary.epsilon,
            summary.important_quantiles,
            summary.info,
        );
        if cli.repeat == 1 {
            for level in sketch.level_stats() {
                println!(
                    "  len={} capacity={} section_size={} compactions={}",
                    level.len, level.capacity, level.section_size, level.num_compactions
                );
            }
        }
    }
}
