//! Irredundant covers of threshold functions.
//!
//! Builds "at least K of N" and prints its irredundant sum-of-products cover.
//!
//! Run with:
//! ```bash
//! cargo run --example isop -- 5 3 --timeout-ms 500
//! ```

use std::time::{Duration, Instant};

use clap::Parser;

use bdd_logic::bdd::{Bdd, BddConfig};
use bdd_logic::limits::Limits;
use bdd_logic::reference::Ref;

#[derive(Debug, Parser)]
#[command(author, version, about = "Irredundant covers of threshold functions")]
struct Cli {
    /// Number of variables.
    #[arg(value_name = "INT", default_value = "5")]
    n: u32,

    /// Threshold: the function is true when at least K variables are.
    #[arg(value_name = "INT", default_value = "3")]
    k: u32,

    /// Abort the cover extraction after this many milliseconds.
    #[arg(long, value_name = "INT")]
    timeout_ms: Option<u64>,

    /// Abort the cover extraction after this many new nodes.
    #[arg(long, value_name = "INT")]
    budget: Option<usize>,

    /// Enable automatic sifting past this many live nodes.
    #[arg(long, value_name = "INT")]
    reorder: Option<usize>,
}

/// "At least `k` of the variables `1..=n`", by dynamic programming over the variables.
fn threshold(bdd: &Bdd, n: u32, k: u32) -> color_eyre::Result<Ref> {
    // row[j] = at least j of the variables seen so far.
    let mut row: Vec<Ref> = (0..=k).map(|j| bdd.constant(j == 0)).collect();
    for i in (1..=n).rev() {
        let x = bdd.mk_var(i);
        let mut next = vec![bdd.one()];
        for j in 1..=k as usize {
            next.push(bdd.apply_ite(x, row[j - 1], row[j])?);
        }
        row = next;
    }
    Ok(row[k as usize])
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut config = BddConfig::default();
    if let Some(threshold) = args.reorder {
        config = config.with_auto_reorder(threshold);
    }
    let bdd = Bdd::new(config);

    let time_total = Instant::now();
    let f = threshold(&bdd, args.n, args.k)?;
    println!("f = {} with {} nodes, profile {:?}", f, bdd.size(f), bdd.node_profile(f, None));

    let mut limits = Limits::none();
    if let Some(ms) = args.timeout_ms {
        limits = limits.with_timeout(Duration::from_millis(ms));
    }
    if let Some(budget) = args.budget {
        limits = limits.with_node_budget(budget);
    }

    match bdd.isop_limited(f, f, &limits) {
        Ok((cover, func)) => {
            assert_eq!(func, f);
            println!("cover: {} cubes, {} literals", bdd.cube_count(cover), bdd.literal_count(cover));
            for cube in bdd.cubes(cover) {
                let lits: Vec<String> = cube.iter().map(|l| l.to_string()).collect();
                println!("  {}", lits.join(" "));
            }
        }
        Err(e) if e.is_aborted() => println!("cover extraction aborted: {}", e),
        Err(e) => return Err(e.into()),
    }

    println!("stats = {:?}", bdd.stats());
    println!("order = {:?}", bdd.var_order());
    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
