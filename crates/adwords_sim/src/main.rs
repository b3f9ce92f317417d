mod monte_carlo;
mod offline;
mod scenario;
mod simulation;
mod traffic;

pub use monte_carlo::*;
pub use offline::*;
pub use scenario::*;
pub use simulation::*;
pub use traffic::*;

use adwords::{AllocationPolicy, Summary};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::BTreeMap;

/// Runs the online allocation engines on randomly generated consumers and bids
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Allocation engine to run
    #[arg(long, value_enum, default_value_t = PolicyArg::Both)]
    policy: PolicyArg,

    /// Perturbation coefficient
    #[arg(long, default_value_t = 1.15)]
    beta: f64,

    #[arg(long, default_value_t = 5)]
    consumers: u32,

    #[arg(long, default_value_t = 10)]
    arrivals: usize,

    /// Probability that a consumer bids on an arrival
    #[arg(long, default_value_t = 0.8)]
    bid_probability: f64,

    /// Draw the number of arrivals from a daily traffic profile instead of --arrivals
    #[arg(long)]
    traffic: bool,

    /// Number of independent runs; more than one reports revenue ratios only
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Subgradient iterations for the offline revenue bound
    #[arg(long, default_value_t = 500)]
    bound_iterations: usize,

    /// Seed for generated data and perturbation draws; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    Partial,
    Gpg,
    Both,
}

impl PolicyArg {
    fn policies(self) -> Vec<AllocationPolicy> {
        match self {
            PolicyArg::Partial => vec![AllocationPolicy::Partial],
            PolicyArg::Gpg => vec![AllocationPolicy::Gpg],
            PolicyArg::Both => vec![AllocationPolicy::Partial, AllocationPolicy::Gpg],
        }
    }
}

#[derive(serde::Serialize)]
struct RunReport {
    offline_bound: f64,
    ratio: f64,
    #[serde(flatten)]
    summary: Summary,
}

fn main() -> eyre::Result<()> {
    env_logger::init();

    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.bid_probability) {
        eyre::bail!("bid probability must be in [0, 1]: {}", args.bid_probability);
    }
    if !args.beta.is_finite() {
        eyre::bail!("beta must be finite: {}", args.beta);
    }
    if args.runs == 0 {
        eyre::bail!("at least one run is required");
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {seed}");

    let mut rng = StdRng::seed_from_u64(seed);

    let cfg = ScenarioConfig {
        consumers: args.consumers,
        arrivals: args.arrivals,
        bid_probability: args.bid_probability,
        traffic: args.traffic.then(TrafficProfile::default),
        ..Default::default()
    };
    let bound = OfflineBound::default().with_max_iterations(args.bound_iterations);
    let policies = args.policy.policies();

    if args.runs > 1 {
        let mc = MonteCarlo {
            runs: args.runs,
            beta: args.beta,
            bound,
        };
        let out = mc.run(&cfg, &policies, &mut rng)?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{} runs, revenue relative to the offline bound:", args.runs);
            for (name, stats) in &out {
                println!(
                    "{name}: mean {:.4}, min {:.4}, max {:.4} (mean revenue {:.2} of {:.2})",
                    stats.mean_ratio,
                    stats.min_ratio,
                    stats.max_ratio,
                    stats.mean_revenue,
                    stats.mean_bound
                );
            }
        }
        return Ok(());
    }

    // every policy sees the same consumers, arrivals and perturbation draws
    let scenario = cfg.generate(&mut rng);
    let sampler_seed = rng.random();
    let offline_bound = bound.evaluate(&scenario);

    let mut reports = BTreeMap::new();

    for policy in policies {
        let verbose = !args.json;
        if verbose {
            println!("\n=== Testing {} ===", policy.description());
        }

        let summary = simulate(
            policy,
            args.beta,
            sampler_seed,
            &scenario,
            |i, bids, allocation, driver| {
                if !verbose {
                    return;
                }
                println!("\nArrival {i}:");
                let bids = bids
                    .iter()
                    .map(|(id, bid)| format!("{id}: {bid:.2}"))
                    .collect::<Vec<_>>();
                println!("Bids: {{{}}}", bids.join(", "));
                match policy {
                    AllocationPolicy::Partial => println!("Allocations: {allocation}"),
                    AllocationPolicy::Gpg => println!("Matched to Advertiser: {allocation}"),
                }
                println!("Remaining budgets:");
                for s in driver.snapshot() {
                    println!("Advertiser {}: {:.2} (y={:.3})", s.id, s.budget, s.y);
                }
            },
        )?;

        let ratio = if offline_bound > 0. {
            summary.total_spent / offline_bound
        } else {
            1.
        };

        if verbose {
            print_summary(&summary, offline_bound, ratio);
        }

        reports.insert(
            policy.description(),
            RunReport {
                offline_bound,
                ratio,
                summary,
            },
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}

fn print_summary(summary: &Summary, offline_bound: f64, ratio: f64) {
    println!(
        "\n{} arrivals, {} unmatched, fill rate {:.3}, total spent {:.2}",
        summary.arrivals, summary.unmatched_arrivals, summary.fill_rate, summary.total_spent
    );
    println!("Offline bound {offline_bound:.2}, ratio {ratio:.4}");
    for c in &summary.consumers {
        println!(
            "Advertiser {}: spent {:.2} of {:.2} ({:.1}%), impressions {:.3}",
            c.id,
            c.spent,
            c.initial_budget,
            100. * c.utilization,
            c.impressions_won
        );
    }
}
