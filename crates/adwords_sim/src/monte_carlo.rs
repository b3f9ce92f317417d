use crate::{OfflineBound, ScenarioConfig, simulate};
use adwords::AllocationPolicy;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Revenue of a policy relative to the offline bound, aggregated over many runs.
///
/// The bound is at least the offline optimum, so every ratio is a lower bound on the ratio
/// against the true optimum.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatioStats {
    pub runs: usize,
    pub mean_ratio: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub mean_revenue: f64,
    pub mean_bound: f64,
}

impl RatioStats {
    fn push(&mut self, revenue: f64, bound: f64) {
        let ratio = if bound > 0. { revenue / bound } else { 1. };

        if self.runs == 0 {
            self.min_ratio = ratio;
            self.max_ratio = ratio;
        } else {
            self.min_ratio = self.min_ratio.min(ratio);
            self.max_ratio = self.max_ratio.max(ratio);
        }

        self.runs += 1;
        let n = self.runs as f64;
        self.mean_ratio += (ratio - self.mean_ratio) / n;
        self.mean_revenue += (revenue - self.mean_revenue) / n;
        self.mean_bound += (bound - self.mean_bound) / n;
    }
}

/// Repeats independent simulations, each on freshly generated data
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    pub runs: usize,
    pub beta: f64,
    pub bound: OfflineBound,
}

impl MonteCarlo {
    /// All policies of one run see the same scenario and the same perturbation seeds
    pub fn run<R: Rng>(
        &self,
        cfg: &ScenarioConfig,
        policies: &[AllocationPolicy],
        rng: &mut R,
    ) -> eyre::Result<BTreeMap<&'static str, RatioStats>> {
        let mut out = BTreeMap::<&'static str, RatioStats>::new();

        for run in 0..self.runs {
            let scenario = cfg.generate(rng);
            let sampler_seed = rng.random();
            let bound = self.bound.evaluate(&scenario);

            for &policy in policies {
                let summary =
                    simulate(policy, self.beta, sampler_seed, &scenario, |_, _, _, _| {})?;
                log::debug!(
                    "run {run} {}: revenue {:.2}, bound {bound:.2}",
                    policy.description(),
                    summary.total_spent
                );
                out.entry(policy.description())
                    .or_default()
                    .push(summary.total_spent, bound);
            }
        }

        Ok(out)
    }
}
