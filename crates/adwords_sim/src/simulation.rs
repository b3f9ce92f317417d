use crate::Scenario;
use adwords::{
    Allocation, AllocationDriver, AllocationPolicy, AllocationStats, Bids, RngSampler, Summary,
};
use rand::{SeedableRng, rngs::StdRng};

/// Runs all arrivals of `scenario` through a fresh driver for `policy`.
///
/// Perturbation seeds are drawn from a generator seeded with `sampler_seed`, so runs of different
/// policies with the same seed see the same `y` values. `on_arrival` is called after every
/// arrival with its 1-based index.
pub fn simulate(
    policy: AllocationPolicy,
    beta: f64,
    sampler_seed: u64,
    scenario: &Scenario,
    mut on_arrival: impl FnMut(usize, &Bids, &Allocation, &AllocationDriver),
) -> eyre::Result<Summary> {
    let sampler = RngSampler(StdRng::seed_from_u64(sampler_seed));
    let mut driver = AllocationDriver::from_policy(policy, beta, sampler);
    driver.register_consumers(scenario.consumers.iter().copied())?;

    let mut stats = AllocationStats::new();

    for (i, bids) in scenario.arrivals.iter().enumerate() {
        let allocation = driver.process_new_arrival(bids)?;
        stats.record(&allocation);
        on_arrival(i + 1, bids, &allocation, &driver);
    }

    log::debug!("{} done after {} arrivals", driver.engine_name(), driver.time());

    Ok(stats.summarize(driver.registry()))
}
