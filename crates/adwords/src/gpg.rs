use crate::{
    Allocation, AllocationEngine, Bids, ConsumerId, ConsumerRegistry, Perturbation, Result,
    engine::warn_unregistered,
};

/// Consumers whose budget falls below this after winning are retired.
pub const DEFAULT_RETIREMENT_THRESHOLD: f64 = 0.01;

/// Generalized Perturbed-Greedy: every arrival goes entirely to the available bidder maximizing
/// `b_i · (1 − g(y_i))`.
///
/// A consumer whose bid exceeds its remaining budget is retired on the spot, even though a later
/// smaller bid might still have been affordable. Retirement is permanent.
#[derive(Debug, Clone)]
pub struct GpgEngine {
    perturbation: Perturbation,
    retirement_threshold: f64,
}

impl GpgEngine {
    pub const NAME: &'static str = "Generalized Perturbed-Greedy";

    pub fn new(beta: f64) -> Self {
        Self {
            perturbation: Perturbation::new(beta),
            retirement_threshold: DEFAULT_RETIREMENT_THRESHOLD,
        }
    }

    /// Budget below which a winner is retired
    pub fn with_retirement_threshold(mut self, retirement_threshold: f64) -> Self {
        self.set_retirement_threshold(retirement_threshold);
        self
    }

    pub fn set_retirement_threshold(&mut self, retirement_threshold: f64) {
        self.retirement_threshold = retirement_threshold;
    }

    pub fn retirement_threshold(&self) -> f64 {
        self.retirement_threshold
    }

    pub fn perturbation(&self) -> &Perturbation {
        &self.perturbation
    }

    /// Returns the winner of the arrival, or `None` if no available consumer bid on it
    pub fn allocate(
        &self,
        registry: &mut ConsumerRegistry,
        bids: &Bids,
    ) -> Result<Option<ConsumerId>> {
        let candidates = registry
            .all_consumers()
            .filter(|c| c.is_available())
            .filter_map(|c| bids.positive(c.id()).map(|bid| (c.id(), bid, c.budget(), c.y())))
            .collect::<Vec<_>>();

        let mut best: Option<(ConsumerId, f64, f64)> = None;

        for (id, bid, budget, y) in candidates {
            if budget < bid {
                registry.mark_unavailable(id)?;
                log::info!("retired consumer {id}: bid {bid} exceeds budget {budget}");
                continue;
            }

            let value = bid * (1. - self.perturbation.g_of_sample(y));
            log::trace!("candidate {id}: bid={bid}, y={y:.03}, value={value}");

            if best.is_none_or(|(_, _, best_value)| value > best_value) {
                best = Some((id, bid, value));
            }
        }

        let Some((winner, bid, _)) = best else {
            return Ok(None);
        };

        registry
            .debit(winner, bid)
            .inspect_err(|err| log::error!("perturbed-greedy overspent: {err}"))?;

        let budget = registry.get(winner)?.budget();
        log::debug!("consumer {winner} wins at {bid}, remaining budget {budget}");

        if budget < self.retirement_threshold {
            registry.mark_unavailable(winner)?;
            log::info!("retired consumer {winner}: budget {budget} exhausted");
        }

        Ok(Some(winner))
    }
}

impl AllocationEngine for GpgEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process_arrival(
        &mut self,
        registry: &mut ConsumerRegistry,
        _time: u64,
        bids: &Bids,
    ) -> Result<Allocation> {
        warn_unregistered(registry, bids);
        self.allocate(registry, bids).map(Allocation::Winner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SequenceSampler;
    use approx::assert_relative_eq;

    fn setup(consumers: &[(u32, f64, f64)]) -> ConsumerRegistry {
        let mut reg = ConsumerRegistry::new(SequenceSampler::new([0.5]));
        for &(id, budget, y) in consumers {
            reg.register_with_sample(ConsumerId(id), budget, y).unwrap();
        }
        reg
    }

    fn consumer(reg: &ConsumerRegistry, id: u32) -> (f64, bool) {
        let c = reg.get(ConsumerId(id)).unwrap();
        (c.budget(), c.is_available())
    }

    #[test]
    fn test_lower_seed_wins_equal_bids() {
        let mut reg = setup(&[(1, 100., 0.2), (2, 100., 0.8)]);
        let engine = GpgEngine::new(1.15);

        let winner = engine
            .allocate(
                &mut reg,
                &Bids::new()
                    .with_bid(ConsumerId(1), 30.)
                    .with_bid(ConsumerId(2), 30.),
            )
            .unwrap();

        assert_eq!(winner, Some(ConsumerId(1)));
        assert_eq!(consumer(&reg, 1), (70., true));
        assert_eq!(consumer(&reg, 2), (100., true));
    }

    #[test]
    fn test_higher_bid_beats_lower_seed() {
        let mut reg = setup(&[(1, 100., 0.2), (2, 100., 0.8)]);
        let engine = GpgEngine::new(1.15);

        // 10 * (1 - g(0.2)) ~ 6.0 against 40 * (1 - g(0.8)) ~ 8.2
        let winner = engine
            .allocate(
                &mut reg,
                &Bids::new()
                    .with_bid(ConsumerId(1), 10.)
                    .with_bid(ConsumerId(2), 40.),
            )
            .unwrap();

        assert_eq!(winner, Some(ConsumerId(2)));
        assert_eq!(consumer(&reg, 2), (60., true));
    }

    #[test]
    fn test_unaffordable_bid_retires() {
        let mut reg = setup(&[(1, 20., 0.1), (2, 100., 0.9)]);
        let engine = GpgEngine::new(1.15);

        let winner = engine
            .allocate(
                &mut reg,
                &Bids::new()
                    .with_bid(ConsumerId(1), 25.)
                    .with_bid(ConsumerId(2), 10.),
            )
            .unwrap();
        assert_eq!(winner, Some(ConsumerId(2)));
        assert_eq!(consumer(&reg, 1), (20., false));

        // a now affordable bid does not bring consumer 1 back
        let winner = engine
            .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 5.))
            .unwrap();
        assert_eq!(winner, None);
        assert_eq!(consumer(&reg, 1), (20., false));
    }

    #[test]
    fn test_retire_below_threshold() {
        let mut reg = setup(&[(1, 10.009, 0.3)]);
        let engine = GpgEngine::new(1.15);

        let winner = engine
            .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 10.))
            .unwrap();

        assert_eq!(winner, Some(ConsumerId(1)));
        let (budget, available) = consumer(&reg, 1);
        assert_relative_eq!(budget, 0.009, max_relative = 1e-9);
        assert!(!available);
    }

    #[test]
    fn test_budget_at_threshold_stays_available() {
        let mut reg = setup(&[(1, 10.5, 0.3)]);
        let engine = GpgEngine::new(1.15).with_retirement_threshold(0.5);

        engine
            .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 10.))
            .unwrap();

        assert_eq!(consumer(&reg, 1), (0.5, true));
    }

    #[test]
    fn test_exact_budget_bid() {
        let mut reg = setup(&[(1, 30., 0.3)]);
        let engine = GpgEngine::new(1.15);

        let winner = engine
            .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 30.))
            .unwrap();

        assert_eq!(winner, Some(ConsumerId(1)));
        assert_eq!(consumer(&reg, 1), (0., false));
    }

    #[test]
    fn test_no_match() {
        let mut reg = setup(&[(1, 100., 0.3)]);
        let engine = GpgEngine::new(1.15);

        assert_eq!(engine.allocate(&mut reg, &Bids::new()).unwrap(), None);
        assert_eq!(
            engine
                .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 0.))
                .unwrap(),
            None
        );
        assert_eq!(consumer(&reg, 1), (100., true));
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        let mut reg = setup(&[(4, 100., 0.5), (2, 100., 0.5), (3, 100., 0.5)]);
        let engine = GpgEngine::new(1.15);

        let bids = Bids::new()
            .with_bid(ConsumerId(4), 10.)
            .with_bid(ConsumerId(3), 10.)
            .with_bid(ConsumerId(2), 10.);
        assert_eq!(engine.allocate(&mut reg, &bids).unwrap(), Some(ConsumerId(2)));
    }

    #[test]
    fn test_zero_value_still_wins() {
        // beta = 0 makes every value 0; a bidder must still be matched
        let mut reg = setup(&[(1, 100., 0.5)]);
        let engine = GpgEngine::new(0.);

        let winner = engine
            .allocate(&mut reg, &Bids::new().with_bid(ConsumerId(1), 10.))
            .unwrap();
        assert_eq!(winner, Some(ConsumerId(1)));
    }
}
