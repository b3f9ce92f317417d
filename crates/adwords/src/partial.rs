use crate::{
    Allocation, AllocationEngine, Bids, ConsumerId, ConsumerRegistry, Fractions, Perturbation,
    Result, engine::warn_unregistered,
};

/// Fractional allocator: an arrival is split between consumers in order of perturbed value until
/// the impression is fully allocated or no consumer with budget bids on it.
///
/// The value of consumer `i` at time `t` is `b_i · (1 − g(t)·y_i)`.
#[derive(Debug, Clone)]
pub struct PartialAllocationEngine {
    perturbation: Perturbation,
}

impl PartialAllocationEngine {
    pub const NAME: &'static str = "Partial Allocation";

    pub fn new(beta: f64) -> Self {
        Self {
            perturbation: Perturbation::new(beta),
        }
    }

    pub fn perturbation(&self) -> &Perturbation {
        &self.perturbation
    }

    pub fn allocate(
        &self,
        registry: &mut ConsumerRegistry,
        time: u64,
        bids: &Bids,
    ) -> Result<Fractions> {
        let gt = self.perturbation.g_of_time(time);

        let mut allocations = Fractions::new();
        let mut delta = 0.;

        let mut eligible = registry
            .all_consumers()
            .filter(|c| c.budget() > 0.)
            .map(|c| c.id())
            .collect::<Vec<_>>();

        while delta < 1. && !eligible.is_empty() {
            let Some((winner, bid)) = select(registry, &eligible, bids, gt)? else {
                break;
            };

            let budget = registry.get(winner)?.budget();
            let remaining = 1. - delta;
            let budget_share = budget / bid;

            if budget_share <= remaining {
                // winner spends its whole budget on a part of the impression
                if budget_share > 0. {
                    *allocations.entry(winner).or_default() += budget_share;
                    debit(registry, winner, budget)?;
                    delta += budget_share;
                    log::debug!("t={time}: consumer {winner} exhausted on {budget_share:.03}");
                } else {
                    eligible.retain(|&id| id != winner);
                }
            } else {
                *allocations.entry(winner).or_default() += remaining;
                debit(registry, winner, (bid * remaining).min(budget))?;
                delta = 1.;
                log::debug!("t={time}: consumer {winner} takes remaining {remaining:.03}");
            }

            eligible.retain(|&id| registry.get(id).is_ok_and(|c| c.budget() > 0.));
        }

        Ok(allocations)
    }
}

impl AllocationEngine for PartialAllocationEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process_arrival(
        &mut self,
        registry: &mut ConsumerRegistry,
        time: u64,
        bids: &Bids,
    ) -> Result<Allocation> {
        warn_unregistered(registry, bids);
        self.allocate(registry, time, bids).map(Allocation::Fractions)
    }
}

/// Picks the eligible bidder with the highest value; the lowest id wins ties.
fn select(
    registry: &ConsumerRegistry,
    eligible: &[ConsumerId],
    bids: &Bids,
    gt: f64,
) -> Result<Option<(ConsumerId, f64)>> {
    let mut best: Option<(ConsumerId, f64, f64)> = None;

    for &id in eligible {
        let Some(bid) = bids.positive(id) else {
            continue;
        };

        let y = registry.get(id)?.y();

        // g(t) overflows for late arrivals; a zero seed is never discounted
        let discount = if y == 0. { 0. } else { gt * y };
        let value = bid * (1. - discount);
        log::trace!("candidate {id}: bid={bid}, y={y:.03}, value={value}");

        if best.is_none_or(|(_, _, best_value)| value > best_value) {
            best = Some((id, bid, value));
        }
    }

    Ok(best.map(|(id, bid, _)| (id, bid)))
}

fn debit(registry: &mut ConsumerRegistry, id: ConsumerId, amount: f64) -> Result<()> {
    registry
        .debit(id, amount)
        .inspect_err(|err| log::error!("partial allocation overspent: {err}"))
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

    fn budget(reg: &ConsumerRegistry, id: u32) -> f64 {
        reg.get(ConsumerId(id)).unwrap().budget()
    }

    #[test]
    fn test_budget_limited_single_consumer() {
        let mut reg = setup(&[(1, 10., 0.3)]);
        let engine = PartialAllocationEngine::new(1.15);

        let out = engine
            .allocate(&mut reg, 1, &Bids::new().with_bid(ConsumerId(1), 15.))
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[&ConsumerId(1)], 10. / 15., max_relative = 1e-12);
        assert_eq!(budget(&reg, 1), 0.);

        let out = engine
            .allocate(&mut reg, 2, &Bids::new().with_bid(ConsumerId(1), 15.))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_impression_limited_winner_takes_all() {
        let mut reg = setup(&[(1, 100., 0.1), (2, 100., 0.9)]);
        let engine = PartialAllocationEngine::new(1.15);

        let out = engine
            .allocate(
                &mut reg,
                1,
                &Bids::new()
                    .with_bid(ConsumerId(1), 20.)
                    .with_bid(ConsumerId(2), 20.),
            )
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[&ConsumerId(1)], 1.);
        assert_relative_eq!(budget(&reg, 1), 80.);
        assert_eq!(budget(&reg, 2), 100.);
    }

    #[test]
    fn test_split_between_consumers() {
        // consumer 1 has the higher value but can only pay for a quarter of the impression
        let mut reg = setup(&[(1, 5., 0.1), (2, 100., 0.5)]);
        let engine = PartialAllocationEngine::new(1.15);

        let out = engine
            .allocate(
                &mut reg,
                1,
                &Bids::new()
                    .with_bid(ConsumerId(1), 20.)
                    .with_bid(ConsumerId(2), 10.),
            )
            .unwrap();

        assert_relative_eq!(out[&ConsumerId(1)], 0.25);
        assert_relative_eq!(out[&ConsumerId(2)], 0.75);
        assert_relative_eq!(out.values().sum::<f64>(), 1.);
        assert_eq!(budget(&reg, 1), 0.);
        assert_relative_eq!(budget(&reg, 2), 92.5);
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        let mut reg = setup(&[(3, 100., 0.4), (1, 100., 0.4), (2, 100., 0.4)]);
        let engine = PartialAllocationEngine::new(1.15);

        let bids = Bids::new()
            .with_bid(ConsumerId(1), 10.)
            .with_bid(ConsumerId(2), 10.)
            .with_bid(ConsumerId(3), 10.);
        let out = engine.allocate(&mut reg, 1, &bids).unwrap();

        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![ConsumerId(1)]);
    }

    #[test]
    fn test_no_positive_bids() {
        let mut reg = setup(&[(1, 100., 0.1), (2, 100., 0.2)]);
        let engine = PartialAllocationEngine::new(1.15);

        let out = engine
            .allocate(
                &mut reg,
                1,
                &Bids::new()
                    .with_bid(ConsumerId(1), 0.)
                    .with_bid(ConsumerId(7), 12.),
            )
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(budget(&reg, 1), 100.);
        assert_eq!(budget(&reg, 2), 100.);
    }

    #[test]
    fn test_late_arrival_still_allocates() {
        // g(t) is infinite this late; every value is -inf and the lowest bidding id wins
        let mut reg = setup(&[(1, 100., 0.2), (2, 100., 0.7)]);
        let engine = PartialAllocationEngine::new(1.15);

        let out = engine
            .allocate(&mut reg, 5_000, &Bids::new().with_bid(ConsumerId(2), 10.))
            .unwrap();

        assert_eq!(out[&ConsumerId(2)], 1.);
        assert_relative_eq!(budget(&reg, 2), 90.);
    }

    #[test]
    fn test_value_discount_by_time() {
        // at t=1 consumer 2 wins on bid, later the seed discount grows and consumer 1 wins
        let mut reg = setup(&[(1, 1000., 0.1), (2, 1000., 0.2)]);
        let engine = PartialAllocationEngine::new(1.15);
        let bids = Bids::new().with_bid(ConsumerId(1), 10.).with_bid(ConsumerId(2), 12.);

        let out = engine.allocate(&mut reg, 1, &bids).unwrap();
        assert!(out.contains_key(&ConsumerId(2)));

        let out = engine.allocate(&mut reg, 2, &bids).unwrap();
        assert!(out.contains_key(&ConsumerId(1)));
    }
}
