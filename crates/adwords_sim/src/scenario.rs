use crate::TrafficProfile;
use adwords::{Bids, ConsumerId};
use rand::Rng;

/// Consumers and arrival stream of one simulation run
#[derive(Debug, Clone)]
pub struct Scenario {
    pub consumers: Vec<(ConsumerId, f64)>,
    pub arrivals: Vec<Bids>,
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub consumers: u32,
    pub arrivals: usize,

    /// Probability that a consumer bids on an arrival
    pub bid_probability: f64,

    pub budget_range: (f64, f64),
    pub bid_range: (f64, f64),

    /// Draws the number of arrivals from a daily traffic profile instead of using `arrivals`
    pub traffic: Option<TrafficProfile>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            consumers: 5,
            arrivals: 10,
            bid_probability: 0.8,
            budget_range: (100., 1000.),
            bid_range: (10., 50.),
            traffic: None,
        }
    }
}

impl ScenarioConfig {
    /// Consumers get ids 1..=n; every arrival draws an independent bid per consumer
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Scenario {
        let (budget_min, budget_max) = self.budget_range;
        let (bid_min, bid_max) = self.bid_range;

        let consumers = (1..=self.consumers)
            .map(|id| (ConsumerId(id), rng.random_range(budget_min..budget_max)))
            .collect();

        let count = match &self.traffic {
            Some(traffic) => traffic.arrivals_per_slot(rng).iter().sum(),
            None => self.arrivals,
        };

        let arrivals = (0..count)
            .map(|_| {
                let mut bids = Bids::new();
                for id in 1..=self.consumers {
                    if rng.random_bool(self.bid_probability) {
                        bids.insert(ConsumerId(id), rng.random_range(bid_min..bid_max));
                    }
                }
                bids
            })
            .collect();

        Scenario {
            consumers,
            arrivals,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_generate_ranges() {
        let cfg = ScenarioConfig {
            consumers: 7,
            arrivals: 50,
            ..Default::default()
        };
        let scenario = cfg.generate(&mut StdRng::seed_from_u64(1));

        assert_eq!(scenario.consumers.len(), 7);
        assert_eq!(scenario.arrivals.len(), 50);

        for (k, (id, budget)) in scenario.consumers.iter().enumerate() {
            assert_eq!(id.0, k as u32 + 1);
            assert!((100.0..1000.0).contains(budget));
        }
        for bids in &scenario.arrivals {
            for (id, bid) in bids.iter() {
                assert!((1..=7).contains(&id.0));
                assert!((10.0..50.0).contains(&bid));
            }
        }
    }

    #[test]
    fn test_generate_is_seeded() {
        let cfg = ScenarioConfig::default();
        let a = cfg.generate(&mut StdRng::seed_from_u64(5));
        let b = cfg.generate(&mut StdRng::seed_from_u64(5));
        assert_eq!(a.consumers, b.consumers);
        assert_eq!(a.arrivals, b.arrivals);
    }

    #[test]
    fn test_traffic_sets_arrival_count() {
        let cfg = ScenarioConfig {
            arrivals: 3,
            traffic: Some(TrafficProfile {
                slots: 6,
                min_arrivals: 2,
                max_arrivals: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let scenario = cfg.generate(&mut StdRng::seed_from_u64(8));
        assert_eq!(scenario.arrivals.len(), 12);
    }

    #[test]
    fn test_never_bidding() {
        let cfg = ScenarioConfig {
            bid_probability: 0.,
            ..Default::default()
        };
        let scenario = cfg.generate(&mut StdRng::seed_from_u64(3));
        assert!(scenario.arrivals.iter().all(|bids| bids.is_empty()));
    }
}
