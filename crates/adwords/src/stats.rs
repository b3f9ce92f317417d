use crate::{Allocation, ConsumerId, ConsumerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals over processed arrivals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationStats {
    pub arrivals: u64,
    pub unmatched_arrivals: u64,
    pub impressions_allocated: f64,
    pub impressions_won: BTreeMap<ConsumerId, f64>,
}

impl AllocationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, allocation: &Allocation) {
        self.arrivals += 1;
        if allocation.is_empty() {
            self.unmatched_arrivals += 1;
        }
        for (id, share) in allocation.shares() {
            *self.impressions_won.entry(id).or_default() += share;
            self.impressions_allocated += share;
        }
    }

    /// Average fraction of an impression allocated per arrival
    pub fn fill_rate(&self) -> f64 {
        if self.arrivals == 0 {
            0.
        } else {
            self.impressions_allocated / self.arrivals as f64
        }
    }

    /// Combines the totals with the budgets in `registry`
    pub fn summarize(&self, registry: &ConsumerRegistry) -> Summary {
        let consumers = registry
            .all_consumers()
            .map(|c| ConsumerSummary {
                id: c.id(),
                initial_budget: c.initial_budget(),
                budget: c.budget(),
                spent: c.spent(),
                utilization: c.spent() / c.initial_budget(),
                impressions_won: self.impressions_won.get(&c.id()).copied().unwrap_or(0.),
                available: c.is_available(),
            })
            .collect::<Vec<_>>();

        Summary {
            arrivals: self.arrivals,
            unmatched_arrivals: self.unmatched_arrivals,
            impressions_allocated: self.impressions_allocated,
            fill_rate: self.fill_rate(),
            total_spent: consumers.iter().map(|c| c.spent).sum(),
            consumers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub arrivals: u64,
    pub unmatched_arrivals: u64,
    pub impressions_allocated: f64,
    pub fill_rate: f64,
    pub total_spent: f64,
    pub consumers: Vec<ConsumerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSummary {
    pub id: ConsumerId,
    pub initial_budget: f64,
    pub budget: f64,
    pub spent: f64,
    /// Fraction of the initial budget spent
    pub utilization: f64,
    pub impressions_won: f64,
    pub available: bool,
}
