use crate::{Bids, ConsumerId, ConsumerRegistry, GpgEngine, PartialAllocationEngine, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Fraction of the impression awarded to each consumer for one arrival
pub type Fractions = BTreeMap<ConsumerId, f64>;

/// Outcome of one arrival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Allocation {
    /// Fractional split of the impression, summing to at most one
    Fractions(Fractions),

    /// Single winner, or `None` if no consumer was eligible
    Winner(Option<ConsumerId>),
}

impl Allocation {
    /// Total fraction of the impression that was allocated
    pub fn allocated(&self) -> f64 {
        match self {
            Allocation::Fractions(fractions) => fractions.values().sum(),
            Allocation::Winner(Some(_)) => 1.,
            Allocation::Winner(None) => 0.,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Allocation::Fractions(fractions) => fractions.is_empty(),
            Allocation::Winner(winner) => winner.is_none(),
        }
    }

    /// Share of the impression received by each consumer in ascending id order
    pub fn shares(&self) -> Vec<(ConsumerId, f64)> {
        match self {
            Allocation::Fractions(fractions) => {
                fractions.iter().map(|(&id, &share)| (id, share)).collect()
            }
            Allocation::Winner(Some(id)) => vec![(*id, 1.)],
            Allocation::Winner(None) => Vec::new(),
        }
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allocation::Fractions(fractions) => {
                write!(f, "{{")?;
                for (i, (id, share)) in fractions.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}: {share:.03}")?;
                }
                write!(f, "}}")
            }
            Allocation::Winner(Some(id)) => write!(f, "{id}"),
            Allocation::Winner(None) => write!(f, "no match"),
        }
    }
}

/// An online allocation policy processing one arrival at a time
pub trait AllocationEngine {
    fn name(&self) -> &'static str;

    /// Resolves one arrival at time `time` (starting at 1) and applies all budget changes to the
    /// registry before returning.
    fn process_arrival(
        &mut self,
        registry: &mut ConsumerRegistry,
        time: u64,
        bids: &Bids,
    ) -> Result<Allocation>;
}

/// Selects the allocation engine at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationPolicy {
    Partial,
    Gpg,
}

impl AllocationPolicy {
    pub fn build(self, beta: f64) -> Box<dyn AllocationEngine> {
        match self {
            AllocationPolicy::Partial => Box::new(PartialAllocationEngine::new(beta)),
            AllocationPolicy::Gpg => Box::new(GpgEngine::new(beta)),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AllocationPolicy::Partial => PartialAllocationEngine::NAME,
            AllocationPolicy::Gpg => GpgEngine::NAME,
        }
    }
}

/// Warns about bids naming consumers the registry does not know; those bids are ignored.
pub(crate) fn warn_unregistered(registry: &ConsumerRegistry, bids: &Bids) {
    for (id, _) in bids.iter() {
        if !registry.contains(id) {
            log::warn!("ignoring bid of unregistered consumer {id}");
        }
    }
}
