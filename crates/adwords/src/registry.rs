use crate::{AllocError, Consumer, ConsumerId, ConsumerSnapshot, Result, UniformSampler};
use std::collections::{BTreeMap, BTreeSet};

/// Owns all consumers, their budgets and their fixed perturbation draws.
///
/// Consumers are stored by id and always iterated in ascending id order, which makes selection
/// and tie-breaking in the engines reproducible. Budgets only change through [`Self::debit`] and
/// availability only through [`Self::mark_unavailable`].
pub struct ConsumerRegistry {
    consumers: BTreeMap<ConsumerId, Consumer>,
    sampler: Box<dyn UniformSampler>,
}

impl ConsumerRegistry {
    pub fn new(sampler: impl UniformSampler + 'static) -> Self {
        Self {
            consumers: BTreeMap::new(),
            sampler: Box::new(sampler),
        }
    }

    /// Registers a consumer, drawing its seed `y` from the sampler
    pub fn register(&mut self, id: ConsumerId, initial_budget: f64) -> Result<()> {
        self.check_new(id, initial_budget)?;
        let y = self.sampler.next();
        self.insert(id, initial_budget, y)
    }

    /// Registers a consumer with an explicitly given seed `y`
    pub fn register_with_sample(
        &mut self,
        id: ConsumerId,
        initial_budget: f64,
        y: f64,
    ) -> Result<()> {
        self.check_new(id, initial_budget)?;
        self.insert(id, initial_budget, y)
    }

    /// Registers a batch of consumers. Nothing is registered if any entry is rejected.
    pub fn register_all(
        &mut self,
        entries: impl IntoIterator<Item = (ConsumerId, f64)>,
    ) -> Result<()> {
        let entries = entries.into_iter().collect::<Vec<_>>();

        let mut seen = BTreeSet::new();
        for &(id, initial_budget) in &entries {
            self.check_new(id, initial_budget)?;
            if !seen.insert(id) {
                return Err(AllocError::DuplicateId(id));
            }
        }

        let samples = entries
            .iter()
            .map(|&(id, _)| {
                let y = self.sampler.next();
                check_sample(id, y).map(|_| y)
            })
            .collect::<Result<Vec<_>>>()?;

        for ((id, initial_budget), y) in entries.into_iter().zip(samples) {
            self.insert(id, initial_budget, y)?;
        }

        Ok(())
    }

    pub fn get(&self, id: ConsumerId) -> Result<&Consumer> {
        self.consumers.get(&id).ok_or(AllocError::UnknownConsumer(id))
    }

    pub fn contains(&self, id: ConsumerId) -> bool {
        self.consumers.contains_key(&id)
    }

    /// Reduces the budget of a consumer. Fails if the amount is negative, not finite or exceeds
    /// the remaining budget.
    pub fn debit(&mut self, id: ConsumerId, amount: f64) -> Result<()> {
        let consumer = self.get_mut(id)?;
        if !(amount.is_finite() && amount >= 0.) {
            return Err(AllocError::InvalidAmount { id, amount });
        }
        if amount > consumer.budget() {
            return Err(AllocError::InsufficientBudget {
                id,
                requested: amount,
                available: consumer.budget(),
            });
        }
        consumer.debit(amount);
        Ok(())
    }

    /// Permanently retires a consumer from the integral engine
    pub fn mark_unavailable(&mut self, id: ConsumerId) -> Result<()> {
        self.get_mut(id)?.retire();
        Ok(())
    }

    /// All consumers in ascending id order
    pub fn all_consumers(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.values()
    }

    pub fn snapshot(&self) -> Vec<ConsumerSnapshot> {
        self.all_consumers().map(Consumer::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    fn get_mut(&mut self, id: ConsumerId) -> Result<&mut Consumer> {
        self.consumers.get_mut(&id).ok_or(AllocError::UnknownConsumer(id))
    }

    fn check_new(&self, id: ConsumerId, initial_budget: f64) -> Result<()> {
        if id.0 == 0 {
            return Err(AllocError::InvalidConsumerId);
        }
        if self.consumers.contains_key(&id) {
            return Err(AllocError::DuplicateId(id));
        }
        if !(initial_budget.is_finite() && initial_budget > 0.) {
            return Err(AllocError::InvalidBudget {
                id,
                budget: initial_budget,
            });
        }
        Ok(())
    }

    fn insert(&mut self, id: ConsumerId, initial_budget: f64, y: f64) -> Result<()> {
        check_sample(id, y)?;
        log::debug!("registered consumer {id}: budget={initial_budget}, y={y:.03}");
        self.consumers.insert(id, Consumer::new(id, initial_budget, y));
        Ok(())
    }
}

fn check_sample(id: ConsumerId, y: f64) -> Result<()> {
    if (0.0..1.0).contains(&y) {
        Ok(())
    } else {
        Err(AllocError::InvalidSample { id, y })
    }
}
