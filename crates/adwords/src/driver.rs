use crate::{
    Allocation, AllocationEngine, AllocationPolicy, ArrivalClock, Bids, ConsumerId,
    ConsumerRegistry, ConsumerSnapshot, Result, UniformSampler,
};

/// Feeds arrivals one at a time to the configured engine.
///
/// Owns the registry and the arrival clock. Every arrival advances the clock once before it is
/// processed and is fully resolved before the call returns.
pub struct AllocationDriver {
    registry: ConsumerRegistry,
    engine: Box<dyn AllocationEngine>,
    clock: ArrivalClock,
}

impl AllocationDriver {
    pub fn new(registry: ConsumerRegistry, engine: Box<dyn AllocationEngine>) -> Self {
        Self {
            registry,
            engine,
            clock: ArrivalClock::new(),
        }
    }

    /// Empty registry drawing seeds from `sampler`, running the engine for `policy`
    pub fn from_policy(
        policy: AllocationPolicy,
        beta: f64,
        sampler: impl UniformSampler + 'static,
    ) -> Self {
        Self::new(ConsumerRegistry::new(sampler), policy.build(beta))
    }

    /// Registers a batch of consumers; see [`ConsumerRegistry::register_all`]
    pub fn register_consumers(
        &mut self,
        consumers: impl IntoIterator<Item = (ConsumerId, f64)>,
    ) -> Result<()> {
        if self.clock.now() > 0 {
            log::debug!("registering consumers after {} arrivals", self.clock.now());
        }
        self.registry.register_all(consumers)
    }

    pub fn process_new_arrival(&mut self, bids: &Bids) -> Result<Allocation> {
        let time = self.clock.tick();
        let allocation = self
            .engine
            .process_arrival(&mut self.registry, time, bids)?;
        log::debug!("arrival {time} ({}): {allocation}", self.engine.name());
        Ok(allocation)
    }

    pub fn snapshot(&self) -> Vec<ConsumerSnapshot> {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &ConsumerRegistry {
        &self.registry
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Time of the most recent arrival, 0 before the first one
    pub fn time(&self) -> u64 {
        self.clock.now()
    }
}
