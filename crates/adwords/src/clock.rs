/// Counts arrivals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrivalClock {
    /// Total number of arrivals started since the driver was created
    arrival_count: u64,
}

impl ArrivalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next arrival and returns its time, starting at 1
    pub fn tick(&mut self) -> u64 {
        self.arrival_count += 1;
        self.arrival_count
    }

    /// Time of the most recent arrival, 0 before the first one
    pub fn now(&self) -> u64 {
        self.arrival_count
    }
}
