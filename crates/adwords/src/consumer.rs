use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a consumer (advertiser). Ids are positive and stable for the consumer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerId(pub u32);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ConsumerId {
    fn from(value: u32) -> Self {
        ConsumerId(value)
    }
}

/// A budget-constrained participant competing for impressions
#[derive(Debug, Clone)]
pub struct Consumer {
    id: ConsumerId,
    initial_budget: f64,
    budget: f64,
    y: f64,
    available: bool,
}

impl Consumer {
    pub(crate) fn new(id: ConsumerId, initial_budget: f64, y: f64) -> Self {
        Self {
            id,
            initial_budget,
            budget: initial_budget,
            y,
            available: true,
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    pub fn initial_budget(&self) -> f64 {
        self.initial_budget
    }

    /// Remaining budget, never negative
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Perturbation seed drawn once at registration
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Availability flag maintained by the integral (GPG) engine. Once cleared it stays cleared.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn spent(&self) -> f64 {
        self.initial_budget - self.budget
    }

    pub(crate) fn debit(&mut self, amount: f64) {
        self.budget -= amount;
    }

    pub(crate) fn retire(&mut self) {
        self.available = false;
    }

    pub fn snapshot(&self) -> ConsumerSnapshot {
        ConsumerSnapshot {
            id: self.id,
            budget: self.budget,
            y: self.y,
        }
    }
}

/// Read-only view of a consumer used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSnapshot {
    pub id: ConsumerId,
    pub budget: f64,
    pub y: f64,
}
