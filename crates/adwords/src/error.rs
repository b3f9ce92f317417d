use crate::ConsumerId;

/// Errors raised by the consumer registry and propagated by the engines
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocError {
    #[error("consumer {0} is already registered")]
    DuplicateId(ConsumerId),

    #[error("consumer {0} is not registered")]
    UnknownConsumer(ConsumerId),

    #[error("debit of {requested} exceeds remaining budget {available} of consumer {id}")]
    InsufficientBudget {
        id: ConsumerId,
        requested: f64,
        available: f64,
    },

    #[error("debit amount for consumer {id} must be non-negative and finite: {amount}")]
    InvalidAmount { id: ConsumerId, amount: f64 },

    #[error("consumer ids must be positive")]
    InvalidConsumerId,

    #[error("initial budget of consumer {id} must be positive and finite: {budget}")]
    InvalidBudget { id: ConsumerId, budget: f64 },

    #[error("perturbation sample of consumer {id} is outside [0, 1): {y}")]
    InvalidSample { id: ConsumerId, y: f64 },
}

pub type Result<T> = std::result::Result<T, AllocError>;
