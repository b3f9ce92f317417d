//! Online budget-constrained allocation of impressions.
//!
//! Two engines compete for the same problem: [`PartialAllocationEngine`] splits each arrival
//! fractionally between consumers, [`GpgEngine`] awards it whole to a single consumer. Both rank
//! bidders by a randomly perturbed value and never let a consumer spend more than its budget.

mod bids;
mod clock;
mod consumer;
mod driver;
mod engine;
mod error;
mod gpg;
mod partial;
mod perturbation;
mod registry;
mod sampler;
mod stats;

pub use bids::*;
pub use clock::*;
pub use consumer::*;
pub use driver::*;
pub use engine::*;
pub use error::*;
pub use gpg::*;
pub use partial::*;
pub use perturbation::*;
pub use registry::*;
pub use sampler::*;
pub use stats::*;
