use serde::{Deserialize, Serialize};

/// The perturbation family `g(x) = exp(β·(x − 1))` shared by both engines.
///
/// `g_of_time` is evaluated at the arrival counter, `g_of_sample` at a consumer's fixed seed `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    beta: f64,
}

impl Perturbation {
    pub fn new(beta: f64) -> Self {
        assert!(beta.is_finite(), "perturbation coefficient must be finite");
        Self { beta }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// g(t) for arrival counter t >= 1
    pub fn g_of_time(&self, t: u64) -> f64 {
        debug_assert!(t >= 1);
        (self.beta * (t as f64 - 1.)).exp()
    }

    /// g(y) for a seed y in [0, 1)
    pub fn g_of_sample(&self, y: f64) -> f64 {
        (self.beta * (y - 1.)).exp()
    }
}
