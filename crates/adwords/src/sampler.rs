use rand::Rng;

/// Source of independent uniform draws in [0, 1), consulted once per consumer at registration
pub trait UniformSampler {
    fn next(&mut self) -> f64;
}

impl<F: FnMut() -> f64> UniformSampler for F {
    fn next(&mut self) -> f64 {
        self()
    }
}

/// Draws from any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSampler<R>(pub R);

impl<R: Rng> UniformSampler for RngSampler<R> {
    fn next(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Replays a fixed list of values, starting over when exhausted
#[derive(Debug, Clone)]
pub struct SequenceSampler {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSampler {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values = values.into_iter().collect::<Vec<_>>();
        assert!(!values.is_empty(), "SequenceSampler requires at least one value");
        Self { values, cursor: 0 }
    }
}

impl UniformSampler for SequenceSampler {
    fn next(&mut self) -> f64 {
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}
