use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Arrival volume over a day of time slots, higher during peak hours
#[derive(Debug, Clone)]
pub struct TrafficProfile {
    pub slots: usize,
    pub min_arrivals: usize,
    pub max_arrivals: usize,

    /// First and last peak slot, inclusive
    pub peak: (usize, usize),

    /// Volume multiplier during peak slots
    pub peak_amplitude: f64,

    /// Standard deviation of the noise added to each slot
    pub noise: f64,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            slots: 24,
            min_arrivals: 5,
            max_arrivals: 15,
            peak: (9, 17),
            peak_amplitude: 1.2,
            noise: 2.,
        }
    }
}

impl TrafficProfile {
    /// Number of arrivals in each slot, always within `[min_arrivals, max_arrivals]`
    pub fn arrivals_per_slot<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        assert!(self.min_arrivals <= self.max_arrivals);

        let min = self.min_arrivals as f64;
        let max = self.max_arrivals as f64;

        // a non-finite or negative deviation disables the noise
        let noise = Normal::new(0., self.noise).ok();

        (0..self.slots)
            .map(|slot| {
                let mut volume = if min < max {
                    rng.random_range(min..max)
                } else {
                    min
                };
                if (self.peak.0..=self.peak.1).contains(&slot) {
                    volume *= self.peak_amplitude;
                }
                if let Some(noise) = &noise {
                    volume += noise.sample(rng);
                }
                volume.clamp(min, max) as usize
            })
            .collect()
    }
}
