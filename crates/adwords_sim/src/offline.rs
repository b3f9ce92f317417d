use crate::Scenario;

/// Upper bound on the revenue of the best offline allocation of a scenario.
///
/// Any `alpha` in `[0, 1]^n` gives a feasible point of the dual of the fractional budgeted
/// allocation LP, bounding the offline optimum from above:
///
/// `U(alpha) = sum_i B_i alpha_i + sum_j max_i b_ij (1 - alpha_i)`
///
/// `alpha = 0` is the sum of the highest bids and `alpha = 1` the sum of all budgets. The bound
/// is tightened by projected subgradient descent on `alpha`; the smallest value seen is returned.
#[derive(Debug, Clone)]
pub struct OfflineBound {
    max_iterations: usize,
    step: f64,
}

impl Default for OfflineBound {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            step: 0.1,
        }
    }
}

impl OfflineBound {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        assert!(step > 0.);
        self.step = step;
        self
    }

    pub fn evaluate(&self, scenario: &Scenario) -> f64 {
        let budgets = scenario
            .consumers
            .iter()
            .map(|&(_, budget)| budget)
            .collect::<Vec<_>>();

        // bids indexed by position in `scenario.consumers`
        let arrivals = scenario
            .arrivals
            .iter()
            .map(|bids| {
                scenario
                    .consumers
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &(id, _))| bids.positive(id).map(|bid| (i, bid)))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let mut alpha = vec![0.; budgets.len()];
        let mut best = budgets.iter().sum::<f64>();

        for k in 0..=self.max_iterations {
            let (value, demand) = dual(&budgets, &arrivals, &alpha);
            best = best.min(value);

            if k == self.max_iterations {
                break;
            }

            let eta = self.step / ((k + 1) as f64).sqrt();
            for ((a, &budget), &d) in alpha.iter_mut().zip(&budgets).zip(&demand) {
                *a = (*a - eta * (budget - d) / budget).clamp(0., 1.);
            }
        }

        log::debug!("offline bound: {best:.03}");
        best
    }
}

/// Dual objective at `alpha` and the bid volume each consumer wins under the discounted bids
fn dual(budgets: &[f64], arrivals: &[Vec<(usize, f64)>], alpha: &[f64]) -> (f64, Vec<f64>) {
    let mut value = budgets
        .iter()
        .zip(alpha)
        .map(|(budget, a)| budget * a)
        .sum::<f64>();
    let mut demand = vec![0.; budgets.len()];

    for bids in arrivals {
        let mut best: Option<(usize, f64, f64)> = None;
        for &(i, bid) in bids {
            let discounted = bid * (1. - alpha[i]);
            if discounted > 0. && best.is_none_or(|(_, _, d)| discounted > d) {
                best = Some((i, bid, discounted));
            }
        }
        if let Some((i, bid, discounted)) = best {
            value += discounted;
            demand[i] += bid;
        }
    }

    (value, demand)
}
