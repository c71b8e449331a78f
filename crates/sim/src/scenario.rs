//! Seeded scenario generation

use dlsim_types::{Mode, ResourceVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Everything random about a run, fixed up front from one seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub mode: Mode,
    pub seed: u64,
    pub total: ResourceVector,
    /// One row per process
    pub max_demand: Vec<ResourceVector>,
    /// Seed for each agent's own generator
    pub agent_seeds: Vec<u64>,
}

impl Scenario {
    /// Draw the max-demand matrix and agent seeds from `seed`
    ///
    /// Each component is uniform in `0..=total[k]`. A row that comes out
    /// all zero gets one random component set to 1, so every process has
    /// something to ask for.
    #[must_use]
    pub fn generate(mode: Mode, total: ResourceVector, processes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let max_demand = (0..processes)
            .map(|_| {
                let mut row: Vec<u32> = total.iter().map(|t| rng.random_range(0..=t)).collect();
                if !row.is_empty() && row.iter().all(|&c| c == 0) {
                    let k = rng.random_range(0..row.len());
                    row[k] = 1;
                }
                ResourceVector::from(row)
            })
            .collect();

        // Drawn after the matrix so the matrix depends only on the seed.
        let agent_seeds = (0..processes).map(|_| rng.random()).collect();

        Self {
            mode,
            seed,
            total,
            max_demand,
            agent_seeds,
        }
    }

    #[must_use]
    pub fn processes(&self) -> usize {
        self.max_demand.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_scenario() {
        let a = Scenario::generate(Mode::Avoidance, ResourceVector::from([3, 3, 2]), 5, 123);
        let b = Scenario::generate(Mode::Avoidance, ResourceVector::from([3, 3, 2]), 5, 123);
        assert_eq!(a, b);
        assert_eq!(a.processes(), 5);
        assert_eq!(a.agent_seeds.len(), 5);
    }

    #[test]
    fn test_rows_bounded_and_nonzero() {
        let total = ResourceVector::from([1, 4, 2]);
        for seed in 0..50 {
            let s = Scenario::generate(Mode::Detection, total.clone(), 6, seed);
            for row in &s.max_demand {
                assert!(row.fits_within(&total));
                assert!(!row.is_zero());
            }
        }
    }

    #[test]
    fn test_single_unit_resource() {
        let s = Scenario::generate(Mode::Detection, ResourceVector::from([1]), 4, 9);
        assert!(s.max_demand.iter().all(|row| row == &ResourceVector::from([1])));
    }
}
