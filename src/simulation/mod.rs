pub mod monte_carlo;

pub use monte_carlo::{
    MonteCarloSimulator, Outcome, OutcomeCounts, SimulationParams, SimulationResult, DEFAULT_PATHS,
    DEFAULT_STEPS,
};
