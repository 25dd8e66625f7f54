mod engine;
mod rng;
mod stats;
mod types;

pub use engine::{CancelFlag, run_simulation, run_simulation_cancellable};
pub use rng::{NormalSource, SeededNormal};
pub use stats::{
    DEFAULT_SAMPLE_PATHS, DistributionSummary, PERCENTILE_RANKS, PercentileRow, TrajectoryBand,
    distribution_summary, percentile_table, sample_path_indices, sample_trajectories,
    success_rate, terminal_real_values, trajectory_band,
};
pub use types::{ConfigError, SimulationConfig, SimulationResult};
