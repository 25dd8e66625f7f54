use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::rng::NormalSource;
use super::types::{ConfigError, SimulationConfig, SimulationResult};

/// Cooperative cancellation signal checked between year-steps. Share it
/// behind an `Arc` when the cancelling side lives on another thread.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs the full multi-path recurrence and returns the complete
/// `years x paths` value matrix plus per-path cumulative inflation factors.
///
/// Year 0 is deterministic: every path starts at the initial investment.
/// Each subsequent year applies, per path,
/// `value = max(prev * (1 + return) - withdrawal, 0)` with a fresh return
/// draw, then compounds the withdrawal and the cumulative inflation factor
/// by the same inflation draw. Withdrawals are deliberately not floored: a
/// drawn growth rate below -1 flips the withdrawal into a deposit, and that
/// behavior is part of the model.
pub fn run_simulation(
    config: &SimulationConfig,
    source: &mut impl NormalSource,
) -> Result<SimulationResult, ConfigError> {
    run_inner(config, source, None)
}

/// Like [`run_simulation`], but checks `cancel` before each year-step. On
/// cancellation the result is returned with `completed_years()` marking how
/// many leading rows are valid; later rows are untouched zeros and the
/// inflation factors reflect only the completed steps.
pub fn run_simulation_cancellable(
    config: &SimulationConfig,
    source: &mut impl NormalSource,
    cancel: &CancelFlag,
) -> Result<SimulationResult, ConfigError> {
    run_inner(config, source, Some(cancel))
}

fn run_inner(
    config: &SimulationConfig,
    source: &mut impl NormalSource,
    cancel: Option<&CancelFlag>,
) -> Result<SimulationResult, ConfigError> {
    config.validate()?;

    let paths = config.paths;
    let mut result = SimulationResult::new(config.years, paths, config.initial_investment);
    let mut withdrawals = vec![config.initial_withdrawal; paths];
    let mut cumulative_inflation = vec![1.0; paths];
    let mut returns = vec![0.0; paths];
    let mut growth = vec![0.0; paths];

    debug!(years = config.years, paths, "starting simulation run");

    let mut completed_years = config.years;
    for year in 1..config.years {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            completed_years = year;
            break;
        }

        source.fill_normal(config.returns_mean, config.returns_std, &mut returns);
        let (previous, current) = result.adjacent_rows_mut(year);
        for path in 0..paths {
            current[path] = (previous[path] * (1.0 + returns[path]) - withdrawals[path]).max(0.0);
        }

        source.fill_normal(config.inflation_mean, config.inflation_std, &mut growth);
        for path in 0..paths {
            // The same draw drives the withdrawal step and the deflator;
            // splitting them would change what "real value" means.
            withdrawals[path] *= 1.0 + growth[path];
            cumulative_inflation[path] *= 1.0 + growth[path];
        }
    }

    result.set_cumulative_inflation(cumulative_inflation);
    result.set_completed_years(completed_years);
    Ok(result)
}
