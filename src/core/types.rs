use thiserror::Error;

/// Rejected configuration. Raised before any computation begins; the engine
/// never produces a partially computed result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("horizon must be at least 1 year")]
    ZeroHorizon,
    #[error("path count must be at least 1")]
    ZeroPaths,
    #[error("initial investment must be positive, got {0}")]
    NonPositiveInvestment(f64),
    #[error("initial withdrawal must be non-negative, got {0}")]
    NegativeWithdrawal(f64),
    #[error("return volatility must be non-negative, got {0}")]
    NegativeReturnVolatility(f64),
    #[error("inflation volatility must be non-negative, got {0}")]
    NegativeInflationVolatility(f64),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
}

/// Immutable input bundle for one simulation run.
///
/// Rates are fractions, not percentages: an expected annual return of 6%
/// is `returns_mean = 0.06`. Boundary layers own the percent conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_investment: f64,
    pub returns_mean: f64,
    pub returns_std: f64,
    pub years: usize,
    pub paths: usize,
    pub initial_withdrawal: f64,
    pub inflation_mean: f64,
    pub inflation_std: f64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite_fields = [
            (self.initial_investment, "initial investment"),
            (self.returns_mean, "expected return"),
            (self.returns_std, "return volatility"),
            (self.initial_withdrawal, "initial withdrawal"),
            (self.inflation_mean, "expected inflation"),
            (self.inflation_std, "inflation volatility"),
        ];
        for (value, name) in finite_fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }

        if self.years == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.paths == 0 {
            return Err(ConfigError::ZeroPaths);
        }
        if self.initial_investment <= 0.0 {
            return Err(ConfigError::NonPositiveInvestment(self.initial_investment));
        }
        if self.initial_withdrawal < 0.0 {
            return Err(ConfigError::NegativeWithdrawal(self.initial_withdrawal));
        }
        if self.returns_std < 0.0 {
            return Err(ConfigError::NegativeReturnVolatility(self.returns_std));
        }
        if self.inflation_std < 0.0 {
            return Err(ConfigError::NegativeInflationVolatility(self.inflation_std));
        }

        Ok(())
    }
}

/// Output of one simulation run: a `years x paths` matrix of portfolio
/// values plus each path's cumulative inflation factor across the horizon.
///
/// The matrix is a flat row-major buffer; row `t` holds every path's value
/// at year `t`. Read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    values: Vec<f64>,
    cumulative_inflation: Vec<f64>,
    years: usize,
    paths: usize,
    completed_years: usize,
}

impl SimulationResult {
    pub(crate) fn new(years: usize, paths: usize, initial_investment: f64) -> Self {
        let mut values = vec![0.0; years * paths];
        values[..paths].fill(initial_investment);
        Self {
            values,
            cumulative_inflation: vec![1.0; paths],
            years,
            paths,
            completed_years: years,
        }
    }

    pub fn years(&self) -> usize {
        self.years
    }

    pub fn paths(&self) -> usize {
        self.paths
    }

    /// Number of leading matrix rows that were actually simulated. Equal to
    /// `years()` unless the run was cancelled between year-steps.
    pub fn completed_years(&self) -> usize {
        self.completed_years
    }

    pub fn is_complete(&self) -> bool {
        self.completed_years == self.years
    }

    pub fn value(&self, year: usize, path: usize) -> f64 {
        self.values[year * self.paths + path]
    }

    /// All path values at one year index.
    pub fn year_values(&self, year: usize) -> &[f64] {
        &self.values[year * self.paths..(year + 1) * self.paths]
    }

    /// Terminal nominal values: the last row of the matrix.
    pub fn terminal_values(&self) -> &[f64] {
        self.year_values(self.years - 1)
    }

    pub fn cumulative_inflation(&self) -> &[f64] {
        &self.cumulative_inflation
    }

    /// Row `t - 1` read-only alongside row `t` writable, for the year-step
    /// update. The two regions never overlap.
    pub(crate) fn adjacent_rows_mut(&mut self, year: usize) -> (&[f64], &mut [f64]) {
        let (head, tail) = self.values.split_at_mut(year * self.paths);
        (&head[(year - 1) * self.paths..], &mut tail[..self.paths])
    }

    pub(crate) fn set_cumulative_inflation(&mut self, factors: Vec<f64>) {
        debug_assert_eq!(factors.len(), self.paths);
        self.cumulative_inflation = factors;
    }

    pub(crate) fn set_completed_years(&mut self, completed_years: usize) {
        self.completed_years = completed_years;
    }
}
