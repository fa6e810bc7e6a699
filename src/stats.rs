use crate::percolation::{Percolation, PercolationError};
use crate::settings::{ConfidenceLevel, SimulationSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Open one uniformly random blocked site.
///
/// Draws (row, col) until it hits a blocked site. Returns the opened site,
/// or None if every site is already open.
pub fn open_random_site<R: Rng + ?Sized>(
    grid: &mut Percolation,
    rng: &mut R,
) -> Result<Option<(usize, usize)>, PercolationError> {
    let n = grid.size();
    if grid.number_of_open_sites() == n * n {
        return Ok(None);
    }

    loop {
        let row = rng.gen_range(1..=n);
        let col = rng.gen_range(1..=n);
        if !grid.is_open(row, col)? {
            grid.open(row, col)?;
            return Ok(Some((row, col)));
        }
    }
}

/// Run one trial on a fresh n-by-n grid and return the fraction of sites
/// open at the moment it first percolates
pub fn run_trial<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<f64, PercolationError> {
    let mut grid = Percolation::new(n)?;
    while !grid.percolates() {
        if open_random_site(&mut grid, rng)?.is_none() {
            break;
        }
    }
    Ok(grid.number_of_open_sites() as f64 / (n * n) as f64)
}

/// Welford running mean / variance
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation; 0 with fewer than two samples
    pub fn stddev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}

/// Percolation threshold estimate from independent trials
#[derive(Debug, Clone)]
pub struct PercolationStats {
    summary: RunningStats,
    confidence: ConfidenceLevel,
}

impl PercolationStats {
    /// Perform `trials` independent experiments on an n-by-n grid
    pub fn new<R: Rng + ?Sized>(
        n: usize,
        trials: usize,
        rng: &mut R,
    ) -> Result<Self, PercolationError> {
        if n == 0 {
            return Err(PercolationError::InvalidArgument {
                what: "grid size",
                value: n,
            });
        }
        if trials == 0 {
            return Err(PercolationError::InvalidArgument {
                what: "trial count",
                value: trials,
            });
        }

        let mut summary = RunningStats::new();
        for trial in 0..trials {
            let threshold = run_trial(n, rng)?;
            debug!(trial, threshold, "trial percolated");
            summary.push(threshold);
        }

        Ok(Self {
            summary,
            confidence: ConfidenceLevel::default(),
        })
    }

    /// Run with the settings' seed (or entropy) and confidence level
    pub fn from_settings(settings: &SimulationSettings) -> Result<Self, PercolationError> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            grid_size = settings.grid_size,
            trials = settings.trials,
            seed = ?settings.seed,
            "running percolation trials"
        );
        let stats = Self::new(settings.grid_size, settings.trials, &mut rng)?;
        Ok(stats.with_confidence(settings.confidence))
    }

    pub fn with_confidence(mut self, confidence: ConfidenceLevel) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    pub fn trials(&self) -> usize {
        self.summary.count()
    }

    /// Sample mean of the percolation threshold
    pub fn mean(&self) -> f64 {
        self.summary.mean()
    }

    /// Sample standard deviation of the percolation threshold
    pub fn stddev(&self) -> f64 {
        self.summary.stddev()
    }

    /// Low endpoint of the confidence interval
    pub fn confidence_lo(&self) -> f64 {
        self.mean() - self.half_width()
    }

    /// High endpoint of the confidence interval
    pub fn confidence_hi(&self) -> f64 {
        self.mean() + self.half_width()
    }

    fn half_width(&self) -> f64 {
        self.confidence.z() * self.stddev() / (self.trials() as f64).sqrt()
    }
}
