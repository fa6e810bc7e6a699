use crate::percolation::{Percolation, PercolationError, SiteView};
use crate::settings::SimulationSettings;
use crate::stats::{open_random_site, RunningStats};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const MAX_STEPS_PER_FRAME: usize = 50;

/// Viewer state: one live trial plus a summary of the finished ones
pub struct App {
    pub grid: Percolation,
    pub settings: SimulationSettings,
    pub completed: RunningStats,
    pub last_threshold: Option<f64>,
    pub steps_per_frame: usize,
    pub paused: bool,
    /// Start the next trial automatically once the current one percolates
    pub auto_advance: bool,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Site views cached for rendering, refreshed after each tick
    pub sites: Vec<SiteView>,
    rng: StdRng,
    recorded: bool,
}

impl App {
    pub fn new(
        settings: SimulationSettings,
        steps_per_frame: usize,
    ) -> Result<Self, PercolationError> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut grid = Percolation::new(settings.grid_size)?;
        let sites = grid.snapshot()?;
        Ok(Self {
            grid,
            settings,
            completed: RunningStats::new(),
            last_threshold: None,
            steps_per_frame: steps_per_frame.clamp(1, MAX_STEPS_PER_FRAME),
            paused: false,
            auto_advance: true,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            sites,
            rng,
            recorded: false,
        })
    }

    /// Open up to `steps_per_frame` sites in the current trial
    pub fn tick(&mut self) -> Result<(), PercolationError> {
        if self.paused {
            return Ok(());
        }

        if self.grid.percolates() {
            if self.auto_advance && !self.all_trials_done() {
                self.new_trial()?;
            }
            return Ok(());
        }

        for _ in 0..self.steps_per_frame {
            let opened = open_random_site(&mut self.grid, &mut self.rng)?;
            if opened.is_none() || self.grid.percolates() {
                break;
            }
        }

        if self.grid.percolates() && !self.recorded {
            let threshold = self.open_fraction();
            self.completed.push(threshold);
            self.last_threshold = Some(threshold);
            self.recorded = true;
        }

        self.sites = self.grid.snapshot()?;
        Ok(())
    }

    /// Discard the current grid and start a fresh trial
    pub fn new_trial(&mut self) -> Result<(), PercolationError> {
        self.grid = Percolation::new(self.settings.grid_size)?;
        self.sites = self.grid.snapshot()?;
        self.recorded = false;
        Ok(())
    }

    /// Forget all finished trials and start over
    pub fn reset(&mut self) -> Result<(), PercolationError> {
        self.completed = RunningStats::new();
        self.last_threshold = None;
        self.new_trial()
    }

    /// Advance to the next trial, but only once the current one is done
    pub fn next_trial(&mut self) -> Result<(), PercolationError> {
        if self.grid.percolates() {
            self.new_trial()?;
        }
        Ok(())
    }

    pub fn all_trials_done(&self) -> bool {
        self.completed.count() >= self.settings.trials
    }

    pub fn open_fraction(&self) -> f64 {
        let n = self.grid.size();
        self.grid.number_of_open_sites() as f64 / (n * n) as f64
    }

    pub fn percolated(&self) -> bool {
        self.recorded
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn toggle_auto_advance(&mut self) {
        self.auto_advance = !self.auto_advance;
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn cycle_confidence(&mut self) {
        self.settings.confidence = self.settings.confidence.next();
    }

    pub fn cycle_confidence_prev(&mut self) {
        self.settings.confidence = self.settings.confidence.prev();
    }

    /// Change the target number of trials; finished trials are kept
    pub fn adjust_trials(&mut self, delta: i64) {
        self.settings.adjust_trials(delta);
    }

    /// Resize the grid. Thresholds from other sizes are not comparable, so
    /// this starts over.
    pub fn adjust_grid_size(&mut self, delta: i64) -> Result<(), PercolationError> {
        let before = self.settings.grid_size;
        self.settings.adjust_grid_size(delta);
        if self.settings.grid_size != before {
            self.reset()?;
        }
        Ok(())
    }

    /// Confidence interval over the finished trials
    pub fn confidence_interval(&self) -> Option<(f64, f64)> {
        let count = self.completed.count();
        if count == 0 {
            return None;
        }
        let half = self.settings.confidence.z() * self.completed.stddev() / (count as f64).sqrt();
        let mean = self.completed.mean();
        Some((mean - half, mean + half))
    }

    pub fn increase_speed(&mut self) {
        self.steps_per_frame = (self.steps_per_frame + 1).min(MAX_STEPS_PER_FRAME);
    }

    pub fn decrease_speed(&mut self) {
        self.steps_per_frame = self.steps_per_frame.saturating_sub(1).max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(grid_size: usize, trials: usize) -> App {
        let settings = SimulationSettings {
            grid_size,
            trials,
            seed: Some(17),
            ..Default::default()
        };
        App::new(settings, MAX_STEPS_PER_FRAME).unwrap()
    }

    fn run_until_percolated(app: &mut App) {
        for _ in 0..10_000 {
            if app.percolated() {
                return;
            }
            app.tick().unwrap();
        }
        panic!("trial never percolated");
    }

    #[test]
    fn test_new_rejects_empty_grid() {
        let settings = SimulationSettings {
            grid_size: 0,
            ..Default::default()
        };
        assert!(App::new(settings, 5).is_err());
    }

    #[test]
    fn test_tick_records_threshold_once() {
        let mut app = app(10, 3);
        app.auto_advance = false;
        run_until_percolated(&mut app);

        assert_eq!(app.completed.count(), 1);
        let threshold = app.last_threshold.unwrap();
        assert_eq!(threshold, app.open_fraction());

        // Further ticks neither open sites nor record again
        let open = app.grid.number_of_open_sites();
        app.tick().unwrap();
        assert_eq!(app.grid.number_of_open_sites(), open);
        assert_eq!(app.completed.count(), 1);
    }

    #[test]
    fn test_auto_advance_stops_after_trials() {
        let mut app = app(4, 2);
        for _ in 0..10_000 {
            app.tick().unwrap();
            if app.all_trials_done() {
                break;
            }
        }
        assert!(app.all_trials_done());
        assert_eq!(app.completed.count(), 2);

        // Last grid stays on screen once every trial has run
        app.tick().unwrap();
        assert!(app.percolated());
    }

    #[test]
    fn test_paused_does_nothing() {
        let mut app = app(5, 1);
        app.toggle_pause();
        app.tick().unwrap();
        assert_eq!(app.grid.number_of_open_sites(), 0);
    }

    #[test]
    fn test_next_trial_only_after_percolation() {
        let mut app = app(5, 5);
        app.auto_advance = false;
        app.steps_per_frame = 1;
        app.tick().unwrap();
        app.next_trial().unwrap();
        assert_eq!(app.grid.number_of_open_sites(), 1);

        run_until_percolated(&mut app);
        app.next_trial().unwrap();
        assert_eq!(app.grid.number_of_open_sites(), 0);
        assert!(!app.percolated());
    }

    #[test]
    fn test_reset_clears_summary() {
        let mut app = app(3, 5);
        app.auto_advance = false;
        run_until_percolated(&mut app);
        app.reset().unwrap();
        assert_eq!(app.completed.count(), 0);
        assert_eq!(app.last_threshold, None);
        assert!(app.sites.iter().all(|&s| s == SiteView::Blocked));
    }

    #[test]
    fn test_grid_resize_starts_over() {
        let mut app = app(6, 5);
        app.auto_advance = false;
        run_until_percolated(&mut app);

        app.adjust_grid_size(4).unwrap();
        assert_eq!(app.grid.size(), 10);
        assert_eq!(app.sites.len(), 100);
        assert_eq!(app.completed.count(), 0);

        // Clamped at the lower bound, no reset when nothing changes
        app.adjust_grid_size(-100).unwrap();
        assert_eq!(app.grid.size(), 1);
        app.tick().unwrap();
        app.adjust_grid_size(-1).unwrap();
        assert_eq!(app.completed.count(), 1);
    }

    #[test]
    fn test_confidence_interval() {
        let mut app = app(5, 10);
        assert_eq!(app.confidence_interval(), None);

        app.auto_advance = false;
        run_until_percolated(&mut app);
        let t = app.last_threshold.unwrap();
        assert_eq!(app.confidence_interval(), Some((t, t)));

        app.cycle_confidence();
        assert_eq!(app.settings.confidence, crate::settings::ConfidenceLevel::NinetyNine);
        app.cycle_confidence_prev();
        assert_eq!(app.settings.confidence, crate::settings::ConfidenceLevel::NinetyFive);
    }

    #[test]
    fn test_speed_bounds() {
        let mut app = app(3, 1);
        app.steps_per_frame = 1;
        app.decrease_speed();
        assert_eq!(app.steps_per_frame, 1);
        app.steps_per_frame = MAX_STEPS_PER_FRAME;
        app.increase_speed();
        assert_eq!(app.steps_per_frame, MAX_STEPS_PER_FRAME);
    }
}
