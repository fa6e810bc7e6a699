use serde::{Deserialize, Serialize};

pub const MAX_GRID_SIZE: usize = 2048;
pub const MAX_TRIALS: usize = 100_000;

/// Two-sided confidence level for the threshold interval
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Ninety,
    #[default]
    NinetyFive,
    NinetyNine,
}

impl ConfidenceLevel {
    pub fn name(&self) -> &str {
        match self {
            ConfidenceLevel::Ninety => "90%",
            ConfidenceLevel::NinetyFive => "95%",
            ConfidenceLevel::NinetyNine => "99%",
        }
    }

    /// Standard normal critical value
    pub fn z(&self) -> f64 {
        match self {
            ConfidenceLevel::Ninety => 1.645,
            ConfidenceLevel::NinetyFive => 1.96,
            ConfidenceLevel::NinetyNine => 2.576,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ConfidenceLevel::Ninety => ConfidenceLevel::NinetyFive,
            ConfidenceLevel::NinetyFive => ConfidenceLevel::NinetyNine,
            ConfidenceLevel::NinetyNine => ConfidenceLevel::Ninety,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ConfidenceLevel::Ninety => ConfidenceLevel::NinetyNine,
            ConfidenceLevel::NinetyFive => ConfidenceLevel::Ninety,
            ConfidenceLevel::NinetyNine => ConfidenceLevel::NinetyFive,
        }
    }

    /// Parse "90", "95%", "0.99" and friends
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_end_matches('%') {
            "90" | "0.90" | "0.9" => Some(ConfidenceLevel::Ninety),
            "95" | "0.95" => Some(ConfidenceLevel::NinetyFive),
            "99" | "0.99" => Some(ConfidenceLevel::NinetyNine),
            _ => None,
        }
    }
}

/// Parameters of one Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Grid is grid_size x grid_size sites
    pub grid_size: usize,
    /// Number of independent trials
    pub trials: usize,
    /// Fixed RNG seed; None draws from entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            grid_size: 200,
            trials: 100,
            seed: None,
            confidence: ConfidenceLevel::default(),
        }
    }
}

impl SimulationSettings {
    pub fn adjust_grid_size(&mut self, delta: i64) {
        self.grid_size = (self.grid_size as i64 + delta).clamp(1, MAX_GRID_SIZE as i64) as usize;
    }

    pub fn adjust_trials(&mut self, delta: i64) {
        self.trials = (self.trials as i64 + delta).clamp(1, MAX_TRIALS as i64) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_cycle() {
        let mut level = ConfidenceLevel::default();
        for _ in 0..3 {
            level = level.next();
        }
        assert_eq!(level, ConfidenceLevel::NinetyFive);
        assert_eq!(level.next().prev(), level);
    }

    #[test]
    fn test_confidence_parse() {
        assert_eq!(ConfidenceLevel::parse("95"), Some(ConfidenceLevel::NinetyFive));
        assert_eq!(ConfidenceLevel::parse("99%"), Some(ConfidenceLevel::NinetyNine));
        assert_eq!(ConfidenceLevel::parse("0.9"), Some(ConfidenceLevel::Ninety));
        assert_eq!(ConfidenceLevel::parse("80"), None);
    }

    #[test]
    fn test_adjusters_clamp() {
        let mut settings = SimulationSettings::default();
        settings.adjust_grid_size(-10_000);
        assert_eq!(settings.grid_size, 1);
        settings.adjust_grid_size(1_000_000);
        assert_eq!(settings.grid_size, MAX_GRID_SIZE);
        settings.adjust_trials(-5);
        assert_eq!(settings.trials, 95);
        settings.adjust_trials(i64::from(u32::MAX));
        assert_eq!(settings.trials, MAX_TRIALS);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let settings: SimulationSettings =
            serde_json::from_str(r#"{"grid_size": 10, "trials": 5}"#).unwrap();
        assert_eq!(settings.seed, None);
        assert_eq!(settings.confidence, ConfidenceLevel::NinetyFive);
    }
}
