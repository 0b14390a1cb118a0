use std::path::{Path, PathBuf};

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::state::Floors;

/// Hold information read from the TOML configuration file.
///
/// Every section and key may be left out, missing values fall back to
/// their defaults.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub building: BuildingConfig,
    pub learning: LearningConfig,
    pub scenario: ScenarioConfig,
    pub training: TrainingConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BuildingConfig {
    pub min_floor: u8,
    pub max_floor: u8,
    /// Maximum number of passengers inside one elevator
    pub capacity: usize,
    /// Ticks in a simulated day, a multiple of 24
    pub day_duration: u32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig { min_floor: 0, max_floor: 4, capacity: 10, day_duration: 60 * 24 }
    }
}

impl BuildingConfig {
    pub fn floors(&self) -> Floors {
        Floors::new(self.min_floor, self.max_floor)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LearningConfig {
    /// Initial exploration probability
    pub epsilon: f64,
    /// Learning rate
    pub alpha: f64,
    /// Discount rate
    pub gamma: f64,
    /// Fraction of epsilon removed every tick
    pub annealing: f64,
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig { epsilon: 0.9, alpha: 0.8, gamma: 0.4, annealing: 0.001 / 1000.0, seed: None }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Number of identical days in one episode
    pub days_per_episode: u32,
    pub prob_follow_trend: f64,
    pub prob_use_min_floor: f64,
    pub seed: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig { days_per_episode: 2000, prob_follow_trend: 0.75, prob_use_min_floor: 0.6, seed: None }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: u32,
    /// Where the learned value table is written
    pub table_path: PathBuf,
    /// Optional CSV file with one row of diagnostics per episode
    pub stats_path: Option<PathBuf>,
    pub average_window_start_hour: u32,
    pub average_window_end_hour: u32,
    /// Days covered by the trailing average of daily delays
    pub moving_average_days: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 150,
            table_path: PathBuf::from("out_Q"),
            stats_path: None,
            average_window_start_hour: 12,
            average_window_end_hour: 14,
            moving_average_days: 50,
        }
    }
}

fn check(ok: bool, message: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfig(message.to_string()))
    }
}

fn probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        log::info!("Reading config file: {}", path.display());
        let config = Config::from_config_file(path)
            .map_err(|source| Error::Config { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.building;
        check(b.min_floor < b.max_floor, "min_floor must be below max_floor")?;
        check(b.capacity > 0, "capacity must be positive")?;
        check(b.day_duration >= 24 && b.day_duration % 24 == 0,
              "day_duration must be a positive multiple of 24")?;

        let l = &self.learning;
        check(probability(l.epsilon), "epsilon must be in [0, 1]")?;
        check(l.alpha > 0.0 && l.alpha <= 1.0, "alpha must be in (0, 1]")?;
        check(probability(l.gamma), "gamma must be in [0, 1]")?;
        check(l.annealing >= 0.0 && l.annealing < 1.0, "annealing must be in [0, 1)")?;

        let s = &self.scenario;
        check(s.days_per_episode > 0, "days_per_episode must be positive")?;
        check(probability(s.prob_follow_trend), "prob_follow_trend must be in [0, 1]")?;
        check(probability(s.prob_use_min_floor), "prob_use_min_floor must be in [0, 1]")?;

        let t = &self.training;
        check(t.episodes > 0, "episodes must be positive")?;
        check(t.average_window_start_hour <= t.average_window_end_hour
              && t.average_window_end_hour < 24,
              "averaging window must lie inside one day")?;
        check(t.moving_average_days > 0, "moving_average_days must be positive")?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempdir::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.building.floors(), Floors::new(0, 4));
        assert_eq!(config.scenario.days_per_episode, 2000);
    }

    #[test]
    fn load_partial_file() {
        // Arrange
        let dir = TempDir::new("elevator_config").unwrap();
        let path = dir.path().join("elevator.toml");
        fs::write(&path, "[building]\nmax_floor = 6\n\n[learning]\nalpha = 0.5\nseed = 9\n").unwrap();
        // Act
        let config = Config::load(&path).unwrap();
        // Assert
        assert_eq!(config.building.max_floor, 6);
        assert_eq!(config.building.capacity, 10);
        assert_eq!(config.learning.alpha, 0.5);
        assert_eq!(config.learning.seed, Some(9));
        assert_eq!(config.learning.gamma, 0.4);
        assert_eq!(config.training.table_path, PathBuf::from("out_Q"));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = Config::load(Path::new("/nonexistent/elevator.toml"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn inverted_floors_are_rejected() {
        let mut config = Config::default();
        config.building.min_floor = 4;
        config.building.max_floor = 4;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn odd_day_duration_is_rejected() {
        let mut config = Config::default();
        config.building.day_duration = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_learning_rate_is_rejected() {
        let mut config = Config::default();
        config.learning.alpha = 0.0;
        assert!(config.validate().is_err());
    }
}
