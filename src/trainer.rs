use std::path::Path;

use serde::Serialize;

use crate::arrivals::{ArrivalSource, TrendGenerator};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::stats::DelayTracker;
use crate::world::World;

/// Diagnostics for one finished episode.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EpisodeStats {
    pub episode: u32,
    pub ticks: u64,
    pub arrivals: usize,
    pub discharged: usize,
    pub total_reward: f64,
    pub epsilon: f64,
    /// States in the value table after the episode
    pub states: usize,
    /// Mean of the daily window delays
    pub mean_delay: Option<f64>,
    /// Sample standard deviation of the daily window delays
    pub std_dev_delay: Option<f64>,
    /// Trailing average of daily delays on the last day
    pub moving_average: Option<f64>,
}

/// Runs the learning loop for the configured number of episodes.
pub struct Trainer {
    config: Config,
}

impl Trainer {
    pub fn new(config: Config) -> Trainer {
        Trainer { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Learn from `episodes` episodes of arrivals drawn from `source`.
    pub fn train<A: ArrivalSource>(&self, source: A, episodes: u32) -> (Engine, Vec<EpisodeStats>) {
        let c = &self.config;
        let mut world = World::new(&c.building, &c.scenario, source);
        let mut engine = Engine::new(&c.learning, world.start_state());
        let mut tracker = DelayTracker::new(&c.training, c.building.day_duration);
        let mut stats = Vec::with_capacity(episodes as usize);

        for episode in 0..episodes {
            log::info!("Run {}", episode);
            tracker.clear();
            let summary = engine.run_episode(&mut world, &mut tracker);
            let row = EpisodeStats {
                episode,
                ticks: summary.ticks,
                arrivals: world.injected_count(),
                discharged: summary.discharged,
                total_reward: summary.total_reward,
                epsilon: summary.epsilon,
                states: summary.states,
                mean_delay: tracker.mean(),
                std_dev_delay: tracker.std_dev(),
                moving_average: tracker.moving_average().iter().last().copied(),
            };
            log::info!("State space size: {}, mean delay: {:?}, epsilon: {:.4}",
                       row.states, row.mean_delay, row.epsilon);
            stats.push(row);
        }
        (engine, stats)
    }

    /// Train on generated office days.
    pub fn run(&self, episodes: Option<u32>) -> (Engine, Vec<EpisodeStats>) {
        let c = &self.config;
        let source = TrendGenerator::new(c.building.floors(), &c.scenario);
        self.train(source, episodes.unwrap_or(c.training.episodes))
    }

    /// Write the value table, then the episode statistics if configured.
    ///
    /// A failed statistics write does not keep the table from being written.
    /// The first error is returned and the engine is left untouched, so the
    /// caller may save again.
    pub fn save(&self, engine: &Engine, stats: &[EpisodeStats]) -> Result<()> {
        let c = &self.config;
        let table = engine.table().save(&c.training.table_path);
        let written = match &c.training.stats_path {
            Some(path) => write_stats(path, stats),
            None => Ok(()),
        };
        if let Err(e) = &written {
            log::warn!("Episode statistics were not written: {}", e);
        }
        table.and(written)
    }
}

pub fn write_stats(path: &Path, stats: &[EpisodeStats]) -> Result<()> {
    log::info!("Writing statistics for {} episodes to {}.", stats.len(), path.display());
    let mut writer = csv::Writer::from_path(path)?;
    for row in stats {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
