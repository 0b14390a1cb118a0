use ndarray::{s, Array1};

use crate::config::TrainingConfig;

/// Average passenger delay inside a daily time window.
///
/// Every tick within the window contributes the building's mean delay per
/// passenger (0 for an empty building). When the window closes the day's
/// average is stored. Only used for monitoring progress.
#[derive(Debug, Clone)]
pub struct DelayTracker {
    window_start: i64,
    window_end: i64,
    day_duration: i64,
    /// Number of days in the trailing average
    moving_days: usize,
    window_sum: f64,
    daily: Vec<f64>,
}

impl DelayTracker {
    pub fn new(config: &TrainingConfig, day_duration: u32) -> DelayTracker {
        let ticks_per_hour = i64::from(day_duration / 24);
        DelayTracker {
            window_start: i64::from(config.average_window_start_hour) * ticks_per_hour,
            window_end: i64::from(config.average_window_end_hour) * ticks_per_hour,
            day_duration: i64::from(day_duration),
            moving_days: config.moving_average_days,
            window_sum: 0.0,
            daily: Vec::new(),
        }
    }

    pub fn observe(&mut self, tick: i64, mean_delay: Option<f64>) {
        if tick < 0 {
            return;
        }
        let t = tick % self.day_duration;
        if t < self.window_start || t > self.window_end {
            return;
        }
        if t == self.window_start {
            self.window_sum = 0.0;
        }
        self.window_sum += mean_delay.unwrap_or(0.0);
        if t == self.window_end {
            let ticks = (self.window_end - self.window_start + 1) as f64;
            self.daily.push(self.window_sum / ticks);
        }
    }

    /// Average delay of each completed day.
    pub fn daily(&self) -> Array1<f64> {
        Array1::from(self.daily.clone())
    }

    pub fn days(&self) -> usize {
        self.daily.len()
    }

    pub fn mean(&self) -> Option<f64> {
        use statrs::statistics::Statistics;
        if self.daily.is_empty() {
            None
        } else {
            Some(self.daily.iter().mean())
        }
    }

    /// Sample standard deviation of the daily averages.
    pub fn std_dev(&self) -> Option<f64> {
        use statrs::statistics::Statistics;
        if self.daily.len() < 2 {
            None
        } else {
            Some(self.daily.iter().std_dev())
        }
    }

    /// Entry `d` averages days `d - moving_days + 1 ..= d`, or all days
    /// so far near the start.
    pub fn moving_average(&self) -> Array1<f64> {
        let daily = self.daily();
        let mut averages = Array1::<f64>::zeros(daily.len());
        for d in 0..daily.len() {
            let first = (d + 1).saturating_sub(self.moving_days);
            averages[d] = daily.slice(s![first..=d]).mean().unwrap_or(0.0);
        }
        averages
    }

    pub fn clear(&mut self) {
        self.window_sum = 0.0;
        self.daily.clear();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tracker(moving_days: usize) -> DelayTracker {
        let config = TrainingConfig {
            average_window_start_hour: 12,
            average_window_end_hour: 14,
            moving_average_days: moving_days,
            ..Default::default()
        };
        // Two ticks per hour, window covers ticks 24..=28 of each day.
        DelayTracker::new(&config, 48)
    }

    #[test]
    fn averages_window_ticks_only() {
        // Arrange
        let mut t = tracker(50);
        // Act
        for tick in 0..48 {
            let delay = if (24..=28).contains(&tick) { Some(tick as f64) } else { Some(1000.0) };
            t.observe(tick, delay);
        }
        // Assert
        assert_eq!(t.days(), 1);
        assert_abs_diff_eq!(t.mean().unwrap(), 26.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_building_counts_as_zero() {
        let mut t = tracker(50);
        for tick in 24..=28 {
            t.observe(tick, if tick == 24 { Some(5.0) } else { None });
        }
        assert_abs_diff_eq!(t.daily()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn moving_average_uses_trailing_days() {
        // Arrange
        let mut t = tracker(2);
        // Act: three days with constant delays 2, 4 and 8.
        for (day, delay) in [2.0, 4.0, 8.0].iter().enumerate() {
            for tick in 0..48 {
                t.observe(day as i64 * 48 + tick, Some(*delay));
            }
        }
        // Assert
        let averages = t.moving_average();
        assert_abs_diff_eq!(averages, Array1::from(vec![2.0, 3.0, 6.0]), epsilon = 1e-12);
        assert_abs_diff_eq!(t.std_dev().unwrap(), 3.0550504633038935, epsilon = 1e-9);
    }

    #[test]
    fn no_days_no_statistics() {
        let mut t = tracker(5);
        t.observe(-1, Some(3.0));
        t.observe(30, Some(3.0));
        assert_eq!(t.mean(), None);
        assert_eq!(t.std_dev(), None);
        assert_eq!(t.moving_average().len(), 0);
        t.clear();
        assert_eq!(t.days(), 0);
    }
}
