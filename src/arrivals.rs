use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ScenarioConfig;
use crate::state::{Direction, Floors};

/// A passenger asking to travel from `origin` to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassengerRequest {
    /// Tick at which the passenger shows up at `origin`
    pub tick: u32,
    pub origin: u8,
    pub destination: u8,
}

impl PassengerRequest {
    pub fn new(tick: u32, origin: u8, destination: u8) -> PassengerRequest {
        if origin == destination {
            panic!("Passenger origin and destination are both floor {}.", origin)
        }
        PassengerRequest { tick, origin, destination }
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::between(self.origin, self.destination)
    }

    /// Shortest possible trip, one tick per floor.
    pub fn distance(&self) -> i64 {
        (i64::from(self.origin) - i64::from(self.destination)).abs()
    }

    /// Ticks spent so far beyond the shortest possible trip.
    pub fn delay(&self, now: i64) -> i64 {
        now - i64::from(self.tick) - self.distance()
    }

    /// Copy of the request moved `offset` ticks later.
    pub fn shifted(&self, offset: u32) -> PassengerRequest {
        PassengerRequest { tick: self.tick + offset, ..*self }
    }
}

impl fmt::Display for PassengerRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[t={}, {} -> {}]", self.tick, self.origin, self.destination)
    }
}


/// Source of passenger arrivals for the simulated building.
pub trait ArrivalSource {
    /// Requests for one day of `duration` ticks starting at `start_tick`.
    /// The result does not need to be sorted.
    fn day(&mut self, start_tick: u32, duration: u32) -> Vec<PassengerRequest>;

    /// One generated day repeated `days` times, sorted by tick.
    fn identical_days(&mut self, days: u32, duration: u32) -> Vec<PassengerRequest> {
        let mut day = self.day(0, duration);
        day.sort_by_key(|r| r.tick);
        let mut requests = Vec::with_capacity(day.len() * days as usize);
        for d in 0..days {
            requests.extend(day.iter().map(|r| r.shifted(d * duration)));
        }
        requests
    }
}


/// Replays the same requests every day.
#[derive(Debug, Clone)]
pub struct FixedArrivals {
    requests: Vec<PassengerRequest>,
}

impl FixedArrivals {
    pub fn new(requests: Vec<PassengerRequest>) -> FixedArrivals {
        FixedArrivals { requests }
    }
}

impl ArrivalSource for FixedArrivals {
    fn day(&mut self, start_tick: u32, _duration: u32) -> Vec<PassengerRequest> {
        self.requests.iter().map(|r| r.shifted(start_tick)).collect()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
    None,
}

/// A stretch of the day with its own traffic pattern.
struct Band {
    start_hour: u32,
    hours: u32,
    trend: Trend,
    count: u32,
    extra: u32,
}

const fn band(start_hour: u32, hours: u32, trend: Trend, count: u32, extra: u32) -> Band {
    Band { start_hour, hours, trend, count, extra }
}

/// Office building traffic: up in the morning, down in the evening.
const DAY_PLAN: [Band; 12] = [
    band(0, 6, Trend::None, 30, 6),
    band(6, 1, Trend::Up, 10, 3),
    band(7, 1, Trend::Up, 30, 5),
    band(8, 1, Trend::Up, 40, 10),
    band(9, 1, Trend::Up, 35, 7),
    band(10, 2, Trend::Up, 50, 6),
    band(12, 3, Trend::None, 100, 10),
    band(15, 1, Trend::Down, 25, 6),
    band(16, 1, Trend::Down, 35, 8),
    band(17, 1, Trend::Down, 30, 10),
    band(18, 2, Trend::Down, 35, 5),
    band(20, 4, Trend::None, 35, 6),
];


/// Random office-building day.
///
/// During an up trend most passengers travel upwards, usually starting from
/// the ground floor; during a down trend most travel down, usually to the
/// ground floor. Any trip can still occur with a smaller probability.
pub struct TrendGenerator {
    floors: Floors,
    /// Probability that a request follows the trend of its band
    prob_follow_trend: f64,
    /// Probability that the ground floor is the trip's outer end
    prob_use_min_floor: f64,
    rng: StdRng,
}

impl TrendGenerator {
    pub fn new(floors: Floors, config: &ScenarioConfig) -> TrendGenerator {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        TrendGenerator {
            floors,
            prob_follow_trend: config.prob_follow_trend,
            prob_use_min_floor: config.prob_use_min_floor,
            rng,
        }
    }

    fn goes_up(&mut self, trend: Trend) -> bool {
        match trend {
            Trend::None => self.rng.gen_bool(0.5),
            Trend::Up => self.rng.gen_bool(self.prob_follow_trend),
            Trend::Down => !self.rng.gen_bool(self.prob_follow_trend),
        }
    }

    /// The ground floor or, when the building has any, an intermediate floor.
    fn outer_floor(&mut self) -> u8 {
        let Floors { min, max } = self.floors;
        if max - min < 2 || self.rng.gen_bool(self.prob_use_min_floor) {
            min
        } else {
            self.rng.gen_range(min + 1..max)
        }
    }

    fn request(&mut self, start_tick: u32, ticks: u32, trend: Trend) -> PassengerRequest {
        let max = self.floors.max;
        let (origin, destination) = if self.goes_up(trend) {
            let origin = self.outer_floor();
            (origin, self.rng.gen_range(origin + 1..=max))
        } else {
            let destination = self.outer_floor();
            (self.rng.gen_range(destination + 1..=max), destination)
        };
        let tick = start_tick + self.rng.gen_range(0..ticks);
        PassengerRequest::new(tick, origin, destination)
    }
}

impl ArrivalSource for TrendGenerator {
    fn day(&mut self, start_tick: u32, duration: u32) -> Vec<PassengerRequest> {
        let ticks_per_hour = duration / 24;
        let mut requests = Vec::new();
        for b in DAY_PLAN.iter() {
            let count = b.count + self.rng.gen_range(0..b.extra);
            let band_start = start_tick + b.start_hour * ticks_per_hour;
            for _ in 0..count {
                let r = self.request(band_start, b.hours * ticks_per_hour, b.trend);
                requests.push(r);
            }
        }
        log::debug!("Generated day starting at {} with {} requests.",
                    start_tick, requests.len());
        requests
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn seeded(seed: u64) -> TrendGenerator {
        let config = ScenarioConfig { seed: Some(seed), ..Default::default() };
        TrendGenerator::new(Floors::new(0, 4), &config)
    }

    #[test_case(0, 1, 1; "One floor up")]
    #[test_case(1, 3, 2; "Two floors up")]
    #[test_case(4, 0, 4; "Four floors down")]
    fn distance_is_floor_difference(origin: u8, destination: u8, distance: i64) {
        assert_eq!(PassengerRequest::new(0, origin, destination).distance(), distance);
    }

    #[test]
    fn delay_subtracts_travel_time() {
        let r = PassengerRequest::new(3, 1, 0);
        assert_eq!(r.delay(3), -1);
        assert_eq!(r.delay(10), 6);
    }

    #[test]
    #[should_panic(expected = "origin and destination")]
    fn same_floor_request_panics() {
        PassengerRequest::new(0, 2, 2);
    }

    #[test]
    fn generated_day_stays_in_building_and_day() {
        // Arrange
        let mut generator = seeded(7);
        // Act
        let day = generator.day(0, 1440);
        // Assert
        let min_count: u32 = DAY_PLAN.iter().map(|b| b.count).sum();
        let max_count: u32 = DAY_PLAN.iter().map(|b| b.count + b.extra).sum();
        assert!(day.len() as u32 >= min_count);
        assert!((day.len() as u32) < max_count);
        for r in day {
            assert!(r.tick < 1440);
            assert!(r.origin <= 4);
            assert!(r.destination <= 4);
            assert_ne!(r.origin, r.destination);
        }
    }

    #[test]
    fn morning_traffic_goes_up() {
        // Arrange
        let mut generator = seeded(11);
        // Act
        let day = generator.day(0, 1440);
        let morning: Vec<&PassengerRequest> = day.iter()
            .filter(|r| r.tick >= 6 * 60 && r.tick < 12 * 60)
            .collect();
        let up = morning.iter()
            .filter(|r| r.direction() == Some(Direction::Up))
            .count();
        // Assert
        assert!(up * 2 > morning.len());
    }

    #[test]
    fn identical_days_are_sorted_and_shifted() {
        // Arrange
        let mut generator = seeded(3);
        // Act
        let requests = generator.identical_days(3, 1440);
        // Assert
        assert_eq!(requests.len() % 3, 0);
        let per_day = requests.len() / 3;
        assert!(requests.windows(2).all(|w| w[0].tick <= w[1].tick));
        for i in 0..per_day {
            let (a, b) = (requests[i], requests[i + 2 * per_day]);
            assert_eq!(b.tick, a.tick + 2 * 1440);
            assert_eq!((a.origin, a.destination), (b.origin, b.destination));
        }
    }

    #[test]
    fn fixed_arrivals_replay_each_day() {
        let mut source = FixedArrivals::new(vec![
            PassengerRequest::new(5, 0, 2),
            PassengerRequest::new(1, 2, 0),
        ]);
        let requests = source.identical_days(2, 48);
        let ticks: Vec<u32> = requests.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![1, 5, 49, 53]);
    }

    #[test]
    fn same_seed_same_day() {
        assert_eq!(seeded(42).day(0, 1440), seeded(42).day(0, 1440));
    }
}
