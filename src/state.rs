use std::cmp::Ordering;
use std::fmt;

/// Number of time-of-day bands a day is split into.
pub const TIME_BUCKETS: u8 = 6;


/// Inclusive range of floors served by the elevators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Floors {
    pub min: u8,
    pub max: u8,
}

impl Floors {
    pub fn new(min: u8, max: u8) -> Floors {
        if min >= max {
            panic!("Building needs at least two floors (min {}, max {}).", min, max)
        }
        Floors { min, max }
    }

    pub fn count(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn contains(&self, floor: u8) -> bool {
        floor >= self.min && floor <= self.max
    }

    /// Zero based position of `floor` inside the building.
    pub fn index(&self, floor: u8) -> usize {
        if !self.contains(floor) {
            panic!("Floor {} outside of [{}, {}].", floor, self.min, self.max)
        }
        (floor - self.min) as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}


/// Direction of travel requested by a waiting passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction from `origin` to `destination`, `None` when they are equal.
    pub fn between(origin: u8, destination: u8) -> Option<Direction> {
        match destination.cmp(&origin) {
            Ordering::Greater => Some(Direction::Up),
            Ordering::Less => Some(Direction::Down),
            Ordering::Equal => None,
        }
    }
}


/// One of the two elevator cars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Elevator {
    E1,
    E2,
}

impl Elevator {
    pub const ALL: [Elevator; 2] = [Elevator::E1, Elevator::E2];

    pub fn index(self) -> usize {
        match self {
            Elevator::E1 => 0,
            Elevator::E2 => 1,
        }
    }
}


/// Where the passengers of one elevator are headed, relative to the floor
/// the elevator is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Destinations {
    pub below: bool,
    pub current: bool,
    pub above: bool,
}

impl Destinations {
    pub fn of<I>(floor: u8, targets: I) -> Destinations
    where
        I: IntoIterator<Item = u8>,
    {
        let mut dest = Destinations::default();
        for target in targets {
            match target.cmp(&floor) {
                Ordering::Less => dest.below = true,
                Ordering::Equal => dest.current = true,
                Ordering::Greater => dest.above = true,
            }
        }
        dest
    }

    fn bits(&self) -> String {
        [self.below, self.current, self.above].iter()
            .map(|b| if *b { '1' } else { '0' })
            .collect()
    }
}


/// Call buttons pressed on one floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HallCalls {
    pub up: bool,
    pub down: bool,
}

impl HallCalls {
    /// Calls implied by a set of passenger directions.
    pub fn of<I>(directions: I) -> HallCalls
    where
        I: IntoIterator<Item = Option<Direction>>,
    {
        let mut calls = HallCalls::default();
        for direction in directions.into_iter().flatten() {
            calls.set(direction, true);
        }
        calls
    }

    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
        }
    }
}


/// Map a tick onto its time-of-day band.
///
/// A day lasts `day_duration` ticks and is read as 24 equal hours. Bands
/// end at hours 6, 10, 12, 16 and 19; everything later falls in band 5.
/// Negative ticks (before the first step of an episode) wrap onto the
/// previous day.
pub fn time_bucket(tick: i64, day_duration: u32) -> u8 {
    if day_duration < 24 {
        panic!("Day duration ({}) must cover 24 hours.", day_duration)
    }
    let day = i64::from(day_duration);
    let hour = tick.rem_euclid(day) * 24 / day;
    match hour {
        0..=6 => 0,
        7..=10 => 1,
        11..=12 => 2,
        13..=16 => 3,
        17..=19 => 4,
        _ => 5,
    }
}


/// Compact, hashable description of the building used as value-table key.
///
/// Two buildings that look the same to the controller produce equal states.
/// The passengers themselves are not part of the state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    floors: Floors,
    elevator_floors: [u8; 2],
    destinations: [Destinations; 2],
    waiting: Vec<HallCalls>,
    time_bucket: u8,
}

impl State {
    /// Panics on an elevator floor outside `floors`, a waiting vector that
    /// does not have one entry per floor or a time bucket out of range.
    pub fn new(
        floors: Floors,
        elevator_floors: [u8; 2],
        destinations: [Destinations; 2],
        waiting: Vec<HallCalls>,
        time_bucket: u8,
    ) -> State {
        for floor in elevator_floors {
            if !floors.contains(floor) {
                panic!("Elevator floor {} outside of [{}, {}].",
                       floor, floors.min, floors.max)
            }
        }
        if waiting.len() != floors.count() {
            panic!("Expected hall calls for {} floors, got {}.",
                   floors.count(), waiting.len())
        }
        if time_bucket >= TIME_BUCKETS {
            panic!("Time bucket {} outside of 0..{}.", time_bucket, TIME_BUCKETS)
        }
        State { floors, elevator_floors, destinations, waiting, time_bucket }
    }

    /// Empty building with both elevators on the lowest floor.
    pub fn start(floors: Floors) -> State {
        State::new(
            floors,
            [floors.min; 2],
            [Destinations::default(); 2],
            vec![HallCalls::default(); floors.count()],
            0,
        )
    }

    /// Upper bound on the number of distinct states for a building.
    ///
    /// Only used to size the value table, the states are never enumerated.
    pub fn space_size(floors: Floors) -> u128 {
        let n = floors.count() as u128;
        let calls = 1u128.checked_shl(2 * floors.count() as u32)
            .unwrap_or(u128::MAX);
        (n * n)
            .saturating_mul(calls)
            .saturating_mul(8 * 8)
            .saturating_mul(u128::from(TIME_BUCKETS))
    }

    pub fn floors(&self) -> Floors {
        self.floors
    }

    pub fn elevator_floor(&self, elevator: Elevator) -> u8 {
        self.elevator_floors[elevator.index()]
    }

    pub fn elevator1_floor(&self) -> u8 {
        self.elevator_floor(Elevator::E1)
    }

    pub fn elevator2_floor(&self) -> u8 {
        self.elevator_floor(Elevator::E2)
    }

    pub fn destinations(&self, elevator: Elevator) -> Destinations {
        self.destinations[elevator.index()]
    }

    pub fn waiting(&self, floor: u8, direction: Direction) -> bool {
        self.waiting[self.floors.index(floor)].get(direction)
    }

    /// Hall calls for every floor, lowest floor first.
    pub fn hall_calls(&self) -> &[HallCalls] {
        &self.waiting
    }

    pub fn time_bucket(&self) -> u8 {
        self.time_bucket
    }
}

/// Serialized key: `bucket e1 e2 dest1 dest2 waiting`.
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let waiting: Vec<String> = self.waiting.iter()
            .map(|c| format!("{}{}", c.up as u8, c.down as u8))
            .collect();
        write!(f, "{} {} {} {} {} {}",
               self.time_bucket,
               self.elevator_floors[0], self.elevator_floors[1],
               self.destinations[0].bits(), self.destinations[1].bits(),
               waiting.join("."))
    }
}
