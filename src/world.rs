use std::collections::VecDeque;

use crate::action::{Action, ActionHistory, Move};
use crate::arrivals::{ArrivalSource, PassengerRequest};
use crate::config::{BuildingConfig, ScenarioConfig};
use crate::state::{self, Destinations, Direction, Elevator, Floors, HallCalls, State};

/// Passengers riding one elevator.
#[derive(Debug, Clone, Default)]
struct Cabin {
    floor: u8,
    passengers: Vec<PassengerRequest>,
}

impl Cabin {
    fn destinations(&self) -> Destinations {
        Destinations::of(self.floor, self.passengers.iter().map(|p| p.destination))
    }
}


/// Simulated building with two elevators.
///
/// The world keeps the passengers, which the compact [`State`] leaves out,
/// so a step depends on the world's queues and clock as well as on the
/// state and action given to it.
pub struct World<A> {
    floors: Floors,
    capacity: usize,
    day_duration: u32,
    days_per_episode: u32,
    source: A,
    /// Requests not injected yet, in tick order
    arrivals: VecDeque<PassengerRequest>,
    /// Passengers waiting on each floor, lowest floor first
    waiting: Vec<VecDeque<PassengerRequest>>,
    cabins: [Cabin; 2],
    /// Current tick, -1 before the first step of an episode
    clock: i64,
    history: ActionHistory,
    injected: usize,
    discharged: usize,
    episode: u32,
}

impl<A: ArrivalSource> World<A> {
    /// Building with no arrivals scheduled. Call [`World::reset_episode`]
    /// to start an episode.
    pub fn new(building: &BuildingConfig, scenario: &ScenarioConfig, source: A) -> World<A> {
        let floors = building.floors();
        World {
            floors,
            capacity: building.capacity,
            day_duration: building.day_duration,
            days_per_episode: scenario.days_per_episode,
            source,
            arrivals: VecDeque::new(),
            waiting: vec![VecDeque::new(); floors.count()],
            cabins: [Cabin { floor: floors.min, ..Default::default() },
                     Cabin { floor: floors.min, ..Default::default() }],
            clock: -1,
            history: ActionHistory::default(),
            injected: 0,
            discharged: 0,
            episode: 0,
        }
    }

    /// Empty the building, rewind the clock and schedule a fresh episode.
    ///
    /// The returned state is the start state of the new episode.
    pub fn reset_episode(&mut self) -> State {
        for queue in self.waiting.iter_mut() {
            queue.clear();
        }
        for cabin in self.cabins.iter_mut() {
            cabin.passengers.clear();
            cabin.floor = self.floors.min;
        }
        self.clock = -1;
        self.history.clear();
        self.injected = 0;
        self.discharged = 0;
        self.arrivals = self.source
            .identical_days(self.days_per_episode, self.day_duration)
            .into_iter()
            .collect();
        for r in self.arrivals.iter() {
            if !self.floors.contains(r.origin) || !self.floors.contains(r.destination) {
                panic!("Passenger request {} outside of the building.", r)
            }
        }
        self.episode += 1;
        log::info!("World reset. Episode {} with {} requests.",
                   self.episode, self.arrivals.len());
        self.start_state()
    }

    pub fn start_state(&self) -> State {
        State::start(self.floors)
    }
}

impl<A> World<A> {
    /// Actions allowed in `state` after `previous` and, before it, `prior`.
    ///
    /// An elevator that just stopped after moving must stay one more tick,
    /// an elevator on the top floor cannot go up and one on the bottom floor
    /// cannot go down. Both elevators stopping is always allowed.
    pub fn legal_actions(
        &self, state: &State, previous: Option<Action>, prior: Option<Action>
    ) -> Vec<Action> {
        let moves: Vec<Vec<Move>> = Elevator::ALL.iter()
            .map(|e| self.legal_moves(state.elevator_floor(*e), *e, previous, prior))
            .collect();
        let mut actions = Vec::with_capacity(Action::COUNT);
        // E1 moving first, E2 stopping first within each group.
        for e1 in [Move::Up, Move::Down, Move::Stop] {
            if !moves[0].contains(&e1) {
                continue;
            }
            for e2 in [Move::Stop, Move::Up, Move::Down] {
                if moves[1].contains(&e2) {
                    actions.push(Action::new(e1, e2));
                }
            }
        }
        if actions.is_empty() {
            panic!("No legal action in state {}.", state)
        }
        actions
    }

    fn legal_moves(
        &self, floor: u8, elevator: Elevator, previous: Option<Action>, prior: Option<Action>
    ) -> Vec<Move> {
        let just_stopped = previous.map(|a| a.movement(elevator)) == Some(Move::Stop)
            && prior.map_or(false, |a| a.movement(elevator).is_moving());
        let mut moves = vec![Move::Stop];
        if !just_stopped {
            if floor < self.floors.max {
                moves.push(Move::Up);
            }
            if floor > self.floors.min {
                moves.push(Move::Down);
            }
        }
        moves
    }

    /// Advance the building by one tick.
    ///
    /// New arrivals join their floor's queue, elevators move, and each
    /// elevator that stops either lets passengers off (first tick after
    /// moving) or takes waiting passengers on (later ticks). Panics when
    /// `action` is not legal.
    pub fn step(&mut self, state: &State, action: Action) -> State {
        let legal = self.legal_actions(state, self.history.previous, self.history.prior);
        if !legal.contains(&action) {
            panic!("Illegal action {} in state {}.", action, state)
        }

        self.clock += 1;
        let mut waiting = state.hall_calls().to_vec();
        self.inject_arrivals(&mut waiting);
        let bucket = state::time_bucket(self.clock, self.day_duration);

        let mut elevator_floors = [0; 2];
        let mut destinations = [Destinations::default(); 2];
        for elevator in Elevator::ALL {
            let i = elevator.index();
            let movement = action.movement(elevator);
            let floor = movement.apply(state.elevator_floor(elevator));
            self.cabins[i].floor = floor;
            let previous = self.history.previous.map(|a| a.movement(elevator));
            match (movement, previous) {
                (Move::Stop, Some(Move::Up)) | (Move::Stop, Some(Move::Down)) => {
                    self.discharge(elevator);
                }
                (Move::Stop, _) => {
                    let serving = self.history.prior
                        .map(|a| a.movement(elevator))
                        .and_then(|m| match m {
                            Move::Up => Some(Direction::Up),
                            Move::Down => Some(Direction::Down),
                            Move::Stop => None,
                        });
                    self.board(elevator, serving, &mut waiting);
                }
                _ => {}
            }
            elevator_floors[i] = floor;
            destinations[i] = self.cabins[i].destinations();
        }

        self.history.push(action);
        State::new(self.floors, elevator_floors, destinations, waiting, bucket)
    }

    fn inject_arrivals(&mut self, waiting: &mut [HallCalls]) {
        while let Some(r) = self.arrivals.front().copied() {
            if i64::from(r.tick) > self.clock {
                break;
            }
            self.arrivals.pop_front();
            let slot = self.floors.index(r.origin);
            self.waiting[slot].push_back(r);
            if let Some(direction) = r.direction() {
                waiting[slot].set(direction, true);
            }
            self.injected += 1;
        }
    }

    /// Let off everyone headed to the elevator's floor.
    fn discharge(&mut self, elevator: Elevator) {
        let cabin = &mut self.cabins[elevator.index()];
        let floor = cabin.floor;
        let before = cabin.passengers.len();
        cabin.passengers.retain(|p| p.destination != floor);
        let left = before - cabin.passengers.len();
        if left > 0 {
            log::trace!("{} passengers left {:?} on floor {}.", left, elevator, floor);
        }
        self.discharged += left;
    }

    /// Take on waiting passengers headed in the `serving` direction, or any
    /// passenger when there is none, until the elevator is full. Passengers
    /// that do not fit keep waiting.
    fn board(&mut self, elevator: Elevator, serving: Option<Direction>, waiting: &mut [HallCalls]) {
        let capacity = self.capacity;
        let cabin = &mut self.cabins[elevator.index()];
        let slot = self.floors.index(cabin.floor);
        let queue = &mut self.waiting[slot];
        let mut remaining = VecDeque::with_capacity(queue.len());
        while let Some(r) = queue.pop_front() {
            let compatible = serving.map_or(true, |d| r.direction() == Some(d));
            if compatible && cabin.passengers.len() < capacity {
                log::trace!("Passenger {} boarded {:?}.", r, elevator);
                cabin.passengers.push(r);
            } else {
                remaining.push_back(r);
            }
        }
        *queue = remaining;
        waiting[slot] = HallCalls::of(queue.iter().map(|r| r.direction()));
    }

    fn passengers(&self) -> impl Iterator<Item = &PassengerRequest> {
        self.waiting.iter().flatten()
            .chain(self.cabins.iter().flat_map(|c| c.passengers.iter()))
    }

    /// Delay of every passenger still in the building, summed.
    pub fn total_delay(&self) -> i64 {
        self.passengers().map(|p| p.delay(self.clock)).sum()
    }

    /// Reward for the current tick: the total delay, negated.
    pub fn reward(&self) -> f64 {
        -(self.total_delay() as f64)
    }

    /// Average delay per passenger in the building, `None` when it is empty.
    pub fn mean_delay(&self) -> Option<f64> {
        let count = self.waiting_count() + self.onboard_count();
        if count == 0 {
            None
        } else {
            Some(self.total_delay() as f64 / count as f64)
        }
    }

    pub fn is_episode_over(&self) -> bool {
        self.arrivals.is_empty()
            && self.waiting.iter().all(|q| q.is_empty())
            && self.cabins.iter().all(|c| c.passengers.is_empty())
    }

    pub fn clock(&self) -> i64 {
        self.clock
    }

    pub fn history(&self) -> ActionHistory {
        self.history
    }

    pub fn floors(&self) -> Floors {
        self.floors
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn day_duration(&self) -> u32 {
        self.day_duration
    }

    pub fn days_per_episode(&self) -> u32 {
        self.days_per_episode
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.iter().map(|q| q.len()).sum()
    }

    pub fn onboard(&self, elevator: Elevator) -> usize {
        self.cabins[elevator.index()].passengers.len()
    }

    pub fn onboard_count(&self) -> usize {
        self.cabins.iter().map(|c| c.passengers.len()).sum()
    }

    pub fn injected_count(&self) -> usize {
        self.injected
    }

    pub fn discharged_count(&self) -> usize {
        self.discharged
    }

    /// Requests scheduled but not yet injected.
    pub fn pending_count(&self) -> usize {
        self.arrivals.len()
    }
}
