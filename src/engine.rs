use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::{Action, ActionHistory};
use crate::arrivals::ArrivalSource;
use crate::config::LearningConfig;
use crate::policy::ValueTable;
use crate::state::State;
use crate::stats::DelayTracker;
use crate::world::World;

/// What happened during one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub ticks: u64,
    pub total_reward: f64,
    pub discharged: usize,
    /// Exploration probability at the end of the episode
    pub epsilon: f64,
    /// States in the value table at the end of the episode
    pub states: usize,
}

/// Learns action values with on-policy temporal differences (SARSA).
///
/// Actions are picked epsilon-greedily. Epsilon shrinks geometrically every
/// tick until it reaches half of its initial value.
pub struct Engine {
    params: LearningConfig,
    epsilon: f64,
    table: ValueTable,
    current: State,
    history: ActionHistory,
    rng: StdRng,
    ticks: u64,
}

impl Engine {
    pub fn new(params: &LearningConfig, start: State) -> Engine {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let space_size = State::space_size(start.floors());
        log::info!("Initializing engine. State space size: {}.", space_size);
        let table = ValueTable::with_space_size(space_size);
        Engine {
            params: params.clone(),
            epsilon: params.epsilon,
            table,
            current: start,
            history: ActionHistory::default(),
            rng,
            ticks: 0,
        }
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Ticks performed over all episodes.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Pick an action for `state` among the legal ones.
    ///
    /// Explores uniformly when the state was never visited or with
    /// probability epsilon. Otherwise takes the action with the highest
    /// value, the first one listed on ties.
    pub fn select_action<A>(
        &mut self, world: &World<A>, state: &State, history: ActionHistory
    ) -> Action {
        let legal = world.legal_actions(state, history.previous, history.prior);
        self.choose(state, &legal)
    }

    fn choose(&mut self, state: &State, legal: &[Action]) -> Action {
        if legal.is_empty() {
            panic!("No legal action in state {}.", state)
        }
        match self.table.values(state) {
            Some(values) if self.rng.gen::<f64>() >= self.epsilon => {
                let mut best = legal[0];
                let mut best_value = f64::NEG_INFINITY;
                for &action in legal {
                    if values[action.index()] > best_value {
                        best_value = values[action.index()];
                        best = action;
                    }
                }
                best
            }
            _ => legal[self.rng.gen_range(0..legal.len())],
        }
    }

    /// `Q(s,a) += alpha * (r + gamma * Q(s',a') - Q(s,a))` for the current
    /// state `s`.
    fn update(&mut self, action: Action, reward: f64, next: &State, next_action: Action) {
        let q = self.table.get(&self.current, action);
        let target = reward + self.params.gamma * self.table.get(next, next_action);
        let value = q + self.params.alpha * (target - q);
        self.table.set(&self.current, action, value);
    }

    /// Never drops below half of the initial epsilon.
    fn anneal(&mut self) {
        let floor = self.params.epsilon / 2.0;
        self.epsilon = (self.epsilon * (1.0 - self.params.annealing)).max(floor);
    }

    /// Reset the world and learn from one full episode.
    ///
    /// The value table carries over from earlier episodes. Diagnostics are
    /// fed to `tracker` and do not affect learning.
    pub fn run_episode<A: ArrivalSource>(
        &mut self, world: &mut World<A>, tracker: &mut DelayTracker
    ) -> EpisodeSummary {
        self.current = world.reset_episode();
        self.history.clear();
        let mut summary = EpisodeSummary {
            ticks: 0, total_reward: 0.0, discharged: 0, epsilon: self.epsilon, states: 0,
        };

        let start = self.current.clone();
        let mut action = self.select_action(world, &start, self.history);
        while !world.is_episode_over() {
            self.anneal();
            let next = world.step(&self.current, action);
            let reward = world.reward();
            tracker.observe(world.clock(), world.mean_delay());

            let next_history = self.history.pushed(action);
            debug_assert_eq!(next_history, world.history());
            let next_action = self.select_action(world, &next, next_history);
            self.update(action, reward, &next, next_action);

            self.history = next_history;
            self.current = next;
            action = next_action;
            self.ticks += 1;
            summary.ticks += 1;
            summary.total_reward += reward;
        }

        summary.discharged = world.discharged_count();
        summary.epsilon = self.epsilon;
        summary.states = self.table.len();
        log::debug!("Episode {} finished after {} ticks, reward {:.2}, {} states.",
                    world.episode(), summary.ticks, summary.total_reward, summary.states);
        summary
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Move;
    use crate::arrivals::{FixedArrivals, PassengerRequest};
    use crate::config::{BuildingConfig, ScenarioConfig, TrainingConfig};
    use crate::state::Floors;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn params(epsilon: f64) -> LearningConfig {
        LearningConfig { epsilon, alpha: 0.5, gamma: 0.4, annealing: 0.01, seed: Some(1) }
    }

    fn world(requests: Vec<PassengerRequest>) -> World<FixedArrivals> {
        let building = BuildingConfig { min_floor: 0, max_floor: 3, capacity: 4, day_duration: 48 };
        let scenario = ScenarioConfig { days_per_episode: 2, ..Default::default() };
        World::new(&building, &scenario, FixedArrivals::new(requests))
    }

    fn tracker() -> DelayTracker {
        DelayTracker::new(&TrainingConfig::default(), 48)
    }

    fn requests() -> Vec<PassengerRequest> {
        vec![
            PassengerRequest::new(0, 0, 3),
            PassengerRequest::new(4, 2, 0),
            PassengerRequest::new(10, 3, 1),
            PassengerRequest::new(20, 0, 2),
        ]
    }

    #[test]
    fn unvisited_state_explores_legal_actions() {
        // Arrange
        let w = world(vec![]);
        let mut engine = Engine::new(&params(0.0), w.start_state());
        let start = w.start_state();
        // Act
        for _ in 0..50 {
            let a = engine.select_action(&w, &start, ActionHistory::default());
            // Assert
            assert!(w.legal_actions(&start, None, None).contains(&a));
        }
    }

    #[test]
    fn greedy_picks_highest_legal_value() {
        // Arrange
        let w = world(vec![]);
        let start = w.start_state();
        let mut engine = Engine::new(&params(0.0), start.clone());
        let best = Action::new(Move::Stop, Move::Up);
        // Illegal on the ground floor, must never be picked.
        engine.table.set(&start, Action::new(Move::Down, Move::Down), 100.0);
        engine.table.set(&start, best, 5.0);
        engine.table.set(&start, Action::new(Move::Up, Move::Up), 1.0);
        // Act
        let a = engine.select_action(&w, &start, ActionHistory::default());
        // Assert
        assert_eq!(a, best);
    }

    #[test]
    fn greedy_ties_go_to_first_listed() {
        let w = world(vec![]);
        let start = w.start_state();
        let mut engine = Engine::new(&params(0.0), start.clone());
        engine.table.set(&start, Action::new(Move::Stop, Move::Stop), 0.0);
        let a = engine.select_action(&w, &start, ActionHistory::default());
        assert_eq!(a, w.legal_actions(&start, None, None)[0]);
    }

    #[test]
    fn update_uses_chosen_next_action() {
        // Arrange
        let w = world(vec![]);
        let start = w.start_state();
        let next = State::new(Floors::new(0, 3), [1, 0], Default::default(),
                              vec![Default::default(); 4], 0);
        let mut engine = Engine::new(&params(0.0), start.clone());
        let a = Action::new(Move::Up, Move::Stop);
        let next_a = Action::new(Move::Stop, Move::Stop);
        engine.table.set(&start, a, 2.0);
        engine.table.set(&next, next_a, -10.0);
        engine.table.set(&next, Action::new(Move::Up, Move::Stop), 50.0);
        // Act
        engine.update(a, -1.0, &next, next_a);
        // Assert: 2 + 0.5 * (-1 + 0.4 * -10 - 2)
        assert_abs_diff_eq!(engine.table.get(&start, a), -1.5, epsilon = 1e-12);
    }

    #[test]
    fn epsilon_decays_to_half() {
        let w = world(vec![]);
        let mut engine = Engine::new(&params(0.8), w.start_state());
        engine.anneal();
        assert_abs_diff_eq!(engine.epsilon(), 0.792, epsilon = 1e-12);
        for _ in 0..10_000 {
            engine.anneal();
        }
        assert_abs_diff_eq!(engine.epsilon(), 0.4, epsilon = 1e-12);
    }

    #[test_case(0.3; "Large annealing factor")]
    #[test_case(0.99; "Near total annealing")]
    fn epsilon_never_undershoots_floor(annealing: f64) {
        // Arrange
        let w = world(vec![]);
        let mut engine = Engine::new(
            &LearningConfig { annealing, ..params(0.8) }, w.start_state());
        // Act
        for _ in 0..100 {
            engine.anneal();
            // Assert
            assert!(engine.epsilon() >= 0.4);
        }
        assert_abs_diff_eq!(engine.epsilon(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn episode_runs_to_empty_building() {
        // Arrange
        let mut w = world(requests());
        let mut engine = Engine::new(&params(0.9), w.start_state());
        let mut t = tracker();
        // Act
        let summary = engine.run_episode(&mut w, &mut t);
        // Assert
        assert!(w.is_episode_over());
        assert_eq!(summary.discharged, 8);
        assert!(summary.ticks > 0);
        assert_eq!(summary.ticks, engine.ticks());
        assert!(summary.states > 0);
        assert_eq!(summary.states, engine.table().len());
        assert!(summary.epsilon < 0.9);
    }

    #[test]
    fn learning_persists_across_episodes() {
        // Arrange
        let mut w = world(requests());
        let mut engine = Engine::new(&params(0.5), w.start_state());
        let mut t = tracker();
        // Act
        let first = engine.run_episode(&mut w, &mut t);
        let second = engine.run_episode(&mut w, &mut t);
        // Assert
        assert!(second.states >= first.states);
        assert_eq!(w.episode(), 2);
        assert_eq!(engine.ticks(), first.ticks + second.ticks);
    }
}
