use std::fmt;

use crate::state::Elevator;

/// Movement of a single elevator during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Down,
    Stop,
    Up,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Down, Move::Stop, Move::Up];

    fn index(self) -> u8 {
        match self {
            Move::Down => 0,
            Move::Stop => 1,
            Move::Up => 2,
        }
    }

    pub fn is_moving(self) -> bool {
        self != Move::Stop
    }

    /// Floor reached after applying the move to `floor`.
    ///
    /// Panics when the move leaves the range of `u8`.
    pub fn apply(self, floor: u8) -> u8 {
        let next = match self {
            Move::Down => floor.checked_sub(1),
            Move::Stop => Some(floor),
            Move::Up => floor.checked_add(1),
        };
        match next {
            Some(next) => next,
            None => panic!("Move {} from floor {} leaves the building.", self, floor),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Move::Down => "DOWN",
            Move::Stop => "STOP",
            Move::Up => "UP",
        };
        write!(f, "{}", name)
    }
}


/// Combined move of both elevators.
///
/// Encoded as `3 * e1 + e2` so that the value indexes a row of the value
/// table directly and decomposes into its two moves without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action(u8);

impl Action {
    /// Number of distinct actions.
    pub const COUNT: usize = 9;

    pub fn new(e1: Move, e2: Move) -> Action {
        Action(e1.index() * 3 + e2.index())
    }

    /// Panics when `index` is not below [`Action::COUNT`].
    pub fn from_index(index: usize) -> Action {
        if index >= Action::COUNT {
            panic!("Action index {} out of range 0..{}.", index, Action::COUNT)
        }
        Action(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn e1(self) -> Move {
        Move::ALL[(self.0 / 3) as usize]
    }

    pub fn e2(self) -> Move {
        Move::ALL[(self.0 % 3) as usize]
    }

    pub fn movement(self, elevator: Elevator) -> Move {
        match elevator {
            Elevator::E1 => self.e1(),
            Elevator::E2 => self.e2(),
        }
    }

    pub fn all() -> impl Iterator<Item = Action> {
        (0..Action::COUNT).map(Action::from_index)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{E1={}, E2={}}}", self.e1(), self.e2())
    }
}


/// The last two actions taken, most recent first.
///
/// `None` means no action has been taken yet in the episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionHistory {
    pub previous: Option<Action>,
    pub prior: Option<Action>,
}

impl ActionHistory {
    /// History after `action` has been taken.
    pub fn pushed(self, action: Action) -> ActionHistory {
        ActionHistory { previous: Some(action), prior: self.previous }
    }

    pub fn push(&mut self, action: Action) {
        *self = self.pushed(action);
    }

    pub fn clear(&mut self) {
        *self = ActionHistory::default();
    }
}
