use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ndarray::Array1;

use crate::action::Action;
use crate::error::{Error, Result};
use crate::state::State;

/// Largest number of entries reserved up front, whatever the state space.
const MAX_PRESIZE: usize = 1 << 16;

/// Action values per state, filled in lazily.
///
/// A state that was never written has value 0.0 for every action.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    action_value: HashMap<State, Array1<f64>>,
}

impl ValueTable {
    pub fn new() -> ValueTable {
        ValueTable::default()
    }

    /// Table sized for a state space of `space_size` states.
    pub fn with_space_size(space_size: u128) -> ValueTable {
        let capacity = usize::try_from(space_size).unwrap_or(usize::MAX).min(MAX_PRESIZE);
        ValueTable { action_value: HashMap::with_capacity(capacity) }
    }

    pub fn get(&self, state: &State, action: Action) -> f64 {
        self.action_value.get(state)
            .map_or(0.0, |values| values[action.index()])
    }

    pub fn set(&mut self, state: &State, action: Action, value: f64) {
        match self.action_value.get_mut(state) {
            Some(values) => values[action.index()] = value,
            None => {
                let mut values = Array1::<f64>::zeros(Action::COUNT);
                values[action.index()] = value;
                self.action_value.insert(state.clone(), values);
            }
        }
    }

    /// All action values of `state`, `None` if it was never written.
    pub fn values(&self, state: &State) -> Option<&Array1<f64>> {
        self.action_value.get(state)
    }

    pub fn contains(&self, state: &State) -> bool {
        self.action_value.contains_key(state)
    }

    /// Number of states visited so far.
    pub fn len(&self) -> usize {
        self.action_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.action_value.is_empty()
    }

    /// Write the entry count, then one `state - values` line per entry.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", self.action_value.len())?;
        for (state, values) in self.action_value.iter() {
            let values: Vec<String> = values.iter().map(|v| format!("{:.2}", v)).collect();
            writeln!(out, "{} - {}", state, values.join(" "))?;
        }
        out.flush()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("Writing value table with {} states to {}.", self.len(), path.display());
        let table_write = |source| Error::TableWrite { path: path.to_path_buf(), source };
        let file = File::create(path).map_err(table_write)?;
        self.write_to(BufWriter::new(file)).map_err(table_write)?;
        log::info!("Write completed.");
        Ok(())
    }
}
