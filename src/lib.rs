//! Tabular reinforcement learning for a two-elevator building.
//!
//! A [`world::World`] simulates passengers and elevators tick by tick, an
//! [`engine::Engine`] learns which elevator moves keep passenger delay low,
//! and a [`trainer::Trainer`] runs the episodes and writes the results.

pub mod action;
pub mod arrivals;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod state;
pub mod stats;
pub mod trainer;
pub mod world;

pub use error::{Error, Result};
