// src/host/mod.rs

//! In-process host used by the `opactivity` binary and by tests.
//!
//! It plays the role a game server would: it owns the players' inventories,
//! persists progress changes and fires the periodic sweep.

pub mod driver;
pub mod player;
pub mod store;

pub use driver::{Driver, DriverEvent, DriverStep};
pub use player::SimulatedPlayer;
pub use store::MemoryProgressStore;
