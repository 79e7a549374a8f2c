//! Free-time and conflict computations
//!
//! Pure functions over intervals; nothing here talks to a provider.

pub mod conflict;
pub mod free_slots;

pub use conflict::conflicts;
pub use free_slots::{free_slots, free_slots_within, FreeSlots, WorkingHours};
