//! Mob registry: authoritative mob state and per-mob state streams.
//!
//! # Invariants
//! - All mob state mutations flow through `Mob::dispatch`.
//! - Every dispatched snapshot is broadcast, in order, to current subscribers.

mod index;
pub mod mob;
pub mod registry;

pub use mob::{Mob, MobAction, MobState, reduce};
pub use registry::{MobRegistry, MobSpawn};
