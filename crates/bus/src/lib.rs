//! Movement event bus: turns each mob's private position history into
//! chunk-routed public notifications.
//!
//! # Invariants
//! - Within one mob, events are published in the order its snapshots were
//!   dispatched.
//! - A move that crosses a chunk border is published under the new chunk's
//!   key first, then under the old chunk's key, with the same payload.
//! - Publishing never blocks and never errors; unobserved keys drop events.

mod bus;
mod event;
mod tracker;

pub use bus::{MovementBus, Subscription};
pub use event::{Delivery, MovementEvent, SubscriptionId};
pub use tracker::MovementFold;
