//! Per-client area of interest.
//!
//! A [`ClientView`] opens one [`ViewSession`] per loaded chunk, subscribes it
//! to the movement bus under that chunk's key, and turns the deliveries into
//! spawn, despawn and move updates on an [`UpdateSink`].
//!
//! # Guarantees
//!
//! - No id is spawned twice without a despawn in between, and no id is
//!   despawned or moved before it was spawned.
//! - Visibility is evaluated against the live [`Viewpoint`] on every delivery.
//! - One session per chunk; a repeated load is ignored.
//! - A session is cancelled once, flushing its tracked ids in a single batch.

mod client;
mod session;
mod sink;
mod transition;
mod viewpoint;

pub use client::{ClientView, WorldSignal};
pub use session::{SessionState, ViewSession};
pub use sink::{UpdateSink, ViewUpdate};
pub use transition::{Transition, decide};
pub use viewpoint::{SharedViewpoint, ViewState, Viewpoint};
