//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (insertion order, pruned in place)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod motion;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{HitPair, find_hits, overlaps};
pub use motion::integrate;
pub use state::{
    Body, Bullet, EntityKind, GameEvent, GamePhase, GameSession, Rock, RockTier, Ship,
};
pub use tick::{EntityView, InputState, TickResult, snapshot, tick};
