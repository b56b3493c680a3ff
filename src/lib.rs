//! Space Rocks - an Asteroids-style arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, lifecycle, game state)
//! - `tuning`: Data-driven game balance
//! - `error`: Simulation and configuration errors
//!
//! Rendering, audio and input capture belong to the host. The host feeds an
//! [`sim::InputState`] into [`sim::tick`] and draws the returned snapshot.

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, SimError};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz reference rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta the host loop should feed the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along a heading (0 = +x, screen y grows downward)
#[inline]
pub fn heading_vector(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Wrap a single coordinate into [0, extent)
#[inline]
pub fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Wrap a position onto the toroidal arena, each axis independently
#[inline]
pub fn wrap_position(pos: Vec2, arena: Vec2) -> Vec2 {
    Vec2::new(wrap_coordinate(pos.x, arena.x), wrap_coordinate(pos.y, arena.y))
}
