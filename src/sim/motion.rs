//! Motion integration on the toroidal arena
//!
//! Explicit Euler: `pos += vel * dt`, then each axis wraps independently.
//! Inputs must already be finite; ship speed is clamped in `steer_ship` so
//! nothing downstream can blow up.

use glam::Vec2;

use super::state::{Body, Bullet, Rock, Ship};
use super::tick::InputState;
use crate::tuning::Tuning;
use crate::{heading_vector, normalize_angle, wrap_position};

/// Advance one body by `dt` seconds and wrap it onto the arena
#[inline]
pub fn integrate(body: &mut Body, dt: f32, arena: Vec2) {
    body.pos = wrap_position(body.pos + body.vel * dt, arena);
}

/// Apply rotation, thrust, drag and the speed cap from player input
pub fn steer_ship(ship: &mut Ship, input: &InputState, dt: f32, tuning: &Tuning) {
    let mut turn = 0.0;
    if input.rotate_left {
        turn -= 1.0;
    }
    if input.rotate_right {
        turn += 1.0;
    }
    ship.body.heading = normalize_angle(ship.body.heading + turn * tuning.ship_rotation_rate * dt);

    ship.thrust_active = input.thrust;
    if input.thrust {
        ship.body.vel += heading_vector(ship.body.heading) * tuning.ship_thrust * dt;
    }

    let damping = (1.0 - tuning.ship_drag * dt).max(0.0);
    ship.body.vel = (ship.body.vel * damping).clamp_length_max(tuning.ship_max_speed);
}

/// Move the ship if it is in play
pub fn advance_ship(ship: &mut Ship, dt: f32, arena: Vec2) {
    if ship.body.alive {
        integrate(&mut ship.body, dt, arena);
    }
}

/// Move every rock and apply its cosmetic spin
pub fn advance_rocks(rocks: &mut [Rock], dt: f32, arena: Vec2) {
    for rock in rocks.iter_mut() {
        integrate(&mut rock.body, dt, arena);
        rock.body.heading = normalize_angle(rock.body.heading + rock.spin * dt);
    }
}

/// Move every bullet and burn one tick of its lifetime
pub fn advance_bullets(bullets: &mut [Bullet], dt: f32, arena: Vec2) {
    for bullet in bullets.iter_mut() {
        integrate(&mut bullet.body, dt, arena);
        bullet.time_to_live = bullet.time_to_live.saturating_sub(1);
        if bullet.time_to_live == 0 {
            bullet.body.alive = false;
        }
    }
}
