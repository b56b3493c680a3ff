//! Simulation tick
//!
//! Core game loop that advances the session by one step. Fixed pipeline order:
//! input → integration → collision detection → hit resolution → pruning →
//! win/loss evaluation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::find_hits;
use super::motion::{advance_bullets, advance_rocks, advance_ship, steer_ship};
use super::spawn;
use super::state::{Body, EntityKind, GameEvent, GamePhase, GameSession};
use crate::consts::MAX_FRAME_DT;
use crate::error::{Invariant, SimError};

/// Player input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    /// Fire button is down (shots fire on the press edge)
    pub fire: bool,
    /// Pause button was pressed this tick
    pub pause_toggled: bool,
}

/// Render-ready view of one live entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub heading: f32,
    pub radius: f32,
    /// Ship only: draw the thruster flame
    pub thrust: bool,
    /// Ship only: draw the respawn shield
    pub invulnerable: bool,
}

/// Everything the host needs after a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub time_ticks: u64,
    /// Live entities (ship first when in play)
    pub entities: Vec<EntityView>,
    /// Events raised since the previous tick result
    pub events: Vec<GameEvent>,
}

/// Advance the session by `dt` seconds
///
/// `dt` must be finite and non-negative; the host loop is expected to clamp
/// long stalls. Paused and finished sessions return a snapshot without
/// advancing.
pub fn tick(session: &mut GameSession, input: &InputState, dt: f32) -> Result<TickResult, SimError> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(SimError::InvalidDt { dt });
    }
    if dt > MAX_FRAME_DT {
        log::warn!("tick dt {:.3}s exceeds {:.3}s; host should clamp", dt, MAX_FRAME_DT);
    }

    // Handle pause toggle
    if input.pause_toggled {
        match session.phase {
            GamePhase::Playing | GamePhase::PlayerDestroyed => {
                session.phase = GamePhase::Paused;
                session.events.push(GameEvent::Paused);
                log::debug!("Paused at tick {}", session.time_ticks);
                return Ok(snapshot(session));
            }
            GamePhase::Paused => {
                session.phase = if session.ship.respawn_in.is_some() {
                    GamePhase::PlayerDestroyed
                } else {
                    GamePhase::Playing
                };
                session.events.push(GameEvent::Resumed);
                log::debug!("Resumed at tick {}", session.time_ticks);
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    match session.phase {
        GamePhase::Paused | GamePhase::GameOver => return Ok(snapshot(session)),
        GamePhase::Playing | GamePhase::PlayerDestroyed => {}
    }

    session.time_ticks += 1;
    let arena = session.tuning.arena();

    // Respawn countdown and invulnerability window
    spawn::update_ship_timers(session, dt);

    // Input
    if session.ship.body.alive {
        steer_ship(&mut session.ship, input, dt, &session.tuning);
    }
    spawn::try_fire(session, input);

    // Integration
    advance_ship(&mut session.ship, dt, arena);
    advance_rocks(&mut session.rocks, dt, arena);
    advance_bullets(&mut session.bullets, dt, arena);

    // Collision detection
    let bullet_hits = find_hits(&session.bullets, &session.rocks);
    let ship_hits = if session.ship.body.alive && !session.ship.is_invulnerable() {
        find_hits(std::slice::from_ref(&session.ship), &session.rocks)
    } else {
        Vec::new()
    };

    // Resolution, then compaction
    spawn::resolve_hits(session, &bullet_hits, &ship_hits);
    let broken = quarantine_broken(session);
    spawn::prune(session);

    // Win condition: field cleared
    spawn::advance_level_if_clear(session);

    // Events raised this tick stay queued for the next result
    if let Some(err) = broken {
        return Err(err);
    }

    Ok(snapshot(session))
}

/// Build the host-facing view and drain pending events
pub fn snapshot(session: &mut GameSession) -> TickResult {
    let mut entities =
        Vec::with_capacity(1 + session.rocks.len() + session.bullets.len());

    let ship = &session.ship;
    if ship.body.alive {
        entities.push(EntityView {
            id: ship.id,
            kind: EntityKind::Ship,
            pos: ship.body.pos,
            heading: ship.body.heading,
            radius: ship.body.radius,
            thrust: ship.thrust_active,
            invulnerable: ship.is_invulnerable(),
        });
    }
    entities.extend(session.rocks.iter().filter(|r| r.body.alive).map(|r| EntityView {
        id: r.id,
        kind: EntityKind::Rock(r.tier),
        pos: r.body.pos,
        heading: r.body.heading,
        radius: r.body.radius,
        thrust: false,
        invulnerable: false,
    }));
    entities.extend(session.bullets.iter().filter(|b| b.body.alive).map(|b| EntityView {
        id: b.id,
        kind: EntityKind::Bullet,
        pos: b.body.pos,
        heading: b.body.heading,
        radius: b.body.radius,
        thrust: false,
        invulnerable: false,
    }));

    TickResult {
        phase: session.phase,
        score: session.score,
        lives: session.ship.lives,
        level: session.level,
        time_ticks: session.time_ticks,
        entities,
        events: std::mem::take(&mut session.events),
    }
}

/// Find entities that broke an invariant and take them out of play
///
/// Broken rocks and bullets are marked dead for the following prune; a broken
/// ship is put back on its spawn point with its lives intact. Returns the
/// first violation found.
fn quarantine_broken(session: &mut GameSession) -> Option<SimError> {
    let mut first = None;
    let mut report = |entity_id: u32, reason: Invariant| {
        log::error!("entity {} failed invariant: {}; removed from play", entity_id, reason);
        first.get_or_insert(SimError::InvariantViolated { entity_id, reason });
    };

    if let Some(reason) = violation(&session.ship.body) {
        report(session.ship.id, reason);
        let center = session.tuning.arena_center();
        let ship = &mut session.ship;
        if ship.body.alive {
            ship.respawn(center, session.tuning.invulnerability_secs);
        } else {
            ship.body.pos = center;
            ship.body.vel = Vec2::ZERO;
        }
        ship.body.radius = session.tuning.ship_radius;
    }
    for rock in session.rocks.iter_mut() {
        if let Some(reason) = violation(&rock.body) {
            report(rock.id, reason);
            rock.body.alive = false;
        }
    }
    for bullet in session.bullets.iter_mut() {
        if let Some(reason) = violation(&bullet.body) {
            report(bullet.id, reason);
            bullet.body.alive = false;
        }
    }
    first
}

/// Which invariant a body breaks, if any
fn violation(body: &Body) -> Option<Invariant> {
    if !(body.radius > 0.0) {
        Some(Invariant::NonPositiveRadius)
    } else if !body.pos.is_finite() {
        Some(Invariant::NonFinitePosition)
    } else if !body.vel.is_finite() {
        Some(Invariant::NonFiniteVelocity)
    } else {
        None
    }
}
