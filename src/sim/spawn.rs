//! Spawning and lifecycle rules
//!
//! Level setup, rock splitting, bullets, ship death/respawn, scoring and
//! pruning. Everything that creates or destroys an entity goes through here.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::collision::HitPair;
use super::state::{Body, Bullet, GameEvent, GamePhase, GameSession, Rock, RockTier};
use super::tick::InputState;
use crate::{heading_vector, rotate, wrap_position};

/// Placement attempts before falling back to pushing a rock out of the safe zone
const SPAWN_ATTEMPTS: u32 = 32;

/// Fragments produced by one split
const SPLIT_CHILDREN: usize = 2;

/// Spawn the large rocks for `session.level`
pub fn start_level(session: &mut GameSession) {
    let level = session.level;
    let count = session.tuning.rocks_for_level(level);
    let speed_scale = session.tuning.speed_scale_for_level(level);
    // Keep clear of the spawn point, and of the ship if it is flying elsewhere
    let spawn_point = session.tuning.arena_center();
    let mut avoid = vec![spawn_point];
    if session.ship.body.alive && session.ship.body.pos != spawn_point {
        avoid.push(session.ship.body.pos);
    }

    for _ in 0..count {
        let pos = safe_spawn_position(session, &avoid);
        let vel = random_velocity(session, RockTier::Large, speed_scale);
        let rock = new_rock(session, RockTier::Large, pos, vel);
        session.rocks.push(rock);
    }

    log::info!("Level {} started: {} rocks, speed x{:.2}", level, count, speed_scale);
    session.events.push(GameEvent::LevelStarted { level });
}

/// Random point at least `safe_spawn_distance` from every point in `avoid`
///
/// If no draw clears them all, the last draw is pushed out radially from
/// `avoid[0]`, so only the first point is guaranteed.
pub fn safe_spawn_position(session: &mut GameSession, avoid: &[Vec2]) -> Vec2 {
    let arena = session.tuning.arena();
    let safe = session.tuning.safe_spawn_distance;

    let mut candidate = arena * 0.5;
    for _ in 0..SPAWN_ATTEMPTS {
        candidate = Vec2::new(
            session.rng.random_range(0.0..arena.x),
            session.rng.random_range(0.0..arena.y),
        );
        if avoid.iter().all(|p| candidate.distance(*p) >= safe) {
            return candidate;
        }
    }

    let Some(&anchor) = avoid.first() else {
        return candidate;
    };
    // Tiny arenas or huge safe radii: push the last candidate straight out
    let dir = (candidate - anchor).normalize_or(Vec2::X);
    wrap_position(anchor + dir * safe, arena)
}

/// Velocity in a random direction with a speed from the tier's range
fn random_velocity(session: &mut GameSession, tier: RockTier, speed_scale: f32) -> Vec2 {
    let theta = session.rng.random_range(0.0..TAU);
    heading_vector(theta) * random_speed(session, tier, speed_scale)
}

fn random_speed(session: &mut GameSession, tier: RockTier, speed_scale: f32) -> f32 {
    let t = *session.tuning.tier(tier);
    session.rng.random_range(t.min_speed..=t.max_speed) * speed_scale
}

fn new_rock(session: &mut GameSession, tier: RockTier, pos: Vec2, vel: Vec2) -> Rock {
    let id = session.next_entity_id();
    let max_spin = session.tuning.rock_max_spin;
    let spin = session.rng.random_range(-max_spin..=max_spin);
    let mut body = Body::new(pos, vel, session.tuning.tier(tier).radius);
    body.heading = session.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
    Rock { id, body, tier, spin }
}

/// Build the fragments of a destroyed rock
///
/// Large and Medium rocks yield two rocks of the next tier at the parent's
/// position, flying off at an angle to the parent's course and faster than
/// it. Small rocks yield nothing. The live-rock cap may cut the count.
pub fn split_rock(session: &mut GameSession, tier: RockTier, pos: Vec2, vel: Vec2) -> Vec<Rock> {
    let Some(child_tier) = tier.smaller() else {
        log::warn!("split requested for a {:?} rock at {}; tier has no fragments", tier, pos);
        return Vec::new();
    };

    let live = session.rocks.iter().filter(|r| r.body.alive).count();
    let room = session.tuning.max_rocks.saturating_sub(live);
    let count = SPLIT_CHILDREN.min(room);
    if count < SPLIT_CHILDREN {
        log::debug!("rock cap reached, spawning {} of {} fragments", count, SPLIT_CHILDREN);
    }

    let speed_scale = session.tuning.speed_scale_for_level(session.level);
    let spread = session.tuning.split_spread;
    let parent_speed = vel.length();
    let parent_dir = if parent_speed > f32::EPSILON {
        vel / parent_speed
    } else {
        heading_vector(session.rng.random_range(0.0..TAU))
    };

    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = session.rng.random_range(-spread..=spread);
        let dir = rotate(parent_dir, offset);
        let speed = (parent_speed * session.tuning.split_speed_factor)
            .max(random_speed(session, child_tier, speed_scale));
        children.push(new_rock(session, child_tier, pos, dir * speed));
    }
    children
}

/// Kill a rock, score it and spawn its fragments
///
/// Returns false if the rock was already dead this tick (no double scoring).
pub fn destroy_rock(session: &mut GameSession, index: usize) -> bool {
    let Some(rock) = session.rocks.get_mut(index) else {
        return false;
    };
    if !rock.body.alive {
        return false;
    }
    rock.body.alive = false;
    let (tier, pos, vel) = (rock.tier, rock.body.pos, rock.body.vel);

    let points = session.tuning.tier(tier).score;
    award_score(session, points);
    log::trace!("{:?} rock destroyed at {} (+{})", tier, pos, points);
    session.events.push(GameEvent::RockDestroyed { tier, points, pos });

    if tier.smaller().is_some() {
        let children = split_rock(session, tier, pos, vel);
        session.rocks.extend(children);
    }
    true
}

/// Add points and grant bonus lives at each threshold
pub fn award_score(session: &mut GameSession, points: u64) {
    session.score = session.score.saturating_add(points);

    let every = session.tuning.extra_life_every;
    while let Some(threshold) = session.next_extra_life {
        if session.score < threshold {
            break;
        }
        session.ship.lives = session.ship.lives.saturating_add(1);
        log::debug!("Extra life at {} points ({} lives)", session.score, session.ship.lives);
        session.events.push(GameEvent::ExtraLife);
        // Overflowing threshold ends the bonus schedule
        session.next_extra_life = threshold.checked_add(every).filter(|_| every > 0);
    }
}

/// Fire a bullet on a fresh trigger press, respecting cooldown and the cap
///
/// Returns true if a bullet was spawned.
pub fn try_fire(session: &mut GameSession, input: &InputState) -> bool {
    let ship = &mut session.ship;
    let pressed = input.fire && !ship.fire_latched;
    ship.fire_latched = input.fire;
    ship.fire_cooldown = ship.fire_cooldown.saturating_sub(1);

    if !pressed || !ship.body.alive || ship.fire_cooldown > 0 {
        return false;
    }
    let in_flight = session.bullets.iter().filter(|b| b.body.alive).count();
    if in_flight >= session.tuning.max_bullets {
        return false;
    }

    let ship = &session.ship;
    let dir = heading_vector(ship.body.heading);
    let pos = wrap_position(ship.nose(), session.tuning.arena());
    let vel = dir * session.tuning.bullet_speed + ship.body.vel;
    let mut body = Body::new(pos, vel, session.tuning.bullet_radius);
    body.heading = ship.body.heading;

    let id = session.next_entity_id();
    session.bullets.push(Bullet {
        id,
        body,
        time_to_live: session.tuning.bullet_ttl_ticks,
    });
    session.ship.fire_cooldown = session.tuning.fire_cooldown_ticks;
    session.events.push(GameEvent::BulletFired);
    true
}

/// Apply this tick's hits
///
/// Bullets are consumed on their first pair, even when the rock was already
/// killed by an earlier bullet this tick. A rock only ever scores once. Every
/// ship pair was detected against a live rock, so it always costs a life.
pub fn resolve_hits(session: &mut GameSession, bullet_hits: &[HitPair], ship_hits: &[HitPair]) {
    for hit in bullet_hits {
        let bullet = &mut session.bullets[hit.a];
        if !bullet.body.alive {
            continue;
        }
        bullet.body.alive = false;
        destroy_rock(session, hit.b);
    }

    for hit in ship_hits {
        if !session.ship.body.alive {
            break;
        }
        // No second score if a bullet got there first
        destroy_rock(session, hit.b);
        destroy_ship(session);
    }
}

/// Ship took a fatal hit
pub fn destroy_ship(session: &mut GameSession) {
    let ship = &mut session.ship;
    ship.body.alive = false;
    ship.body.vel = Vec2::ZERO;
    ship.thrust_active = false;
    ship.lives = ship.lives.saturating_sub(1);
    let lives_left = ship.lives;
    session.events.push(GameEvent::ShipDestroyed { lives_left });

    if lives_left > 0 {
        ship.respawn_in = Some(session.tuning.respawn_delay_secs);
        session.phase = GamePhase::PlayerDestroyed;
        log::debug!("Ship destroyed, {} lives left", lives_left);
    } else {
        ship.respawn_in = None;
        session.phase = GamePhase::GameOver;
        log::info!("Game over: score {} on level {}", session.score, session.level);
        session.events.push(GameEvent::GameOver {
            final_score: session.score,
        });
    }
}

/// Run the invulnerability and respawn countdowns
pub fn update_ship_timers(session: &mut GameSession, dt: f32) {
    let ship = &mut session.ship;
    ship.invulnerable_for = (ship.invulnerable_for - dt).max(0.0);

    let Some(remaining) = ship.respawn_in else {
        return;
    };
    let remaining = remaining - dt;
    if remaining > 0.0 {
        ship.respawn_in = Some(remaining);
        return;
    }

    let center = session.tuning.arena_center();
    ship.respawn(center, session.tuning.invulnerability_secs);
    if session.phase == GamePhase::PlayerDestroyed {
        session.phase = GamePhase::Playing;
    }
    log::debug!("Ship respawned ({} lives)", ship.lives);
    session.events.push(GameEvent::ShipRespawned);
}

/// Drop dead rocks and spent bullets
pub fn prune(session: &mut GameSession) {
    session.rocks.retain(|r| r.body.alive);
    session.bullets.retain(|b| b.body.alive);
}

/// Start the next level once the field is clear
///
/// Returns true if a new level was spawned.
pub fn advance_level_if_clear(session: &mut GameSession) -> bool {
    if session.phase == GamePhase::GameOver || !session.rocks.is_empty() {
        return false;
    }
    session.level += 1;
    start_level(session);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;

    fn empty_session(seed: u64) -> GameSession {
        let mut session = GameSession::new(seed);
        session.rocks.clear();
        session.events.clear();
        session
    }

    fn place_rock(session: &mut GameSession, tier: RockTier, pos: Vec2, vel: Vec2) -> usize {
        let rock = new_rock(session, tier, pos, vel);
        session.rocks.push(rock);
        session.rocks.len() - 1
    }

    #[test]
    fn test_level_rocks_keep_safe_distance() {
        for seed in 0..20 {
            let session = GameSession::new(seed);
            let center = session.tuning.arena_center();
            for rock in &session.rocks {
                assert!(rock.body.pos.distance(center) >= session.tuning.safe_spawn_distance);
                assert_eq!(rock.tier, RockTier::Large);
                let t = session.tuning.large;
                let speed = rock.body.vel.length();
                assert!(speed >= t.min_speed - 1e-3 && speed <= t.max_speed + 1e-3);
            }
        }
    }

    #[test]
    fn test_next_level_avoids_spawn_point_and_ship() {
        for seed in 0..10 {
            let mut session = empty_session(seed);
            let center = session.tuning.arena_center();
            session.ship.body.pos = Vec2::new(650.0, 150.0);
            session.level = 2;
            start_level(&mut session);
            assert_eq!(session.rocks.len(), 6);
            for rock in &session.rocks {
                assert!(rock.body.pos.distance(center) >= session.tuning.safe_spawn_distance);
                assert!(rock.body.pos.distance(session.ship.body.pos) >= session.tuning.safe_spawn_distance);
            }
        }
    }

    #[test]
    fn test_safe_spawn_fallback() {
        // Safe radius larger than the arena forces the push-out path
        let tuning = Tuning {
            safe_spawn_distance: 5_000.0,
            ..Tuning::default()
        };
        let mut session = GameSession::with_tuning(3, tuning);
        let p = safe_spawn_position(&mut session, &[Vec2::new(400.0, 300.0)]);
        assert!(p.is_finite());
        assert!((0.0..800.0).contains(&p.x));
        assert!((0.0..600.0).contains(&p.y));
    }

    #[test]
    fn test_split_conservation() {
        let mut session = empty_session(1);
        let i = place_rock(&mut session, RockTier::Large, Vec2::new(100.0, 100.0), Vec2::new(40.0, 0.0));
        assert!(destroy_rock(&mut session, i));
        prune(&mut session);
        assert_eq!(session.rocks.len(), 2);
        assert!(session.rocks.iter().all(|r| r.tier == RockTier::Medium));

        destroy_rock(&mut session, 0);
        prune(&mut session);
        // -1 + 2
        assert_eq!(session.rocks.len(), 3);
        assert_eq!(session.rocks.iter().filter(|r| r.tier == RockTier::Small).count(), 2);

        let small = session.rocks.iter().position(|r| r.tier == RockTier::Small).unwrap();
        destroy_rock(&mut session, small);
        prune(&mut session);
        assert_eq!(session.rocks.len(), 2);
    }

    #[test]
    fn test_children_spawn_at_parent_and_fly_faster() {
        let mut session = empty_session(9);
        let parent_pos = Vec2::new(250.0, 400.0);
        let parent_vel = Vec2::new(0.0, 50.0);
        let children = split_rock(&mut session, RockTier::Large, parent_pos, parent_vel);
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.body.pos, parent_pos);
            assert_eq!(child.body.radius, session.tuning.medium.radius);
            assert!(child.body.vel.length() > parent_vel.length());
            // Direction stays within the spread cone
            let angle = parent_vel.angle_to(child.body.vel).abs();
            assert!(angle <= session.tuning.split_spread + 1e-4);
        }
        assert_ne!(children[0].id, children[1].id);
    }

    #[test]
    fn test_split_small_is_noop() {
        let mut session = empty_session(2);
        let children = split_rock(&mut session, RockTier::Small, Vec2::new(10.0, 10.0), Vec2::X);
        assert!(children.is_empty());
    }

    #[test]
    fn test_split_respects_rock_cap() {
        let tuning = Tuning {
            max_rocks: 2,
            ..Tuning::default()
        };
        let mut session = GameSession::with_tuning(4, tuning);
        session.rocks.truncate(2);
        let before = session.rocks.len();
        destroy_rock(&mut session, 0);
        prune(&mut session);
        // One live rock remained, so only one fragment fits
        assert_eq!(session.rocks.len(), before);
    }

    #[test]
    fn test_destroy_rock_scores_once() {
        let mut session = empty_session(5);
        let i = place_rock(&mut session, RockTier::Small, Vec2::new(50.0, 50.0), Vec2::X);
        assert!(destroy_rock(&mut session, i));
        assert!(!destroy_rock(&mut session, i));
        assert_eq!(session.score, session.tuning.small.score);
        assert_eq!(
            session.events,
            vec![GameEvent::RockDestroyed {
                tier: RockTier::Small,
                points: 100,
                pos: Vec2::new(50.0, 50.0),
            }]
        );
    }

    #[test]
    fn test_extra_life_threshold() {
        let mut session = empty_session(6);
        let lives = session.lives();
        award_score(&mut session, 9_990);
        assert_eq!(session.lives(), lives);
        award_score(&mut session, 20);
        assert_eq!(session.lives(), lives + 1);
        assert_eq!(session.next_extra_life, Some(20_000));
        // Skipping two thresholds at once grants both
        award_score(&mut session, 20_000);
        assert_eq!(session.lives(), lives + 3);
    }

    #[test]
    fn test_extra_life_schedule_stops_at_overflow() {
        let mut session = empty_session(17);
        let lives = session.lives();
        session.next_extra_life = Some(u64::MAX - 5);
        award_score(&mut session, u64::MAX);
        assert_eq!(session.score, u64::MAX);
        assert_eq!(session.lives(), lives + 1);
        assert_eq!(session.next_extra_life, None);
        // Saturated score grants nothing further
        award_score(&mut session, 100);
        assert_eq!(session.lives(), lives + 1);
    }

    #[test]
    fn test_no_extra_lives_when_disabled() {
        let tuning = Tuning {
            extra_life_every: 0,
            ..Tuning::default()
        };
        let mut session = GameSession::with_tuning(18, tuning);
        assert_eq!(session.next_extra_life, None);
        award_score(&mut session, 50_000);
        assert_eq!(session.lives(), 3);
    }

    #[test]
    fn test_fire_is_edge_triggered() {
        let mut session = empty_session(7);
        let fire = InputState {
            fire: true,
            ..Default::default()
        };
        assert!(try_fire(&mut session, &fire));
        // Holding the trigger does not auto-fire, even after the cooldown
        for _ in 0..20 {
            assert!(!try_fire(&mut session, &fire));
        }
        assert!(!try_fire(&mut session, &InputState::default()));
        assert!(try_fire(&mut session, &fire));
        assert_eq!(session.bullets.len(), 2);
    }

    #[test]
    fn test_fire_cooldown_blocks_rapid_taps() {
        let mut session = empty_session(8);
        let fire = InputState {
            fire: true,
            ..Default::default()
        };
        assert!(try_fire(&mut session, &fire));
        assert!(!try_fire(&mut session, &InputState::default()));
        // Fresh press but still cooling down
        assert!(!try_fire(&mut session, &fire));
        assert_eq!(session.bullets.len(), 1);
    }

    #[test]
    fn test_fire_respects_bullet_cap() {
        let tuning = Tuning {
            fire_cooldown_ticks: 0,
            max_bullets: 2,
            ..Tuning::default()
        };
        let mut session = GameSession::with_tuning(8, tuning);
        let fire = InputState {
            fire: true,
            ..Default::default()
        };
        for _ in 0..5 {
            try_fire(&mut session, &fire);
            try_fire(&mut session, &InputState::default());
        }
        assert_eq!(session.bullets.len(), 2);
    }

    #[test]
    fn test_bullet_inherits_ship_momentum() {
        let mut session = empty_session(10);
        session.ship.body.vel = Vec2::new(30.0, 0.0);
        let fire = InputState {
            fire: true,
            ..Default::default()
        };
        assert!(try_fire(&mut session, &fire));
        let bullet = &session.bullets[0];
        assert!((bullet.body.vel.x - 30.0).abs() < 1e-3);
        assert!((bullet.body.vel.y + session.tuning.bullet_speed).abs() < 1e-3);
        assert_eq!(bullet.body.pos, session.ship.nose());
        assert_eq!(bullet.time_to_live, session.tuning.bullet_ttl_ticks);
        assert_eq!(session.events, vec![GameEvent::BulletFired]);
    }

    #[test]
    fn test_dead_ship_cannot_fire() {
        let mut session = empty_session(11);
        session.ship.body.alive = false;
        let fire = InputState {
            fire: true,
            ..Default::default()
        };
        assert!(!try_fire(&mut session, &fire));
        assert!(session.bullets.is_empty());
    }

    #[test]
    fn test_two_bullets_one_rock() {
        let mut session = empty_session(12);
        let r = place_rock(&mut session, RockTier::Small, Vec2::new(100.0, 100.0), Vec2::ZERO);
        for x in [98.0, 102.0] {
            let id = session.next_entity_id();
            session.bullets.push(Bullet {
                id,
                body: Body::new(Vec2::new(x, 100.0), Vec2::ZERO, 2.0),
                time_to_live: 10,
            });
        }
        let hits = [HitPair { a: 0, b: r }, HitPair { a: 1, b: r }];
        resolve_hits(&mut session, &hits, &[]);
        assert_eq!(session.score, session.tuning.small.score);
        assert!(session.bullets.iter().all(|b| !b.body.alive));
    }

    #[test]
    fn test_ship_hit_costs_a_life_and_scores() {
        let mut session = empty_session(13);
        let r = place_rock(&mut session, RockTier::Large, Vec2::new(400.0, 300.0), Vec2::ZERO);
        resolve_hits(&mut session, &[], &[HitPair { a: 0, b: r }]);
        assert_eq!(session.lives(), 2);
        assert_eq!(session.phase, GamePhase::PlayerDestroyed);
        assert!(!session.ship.body.alive);
        assert_eq!(session.ship.respawn_in, Some(session.tuning.respawn_delay_secs));
        assert_eq!(session.score, session.tuning.large.score);
    }

    #[test]
    fn test_ship_dies_when_bullet_shares_its_rock() {
        let mut session = empty_session(16);
        let pos = session.ship.body.pos;
        let r = place_rock(&mut session, RockTier::Small, pos, Vec2::ZERO);
        let id = session.next_entity_id();
        session.bullets.push(Bullet {
            id,
            body: Body::new(pos, Vec2::ZERO, 2.0),
            time_to_live: 10,
        });
        // Bullet pair resolves first and kills the rock
        resolve_hits(&mut session, &[HitPair { a: 0, b: r }], &[HitPair { a: 0, b: r }]);
        assert_eq!(session.lives(), 2);
        assert_eq!(session.phase, GamePhase::PlayerDestroyed);
        assert!(!session.ship.body.alive);
        // Rock scored only once
        assert_eq!(session.score, session.tuning.small.score);
    }

    #[test]
    fn test_last_life_is_game_over() {
        let mut session = empty_session(14);
        session.ship.lives = 1;
        session.score = 1234;
        destroy_ship(&mut session);
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(session.ship.respawn_in, None);
        assert!(session.events.contains(&GameEvent::GameOver { final_score: 1234 }));
    }

    #[test]
    fn test_respawn_after_delay() {
        let mut session = empty_session(15);
        session.ship.body.pos = Vec2::new(10.0, 10.0);
        destroy_ship(&mut session);
        update_ship_timers(&mut session, 1.0);
        assert_eq!(session.phase, GamePhase::PlayerDestroyed);
        update_ship_timers(&mut session, 0.6);
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.ship.body.alive);
        assert_eq!(session.ship.body.pos, session.tuning.arena_center());
        assert_eq!(session.ship.body.vel, Vec2::ZERO);
        assert_eq!(session.ship.invulnerable_for, session.tuning.invulnerability_secs);
        assert!(session.events.contains(&GameEvent::ShipRespawned));
    }

    #[test]
    fn test_advance_level_when_clear() {
        let mut session = empty_session(16);
        assert!(advance_level_if_clear(&mut session));
        assert_eq!(session.level, 2);
        assert_eq!(session.rocks.len(), session.tuning.rocks_for_level(2) as usize);
        assert!(!advance_level_if_clear(&mut session));
    }
}
