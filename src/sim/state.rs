//! Game state and core simulation types
//!
//! `GameSession` owns every entity. Entities never point back at the session;
//! motion, collision and lifecycle code all work over the session's vectors.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::heading_vector;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused, nothing advances
    Paused,
    /// Ship was destroyed and is waiting to respawn
    PlayerDestroyed,
    /// Run ended, waiting for a new game
    GameOver,
}

/// Rock size category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RockTier {
    Large,
    Medium,
    Small,
}

impl RockTier {
    /// Tier of the fragments this rock breaks into, if any
    pub fn smaller(self) -> Option<RockTier> {
        match self {
            RockTier::Large => Some(RockTier::Medium),
            RockTier::Medium => Some(RockTier::Small),
            RockTier::Small => None,
        }
    }
}

/// Variant tag for anything living in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    Rock(RockTier),
    Bullet,
}

/// Fields shared by every entity variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center in arena coordinates
    pub pos: Vec2,
    /// Units per second
    pub vel: Vec2,
    /// Orientation (radians, 0 = +x)
    pub heading: f32,
    /// Collision circle radius
    pub radius: f32,
    /// False once destroyed; dead bodies are pruned, never revived
    pub alive: bool,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            heading: 0.0,
            radius,
            alive: true,
        }
    }
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: u32,
    pub body: Body,
    pub lives: u32,
    /// Seconds of collision immunity left
    pub invulnerable_for: f32,
    /// Seconds until respawn while destroyed
    pub respawn_in: Option<f32>,
    /// Thrusters firing this tick (for rendering the flame)
    pub thrust_active: bool,
    /// Ticks until the gun can fire again
    pub fire_cooldown: u32,
    /// Fire was held last tick (shots are edge-triggered)
    pub fire_latched: bool,
}

impl Ship {
    /// New ship at `pos`, facing up, stationary and invulnerable
    pub fn new(id: u32, pos: Vec2, tuning: &Tuning) -> Self {
        let mut body = Body::new(pos, Vec2::ZERO, tuning.ship_radius);
        body.heading = -std::f32::consts::FRAC_PI_2;
        Self {
            id,
            body,
            lives: tuning.starting_lives,
            invulnerable_for: tuning.invulnerability_secs,
            respawn_in: None,
            thrust_active: false,
            fire_cooldown: 0,
            fire_latched: false,
        }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    /// Tip of the ship, where bullets leave
    #[inline]
    pub fn nose(&self) -> Vec2 {
        self.body.pos + heading_vector(self.body.heading) * self.body.radius
    }

    /// Put the ship back at `pos` after a death
    pub fn respawn(&mut self, pos: Vec2, invulnerability_secs: f32) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.body.heading = -std::f32::consts::FRAC_PI_2;
        self.body.alive = true;
        self.invulnerable_for = invulnerability_secs;
        self.respawn_in = None;
        self.thrust_active = false;
        self.fire_cooldown = 0;
    }
}

/// A drifting rock
#[derive(Debug, Clone)]
pub struct Rock {
    pub id: u32,
    pub body: Body,
    pub tier: RockTier,
    /// Cosmetic rotation (radians/sec)
    pub spin: f32,
}

/// A bullet fired by the ship
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: u32,
    pub body: Body,
    /// Ticks before the bullet expires
    pub time_to_live: u32,
}

impl AsRef<Body> for Body {
    fn as_ref(&self) -> &Body {
        self
    }
}

impl AsRef<Body> for Ship {
    fn as_ref(&self) -> &Body {
        &self.body
    }
}

impl AsRef<Body> for Rock {
    fn as_ref(&self) -> &Body {
        &self.body
    }
}

impl AsRef<Body> for Bullet {
    fn as_ref(&self) -> &Body {
        &self.body
    }
}

/// Something the host may want to react to (sound, HUD, high scores)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BulletFired,
    RockDestroyed { tier: RockTier, points: u64, pos: Vec2 },
    ShipDestroyed { lives_left: u32 },
    ShipRespawned,
    ExtraLife,
    LevelStarted { level: u32 },
    Paused,
    Resumed,
    GameOver { final_score: u64 },
}

/// Complete game session (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Balance values this session was created with
    pub tuning: Tuning,
    /// Current level (1-based)
    pub level: u32,
    /// Score
    pub score: u64,
    /// Score at which the next bonus life is granted (None once exhausted)
    pub next_extra_life: Option<u64>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Current phase
    pub phase: GamePhase,
    /// Player ship (singleton, destroyed rather than removed)
    pub ship: Ship,
    /// Active rocks
    pub rocks: Vec<Rock>,
    /// Active bullets
    pub bullets: Vec<Bullet>,
    /// Events raised since the last tick result was built
    pub(crate) events: Vec<GameEvent>,
    /// Spawn randomness
    pub(crate) rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl GameSession {
    /// Create a new session with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new session with custom tuning
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self::with_rng(seed, tuning, Pcg32::seed_from_u64(seed))
    }

    /// Create a new session drawing spawn randomness from `rng`
    pub fn with_rng(seed: u64, tuning: Tuning, rng: Pcg32) -> Self {
        let center = tuning.arena_center();
        let ship = Ship::new(0, center, &tuning);
        let next_extra_life = Some(tuning.extra_life_every).filter(|&every| every > 0);
        let mut session = Self {
            seed,
            tuning,
            level: 1,
            score: 0,
            next_extra_life,
            time_ticks: 0,
            phase: GamePhase::Playing,
            ship,
            rocks: Vec::new(),
            bullets: Vec::new(),
            events: Vec::new(),
            rng,
            next_id: 1,
        };

        super::spawn::start_level(&mut session);

        session
    }

    /// Discard this run and start over; the seed is drawn from the current RNG
    pub fn new_game(&mut self) {
        use rand::Rng;
        let seed = self.rng.random::<u64>();
        self.reset(seed);
    }

    /// Discard this run and start over with an explicit seed
    pub fn reset(&mut self, seed: u64) {
        let tuning = self.tuning.clone();
        *self = Self::with_tuning(seed, tuning);
        log::info!("New game started (seed {})", seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Lives remaining
    #[inline]
    pub fn lives(&self) -> u32 {
        self.ship.lives
    }
}
