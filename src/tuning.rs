//! Data-driven game balance
//!
//! Every number that shapes gameplay lives here so hosts can ship a JSON
//! override instead of recompiling. Missing fields fall back to defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::error::ConfigError;
use crate::sim::RockTier;

/// Per-tier rock balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTuning {
    /// Collision radius
    pub radius: f32,
    /// Minimum spawn speed (units/sec)
    pub min_speed: f32,
    /// Maximum spawn speed (units/sec)
    pub max_speed: f32,
    /// Points for destroying one rock of this tier
    pub score: u64,
}

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,

    // === Ship ===
    pub ship_radius: f32,
    /// Turn rate (radians/sec)
    pub ship_rotation_rate: f32,
    /// Thrust acceleration (units/sec²)
    pub ship_thrust: f32,
    /// Linear drag coefficient (fraction of velocity lost per second)
    pub ship_drag: f32,
    pub ship_max_speed: f32,

    // === Bullets ===
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    /// Lifetime in ticks
    pub bullet_ttl_ticks: u32,
    /// Ticks between shots
    pub fire_cooldown_ticks: u32,
    /// Bullets the player may have in flight at once
    pub max_bullets: usize,

    // === Rocks ===
    pub large: TierTuning,
    pub medium: TierTuning,
    pub small: TierTuning,
    /// Child speed relative to the parent's speed
    pub split_speed_factor: f32,
    /// Max angular offset of a child's direction from its parent (radians)
    pub split_spread: f32,
    /// Hard cap on live rocks (splits beyond this are dropped)
    pub max_rocks: usize,
    /// Max cosmetic spin (radians/sec)
    pub rock_max_spin: f32,

    // === Levels ===
    pub level_base_rocks: u32,
    pub level_rock_step: u32,
    pub level_max_rocks: u32,
    /// Speed multiplier gained per level
    pub level_speed_step: f32,
    pub level_speed_cap: f32,
    /// Minimum distance between a fresh rock and the ship spawn point
    pub safe_spawn_distance: f32,

    // === Lives ===
    pub starting_lives: u32,
    /// Post-respawn grace period (seconds)
    pub invulnerability_secs: f32,
    /// Delay between ship destruction and respawn (seconds)
    pub respawn_delay_secs: f32,
    /// Points per bonus life (0 disables)
    pub extra_life_every: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,

            ship_radius: 12.0,
            ship_rotation_rate: 4.5,
            ship_thrust: 260.0,
            ship_drag: 0.6,
            ship_max_speed: 320.0,

            bullet_speed: 420.0,
            bullet_radius: 2.0,
            bullet_ttl_ticks: 60,
            fire_cooldown_ticks: 6,
            max_bullets: 4,

            large: TierTuning {
                radius: 40.0,
                min_speed: 30.0,
                max_speed: 60.0,
                score: 20,
            },
            medium: TierTuning {
                radius: 20.0,
                min_speed: 50.0,
                max_speed: 90.0,
                score: 50,
            },
            small: TierTuning {
                radius: 10.0,
                min_speed: 80.0,
                max_speed: 130.0,
                score: 100,
            },
            split_speed_factor: 1.3,
            split_spread: 0.8,
            max_rocks: 48,
            rock_max_spin: 1.5,

            level_base_rocks: 4,
            level_rock_step: 2,
            level_max_rocks: 12,
            level_speed_step: 0.1,
            level_speed_cap: 2.0,
            safe_spawn_distance: 150.0,

            starting_lives: 3,
            invulnerability_secs: 2.0,
            respawn_delay_secs: 1.5,
            extra_life_every: 10_000,
        }
    }
}

impl Tuning {
    /// Parse a JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive finite number",
                })
            }
        }

        positive("arena_width", self.arena_width)?;
        positive("arena_height", self.arena_height)?;
        positive("ship_radius", self.ship_radius)?;
        positive("ship_max_speed", self.ship_max_speed)?;
        positive("bullet_speed", self.bullet_speed)?;
        positive("bullet_radius", self.bullet_radius)?;
        positive("split_speed_factor", self.split_speed_factor)?;
        positive("level_speed_cap", self.level_speed_cap)?;

        for (field, tier) in [
            ("large", &self.large),
            ("medium", &self.medium),
            ("small", &self.small),
        ] {
            positive(field, tier.radius)?;
            positive(field, tier.min_speed)?;
            if !(tier.max_speed.is_finite() && tier.max_speed >= tier.min_speed) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "max_speed must be >= min_speed",
                });
            }
        }

        if self.ship_drag < 0.0 || self.safe_spawn_distance < 0.0 || self.split_spread < 0.0 {
            return Err(ConfigError::Invalid {
                field: "ship_drag/safe_spawn_distance/split_spread",
                reason: "must not be negative",
            });
        }
        if self.bullet_ttl_ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "bullet_ttl_ticks",
                reason: "must be at least 1",
            });
        }
        if self.max_bullets == 0 {
            return Err(ConfigError::Invalid {
                field: "max_bullets",
                reason: "must be at least 1",
            });
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Arena extents as a vector
    #[inline]
    pub fn arena(&self) -> Vec2 {
        Vec2::new(self.arena_width, self.arena_height)
    }

    /// Ship spawn point (arena center)
    #[inline]
    pub fn arena_center(&self) -> Vec2 {
        self.arena() / 2.0
    }

    /// Balance values for a rock tier
    pub fn tier(&self, tier: RockTier) -> &TierTuning {
        match tier {
            RockTier::Large => &self.large,
            RockTier::Medium => &self.medium,
            RockTier::Small => &self.small,
        }
    }

    /// Number of large rocks spawned at the start of `level` (1-based)
    pub fn rocks_for_level(&self, level: u32) -> u32 {
        let extra = level.saturating_sub(1).saturating_mul(self.level_rock_step);
        self.level_base_rocks
            .saturating_add(extra)
            .min(self.level_max_rocks)
    }

    /// Rock speed multiplier for `level` (1-based)
    pub fn speed_scale_for_level(&self, level: u32) -> f32 {
        let scale = 1.0 + level.saturating_sub(1) as f32 * self.level_speed_step;
        scale.min(self.level_speed_cap)
    }
}
