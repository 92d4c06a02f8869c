//! Monster entity: time-based movement, damage and destruction state
//!
//! Position is never integrated from velocity. Each update recomputes it from
//! the time elapsed since spawn, so arrival time does not drift with frame
//! jitter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TRAVEL_TIME_MS;
use crate::{distance, lerp_point};

/// Closed set of monster kinds; all per-kind tuning lives in the lookups below
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterType {
    Basic,
    Fast,
    Tank,
    Boss,
}

impl MonsterType {
    pub const ALL: [MonsterType; 4] = [
        MonsterType::Basic,
        MonsterType::Fast,
        MonsterType::Tank,
        MonsterType::Boss,
    ];

    /// Whether this kind may spawn on the given wave
    pub fn is_eligible(&self, wave: u32) -> bool {
        match self {
            MonsterType::Basic => true,
            MonsterType::Fast => wave >= 3,
            MonsterType::Tank => wave >= 5,
            MonsterType::Boss => wave > 0 && wave.is_multiple_of(10),
        }
    }

    /// Health before the difficulty multiplier
    pub fn base_health(&self) -> u32 {
        match self {
            MonsterType::Fast => 1,
            MonsterType::Basic => 2,
            MonsterType::Tank => 5,
            MonsterType::Boss => 15,
        }
    }

    /// Damage dealt to the player on contact
    pub fn contact_damage(&self) -> u32 {
        match self {
            MonsterType::Basic | MonsterType::Fast => 1,
            MonsterType::Tank => 2,
            MonsterType::Boss => 3,
        }
    }

    /// Slow-down applied on top of the fixed travel time. Tanks and bosses
    /// arrive late on purpose so they read as heavy.
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            MonsterType::Basic | MonsterType::Fast => 1.0,
            MonsterType::Tank => 0.9,
            MonsterType::Boss => 0.8,
        }
    }

    /// Body diameter in pixels
    pub fn size(&self) -> f32 {
        match self {
            MonsterType::Basic => 40.0,
            MonsterType::Fast => 30.0,
            MonsterType::Tank => 55.0,
            MonsterType::Boss => 80.0,
        }
    }

    pub fn color(&self) -> [f32; 4] {
        match self {
            MonsterType::Basic => [0.35, 0.8, 0.35, 1.0],
            MonsterType::Fast => [1.0, 0.85, 0.2, 1.0],
            MonsterType::Tank => [0.35, 0.45, 0.95, 1.0],
            MonsterType::Boss => [0.9, 0.2, 0.25, 1.0],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonsterType::Basic => "basic",
            MonsterType::Fast => "fast",
            MonsterType::Tank => "tank",
            MonsterType::Boss => "boss",
        }
    }
}

/// A monster in flight toward the avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: u32,
    pub kind: MonsterType,
    pub pos: Vec2,
    pub spawn_pos: Vec2,
    pub target_pos: Vec2,
    pub health: u32,
    pub max_health: u32,
    /// Pixels per millisecond, fixed at spawn
    pub speed: f32,
    pub size: f32,
    pub color: [f32; 4],
    /// Question text this monster carries, if any
    pub equation: Option<String>,
    /// Answer that destroys this monster, if any
    pub answer: Option<i64>,
    /// Time spent moving since spawn (ms)
    pub elapsed_ms: f32,
    /// Spawn-to-arrival duration implied by `speed` (ms)
    pub travel_time_ms: f32,
    pub is_destroying: bool,
    /// Engine clock reading when destruction began
    pub destruction_started_at: Option<f64>,
}

impl Monster {
    pub fn new(id: u32, kind: MonsterType, spawn_pos: Vec2, target_pos: Vec2, health: u32, speed: f32) -> Self {
        let travel_distance = distance(spawn_pos, target_pos);
        let travel_time_ms = if speed > 0.0 && travel_distance > 0.0 {
            travel_distance / speed
        } else {
            TRAVEL_TIME_MS
        };

        Self {
            id,
            kind,
            pos: spawn_pos,
            spawn_pos,
            target_pos,
            health,
            max_health: health,
            speed,
            size: kind.size(),
            color: kind.color(),
            equation: None,
            answer: None,
            elapsed_ms: 0.0,
            travel_time_ms,
            is_destroying: false,
            destruction_started_at: None,
        }
    }

    /// Tag this monster with the question it represents
    pub fn with_question(mut self, equation: Option<String>, answer: Option<i64>) -> Self {
        self.equation = equation;
        self.answer = answer;
        self
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// Fraction of the journey completed, in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.elapsed_ms / self.travel_time_ms).clamp(0.0, 1.0)
    }

    /// Advance by `dt_ms` toward the current avatar position.
    /// Frozen once destruction has begun.
    pub fn update(&mut self, dt_ms: f32, avatar: Vec2) -> Vec2 {
        if self.is_destroying {
            return self.pos;
        }
        self.target_pos = avatar;
        self.elapsed_ms += dt_ms.max(0.0);
        self.pos = lerp_point(self.spawn_pos, self.target_pos, self.progress());
        self.pos
    }

    /// Apply damage; returns true when health reaches zero.
    /// A monster already being destroyed ignores further damage.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.is_destroying {
            return false;
        }
        self.health = self.health.saturating_sub(amount).min(self.max_health);
        self.health == 0
    }

    /// Circle overlap test against another circle
    pub fn is_colliding_with(&self, point: Vec2, radius: f32) -> bool {
        distance(self.pos, point) <= self.radius() + radius
    }

    /// Mark for destruction at `now_ms`. Returns false if already destroying.
    pub fn begin_destruction(&mut self, now_ms: f64) -> bool {
        if self.is_destroying {
            return false;
        }
        self.is_destroying = true;
        self.destruction_started_at = Some(now_ms);
        true
    }

    /// Destruction animation progress in [0, 1] (0 when not destroying)
    pub fn destruction_progress(&self, now_ms: f64, animation_ms: f32) -> f32 {
        match self.destruction_started_at {
            Some(started) if animation_ms > 0.0 => ((now_ms - started) as f32 / animation_ms).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// True once the destruction animation has fully played
    pub fn destruction_finished(&self, now_ms: f64, animation_ms: f32) -> bool {
        self.destruction_started_at
            .is_some_and(|started| started + animation_ms as f64 <= now_ms)
    }
}
