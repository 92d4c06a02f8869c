//! Monster factory: picks a type, spawn point, health and speed for a wave

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::monster::{Monster, MonsterType};
use super::question::Difficulty;
use crate::settings::Settings;
use crate::{distance, spawn_point_on_edge};

/// Monster types that may appear on a wave, in declaration order
pub fn eligible_types(wave: u32) -> Vec<MonsterType> {
    MonsterType::ALL
        .into_iter()
        .filter(|kind| kind.is_eligible(wave))
        .collect()
}

/// Health for a kind at a difficulty, rounded up
pub fn scaled_health(kind: MonsterType, difficulty: Difficulty) -> u32 {
    (kind.base_health() * difficulty.health_percent()).div_ceil(100)
}

/// Speed that covers `spawn -> target` in `travel_time_ms`, before the kind's
/// slow-down multiplier
pub fn speed_for_travel(spawn: Vec2, target: Vec2, travel_time_ms: f32) -> f32 {
    if travel_time_ms <= 0.0 {
        return 0.0;
    }
    distance(spawn, target) / travel_time_ms
}

/// Builds monster descriptors. Owns its RNG and the id counter.
#[derive(Debug, Clone)]
pub struct MonsterFactory {
    rng: Pcg32,
    next_id: u32,
    arena: Vec2,
    spawn_margin: f32,
    travel_time_ms: f32,
}

impl MonsterFactory {
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            arena: Vec2::new(settings.arena_width, settings.arena_height),
            spawn_margin: settings.spawn_margin,
            travel_time_ms: settings.travel_time_ms,
        }
    }

    /// Center of the playfield, where the avatar stands
    pub fn arena_center(&self) -> Vec2 {
        self.arena / 2.0
    }

    /// Create a monster heading for the arena center
    pub fn create(&mut self, wave: u32, difficulty: Difficulty) -> Monster {
        let target = self.arena_center();
        self.create_toward(wave, difficulty, target)
    }

    /// Create a monster heading for an explicit target
    pub fn create_toward(&mut self, wave: u32, difficulty: Difficulty, target: Vec2) -> Monster {
        let types = eligible_types(wave);
        let kind = types[self.rng.random_range(0..types.len())];

        let spawn = spawn_point_on_edge(&mut self.rng, self.arena.x, self.arena.y, self.spawn_margin);
        let speed = speed_for_travel(spawn, target, self.travel_time_ms) * kind.speed_multiplier();
        let health = scaled_health(kind, difficulty);

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        Monster::new(id, kind, spawn, target, health, speed)
    }
}
