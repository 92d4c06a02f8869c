//! Math Monsters - an arcade arithmetic game
//!
//! Core modules:
//! - `sim`: Simulation core (questions, monsters, engine loop, progression)
//! - `renderer`: Vertex generation from read-only engine snapshots
//! - `settings`: Tunable gameplay configuration

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};
pub use sim::{Difficulty, Engine, GamePhase, MonsterFactory, Progression, QuestionGenerator, Session};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Time every non-slowed monster takes to reach the avatar (ms)
    pub const TRAVEL_TIME_MS: f32 = 5000.0;
    /// Destruction animation length before removal (ms)
    pub const DESTRUCTION_ANIMATION_MS: f32 = 800.0;
    /// Largest frame delta the engine will apply in one tick (ms)
    pub const MAX_FRAME_DT_MS: f32 = 100.0;
    /// Nominal host tick rate
    pub const TICK_RATE_HZ: f32 = 60.0;
    /// Nominal frame delta at the host tick rate (ms)
    pub const FRAME_DT_MS: f32 = 1000.0 / TICK_RATE_HZ;

    /// Playfield dimensions (screen space, origin top-left)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    /// Monsters spawn this far outside the visible edge
    pub const SPAWN_MARGIN: f32 = 50.0;
    /// Avatar collision radius
    pub const AVATAR_RADIUS: f32 = 30.0;

    /// Starting (and maximum) player health
    pub const START_HEALTH: u32 = 10;
    /// Questions that must be resolved before a wave can complete
    pub const QUESTIONS_PER_WAVE: u32 = 10;
    /// Delay between a question resolving and the next spawn (ms)
    pub const SPAWN_DELAY_MS: f32 = 1000.0;
    /// Answer feedback stays visible this long (ms)
    pub const FEEDBACK_CLEAR_MS: f32 = 500.0;
    /// Pause between wave completion and the next wave starting (ms)
    pub const WAVE_ADVANCE_MS: f32 = 1500.0;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Linear interpolation between two points, `t` clamped to [0, 1]
#[inline]
pub fn lerp_point(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Screen edge a monster enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Pick a spawn point just outside a uniformly chosen screen edge.
///
/// The coordinate along the edge is uniform; the other coordinate is pushed
/// `margin` pixels beyond the edge.
pub fn spawn_point_on_edge<R: Rng>(rng: &mut R, width: f32, height: f32, margin: f32) -> Vec2 {
    let edge = Edge::ALL[rng.random_range(0..Edge::ALL.len())];
    spawn_point_for_edge(edge, rng.random::<f32>(), width, height, margin)
}

/// Spawn point on a given edge, `along` in [0, 1] selecting the in-edge position
pub fn spawn_point_for_edge(edge: Edge, along: f32, width: f32, height: f32, margin: f32) -> Vec2 {
    let along = along.clamp(0.0, 1.0);
    match edge {
        Edge::Top => Vec2::new(along * width, -margin),
        Edge::Right => Vec2::new(width + margin, along * height),
        Edge::Bottom => Vec2::new(along * width, height + margin),
        Edge::Left => Vec2::new(-margin, along * height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_lerp_point_clamps() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 20.0);
        assert_eq!(lerp_point(a, b, -1.0), a);
        assert_eq!(lerp_point(a, b, 2.0), b);
        assert_eq!(lerp_point(a, b, 0.5), Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_spawn_points_lie_outside_arena() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let p = spawn_point_on_edge(&mut rng, 800.0, 600.0, 50.0);
            let outside = p.x <= -50.0 || p.x >= 850.0 || p.y <= -50.0 || p.y >= 650.0;
            assert!(outside, "spawn point {p:?} is inside the arena");
        }
    }

    #[test]
    fn test_spawn_point_for_edge() {
        assert_eq!(spawn_point_for_edge(Edge::Left, 0.5, 800.0, 600.0, 50.0), Vec2::new(-50.0, 300.0));
        assert_eq!(spawn_point_for_edge(Edge::Bottom, 1.0, 800.0, 600.0, 50.0), Vec2::new(800.0, 650.0));
    }
}
