//! Rendering contract
//!
//! Pure functions from simulation state to triangle lists. Nothing here
//! mutates the simulation, so a host may render as often as it likes between
//! ticks.

pub mod shapes;
pub mod vertex;

use glam::Vec2;

use crate::sim::Monster;
pub use vertex::{Vertex, as_bytes, colors};

const BODY_SEGMENTS: u32 = 24;
const HEALTH_BAR_HEIGHT: f32 = 5.0;
const HEALTH_BAR_GAP: f32 = 6.0;

/// Vertices for one monster: body plus health bar, or the destruction burst
pub fn monster_vertices(monster: &Monster, clock_ms: f64, animation_ms: f32) -> Vec<Vertex> {
    let radius = monster.radius();

    if monster.is_destroying {
        let t = monster.destruction_progress(clock_ms, animation_ms);
        let fade = 1.0 - t;
        let mut vertices = shapes::circle(
            monster.pos,
            radius * fade,
            shapes::with_alpha(monster.color, fade),
            BODY_SEGMENTS,
        );
        let burst_outer = radius * (1.0 + t);
        vertices.extend(shapes::ring(
            monster.pos,
            burst_outer * 0.85,
            burst_outer,
            shapes::with_alpha(colors::BURST, fade),
            BODY_SEGMENTS,
        ));
        return vertices;
    }

    let mut vertices = shapes::circle(monster.pos, radius, monster.color, BODY_SEGMENTS);

    let bar_origin = monster.pos - Vec2::new(radius, radius + HEALTH_BAR_GAP + HEALTH_BAR_HEIGHT);
    vertices.extend(shapes::rect(
        bar_origin,
        Vec2::new(monster.size, HEALTH_BAR_HEIGHT),
        colors::HEALTH_BAR_BG,
    ));

    let fraction = if monster.max_health == 0 {
        0.0
    } else {
        monster.health as f32 / monster.max_health as f32
    };
    if fraction > 0.0 {
        let fill = if fraction <= 0.34 {
            colors::HEALTH_BAR_LOW
        } else {
            colors::HEALTH_BAR_FILL
        };
        vertices.extend(shapes::rect(
            bar_origin,
            Vec2::new(monster.size * fraction, HEALTH_BAR_HEIGHT),
            fill,
        ));
    }

    vertices
}

/// Vertices for the avatar and every live monster, in draw order
pub fn scene(
    monsters: &[Monster],
    avatar_pos: Vec2,
    avatar_radius: f32,
    clock_ms: f64,
    animation_ms: f32,
) -> Vec<Vertex> {
    let mut vertices = shapes::circle(avatar_pos, avatar_radius, colors::AVATAR, BODY_SEGMENTS);
    vertices.extend(shapes::ring(
        avatar_pos,
        avatar_radius,
        avatar_radius + 3.0,
        colors::AVATAR_RING,
        BODY_SEGMENTS,
    ));
    for monster in monsters {
        vertices.extend(monster_vertices(monster, clock_ms, animation_ms));
    }
    vertices
}
