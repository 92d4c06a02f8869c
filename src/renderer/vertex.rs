//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Size of one vertex in a GPU buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
}

/// Raw bytes of a vertex list, ready for upload
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Colors for game elements
pub mod colors {
    pub const AVATAR: [f32; 4] = [0.3, 0.75, 1.0, 1.0];
    pub const AVATAR_RING: [f32; 4] = [0.8, 0.95, 1.0, 1.0];
    pub const HEALTH_BAR_BG: [f32; 4] = [0.15, 0.15, 0.15, 0.9];
    pub const HEALTH_BAR_FILL: [f32; 4] = [0.2, 0.9, 0.3, 1.0];
    pub const HEALTH_BAR_LOW: [f32; 4] = [0.95, 0.25, 0.2, 1.0];
    pub const BURST: [f32; 4] = [1.0, 0.95, 0.6, 1.0];
}
