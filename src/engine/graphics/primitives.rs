//! Shared render-facing value types.

use glam::{Mat4, Quat, Vec3};

use crate::engine::assets::ModelKind;

/// Hard cap on palette slots in the materials uniform block. Slot 0 is
/// reserved, so usable external ids are `1..MAX_MATERIALS`. Must match the
/// array length in `dot.frag` / `debug.frag`.
pub const MAX_MATERIALS: usize = 5;

/// Placement of an entity for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One model instance to draw this frame. The game loop builds these fresh
/// every frame; the renderer never retains them.
#[derive(Debug, Clone, Copy)]
pub struct DrawEntity {
    pub model: ModelKind,
    pub transform: Transform,
}
