//! Fixed demo camera and per-entity matrix derivation.
//!
//! The camera does not move in this demo; only the entity transforms do.
//! Matrices are still recomputed per entity per frame — transforms can
//! change every frame, so nothing here is worth caching.

use glam::{Mat4, Vec3};

use crate::engine::graphics::Transform;

/// Matrices for one draw entity in one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameMatrices {
    pub model: Mat4,
    /// view * model, without projection.
    pub view_model: Mat4,
    /// projection * view * model: what the vertex shaders call `u_transform`.
    pub total: Mat4,
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    viewport: [u32; 2],
}

impl Camera {
    const EYE: Vec3 = Vec3::new(0.0, 0.0, 4.0);
    const FOV_Y_RADIANS: f32 = std::f32::consts::FRAC_PI_4;
    const Z_NEAR: f32 = 1.0;
    const Z_FAR: f32 = 10.0;

    pub fn new(viewport: [u32; 2]) -> Self {
        Self { viewport }
    }

    /// Look-at view: eye on +Z looking at the origin, +Y up.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Self::EYE, Vec3::ZERO, Vec3::Y)
    }

    /// Perspective projection for the fixed viewport, with the Y flip that
    /// Vulkan clip space needs.
    pub fn projection(&self) -> Mat4 {
        let aspect = self.viewport[0] as f32 / self.viewport[1] as f32;
        let mut proj =
            Mat4::perspective_rh(Self::FOV_Y_RADIANS, aspect, Self::Z_NEAR, Self::Z_FAR);
        proj.y_axis.y = -proj.y_axis.y;
        proj
    }

    pub fn frame_matrices(&self, transform: &Transform) -> FrameMatrices {
        let model = transform.matrix();
        let view_model = self.view() * model;
        let total = self.projection() * view_model;
        FrameMatrices {
            model,
            view_model,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn identity_transform_composes_to_projection_times_view() {
        let camera = Camera::new([1024, 1024]);
        let m = camera.frame_matrices(&Transform::IDENTITY);

        assert_eq!(m.model, Mat4::IDENTITY);
        let expected = camera.projection() * camera.view();
        assert!(m.total.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::new([1024, 1024]);
        let m = camera.frame_matrices(&Transform::IDENTITY);

        let clip = m.total * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        // Between the near and far planes.
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
