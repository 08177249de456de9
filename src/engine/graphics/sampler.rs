//! Area-weighted stochastic surface sampling.
//!
//! Turns a mesh into a point cloud whose density follows local surface
//! area: each face receives a share of the target count proportional to its
//! area, and the fractional remainders are carried from face to face so the
//! total comes out exact. Sampling is a pure function of
//! (mesh, target, seed) — the generator is created here, never shared.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::engine::assets::mesh::{MeshError, MeshModel};

/// One surface sample. The normal is barycentrically interpolated from the
/// face's corner normals — an approximation, not the analytic surface
/// normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vec3,
    pub normal: Vec3,
    pub material: u8,
}

/// Emits exactly `target` samples distributed over the mesh surface.
///
/// Fails fast on a zero-area mesh; that is a configuration error, not a
/// division by zero waiting to happen.
pub fn sample_surface(mesh: &MeshModel, target: u32, seed: u64) -> Result<Vec<Sample>, MeshError> {
    let total_area: f64 = mesh
        .faces()
        .iter()
        .map(|f| triangle_area(&mesh.face_positions(f)))
        .sum();
    if !(total_area > 0.0) {
        return Err(MeshError::DegenerateSurface);
    }

    let density = f64::from(target) / total_area;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut owed = 0.0f64;
    let mut out = Vec::with_capacity(target as usize);

    for face in mesh.faces() {
        let corners = mesh.face_positions(face);
        owed += triangle_area(&corners) * density;

        // After a round-up on an earlier face `owed` sits below zero, and
        // rounding -0.5 would go to -1: clamp so a zero-area face can never
        // emit a negative count. The negative remainder still carries.
        let count = owed.round().max(0.0);
        owed -= count;

        let normals = mesh.face_normals(face);
        for _ in 0..count as u32 {
            let (alpha, beta, gamma) = random_barycentric(&mut rng);
            out.push(Sample {
                position: corners[0] * alpha + corners[1] * beta + corners[2] * gamma,
                normal: normals[0] * alpha + normals[1] * beta + normals[2] * gamma,
                material: face.material,
            });
        }
    }

    debug_assert_eq!(out.len(), target as usize);
    Ok(out)
}

/// Half the cross-product magnitude, accumulated in f64: thin triangles
/// cancel catastrophically in f32.
fn triangle_area(corners: &[Vec3; 3]) -> f64 {
    let a = corners[1].as_dvec3() - corners[0].as_dvec3();
    let b = corners[2].as_dvec3() - corners[0].as_dvec3();
    a.cross(b).length() * 0.5
}

/// Area-uniform barycentric weights. The sqrt transform is required: naive
/// (u, v) weights pile samples up near one vertex.
fn random_barycentric(rng: &mut StdRng) -> (f32, f32, f32) {
    let u: f32 = rng.random_range(0.0..1.0);
    let v: f32 = rng.random_range(0.0..1.0);

    let alpha = 1.0 - u.sqrt();
    let beta = v * (1.0 - alpha);
    let gamma = 1.0 - alpha - beta;
    (alpha, beta, gamma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::mesh::{Face, Material};

    fn material(id: u8) -> Material {
        Material {
            id,
            diffuse: [1.0, 0.0, 0.0],
            specular: [0.0; 3],
            shininess: 1.0,
        }
    }

    fn face(material: u8, vertices: [u8; 3]) -> Face {
        Face {
            material,
            vertices,
            normals: [0, 0, 0],
        }
    }

    #[test]
    fn barycentric_weights_are_a_partition_of_unity() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let (a, b, g) = random_barycentric(&mut rng);
            for w in [a, b, g] {
                assert!((0.0..=1.0).contains(&w), "weight {w} outside [0, 1]");
            }
            assert!((a + b + g - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn zero_area_mesh_fails_fast() {
        // All three corners coincide.
        let mesh = MeshModel::new(
            vec![material(1)],
            vec![Vec3::ONE, Vec3::ONE, Vec3::ONE],
            vec![Vec3::Z],
            vec![face(1, [0, 1, 2])],
        )
        .unwrap();

        let err = sample_surface(&mesh, 10, 0).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateSurface));
    }

    #[test]
    fn zero_area_face_after_a_round_up_emits_nothing() {
        // Face areas 1, 0, 1 with target 1: the first face rounds 0.5 up to
        // one sample and leaves owed = -0.5. Without the clamp the middle
        // (degenerate) face would round that to -1.
        let mesh = MeshModel::new(
            vec![material(1)],
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(5.0, 5.0, 0.0),
            ],
            vec![Vec3::Z],
            vec![
                face(1, [0, 1, 2]),
                face(1, [3, 3, 3]),
                face(1, [0, 1, 2]),
            ],
        )
        .unwrap();

        let samples = sample_surface(&mesh, 1, 42).unwrap();
        assert_eq!(samples.len(), 1);
    }
}
