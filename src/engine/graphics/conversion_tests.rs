//! Scenario tests for the mesh → renderable-model conversion.

use glam::Vec3;

use crate::engine::assets::mesh::{Face, Material, MeshModel};
use crate::engine::graphics::renderable::convert_model;
use crate::engine::graphics::sampler::sample_surface;

fn material(id: u8) -> Material {
    Material {
        id,
        diffuse: [1.0, 1.0, 0.0],
        specular: [1.0, 1.0, 1.0],
        shininess: 32.0,
    }
}

/// One right triangle with legs `a` and `b` in the XY plane: area a*b/2,
/// exactly representable for the integer legs the tests use.
fn single_triangle(a: f32, b: f32) -> MeshModel {
    MeshModel::new(
        vec![material(1)],
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(a, 0.0, 0.0),
            Vec3::new(0.0, b, 0.0),
        ],
        vec![Vec3::Z],
        vec![Face {
            material: 1,
            vertices: [0, 1, 2],
            normals: [0, 0, 0],
        }],
    )
    .unwrap()
}

/// Two right triangles with a 9:1 area ratio (areas 9 and 1), one material
/// id each so the sample counts can be told apart.
fn nine_to_one() -> MeshModel {
    MeshModel::new(
        vec![material(1), material(2)],
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(12.0, 0.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
        ],
        vec![Vec3::Z],
        vec![
            Face {
                material: 1,
                vertices: [0, 1, 2],
                normals: [0, 0, 0],
            },
            Face {
                material: 2,
                vertices: [3, 4, 5],
                normals: [0, 0, 0],
            },
        ],
    )
    .unwrap()
}

#[test]
fn sampler_emits_exactly_the_target_count() {
    let mesh = nine_to_one();
    for target in [0u32, 1, 10, 117, 500] {
        let samples = sample_surface(&mesh, target, 3).unwrap();
        assert_eq!(samples.len(), target as usize);
    }
}

#[test]
fn single_triangle_samples_stay_inside_the_triangle() {
    let mesh = single_triangle(1.0, 1.0);
    let samples = sample_surface(&mesh, 10, 99).unwrap();

    assert_eq!(samples.len(), 10);
    for s in &samples {
        assert_eq!(s.material, 1);
        // For this triangle the barycentric weights can be read off the
        // position directly: beta = x, gamma = y, alpha = 1 - x - y.
        let beta = s.position.x;
        let gamma = s.position.y;
        let alpha = 1.0 - beta - gamma;
        for w in [alpha, beta, gamma] {
            assert!((-0.01..=1.01).contains(&w), "weight {w} outside [0, 1]");
        }
        assert!((alpha + beta + gamma - 1.0).abs() < 0.01);
        assert_eq!(s.position.z, 0.0);
    }
}

#[test]
fn nine_to_one_split_is_allocated_deterministically() {
    let samples = sample_surface(&nine_to_one(), 10, 7).unwrap();

    // density = 10 / 10 = 1: the carry is integral at every face, so the
    // split is exactly 9:1 in face order.
    let first = samples.iter().filter(|s| s.material == 1).count();
    let second = samples.iter().filter(|s| s.material == 2).count();
    assert_eq!(first, 9);
    assert_eq!(second, 1);
}

#[test]
fn same_seed_reproduces_the_dot_stream_bit_for_bit() {
    let mesh = nine_to_one();
    let a = convert_model(&mesh, 64, 0xC0FFEE).unwrap();
    let b = convert_model(&mesh, 64, 0xC0FFEE).unwrap();
    assert_eq!(a.dots, b.dots);
}

#[test]
fn different_seeds_move_the_dots() {
    let mesh = nine_to_one();
    let a = convert_model(&mesh, 64, 1).unwrap();
    let b = convert_model(&mesh, 64, 2).unwrap();
    // Counts still match; positions should not.
    assert_eq!(a.dots.len(), b.dots.len());
    assert_ne!(a.dots, b.dots);
}

#[test]
fn stream_sizes_follow_the_contract() {
    let mesh = nine_to_one();
    let renderable = convert_model(&mesh, 25, 5).unwrap();

    assert_eq!(renderable.solid.len(), mesh.faces().len() * 3);
    assert_eq!(renderable.debug.len(), mesh.faces().len() * 3);
    assert_eq!(renderable.dots.len(), 25);
}

#[test]
fn solid_and_debug_streams_carry_face_materials_per_corner() {
    let mesh = nine_to_one();
    let renderable = convert_model(&mesh, 4, 5).unwrap();

    assert!(renderable.solid[0..3].iter().all(|v| v.material == 1));
    assert!(renderable.solid[3..6].iter().all(|v| v.material == 2));
    assert!(renderable.debug[0..3].iter().all(|v| v.material == 1));
    assert!(renderable.debug[3..6].iter().all(|v| v.material == 2));
}
