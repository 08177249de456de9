//! Collision-only physics facade over rapier3d.
//!
//! No dynamics: every body is kinematic and moved by the game, the world is
//! stepped only so the narrow phase keeps contact pairs current. One
//! collision shape is built per model at startup (the convex hull of the
//! mesh — the collision library generates no contacts between two concave
//! triangle meshes, and the demo's shapes are convex anyway).

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use thiserror::Error;

use crate::engine::assets::ModelKind;
use crate::engine::assets::mesh::MeshModel;
use crate::engine::graphics::Transform;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("collision shape for {kind:?} could not be built (degenerate hull?)")]
    InvalidCollisionShape { kind: ModelKind },
}

/// One placed body. Copyable so the game can keep it next to its entity.
#[derive(Debug, Clone, Copy)]
pub struct BodyHandle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

pub struct Physics {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    shapes: Vec<SharedShape>,

    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
}

impl Physics {
    /// Builds one collision shape per entry of the model table.
    pub fn new(meshes: &[MeshModel]) -> Result<Self, PhysicsError> {
        let mut shapes = Vec::with_capacity(meshes.len());
        for (kind, mesh) in ModelKind::ALL.iter().zip(meshes) {
            let points: Vec<Point<Real>> = mesh
                .vertices()
                .iter()
                .map(|v| point![v.x, v.y, v.z])
                .collect();
            let shape = SharedShape::convex_hull(&points)
                .ok_or(PhysicsError::InvalidCollisionShape { kind: *kind })?;
            shapes.push(shape);
        }

        Ok(Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            shapes,
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            // Collision queries only; nothing falls.
            gravity: vector![0.0, 0.0, 0.0],
        })
    }

    pub fn add_body(&mut self, kind: ModelKind, transform: &Transform) -> BodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .position(to_isometry(transform))
            .build();
        let body = self.bodies.insert(rigid_body);

        // Kinematic pairs generate no contacts by default.
        let collider = ColliderBuilder::new(self.shapes[kind.index()].clone())
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        BodyHandle { body, collider }
    }

    pub fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(
            handle.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn set_body_transform(&mut self, handle: BodyHandle, transform: &Transform) {
        if let Some(body) = self.bodies.get_mut(handle.body) {
            body.set_position(to_isometry(transform), true);
        }
    }

    pub fn body_transform(&self, handle: BodyHandle) -> Transform {
        match self.bodies.get(handle.body) {
            Some(body) => from_isometry(body.position()),
            None => Transform::IDENTITY,
        }
    }

    /// Refreshes broad/narrow phase state for the current body positions.
    pub fn update(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// True if the two bodies are currently touching (as of the last
    /// `update` call).
    pub fn in_contact(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.narrow_phase
            .contact_pair(a.collider, b.collider)
            .is_some_and(|pair| pair.has_any_active_contact)
    }
}

fn to_isometry(t: &Transform) -> Isometry3<Real> {
    Isometry3::from_parts(
        Translation3::new(t.position.x, t.position.y, t.position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(
            t.rotation.w,
            t.rotation.x,
            t.rotation.y,
            t.rotation.z,
        )),
    )
}

fn from_isometry(iso: &Isometry3<Real>) -> Transform {
    let t = iso.translation;
    let r = iso.rotation;
    Transform {
        position: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(r.i, r.j, r.k, r.w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::mesh::{Face, Material, MeshModel};

    fn unit_cube() -> MeshModel {
        let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        MeshModel::new(
            vec![Material {
                id: 1,
                diffuse: [1.0; 3],
                specular: [0.0; 3],
                shininess: 1.0,
            }],
            vec![
                v(-0.5, -0.5, -0.5),
                v(0.5, -0.5, -0.5),
                v(0.5, 0.5, -0.5),
                v(-0.5, 0.5, -0.5),
                v(-0.5, -0.5, 0.5),
                v(0.5, -0.5, 0.5),
                v(0.5, 0.5, 0.5),
                v(-0.5, 0.5, 0.5),
            ],
            vec![Vec3::Z],
            // Two faces are enough; the collision shape is the point hull.
            vec![
                Face {
                    material: 1,
                    vertices: [0, 1, 2],
                    normals: [0, 0, 0],
                },
                Face {
                    material: 1,
                    vertices: [4, 5, 6],
                    normals: [0, 0, 0],
                },
            ],
        )
        .unwrap()
    }

    fn two_body_world() -> (Physics, BodyHandle, BodyHandle) {
        let meshes = vec![unit_cube(), unit_cube()];
        let mut physics = Physics::new(&meshes).unwrap();
        let a = physics.add_body(ModelKind::Player, &Transform::IDENTITY);
        let b = physics.add_body(
            ModelKind::Column,
            &Transform::from_position(Vec3::new(3.0, 0.0, 0.0)),
        );
        (physics, a, b)
    }

    #[test]
    fn separated_bodies_do_not_touch() {
        let (mut physics, a, b) = two_body_world();
        physics.update(1.0 / 60.0);
        assert!(!physics.in_contact(a, b));
    }

    #[test]
    fn moving_a_body_into_another_registers_contact() {
        let (mut physics, a, b) = two_body_world();
        physics.set_body_transform(a, &Transform::from_position(Vec3::new(2.2, 0.0, 0.0)));
        physics.update(1.0 / 60.0);
        assert!(physics.in_contact(a, b));

        physics.set_body_transform(a, &Transform::IDENTITY);
        physics.update(1.0 / 60.0);
        assert!(!physics.in_contact(a, b));
    }

    #[test]
    fn removed_bodies_stop_colliding() {
        let (mut physics, a, b) = two_body_world();
        physics.set_body_transform(a, &Transform::from_position(Vec3::new(2.2, 0.0, 0.0)));
        physics.update(1.0 / 60.0);
        assert!(physics.in_contact(a, b));

        physics.remove_body(b);
        physics.update(1.0 / 60.0);
        assert!(!physics.in_contact(a, b));
    }

    #[test]
    fn body_transform_round_trips() {
        let (mut physics, a, _) = two_body_world();
        let placed = Transform {
            position: Vec3::new(0.5, -1.0, 2.0),
            rotation: Quat::from_rotation_y(0.7),
        };
        physics.set_body_transform(a, &placed);

        let back = physics.body_transform(a);
        assert!(back.position.abs_diff_eq(placed.position, 1e-5));
        assert!(back.rotation.abs_diff_eq(placed.rotation, 1e-5));
    }
}
