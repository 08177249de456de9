//! Immutable in-memory mesh model.
//!
//! This is the hand-off format between the OBJ parser and the renderable
//! conversion step: materials, positions, normals, and faces referencing
//! them by index. A `MeshModel` is validated once on construction and never
//! mutated afterwards.

use glam::Vec3;
use thiserror::Error;

use crate::engine::graphics::MAX_MATERIALS;

/// One triangle. Corner indices are `u8` on purpose: per-mesh vertex and
/// normal counts are bounded to 256 in this design (a scale limit, not an
/// accident to lift silently).
///
/// Normals are indexed separately from positions: one normal per *corner*,
/// so a vertex shared by a flat face and a smooth face can carry a
/// different normal on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Global material id (1-based; 0 is reserved).
    pub material: u8,
    pub vertices: [u8; 3],
    pub normals: [u8; 3],
}

/// Surface material as parsed from the MTL file, tagged with its global id.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Externally assigned 1-based id; 0 is reserved and never used.
    pub id: u8,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh has no faces")]
    Empty,
    #[error("mesh has {0} vertices; at most 256 are supported")]
    TooManyVertices(usize),
    #[error("mesh has {0} normals; at most 256 are supported")]
    TooManyNormals(usize),
    #[error("face {face} references vertex {index}, but the mesh has {len} vertices")]
    VertexIndexOutOfRange { face: usize, index: u8, len: usize },
    #[error("face {face} references normal {index}, but the mesh has {len} normals")]
    NormalIndexOutOfRange { face: usize, index: u8, len: usize },
    #[error("face {face} uses material id {id}; ids must be 1..{max} and present in the mesh", max = MAX_MATERIALS)]
    BadMaterialId { face: usize, id: u8 },
    #[error("mesh has zero total surface area")]
    DegenerateSurface,
}

#[derive(Debug, Clone)]
pub struct MeshModel {
    materials: Vec<Material>,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    faces: Vec<Face>,
}

impl MeshModel {
    /// Validates every cross-reference once. The result is immutable, so
    /// downstream code can index without re-checking.
    pub fn new(
        materials: Vec<Material>,
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        faces: Vec<Face>,
    ) -> Result<Self, MeshError> {
        if faces.is_empty() {
            return Err(MeshError::Empty);
        }
        if vertices.len() > 256 {
            return Err(MeshError::TooManyVertices(vertices.len()));
        }
        if normals.len() > 256 {
            return Err(MeshError::TooManyNormals(normals.len()));
        }

        for (i, face) in faces.iter().enumerate() {
            for &v in &face.vertices {
                if usize::from(v) >= vertices.len() {
                    return Err(MeshError::VertexIndexOutOfRange {
                        face: i,
                        index: v,
                        len: vertices.len(),
                    });
                }
            }
            for &n in &face.normals {
                if usize::from(n) >= normals.len() {
                    return Err(MeshError::NormalIndexOutOfRange {
                        face: i,
                        index: n,
                        len: normals.len(),
                    });
                }
            }

            let id_ok = face.material >= 1
                && usize::from(face.material) < MAX_MATERIALS
                && materials.iter().any(|m| m.id == face.material);
            if !id_ok {
                return Err(MeshError::BadMaterialId {
                    face: i,
                    id: face.material,
                });
            }
        }

        Ok(Self {
            materials,
            vertices,
            normals,
            faces,
        })
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Corner positions of a validated face.
    pub fn face_positions(&self, face: &Face) -> [Vec3; 3] {
        [
            self.vertices[usize::from(face.vertices[0])],
            self.vertices[usize::from(face.vertices[1])],
            self.vertices[usize::from(face.vertices[2])],
        ]
    }

    /// Corner normals of a validated face.
    pub fn face_normals(&self, face: &Face) -> [Vec3; 3] {
        [
            self.normals[usize::from(face.normals[0])],
            self.normals[usize::from(face.normals[1])],
            self.normals[usize::from(face.normals[2])],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(id: u8) -> Material {
        Material {
            id,
            diffuse: [1.0, 1.0, 0.0],
            specular: [1.0, 1.0, 1.0],
            shininess: 32.0,
        }
    }

    fn triangle_mesh() -> MeshModel {
        MeshModel::new(
            vec![material(1)],
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
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

    #[test]
    fn valid_mesh_passes_validation() {
        let mesh = triangle_mesh();
        assert_eq!(mesh.faces().len(), 1);
        assert_eq!(mesh.face_positions(&mesh.faces()[0])[1], Vec3::X);
    }

    #[test]
    fn vertex_index_out_of_range_is_rejected() {
        let err = MeshModel::new(
            vec![material(1)],
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z],
            vec![Face {
                material: 1,
                vertices: [0, 1, 3],
                normals: [0, 0, 0],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::VertexIndexOutOfRange { index: 3, .. }));
    }

    #[test]
    fn normal_index_out_of_range_is_rejected() {
        let err = MeshModel::new(
            vec![material(1)],
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z],
            vec![Face {
                material: 1,
                vertices: [0, 1, 2],
                normals: [0, 1, 0],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::NormalIndexOutOfRange { index: 1, .. }));
    }

    #[test]
    fn material_id_zero_is_reserved() {
        let err = MeshModel::new(
            vec![material(0)],
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z],
            vec![Face {
                material: 0,
                vertices: [0, 1, 2],
                normals: [0, 0, 0],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::BadMaterialId { id: 0, .. }));
    }

    #[test]
    fn material_id_beyond_slot_count_is_rejected() {
        let id = MAX_MATERIALS as u8;
        let err = MeshModel::new(
            vec![material(id)],
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z],
            vec![Face {
                material: id,
                vertices: [0, 1, 2],
                normals: [0, 0, 0],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::BadMaterialId { .. }));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let err = MeshModel::new(vec![material(1)], vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, MeshError::Empty));
    }
}
