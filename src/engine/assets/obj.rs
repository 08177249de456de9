//! OBJ/MTL parsing facade.
//!
//! Thin wrapper over `tobj` that keeps positions and normals indexed
//! separately (`single_index: false`): faces carry one normal per corner,
//! and unifying the index streams would silently destroy that distinction.

use std::path::Path;

use glam::Vec3;
use thiserror::Error;

use super::mesh::{Face, Material, MeshError, MeshModel};

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("{path}: {source}")]
    Parse {
        path: String,
        source: tobj::LoadError,
    },
    #[error("{path}: material library could not be loaded: {source}")]
    Materials {
        path: String,
        source: tobj::LoadError,
    },
    #[error("{path}: model '{model}' has no per-corner normal indices")]
    MissingNormals { path: String, model: String },
    #[error("{path}: model '{model}' has no material assigned")]
    MissingMaterial { path: String, model: String },
    #[error("{path}: {source}")]
    Mesh {
        path: String,
        source: MeshError,
    },
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        // Keep separate position/normal index streams.
        single_index: false,
        ..Default::default()
    }
}

/// Loads one `.obj` (and its `mtllib`) into a validated `MeshModel`.
///
/// Material ids are assigned `first_material_id, first_material_id + 1, ...`
/// in MTL declaration order, so callers can lay the materials of several
/// models out in one global palette.
pub fn load_model(path: &Path, first_material_id: u8) -> Result<MeshModel, ObjError> {
    let label = path.display().to_string();

    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| ObjError::Parse {
            path: label.clone(),
            source,
        })?;
    let materials = materials.map_err(|source| ObjError::Materials {
        path: label.clone(),
        source,
    })?;

    from_tobj(&label, &models, &materials, first_material_id)
}

fn from_tobj(
    label: &str,
    models: &[tobj::Model],
    materials: &[tobj::Material],
    first_material_id: u8,
) -> Result<MeshModel, ObjError> {
    let mesh_err = |source| ObjError::Mesh {
        path: label.to_string(),
        source,
    };

    let mut vertices: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for model in models {
        let mesh = &model.mesh;
        if mesh.normals.is_empty() || mesh.normal_indices.is_empty() {
            return Err(ObjError::MissingNormals {
                path: label.to_string(),
                model: model.name.clone(),
            });
        }
        let Some(local_material) = mesh.material_id else {
            return Err(ObjError::MissingMaterial {
                path: label.to_string(),
                model: model.name.clone(),
            });
        };
        // Saturate instead of wrapping; anything this large is rejected by
        // MeshModel validation against the palette slot count.
        let material = u8::try_from(usize::from(first_material_id) + local_material)
            .unwrap_or(u8::MAX);

        let vertex_base = vertices.len();
        let normal_base = normals.len();
        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        normals.extend(
            mesh.normals
                .chunks_exact(3)
                .map(|n| Vec3::new(n[0], n[1], n[2])),
        );
        if vertices.len() > 256 {
            return Err(mesh_err(MeshError::TooManyVertices(vertices.len())));
        }
        if normals.len() > 256 {
            return Err(mesh_err(MeshError::TooManyNormals(normals.len())));
        }

        for (pos, nrm) in mesh
            .indices
            .chunks_exact(3)
            .zip(mesh.normal_indices.chunks_exact(3))
        {
            let v = |k: usize| (vertex_base + pos[k] as usize) as u8;
            let n = |k: usize| (normal_base + nrm[k] as usize) as u8;
            faces.push(Face {
                material,
                vertices: [v(0), v(1), v(2)],
                normals: [n(0), n(1), n(2)],
            });
        }
    }

    let materials = materials
        .iter()
        .enumerate()
        .map(|(i, m)| Material {
            id: u8::try_from(usize::from(first_material_id) + i).unwrap_or(u8::MAX),
            diffuse: m.diffuse.unwrap_or([0.8, 0.8, 0.8]),
            specular: m.specular.unwrap_or([0.0, 0.0, 0.0]),
            shininess: m.shininess.unwrap_or(0.0),
        })
        .collect();

    MeshModel::new(materials, vertices, normals, faces).map_err(mesh_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const OBJ: &str = "\
mtllib test.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
usemtl red
f 1//1 2//1 3//1
";

    const MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
Ks 0.5 0.5 0.5
Ns 8.0
";

    fn parse(first_material_id: u8) -> Result<MeshModel, ObjError> {
        let (models, materials) = tobj::load_obj_buf(
            &mut Cursor::new(OBJ.as_bytes()),
            &load_options(),
            |_| tobj::load_mtl_buf(&mut Cursor::new(MTL.as_bytes())),
        )
        .unwrap();
        let materials = materials.unwrap();
        from_tobj("test.obj", &models, &materials, first_material_id)
    }

    #[test]
    fn parses_triangle_with_corner_normals() {
        let mesh = parse(1).unwrap();
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.normals().len(), 1);
        assert_eq!(mesh.faces().len(), 1);

        let face = &mesh.faces()[0];
        assert_eq!(face.vertices, [0, 1, 2]);
        assert_eq!(face.normals, [0, 0, 0]);
        assert_eq!(face.material, 1);
    }

    #[test]
    fn material_ids_start_at_the_requested_base() {
        let mesh = parse(2).unwrap();
        assert_eq!(mesh.materials()[0].id, 2);
        assert_eq!(mesh.faces()[0].material, 2);
        assert_eq!(mesh.materials()[0].diffuse, [1.0, 0.0, 0.0]);
    }
}
