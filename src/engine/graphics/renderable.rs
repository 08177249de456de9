//! Conversion of a mesh model into GPU-ready vertex streams.
//!
//! A `RenderableModel` owns three independent streams; each record layout is
//! a binary contract with the shader it feeds (stride and field offsets are
//! declared explicitly on the pipeline's vertex-input state, see the
//! renderer backend).

use vulkano::buffer::BufferContents;

use crate::engine::assets::mesh::{MeshError, MeshModel};
use crate::engine::graphics::sampler::sample_surface;

/// Pass-1 record for `solid.vert`: position at offset 0 (3 x f32),
/// material id at offset 12 (1 x u32). Stride 16.
#[derive(BufferContents, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct SolidVertex {
    pub position: [f32; 3],
    pub material: u32,
}

/// Pass-2 and debug record for `dot.vert` / `debug.vert`: position at 0,
/// normal at 12, material id at 24. Stride 28.
#[derive(BufferContents, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct DotVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub material: u32,
}

/// The three uploaded-as-is vertex streams of one model. Built once per
/// mesh at load time; immutable afterwards.
pub struct RenderableModel {
    /// Flat triangles, 3 entries per face.
    pub solid: Vec<SolidVertex>,
    /// Surface samples, `dot_target` entries.
    pub dots: Vec<DotVertex>,
    /// Triangles with true per-corner normals, 3 entries per face.
    pub debug: Vec<DotVertex>,
}

/// Converts a mesh into its renderable form. The three streams share no
/// state; only the dot stream consumes randomness (seeded here, so the
/// result is deterministic per (mesh, dot_target, seed)).
pub fn convert_model(
    mesh: &MeshModel,
    dot_target: u32,
    seed: u64,
) -> Result<RenderableModel, MeshError> {
    Ok(RenderableModel {
        solid: solid_stream(mesh),
        dots: dot_stream(mesh, dot_target, seed)?,
        debug: debug_stream(mesh),
    })
}

fn solid_stream(mesh: &MeshModel) -> Vec<SolidVertex> {
    let mut out = Vec::with_capacity(mesh.faces().len() * 3);
    for face in mesh.faces() {
        let material = u32::from(face.material);
        for corner in mesh.face_positions(face) {
            out.push(SolidVertex {
                position: corner.to_array(),
                material,
            });
        }
    }
    out
}

fn dot_stream(mesh: &MeshModel, dot_target: u32, seed: u64) -> Result<Vec<DotVertex>, MeshError> {
    let samples = sample_surface(mesh, dot_target, seed)?;
    Ok(samples
        .into_iter()
        .map(|s| DotVertex {
            position: s.position.to_array(),
            normal: s.normal.to_array(),
            material: u32::from(s.material),
        })
        .collect())
}

fn debug_stream(mesh: &MeshModel) -> Vec<DotVertex> {
    let mut out = Vec::with_capacity(mesh.faces().len() * 3);
    for face in mesh.faces() {
        let material = u32::from(face.material);
        let positions = mesh.face_positions(face);
        let normals = mesh.face_normals(face);
        for corner in 0..3 {
            out.push(DotVertex {
                position: positions[corner].to_array(),
                normal: normals[corner].to_array(),
                material,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layouts_match_the_shader_contract() {
        assert_eq!(std::mem::size_of::<SolidVertex>(), 16);
        assert_eq!(std::mem::size_of::<DotVertex>(), 28);
        assert_eq!(std::mem::offset_of!(SolidVertex, material), 12);
        assert_eq!(std::mem::offset_of!(DotVertex, normal), 12);
        assert_eq!(std::mem::offset_of!(DotVertex, material), 24);
    }
}
