//! Asset loading: the fixed model table and the global material palette.

pub mod mesh;
pub mod obj;
pub mod sound;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::graphics::MAX_MATERIALS;
use mesh::{Material, MeshModel};

/// Identity of a loaded model: an index into the fixed model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Player,
    Column,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Player, ModelKind::Column];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            ModelKind::Player => 0,
            ModelKind::Column => 1,
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            ModelKind::Player => "player",
            ModelKind::Column => "column",
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Obj(#[from] obj::ObjError),
    #[error("{count} materials across all models; the palette holds at most {max}", max = MAX_MATERIALS - 1)]
    PaletteOverflow { count: usize },
}

/// Every mesh the demo uses, loaded once at startup, plus the merged
/// material palette (1-based global ids; slot 0 reserved).
pub struct ModelLibrary {
    meshes: Vec<MeshModel>,
    palette: Vec<Material>,
}

impl ModelLibrary {
    pub fn load(asset_root: &Path) -> Result<Self, AssetError> {
        let mut meshes = Vec::with_capacity(ModelKind::COUNT);
        let mut palette: Vec<Material> = Vec::new();

        for kind in ModelKind::ALL {
            let path = model_path(asset_root, kind);
            let next_id = palette.len() as u8 + 1;
            let mesh = obj::load_model(&path, next_id)?;

            let count = palette.len() + mesh.materials().len();
            if count + 1 > MAX_MATERIALS {
                return Err(AssetError::PaletteOverflow { count });
            }
            palette.extend_from_slice(mesh.materials());

            log::info!(
                "loaded {}: {} vertices, {} faces, {} materials",
                path.display(),
                mesh.vertices().len(),
                mesh.faces().len(),
                mesh.materials().len(),
            );
            meshes.push(mesh);
        }

        Ok(Self { meshes, palette })
    }

    pub fn mesh(&self, kind: ModelKind) -> &MeshModel {
        &self.meshes[kind.index()]
    }

    pub fn meshes(&self) -> &[MeshModel] {
        &self.meshes
    }

    pub fn palette(&self) -> &[Material] {
        &self.palette
    }
}

fn model_path(asset_root: &Path, kind: ModelKind) -> PathBuf {
    asset_root
        .join("models")
        .join(format!("{}.obj", kind.file_stem()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_follow_the_asset_layout() {
        let path = model_path(Path::new("assets"), ModelKind::Column);
        assert_eq!(path, Path::new("assets/models/column.obj"));
    }

    #[test]
    fn loads_the_shipped_models() {
        let library = ModelLibrary::load(Path::new("assets")).unwrap();

        assert_eq!(library.meshes().len(), ModelKind::COUNT);
        // One material per shipped model, ids assigned globally.
        assert_eq!(library.palette().len(), 2);
        assert_eq!(library.palette()[0].id, 1);
        assert_eq!(library.palette()[1].id, 2);
        assert_eq!(library.mesh(ModelKind::Player).faces().len(), 12);
        assert_eq!(library.mesh(ModelKind::Column).faces().len(), 28);
        assert!(
            library
                .mesh(ModelKind::Column)
                .faces()
                .iter()
                .all(|f| f.material == 2)
        );
    }
}
