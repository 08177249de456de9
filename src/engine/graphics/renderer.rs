//! Public renderer facade.
//!
//! Owns the converted models until a window exists, then hands everything
//! to the vulkano backend in one shot. GPU failures coming back from here
//! are fatal by design: the callers `.expect()` at the frame-loop boundary.

use std::path::Path;
use std::sync::Arc;

use winit::window::Window;

use crate::engine::assets::mesh::Material;
use crate::engine::graphics::renderable::RenderableModel;
use crate::engine::graphics::vulkano_renderer::VulkanoState;
use crate::engine::graphics::DrawEntity;

struct PendingUpload {
    models: Vec<RenderableModel>,
    palette: Vec<Material>,
}

pub struct Renderer {
    vulkano: Option<VulkanoState>,
    pending: Option<PendingUpload>,
    viewport: [u32; 2],
    debug_stream: bool,
}

impl Renderer {
    /// Takes ownership of the converted models; they are uploaded (and the
    /// CPU copies dropped) when the window appears.
    pub fn new(models: Vec<RenderableModel>, palette: Vec<Material>, viewport: [u32; 2]) -> Self {
        Self {
            vulkano: None,
            pending: Some(PendingUpload { models, palette }),
            viewport,
            debug_stream: false,
        }
    }

    pub fn init_for_window(
        &mut self,
        window: &Arc<Window>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.vulkano.is_some() {
            return Ok(());
        }
        let pending = self
            .pending
            .take()
            .ok_or("renderer was already initialized")?;
        self.vulkano = Some(VulkanoState::new(
            window.clone(),
            &pending.models,
            &pending.palette,
            self.viewport,
        )?);
        log::info!("renderer initialized: swapchain and both passes ready");
        Ok(())
    }

    pub fn draw_frame(&mut self, to_draw: &[DrawEntity]) -> Result<(), Box<dyn std::error::Error>> {
        let Some(vulkano) = self.vulkano.as_mut() else {
            return Err("renderer not initialized (call init_for_window first)".into());
        };
        vulkano.draw_frame(to_draw, self.debug_stream)
    }

    /// Switches pass 2 between the dot stream and the lit debug stream.
    pub fn toggle_debug_stream(&mut self) {
        self.debug_stream = !self.debug_stream;
        log::info!(
            "pass 2 now renders the {} stream",
            if self.debug_stream { "debug" } else { "dot" }
        );
    }

    pub fn capture_material_ids(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let Some(vulkano) = self.vulkano.as_mut() else {
            return Err("renderer not initialized (call init_for_window first)".into());
        };
        vulkano.capture_material_ids(path)
    }
}
