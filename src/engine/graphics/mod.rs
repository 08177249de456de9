pub mod pipeline_descriptor_set_layouts;
pub mod primitives;
pub mod renderable;
pub mod renderer;
pub mod sampler;
pub mod vulkano_renderer;

#[cfg(test)]
mod conversion_tests;

pub use primitives::{DrawEntity, MAX_MATERIALS, Transform};
pub use renderable::{DotVertex, RenderableModel, SolidVertex, convert_model};
pub use renderer::Renderer;
pub use sampler::{Sample, sample_surface};
