//! Vulkano backend: GPU resources and the two-pass frame compositor.
//!
//! Pass 1 draws every entity's solid stream, depth-tested, into a fixed
//! size offscreen `R32_UINT` target; what it holds afterwards is a
//! material-id image, not a lit picture. Pass 2 draws every entity's dot
//! stream as alpha-blended points to the swapchain, sampling that image to
//! hide dots covered by other geometry. Both passes run on one thread in
//! program order, so the write-then-read hazard on the offscreen image is
//! resolved by command order alone.

use std::mem::size_of;
use std::path::Path;
use std::sync::Arc;

use vulkano::buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer};
use vulkano::command_buffer::{
    AutoCommandBufferBuilder, CommandBufferUsage, CopyBufferInfo, CopyImageToBufferInfo,
    PrimaryCommandBufferAbstract, RenderPassBeginInfo, SubpassBeginInfo, SubpassEndInfo,
    allocator::StandardCommandBufferAllocator,
};
use vulkano::descriptor_set::allocator::StandardDescriptorSetAllocator;
use vulkano::descriptor_set::{DescriptorSet, WriteDescriptorSet};
use vulkano::format::{ClearValue, Format};
use vulkano::image::sampler::{Sampler, SamplerCreateInfo};
use vulkano::image::view::ImageView;
use vulkano::image::{Image, ImageCreateInfo, ImageType, ImageUsage};
use vulkano::memory::allocator::{
    AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator,
};
use vulkano::pipeline::graphics::GraphicsPipelineCreateInfo;
use vulkano::pipeline::graphics::color_blend::{
    AttachmentBlend, BlendFactor, BlendOp, ColorBlendAttachmentState, ColorBlendState,
    ColorComponents,
};
use vulkano::pipeline::graphics::depth_stencil::{DepthState, DepthStencilState};
use vulkano::pipeline::graphics::input_assembly::{InputAssemblyState, PrimitiveTopology};
use vulkano::pipeline::graphics::multisample::MultisampleState;
use vulkano::pipeline::graphics::rasterization::RasterizationState;
use vulkano::pipeline::graphics::subpass::PipelineSubpassType;
use vulkano::pipeline::graphics::vertex_input::{
    VertexInputAttributeDescription, VertexInputBindingDescription, VertexInputRate,
    VertexInputState,
};
use vulkano::pipeline::graphics::viewport::{Scissor, Viewport, ViewportState};
use vulkano::pipeline::layout::{PipelineLayout, PipelineLayoutCreateInfo};
use vulkano::pipeline::{
    DynamicState, GraphicsPipeline, Pipeline, PipelineBindPoint, PipelineShaderStageCreateInfo,
};
use vulkano::render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass};
use vulkano::shader::EntryPoint;
use vulkano::swapchain::{self, Surface, Swapchain, SwapchainCreateInfo, SwapchainPresentInfo};
use vulkano::sync::{self, GpuFuture};
use vulkano::{DeviceSize, Validated, VulkanError};
use vulkano_util::context::{VulkanoConfig, VulkanoContext};
use winit::window::Window;

use crate::engine::assets::mesh::Material;
use crate::engine::camera::Camera;
use crate::engine::graphics::pipeline_descriptor_set_layouts::PipelineDescriptorSetLayouts;
use crate::engine::graphics::renderable::{DotVertex, RenderableModel, SolidVertex};
use crate::engine::graphics::{DrawEntity, MAX_MATERIALS};

mod solid_vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "assets/shaders/solid.vert",
    }
}

mod solid_fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "assets/shaders/solid.frag",
    }
}

mod dot_vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "assets/shaders/dot.vert",
    }
}

mod dot_fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "assets/shaders/dot.frag",
    }
}

mod debug_vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "assets/shaders/debug.vert",
    }
}

mod debug_fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "assets/shaders/debug.frag",
    }
}

/// Set 0, binding 0. Layout must match the `FrameData` block in the
/// vertex shaders (two std140 mat4s).
#[derive(BufferContents, Clone, Copy, Debug, Default)]
#[repr(C, align(16))]
struct FrameUbo {
    model: [[f32; 4]; 4],
    transform: [[f32; 4]; 4],
}

/// One palette slot: diffuse rgb + 1, specular rgb + shininess in w.
#[derive(BufferContents, Clone, Copy, Debug, Default)]
#[repr(C)]
struct GpuMaterial {
    diffuse: [f32; 4],
    specular: [f32; 4],
}

/// Set 1, binding 0: the fixed materials array. Slot 0 stays zeroed
/// (ids are 1-based).
#[derive(BufferContents, Clone, Copy, Debug)]
#[repr(C, align(16))]
struct PaletteUbo {
    materials: [GpuMaterial; MAX_MATERIALS],
}

impl Default for PaletteUbo {
    fn default() -> Self {
        Self {
            materials: [GpuMaterial::default(); MAX_MATERIALS],
        }
    }
}

impl PaletteUbo {
    fn from_materials(palette: &[Material]) -> Self {
        let mut ubo = Self::default();
        for m in palette {
            // Ids are validated against MAX_MATERIALS at load time.
            ubo.materials[usize::from(m.id)] = GpuMaterial {
                diffuse: [m.diffuse[0], m.diffuse[1], m.diffuse[2], 1.0],
                specular: [m.specular[0], m.specular[1], m.specular[2], m.shininess],
            };
        }
        ubo
    }
}

/// Device-local copies of one model's three vertex streams.
struct GpuModel {
    solid: Subbuffer<[SolidVertex]>,
    dots: Subbuffer<[DotVertex]>,
    debug: Subbuffer<[DotVertex]>,
}

pub struct VulkanoState {
    context: VulkanoContext,
    window: Arc<Window>,
    #[allow(dead_code)]
    surface: Arc<Surface>,
    swapchain: Arc<Swapchain>,
    screen_framebuffers: Vec<Arc<Framebuffer>>,
    screen_pass: Arc<RenderPass>,

    material_image: Arc<Image>,
    offscreen_framebuffer: Arc<Framebuffer>,

    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
    set_layouts: PipelineDescriptorSetLayouts,

    pipeline_solid: Arc<GraphicsPipeline>,
    pipeline_dot: Arc<GraphicsPipeline>,
    pipeline_debug: Arc<GraphicsPipeline>,
    palette_set: Arc<DescriptorSet>,

    models: Vec<GpuModel>,
    camera: Camera,
    viewport_extent: [u32; 2],

    recreate_swapchain: bool,
    previous_frame_end: Option<Box<dyn GpuFuture>>,
}

impl VulkanoState {
    pub fn new(
        window: Arc<Window>,
        models: &[RenderableModel],
        palette: &[Material],
        viewport_extent: [u32; 2],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let context = VulkanoContext::new(VulkanoConfig::default());
        let device = context.device().clone();

        let surface = Surface::from_window(device.instance().clone(), window.clone())?;

        let surface_capabilities = device
            .physical_device()
            .surface_capabilities(&surface, Default::default())?;
        let image_format = device
            .physical_device()
            .surface_formats(&surface, Default::default())?
            .first()
            .ok_or("no supported surface formats")?
            .0;

        let mut min_image_count = 2u32.max(surface_capabilities.min_image_count);
        if let Some(max_image_count) = surface_capabilities.max_image_count {
            min_image_count = min_image_count.min(max_image_count);
        }

        let (swapchain, images) = Swapchain::new(
            device.clone(),
            surface.clone(),
            SwapchainCreateInfo {
                min_image_count,
                image_format,
                image_extent: window.inner_size().into(),
                image_usage: ImageUsage::COLOR_ATTACHMENT,
                composite_alpha: surface_capabilities
                    .supported_composite_alpha
                    .into_iter()
                    .next()
                    .ok_or("no supported composite alpha")?,
                ..Default::default()
            },
        )?;

        let swapchain_views = images
            .into_iter()
            .map(|image| ImageView::new_default(image).map_err(|e| e.into()))
            .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

        // Pass 1 target: material ids + a private depth attachment. Depth
        // never leaves this pass.
        let offscreen_pass = vulkano::single_pass_renderpass!(
            device.clone(),
            attachments: {
                material_ids: {
                    format: Format::R32_UINT,
                    samples: 1,
                    load_op: Clear,
                    store_op: Store,
                },
                depth: {
                    format: Format::D16_UNORM,
                    samples: 1,
                    load_op: Clear,
                    store_op: DontCare,
                },
            },
            pass: {
                color: [material_ids],
                depth_stencil: {depth},
            }
        )?;

        // Pass 2 target: the swapchain image, color only. Pass-1 depth is
        // intentionally not reused here.
        let screen_pass = vulkano::single_pass_renderpass!(
            device.clone(),
            attachments: {
                color: {
                    format: swapchain.image_format(),
                    samples: 1,
                    load_op: Clear,
                    store_op: Store,
                },
            },
            pass: {
                color: [color],
                depth_stencil: {},
            }
        )?;

        let material_image = Image::new(
            context.memory_allocator().clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: Format::R32_UINT,
                extent: [viewport_extent[0], viewport_extent[1], 1],
                usage: ImageUsage::COLOR_ATTACHMENT
                    | ImageUsage::SAMPLED
                    | ImageUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
                ..Default::default()
            },
        )?;
        let material_view = ImageView::new_default(material_image.clone())?;

        let depth_image = Image::new(
            context.memory_allocator().clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: Format::D16_UNORM,
                extent: [viewport_extent[0], viewport_extent[1], 1],
                usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
                ..Default::default()
            },
        )?;
        let depth_view = ImageView::new_default(depth_image)?;

        let offscreen_framebuffer = Framebuffer::new(
            offscreen_pass.clone(),
            FramebufferCreateInfo {
                attachments: vec![material_view.clone(), depth_view],
                ..Default::default()
            },
        )?;

        let screen_framebuffers = swapchain_views
            .iter()
            .map(|view| {
                Framebuffer::new(
                    screen_pass.clone(),
                    FramebufferCreateInfo {
                        attachments: vec![view.clone()],
                        ..Default::default()
                    },
                )
                .map_err(|e| e.into())
            })
            .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

        let set_layouts = PipelineDescriptorSetLayouts::new(device.clone())?;

        let solid_layout = PipelineLayout::new(
            device.clone(),
            PipelineLayoutCreateInfo {
                set_layouts: vec![set_layouts.frame.clone()],
                ..Default::default()
            },
        )?;
        let sprite_layout = PipelineLayout::new(
            device.clone(),
            PipelineLayoutCreateInfo {
                set_layouts: vec![set_layouts.frame.clone(), set_layouts.palette.clone()],
                ..Default::default()
            },
        )?;

        // Entry points that are missing, or whose interfaces no longer match
        // the layouts above, fail pipeline creation: that is the fatal
        // CPU/shader contract-mismatch case, not something to recover from.
        let solid_vs = entry_point(solid_vs::load(device.clone())?, "solid.vert")?;
        let solid_fs = entry_point(solid_fs::load(device.clone())?, "solid.frag")?;
        let dot_vs = entry_point(dot_vs::load(device.clone())?, "dot.vert")?;
        let dot_fs = entry_point(dot_fs::load(device.clone())?, "dot.frag")?;
        let debug_vs = entry_point(debug_vs::load(device.clone())?, "debug.vert")?;
        let debug_fs = entry_point(debug_fs::load(device.clone())?, "debug.frag")?;

        let offscreen_subpass =
            Subpass::from(offscreen_pass.clone(), 0).ok_or("missing offscreen subpass 0")?;
        let screen_subpass =
            Subpass::from(screen_pass.clone(), 0).ok_or("missing screen subpass 0")?;

        // Depth testing lives only in the pass-1 pipeline; point topology
        // and alpha blending only in the pass-2 pipeline. Nothing is ever
        // "left enabled".
        let pipeline_solid = create_pipeline(
            &device,
            solid_vs,
            solid_fs,
            solid_vertex_input(),
            solid_layout,
            offscreen_subpass,
            PrimitiveTopology::TriangleList,
            true,
            false,
        )?;
        let pipeline_dot = create_pipeline(
            &device,
            dot_vs,
            dot_fs,
            dot_vertex_input(),
            sprite_layout.clone(),
            screen_subpass.clone(),
            PrimitiveTopology::PointList,
            false,
            true,
        )?;
        let pipeline_debug = create_pipeline(
            &device,
            debug_vs,
            debug_fs,
            dot_vertex_input(),
            sprite_layout,
            screen_subpass,
            PrimitiveTopology::TriangleList,
            false,
            true,
        )?;

        let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            Default::default(),
        ));
        let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
            device.clone(),
            Default::default(),
        ));

        // Nearest sampling: interpolated material ids would be nonsense.
        let sampler = Sampler::new(device.clone(), SamplerCreateInfo::default())?;

        let palette_buffer: Subbuffer<PaletteUbo> = Buffer::from_data(
            context.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::UNIFORM_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            PaletteUbo::from_materials(palette),
        )?;

        let palette_set = DescriptorSet::new(
            descriptor_set_allocator.clone(),
            set_layouts.palette.clone(),
            [
                WriteDescriptorSet::buffer(0, palette_buffer),
                WriteDescriptorSet::image_view_sampler(1, material_view, sampler),
            ],
            [],
        )?;

        let gpu_models = upload_models(
            &context,
            &command_buffer_allocator,
            models,
        )?;
        log::info!(
            "uploaded {} models ({} materials in palette)",
            gpu_models.len(),
            palette.len()
        );

        Ok(Self {
            context,
            window,
            surface,
            swapchain,
            screen_framebuffers,
            screen_pass,
            material_image,
            offscreen_framebuffer,
            command_buffer_allocator,
            descriptor_set_allocator,
            set_layouts,
            pipeline_solid,
            pipeline_dot,
            pipeline_debug,
            palette_set,
            models: gpu_models,
            camera: Camera::new(viewport_extent),
            viewport_extent,
            recreate_swapchain: false,
            previous_frame_end: Some(sync::now(device).boxed()),
        })
    }

    /// The window is not resizable, but the driver can still invalidate the
    /// swapchain (e.g. on display changes).
    fn recreate_swapchain_if_needed(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.recreate_swapchain {
            return Ok(());
        }
        self.recreate_swapchain = false;

        let (new_swapchain, new_images) = self.swapchain.recreate(SwapchainCreateInfo {
            image_extent: self.window.inner_size().into(),
            ..self.swapchain.create_info()
        })?;

        self.swapchain = new_swapchain;
        self.screen_framebuffers = new_images
            .into_iter()
            .map(|image| {
                let view = ImageView::new_default(image)?;
                Framebuffer::new(
                    self.screen_pass.clone(),
                    FramebufferCreateInfo {
                        attachments: vec![view],
                        ..Default::default()
                    },
                )
                .map_err(|e| -> Box<dyn std::error::Error> { e.into() })
            })
            .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;
        Ok(())
    }

    /// Renders one frame: pass 1 (offscreen), pass 2 (screen), present.
    pub fn draw_frame(
        &mut self,
        to_draw: &[DrawEntity],
        use_debug_stream: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.recreate_swapchain_if_needed()?;

        let device = self.context.device().clone();
        let queue = self.context.graphics_queue().clone();

        if let Some(previous_frame_end) = self.previous_frame_end.as_mut() {
            previous_frame_end.cleanup_finished();
        }

        let (image_i, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None)
                .map_err(Validated::unwrap)
            {
                Ok(r) => r,
                Err(VulkanError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    return Ok(());
                }
                Err(e) => return Err(Box::new(e)),
            };
        if suboptimal {
            self.recreate_swapchain = true;
        }

        // Per-entity matrices, fresh every frame: the transforms may have
        // changed since the last one.
        let mut prepared = Vec::with_capacity(to_draw.len());
        for entity in to_draw {
            let matrices = self.camera.frame_matrices(&entity.transform);
            let frame_buffer: Subbuffer<FrameUbo> = Buffer::from_data(
                self.context.memory_allocator().clone(),
                BufferCreateInfo {
                    usage: BufferUsage::UNIFORM_BUFFER,
                    ..Default::default()
                },
                AllocationCreateInfo {
                    memory_type_filter: MemoryTypeFilter::PREFER_HOST
                        | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                    ..Default::default()
                },
                FrameUbo {
                    model: matrices.model.to_cols_array_2d(),
                    transform: matrices.total.to_cols_array_2d(),
                },
            )?;
            let frame_set = DescriptorSet::new(
                self.descriptor_set_allocator.clone(),
                self.set_layouts.frame.clone(),
                [WriteDescriptorSet::buffer(0, frame_buffer)],
                [],
            )?;
            prepared.push((entity.model.index(), frame_set));
        }

        let viewport = Viewport {
            offset: [0.0, 0.0],
            extent: [
                self.viewport_extent[0] as f32,
                self.viewport_extent[1] as f32,
            ],
            depth_range: 0.0..=1.0,
            ..Default::default()
        };
        let scissor = Scissor {
            offset: [0, 0],
            extent: self.viewport_extent,
            ..Default::default()
        };

        let mut cbb = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;

        // ---- Pass 1: solid streams into the material-id target. ----
        let mut pass1_begin = RenderPassBeginInfo::framebuffer(self.offscreen_framebuffer.clone());
        pass1_begin.clear_values = vec![
            Some(ClearValue::Uint([0, 0, 0, 0])),
            Some(ClearValue::Depth(1.0)),
        ];
        cbb.begin_render_pass(pass1_begin, SubpassBeginInfo::default())?;
        cbb.set_viewport(0, vec![viewport.clone()].into())?;
        cbb.set_scissor(0, vec![scissor.clone()].into())?;
        cbb.bind_pipeline_graphics(self.pipeline_solid.clone())?;

        for (model_index, frame_set) in &prepared {
            let model = &self.models[*model_index];
            cbb.bind_descriptor_sets(
                PipelineBindPoint::Graphics,
                self.pipeline_solid.layout().clone(),
                0,
                frame_set.clone(),
            )?;
            cbb.bind_vertex_buffers(0, model.solid.clone())?;
            unsafe {
                cbb.draw(model.solid.len() as u32, 1, 0, 0)?;
            }
        }
        cbb.end_render_pass(SubpassEndInfo::default())?;

        // ---- Pass 2: dot (or debug) streams onto the screen. ----
        let mut pass2_begin = RenderPassBeginInfo::framebuffer(
            self.screen_framebuffers[image_i as usize].clone(),
        );
        pass2_begin.clear_values = vec![Some(ClearValue::from([0.0f32, 0.0, 0.1, 1.0]))];
        cbb.begin_render_pass(pass2_begin, SubpassBeginInfo::default())?;
        cbb.set_viewport(0, vec![viewport].into())?;
        cbb.set_scissor(0, vec![scissor].into())?;

        let pipeline = if use_debug_stream {
            self.pipeline_debug.clone()
        } else {
            self.pipeline_dot.clone()
        };
        cbb.bind_pipeline_graphics(pipeline.clone())?;

        for (model_index, frame_set) in &prepared {
            let model = &self.models[*model_index];
            cbb.bind_descriptor_sets(
                PipelineBindPoint::Graphics,
                pipeline.layout().clone(),
                0,
                (frame_set.clone(), self.palette_set.clone()),
            )?;
            let stream = if use_debug_stream {
                &model.debug
            } else {
                &model.dots
            };
            cbb.bind_vertex_buffers(0, stream.clone())?;
            unsafe {
                cbb.draw(stream.len() as u32, 1, 0, 0)?;
            }
        }
        cbb.end_render_pass(SubpassEndInfo::default())?;

        let cb = cbb.build()?;

        let start_future: Box<dyn GpuFuture> = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(device.clone()).boxed());

        let execution = start_future
            .join(acquire_future)
            .then_execute(queue.clone(), cb)?
            .then_swapchain_present(
                queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), image_i),
            )
            .then_signal_fence_and_flush();

        match execution.map_err(Validated::unwrap) {
            Ok(future) => {
                self.previous_frame_end = Some(future.boxed());
            }
            Err(VulkanError::OutOfDate) => {
                self.recreate_swapchain = true;
                self.previous_frame_end = Some(sync::now(device).boxed());
            }
            Err(e) => return Err(Box::new(e)),
        }

        Ok(())
    }

    /// Copies the pass-1 material-id image back to the host and writes it
    /// as a grayscale PNG. Diagnostic path, not part of the frame loop.
    pub fn capture_material_ids(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let device = self.context.device().clone();
        let queue = self.context.graphics_queue().clone();

        // Finish any in-flight frame before reading its output.
        if let Some(previous) = self.previous_frame_end.take() {
            previous.then_signal_fence_and_flush()?.wait(None)?;
        }
        self.previous_frame_end = Some(sync::now(device).boxed());

        let [width, height] = self.viewport_extent;
        let readback: Subbuffer<[u32]> = Buffer::new_slice(
            self.context.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_DST,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST
                    | MemoryTypeFilter::HOST_RANDOM_ACCESS,
                ..Default::default()
            },
            DeviceSize::from(width) * DeviceSize::from(height),
        )?;

        let mut cbb = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;
        cbb.copy_image_to_buffer(CopyImageToBufferInfo::image_buffer(
            self.material_image.clone(),
            readback.clone(),
        ))?;
        let cb = cbb.build()?;
        cb.execute(queue)?
            .then_signal_fence_and_flush()?
            .wait(None)?;

        let ids = readback.read()?;
        // Spread the small id range over the gray scale so the image is
        // readable by eye.
        let pixels: Vec<u8> = ids.iter().map(|&id| (id as u8).saturating_mul(40)).collect();
        image::save_buffer(path, &pixels, width, height, image::ExtendedColorType::L8)?;

        log::info!("wrote material-id capture to {}", path.display());
        Ok(())
    }
}

fn entry_point(
    module: Arc<vulkano::shader::ShaderModule>,
    name: &str,
) -> Result<EntryPoint, Box<dyn std::error::Error>> {
    module
        .entry_point("main")
        .ok_or_else(|| format!("missing entry point in {name}").into())
}

/// Explicit layout for `SolidVertex`; must agree with the struct and with
/// `solid.vert`.
fn solid_vertex_input() -> VertexInputState {
    VertexInputState::new()
        .binding(
            0,
            VertexInputBindingDescription {
                stride: size_of::<SolidVertex>() as u32,
                input_rate: VertexInputRate::Vertex,
                ..Default::default()
            },
        )
        .attribute(
            0,
            VertexInputAttributeDescription {
                binding: 0,
                format: Format::R32G32B32_SFLOAT,
                offset: 0,
                ..Default::default()
            },
        )
        .attribute(
            1,
            VertexInputAttributeDescription {
                binding: 0,
                format: Format::R32_UINT,
                offset: 12,
                ..Default::default()
            },
        )
}

/// Explicit layout for `DotVertex`; shared by the dot and debug pipelines.
fn dot_vertex_input() -> VertexInputState {
    VertexInputState::new()
        .binding(
            0,
            VertexInputBindingDescription {
                stride: size_of::<DotVertex>() as u32,
                input_rate: VertexInputRate::Vertex,
                ..Default::default()
            },
        )
        .attribute(
            0,
            VertexInputAttributeDescription {
                binding: 0,
                format: Format::R32G32B32_SFLOAT,
                offset: 0,
                ..Default::default()
            },
        )
        .attribute(
            1,
            VertexInputAttributeDescription {
                binding: 0,
                format: Format::R32G32B32_SFLOAT,
                offset: 12,
                ..Default::default()
            },
        )
        .attribute(
            2,
            VertexInputAttributeDescription {
                binding: 0,
                format: Format::R32_UINT,
                offset: 24,
                ..Default::default()
            },
        )
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &Arc<vulkano::device::Device>,
    vs: EntryPoint,
    fs: EntryPoint,
    vertex_input_state: VertexInputState,
    layout: Arc<PipelineLayout>,
    subpass: Subpass,
    topology: PrimitiveTopology,
    depth_test: bool,
    alpha_blend: bool,
) -> Result<Arc<GraphicsPipeline>, Box<dyn std::error::Error>> {
    let stages = vec![
        PipelineShaderStageCreateInfo::new(vs),
        PipelineShaderStageCreateInfo::new(fs),
    ];

    let mut ci = GraphicsPipelineCreateInfo::layout(layout);
    ci.stages = stages.into();
    ci.vertex_input_state = Some(vertex_input_state);
    ci.input_assembly_state = Some(InputAssemblyState {
        topology,
        ..Default::default()
    });
    ci.viewport_state = Some(ViewportState::default());
    ci.rasterization_state = Some(RasterizationState::default());
    ci.multisample_state = Some(MultisampleState::default());
    ci.depth_stencil_state = depth_test.then(|| DepthStencilState {
        depth: Some(DepthState::simple()),
        ..Default::default()
    });
    // Straight alpha over; blending on an integer attachment would be
    // invalid, so pass 1 runs with blending off.
    ci.color_blend_state = Some(ColorBlendState::with_attachment_states(
        1,
        ColorBlendAttachmentState {
            blend: alpha_blend.then(|| AttachmentBlend {
                src_color_blend_factor: BlendFactor::SrcAlpha,
                dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
                color_blend_op: BlendOp::Add,
                src_alpha_blend_factor: BlendFactor::One,
                dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
                alpha_blend_op: BlendOp::Add,
            }),
            color_write_enable: true,
            color_write_mask: ColorComponents::all(),
        },
    ));
    ci.dynamic_state = [DynamicState::Viewport, DynamicState::Scissor]
        .into_iter()
        .collect();
    ci.subpass = Some(PipelineSubpassType::BeginRenderPass(subpass));

    Ok(GraphicsPipeline::new(device.clone(), None, ci)?)
}

/// Stages all three streams of every model through host-visible buffers
/// into device-local vertex buffers with one submission.
fn upload_models(
    context: &VulkanoContext,
    command_buffer_allocator: &Arc<StandardCommandBufferAllocator>,
    models: &[RenderableModel],
) -> Result<Vec<GpuModel>, Box<dyn std::error::Error>> {
    let queue = context.graphics_queue().clone();

    let mut cbb = AutoCommandBufferBuilder::primary(
        command_buffer_allocator.clone(),
        queue.queue_family_index(),
        CommandBufferUsage::OneTimeSubmit,
    )?;

    let mut gpu_models = Vec::with_capacity(models.len());
    for model in models {
        gpu_models.push(GpuModel {
            solid: stage_vertices(context.memory_allocator(), &mut cbb, &model.solid)?,
            dots: stage_vertices(context.memory_allocator(), &mut cbb, &model.dots)?,
            debug: stage_vertices(context.memory_allocator(), &mut cbb, &model.debug)?,
        });
    }

    let cb = cbb.build()?;
    cb.execute(queue)?
        .then_signal_fence_and_flush()?
        .wait(None)?;

    Ok(gpu_models)
}

fn stage_vertices<T: BufferContents + Copy>(
    memory_allocator: &Arc<StandardMemoryAllocator>,
    cbb: &mut AutoCommandBufferBuilder<
        vulkano::command_buffer::PrimaryAutoCommandBuffer,
    >,
    vertices: &[T],
) -> Result<Subbuffer<[T]>, Box<dyn std::error::Error>> {
    if vertices.is_empty() {
        return Err("vertex stream is empty".into());
    }

    let staging = Buffer::from_iter(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_SRC,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        },
        vertices.iter().copied(),
    )?;

    let device_local = Buffer::new_slice::<T>(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::VERTEX_BUFFER | BufferUsage::TRANSFER_DST,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
            ..Default::default()
        },
        vertices.len() as DeviceSize,
    )?;

    cbb.copy_buffer(CopyBufferInfo::buffers(staging, device_local.clone()))?;
    Ok(device_local)
}
