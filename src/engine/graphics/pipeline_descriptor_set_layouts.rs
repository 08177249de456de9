use std::collections::BTreeMap;
use std::sync::Arc;

use vulkano::descriptor_set::layout::{
    DescriptorSetLayout, DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, DescriptorType,
};
use vulkano::device::Device;
use vulkano::shader::ShaderStages;

pub struct PipelineDescriptorSetLayouts {
    /// Set 0: per-entity frame data (model + transform matrices). Bound by
    /// every pipeline.
    pub frame: Arc<DescriptorSetLayout>,

    /// Set 1: the fixed materials array plus the pass-1 material-id texture.
    /// Bound by the dot and debug pipelines only.
    pub palette: Arc<DescriptorSetLayout>,
}

impl PipelineDescriptorSetLayouts {
    pub fn new(device: Arc<Device>) -> Result<Self, Box<dyn std::error::Error>> {
        // Set 0, binding 0: uniform buffer with the per-entity matrices.
        // Visible in both stages so the fragment shaders stay free to read
        // the model matrix without a layout change.
        let mut bindings = BTreeMap::new();
        let mut matrices_binding =
            DescriptorSetLayoutBinding::descriptor_type(DescriptorType::UniformBuffer);
        matrices_binding.descriptor_count = 1;
        matrices_binding.stages = ShaderStages::VERTEX | ShaderStages::FRAGMENT;
        bindings.insert(0, matrices_binding);

        let frame = DescriptorSetLayout::new(
            device.clone(),
            DescriptorSetLayoutCreateInfo {
                bindings,
                ..Default::default()
            },
        )?;

        // Set 1, binding 0: materials uniform block (fixed slot count).
        let mut palette_bindings = BTreeMap::new();
        let mut materials_binding =
            DescriptorSetLayoutBinding::descriptor_type(DescriptorType::UniformBuffer);
        materials_binding.descriptor_count = 1;
        materials_binding.stages = ShaderStages::FRAGMENT;
        palette_bindings.insert(0, materials_binding);

        // Set 1, binding 1: the offscreen material-id image from pass 1.
        let mut lookup_binding =
            DescriptorSetLayoutBinding::descriptor_type(DescriptorType::CombinedImageSampler);
        lookup_binding.descriptor_count = 1;
        lookup_binding.stages = ShaderStages::FRAGMENT;
        palette_bindings.insert(1, lookup_binding);

        let palette = DescriptorSetLayout::new(
            device,
            DescriptorSetLayoutCreateInfo {
                bindings: palette_bindings,
                ..Default::default()
            },
        )?;

        Ok(Self { frame, palette })
    }
}
