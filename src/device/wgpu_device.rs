//! wgpu backend for [`GfxDevice`].
//!
//! Shader variants become one `wgpu::ShaderModule` per stage, descriptor set
//! layouts become bind group layouts and the three set layouts form the
//! pipeline layout (group 0 global, group 1 material, group 2 local).

use std::borrow::Cow;
use std::num::NonZeroU32;

use super::{GfxDevice, ShaderInfo};
use crate::errors::{Result, ShaderLibError};
use crate::program::preprocess::WGSL;
use crate::resources::types::{DescriptorBinding, DescriptorType, ShaderStageFlags};

/// Compiled shader variant.
#[derive(Debug, Clone)]
pub struct WgpuShader {
    pub name: String,
    pub vertex: wgpu::ShaderModule,
    pub fragment: Option<wgpu::ShaderModule>,
}

pub struct WgpuDevice {
    device: wgpu::Device,
}

impl WgpuDevice {
    #[must_use]
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

fn visibility(flags: ShaderStageFlags) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::NONE;
    if flags.contains(ShaderStageFlags::VERTEX) {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if flags.contains(ShaderStageFlags::FRAGMENT) {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    if flags.contains(ShaderStageFlags::COMPUTE) {
        stages |= wgpu::ShaderStages::COMPUTE;
    }
    stages
}

fn binding_type(ty: DescriptorType) -> wgpu::BindingType {
    let buffer = |ty, has_dynamic_offset| wgpu::BindingType::Buffer {
        ty,
        has_dynamic_offset,
        min_binding_size: None,
    };
    let texture = wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Float { filterable: true },
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    };

    match ty {
        DescriptorType::UniformBuffer => buffer(wgpu::BufferBindingType::Uniform, false),
        DescriptorType::DynamicUniformBuffer => buffer(wgpu::BufferBindingType::Uniform, true),
        DescriptorType::StorageBuffer => {
            buffer(wgpu::BufferBindingType::Storage { read_only: false }, false)
        }
        DescriptorType::DynamicStorageBuffer => {
            buffer(wgpu::BufferBindingType::Storage { read_only: false }, true)
        }
        DescriptorType::SamplerTexture | DescriptorType::Texture | DescriptorType::InputAttachment => {
            texture
        }
        DescriptorType::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        DescriptorType::StorageImage => wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: wgpu::TextureFormat::Rgba8Unorm,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
    }
}

fn layout_entry(binding: &DescriptorBinding) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: binding.binding,
        visibility: visibility(binding.stage_flags),
        ty: binding_type(binding.descriptor_type),
        count: NonZeroU32::new(binding.count).filter(|c| c.get() > 1),
    }
}

impl GfxDevice for WgpuDevice {
    type Shader = WgpuShader;
    type DescriptorSetLayout = wgpu::BindGroupLayout;
    type PipelineLayout = wgpu::PipelineLayout;

    fn shading_language(&self) -> &str {
        WGSL
    }

    fn create_shader(&self, info: &ShaderInfo) -> Result<WgpuShader> {
        let module = |stage: ShaderStageFlags, suffix: &str| {
            info.stage(stage).map(|s| {
                let label = format!("{} ({suffix})", info.name);
                self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&label),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&s.source)),
                })
            })
        };

        let Some(vertex) = module(ShaderStageFlags::VERTEX, "vertex") else {
            return Err(ShaderLibError::ShaderCreation {
                template: info.name.clone(),
                reason: "no vertex stage".into(),
            });
        };

        Ok(WgpuShader {
            name: info.name.clone(),
            vertex,
            fragment: module(ShaderStageFlags::FRAGMENT, "fragment"),
        })
    }

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBinding]) -> wgpu::BindGroupLayout {
        let entries: Vec<_> = bindings.iter().map(layout_entry).collect();
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shader Set Layout"),
                entries: &entries,
            })
    }

    fn create_pipeline_layout(&self, set_layouts: &[&wgpu::BindGroupLayout]) -> wgpu::PipelineLayout {
        let set_layouts: Vec<Option<&wgpu::BindGroupLayout>> = set_layouts.iter().copied().map(Some).collect();
        self.device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shader Pipeline Layout"),
                bind_group_layouts: &set_layouts,
                immediate_size: 0,
            })
    }
}
