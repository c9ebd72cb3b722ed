//! Templates and their GPU-shape artifacts.
//!
//! A [`Template`] is the declared, source-level side of a shader: encoded
//! defines, declared resources, attributes, builtin references and sources.
//! A [`TemplateInfo`] is everything derived from it for the device: binding
//! lists, device-ready resource descriptions, property handles and the
//! lazily created set and pipeline layouts.
//!
//! Templates are keyed by name, infos by template hash, so templates that
//! share a hash share one info (and one set of layouts).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use super::builtins::{BuiltinLayoutTable, merge_builtins};
use super::define_encoder::{DefineSpec, encode_defines};
use super::handle::{PropertyHandle, generate_handles};
use super::key::{append_presence, compute_key, presence_gates};
use super::preprocess::{constant_macros, is_attribute_active};
use crate::device::GfxDevice;
use crate::errors::Result;
use crate::resources::description::{
    AttributeDescription, BlockDescription, BuiltinReferences, SamplerTextureDescription,
    ShaderDescription, StageSources, StorageBufferDescription, StorageImageDescription,
};
use crate::resources::macros::MacroRecord;
use crate::resources::types::{
    Attribute, DescriptorBinding, DescriptorType, SetIndex, ShaderResources, Uniform,
    UniformBlock, UniformSamplerTexture, UniformStorageBuffer, UniformStorageImage,
};

/// A registered shader template.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub hash: u64,
    pub defines: Vec<DefineSpec>,
    /// Summed define width; past 31 bits the template is uber.
    pub total_bits: u32,
    pub uber: bool,
    pub blocks: Vec<BlockDescription>,
    pub sampler_textures: Vec<SamplerTextureDescription>,
    pub buffers: Vec<StorageBufferDescription>,
    pub images: Vec<StorageImageDescription>,
    pub attributes: Vec<AttributeDescription>,
    /// Macros whose mere presence disables an attribute, sorted.
    pub presence_gates: Vec<String>,
    pub builtins: BuiltinReferences,
    /// `#define` lines of the engine statistics constants.
    pub constant_macros: String,
    pub sources: BTreeMap<String, StageSources>,
}

impl Template {
    /// Encode the defines of `desc` and take over its declarations.
    ///
    /// A zero `desc.hash` is replaced by the description's content hash.
    pub fn from_description(desc: &ShaderDescription) -> Result<Self> {
        let encoded = encode_defines(&desc.name, &desc.defines)?;
        let hash = if desc.hash == 0 {
            desc.content_hash()
        } else {
            desc.hash
        };

        Ok(Self {
            name: desc.name.clone(),
            hash,
            defines: encoded.specs,
            total_bits: encoded.total_bits,
            uber: encoded.uber,
            blocks: desc.blocks.clone(),
            sampler_textures: desc.sampler_textures.clone(),
            buffers: desc.buffers.clone(),
            images: desc.images.clone(),
            attributes: desc.attributes.clone(),
            presence_gates: presence_gates(desc.attributes.iter().flat_map(|a| &a.defines)),
            builtins: desc.builtins.clone(),
            constant_macros: constant_macros(&desc.builtins.statistics),
            sources: desc.sources.clone(),
        })
    }

    #[must_use]
    pub fn define(&self, name: &str) -> Option<&DefineSpec> {
        self.defines.iter().find(|d| d.name == name)
    }

    /// Variant key of `macros` for this template.
    #[must_use]
    pub fn key(&self, macros: &MacroRecord) -> String {
        let mut key = compute_key(&self.defines, self.uber, self.hash, macros);
        append_presence(&mut key, &self.presence_gates, macros);
        key
    }
}

/// Vertex attribute plus the macro dependencies gating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedAttribute {
    pub attribute: Attribute,
    pub dependencies: Vec<String>,
}

/// MATERIAL and LOCAL set layouts, always created together.
#[derive(Debug)]
pub struct SetLayouts<L> {
    pub material: L,
    pub local: L,
}

/// Device-shape artifacts of a template hash.
pub struct TemplateInfo<D: GfxDevice> {
    pub hash: u64,
    /// MATERIAL-set bindings, sorted by binding number.
    pub bindings: Vec<DescriptorBinding>,
    /// LOCAL-set bindings of the injected local builtins, sorted.
    pub local_bindings: Vec<DescriptorBinding>,
    /// Template resources plus local builtins. Global builtins are merged
    /// into a per-compile copy.
    pub resources: ShaderResources,
    pub attributes: Vec<GatedAttribute>,
    pub handle_map: FxHashMap<String, PropertyHandle>,
    set_layouts: Option<SetLayouts<D::DescriptorSetLayout>>,
    pipeline_layout: Option<D::PipelineLayout>,
}

fn gfx_block(block: &BlockDescription) -> UniformBlock {
    UniformBlock {
        set: SetIndex::Material,
        binding: block.binding,
        name: block.name.clone(),
        members: block
            .members
            .iter()
            .map(|m| Uniform {
                name: m.name.clone(),
                data_type: m.data_type,
                count: m.count,
            })
            .collect(),
        count: 1,
    }
}

impl<D: GfxDevice> TemplateInfo<D> {
    /// Derive bindings, resources and handles and merge the local builtins
    /// named by the template. No GPU object is created here.
    pub fn new(template: &Template, local_layout: &BuiltinLayoutTable) -> Result<Self> {
        let mut bindings = Vec::with_capacity(
            template.blocks.len()
                + template.sampler_textures.len()
                + template.buffers.len()
                + template.images.len(),
        );
        let mut resources = ShaderResources::default();

        for block in &template.blocks {
            bindings.push(DescriptorBinding::new(
                block.binding,
                DescriptorType::UniformBuffer,
                1,
                block.stage_flags,
            ));
            resources.blocks.push(gfx_block(block));
        }
        for sampler in &template.sampler_textures {
            bindings.push(DescriptorBinding::new(
                sampler.binding,
                DescriptorType::SamplerTexture,
                sampler.count,
                sampler.stage_flags,
            ));
            resources.sampler_textures.push(UniformSamplerTexture {
                set: SetIndex::Material,
                binding: sampler.binding,
                name: sampler.name.clone(),
                data_type: sampler.data_type,
                count: sampler.count,
            });
        }
        for buffer in &template.buffers {
            bindings.push(DescriptorBinding::new(
                buffer.binding,
                DescriptorType::StorageBuffer,
                buffer.count,
                buffer.stage_flags,
            ));
            resources.buffers.push(UniformStorageBuffer {
                set: SetIndex::Material,
                binding: buffer.binding,
                name: buffer.name.clone(),
                count: buffer.count,
                read_only: buffer.read_only,
            });
        }
        for image in &template.images {
            bindings.push(DescriptorBinding::new(
                image.binding,
                DescriptorType::StorageImage,
                image.count,
                image.stage_flags,
            ));
            resources.images.push(UniformStorageImage {
                set: SetIndex::Material,
                binding: image.binding,
                name: image.name.clone(),
                data_type: image.data_type,
                count: image.count,
            });
        }
        bindings.sort_by_key(|b| b.binding);

        let handle_map = generate_handles(&resources.blocks, &resources.sampler_textures)?;

        let mut local_bindings = Vec::new();
        let report = merge_builtins(
            &template.builtins.locals,
            local_layout,
            &mut resources,
            Some(&mut local_bindings),
        );
        if !report.skipped.is_empty() {
            log::debug!(
                "Template '{}': {} local builtin(s) unavailable: {:?}",
                template.name,
                report.skipped.len(),
                report.skipped
            );
        }

        let attributes = template
            .attributes
            .iter()
            .map(|a| GatedAttribute {
                attribute: Attribute {
                    name: a.name.clone(),
                    format: a.format,
                    is_normalized: a.is_normalized,
                    stream: 0,
                    is_instanced: a.is_instanced,
                    location: a.location,
                },
                dependencies: a.defines.clone(),
            })
            .collect();

        Ok(Self {
            hash: template.hash,
            bindings,
            local_bindings,
            resources,
            attributes,
            handle_map,
            set_layouts: None,
            pipeline_layout: None,
        })
    }

    /// Create the MATERIAL and LOCAL set layouts on first use.
    pub fn ensure_set_layouts(&mut self, device: &D) -> &SetLayouts<D::DescriptorSetLayout> {
        self.set_layouts.get_or_insert_with(|| {
            log::debug!("Creating set layouts for template hash {}", self.hash);
            SetLayouts {
                material: device.create_descriptor_set_layout(&self.bindings),
                local: device.create_descriptor_set_layout(&self.local_bindings),
            }
        })
    }

    /// Create the pipeline layout (GLOBAL, MATERIAL, LOCAL) on first use.
    ///
    /// `global` is only consulted the first time.
    pub fn ensure_pipeline_layout(
        &mut self,
        device: &D,
        global: &D::DescriptorSetLayout,
    ) -> &D::PipelineLayout {
        let layout = match self.pipeline_layout.take() {
            Some(layout) => layout,
            None => {
                let sets = self.ensure_set_layouts(device);
                device.create_pipeline_layout(&[global, &sets.material, &sets.local])
            }
        };
        self.pipeline_layout.insert(layout)
    }

    #[inline]
    #[must_use]
    pub fn set_layouts(&self) -> Option<&SetLayouts<D::DescriptorSetLayout>> {
        self.set_layouts.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn pipeline_layout(&self) -> Option<&D::PipelineLayout> {
        self.pipeline_layout.as_ref()
    }

    /// Active vertex attributes under `macros`.
    #[must_use]
    pub fn active_attributes(&self, macros: &MacroRecord) -> Vec<Attribute> {
        self.attributes
            .iter()
            .filter(|a| is_attribute_active(&a.dependencies, macros))
            .map(|a| a.attribute.clone())
            .collect()
    }
}
