//! Graphics Device Abstraction
//!
//! The shader library never talks to a GPU API directly. Everything it needs
//! from the device goes through [`GfxDevice`]: shader creation, descriptor
//! set layout creation and pipeline layout creation, plus the identifier of
//! the shading language the device consumes.
//!
//! The device is passed by reference into every library call that may
//! create GPU objects, so one library instance never outlives or hides its
//! device.

pub mod wgpu_device;

use smallvec::SmallVec;

use crate::errors::Result;
use crate::resources::types::{Attribute, DescriptorBinding, ShaderResources, ShaderStageFlags};

pub use wgpu_device::{WgpuDevice, WgpuShader};

/// Final source of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    pub stage: ShaderStageFlags,
    pub source: String,
}

/// Everything the device needs to build one shader variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInfo {
    /// Readable variant name, see [`crate::program::preprocess::instance_name`].
    pub name: String,
    pub stages: SmallVec<[ShaderStage; 2]>,
    /// Active vertex attributes only.
    pub attributes: Vec<Attribute>,
    /// Template resources plus injected global and local builtins.
    pub resources: ShaderResources,
}

impl ShaderInfo {
    #[must_use]
    pub fn stage(&self, stage: ShaderStageFlags) -> Option<&ShaderStage> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// GPU object factory used by [`crate::program::ProgramLib`].
pub trait GfxDevice {
    type Shader;
    type DescriptorSetLayout: Clone;
    type PipelineLayout;

    /// Shading-language identifier used to select template sources,
    /// e.g. `"glsl4"` or `"wgsl"`.
    fn shading_language(&self) -> &str;

    fn create_shader(&self, info: &ShaderInfo) -> Result<Self::Shader>;

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBinding],
    ) -> Self::DescriptorSetLayout;

    /// `set_layouts` is ordered GLOBAL, MATERIAL, LOCAL.
    fn create_pipeline_layout(
        &self,
        set_layouts: &[&Self::DescriptorSetLayout],
    ) -> Self::PipelineLayout;

    /// Release a shader evicted from the cache.
    fn destroy_shader(&self, shader: Self::Shader) {
        drop(shader);
    }
}
