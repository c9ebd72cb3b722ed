//! Device-facing descriptor types.
//!
//! Plain data mirrors of the objects a graphics device needs to build
//! shaders and descriptor-set layouts. Nothing here depends on a concrete
//! GPU API; backends translate these into their own descriptors (see
//! [`crate::device::wgpu_device`]).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ─── Shader Stages ───────────────────────────────────────────────────────────

bitflags! {
    /// Pipeline stages a resource is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

impl Default for ShaderStageFlags {
    fn default() -> Self {
        Self::VERTEX_FRAGMENT
    }
}

// ─── Descriptor Sets ─────────────────────────────────────────────────────────

/// Descriptor-set slots shared by every template.
///
/// `Global` holds per-frame engine data, `Material` the template's own
/// resources and `Local` per-draw data such as model matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SetIndex {
    Global = 0,
    Material = 1,
    Local = 2,
}

impl SetIndex {
    #[inline]
    #[must_use]
    pub fn from_repr(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Global),
            1 => Some(Self::Material),
            2 => Some(Self::Local),
            _ => None,
        }
    }
}

/// Kind of resource bound at a descriptor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorType {
    UniformBuffer,
    DynamicUniformBuffer,
    StorageBuffer,
    DynamicStorageBuffer,
    SamplerTexture,
    Sampler,
    Texture,
    StorageImage,
    InputAttachment,
}

impl DescriptorType {
    /// Buffer-backed descriptors, the only ones a uniform block may resolve to.
    #[inline]
    #[must_use]
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            Self::UniformBuffer
                | Self::DynamicUniformBuffer
                | Self::StorageBuffer
                | Self::DynamicStorageBuffer
        )
    }

    /// Descriptors a sampler/texture reference may resolve to.
    #[inline]
    #[must_use]
    pub fn is_sampler(self) -> bool {
        matches!(self, Self::SamplerTexture | Self::Sampler | Self::Texture)
    }

    #[inline]
    #[must_use]
    pub fn is_image(self) -> bool {
        matches!(self, Self::StorageImage)
    }
}

/// One entry of a descriptor-set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub count: u32,
    pub stage_flags: ShaderStageFlags,
}

impl DescriptorBinding {
    #[inline]
    #[must_use]
    pub fn new(
        binding: u32,
        descriptor_type: DescriptorType,
        count: u32,
        stage_flags: ShaderStageFlags,
    ) -> Self {
        Self {
            binding,
            descriptor_type,
            count,
            stage_flags,
        }
    }
}

// ─── Data Types ──────────────────────────────────────────────────────────────

/// Shader-visible data types of uniforms and sampler/texture slots.
///
/// The discriminants are part of the property handle layout and must stay
/// below 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DataType {
    Unknown = 0,
    Bool = 1,
    Bool2 = 2,
    Bool3 = 3,
    Bool4 = 4,
    Int = 5,
    Int2 = 6,
    Int3 = 7,
    Int4 = 8,
    Uint = 9,
    Uint2 = 10,
    Uint3 = 11,
    Uint4 = 12,
    Float = 13,
    Float2 = 14,
    Float3 = 15,
    Float4 = 16,
    Mat2 = 17,
    Mat2x3 = 18,
    Mat2x4 = 19,
    Mat3x2 = 20,
    Mat3 = 21,
    Mat3x4 = 22,
    Mat4x2 = 23,
    Mat4x3 = 24,
    Mat4 = 25,
    Sampler1D = 26,
    Sampler1DArray = 27,
    Sampler2D = 28,
    Sampler2DArray = 29,
    Sampler3D = 30,
    SamplerCube = 31,
    Sampler = 32,
    Texture1D = 33,
    Texture1DArray = 34,
    Texture2D = 35,
    Texture2DArray = 36,
    Texture3D = 37,
    TextureCube = 38,
    Image1D = 39,
    Image1DArray = 40,
    Image2D = 41,
    Image2DArray = 42,
    Image3D = 43,
    ImageCube = 44,
}

impl DataType {
    const ALL: [DataType; 45] = [
        Self::Unknown,
        Self::Bool,
        Self::Bool2,
        Self::Bool3,
        Self::Bool4,
        Self::Int,
        Self::Int2,
        Self::Int3,
        Self::Int4,
        Self::Uint,
        Self::Uint2,
        Self::Uint3,
        Self::Uint4,
        Self::Float,
        Self::Float2,
        Self::Float3,
        Self::Float4,
        Self::Mat2,
        Self::Mat2x3,
        Self::Mat2x4,
        Self::Mat3x2,
        Self::Mat3,
        Self::Mat3x4,
        Self::Mat4x2,
        Self::Mat4x3,
        Self::Mat4,
        Self::Sampler1D,
        Self::Sampler1DArray,
        Self::Sampler2D,
        Self::Sampler2DArray,
        Self::Sampler3D,
        Self::SamplerCube,
        Self::Sampler,
        Self::Texture1D,
        Self::Texture1DArray,
        Self::Texture2D,
        Self::Texture2DArray,
        Self::Texture3D,
        Self::TextureCube,
        Self::Image1D,
        Self::Image1DArray,
        Self::Image2D,
        Self::Image2DArray,
        Self::Image3D,
        Self::ImageCube,
    ];

    /// Inverse of `as u8`.
    #[inline]
    #[must_use]
    pub fn from_repr(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Tightly packed byte size of one element, as the device lays out block members.
    ///
    /// Opaque types (samplers, textures, images) occupy a single 4-byte slot.
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Bool | Self::Int | Self::Uint | Self::Float => 4,
            Self::Bool2 | Self::Int2 | Self::Uint2 | Self::Float2 => 8,
            Self::Bool3 | Self::Int3 | Self::Uint3 | Self::Float3 => 12,
            Self::Bool4 | Self::Int4 | Self::Uint4 | Self::Float4 | Self::Mat2 => 16,
            Self::Mat2x3 | Self::Mat3x2 => 24,
            Self::Mat2x4 | Self::Mat4x2 => 32,
            Self::Mat3 => 36,
            Self::Mat3x4 | Self::Mat4x3 => 48,
            Self::Mat4 => 64,
            _ => 4,
        }
    }
}

/// Vertex attribute formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    R8,
    Rg8,
    Rgba8,
    R16F,
    Rg16F,
    Rgba16F,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    R32Ui,
    Rg32Ui,
    Rgba32Ui,
    R32I,
    Rgba32I,
}

// ─── Shader Interface ────────────────────────────────────────────────────────

/// One member of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uniform {
    pub name: String,
    pub data_type: DataType,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformBlock {
    pub set: SetIndex,
    pub binding: u32,
    pub name: String,
    pub members: Vec<Uniform>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformSamplerTexture {
    pub set: SetIndex,
    pub binding: u32,
    pub name: String,
    pub data_type: DataType,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformStorageBuffer {
    pub set: SetIndex,
    pub binding: u32,
    pub name: String,
    pub count: u32,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformStorageImage {
    pub set: SetIndex,
    pub binding: u32,
    pub name: String,
    pub data_type: DataType,
    pub count: u32,
}

/// A vertex input as the device sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub format: Format,
    pub is_normalized: bool,
    pub stream: u32,
    pub is_instanced: bool,
    pub location: u32,
}

/// Every non-attribute resource a shader declares, as handed to the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderResources {
    pub blocks: Vec<UniformBlock>,
    pub sampler_textures: Vec<UniformSamplerTexture>,
    pub buffers: Vec<UniformStorageBuffer>,
    pub images: Vec<UniformStorageImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_repr_round_trips() {
        for ty in DataType::ALL {
            assert_eq!(DataType::from_repr(ty as u8), Some(ty));
        }
        assert_eq!(DataType::from_repr(200), None);
    }

    #[test]
    fn member_sizes_are_tightly_packed() {
        assert_eq!(DataType::Float4.size(), 16);
        assert_eq!(DataType::Float3.size(), 12);
        assert_eq!(DataType::Mat3.size(), 36);
        assert_eq!(DataType::Sampler2D.size(), 4);
        assert_eq!(DataType::Unknown.size(), 0);
    }

    #[test]
    fn descriptor_type_families() {
        assert!(DescriptorType::DynamicUniformBuffer.is_buffer());
        assert!(!DescriptorType::SamplerTexture.is_buffer());
        assert!(DescriptorType::SamplerTexture.is_sampler());
        assert!(DescriptorType::StorageImage.is_image());
        assert!(!DescriptorType::StorageImage.is_sampler());
    }
}
