//! Plain data the shader library consumes and produces.
//!
//! - [`description`]: deserialized shader template descriptions
//! - [`macros`]: live macro assignments ([`MacroRecord`])
//! - [`types`]: device-facing descriptor, uniform and attribute types

pub mod description;
pub mod macros;
pub mod types;

pub use description::{
    AttributeDescription, BlockDescription, BuiltinRefSet, BuiltinReferences, DefineDescription,
    DefineKind, MemberDescription, SamplerTextureDescription, ShaderDescription, StageSources,
    StorageBufferDescription, StorageImageDescription,
};
pub use macros::{MacroRecord, MacroValue};
pub use types::{
    Attribute, DataType, DescriptorBinding, DescriptorType, Format, SetIndex, ShaderResources,
    ShaderStageFlags, Uniform, UniformBlock, UniformSamplerTexture, UniformStorageBuffer,
    UniformStorageImage,
};
