//! Raw shader descriptions.
//!
//! A [`ShaderDescription`] is the already-deserialized, source-level
//! declaration of one shader template as produced by the asset pipeline:
//! macro defines, uniform blocks, sampler/texture slots, vertex attributes,
//! builtin references and per-language stage sources.
//!
//! Descriptions are plain serde data. The JSON shape is:
//!
//! ```json
//! {
//!   "name": "unlit",
//!   "hash": 1234,
//!   "defines": [
//!     { "name": "USE_TEXTURE", "type": "boolean" },
//!     { "name": "ALPHA_MODE", "type": "string", "options": ["opaque", "mask"] },
//!     { "name": "LIGHT_COUNT", "type": "number", "range": [0, 3] }
//!   ],
//!   "blocks": [{ "name": "Constants", "binding": 0,
//!                "members": [{ "name": "tint", "type": "float4" }] }],
//!   "sampler_textures": [{ "name": "mainTexture", "binding": 1, "type": "sampler2d" }],
//!   "attributes": [{ "name": "a_color", "format": "rgba32f", "location": 2,
//!                    "defines": ["USE_VERTEX_COLOR"] }],
//!   "builtins": { "globals": { "blocks": ["CCGlobal"] }, "locals": {}, "statistics": {} },
//!   "sources": { "glsl4": { "vert": "...", "frag": "..." } }
//! }
//! ```

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use super::types::{DataType, Format, ShaderStageFlags};
use crate::errors::Result;

/// Domain of a macro define.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DefineKind {
    Boolean,
    /// Enum define selecting one of `options`.
    String { options: Vec<String> },
    /// Integer define over the inclusive range `[range[0], range[1]]`.
    Number { range: [i64; 2] },
    /// A type this library does not know how to encode.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefineDescription {
    pub name: String,
    #[serde(flatten)]
    pub kind: DefineKind,
}

impl DefineDescription {
    #[must_use]
    pub fn boolean(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: DefineKind::Boolean,
        }
    }

    #[must_use]
    pub fn options(name: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            kind: DefineKind::String {
                options: options.iter().map(|s| (*s).to_owned()).collect(),
            },
        }
    }

    #[must_use]
    pub fn range(name: &str, min: i64, max: i64) -> Self {
        Self {
            name: name.to_owned(),
            kind: DefineKind::Number { range: [min, max] },
        }
    }
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "one")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDescription {
    pub name: String,
    pub binding: u32,
    #[serde(default)]
    pub members: Vec<MemberDescription>,
    #[serde(default)]
    pub stage_flags: ShaderStageFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerTextureDescription {
    pub name: String,
    pub binding: u32,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub stage_flags: ShaderStageFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageBufferDescription {
    pub name: String,
    pub binding: u32,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub stage_flags: ShaderStageFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageImageDescription {
    pub name: String,
    pub binding: u32,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub stage_flags: ShaderStageFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescription {
    pub name: String,
    pub format: Format,
    #[serde(default)]
    pub is_normalized: bool,
    #[serde(default)]
    pub is_instanced: bool,
    pub location: u32,
    /// Macro names gating the attribute; a leading `!` negates.
    #[serde(default)]
    pub defines: Vec<String>,
}

/// Names of builtin resources to inject from one builtin layout table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuiltinRefSet {
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub sampler_textures: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl BuiltinRefSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.sampler_textures.is_empty() && self.images.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuiltinReferences {
    #[serde(default)]
    pub globals: BuiltinRefSet,
    #[serde(default)]
    pub locals: BuiltinRefSet,
    /// Engine statistics constants, emitted as `#define NAME VALUE`.
    #[serde(default)]
    pub statistics: BTreeMap<String, i64>,
}

/// Vertex and fragment source of one shading-language version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageSources {
    pub vert: String,
    pub frag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderDescription {
    pub name: String,
    /// Content hash. `0` means "not computed"; see [`Self::from_json`].
    #[serde(default)]
    pub hash: u64,
    #[serde(default)]
    pub defines: Vec<DefineDescription>,
    #[serde(default)]
    pub blocks: Vec<BlockDescription>,
    #[serde(default)]
    pub sampler_textures: Vec<SamplerTextureDescription>,
    #[serde(default)]
    pub buffers: Vec<StorageBufferDescription>,
    #[serde(default)]
    pub images: Vec<StorageImageDescription>,
    #[serde(default)]
    pub attributes: Vec<AttributeDescription>,
    #[serde(default)]
    pub builtins: BuiltinReferences,
    /// Stage sources keyed by shading language (`glsl4`, `glsl3`, `glsl1`, `wgsl`).
    #[serde(default)]
    pub sources: BTreeMap<String, StageSources>,
}

impl ShaderDescription {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Parse a description, filling in the content hash when it is absent.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut desc: Self = serde_json::from_str(json)?;
        if desc.hash == 0 {
            desc.hash = desc.content_hash();
        }
        Ok(desc)
    }

    /// xxh3 hash of everything except the `hash` field itself.
    ///
    /// Stable across runs.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.name.hash(&mut hasher);
        self.defines.hash(&mut hasher);
        self.blocks.hash(&mut hasher);
        self.sampler_textures.hash(&mut hasher);
        self.buffers.hash(&mut hasher);
        self.images.hash(&mut hasher);
        self.attributes.hash(&mut hasher);
        self.builtins.hash(&mut hasher);
        self.sources.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNLIT: &str = r#"{
        "name": "unlit",
        "defines": [
            { "name": "USE_TEXTURE", "type": "boolean" },
            { "name": "ALPHA_MODE", "type": "string", "options": ["opaque", "mask", "blend"] },
            { "name": "LIGHT_COUNT", "type": "number", "range": [0, 3] },
            { "name": "LEGACY", "type": "vector" }
        ],
        "blocks": [{ "name": "Constants", "binding": 0,
                     "members": [{ "name": "tint", "type": "float4" }] }],
        "sampler_textures": [{ "name": "mainTexture", "binding": 1, "type": "sampler2d" }],
        "attributes": [{ "name": "a_position", "format": "rgb32f", "location": 0 }],
        "sources": { "glsl4": { "vert": "void main() {}", "frag": "void main() {}" } }
    }"#;

    #[test]
    fn parses_define_kinds() {
        let desc = ShaderDescription::from_json(UNLIT).unwrap();
        assert_eq!(desc.defines[0].kind, DefineKind::Boolean);
        assert_eq!(
            desc.defines[1].kind,
            DefineKind::String {
                options: vec!["opaque".into(), "mask".into(), "blend".into()]
            }
        );
        assert_eq!(desc.defines[2].kind, DefineKind::Number { range: [0, 3] });
        assert_eq!(desc.defines[3].kind, DefineKind::Unknown);
    }

    #[test]
    fn fills_missing_hash_deterministically() {
        let a = ShaderDescription::from_json(UNLIT).unwrap();
        let b = ShaderDescription::from_json(UNLIT).unwrap();
        assert_ne!(a.hash, 0);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn content_hash_tracks_sources() {
        let a = ShaderDescription::from_json(UNLIT).unwrap();
        let mut b = a.clone();
        b.sources.get_mut("glsl4").unwrap().frag.push_str("\n// edited");
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn member_count_defaults_to_one() {
        let desc = ShaderDescription::from_json(UNLIT).unwrap();
        assert_eq!(desc.blocks[0].members[0].count, 1);
        assert_eq!(desc.blocks[0].stage_flags, ShaderStageFlags::VERTEX_FRAGMENT);
    }
}
