//! Property Handles
//!
//! Every addressable property of a template (a uniform block member or a
//! sampler/texture slot) gets a [`PropertyHandle`]: a single `u64` that
//! carries everything a material system needs to write the property without
//! a string lookup.
//!
//! # Layout
//!
//! | Bits  | Field         | Width | Max        |
//! |-------|---------------|-------|------------|
//! | 0-19  | byte offset   | 20    | 1 048 575  |
//! | 20-31 | array count   | 12    | 4 095      |
//! | 32-39 | data type     | 8     | 255        |
//! | 40-47 | binding       | 8     | 255        |
//! | 48-51 | set index     | 4     | 15         |
//! | 52-55 | property kind | 4     | 15         |
//!
//! Bits 56-63 are reserved and always zero. The layout is part of the
//! public ABI: handles may be persisted alongside material data.

use rustc_hash::FxHashMap;

use crate::errors::{Result, ShaderLibError};
use crate::resources::types::{DataType, SetIndex, UniformBlock, UniformSamplerTexture};

const OFFSET_SHIFT: u32 = 0;
const OFFSET_BITS: u32 = 20;
const COUNT_SHIFT: u32 = 20;
const COUNT_BITS: u32 = 12;
const TYPE_SHIFT: u32 = 32;
const TYPE_BITS: u32 = 8;
const BINDING_SHIFT: u32 = 40;
const BINDING_BITS: u32 = 8;
const SET_SHIFT: u32 = 48;
const SET_BITS: u32 = 4;
const KIND_SHIFT: u32 = 52;
const KIND_BITS: u32 = 4;

#[inline]
const fn field_max(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// What a handle addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyKind {
    /// A member of a uniform block.
    Buffer = 1,
    /// A sampler/texture slot.
    Texture = 2,
}

impl PropertyKind {
    #[inline]
    #[must_use]
    pub fn from_repr(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Buffer),
            2 => Some(Self::Texture),
            _ => None,
        }
    }
}

/// Decoded handle fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleFields {
    pub kind: PropertyKind,
    pub set: SetIndex,
    pub binding: u32,
    pub data_type: DataType,
    pub offset: u32,
    pub count: u32,
}

/// Packed property address. See the module docs for the bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyHandle(u64);

impl PropertyHandle {
    /// Pack `fields`, rejecting any field that does not fit its slot.
    ///
    /// `property` only names the property in the error.
    pub fn encode(property: &str, fields: &HandleFields) -> Result<Self> {
        let check = |field: &'static str, value: u64, bits: u32| {
            let max = field_max(bits);
            if value > max {
                return Err(ShaderLibError::HandleFieldOverflow {
                    property: property.to_owned(),
                    field,
                    value,
                    max,
                });
            }
            Ok(value)
        };

        let offset = check("offset", u64::from(fields.offset), OFFSET_BITS)?;
        let count = check("count", u64::from(fields.count), COUNT_BITS)?;
        let binding = check("binding", u64::from(fields.binding), BINDING_BITS)?;

        Ok(Self(
            (offset << OFFSET_SHIFT)
                | (count << COUNT_SHIFT)
                | (u64::from(fields.data_type as u8) << TYPE_SHIFT)
                | (binding << BINDING_SHIFT)
                | (u64::from(fields.set as u8) << SET_SHIFT)
                | (u64::from(fields.kind as u8) << KIND_SHIFT),
        ))
    }

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    fn field(self, shift: u32, bits: u32) -> u64 {
        (self.0 >> shift) & field_max(bits)
    }

    /// `None` for raw values that were not produced by [`encode`](Self::encode).
    #[inline]
    #[must_use]
    pub fn property_kind(self) -> Option<PropertyKind> {
        PropertyKind::from_repr(self.field(KIND_SHIFT, KIND_BITS) as u8)
    }

    #[inline]
    #[must_use]
    pub fn set_index(self) -> Option<SetIndex> {
        SetIndex::from_repr(self.field(SET_SHIFT, SET_BITS) as u8)
    }

    #[inline]
    #[must_use]
    pub fn binding(self) -> u32 {
        self.field(BINDING_SHIFT, BINDING_BITS) as u32
    }

    #[inline]
    #[must_use]
    pub fn data_type(self) -> Option<DataType> {
        DataType::from_repr(self.field(TYPE_SHIFT, TYPE_BITS) as u8)
    }

    /// Byte offset of the property inside its block. Always `0` for textures.
    #[inline]
    #[must_use]
    pub fn offset(self) -> u32 {
        self.field(OFFSET_SHIFT, OFFSET_BITS) as u32
    }

    #[inline]
    #[must_use]
    pub fn count(self) -> u32 {
        self.field(COUNT_SHIFT, COUNT_BITS) as u32
    }

    #[must_use]
    pub fn decode(self) -> Option<HandleFields> {
        Some(HandleFields {
            kind: self.property_kind()?,
            set: self.set_index()?,
            binding: self.binding(),
            data_type: self.data_type()?,
            offset: self.offset(),
            count: self.count(),
        })
    }
}

/// Assign handles to every block member and sampler/texture of a template.
///
/// Offsets restart at zero for each block and advance by
/// `element_size × count`. Samplers always get offset zero. Handles are
/// keyed by property name; a later property with the same name replaces
/// an earlier one.
pub fn generate_handles(
    blocks: &[UniformBlock],
    sampler_textures: &[UniformSamplerTexture],
) -> Result<FxHashMap<String, PropertyHandle>> {
    let capacity = blocks.iter().map(|b| b.members.len()).sum::<usize>() + sampler_textures.len();
    let mut handles = FxHashMap::with_capacity_and_hasher(capacity, Default::default());

    for block in blocks {
        let mut offset = 0u32;
        for member in &block.members {
            let fields = HandleFields {
                kind: PropertyKind::Buffer,
                set: SetIndex::Material,
                binding: block.binding,
                data_type: member.data_type,
                offset,
                count: member.count,
            };
            let handle = PropertyHandle::encode(&member.name, &fields)?;
            if handles.insert(member.name.clone(), handle).is_some() {
                log::warn!("Duplicate property name '{}' in block '{}'", member.name, block.name);
            }
            offset = offset.saturating_add(member.data_type.size().saturating_mul(member.count));
        }
    }

    for sampler in sampler_textures {
        let fields = HandleFields {
            kind: PropertyKind::Texture,
            set: SetIndex::Material,
            binding: sampler.binding,
            data_type: sampler.data_type,
            offset: 0,
            count: sampler.count,
        };
        let handle = PropertyHandle::encode(&sampler.name, &fields)?;
        if handles.insert(sampler.name.clone(), handle).is_some() {
            log::warn!("Duplicate property name '{}' (sampler/texture)", sampler.name);
        }
    }

    Ok(handles)
}
