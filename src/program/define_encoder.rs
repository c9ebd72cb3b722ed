//! Define Encoder
//!
//! Assigns every declared macro define a bit width, a bit offset and a
//! [`DefineMapper`] so a live macro assignment can be packed into a variant
//! key.
//!
//! | Kind | Width | Mapping |
//! |------|-------|---------|
//! | boolean | 1 | `true → 1`, `false → 0` |
//! | numeric `[lo, hi]` | `ceil(log2(hi - lo + 1))` | `v → clamp(v) - lo` |
//! | enum with `n` options | `ceil(log2(n))` | `v → max(0, index_of(v))` |
//!
//! Widths are at least one bit. Offsets accumulate in declaration order.
//! When the summed width exceeds [`MAX_COMPACT_KEY_BITS`] the template is
//! *uber* and falls back to string keys.

use crate::errors::{Result, ShaderLibError};
use crate::resources::description::{DefineDescription, DefineKind};
use crate::resources::macros::MacroValue;

/// Bits available in a compact (single machine word) variant key.
pub const MAX_COMPACT_KEY_BITS: u32 = 31;

/// Bits needed to address `count` distinct values, never less than one.
#[inline]
#[must_use]
pub fn bit_count(count: u64) -> u32 {
    let count = count.max(2);
    u64::BITS - (count - 1).leading_zeros()
}

/// Value → integer mapping of one define.
///
/// Every mapper is total over [`MacroValue`] and its image is exactly
/// `0..domain_size`, so [`canonical`](Self::canonical) can turn a mapped
/// value back into the one spelling the preprocessor sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineMapper {
    Boolean,
    Enum { options: Vec<String> },
    Range { min: i64, max: i64 },
}

impl DefineMapper {
    #[must_use]
    pub fn map(&self, value: &MacroValue) -> u32 {
        match self {
            Self::Boolean => u32::from(value.is_truthy()),
            Self::Enum { options } => {
                let position = match value {
                    MacroValue::String(s) => options.iter().position(|o| o == s),
                    other => {
                        let text = other.to_string();
                        options.iter().position(|o| *o == text)
                    }
                };
                position.unwrap_or(0) as u32
            }
            Self::Range { min, max } => {
                let v = value.as_number().clamp(*min, *max);
                (v - *min) as u32
            }
        }
    }

    /// The value a mapped integer stands for.
    #[must_use]
    pub fn canonical(&self, mapped: u32) -> MacroValue {
        match self {
            Self::Boolean => MacroValue::Bool(mapped != 0),
            Self::Enum { options } => {
                let idx = (mapped as usize).min(options.len().saturating_sub(1));
                MacroValue::String(options.get(idx).cloned().unwrap_or_default())
            }
            Self::Range { min, max } => MacroValue::Int((*min + i64::from(mapped)).min(*max)),
        }
    }

    /// Value emitted for a define missing from the assignment.
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> MacroValue {
        self.canonical(0)
    }
}

/// An encoded define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineSpec {
    pub name: String,
    /// `None` for define kinds this library cannot encode; such defines are
    /// skipped by key computation and prelude generation.
    pub mapper: Option<DefineMapper>,
    pub bit_width: u32,
    pub bit_offset: u32,
}

impl DefineSpec {
    /// Extract this define's mapped value from a compact packed key.
    #[inline]
    #[must_use]
    pub fn unpack(&self, packed: u32) -> u32 {
        let mask = (1u64 << self.bit_width) - 1;
        ((u64::from(packed) >> self.bit_offset.min(63)) & mask) as u32
    }
}

/// Result of running the encoder over a template's defines.
#[derive(Debug, Clone, Default)]
pub struct EncodedDefines {
    pub specs: Vec<DefineSpec>,
    pub total_bits: u32,
    pub uber: bool,
}

pub fn encode_defines(template: &str, defines: &[DefineDescription]) -> Result<EncodedDefines> {
    let invalid = |define: &DefineDescription, reason: String| ShaderLibError::InvalidDefine {
        template: template.to_owned(),
        define: define.name.clone(),
        reason,
    };

    let mut specs = Vec::with_capacity(defines.len());
    let mut offset = 0u32;

    for define in defines {
        let (mapper, width) = match &define.kind {
            DefineKind::Boolean => (Some(DefineMapper::Boolean), 1),
            DefineKind::String { options } => {
                if options.is_empty() {
                    return Err(invalid(define, "empty option list".into()));
                }
                let width = bit_count(options.len() as u64);
                let mapper = DefineMapper::Enum {
                    options: options.clone(),
                };
                (Some(mapper), width)
            }
            DefineKind::Number { range: [min, max] } => {
                if max < min {
                    return Err(invalid(define, format!("empty range [{min}, {max}]")));
                }
                let span = max.abs_diff(*min);
                if span > u64::from(u32::MAX) {
                    return Err(invalid(define, format!("range [{min}, {max}] is too wide")));
                }
                let width = bit_count(span + 1);
                let mapper = DefineMapper::Range {
                    min: *min,
                    max: *max,
                };
                (Some(mapper), width)
            }
            DefineKind::Unknown => {
                log::warn!(
                    "Template '{template}': define '{}' has an unknown type and will not be encoded",
                    define.name
                );
                (None, 1)
            }
        };

        specs.push(DefineSpec {
            name: define.name.clone(),
            mapper,
            bit_width: width,
            bit_offset: offset,
        });
        offset += width;
    }

    Ok(EncodedDefines {
        specs,
        total_bits: offset,
        uber: offset > MAX_COMPACT_KEY_BITS,
    })
}
