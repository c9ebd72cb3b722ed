//! Variant Keys
//!
//! A variant key identifies one macro assignment of one template.
//!
//! - **Compact** templates pack every present define into a `u32`
//!   (`mapped << bit_offset`) and render it as `"{packed:x}|{hash}"`.
//! - **Uber** templates concatenate `"{bit_offset}:{mapped}|"` per present
//!   define and end with the hash. The `:` keeps offset and value apart, so
//!   `1:12|` and `11:2|` never collide.
//!
//! Defines absent from the assignment, or without a mapper, do not appear in
//! the key. Macros named by a negated attribute dependency (`!X`) gate on
//! presence alone, so [`append_presence`] adds `"!{i}"` for each one present. The template hash suffix keeps keys of different templates
//! disjoint.

use std::fmt::Write as _;

use crate::program::define_encoder::DefineSpec;
use crate::resources::macros::MacroRecord;

/// Packed compact-mode bits of an assignment.
///
/// Only meaningful for templates that are not uber; bits past 31 are
/// dropped.
#[must_use]
pub fn packed_bits(specs: &[DefineSpec], macros: &MacroRecord) -> u32 {
    let mut key = 0u64;
    for spec in specs {
        let Some(mapper) = &spec.mapper else { continue };
        let Some(value) = macros.get(&spec.name) else {
            continue;
        };
        let mapped = u64::from(mapper.map(value));
        key |= mapped.checked_shl(spec.bit_offset).unwrap_or(0);
    }
    (key & u64::from(u32::MAX)) as u32
}

/// Recover one define's mapped value from a compact key's packed bits.
#[inline]
#[must_use]
pub fn unpack_define(spec: &DefineSpec, packed: u32) -> u32 {
    spec.unpack(packed)
}

/// Compute the cache key of `macros` for a template.
#[must_use]
pub fn compute_key(specs: &[DefineSpec], uber: bool, hash: u64, macros: &MacroRecord) -> String {
    if !uber {
        return format!("{:x}|{hash}", packed_bits(specs, macros));
    }

    let mut key = String::with_capacity(specs.len() * 4 + 20);
    for spec in specs {
        let Some(mapper) = &spec.mapper else { continue };
        let Some(value) = macros.get(&spec.name) else {
            continue;
        };
        // Writing to a String cannot fail.
        let _ = write!(key, "{}:{}|", spec.bit_offset, mapper.map(value));
    }
    let _ = write!(key, "{hash}");
    key
}

/// Negated attribute dependencies, sorted and deduplicated without the `!`.
#[must_use]
pub fn presence_gates<'a>(dependencies: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut gates: Vec<String> = dependencies
        .into_iter()
        .filter_map(|dep| dep.strip_prefix('!'))
        .map(str::to_owned)
        .collect();
    gates.sort_unstable();
    gates.dedup();
    gates
}

/// Append `"!{i}"` for every gate macro present in `macros`.
pub fn append_presence(key: &mut String, gates: &[String], macros: &MacroRecord) {
    for (i, gate) in gates.iter().enumerate() {
        if macros.contains(gate) {
            let _ = write!(key, "!{i}");
        }
    }
}
