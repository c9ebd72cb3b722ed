//! Shader variant compilation and binding.
//!
//! | Module | Role |
//! |--------|------|
//! | [`define_encoder`] | bit widths, offsets and value mappers of template defines |
//! | [`builtins`] | injection of engine builtin blocks/samplers by name |
//! | [`handle`] | packed property handles |
//! | [`template`] | registered templates and their device-shape infos |
//! | [`key`] | variant keys (compact and uber) |
//! | [`preprocess`] | canonical define values, prelude text, WGSL rendering |
//! | [`library`] | [`ProgramLib`]: registry, shader cache, layout cache |

pub mod builtins;
pub mod define_encoder;
pub mod handle;
pub mod key;
pub mod library;
pub mod preprocess;
pub mod template;

pub use builtins::{BuiltinLayoutTable, BuiltinResource, MergeReport, merge_builtins};
pub use define_encoder::{DefineMapper, DefineSpec, MAX_COMPACT_KEY_BITS};
pub use handle::{HandleFields, PropertyHandle, PropertyKind};
pub use library::{CachedShader, PipelineState, ProgramLib, SharedProgramLib};
pub use template::{GatedAttribute, SetLayouts, Template, TemplateInfo};
