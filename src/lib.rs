//! Shader variant compilation and binding.
//!
//! Registers shader templates (macro defines, uniform blocks, sampler
//! slots, vertex attributes and per-language sources), compiles one device
//! shader per distinct macro assignment and builds the descriptor-set and
//! pipeline layouts every variant of a template shares.
//!
//! ```rust,ignore
//! use myth_shader::{MacroRecord, PipelineState, ProgramLib, ShaderDescription};
//!
//! let mut lib = ProgramLib::new(local_layout);
//! lib.define(&ShaderDescription::from_json(json)?)?;
//!
//! let pipeline = PipelineState::default();
//! let macros = MacroRecord::new().with("USE_FOG", true);
//! let shader = lib.get_gfx_shader(&device, &pipeline, "standard", &macros)?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod device;
pub mod errors;
pub mod program;
pub mod resources;
pub mod settings;
pub mod utils;

pub use device::{GfxDevice, ShaderInfo, ShaderStage, WgpuDevice, WgpuShader};
pub use errors::{Result, ShaderLibError};
pub use program::{
    BuiltinLayoutTable, BuiltinResource, PipelineState, ProgramLib, PropertyHandle, PropertyKind,
    SharedProgramLib, Template, TemplateInfo,
};
pub use resources::{MacroRecord, MacroValue, ShaderDescription};
pub use settings::ProgramLibSettings;
pub use utils::interner;
