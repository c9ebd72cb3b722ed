//! Shader Library Settings
//!
//! ```rust,ignore
//! use myth_shader::settings::ProgramLibSettings;
//!
//! let settings = ProgramLibSettings {
//!     dump_generated_sources: true,
//!     ..Default::default()
//! };
//! let lib = ProgramLib::<WgpuDevice>::with_settings(local_layout, settings);
//! ```

use serde::{Deserialize, Serialize};

/// Runtime switches of a [`crate::program::ProgramLib`].
///
/// Deserializable so engines can keep it in their config files; every field
/// falls back to its default when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramLibSettings {
    /// Bulk invalidation mode.
    ///
    /// `false` matches `NAMEvalue` fragments as substrings of each variant's
    /// instance name, so `{USE_FOG: 1}` also hits `USE_FOG10`.
    /// `true` requires every listed define to be declared by the variant's
    /// template and to resolve to exactly the listed value.
    pub strict_invalidation: bool,

    /// Log every generated stage source at `trace` level before it is
    /// handed to the device.
    pub dump_generated_sources: bool,
}
