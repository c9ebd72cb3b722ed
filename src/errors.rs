//! Error Types
//!
//! This module defines the error types used throughout the shader library.
//!
//! # Overview
//!
//! The main error type [`ShaderLibError`] covers the *structural* failure
//! modes of the library:
//! - Lookups of templates that were never registered
//! - Devices reporting a shading language the template has no source for
//! - Property handles whose fields do not fit the handle layout
//! - Malformed define declarations
//! - Device-side shader creation failures
//!
//! Resource-availability problems (a builtin block missing from a layout
//! table, for example) are *not* errors: they are logged and the affected
//! binding is skipped.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ShaderLibError>`.
//!
//! ```rust,ignore
//! use myth_shader::errors::{ShaderLibError, Result};
//!
//! fn lookup(lib: &ProgramLib<MyDevice>) -> Result<()> {
//!     let _template = lib.get_template("builtin-standard")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the shader library.
#[derive(Error, Debug)]
pub enum ShaderLibError {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// No template has been registered under the given name.
    #[error("Shader template not found: {0}")]
    TemplateNotFound(String),

    /// A define declaration cannot be encoded.
    #[error("Invalid define '{define}' in template '{template}': {reason}")]
    InvalidDefine {
        template: String,
        define: String,
        reason: String,
    },

    /// A property field does not fit into its slot of the handle layout.
    #[error("Handle field '{field}' of property '{property}' overflows: {value} > {max}")]
    HandleFieldOverflow {
        property: String,
        field: &'static str,
        value: u64,
        max: u64,
    },

    // ========================================================================
    // Compilation Errors
    // ========================================================================
    /// The device reports a shading language the template carries no source for.
    #[error("Template '{template}' has no source for shading language '{language}'")]
    UnsupportedShadingLanguage { template: String, language: String },

    /// Rendering a WGSL source template failed.
    #[error("Shader template render error: {0}")]
    TemplateRender(String),

    /// The device refused to create the shader object.
    #[error("Failed to create shader '{template}': {reason}")]
    ShaderCreation { template: String, reason: String },

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error while reading a shader description.
    #[error("Shader description parse error: {0}")]
    Description(#[from] serde_json::Error),
}

impl From<minijinja::Error> for ShaderLibError {
    fn from(err: minijinja::Error) -> Self {
        ShaderLibError::TemplateRender(err.to_string())
    }
}

/// Alias for `Result<T, ShaderLibError>`.
pub type Result<T> = std::result::Result<T, ShaderLibError>;
