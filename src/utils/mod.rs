//! Utility Module
//!
//! - [`interner`]: string interning for macro names
//!
//! ```rust,ignore
//! use myth_shader::utils::interner;
//!
//! let sym1 = interner::intern("USE_FOG");
//! let sym2 = interner::intern("USE_FOG");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;

pub use interner::Symbol;
