//! Variant Source Generation
//!
//! Turns a live macro assignment into the text a shader variant is built
//! from:
//!
//! - [`resolve_macros`] canonicalizes the assignment against a template's
//!   define specs. Every define with a mapper gets exactly one value, the
//!   one its mapped integer stands for, so two assignments that share a
//!   variant key always resolve identically.
//! - [`macro_prelude`] renders `#define NAME VALUE` lines for GLSL targets.
//! - [`render_wgsl`] expands WGSL sources, which have no preprocessor, as
//!   minijinja templates.
//! - [`is_attribute_active`] gates vertex attributes on macro state.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use minijinja::syntax::SyntaxConfig;
use minijinja::value::Value;
use minijinja::{Environment, UndefinedBehavior};

use crate::errors::Result;
use crate::program::define_encoder::DefineSpec;
use crate::resources::macros::{MacroRecord, MacroValue};

/// Shading-language identifier whose sources are minijinja templates.
pub const WGSL: &str = "wgsl";

/// One define after canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMacro {
    pub name: String,
    pub value: MacroValue,
    /// Whether `value` is the define's default (mapped value `0`).
    pub is_default: bool,
}

/// Canonical value of every encodable define, in declaration order.
///
/// Defines missing from `macros` resolve to their default. Defines without a
/// mapper are left out.
#[must_use]
pub fn resolve_macros(specs: &[DefineSpec], macros: &MacroRecord) -> Vec<ResolvedMacro> {
    specs
        .iter()
        .filter_map(|spec| {
            let mapper = spec.mapper.as_ref()?;
            let mapped = macros.get(&spec.name).map_or(0, |v| mapper.map(v));
            Some(ResolvedMacro {
                name: spec.name.clone(),
                value: mapper.canonical(mapped),
                is_default: mapped == 0,
            })
        })
        .collect()
}

/// `#define NAME VALUE` per resolved define.
#[must_use]
pub fn macro_prelude(resolved: &[ResolvedMacro]) -> String {
    let mut out = String::with_capacity(resolved.len() * 24);
    for m in resolved {
        let _ = writeln!(out, "#define {} {}", m.name, m.value);
    }
    out
}

/// Readable variant name: the template name followed by `|NAMEvalue` for
/// every define that differs from its default.
#[must_use]
pub fn instance_name(template: &str, resolved: &[ResolvedMacro]) -> String {
    let mut name = template.to_owned();
    for m in resolved.iter().filter(|m| !m.is_default) {
        let _ = write!(name, "|{}{}", m.name, m.value);
    }
    name
}

/// `#define NAME VALUE` per engine statistics constant, sorted by name.
#[must_use]
pub fn constant_macros(statistics: &BTreeMap<String, i64>) -> String {
    let mut out = String::new();
    for (name, value) in statistics {
        let _ = writeln!(out, "#define {name} {value}");
    }
    out
}

/// Vertex attribute gate.
///
/// An attribute stays active iff every plain dependency is truthy in
/// `macros` and no `!`-negated dependency is present at all. A negated
/// dependency set to `false` still disables the attribute.
#[must_use]
pub fn is_attribute_active(dependencies: &[String], macros: &MacroRecord) -> bool {
    dependencies.iter().all(|dep| match dep.strip_prefix('!') {
        Some(negated) => !macros.contains(negated),
        None => macros.is_enabled(dep),
    })
}

static WGSL_ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn wgsl_env() -> &'static Environment<'static> {
    WGSL_ENV.get_or_init(|| {
        let mut env = Environment::new();

        match SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
        {
            Ok(syntax) => env.set_syntax(syntax),
            Err(e) => log::error!("Failed to configure WGSL template syntax: {e}"),
        }

        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        env
    })
}

fn template_value(value: &MacroValue) -> Value {
    match value {
        MacroValue::Bool(b) => Value::from(*b),
        MacroValue::Int(i) => Value::from(*i),
        MacroValue::Float(f) => Value::from(*f),
        MacroValue::String(s) => Value::from(s.as_str()),
    }
}

/// Render a WGSL source template.
///
/// The context holds every resolved define under its name plus the engine
/// statistics constants.
pub fn render_wgsl(
    source: &str,
    resolved: &[ResolvedMacro],
    statistics: &BTreeMap<String, i64>,
) -> Result<String> {
    let mut ctx: BTreeMap<&str, Value> = statistics
        .iter()
        .map(|(name, value)| (name.as_str(), Value::from(*value)))
        .collect();
    for m in resolved {
        ctx.insert(m.name.as_str(), template_value(&m.value));
    }
    Ok(wgsl_env().render_str(source, ctx)?)
}
