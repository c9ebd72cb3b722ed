//! Program Library
//!
//! [`ProgramLib`] is the registry of shader templates and the cache of
//! compiled variants:
//!
//! - `templates`: template name → [`Template`]
//! - `template_infos`: template hash → [`TemplateInfo`] (bindings, handles,
//!   lazily created set and pipeline layouts)
//! - `cache`: variant key → compiled device shader
//!
//! The library is a plain context object. The render pipeline owns it and
//! passes itself ([`PipelineState`]) and the device into every call that
//! compiles or creates layouts. For multi-threaded use wrap it in a
//! [`SharedProgramLib`].
//!
//! # Compilation flow
//!
//! ```text
//! get_gfx_shader(name, macros)
//!   ├─ merge pipeline macros (pipeline wins)
//!   ├─ compute variant key ── hit ──> cached shader
//!   └─ miss
//!        ├─ ensure set layouts + pipeline layout
//!        ├─ copy resources, merge global builtins into the copy
//!        ├─ canonicalize defines → prelude / WGSL render
//!        ├─ filter vertex attributes
//!        └─ device.create_shader → cache
//! ```

use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::builtins::{BuiltinLayoutTable, merge_builtins};
use super::handle::PropertyHandle;
use super::preprocess::{
    ResolvedMacro, WGSL, instance_name, macro_prelude, render_wgsl, resolve_macros,
};
use super::template::{Template, TemplateInfo};
use crate::device::{GfxDevice, ShaderInfo, ShaderStage};
use crate::errors::{Result, ShaderLibError};
use crate::resources::description::ShaderDescription;
use crate::resources::macros::{MacroRecord, MacroValue};
use crate::resources::types::ShaderStageFlags;
use crate::settings::ProgramLibSettings;

/// Per-frame state the render pipeline hands to the library.
pub struct PipelineState<L> {
    /// Pipeline-wide macros; they override same-named values of a request.
    pub macros: MacroRecord,
    /// `#define` text placed ahead of each template's own constants in GLSL
    /// sources.
    pub constant_macros: String,
    /// Layout of the GLOBAL descriptor set.
    pub global_layout: BuiltinLayoutTable,
    /// Device layout of the GLOBAL set. When `None` the library creates one
    /// from `global_layout.bindings` the first time it is needed.
    pub global_set_layout: Option<L>,
}

impl<L> Default for PipelineState<L> {
    fn default() -> Self {
        Self {
            macros: MacroRecord::new(),
            constant_macros: String::new(),
            global_layout: BuiltinLayoutTable::default(),
            global_set_layout: None,
        }
    }
}

/// A compiled variant.
#[derive(Debug)]
pub struct CachedShader<S> {
    pub shader: S,
    pub template: String,
    /// See [`instance_name`].
    pub instance_name: String,
    /// Canonical value of every encodable define of the template.
    pub macros: Vec<ResolvedMacro>,
}

/// Library instance shared between threads behind one mutex.
pub type SharedProgramLib<D> = Arc<Mutex<ProgramLib<D>>>;

pub struct ProgramLib<D: GfxDevice> {
    settings: ProgramLibSettings,
    local_layout: BuiltinLayoutTable,
    templates: FxHashMap<String, Arc<Template>>,
    template_infos: FxHashMap<u64, TemplateInfo<D>>,
    cache: FxHashMap<String, CachedShader<D::Shader>>,
    global_set_layout: Option<D::DescriptorSetLayout>,
}

impl<D: GfxDevice> Default for ProgramLib<D> {
    fn default() -> Self {
        Self::new(BuiltinLayoutTable::default())
    }
}

impl<D: GfxDevice> ProgramLib<D> {
    /// `local_layout` describes the LOCAL (per-draw) builtin set templates
    /// may reference.
    #[must_use]
    pub fn new(local_layout: BuiltinLayoutTable) -> Self {
        Self::with_settings(local_layout, ProgramLibSettings::default())
    }

    #[must_use]
    pub fn with_settings(local_layout: BuiltinLayoutTable, settings: ProgramLibSettings) -> Self {
        Self {
            settings,
            local_layout,
            templates: FxHashMap::default(),
            template_infos: FxHashMap::default(),
            cache: FxHashMap::default(),
            global_set_layout: None,
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedProgramLib<D> {
        Arc::new(Mutex::new(self))
    }

    // ========================================================================
    // Template Registry
    // ========================================================================

    /// Register a template.
    ///
    /// Registering a description whose hash equals the one already stored
    /// under the same name returns the existing template unchanged.
    pub fn define(&mut self, desc: &ShaderDescription) -> Result<Arc<Template>> {
        let hash = if desc.hash == 0 {
            desc.content_hash()
        } else {
            desc.hash
        };
        if let Some(existing) = self.templates.get(&desc.name)
            && existing.hash == hash
        {
            return Ok(Arc::clone(existing));
        }

        let template = Template::from_description(desc)?;

        if let Entry::Vacant(entry) = self.template_infos.entry(hash) {
            entry.insert(TemplateInfo::new(&template, &self.local_layout)?);
        }

        log::debug!(
            "Registered shader template '{}' (hash {hash}, {} define bits{})",
            template.name,
            template.total_bits,
            if template.uber { ", uber" } else { "" }
        );

        let template = Arc::new(template);
        if let Some(previous) = self.templates.insert(desc.name.clone(), Arc::clone(&template)) {
            if !self.templates.values().any(|t| t.hash == previous.hash) {
                self.template_infos.remove(&previous.hash);
            }
            log::debug!(
                "Template '{}' replaced (old hash {}); cached variants of the old version remain until destroyed",
                desc.name,
                previous.hash
            );
        }
        Ok(template)
    }

    pub fn get_template(&self, name: &str) -> Result<&Arc<Template>> {
        self.templates
            .get(name)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))
    }

    pub fn get_template_info(&self, name: &str) -> Result<&TemplateInfo<D>> {
        let hash = self.get_template(name)?.hash;
        self.template_infos
            .get(&hash)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))
    }

    /// Handle of a block member or sampler/texture of a template.
    pub fn get_handle(&self, name: &str, property: &str) -> Result<Option<PropertyHandle>> {
        Ok(self.get_template_info(name)?.handle_map.get(property).copied())
    }

    #[inline]
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of distinct template hashes with derived layout state.
    #[inline]
    #[must_use]
    pub fn template_info_count(&self) -> usize {
        self.template_infos.len()
    }

    // ========================================================================
    // Layout Cache
    // ========================================================================

    /// MATERIAL (`is_local == false`) or LOCAL set layout of a template.
    ///
    /// Both layouts are created on the first call for the template's hash.
    pub fn get_descriptor_set_layout(
        &mut self,
        device: &D,
        name: &str,
        is_local: bool,
    ) -> Result<&D::DescriptorSetLayout> {
        let hash = self.get_template(name)?.hash;
        let info = self
            .template_infos
            .get_mut(&hash)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))?;
        let layouts = info.ensure_set_layouts(device);
        Ok(if is_local {
            &layouts.local
        } else {
            &layouts.material
        })
    }

    // ========================================================================
    // Variant Keys & Shader Cache
    // ========================================================================

    /// Variant key of `macros` for a template. Pipeline macros are not
    /// merged in.
    pub fn get_key(&self, name: &str, macros: &MacroRecord) -> Result<String> {
        Ok(self.get_template(name)?.key(macros))
    }

    /// Compiled shader for a template and macro assignment, compiling it on a
    /// cache miss.
    ///
    /// A failed compilation is not cached; the next request retries.
    pub fn get_gfx_shader(
        &mut self,
        device: &D,
        pipeline: &PipelineState<D::DescriptorSetLayout>,
        name: &str,
        macros: &MacroRecord,
    ) -> Result<&D::Shader> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))?;
        let macros = macros.merged_with(&pipeline.macros);
        let key = template.key(&macros);

        let entry = match self.cache.entry(key) {
            Entry::Occupied(entry) => return Ok(&entry.into_mut().shader),
            Entry::Vacant(entry) => entry,
        };

        let info = self
            .template_infos
            .get_mut(&template.hash)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))?;

        let global = match &pipeline.global_set_layout {
            Some(layout) => layout,
            None => &*self.global_set_layout.get_or_insert_with(|| {
                log::debug!("Creating global set layout");
                device.create_descriptor_set_layout(&pipeline.global_layout.bindings)
            }),
        };
        info.ensure_pipeline_layout(device, global);

        let resolved = resolve_macros(&template.defines, &macros);
        let variant_name = instance_name(&template.name, &resolved);
        log::debug!("Compiling shader variant '{variant_name}' ({})", entry.key());

        let shader_info =
            build_shader_info(device, pipeline, template, info, &macros, &resolved, variant_name)?;

        if self.settings.dump_generated_sources {
            for stage in &shader_info.stages {
                log::trace!("{} {:?}:\n{}", shader_info.name, stage.stage, stage.source);
            }
        }

        let shader = device.create_shader(&shader_info).inspect_err(|e| {
            log::error!("Failed to create shader '{}': {e}", shader_info.name);
        })?;

        let cached = entry.insert(CachedShader {
            shader,
            template: template.name.clone(),
            instance_name: shader_info.name,
            macros: resolved,
        });
        Ok(&cached.shader)
    }

    #[inline]
    #[must_use]
    pub fn shader_count(&self) -> usize {
        self.cache.len()
    }

    /// Instance names of every cached variant, in no particular order.
    pub fn cached_variants(&self) -> impl Iterator<Item = &str> + '_ {
        self.cache.values().map(|c| c.instance_name.as_str())
    }

    /// Destroy every cached variant matching all `(name, value)` pairs of
    /// `macros`, returning how many were destroyed.
    ///
    /// By default a pair matches when `NAMEvalue` occurs in the variant's
    /// instance name. With
    /// [`strict_invalidation`](ProgramLibSettings::strict_invalidation) the
    /// variant's template must declare the define and the listed value must
    /// canonicalize to the variant's value. An empty record destroys nothing.
    pub fn destroy_shader_by_defines(&mut self, device: &D, macros: &MacroRecord) -> usize {
        if macros.is_empty() {
            return 0;
        }

        let doomed: Vec<String> = if self.settings.strict_invalidation {
            self.cache
                .iter()
                .filter(|(_, cached)| self.matches_exactly(cached, macros))
                .map(|(key, _)| key.clone())
                .collect()
        } else {
            let fragments: Vec<String> = macros
                .iter()
                .map(|(name, value)| format!("{name}{value}"))
                .collect();
            self.cache
                .iter()
                .filter(|(_, cached)| {
                    fragments
                        .iter()
                        .all(|f| cached.instance_name.contains(f.as_str()))
                })
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in &doomed {
            if let Some(cached) = self.cache.remove(key) {
                device.destroy_shader(cached.shader);
            }
        }

        if !doomed.is_empty() {
            log::info!("Destroyed {} shader variant(s) by defines", doomed.len());
        }
        doomed.len()
    }

    fn matches_exactly(&self, cached: &CachedShader<D::Shader>, macros: &MacroRecord) -> bool {
        let Some(template) = self.templates.get(&cached.template) else {
            return false;
        };
        macros.iter().all(|(name, value)| {
            let Some(mapper) = template.define(name).and_then(|d| d.mapper.as_ref()) else {
                return false;
            };
            let wanted: MacroValue = mapper.canonical(mapper.map(value));
            cached
                .macros
                .iter()
                .any(|m| m.name == name && m.value == wanted)
        })
    }

    /// Destroy the one cached variant of `macros`, if any.
    ///
    /// Pipeline macros are merged in exactly as [`get_gfx_shader`](Self::get_gfx_shader) does.
    pub fn destroy_shader(
        &mut self,
        device: &D,
        pipeline: &PipelineState<D::DescriptorSetLayout>,
        name: &str,
        macros: &MacroRecord,
    ) -> Result<bool> {
        let key = self.get_key(name, &macros.merged_with(&pipeline.macros))?;
        Ok(match self.cache.remove(&key) {
            Some(cached) => {
                device.destroy_shader(cached.shader);
                true
            }
            None => false,
        })
    }

    /// Drop a template with every cached variant. Its TemplateInfo and
    /// layouts go too unless another template shares the hash.
    ///
    /// Returns the number of destroyed variants.
    pub fn destroy_template(&mut self, device: &D, name: &str) -> Result<usize> {
        let template = self
            .templates
            .remove(name)
            .ok_or_else(|| ShaderLibError::TemplateNotFound(name.to_owned()))?;

        let doomed: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, cached)| cached.template == template.name)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            if let Some(cached) = self.cache.remove(key) {
                device.destroy_shader(cached.shader);
            }
        }

        if !self.templates.values().any(|t| t.hash == template.hash) {
            self.template_infos.remove(&template.hash);
        }

        log::debug!(
            "Destroyed template '{name}' and {} cached variant(s)",
            doomed.len()
        );
        Ok(doomed.len())
    }
}

/// Assemble the device input of one variant.
fn build_shader_info<D: GfxDevice>(
    device: &D,
    pipeline: &PipelineState<D::DescriptorSetLayout>,
    template: &Template,
    info: &TemplateInfo<D>,
    macros: &MacroRecord,
    resolved: &[ResolvedMacro],
    name: String,
) -> Result<ShaderInfo> {
    let language = device.shading_language();
    let Some(sources) = template.sources.get(language) else {
        log::error!(
            "Template '{}' has no source for shading language '{language}'",
            template.name
        );
        return Err(ShaderLibError::UnsupportedShadingLanguage {
            template: template.name.clone(),
            language: language.to_owned(),
        });
    };

    let mut resources = info.resources.clone();
    merge_builtins(
        &template.builtins.globals,
        &pipeline.global_layout,
        &mut resources,
        None,
    );

    let (vert, frag) = if language == WGSL {
        let statistics = &template.builtins.statistics;
        (
            render_wgsl(&sources.vert, resolved, statistics)?,
            render_wgsl(&sources.frag, resolved, statistics)?,
        )
    } else {
        let prefix = format!(
            "{}{}{}",
            pipeline.constant_macros,
            template.constant_macros,
            macro_prelude(resolved)
        );
        (
            format!("{prefix}{}", sources.vert),
            format!("{prefix}{}", sources.frag),
        )
    };

    Ok(ShaderInfo {
        name,
        stages: smallvec![
            ShaderStage {
                stage: ShaderStageFlags::VERTEX,
                source: vert,
            },
            ShaderStage {
                stage: ShaderStageFlags::FRAGMENT,
                source: frag,
            },
        ],
        attributes: info.active_attributes(macros),
        resources,
    })
}
