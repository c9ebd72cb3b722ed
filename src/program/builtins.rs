//! Builtin Binding Merger
//!
//! Engine-owned uniform blocks, sampler/textures and storage images (camera
//! data, per-draw transforms, shadow maps ...) live in builtin layout tables.
//! Templates reference them by name and [`merge_builtins`] injects the
//! resolved descriptors and bindings into the template's own lists.
//!
//! Missing or mistyped builtins are skipped with a warning. This tolerates
//! partially initialised engine builtins during startup.

use rustc_hash::FxHashMap;

use crate::resources::description::BuiltinRefSet;
use crate::resources::types::{
    DescriptorBinding, DescriptorType, ShaderResources, UniformBlock, UniformSamplerTexture,
    UniformStorageImage,
};

/// A builtin resource as resolved by a layout table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinResource {
    Block(UniformBlock),
    SamplerTexture(UniformSamplerTexture),
    Image(UniformStorageImage),
}

impl BuiltinResource {
    #[must_use]
    pub fn binding(&self) -> u32 {
        match self {
            Self::Block(b) => b.binding,
            Self::SamplerTexture(s) => s.binding,
            Self::Image(i) => i.binding,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Block(b) => &b.name,
            Self::SamplerTexture(s) => &s.name,
            Self::Image(i) => &i.name,
        }
    }

    fn accepts(&self, ty: DescriptorType) -> bool {
        match self {
            Self::Block(_) => ty.is_buffer(),
            Self::SamplerTexture(_) => ty.is_sampler(),
            Self::Image(_) => ty.is_image(),
        }
    }
}

/// Layout of one builtin descriptor set (global or local).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinLayoutTable {
    pub bindings: Vec<DescriptorBinding>,
    pub layouts: FxHashMap<String, BuiltinResource>,
}

impl BuiltinLayoutTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource together with its binding entry.
    ///
    /// A binding with the same number replaces the previous one.
    pub fn insert(&mut self, resource: BuiltinResource, binding: DescriptorBinding) {
        match self.bindings.iter_mut().find(|b| b.binding == binding.binding) {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
        self.layouts.insert(resource.name().to_owned(), resource);
    }

    #[must_use]
    pub fn with_block(mut self, block: UniformBlock, binding: DescriptorBinding) -> Self {
        self.insert(BuiltinResource::Block(block), binding);
        self
    }

    #[must_use]
    pub fn with_sampler_texture(
        mut self,
        sampler: UniformSamplerTexture,
        binding: DescriptorBinding,
    ) -> Self {
        self.insert(BuiltinResource::SamplerTexture(sampler), binding);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: UniformStorageImage, binding: DescriptorBinding) -> Self {
        self.insert(BuiltinResource::Image(image), binding);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BuiltinResource> {
        self.layouts.get(name)
    }

    fn binding_for(&self, number: u32) -> Option<&DescriptorBinding> {
        self.bindings.iter().find(|b| b.binding == number)
    }
}

/// Outcome of one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub injected: usize,
    pub skipped: Vec<String>,
}

/// Inject the builtins named by `refs` into `resources` and, when given,
/// `bindings`.
///
/// Descriptors already present by name are not appended again and bindings
/// are deduplicated by number, so repeated merges are idempotent. `bindings`
/// is sorted by binding number on return. Global builtins pass `None`: their
/// bindings belong to the pipeline's own set layout.
pub fn merge_builtins(
    refs: &BuiltinRefSet,
    table: &BuiltinLayoutTable,
    resources: &mut ShaderResources,
    mut bindings: Option<&mut Vec<DescriptorBinding>>,
) -> MergeReport {
    let mut report = MergeReport::default();

    let names = refs
        .blocks
        .iter()
        .chain(&refs.sampler_textures)
        .chain(&refs.images);

    for name in names {
        let Some(resource) = table.get(name) else {
            log::warn!("Builtin '{name}' not found in layout table, skipping");
            report.skipped.push(name.clone());
            continue;
        };

        let Some(binding) = table.binding_for(resource.binding()) else {
            log::warn!(
                "Builtin '{name}' refers to binding {} which the layout table does not declare, skipping",
                resource.binding()
            );
            report.skipped.push(name.clone());
            continue;
        };

        if !resource.accepts(binding.descriptor_type) {
            log::warn!(
                "Builtin '{name}' is bound as {:?} which does not match its resource kind, skipping",
                binding.descriptor_type
            );
            report.skipped.push(name.clone());
            continue;
        }

        match resource {
            BuiltinResource::Block(block) => {
                if !resources.blocks.iter().any(|b| b.name == block.name) {
                    resources.blocks.push(block.clone());
                }
            }
            BuiltinResource::SamplerTexture(sampler) => {
                if !resources.sampler_textures.iter().any(|s| s.name == sampler.name) {
                    resources.sampler_textures.push(sampler.clone());
                }
            }
            BuiltinResource::Image(image) => {
                if !resources.images.iter().any(|i| i.name == image.name) {
                    resources.images.push(image.clone());
                }
            }
        }

        if let Some(bindings) = bindings.as_deref_mut()
            && !bindings.iter().any(|b| b.binding == binding.binding)
        {
            bindings.push(*binding);
        }
        report.injected += 1;
    }

    if let Some(bindings) = bindings {
        bindings.sort_by_key(|b| b.binding);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::types::{DataType, SetIndex, ShaderStageFlags, Uniform};

    fn block(name: &str, binding: u32) -> UniformBlock {
        UniformBlock {
            set: SetIndex::Local,
            binding,
            name: name.into(),
            members: vec![Uniform {
                name: "matWorld".into(),
                data_type: DataType::Mat4,
                count: 1,
            }],
            count: 1,
        }
    }

    fn buffer_binding(binding: u32) -> DescriptorBinding {
        DescriptorBinding::new(
            binding,
            DescriptorType::UniformBuffer,
            1,
            ShaderStageFlags::VERTEX_FRAGMENT,
        )
    }

    fn local_table() -> BuiltinLayoutTable {
        BuiltinLayoutTable::new()
            .with_block(block("CCLocal", 3), buffer_binding(3))
            .with_block(block("CCMorph", 1), buffer_binding(1))
            .with_sampler_texture(
                UniformSamplerTexture {
                    set: SetIndex::Local,
                    binding: 5,
                    name: "cc_jointTexture".into(),
                    data_type: DataType::Sampler2D,
                    count: 1,
                },
                DescriptorBinding::new(
                    5,
                    DescriptorType::SamplerTexture,
                    1,
                    ShaderStageFlags::VERTEX,
                ),
            )
    }

    fn refs(blocks: &[&str], samplers: &[&str]) -> BuiltinRefSet {
        BuiltinRefSet {
            blocks: blocks.iter().map(|s| (*s).to_owned()).collect(),
            sampler_textures: samplers.iter().map(|s| (*s).to_owned()).collect(),
            images: Vec::new(),
        }
    }

    #[test]
    fn merged_bindings_are_sorted() {
        let mut resources = ShaderResources::default();
        let mut bindings = Vec::new();
        let report = merge_builtins(
            &refs(&["CCLocal", "CCMorph"], &["cc_jointTexture"]),
            &local_table(),
            &mut resources,
            Some(&mut bindings),
        );

        assert_eq!(report.injected, 3);
        let numbers: Vec<_> = bindings.iter().map(|b| b.binding).collect();
        assert_eq!(numbers, [1, 3, 5]);
        assert_eq!(resources.blocks.len(), 2);
        assert_eq!(resources.sampler_textures.len(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let table = local_table();
        let wanted = refs(&["CCLocal"], &["cc_jointTexture"]);
        let mut resources = ShaderResources::default();
        let mut bindings = Vec::new();

        merge_builtins(&wanted, &table, &mut resources, Some(&mut bindings));
        let first = (resources.clone(), bindings.clone());
        merge_builtins(&wanted, &table, &mut resources, Some(&mut bindings));

        assert_eq!((resources, bindings), first);
    }

    #[test]
    fn missing_builtin_is_skipped() {
        let mut resources = ShaderResources::default();
        let mut bindings = Vec::new();
        let report = merge_builtins(
            &refs(&["CCLocal", "CCDoesNotExist"], &[]),
            &local_table(),
            &mut resources,
            Some(&mut bindings),
        );

        assert_eq!(report.injected, 1);
        assert_eq!(report.skipped, ["CCDoesNotExist"]);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn incompatible_descriptor_type_is_skipped() {
        let table = BuiltinLayoutTable::new().with_block(
            block("CCLocal", 0),
            DescriptorBinding::new(0, DescriptorType::SamplerTexture, 1, ShaderStageFlags::VERTEX),
        );
        let mut resources = ShaderResources::default();
        let mut bindings = Vec::new();
        let report = merge_builtins(
            &refs(&["CCLocal"], &[]),
            &table,
            &mut resources,
            Some(&mut bindings),
        );

        assert_eq!(report.injected, 0);
        assert!(resources.blocks.is_empty());
        assert!(bindings.is_empty());
    }

    #[test]
    fn existing_binding_number_is_not_duplicated() {
        let mut resources = ShaderResources::default();
        let mut bindings = vec![buffer_binding(3)];
        merge_builtins(
            &refs(&["CCLocal"], &[]),
            &local_table(),
            &mut resources,
            Some(&mut bindings),
        );

        assert_eq!(bindings.len(), 1);
        assert_eq!(resources.blocks.len(), 1);
    }

    #[test]
    fn global_merge_leaves_bindings_alone() {
        let mut resources = ShaderResources::default();
        let report = merge_builtins(&refs(&["CCLocal"], &[]), &local_table(), &mut resources, None);

        assert_eq!(report.injected, 1);
        assert_eq!(resources.blocks[0].name, "CCLocal");
    }
}
