//! Recording device shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use myth_shader::device::{GfxDevice, ShaderInfo};
use myth_shader::errors::{Result, ShaderLibError};
use myth_shader::resources::DescriptorBinding;

#[derive(Debug)]
pub struct MockShader {
    pub id: usize,
    pub info: ShaderInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSetLayout {
    pub id: usize,
    pub bindings: Vec<DescriptorBinding>,
}

#[derive(Debug)]
pub struct MockPipelineLayout {
    pub set_layout_ids: Vec<usize>,
}

/// Counts every object it creates and destroys.
pub struct MockDevice {
    pub language: String,
    pub shaders_created: Cell<usize>,
    pub set_layouts_created: Cell<usize>,
    pub pipeline_layouts_created: Cell<usize>,
    pub destroyed: RefCell<Vec<String>>,
    /// Makes the next `create_shader` call fail.
    pub fail_next_shader: Cell<bool>,
    next_id: Cell<usize>,
}

impl MockDevice {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_owned(),
            shaders_created: Cell::new(0),
            set_layouts_created: Cell::new(0),
            pipeline_layouts_created: Cell::new(0),
            destroyed: RefCell::new(Vec::new()),
            fail_next_shader: Cell::new(false),
            next_id: Cell::new(0),
        }
    }

    pub fn glsl() -> Self {
        Self::new("glsl4")
    }

    fn next_id(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl GfxDevice for MockDevice {
    type Shader = MockShader;
    type DescriptorSetLayout = MockSetLayout;
    type PipelineLayout = MockPipelineLayout;

    fn shading_language(&self) -> &str {
        &self.language
    }

    fn create_shader(&self, info: &ShaderInfo) -> Result<MockShader> {
        if self.fail_next_shader.replace(false) {
            return Err(ShaderLibError::ShaderCreation {
                template: info.name.clone(),
                reason: "mock failure".into(),
            });
        }
        self.shaders_created.set(self.shaders_created.get() + 1);
        Ok(MockShader {
            id: self.next_id(),
            info: info.clone(),
        })
    }

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBinding]) -> MockSetLayout {
        self.set_layouts_created.set(self.set_layouts_created.get() + 1);
        MockSetLayout {
            id: self.next_id(),
            bindings: bindings.to_vec(),
        }
    }

    fn create_pipeline_layout(&self, set_layouts: &[&MockSetLayout]) -> MockPipelineLayout {
        self.pipeline_layouts_created
            .set(self.pipeline_layouts_created.get() + 1);
        MockPipelineLayout {
            set_layout_ids: set_layouts.iter().map(|l| l.id).collect(),
        }
    }

    fn destroy_shader(&self, shader: MockShader) {
        self.destroyed.borrow_mut().push(shader.info.name);
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
