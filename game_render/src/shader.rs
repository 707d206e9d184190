//! The in-memory shader object returned by a successful load (§4.5 "Shader specifics").
//!
//! Loading a shader does no GPU work: the object only carries both stages' SPIR-V words and the
//! reflected [`ParameterSheet`] produced by the (out-of-scope) translator. Module creation is
//! lazy, deferred to [`crate::material::SharedMaterialFactory`] the first time a material needs
//! this shader.

use game_asset::intermediate::ParameterSheet;

#[derive(Clone, Debug)]
pub struct Shader {
    name: String,
    vs: Vec<u32>,
    fs: Vec<u32>,
    parameter_sheet: ParameterSheet,
}

impl Shader {
    pub(crate) fn new(name: String, vs: Vec<u32>, fs: Vec<u32>, parameter_sheet: ParameterSheet) -> Self {
        Self {
            name,
            vs,
            fs,
            parameter_sheet,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vs(&self) -> &[u32] {
        &self.vs
    }

    pub fn fs(&self) -> &[u32] {
        &self.fs
    }

    pub fn parameter_sheet(&self) -> &ParameterSheet {
        &self.parameter_sheet
    }

    /// The cache key the shared-material factory keys its `(pipeline-layout, pipeline)` cache on
    /// (§4.8 step 1: "If `cache[shader.hash]` exists...").
    pub fn hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.vs.hash(&mut hasher);
        self.fs.hash(&mut hasher);
        self.parameter_sheet.hash(&mut hasher);
        hasher.finish()
    }
}
