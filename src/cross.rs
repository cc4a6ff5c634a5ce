use log::*;
use serde::{Deserialize, Serialize};

use crate::compiler::{Backend, CompileOptions, Compiler};
use crate::errmsg::ErrMsg;
use crate::input::{Input, Spirv, SpirvBlob};
use crate::reflection::{Image, Reflection, UniformBlock};
use crate::slang::Slang;

pub mod binary;
pub mod bind_slots;
mod dump;
pub mod extract;
pub mod link;
pub mod unique;

pub use dump::write_reflection_info;

use bind_slots::*;
use extract::parse_reflection;
use link::validate_linking;
use unique::{gather_unique_images, gather_unique_uniform_blocks};

/// the translation of one blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSource {
    pub snippet_index: usize,
    pub source_code: String,
    pub refl: Reflection,
}

/// the translation of a whole bundle for one target language
#[derive(Debug, Clone)]
pub struct CrossResult {
    pub slang: Slang,
    /// in blob order
    pub sources: Vec<CrossSource>,
    pub unique_uniform_blocks: Vec<UniformBlock>,
    pub unique_images: Vec<Image>,
    pub error: Option<ErrMsg>,
}

impl CrossResult {
    pub fn new(slang: Slang) -> Self {
        Self {
            slang,
            sources: vec![],
            unique_uniform_blocks: vec![],
            unique_images: vec![],
            error: None,
        }
    }

    pub fn translate<B: Backend>(inp: &Input, spirv: &Spirv, slang: Slang, backend: &B) -> Self {
        let mut cross = CrossResult::new(slang);
        info!("translating {} shaders to {}", spirv.blobs.len(), slang);

        if let Err(err) = cross.translate_all(inp, spirv, backend) {
            error!("translation to {} failed: {}", slang, err);
            cross.error = Some(err);
        }

        cross
    }

    fn translate_all<B: Backend>(&mut self, inp: &Input, spirv: &Spirv, backend: &B) -> Result<(), ErrMsg> {
        for blob in &spirv.blobs {
            let src = translate_blob(inp, blob, self.slang, backend)?;
            self.sources.push(src);
        }

        gather_unique_uniform_blocks(&mut self.sources, &mut self.unique_uniform_blocks)
            .map_err(|conflict| inp.error(0, conflict.to_string()))?;
        gather_unique_images(&mut self.sources, &mut self.unique_images)
            .map_err(|conflict| inp.error(0, conflict.to_string()))?;
        debug!(
            "{}: {} unique uniform blocks, {} unique images",
            self.slang,
            self.unique_uniform_blocks.len(),
            self.unique_images.len()
        );

        validate_linking(inp, self)
    }

    pub fn find_source_by_snippet_index(&self, snippet_index: usize) -> Option<&CrossSource> {
        self.sources
            .iter()
            .find(|src| src.snippet_index == snippet_index)
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(mut self) -> Result<Self, ErrMsg> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

fn translate_blob<B: Backend>(
    inp: &Input,
    blob: &SpirvBlob,
    slang: Slang,
    backend: &B,
) -> Result<CrossSource, ErrMsg> {
    let snippet = inp.snippets.get(blob.snippet_index).ok_or_else(|| {
        inp.error(
            0,
            format!("SPIR-V blob refers to unknown snippet #{}", blob.snippet_index),
        )
    })?;
    let line_index = snippet.first_line();
    let failed = || inp.error(line_index, format!("Failed to cross-compile to {slang}."));

    let options = CompileOptions::new(slang, snippet.options(slang));
    let mut compiler = backend.create(blob, &options).map_err(|err| {
        error!("{} ({}): {}", snippet.name, slang, err);
        failed()
    })?;

    let convention = SlotConvention::for_slang(slang);
    fix_bind_slots(&mut compiler, snippet.kind.stage(), convention);
    if !slang.is_metal() {
        fix_ub_matrix_force_colmajor(&mut compiler);
    }
    if slang.is_glsl() {
        flatten_uniform_blocks(&mut compiler);
    }

    let source_code = compiler.compile();
    if source_code.is_empty() {
        return Err(failed());
    }

    let mut refl = parse_reflection(&compiler, convention)
        .map_err(|overflow| inp.error(line_index, overflow.to_string()))?;
    // the metal backend renames `main`
    if slang.is_metal() {
        refl.entry_point.push('0');
    }

    debug!(
        "{} ({}): {} inputs, {} outputs, {} uniform blocks, {} images",
        snippet.name,
        slang,
        refl.inputs.len(),
        refl.outputs.len(),
        refl.uniform_blocks.len(),
        refl.images.len()
    );

    Ok(CrossSource {
        snippet_index: blob.snippet_index,
        source_code,
        refl,
    })
}
