use std::path::{Path, PathBuf};

use log::*;
use serde::Deserialize;

use crate::compiler::SpirvBackend;
use crate::cross::CrossResult;
use crate::cross::binary::write_binary_reflection;
use crate::errmsg::ErrFormat;
use crate::input::{Input, Program, Snippet, SnippetType, Spirv, SpirvBlob};
use crate::slang::Slang;

pub struct Config {
    /// the json manifest describing the shader bundle
    pub manifest_path: PathBuf,
    /// the directory to write reflection, sources and dumps to
    pub compiled_shaders_dir: PathBuf,
    /// the target languages to translate for
    pub targets: Vec<Slang>,
    /// whether to write a `<slang>.dump.txt` per target
    pub write_debug_dump: bool,
    pub err_format: ErrFormat,
}

/// the shader bundle, as written by the front end compiling it to SPIR-V
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// the bundle source file errors point into, relative to the manifest
    pub source: PathBuf,
    pub snippets: Vec<ManifestSnippet>,
    #[serde(default)]
    pub programs: Vec<Program>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestSnippet {
    #[serde(flatten)]
    pub snippet: Snippet,
    /// the compiled SPIR-V of a vs or fs snippet, relative to the manifest
    #[serde(default)]
    pub spirv: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("snippet '{0}' has no SPIR-V")]
    MissingSpirv(String),
    #[error("snippet '{0}' is a block, blocks don't have SPIR-V")]
    UnexpectedSpirv(String),
    #[error("{}: SPIR-V must be a sequence of 32-bit words, got {len} bytes", path.display())]
    UnalignedSpirv { path: PathBuf, len: usize },
}

fn read(path: &Path) -> Result<Vec<u8>, ManifestError> {
    std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn spirv_words(path: &Path, bytes: &[u8]) -> Result<Vec<u32>, ManifestError> {
    if bytes.len() % 4 != 0 {
        return Err(ManifestError::UnalignedSpirv {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}

/// reads the manifest and the SPIR-V of every vs and fs snippet
pub fn load_bundle(manifest_path: &Path) -> Result<(Input, Spirv), ManifestError> {
    let json = read(manifest_path)?;
    let manifest: Manifest = serde_json::from_slice(&json).map_err(|source| ManifestError::Json {
        path: manifest_path.to_path_buf(),
        source,
    })?;
    let manifest_dir = manifest_path.parent().unwrap_or(Path::new(""));

    let mut snippets = vec![];
    let mut spirv = Spirv::default();
    for (snippet_index, ManifestSnippet { snippet, spirv: spirv_path }) in
        manifest.snippets.into_iter().enumerate()
    {
        match (snippet.kind, spirv_path) {
            (SnippetType::Block, None) => {}
            (SnippetType::Block, Some(_)) => {
                return Err(ManifestError::UnexpectedSpirv(snippet.name));
            }
            (_, None) => return Err(ManifestError::MissingSpirv(snippet.name)),
            (kind, Some(spirv_path)) => {
                let path = manifest_dir.join(spirv_path);
                let bytecode = spirv_words(&path, &read(&path)?)?;
                debug!("{}: {} SPIR-V words", snippet.name, bytecode.len());
                spirv.blobs.push(SpirvBlob {
                    snippet_index,
                    stage: kind.stage(),
                    bytecode,
                });
            }
        }
        snippets.push(snippet);
    }

    let inp = Input::new(manifest_dir.join(&manifest.source), snippets, manifest.programs);
    Ok((inp, spirv))
}

pub fn write_precompiled_shaders(config: &Config) -> anyhow::Result<()> {
    let (inp, spirv) = load_bundle(&config.manifest_path)?;

    std::fs::create_dir_all(&config.compiled_shaders_dir)?;

    for &slang in &config.targets {
        let cross = match CrossResult::translate(&inp, &spirv, slang, &SpirvBackend).into_result() {
            Ok(cross) => cross,
            Err(err) => anyhow::bail!("{}", err.as_string(config.err_format)),
        };

        for source in &cross.sources {
            let Some(snippet) = inp.snippets.get(source.snippet_index) else {
                anyhow::bail!("no snippet #{} in the bundle", source.snippet_index);
            };

            let file_name = |ext: &str| format!("{}.{}.{}", snippet.name, slang, ext);

            let mut bin = vec![];
            write_binary_reflection(&mut bin, &source.refl);
            let bin_path = config.compiled_shaders_dir.join(file_name("bin"));
            std::fs::write(bin_path, bin)?;

            let reflection_json = serde_json::to_string_pretty(&source.refl)?;
            let json_path = config.compiled_shaders_dir.join(file_name("json"));
            std::fs::write(json_path, reflection_json)?;

            // the SPIR-V backend's output is the module's disassembly
            let source_path = config.compiled_shaders_dir.join(file_name("spvasm"));
            std::fs::write(source_path, &source.source_code)?;
        }

        if config.write_debug_dump {
            let mut dump = vec![];
            cross.dump_debug(&mut dump, config.err_format)?;
            let dump_path = config.compiled_shaders_dir.join(format!("{slang}.dump.txt"));
            std::fs::write(dump_path, dump)?;
        }

        info!(
            "{}: wrote reflection for {} shaders to {}",
            slang,
            cross.sources.len(),
            config.compiled_shaders_dir.display()
        );
    }

    Ok(())
}
