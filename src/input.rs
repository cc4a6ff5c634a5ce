use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errmsg::ErrMsg;
use crate::reflection::Stage;
use crate::slang::Slang;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnippetType {
    /// shared code included by shaders, never compiled on its own
    Block,
    Vs,
    Fs,
}

impl SnippetType {
    pub fn stage(self) -> Stage {
        match self {
            SnippetType::Block => Stage::Invalid,
            SnippetType::Vs => Stage::Vertex,
            SnippetType::Fs => Stage::Fragment,
        }
    }
}

/// per-target code generation switches of a snippet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetOptions {
    pub fixup_clipspace: bool,
    pub flip_vert_y: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SnippetType,
    /// zero-based line indices of the snippet in the bundle file
    #[serde(default)]
    pub lines: Vec<usize>,
    #[serde(default)]
    pub options: HashMap<Slang, SnippetOptions>,
}

impl Snippet {
    pub fn options(&self, slang: Slang) -> SnippetOptions {
        self.options.get(&slang).copied().unwrap_or_default()
    }

    pub fn first_line(&self) -> usize {
        self.lines.first().copied().unwrap_or(0)
    }
}

/// a vertex and a fragment shader that get linked together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub vs_name: String,
    pub fs_name: String,
    #[serde(default)]
    pub line_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    pub base_path: PathBuf,
    pub snippets: Vec<Snippet>,
    /// sorted by program name
    pub programs: BTreeMap<String, Program>,
    /// vertex shader name -> snippet index
    pub vs_map: HashMap<String, usize>,
    /// fragment shader name -> snippet index
    pub fs_map: HashMap<String, usize>,
}

impl Input {
    pub fn new(
        base_path: impl Into<PathBuf>,
        snippets: Vec<Snippet>,
        programs: impl IntoIterator<Item = Program>,
    ) -> Self {
        let mut vs_map = HashMap::new();
        let mut fs_map = HashMap::new();
        for (index, snippet) in snippets.iter().enumerate() {
            match snippet.kind {
                SnippetType::Vs => {
                    vs_map.insert(snippet.name.clone(), index);
                }
                SnippetType::Fs => {
                    fs_map.insert(snippet.name.clone(), index);
                }
                SnippetType::Block => {}
            }
        }

        let programs = programs
            .into_iter()
            .map(|prog| (prog.name.clone(), prog))
            .collect();

        Self {
            base_path: base_path.into(),
            snippets,
            programs,
            vs_map,
            fs_map,
        }
    }

    pub fn error(&self, line_index: usize, msg: impl Into<String>) -> ErrMsg {
        ErrMsg::error(&self.base_path, line_index, msg)
    }
}

#[derive(Debug, Clone)]
pub struct SpirvBlob {
    pub snippet_index: usize,
    pub stage: Stage,
    pub bytecode: Vec<u32>,
}

/// every compiled shader of a bundle, in snippet order
#[derive(Debug, Clone, Default)]
pub struct Spirv {
    pub blobs: Vec<SpirvBlob>,
}
