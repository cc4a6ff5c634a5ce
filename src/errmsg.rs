use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// how an error location is rendered, so IDEs can jump to it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrFormat {
    /// `file:line:0: error: msg`
    #[default]
    Gcc,
    /// `file(line): error: msg`
    Msvc,
}

/// a terminal error, pointing back into the shader bundle it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrMsg {
    pub file: PathBuf,
    /// zero-based line index into the bundle file
    pub line_index: usize,
    pub msg: String,
}

impl ErrMsg {
    pub fn error(file: impl AsRef<Path>, line_index: usize, msg: impl Into<String>) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            line_index,
            msg: msg.into(),
        }
    }

    pub fn as_string(&self, format: ErrFormat) -> String {
        let file = self.file.display();
        let line = self.line_index + 1;
        match format {
            ErrFormat::Gcc => format!("{file}:{line}:0: error: {}", self.msg),
            ErrFormat::Msvc => format!("{file}({line}): error: {}", self.msg),
        }
    }
}

impl std::fmt::Display for ErrMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string(ErrFormat::Gcc))
    }
}

impl std::error::Error for ErrMsg {}
