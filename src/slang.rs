use serde::{Deserialize, Serialize};

/// a target shading language variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slang {
    Glsl330,
    Glsl100,
    Glsl300es,
    Hlsl5,
    MetalMacos,
    MetalIos,
    MetalSim,
    Wgpu,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown target language '{0}'")]
pub struct UnknownSlang(pub String);

impl Slang {
    pub const ALL: [Slang; 8] = [
        Slang::Glsl330,
        Slang::Glsl100,
        Slang::Glsl300es,
        Slang::Hlsl5,
        Slang::MetalMacos,
        Slang::MetalIos,
        Slang::MetalSim,
        Slang::Wgpu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Slang::Glsl330 => "glsl330",
            Slang::Glsl100 => "glsl100",
            Slang::Glsl300es => "glsl300es",
            Slang::Hlsl5 => "hlsl5",
            Slang::MetalMacos => "metal_macos",
            Slang::MetalIos => "metal_ios",
            Slang::MetalSim => "metal_sim",
            Slang::Wgpu => "wgpu",
        }
    }

    pub fn is_glsl(self) -> bool {
        matches!(self, Slang::Glsl330 | Slang::Glsl100 | Slang::Glsl300es)
    }

    pub fn is_metal(self) -> bool {
        matches!(self, Slang::MetalMacos | Slang::MetalIos | Slang::MetalSim)
    }

    /// WebGPU shares one descriptor set between the vertex and fragment
    /// uniform blocks, and splits images into a set per stage
    pub fn is_web_convention(self) -> bool {
        self == Slang::Wgpu
    }
}

impl std::fmt::Display for Slang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Slang {
    type Err = UnknownSlang;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Slang::ALL
            .into_iter()
            .find(|slang| slang.as_str() == s)
            .ok_or(UnknownSlang(s))
    }
}
