use rspirv::spirv::{Decoration, Dim, ExecutionModel, Word};

use crate::input::{SnippetOptions, SpirvBlob};
use crate::slang::Slang;

mod spirv_module;
pub use spirv_module::*;

pub type Id = Word;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: Id,
    /// the variable's type, arrays included
    pub type_id: Id,
    /// the variable's type with arrays stripped
    pub base_type_id: Id,
    /// uniform blocks are named after their block type, everything else after the variable
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderResources {
    pub uniform_buffers: Vec<Resource>,
    pub sampled_images: Vec<Resource>,
    pub stage_inputs: Vec<Resource>,
    pub stage_outputs: Vec<Resource>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BaseType {
    #[default]
    Unknown,
    Void,
    Boolean,
    SByte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Int64,
    UInt64,
    Half,
    Float,
    Double,
    Struct,
    Image,
    SampledImage,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    /// the scalar type a sample returns
    pub sampled_type: Id,
    pub dim: Dim,
    pub depth: bool,
    pub arrayed: bool,
    pub multisampled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDesc {
    pub base_type: BaseType,
    /// bit width of the scalar components
    pub width: u32,
    pub vecsize: u32,
    pub columns: u32,
    /// array lengths, innermost first; 0 for runtime arrays
    pub array: Vec<u32>,
    pub member_types: Vec<Id>,
    pub image: Option<ImageDesc>,
}

impl TypeDesc {
    pub fn scalar(base_type: BaseType, width: u32) -> Self {
        Self {
            base_type,
            width,
            vecsize: 1,
            columns: 1,
            ..Default::default()
        }
    }

    pub fn vector(mut self, vecsize: u32) -> Self {
        self.vecsize = vecsize;
        self
    }

    pub fn matrix(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn array(mut self, length: u32) -> Self {
        self.array.push(length);
        self
    }

    pub fn structure(member_types: Vec<Id>) -> Self {
        Self {
            base_type: BaseType::Struct,
            member_types,
            ..Default::default()
        }
    }

    pub fn image(base_type: BaseType, image: ImageDesc) -> Self {
        Self {
            base_type,
            image: Some(image),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub execution_model: ExecutionModel,
}

pub trait Compiler {
    /// the execution model of the default entry point
    fn execution_model(&self) -> ExecutionModel;

    fn entry_points(&self) -> Vec<EntryPoint>;

    fn shader_resources(&self) -> ShaderResources;

    fn type_desc(&self, id: Id) -> TypeDesc;

    /// the literal of a decoration, 1 for flag decorations, 0 if missing
    fn decoration(&self, id: Id, decoration: Decoration) -> u32;

    fn set_decoration(&mut self, id: Id, decoration: Decoration, value: u32);

    fn member_decoration(&self, id: Id, index: u32, decoration: Decoration) -> u32;

    fn set_member_decoration(&mut self, id: Id, index: u32, decoration: Decoration, value: u32);

    fn member_name(&self, id: Id, index: u32) -> String;

    fn declared_struct_size(&self, id: Id) -> u32;

    fn struct_member_offset(&self, id: Id, index: u32) -> u32 {
        self.member_decoration(id, index, Decoration::Offset)
    }

    /// turns a uniform block into a plain vec4 array, only GLSL backends do this
    fn flatten_buffer_block(&mut self, _id: Id) {}

    /// the generated target source, empty if generation failed
    fn compile(&mut self) -> String;
}

/// creates a compiler for one blob and target
pub trait Backend {
    type Compiler: Compiler;
    type Error: std::fmt::Display;

    fn create(
        &self,
        blob: &SpirvBlob,
        options: &CompileOptions,
    ) -> Result<Self::Compiler, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MslPlatform {
    MacOs,
    Ios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOptions {
    Glsl {
        version: u32,
        es: bool,
        vulkan_semantics: bool,
        enable_420pack_extension: bool,
    },
    Hlsl {
        shader_model: u32,
        point_size_compat: bool,
    },
    Msl {
        platform: MslPlatform,
        enable_decoration_binding: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub target: TargetOptions,
    pub emit_line_directives: bool,
    pub fixup_clipspace: bool,
    pub flip_vert_y: bool,
}

impl CompileOptions {
    pub fn new(slang: Slang, snippet_options: SnippetOptions) -> Self {
        let glsl = |version, es, vulkan_semantics| TargetOptions::Glsl {
            version,
            es,
            vulkan_semantics,
            enable_420pack_extension: false,
        };
        let msl = |platform| TargetOptions::Msl {
            platform,
            enable_decoration_binding: true,
        };

        let target = match slang {
            Slang::Glsl330 => glsl(330, false, false),
            Slang::Glsl100 => glsl(100, true, false),
            Slang::Glsl300es => glsl(300, true, false),
            Slang::Hlsl5 => TargetOptions::Hlsl {
                shader_model: 50,
                point_size_compat: true,
            },
            Slang::MetalMacos => msl(MslPlatform::MacOs),
            Slang::MetalIos | Slang::MetalSim => msl(MslPlatform::Ios),
            // compiled as vulkan glsl only to get at the reflection
            Slang::Wgpu => glsl(450, false, true),
        };

        Self {
            target,
            emit_line_directives: !slang.is_glsl() && !slang.is_web_convention(),
            fixup_clipspace: snippet_options.fixup_clipspace,
            flip_vert_y: snippet_options.flip_vert_y,
        }
    }
}
