use rspirv::spirv::Dim;
use serde::{Deserialize, Serialize};

use crate::compiler::{BaseType, ImageDesc, TypeDesc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UniformType {
    /// a layout the runtime can't upload, don't rely on it
    #[default]
    Invalid,
    Float,
    Float2,
    Float3,
    Float4,
    Mat4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageType {
    #[default]
    Invalid,
    #[serde(rename = "2d")]
    Image2D,
    Cube,
    #[serde(rename = "3d")]
    Image3D,
    Array,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageBaseType {
    #[default]
    Float,
    Sint,
    Uint,
}

impl UniformType {
    pub fn as_str(self) -> &'static str {
        match self {
            UniformType::Invalid => "invalid",
            UniformType::Float => "float",
            UniformType::Float2 => "float2",
            UniformType::Float3 => "float3",
            UniformType::Float4 => "float4",
            UniformType::Mat4 => "mat4",
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            UniformType::Invalid => 0,
            UniformType::Float => 1,
            UniformType::Float2 => 2,
            UniformType::Float3 => 3,
            UniformType::Float4 => 4,
            UniformType::Mat4 => 5,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(UniformType::Invalid),
            1 => Some(UniformType::Float),
            2 => Some(UniformType::Float2),
            3 => Some(UniformType::Float3),
            4 => Some(UniformType::Float4),
            5 => Some(UniformType::Mat4),
            _ => None,
        }
    }
}

impl ImageType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Invalid => "invalid",
            ImageType::Image2D => "2d",
            ImageType::Cube => "cube",
            ImageType::Image3D => "3d",
            ImageType::Array => "array",
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ImageType::Invalid => 0,
            ImageType::Image2D => 1,
            ImageType::Cube => 2,
            ImageType::Image3D => 3,
            ImageType::Array => 4,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ImageType::Invalid),
            1 => Some(ImageType::Image2D),
            2 => Some(ImageType::Cube),
            3 => Some(ImageType::Image3D),
            4 => Some(ImageType::Array),
            _ => None,
        }
    }
}

impl ImageBaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageBaseType::Float => "float",
            ImageBaseType::Sint => "sint",
            ImageBaseType::Uint => "uint",
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ImageBaseType::Float => 0,
            ImageBaseType::Sint => 1,
            ImageBaseType::Uint => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ImageBaseType::Float),
            1 => Some(ImageBaseType::Sint),
            2 => Some(ImageBaseType::Uint),
            _ => None,
        }
    }
}

/// float scalars and vectors map to their float type, 4x4 float matrices to
/// mat4, everything else is unsupported
pub fn uniform_type(ty: &TypeDesc) -> UniformType {
    if ty.base_type != BaseType::Float {
        return UniformType::Invalid;
    }

    match (ty.columns, ty.vecsize) {
        (1, 1) => UniformType::Float,
        (1, 2) => UniformType::Float2,
        (1, 3) => UniformType::Float3,
        (1, 4) => UniformType::Float4,
        (4, 4) => UniformType::Mat4,
        _ => UniformType::Invalid,
    }
}

pub fn image_type(image: &ImageDesc) -> ImageType {
    match (image.arrayed, image.dim) {
        (true, Dim::Dim2D) => ImageType::Array,
        (false, Dim::Dim2D) => ImageType::Image2D,
        (false, Dim::DimCube) => ImageType::Cube,
        (false, Dim::Dim3D) => ImageType::Image3D,
        _ => ImageType::Invalid,
    }
}

/// the sample type of an image, from the base type of its sampled type
pub fn image_base_type(base_type: BaseType) -> ImageBaseType {
    match base_type {
        BaseType::SByte | BaseType::Short | BaseType::Int => ImageBaseType::Sint,
        BaseType::UByte | BaseType::UShort | BaseType::UInt => ImageBaseType::Uint,
        _ => ImageBaseType::Float,
    }
}
