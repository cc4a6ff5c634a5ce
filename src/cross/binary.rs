use crate::reflection::*;

pub const MAGIC: &[u8; 4] = b"SHDC";
pub const BINARY_FORMAT_VERSION: u16 = 1;

// strings are a u16 byte length plus the bytes; values that don't fit their
// field panic
pub fn write_binary_reflection(out: &mut Vec<u8>, refl: &Reflection) {
    out.extend_from_slice(MAGIC);
    write_u16(out, BINARY_FORMAT_VERSION);

    out.push(refl.stage.to_byte());
    write_string(out, &refl.entry_point);

    write_attrs(out, &refl.inputs);
    write_attrs(out, &refl.outputs);

    write_u16(out, checked_u16(refl.uniform_blocks.len(), "uniform block count"));
    for ub in &refl.uniform_blocks {
        write_uniform_block(out, ub);
    }

    write_u16(out, checked_u16(refl.images.len(), "image count"));
    for img in &refl.images {
        write_image(out, img);
    }
}

fn checked_u16(value: usize, field: &str) -> u16 {
    match u16::try_from(value) {
        Ok(value) => value,
        Err(_) => panic!("{field} {value} doesn't fit into a u16"),
    }
}

fn checked_u8(value: usize, field: &str) -> u8 {
    match u8::try_from(value) {
        Ok(value) => value,
        Err(_) => panic!("{field} {value} doesn't fit into a u8"),
    }
}

fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    assert!(
        s.len() <= usize::from(u16::MAX),
        "string of {} bytes is too long for binary reflection",
        s.len()
    );
    write_u16(out, s.len() as u16);
    out.extend_from_slice(s.as_bytes());
}

fn write_attrs(out: &mut Vec<u8>, attrs: &AttrSlots) {
    write_u16(out, checked_u16(attrs.len(), "attribute count"));
    for attr in attrs.iter() {
        write_string(out, &attr.name);
        write_u16(out, attr.slot);
        write_string(out, &attr.sem_name);
        out.push(checked_u8(usize::from(attr.sem_index), "semantic index"));
    }
}

fn write_uniform_block(out: &mut Vec<u8>, ub: &UniformBlock) {
    write_u16(out, checked_u16(ub.uniforms.len(), "uniform count"));
    for uniform in &ub.uniforms {
        write_string(out, &uniform.name);
        out.push(uniform.ty.to_byte());
        write_u16(out, checked_u16(uniform.array_count as usize, "array count"));
        write_u16(out, checked_u16(uniform.offset as usize, "uniform offset"));
    }
}

fn write_image(out: &mut Vec<u8>, img: &Image) {
    write_string(out, &img.name);
    write_u16(out, checked_u16(img.slot as usize, "image slot"));
    out.push(img.ty.to_byte());
    out.push(img.base_type.to_byte());
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("bad magic {0:?}, not a binary reflection")]
    BadMagic([u8; 4]),
    #[error("unsupported binary reflection version {0}")]
    UnsupportedVersion(u16),
    #[error("binary reflection ends unexpectedly")]
    UnexpectedEof,
    #[error("invalid {field} byte {value}")]
    InvalidEnum { field: &'static str, value: u8 },
    #[error("invalid utf-8 in binary reflection string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// what the binary format keeps of a [`Reflection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryReflection {
    pub stage: Stage,
    pub entry_point: String,
    pub inputs: Vec<Attr>,
    pub outputs: Vec<Attr>,
    pub uniform_blocks: Vec<BinaryUniformBlock>,
    pub images: Vec<BinaryImage>,
}

/// block name, slot and size are not part of the format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryUniformBlock {
    pub uniforms: Vec<Uniform>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    pub name: String,
    pub slot: u32,
    pub ty: ImageType,
    pub base_type: ImageBaseType,
}

impl From<&Reflection> for BinaryReflection {
    fn from(refl: &Reflection) -> Self {
        Self {
            stage: refl.stage,
            entry_point: refl.entry_point.clone(),
            inputs: refl.inputs.iter().cloned().collect(),
            outputs: refl.outputs.iter().cloned().collect(),
            uniform_blocks: refl
                .uniform_blocks
                .iter()
                .map(|ub| BinaryUniformBlock {
                    uniforms: ub.uniforms.clone(),
                })
                .collect(),
            images: refl
                .images
                .iter()
                .map(|img| BinaryImage {
                    name: img.name.clone(),
                    slot: img.slot,
                    ty: img.ty,
                    base_type: img.base_type,
                })
                .collect(),
        }
    }
}

/// reads one reflection record and advances `bytes` past it
pub fn read_binary_reflection(bytes: &mut &[u8]) -> Result<BinaryReflection, ReadError> {
    let magic = take(bytes, 4)?;
    if magic != MAGIC {
        return Err(ReadError::BadMagic([magic[0], magic[1], magic[2], magic[3]]));
    }
    let version = read_u16(bytes)?;
    if version != BINARY_FORMAT_VERSION {
        return Err(ReadError::UnsupportedVersion(version));
    }

    let stage = read_enum(bytes, "stage", Stage::from_byte)?;
    let entry_point = read_string(bytes)?;
    let inputs = read_attrs(bytes)?;
    let outputs = read_attrs(bytes)?;

    let ub_count = read_u16(bytes)?;
    let mut uniform_blocks = Vec::with_capacity(usize::from(ub_count));
    for _ in 0..ub_count {
        let count = read_u16(bytes)?;
        let mut uniforms = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            uniforms.push(Uniform {
                name: read_string(bytes)?,
                ty: read_enum(bytes, "uniform type", UniformType::from_byte)?,
                array_count: u32::from(read_u16(bytes)?),
                offset: u32::from(read_u16(bytes)?),
            });
        }
        uniform_blocks.push(BinaryUniformBlock { uniforms });
    }

    let img_count = read_u16(bytes)?;
    let mut images = Vec::with_capacity(usize::from(img_count));
    for _ in 0..img_count {
        images.push(BinaryImage {
            name: read_string(bytes)?,
            slot: u32::from(read_u16(bytes)?),
            ty: read_enum(bytes, "image type", ImageType::from_byte)?,
            base_type: read_enum(bytes, "image base type", ImageBaseType::from_byte)?,
        });
    }

    Ok(BinaryReflection {
        stage,
        entry_point,
        inputs,
        outputs,
        uniform_blocks,
        images,
    })
}

fn take<'a>(bytes: &mut &'a [u8], len: usize) -> Result<&'a [u8], ReadError> {
    if bytes.len() < len {
        return Err(ReadError::UnexpectedEof);
    }
    let (head, tail) = bytes.split_at(len);
    *bytes = tail;
    Ok(head)
}

fn read_u8(bytes: &mut &[u8]) -> Result<u8, ReadError> {
    Ok(take(bytes, 1)?[0])
}

fn read_u16(bytes: &mut &[u8]) -> Result<u16, ReadError> {
    let b = take(bytes, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_string(bytes: &mut &[u8]) -> Result<String, ReadError> {
    let len = read_u16(bytes)?;
    let s = std::str::from_utf8(take(bytes, usize::from(len))?)?;
    Ok(s.to_string())
}

fn read_enum<T>(
    bytes: &mut &[u8],
    field: &'static str,
    from_byte: fn(u8) -> Option<T>,
) -> Result<T, ReadError> {
    let value = read_u8(bytes)?;
    from_byte(value).ok_or(ReadError::InvalidEnum { field, value })
}

fn read_attrs(bytes: &mut &[u8]) -> Result<Vec<Attr>, ReadError> {
    let count = read_u16(bytes)?;
    let mut attrs = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        attrs.push(Attr {
            name: read_string(bytes)?,
            slot: read_u16(bytes)?,
            sem_name: read_string(bytes)?,
            sem_index: u16::from(read_u8(bytes)?),
        });
    }
    Ok(attrs)
}
