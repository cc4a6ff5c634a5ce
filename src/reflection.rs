use serde::{Deserialize, Serialize};

mod type_mapping;
pub use type_mapping::*;

/// the number of attribute locations a stage may use
pub const MAX_ATTRS: usize = 16;

/// every stage attribute gets this semantic name, with the slot as index
pub const SEMANTIC_NAME: &str = "TEXCOORD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Invalid,
    Vertex,
    Fragment,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Invalid => "invalid",
            Stage::Vertex => "vs",
            Stage::Fragment => "fs",
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Stage::Invalid => 0,
            Stage::Vertex => 1,
            Stage::Fragment => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Stage::Invalid),
            1 => Some(Stage::Vertex),
            2 => Some(Stage::Fragment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub slot: u16,
    pub name: String,
    pub sem_name: String,
    pub sem_index: u16,
}

impl Attr {
    pub fn new(slot: u16, name: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
            sem_name: SEMANTIC_NAME.to_string(),
            sem_index: slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attribute '{name}' uses location {location}, but only {max} locations are supported", max = MAX_ATTRS)]
pub struct SlotOverflow {
    pub name: String,
    pub location: u32,
}

/// stage attributes indexed by location
///
/// the same location in a vertex shader's outputs and a fragment shader's
/// inputs refers to the same varying
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Attr>", try_from = "Vec<Attr>")]
pub struct AttrSlots {
    slots: [Option<Attr>; MAX_ATTRS],
}

impl AttrSlots {
    pub fn insert(&mut self, location: u32, name: impl Into<String>) -> Result<(), SlotOverflow> {
        let name = name.into();
        match usize::try_from(location) {
            Ok(slot) if slot < MAX_ATTRS => {
                self.slots[slot] = Some(Attr::new(slot as u16, name));
                Ok(())
            }
            _ => Err(SlotOverflow { name, location }),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Attr> {
        self.slots.get(slot)?.as_ref()
    }

    /// the used slots, in location order
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<AttrSlots> for Vec<Attr> {
    fn from(slots: AttrSlots) -> Self {
        slots.slots.into_iter().flatten().collect()
    }
}

impl TryFrom<Vec<Attr>> for AttrSlots {
    type Error = SlotOverflow;

    fn try_from(attrs: Vec<Attr>) -> Result<Self, Self::Error> {
        let mut slots = AttrSlots::default();
        for attr in attrs {
            let slot = usize::from(attr.slot);
            if slot >= MAX_ATTRS {
                return Err(SlotOverflow {
                    name: attr.name,
                    location: u32::from(attr.slot),
                });
            }
            slots.slots[slot] = Some(attr);
        }
        Ok(slots)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uniform {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: UniformType,
    /// 0 for non-arrays
    pub array_count: u32,
    /// byte offset into the block
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBlock {
    pub slot: u32,
    pub size: u32,
    pub name: String,
    pub uniforms: Vec<Uniform>,
    /// index into the deduplicated uniform blocks of a translation
    #[serde(default)]
    pub unique_index: Option<usize>,
}

impl UniformBlock {
    /// same name, size and members; the bind slot may differ per stage
    pub fn matches(&self, other: &UniformBlock) -> bool {
        self.name == other.name && self.size == other.size && self.uniforms == other.uniforms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub slot: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ImageType,
    pub base_type: ImageBaseType,
    /// index into the deduplicated images of a translation
    #[serde(default)]
    pub unique_index: Option<usize>,
}

impl Image {
    /// same name, dimensionality and sample type; the bind slot may differ per stage
    pub fn matches(&self, other: &Image) -> bool {
        self.name == other.name && self.ty == other.ty && self.base_type == other.base_type
    }
}

/// the interface of one compiled shader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub stage: Stage,
    pub entry_point: String,
    pub inputs: AttrSlots,
    pub outputs: AttrSlots,
    pub uniform_blocks: Vec<UniformBlock>,
    pub images: Vec<Image>,
}
