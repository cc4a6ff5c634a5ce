use log::*;

use super::CrossSource;
use crate::reflection::{Image, UniformBlock};

/// one name used for two different resource layouts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("conflicting uniform block definitions found for '{0}'")]
    UniformBlock(String),
    #[error("conflicting texture definitions found for '{0}'")]
    Image(String),
}

trait Interned: Clone {
    fn name(&self) -> &str;
    fn matches(&self, other: &Self) -> bool;
    fn set_unique_index(&mut self, index: usize);
}

impl Interned for UniformBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, other: &Self) -> bool {
        UniformBlock::matches(self, other)
    }

    fn set_unique_index(&mut self, index: usize) {
        self.unique_index = Some(index);
    }
}

impl Interned for Image {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, other: &Self) -> bool {
        Image::matches(self, other)
    }

    fn set_unique_index(&mut self, index: usize) {
        self.unique_index = Some(index);
    }
}

/// interns `item` by name, returns the name of a conflicting definition
fn intern<T: Interned>(item: &mut T, unique: &mut Vec<T>) -> Result<(), String> {
    match unique.iter().position(|other| other.name() == item.name()) {
        Some(index) if unique[index].matches(item) => {
            item.set_unique_index(index);
            Ok(())
        }
        Some(_) => Err(item.name().to_string()),
        None => {
            item.set_unique_index(unique.len());
            debug!("unique resource #{}: {}", unique.len(), item.name());
            unique.push(item.clone());
            Ok(())
        }
    }
}

/// merges the uniform blocks of all sources by name, in source order, and
/// records each block's index into `unique`
pub fn gather_unique_uniform_blocks(
    sources: &mut [CrossSource],
    unique: &mut Vec<UniformBlock>,
) -> Result<(), Conflict> {
    for src in sources {
        for ub in &mut src.refl.uniform_blocks {
            intern(ub, unique).map_err(Conflict::UniformBlock)?;
        }
    }
    Ok(())
}

/// merges the images of all sources by name, in source order, and records
/// each image's index into `unique`
pub fn gather_unique_images(sources: &mut [CrossSource], unique: &mut Vec<Image>) -> Result<(), Conflict> {
    for src in sources {
        for img in &mut src.refl.images {
            intern(img, unique).map_err(Conflict::Image)?;
        }
    }
    Ok(())
}
