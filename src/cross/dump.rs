use std::io::{self, Write};

use super::CrossResult;
use crate::errmsg::ErrFormat;
use crate::reflection::Reflection;

impl CrossResult {
    /// human readable generated sources and reflection, not meant for parsing
    pub fn dump_debug(&self, out: &mut impl Write, err_fmt: ErrFormat) -> io::Result<()> {
        writeln!(out, "cross-compiled ({}):", self.slang)?;
        match &self.error {
            Some(err) => writeln!(out, "  error: {}", err.as_string(err_fmt))?,
            None => writeln!(out, "  error: not set")?,
        }
        for source in &self.sources {
            writeln!(out, "    source for snippet {}:", source.snippet_index)?;
            for line in source.source_code.lines() {
                writeln!(out, "      {line}")?;
            }
            writeln!(out, "    reflection for snippet {}:", source.snippet_index)?;
            write_reflection_info(out, &source.refl, "      ")?;
        }
        writeln!(out)
    }
}

pub fn write_reflection_info(out: &mut impl Write, refl: &Reflection, indent: &str) -> io::Result<()> {
    writeln!(out, "{indent}stage: {}", refl.stage.as_str())?;
    writeln!(out, "{indent}entry: {}", refl.entry_point)?;
    writeln!(out, "{indent}inputs:")?;
    for attr in refl.inputs.iter() {
        writeln!(
            out,
            "{indent}  {}: slot={}, sem_name={}, sem_index={}",
            attr.name, attr.slot, attr.sem_name, attr.sem_index
        )?;
    }
    writeln!(out, "{indent}outputs:")?;
    for attr in refl.outputs.iter() {
        writeln!(
            out,
            "{indent}  {}: slot={}, sem_name={}, sem_index={}",
            attr.name, attr.slot, attr.sem_name, attr.sem_index
        )?;
    }
    for ub in &refl.uniform_blocks {
        writeln!(
            out,
            "{indent}uniform block: {}, slot: {}, size: {}",
            ub.name, ub.slot, ub.size
        )?;
        for uniform in &ub.uniforms {
            writeln!(
                out,
                "{indent}  member: {}, type: {}, array_count: {}, offset: {}",
                uniform.name,
                uniform.ty.as_str(),
                uniform.array_count,
                uniform.offset
            )?;
        }
    }
    for img in &refl.images {
        writeln!(
            out,
            "{indent}image: {}, slot: {}, type: {}, basetype: {}",
            img.name,
            img.slot,
            img.ty.as_str(),
            img.base_type.as_str()
        )?;
    }
    writeln!(out)
}
