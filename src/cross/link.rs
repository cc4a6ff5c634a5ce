use super::CrossResult;
use crate::errmsg::ErrMsg;
use crate::input::{Input, Program};
use crate::reflection::{Attr, MAX_ATTRS};

/// checks that the vertex shader outputs of every program match the
/// fragment shader inputs slot by slot, stops at the first mismatch
pub fn validate_linking(inp: &Input, cross: &CrossResult) -> Result<(), ErrMsg> {
    for prog in inp.programs.values() {
        validate_program(inp, cross, prog)?;
    }
    Ok(())
}

fn validate_program(inp: &Input, cross: &CrossResult, prog: &Program) -> Result<(), ErrMsg> {
    let vs_snippet_index = *inp.vs_map.get(&prog.vs_name).ok_or_else(|| {
        inp.error(
            prog.line_index,
            format!("unknown vertex shader '{}' in program '{}'", prog.vs_name, prog.name),
        )
    })?;
    let fs_snippet_index = *inp.fs_map.get(&prog.fs_name).ok_or_else(|| {
        inp.error(
            prog.line_index,
            format!("unknown fragment shader '{}' in program '{}'", prog.fs_name, prog.name),
        )
    })?;

    let missing_source = |name: &str| {
        inp.error(
            prog.line_index,
            format!("no translated source for '{}' in program '{}'", name, prog.name),
        )
    };
    let vs_src = cross
        .find_source_by_snippet_index(vs_snippet_index)
        .ok_or_else(|| missing_source(&prog.vs_name))?;
    let fs_src = cross
        .find_source_by_snippet_index(fs_snippet_index)
        .ok_or_else(|| missing_source(&prog.fs_name))?;

    for i in 0..MAX_ATTRS {
        let vs_out = vs_src.refl.outputs.get(i);
        let fs_inp = fs_src.refl.inputs.get(i);
        if vs_out != fs_inp {
            let name = |attr: Option<&Attr>| {
                attr.map_or_else(String::new, |attr| attr.name.clone())
            };
            return Err(inp.error(
                prog.line_index,
                format!(
                    "outputs of vs '{}' don't match inputs of fs '{}' for attr #{} (vs={},fs={})",
                    prog.vs_name,
                    prog.fs_name,
                    i,
                    name(vs_out),
                    name(fs_inp)
                ),
            ));
        }
    }

    Ok(())
}
