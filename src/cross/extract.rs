use rspirv::spirv::{Decoration, ExecutionModel};

use super::bind_slots::{SlotConvention, WEB_FS_UB_BINDING_OFFSET};
use crate::compiler::{Compiler, Resource};
use crate::reflection::*;

/// reads the interface of a compiled shader, after its bind slots were fixed
pub fn parse_reflection<C: Compiler + ?Sized>(
    compiler: &C,
    convention: SlotConvention,
) -> Result<Reflection, SlotOverflow> {
    let res = compiler.shader_resources();
    let execution_model = compiler.execution_model();

    let stage = match execution_model {
        ExecutionModel::Vertex => Stage::Vertex,
        ExecutionModel::Fragment => Stage::Fragment,
        _ => Stage::Invalid,
    };

    let entry_point = compiler
        .entry_points()
        .into_iter()
        .find(|entry_point| entry_point.execution_model == execution_model)
        .map(|entry_point| entry_point.name)
        .unwrap_or_default();

    let mut inputs = AttrSlots::default();
    for attr_res in &res.stage_inputs {
        let location = compiler.decoration(attr_res.id, Decoration::Location);
        inputs.insert(location, attr_res.name.as_str())?;
    }
    let mut outputs = AttrSlots::default();
    for attr_res in &res.stage_outputs {
        let location = compiler.decoration(attr_res.id, Decoration::Location);
        outputs.insert(location, attr_res.name.as_str())?;
    }

    let uniform_blocks = res
        .uniform_buffers
        .iter()
        .map(|ub_res| parse_uniform_block(compiler, ub_res, convention))
        .collect();

    let images = res
        .sampled_images
        .iter()
        .map(|img_res| parse_image(compiler, img_res))
        .collect();

    Ok(Reflection {
        stage,
        entry_point,
        inputs,
        outputs,
        uniform_blocks,
        images,
    })
}

fn parse_uniform_block<C: Compiler + ?Sized>(
    compiler: &C,
    ub_res: &Resource,
    convention: SlotConvention,
) -> UniformBlock {
    let ub_type = compiler.type_desc(ub_res.base_type_id);

    let mut slot = compiler.decoration(ub_res.id, Decoration::Binding);
    // undo the fragment shader offset, blocks keep their per-stage slot
    if convention == SlotConvention::Web && slot >= WEB_FS_UB_BINDING_OFFSET {
        slot -= WEB_FS_UB_BINDING_OFFSET;
    }

    let uniforms = (0..)
        .zip(&ub_type.member_types)
        .map(|(m_index, m_type_id)| {
            let m_type = compiler.type_desc(*m_type_id);
            Uniform {
                name: compiler.member_name(ub_res.base_type_id, m_index),
                ty: uniform_type(&m_type),
                array_count: m_type.array.first().copied().unwrap_or(0),
                offset: compiler.struct_member_offset(ub_res.base_type_id, m_index),
            }
        })
        .collect();

    UniformBlock {
        slot,
        size: compiler.declared_struct_size(ub_res.base_type_id),
        name: ub_res.name.clone(),
        uniforms,
        unique_index: None,
    }
}

fn parse_image<C: Compiler + ?Sized>(compiler: &C, img_res: &Resource) -> Image {
    let img_type = compiler.type_desc(img_res.type_id);
    let (ty, base_type) = match &img_type.image {
        Some(image) => (
            image_type(image),
            image_base_type(compiler.type_desc(image.sampled_type).base_type),
        ),
        None => (ImageType::Invalid, ImageBaseType::Float),
    };

    Image {
        slot: compiler.decoration(img_res.id, Decoration::Binding),
        name: img_res.name.clone(),
        ty,
        base_type,
        unique_index: None,
    }
}
