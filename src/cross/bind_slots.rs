use rspirv::spirv::Decoration;

use crate::compiler::{BaseType, Compiler};
use crate::reflection::Stage;
use crate::slang::Slang;

/// fragment shader uniform blocks start here under the web convention, so
/// they share descriptor set 0 with the vertex shader blocks
pub const WEB_FS_UB_BINDING_OFFSET: u32 = 4;

/// how descriptor sets and bindings are laid out for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotConvention {
    /// blocks in set 0, images in set 1, bindings from 0 per stage
    Native,
    /// blocks in set 0 with fragment blocks offset, vertex images in set 1,
    /// fragment images in set 2
    Web,
}

impl SlotConvention {
    pub fn for_slang(slang: Slang) -> Self {
        if slang.is_web_convention() {
            SlotConvention::Web
        } else {
            SlotConvention::Native
        }
    }
}

/// overwrites the descriptor set and binding of every uniform block and
/// sampled image, existing bindings are always discarded
pub fn fix_bind_slots<C: Compiler + ?Sized>(compiler: &mut C, stage: Stage, convention: SlotConvention) {
    let res = compiler.shader_resources();

    let mut ub_slot = match (convention, stage) {
        (SlotConvention::Web, Stage::Fragment) => WEB_FS_UB_BINDING_OFFSET,
        _ => 0,
    };
    for ub_res in &res.uniform_buffers {
        compiler.set_decoration(ub_res.id, Decoration::DescriptorSet, 0);
        compiler.set_decoration(ub_res.id, Decoration::Binding, ub_slot);
        ub_slot += 1;
    }

    let img_set = match (convention, stage) {
        (SlotConvention::Web, Stage::Fragment) => 2,
        _ => 1,
    };
    for (img_slot, img_res) in (0..).zip(&res.sampled_images) {
        compiler.set_decoration(img_res.id, Decoration::DescriptorSet, img_set);
        compiler.set_decoration(img_res.id, Decoration::Binding, img_slot);
    }
}

/// decorates every float matrix in a uniform block as column-major, the
/// HLSL multiplication order depends on it
pub fn fix_ub_matrix_force_colmajor<C: Compiler + ?Sized>(compiler: &mut C) {
    let res = compiler.shader_resources();
    for ub_res in &res.uniform_buffers {
        let ub_type = compiler.type_desc(ub_res.base_type_id);
        for (m_index, m_type_id) in (0..).zip(&ub_type.member_types) {
            let m_type = compiler.type_desc(*m_type_id);
            if m_type.base_type == BaseType::Float && m_type.vecsize > 1 && m_type.columns > 1 {
                compiler.set_member_decoration(ub_res.base_type_id, m_index, Decoration::ColMajor, 1);
            }
        }
    }
}

/// turns every uniform block into a vec4 array
pub fn flatten_uniform_blocks<C: Compiler + ?Sized>(compiler: &mut C) {
    let res = compiler.shader_resources();
    for ub_res in &res.uniform_buffers {
        compiler.flatten_buffer_block(ub_res.id);
    }
}

#[cfg(test)]
mod tests {
    use rspirv::spirv::Dim;

    use super::*;
    use crate::compiler::TypeDesc;
    use crate::testing::*;

    fn with_resources(compiler: FakeCompiler) -> FakeCompiler {
        compiler
            .uniform_block("a", 16, &[("x", float_type(4), 0)])
            .uniform_block("b", 16, &[("y", float_type(4), 0)])
            .sampled_image("tex0", Dim::Dim2D, false, BaseType::Float)
            .sampled_image("tex1", Dim::Dim2D, false, BaseType::Float)
    }

    fn bindings(compiler: &FakeCompiler) -> (Vec<(u32, u32)>, Vec<(u32, u32)>) {
        let res = compiler.shader_resources();
        let slot = |id| {
            (
                compiler.decoration(id, Decoration::DescriptorSet),
                compiler.decoration(id, Decoration::Binding),
            )
        };
        (
            res.uniform_buffers.iter().map(|r| slot(r.id)).collect(),
            res.sampled_images.iter().map(|r| slot(r.id)).collect(),
        )
    }

    #[test]
    fn native_convention() {
        for (compiler, stage) in [
            (FakeCompiler::vertex(), Stage::Vertex),
            (FakeCompiler::fragment(), Stage::Fragment),
        ] {
            let mut compiler = with_resources(compiler);
            fix_bind_slots(&mut compiler, stage, SlotConvention::Native);

            let (ubs, images) = bindings(&compiler);
            assert_eq!(ubs, [(0, 0), (0, 1)]);
            assert_eq!(images, [(1, 0), (1, 1)]);
        }
    }

    #[test]
    fn web_convention_vertex() {
        let mut compiler = with_resources(FakeCompiler::vertex());
        fix_bind_slots(&mut compiler, Stage::Vertex, SlotConvention::Web);

        let (ubs, images) = bindings(&compiler);
        assert_eq!(ubs, [(0, 0), (0, 1)]);
        assert_eq!(images, [(1, 0), (1, 1)]);
    }

    #[test]
    fn web_convention_fragment_blocks_start_at_offset() {
        // independent of how many blocks any vertex shader declares
        let mut compiler = with_resources(FakeCompiler::fragment());
        fix_bind_slots(&mut compiler, Stage::Fragment, SlotConvention::Web);

        let (ubs, images) = bindings(&compiler);
        assert_eq!(ubs, [(0, 4), (0, 5)]);
        assert_eq!(images, [(2, 0), (2, 1)]);
    }

    #[test]
    fn only_float_matrices_become_col_major() {
        let mut compiler = FakeCompiler::vertex().uniform_block(
            "params",
            96,
            &[
                ("mvp", mat4_type(), 0),
                ("tint", float_type(4), 64),
                ("count", TypeDesc::scalar(BaseType::Int, 32), 80),
            ],
        );
        fix_ub_matrix_force_colmajor(&mut compiler);

        let ub = compiler.shader_resources().uniform_buffers[0].clone();
        let col_major = |index| compiler.member_decoration(ub.base_type_id, index, Decoration::ColMajor);
        assert_eq!(col_major(0), 1);
        assert_eq!(col_major(1), 0);
        assert_eq!(col_major(2), 0);
    }

    #[test]
    fn flattens_every_block() {
        let mut compiler = with_resources(FakeCompiler::fragment());
        flatten_uniform_blocks(&mut compiler);

        assert_eq!(compiler.flattened.len(), 2);
    }

    #[test]
    fn conventions_per_target() {
        assert_eq!(SlotConvention::for_slang(Slang::Wgpu), SlotConvention::Web);
        assert_eq!(SlotConvention::for_slang(Slang::Hlsl5), SlotConvention::Native);
        assert_eq!(SlotConvention::for_slang(Slang::Glsl330), SlotConvention::Native);
    }
}
