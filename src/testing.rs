use std::collections::HashMap;

use rspirv::dr::{self, Instruction, Operand};
use rspirv::spirv::{BuiltIn, Decoration, Dim, ExecutionModel, ImageFormat, Op, StorageClass};

use crate::compiler::*;
use crate::input::{Input, Program, Snippet, SnippetType, Spirv, SpirvBlob};
use crate::reflection::Stage;

/// an in-memory compiler, described resource by resource
#[derive(Debug, Clone)]
pub struct FakeCompiler {
    pub execution_model: ExecutionModel,
    pub entry_points: Vec<EntryPoint>,
    pub resources: ShaderResources,
    pub types: HashMap<Id, TypeDesc>,
    pub decorations: HashMap<(Id, u32), u32>,
    pub member_decorations: HashMap<(Id, u32, u32), u32>,
    pub member_names: HashMap<(Id, u32), String>,
    pub struct_sizes: HashMap<Id, u32>,
    pub flattened: Vec<Id>,
    pub source: String,
    next_id: Id,
}

impl FakeCompiler {
    pub fn new(execution_model: ExecutionModel) -> Self {
        Self {
            execution_model,
            entry_points: vec![EntryPoint {
                name: "main".to_string(),
                execution_model,
            }],
            resources: ShaderResources::default(),
            types: HashMap::new(),
            decorations: HashMap::new(),
            member_decorations: HashMap::new(),
            member_names: HashMap::new(),
            struct_sizes: HashMap::new(),
            flattened: vec![],
            source: "void main() {}\n".to_string(),
            next_id: 1,
        }
    }

    pub fn vertex() -> Self {
        Self::new(ExecutionModel::Vertex)
    }

    pub fn fragment() -> Self {
        Self::new(ExecutionModel::Fragment)
    }

    /// generation fails, compile() returns nothing
    pub fn failing(mut self) -> Self {
        self.source.clear();
        self
    }

    fn id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_type(&mut self, ty: TypeDesc) -> Id {
        let id = self.id();
        self.types.insert(id, ty);
        id
    }

    fn attr(&mut self, name: &str, location: u32) -> Resource {
        let type_id = self.add_type(TypeDesc::scalar(BaseType::Float, 32).vector(4));
        let id = self.id();
        self.decorations
            .insert((id, Decoration::Location as u32), location);
        Resource {
            id,
            type_id,
            base_type_id: type_id,
            name: name.to_string(),
        }
    }

    pub fn input(mut self, name: &str, location: u32) -> Self {
        let res = self.attr(name, location);
        self.resources.stage_inputs.push(res);
        self
    }

    pub fn output(mut self, name: &str, location: u32) -> Self {
        let res = self.attr(name, location);
        self.resources.stage_outputs.push(res);
        self
    }

    /// members are (name, type, offset); every block starts out bound to set 7, binding 9
    pub fn uniform_block(mut self, name: &str, size: u32, members: &[(&str, TypeDesc, u32)]) -> Self {
        let member_types: Vec<_> = members
            .iter()
            .map(|(_, ty, _)| self.add_type(ty.clone()))
            .collect();
        let struct_id = self.add_type(TypeDesc::structure(member_types));
        for (index, (member_name, _, offset)) in members.iter().enumerate() {
            let index = index as u32;
            self.member_names
                .insert((struct_id, index), member_name.to_string());
            self.member_decorations
                .insert((struct_id, index, Decoration::Offset as u32), *offset);
        }
        self.struct_sizes.insert(struct_id, size);

        let id = self.id();
        self.decorations
            .insert((id, Decoration::DescriptorSet as u32), 7);
        self.decorations.insert((id, Decoration::Binding as u32), 9);
        self.resources.uniform_buffers.push(Resource {
            id,
            type_id: struct_id,
            base_type_id: struct_id,
            name: name.to_string(),
        });
        self
    }

    pub fn sampled_image(mut self, name: &str, dim: Dim, arrayed: bool, sampled: BaseType) -> Self {
        let sampled_type = self.add_type(TypeDesc::scalar(sampled, 32));
        let image = ImageDesc {
            sampled_type,
            dim,
            depth: false,
            arrayed,
            multisampled: false,
        };
        let type_id = self.add_type(TypeDesc::image(BaseType::SampledImage, image));
        let id = self.id();
        self.decorations
            .insert((id, Decoration::DescriptorSet as u32), 7);
        self.decorations.insert((id, Decoration::Binding as u32), 9);
        self.resources.sampled_images.push(Resource {
            id,
            type_id,
            base_type_id: type_id,
            name: name.to_string(),
        });
        self
    }
}

impl Compiler for FakeCompiler {
    fn execution_model(&self) -> ExecutionModel {
        self.execution_model
    }

    fn entry_points(&self) -> Vec<EntryPoint> {
        self.entry_points.clone()
    }

    fn shader_resources(&self) -> ShaderResources {
        self.resources.clone()
    }

    fn type_desc(&self, id: Id) -> TypeDesc {
        self.types.get(&id).cloned().unwrap_or_default()
    }

    fn decoration(&self, id: Id, decoration: Decoration) -> u32 {
        self.decorations
            .get(&(id, decoration as u32))
            .copied()
            .unwrap_or(0)
    }

    fn set_decoration(&mut self, id: Id, decoration: Decoration, value: u32) {
        self.decorations.insert((id, decoration as u32), value);
    }

    fn member_decoration(&self, id: Id, index: u32, decoration: Decoration) -> u32 {
        self.member_decorations
            .get(&(id, index, decoration as u32))
            .copied()
            .unwrap_or(0)
    }

    fn set_member_decoration(&mut self, id: Id, index: u32, decoration: Decoration, value: u32) {
        self.member_decorations
            .insert((id, index, decoration as u32), value);
    }

    fn member_name(&self, id: Id, index: u32) -> String {
        self.member_names
            .get(&(id, index))
            .cloned()
            .unwrap_or_default()
    }

    fn declared_struct_size(&self, id: Id) -> u32 {
        self.struct_sizes.get(&id).copied().unwrap_or(0)
    }

    fn flatten_buffer_block(&mut self, id: Id) {
        self.flattened.push(id);
    }

    fn compile(&mut self) -> String {
        self.source.clone()
    }
}

/// hands out a prepared compiler per snippet
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub compilers: HashMap<usize, FakeCompiler>,
}

impl FakeBackend {
    pub fn with(mut self, snippet_index: usize, compiler: FakeCompiler) -> Self {
        self.compilers.insert(snippet_index, compiler);
        self
    }
}

impl Backend for FakeBackend {
    type Compiler = FakeCompiler;
    type Error = String;

    fn create(&self, blob: &SpirvBlob, _options: &CompileOptions) -> Result<FakeCompiler, String> {
        self.compilers
            .get(&blob.snippet_index)
            .cloned()
            .ok_or_else(|| format!("no compiler for snippet {}", blob.snippet_index))
    }
}

pub fn float_type(vecsize: u32) -> TypeDesc {
    TypeDesc::scalar(BaseType::Float, 32).vector(vecsize)
}

pub fn mat4_type() -> TypeDesc {
    float_type(4).matrix(4)
}

/// a bundle of vertex shader `vs` (snippet 0, line 10) and fragment shader
/// `fs` (snippet 1, line 20), linked by program `prog` (line 30)
pub fn vs_fs_input() -> Input {
    let snippet = |name: &str, kind, line| Snippet {
        name: name.to_string(),
        kind,
        lines: vec![line, line + 1],
        options: HashMap::new(),
    };
    Input::new(
        "shaders/bundle.glsl",
        vec![
            snippet("vs", SnippetType::Vs, 10),
            snippet("fs", SnippetType::Fs, 20),
        ],
        [Program {
            name: "prog".to_string(),
            vs_name: "vs".to_string(),
            fs_name: "fs".to_string(),
            line_index: 30,
        }],
    )
}

/// one (empty) blob per snippet of [`vs_fs_input`]
pub fn vs_fs_spirv() -> Spirv {
    Spirv {
        blobs: vec![
            SpirvBlob {
                snippet_index: 0,
                stage: Stage::Vertex,
                bytecode: vec![],
            },
            SpirvBlob {
                snippet_index: 1,
                stage: Stage::Fragment,
                bytecode: vec![],
            },
        ],
    }
}

/// assembles small SPIR-V modules instruction by instruction
pub struct SpirvBuilder {
    module: dr::Module,
    execution_model: ExecutionModel,
    interface: Vec<Id>,
    next_id: Id,
    float: Option<Id>,
    ints: HashMap<bool, Id>,
    vectors: HashMap<u32, Id>,
    mat4: Option<Id>,
}

impl SpirvBuilder {
    pub fn new(execution_model: ExecutionModel) -> Self {
        Self {
            module: dr::Module::new(),
            execution_model,
            interface: vec![],
            next_id: 1,
            float: None,
            ints: HashMap::new(),
            vectors: HashMap::new(),
            mat4: None,
        }
    }

    fn id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_global(&mut self, op: Op, result_type: Option<Id>, operands: Vec<Operand>) -> Id {
        let id = self.id();
        self.module
            .types_global_values
            .push(Instruction::new(op, result_type, Some(id), operands));
        id
    }

    fn name(&mut self, id: Id, name: &str) {
        self.module.debug_names.push(Instruction::new(
            Op::Name,
            None,
            None,
            vec![Operand::IdRef(id), Operand::LiteralString(name.to_string())],
        ));
    }

    fn decorate(&mut self, id: Id, decoration: Decoration, literals: Vec<Operand>) {
        let mut operands = vec![Operand::IdRef(id), Operand::Decoration(decoration)];
        operands.extend(literals);
        self.module
            .annotations
            .push(Instruction::new(Op::Decorate, None, None, operands));
    }

    fn member_decorate(&mut self, id: Id, index: u32, decoration: Decoration, value: u32) {
        self.module.annotations.push(Instruction::new(
            Op::MemberDecorate,
            None,
            None,
            vec![
                Operand::IdRef(id),
                Operand::LiteralBit32(index),
                Operand::Decoration(decoration),
                Operand::LiteralBit32(value),
            ],
        ));
    }

    pub fn float(&mut self) -> Id {
        if let Some(id) = self.float {
            return id;
        }
        let id = self.push_global(Op::TypeFloat, None, vec![Operand::LiteralBit32(32)]);
        self.float = Some(id);
        id
    }

    pub fn int(&mut self, signed: bool) -> Id {
        if let Some(&id) = self.ints.get(&signed) {
            return id;
        }
        let id = self.push_global(
            Op::TypeInt,
            None,
            vec![Operand::LiteralBit32(32), Operand::LiteralBit32(signed as u32)],
        );
        self.ints.insert(signed, id);
        id
    }

    pub fn vec(&mut self, count: u32) -> Id {
        if let Some(&id) = self.vectors.get(&count) {
            return id;
        }
        let float = self.float();
        let id = self.push_global(
            Op::TypeVector,
            None,
            vec![Operand::IdRef(float), Operand::LiteralBit32(count)],
        );
        self.vectors.insert(count, id);
        id
    }

    pub fn mat4(&mut self) -> Id {
        if let Some(id) = self.mat4 {
            return id;
        }
        let column = self.vec(4);
        let id = self.push_global(
            Op::TypeMatrix,
            None,
            vec![Operand::IdRef(column), Operand::LiteralBit32(4)],
        );
        self.mat4 = Some(id);
        id
    }

    pub fn array(&mut self, element: Id, length: u32, stride: u32) -> Id {
        let uint = self.int(false);
        let length = self.push_global(Op::Constant, Some(uint), vec![Operand::LiteralBit32(length)]);
        let id = self.push_global(
            Op::TypeArray,
            None,
            vec![Operand::IdRef(element), Operand::IdRef(length)],
        );
        self.decorate(id, Decoration::ArrayStride, vec![Operand::LiteralBit32(stride)]);
        id
    }

    fn variable(&mut self, storage_class: StorageClass, pointee: Id) -> Id {
        let pointer = self.push_global(
            Op::TypePointer,
            None,
            vec![Operand::StorageClass(storage_class), Operand::IdRef(pointee)],
        );
        self.push_global(
            Op::Variable,
            Some(pointer),
            vec![Operand::StorageClass(storage_class)],
        )
    }

    fn attr(&mut self, storage_class: StorageClass, name: &str, ty: Id, location: u32) -> Id {
        let var = self.variable(storage_class, ty);
        self.name(var, name);
        self.decorate(var, Decoration::Location, vec![Operand::LiteralBit32(location)]);
        self.interface.push(var);
        var
    }

    pub fn input(&mut self, name: &str, ty: Id, location: u32) -> Id {
        self.attr(StorageClass::Input, name, ty, location)
    }

    pub fn output(&mut self, name: &str, ty: Id, location: u32) -> Id {
        self.attr(StorageClass::Output, name, ty, location)
    }

    pub fn builtin_output(&mut self, name: &str, ty: Id) -> Id {
        let var = self.variable(StorageClass::Output, ty);
        self.name(var, name);
        self.decorate(
            var,
            Decoration::BuiltIn,
            vec![Operand::BuiltIn(BuiltIn::Position)],
        );
        self.interface.push(var);
        var
    }

    /// members are (name, type, offset)
    pub fn uniform_block(&mut self, type_name: &str, members: &[(&str, Id, u32)], set: u32, binding: u32) -> Id {
        let operands = members
            .iter()
            .map(|(_, ty, _)| Operand::IdRef(*ty))
            .collect();
        let block = self.push_global(Op::TypeStruct, None, operands);
        self.name(block, type_name);
        self.decorate(block, Decoration::Block, vec![]);

        for (index, (member_name, ty, offset)) in members.iter().enumerate() {
            let index = index as u32;
            self.module.debug_names.push(Instruction::new(
                Op::MemberName,
                None,
                None,
                vec![
                    Operand::IdRef(block),
                    Operand::LiteralBit32(index),
                    Operand::LiteralString(member_name.to_string()),
                ],
            ));
            self.member_decorate(block, index, Decoration::Offset, *offset);
            if Some(*ty) == self.mat4 {
                self.member_decorate(block, index, Decoration::MatrixStride, 16);
            }
        }

        let var = self.variable(StorageClass::Uniform, block);
        self.decorate(var, Decoration::DescriptorSet, vec![Operand::LiteralBit32(set)]);
        self.decorate(var, Decoration::Binding, vec![Operand::LiteralBit32(binding)]);
        var
    }

    pub fn sampled_image(
        &mut self,
        name: &str,
        sampled_type: Id,
        dim: Dim,
        arrayed: bool,
        set: u32,
        binding: u32,
    ) -> Id {
        let image = self.push_global(
            Op::TypeImage,
            None,
            vec![
                Operand::IdRef(sampled_type),
                Operand::Dim(dim),
                Operand::LiteralBit32(0),
                Operand::LiteralBit32(arrayed as u32),
                Operand::LiteralBit32(0),
                Operand::LiteralBit32(1),
                Operand::ImageFormat(ImageFormat::Unknown),
            ],
        );
        let sampled_image = self.push_global(Op::TypeSampledImage, None, vec![Operand::IdRef(image)]);
        let var = self.variable(StorageClass::UniformConstant, sampled_image);
        self.name(var, name);
        self.decorate(var, Decoration::DescriptorSet, vec![Operand::LiteralBit32(set)]);
        self.decorate(var, Decoration::Binding, vec![Operand::LiteralBit32(binding)]);
        var
    }

    pub fn build(mut self, entry_point: &str) -> dr::Module {
        let function = self.id();
        let mut operands = vec![
            Operand::ExecutionModel(self.execution_model),
            Operand::IdRef(function),
            Operand::LiteralString(entry_point.to_string()),
        ];
        operands.extend(self.interface.iter().map(|id| Operand::IdRef(*id)));
        self.module
            .entry_points
            .push(Instruction::new(Op::EntryPoint, None, None, operands));
        self.module.header = Some(dr::ModuleHeader::new(self.next_id));
        self.module
    }

    pub fn assemble(self, entry_point: &str) -> Vec<u32> {
        use rspirv::binary::Assemble;
        self.build(entry_point).assemble()
    }
}
