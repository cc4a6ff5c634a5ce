use std::collections::HashMap;

use rspirv::binary::{Assemble, Disassemble, ParseState};
use rspirv::dr::{self, Instruction, Operand};
use rspirv::spirv::{Decoration, ExecutionModel, Op, StorageClass};

use super::*;

#[derive(Debug, thiserror::Error)]
pub enum SpirvModuleError {
    #[error("invalid SPIR-V module: {0:?}")]
    Parse(ParseState),
    #[error("SPIR-V module has no entry point")]
    NoEntryPoint,
    #[error("malformed {opcode:?} instruction")]
    Malformed { opcode: Op },
}

type Result<T> = std::result::Result<T, SpirvModuleError>;

/// decoration rewrites go straight into the module's annotations
pub struct SpirvModule {
    module: dr::Module,
    tables: Tables,
}

#[derive(Debug, Default)]
struct Tables {
    entry_points: Vec<EntryPoint>,
    /// interface of the default entry point
    interface: Vec<Id>,
    names: HashMap<Id, String>,
    member_names: HashMap<(Id, u32), String>,
    decorations: HashMap<(Id, u32), u32>,
    member_decorations: HashMap<(Id, u32, u32), u32>,
    types: HashMap<Id, TypeDesc>,
    /// array type -> element type
    array_elements: HashMap<Id, Id>,
    pointers: HashMap<Id, (StorageClass, Id)>,
    constants: HashMap<Id, u32>,
    variables: Vec<Variable>,
}

#[derive(Debug)]
struct Variable {
    id: Id,
    pointer_type: Id,
    storage_class: StorageClass,
}

/// creates [`SpirvModule`] compilers, the target options don't apply to SPIR-V
#[derive(Debug, Clone, Copy, Default)]
pub struct SpirvBackend;

impl Backend for SpirvBackend {
    type Compiler = SpirvModule;
    type Error = SpirvModuleError;

    fn create(&self, blob: &SpirvBlob, _options: &CompileOptions) -> Result<SpirvModule> {
        SpirvModule::from_words(&blob.bytecode)
    }
}

fn malformed(inst: &Instruction) -> SpirvModuleError {
    SpirvModuleError::Malformed {
        opcode: inst.class.opcode,
    }
}

fn result_id(inst: &Instruction) -> Result<Id> {
    inst.result_id.ok_or_else(|| malformed(inst))
}

fn id_operand(inst: &Instruction, index: usize) -> Result<Id> {
    match inst.operands.get(index) {
        Some(Operand::IdRef(id)) => Ok(*id),
        _ => Err(malformed(inst)),
    }
}

fn literal_operand(inst: &Instruction, index: usize) -> Result<u32> {
    match inst.operands.get(index) {
        Some(Operand::LiteralBit32(value)) => Ok(*value),
        _ => Err(malformed(inst)),
    }
}

fn string_operand(inst: &Instruction, index: usize) -> Result<&str> {
    match inst.operands.get(index) {
        Some(Operand::LiteralString(s)) => Ok(s),
        _ => Err(malformed(inst)),
    }
}

fn decoration_operand(inst: &Instruction, index: usize) -> Result<Decoration> {
    match inst.operands.get(index) {
        Some(Operand::Decoration(decoration)) => Ok(*decoration),
        _ => Err(malformed(inst)),
    }
}

// flag decorations read as 1
fn decoration_value(operand: Option<&Operand>) -> u32 {
    match operand {
        Some(Operand::LiteralBit32(value)) => *value,
        Some(Operand::BuiltIn(builtin)) => *builtin as u32,
        _ => 1,
    }
}

fn takes_literal(decoration: Decoration) -> bool {
    matches!(
        decoration,
        Decoration::Location
            | Decoration::Component
            | Decoration::Index
            | Decoration::Binding
            | Decoration::DescriptorSet
            | Decoration::Offset
            | Decoration::ArrayStride
            | Decoration::MatrixStride
            | Decoration::SpecId
            | Decoration::InputAttachmentIndex
    )
}

fn decoration_literals(decoration: Decoration, value: u32) -> Vec<Operand> {
    if takes_literal(decoration) {
        vec![Operand::LiteralBit32(value)]
    } else {
        vec![]
    }
}

impl Tables {
    fn raise(module: &dr::Module) -> Result<Self> {
        let mut tables = Tables::default();

        for inst in &module.entry_points {
            tables.raise_entry_point(inst)?;
        }
        if tables.entry_points.is_empty() {
            return Err(SpirvModuleError::NoEntryPoint);
        }

        for inst in &module.debug_names {
            tables.raise_name(inst)?;
        }
        for inst in &module.annotations {
            tables.raise_decoration(inst)?;
        }
        for inst in &module.types_global_values {
            tables.raise_type_or_value(inst)?;
        }

        Ok(tables)
    }

    fn raise_entry_point(&mut self, inst: &Instruction) -> Result<()> {
        let execution_model = match inst.operands.first() {
            Some(Operand::ExecutionModel(model)) => *model,
            _ => return Err(malformed(inst)),
        };
        let name = string_operand(inst, 2)?.to_string();

        if self.entry_points.is_empty() {
            self.interface = inst
                .operands
                .iter()
                .skip(3)
                .filter_map(|operand| match operand {
                    Operand::IdRef(id) => Some(*id),
                    _ => None,
                })
                .collect();
        }

        self.entry_points.push(EntryPoint {
            name,
            execution_model,
        });
        Ok(())
    }

    fn raise_name(&mut self, inst: &Instruction) -> Result<()> {
        match inst.class.opcode {
            Op::Name => {
                let target = id_operand(inst, 0)?;
                let name = string_operand(inst, 1)?;
                self.names.insert(target, name.to_string());
            }
            Op::MemberName => {
                let target = id_operand(inst, 0)?;
                let member = literal_operand(inst, 1)?;
                let name = string_operand(inst, 2)?;
                self.member_names.insert((target, member), name.to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn raise_decoration(&mut self, inst: &Instruction) -> Result<()> {
        match inst.class.opcode {
            Op::Decorate => {
                let target = id_operand(inst, 0)?;
                let decoration = decoration_operand(inst, 1)?;
                let value = decoration_value(inst.operands.get(2));
                self.decorations.insert((target, decoration as u32), value);
            }
            Op::MemberDecorate => {
                let target = id_operand(inst, 0)?;
                let member = literal_operand(inst, 1)?;
                let decoration = decoration_operand(inst, 2)?;
                let value = decoration_value(inst.operands.get(3));
                self.member_decorations
                    .insert((target, member, decoration as u32), value);
            }
            _ => {}
        }
        Ok(())
    }

    fn raise_type_or_value(&mut self, inst: &Instruction) -> Result<()> {
        let ty = match inst.class.opcode {
            Op::TypeVoid => TypeDesc {
                base_type: BaseType::Void,
                ..Default::default()
            },
            Op::TypeBool => TypeDesc::scalar(BaseType::Boolean, 32),
            Op::TypeInt => {
                let width = literal_operand(inst, 0)?;
                let signed = literal_operand(inst, 1)? != 0;
                let base_type = match (width, signed) {
                    (8, true) => BaseType::SByte,
                    (8, false) => BaseType::UByte,
                    (16, true) => BaseType::Short,
                    (16, false) => BaseType::UShort,
                    (32, true) => BaseType::Int,
                    (32, false) => BaseType::UInt,
                    (64, true) => BaseType::Int64,
                    (64, false) => BaseType::UInt64,
                    _ => BaseType::Unknown,
                };
                TypeDesc::scalar(base_type, width)
            }
            Op::TypeFloat => {
                let width = literal_operand(inst, 0)?;
                let base_type = match width {
                    16 => BaseType::Half,
                    32 => BaseType::Float,
                    64 => BaseType::Double,
                    _ => BaseType::Unknown,
                };
                TypeDesc::scalar(base_type, width)
            }
            Op::TypeVector => {
                let component = id_operand(inst, 0)?;
                let count = literal_operand(inst, 1)?;
                self.type_of(component).vector(count)
            }
            Op::TypeMatrix => {
                let column = id_operand(inst, 0)?;
                let count = literal_operand(inst, 1)?;
                self.type_of(column).matrix(count)
            }
            Op::TypeArray => {
                let element = id_operand(inst, 0)?;
                let length = id_operand(inst, 1)?;
                // specialization constant lengths read as 0
                let length = self.constants.get(&length).copied().unwrap_or(0);
                self.array_elements.insert(result_id(inst)?, element);
                self.type_of(element).array(length)
            }
            Op::TypeRuntimeArray => {
                let element = id_operand(inst, 0)?;
                self.array_elements.insert(result_id(inst)?, element);
                self.type_of(element).array(0)
            }
            Op::TypeStruct => {
                let members = (0..inst.operands.len())
                    .map(|index| id_operand(inst, index))
                    .collect::<Result<Vec<_>>>()?;
                TypeDesc::structure(members)
            }
            Op::TypeImage => {
                let sampled_type = id_operand(inst, 0)?;
                let dim = match inst.operands.get(1) {
                    Some(Operand::Dim(dim)) => *dim,
                    _ => return Err(malformed(inst)),
                };
                let image = ImageDesc {
                    sampled_type,
                    dim,
                    // 2 means "unknown"
                    depth: literal_operand(inst, 2)? == 1,
                    arrayed: literal_operand(inst, 3)? != 0,
                    multisampled: literal_operand(inst, 4)? != 0,
                };
                TypeDesc::image(BaseType::Image, image)
            }
            Op::TypeSampledImage => {
                let image = id_operand(inst, 0)?;
                TypeDesc {
                    base_type: BaseType::SampledImage,
                    ..self.type_of(image)
                }
            }
            Op::TypeSampler => TypeDesc {
                base_type: BaseType::Sampler,
                ..Default::default()
            },
            Op::TypePointer => {
                let storage_class = match inst.operands.first() {
                    Some(Operand::StorageClass(class)) => *class,
                    _ => return Err(malformed(inst)),
                };
                let pointee = id_operand(inst, 1)?;
                self.pointers
                    .insert(result_id(inst)?, (storage_class, pointee));
                return Ok(());
            }
            Op::Constant => {
                if let Some(Operand::LiteralBit32(value)) = inst.operands.first() {
                    self.constants.insert(result_id(inst)?, *value);
                }
                return Ok(());
            }
            Op::Variable => {
                let storage_class = match inst.operands.first() {
                    Some(Operand::StorageClass(class)) => *class,
                    _ => return Err(malformed(inst)),
                };
                self.variables.push(Variable {
                    id: result_id(inst)?,
                    pointer_type: inst.result_type.ok_or_else(|| malformed(inst))?,
                    storage_class,
                });
                return Ok(());
            }
            _ => return Ok(()),
        };

        self.types.insert(result_id(inst)?, ty);
        Ok(())
    }

    fn type_of(&self, id: Id) -> TypeDesc {
        self.types.get(&id).cloned().unwrap_or_default()
    }

    fn strip_arrays(&self, mut id: Id) -> Id {
        while let Some(&element) = self.array_elements.get(&id) {
            id = element;
        }
        id
    }

    fn has_decoration(&self, id: Id, decoration: Decoration) -> bool {
        self.decorations.contains_key(&(id, decoration as u32))
    }

    fn has_member_decoration(&self, id: Id, index: u32, decoration: Decoration) -> bool {
        self.member_decorations
            .contains_key(&(id, index, decoration as u32))
    }

    fn name(&self, id: Id) -> String {
        self.names.get(&id).cloned().unwrap_or_default()
    }

    // builtins (gl_Position, gl_PerVertex blocks, ...) aren't stage attributes
    fn is_stage_attribute(&self, variable: Id, base_type: Id) -> bool {
        if !self.interface.is_empty() && !self.interface.contains(&variable) {
            return false;
        }
        if self.has_decoration(variable, Decoration::BuiltIn) {
            return false;
        }
        let member_count = self.type_of(base_type).member_types.len() as u32;
        !(0..member_count).any(|index| {
            self.has_member_decoration(base_type, index, Decoration::BuiltIn)
        })
    }
}

impl SpirvModule {
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let module = dr::load_words(words).map_err(SpirvModuleError::Parse)?;
        Self::from_module(module)
    }

    pub fn from_module(module: dr::Module) -> Result<Self> {
        let tables = Tables::raise(&module)?;
        Ok(Self { module, tables })
    }

    /// the module's binary, with every decoration rewrite applied
    pub fn assemble(&self) -> Vec<u32> {
        self.module.assemble()
    }

    fn declared_member_size(&self, struct_id: Id, index: u32) -> u32 {
        let Some(&member_type_id) = self
            .tables
            .type_of(struct_id)
            .member_types
            .get(index as usize)
        else {
            return 0;
        };
        let member = self.tables.type_of(member_type_id);

        if let Some(&outer_length) = member.array.last() {
            let stride = self.decoration(member_type_id, Decoration::ArrayStride);
            return stride.saturating_mul(outer_length);
        }

        if member.base_type == BaseType::Struct {
            return self.declared_struct_size(member_type_id);
        }

        if member.columns == 1 {
            return member.vecsize.saturating_mul(member.width) / 8;
        }

        let matrix_stride = self.member_decoration(struct_id, index, Decoration::MatrixStride);
        if self
            .tables
            .has_member_decoration(struct_id, index, Decoration::RowMajor)
        {
            matrix_stride.saturating_mul(member.vecsize)
        } else {
            matrix_stride.saturating_mul(member.columns)
        }
    }

    fn remove_member_decoration(&mut self, id: Id, index: u32, decoration: Decoration) {
        self.tables
            .member_decorations
            .remove(&(id, index, decoration as u32));
        self.module
            .annotations
            .retain(|inst| !is_member_decoration_of(inst, id, index, decoration));
    }
}

fn is_decoration_of(inst: &Instruction, id: Id, decoration: Decoration) -> bool {
    inst.class.opcode == Op::Decorate
        && matches!(
            inst.operands.as_slice(),
            [Operand::IdRef(target), Operand::Decoration(d), ..]
                if *target == id && *d == decoration
        )
}

fn is_member_decoration_of(inst: &Instruction, id: Id, index: u32, decoration: Decoration) -> bool {
    inst.class.opcode == Op::MemberDecorate
        && matches!(
            inst.operands.as_slice(),
            [Operand::IdRef(target), Operand::LiteralBit32(member), Operand::Decoration(d), ..]
                if *target == id && *member == index && *d == decoration
        )
}

impl Compiler for SpirvModule {
    fn execution_model(&self) -> ExecutionModel {
        self.tables
            .entry_points
            .first()
            .map_or(ExecutionModel::Vertex, |entry_point| entry_point.execution_model)
    }

    fn entry_points(&self) -> Vec<EntryPoint> {
        self.tables.entry_points.clone()
    }

    fn shader_resources(&self) -> ShaderResources {
        let tables = &self.tables;
        let mut res = ShaderResources::default();

        for var in &tables.variables {
            let Some(&(_, pointee)) = tables.pointers.get(&var.pointer_type) else {
                continue;
            };
            let base_type_id = tables.strip_arrays(pointee);
            let base_type = tables.type_of(base_type_id).base_type;
            let resource = |name: String| Resource {
                id: var.id,
                type_id: pointee,
                base_type_id,
                name,
            };

            match var.storage_class {
                StorageClass::Uniform
                    if base_type == BaseType::Struct
                        && tables.has_decoration(base_type_id, Decoration::Block) =>
                {
                    let mut name = tables.name(base_type_id);
                    if name.is_empty() {
                        name = tables.name(var.id);
                    }
                    res.uniform_buffers.push(resource(name));
                }
                StorageClass::UniformConstant if base_type == BaseType::SampledImage => {
                    res.sampled_images.push(resource(tables.name(var.id)));
                }
                StorageClass::Input if tables.is_stage_attribute(var.id, base_type_id) => {
                    res.stage_inputs.push(resource(tables.name(var.id)));
                }
                StorageClass::Output if tables.is_stage_attribute(var.id, base_type_id) => {
                    res.stage_outputs.push(resource(tables.name(var.id)));
                }
                _ => {}
            }
        }

        res
    }

    fn type_desc(&self, id: Id) -> TypeDesc {
        self.tables.type_of(id)
    }

    fn decoration(&self, id: Id, decoration: Decoration) -> u32 {
        self.tables
            .decorations
            .get(&(id, decoration as u32))
            .copied()
            .unwrap_or(0)
    }

    fn set_decoration(&mut self, id: Id, decoration: Decoration, value: u32) {
        self.tables
            .decorations
            .insert((id, decoration as u32), value);

        let literals = decoration_literals(decoration, value);
        let existing = self
            .module
            .annotations
            .iter_mut()
            .find(|inst| is_decoration_of(inst, id, decoration));
        match existing {
            Some(inst) => {
                inst.operands.truncate(2);
                inst.operands.extend(literals);
            }
            None => {
                let mut operands = vec![Operand::IdRef(id), Operand::Decoration(decoration)];
                operands.extend(literals);
                self.module
                    .annotations
                    .push(Instruction::new(Op::Decorate, None, None, operands));
            }
        }
    }

    fn member_decoration(&self, id: Id, index: u32, decoration: Decoration) -> u32 {
        self.tables
            .member_decorations
            .get(&(id, index, decoration as u32))
            .copied()
            .unwrap_or(0)
    }

    fn set_member_decoration(&mut self, id: Id, index: u32, decoration: Decoration, value: u32) {
        // a member is either column- or row-major
        match decoration {
            Decoration::ColMajor => self.remove_member_decoration(id, index, Decoration::RowMajor),
            Decoration::RowMajor => self.remove_member_decoration(id, index, Decoration::ColMajor),
            _ => {}
        }

        self.tables
            .member_decorations
            .insert((id, index, decoration as u32), value);

        let literals = decoration_literals(decoration, value);
        let existing = self
            .module
            .annotations
            .iter_mut()
            .find(|inst| is_member_decoration_of(inst, id, index, decoration));
        match existing {
            Some(inst) => {
                inst.operands.truncate(3);
                inst.operands.extend(literals);
            }
            None => {
                let mut operands = vec![
                    Operand::IdRef(id),
                    Operand::LiteralBit32(index),
                    Operand::Decoration(decoration),
                ];
                operands.extend(literals);
                self.module
                    .annotations
                    .push(Instruction::new(Op::MemberDecorate, None, None, operands));
            }
        }
    }

    fn member_name(&self, id: Id, index: u32) -> String {
        self.tables
            .member_names
            .get(&(id, index))
            .cloned()
            .unwrap_or_default()
    }

    /// the offset of the last member plus its size, saturating at `u32::MAX`
    fn declared_struct_size(&self, id: Id) -> u32 {
        let member_count = self.tables.type_of(id).member_types.len() as u32;
        let Some(last) = member_count.checked_sub(1) else {
            return 0;
        };
        self.struct_member_offset(id, last)
            .saturating_add(self.declared_member_size(id, last))
    }

    fn compile(&mut self) -> String {
        self.module.disassemble()
    }
}

impl std::fmt::Debug for SpirvModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpirvModule")
            .field("entry_points", &self.tables.entry_points)
            .field("variables", &self.tables.variables.len())
            .finish()
    }
}
