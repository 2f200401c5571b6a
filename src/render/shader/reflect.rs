//! WGSL 编译与链接检查
//!
//! WGSL 每个阶段是独立模块，没有驱动层面的"链接"。这里用 naga 解析和验证每个阶段，
//! 再通过反射检查两个阶段以及顶点布局之间的接口是否吻合：
//!
//! - 顶点源码有 `@vertex` 入口，片元源码有 `@fragment` 入口
//! - 片元输入的每个 location 都由顶点输出提供
//! - 顶点输入的每个 location 都由顶点布局提供
//! - 所有资源全局变量都是 group 0 指定绑定点上的 uniform 块，且不大于 [`UniformBlock`]

use std::collections::BTreeSet;
use std::path::Path;

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, ShaderStage, Type, TypeInner};

use crate::core::error::ShaderLoadError;
use crate::render::gpu::{ProgramDesc, UniformBlock};

/// 程序中声明的 uniform 块
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UniformBlockInfo {
    /// 全局变量名
    pub variable: Option<String>,
    /// 结构体类型名
    pub type_name: Option<String>,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
}

impl UniformBlockInfo {
    fn is_named(&self, name: &str) -> bool {
        self.variable.as_deref() == Some(name) || self.type_name.as_deref() == Some(name)
    }
}

/// 链接成功后的程序接口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramReflection {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub vertex_inputs: BTreeSet<u32>,
    pub uniform_blocks: Vec<UniformBlockInfo>,
}

impl ProgramReflection {
    /// 程序是否使用 uniform 块
    pub fn uses_uniforms(&self) -> bool {
        !self.uniform_blocks.is_empty()
    }

    /// 查找名为 `name`（变量名或类型名）且位于 `binding` 的 uniform 块
    pub fn has_uniform_block(&self, name: &str, binding: u32) -> bool {
        self.uniform_blocks
            .iter()
            .any(|block| block.binding == binding && block.is_named(name))
    }
}

/// 解析并验证单个阶段
pub fn compile_stage(path: &Path, source: &str) -> Result<Module, ShaderLoadError> {
    let module = wgsl::parse_str(source).map_err(|e| ShaderLoadError::Compile {
        path: path.to_path_buf(),
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderLoadError::Compile {
            path: path.to_path_buf(),
            log: e.emit_to_string(source),
        })?;

    Ok(module)
}

/// 编译两个阶段并检查接口
pub fn link_program(desc: &ProgramDesc<'_>) -> Result<ProgramReflection, ShaderLoadError> {
    let vertex = compile_stage(desc.vertex.path, desc.vertex.source)?;
    let fragment = compile_stage(desc.fragment.path, desc.fragment.source)?;

    let mut problems = Vec::new();

    let vertex_ep = vertex
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Vertex);
    let fragment_ep = fragment
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Fragment);

    if vertex_ep.is_none() {
        problems.push(format!("{:?} has no @vertex entry point", desc.vertex.path));
    }
    if fragment_ep.is_none() {
        problems.push(format!(
            "{:?} has no @fragment entry point",
            desc.fragment.path
        ));
    }

    let mut vertex_inputs = BTreeSet::new();
    let mut entries = None;
    if let (Some(vs), Some(fs)) = (vertex_ep, fragment_ep) {
        entries = Some((vs.name.clone(), fs.name.clone()));
        for arg in &vs.function.arguments {
            collect_locations(&vertex, arg.binding.as_ref(), arg.ty, &mut vertex_inputs);
        }
        let mut vertex_outputs = BTreeSet::new();
        if let Some(result) = &vs.function.result {
            collect_locations(&vertex, result.binding.as_ref(), result.ty, &mut vertex_outputs);
        }
        let mut fragment_inputs = BTreeSet::new();
        for arg in &fs.function.arguments {
            collect_locations(&fragment, arg.binding.as_ref(), arg.ty, &mut fragment_inputs);
        }

        for location in fragment_inputs.difference(&vertex_outputs) {
            problems.push(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            ));
        }
        let provided: BTreeSet<u32> = desc.layout.input_locations().iter().copied().collect();
        for location in vertex_inputs.difference(&provided) {
            problems.push(format!(
                "vertex input @location({location}) is not provided by the {:?} vertex layout",
                desc.layout
            ));
        }
    }

    let mut uniform_blocks = BTreeSet::new();
    for module in [&vertex, &fragment] {
        collect_uniform_blocks(module, desc.uniform_binding, &mut uniform_blocks, &mut problems);
    }

    match entries {
        Some((vertex_entry, fragment_entry)) if problems.is_empty() => Ok(ProgramReflection {
            vertex_entry,
            fragment_entry,
            vertex_inputs,
            uniform_blocks: uniform_blocks.into_iter().collect(),
        }),
        _ => Err(ShaderLoadError::Link {
            program: desc.label.to_string(),
            log: problems.join("\n"),
        }),
    }
}

fn collect_locations(
    module: &Module,
    binding: Option<&Binding>,
    ty: Handle<Type>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        out.insert(*location);
                    }
                }
            }
        }
    }
}

fn collect_uniform_blocks(
    module: &Module,
    expected_binding: u32,
    out: &mut BTreeSet<UniformBlockInfo>,
    problems: &mut Vec<String>,
) {
    for (_, var) in module.global_variables.iter() {
        let is_resource = matches!(
            var.space,
            AddressSpace::Uniform | AddressSpace::Storage { .. } | AddressSpace::Handle
        );
        if !is_resource {
            continue;
        }

        let name = var.name.as_deref().unwrap_or("<unnamed>");
        if var.space != AddressSpace::Uniform {
            problems.push(format!(
                "global '{name}' is a {:?} resource; only uniform blocks are supported",
                var.space
            ));
            continue;
        }

        let Some(binding) = &var.binding else {
            problems.push(format!("uniform '{name}' has no @group/@binding"));
            continue;
        };
        if binding.group != 0 || binding.binding != expected_binding {
            problems.push(format!(
                "uniform '{name}' is at @group({}) @binding({}), expected @group(0) @binding({expected_binding})",
                binding.group, binding.binding
            ));
            continue;
        }

        let ty = &module.types[var.ty];
        let size = ty.inner.size(module.to_ctx());
        if u64::from(size) > UniformBlock::SIZE {
            problems.push(format!(
                "uniform '{name}' needs {size} bytes but the frame uniform block has {}",
                UniformBlock::SIZE
            ));
            continue;
        }

        out.insert(UniformBlockInfo {
            variable: var.name.clone(),
            type_name: ty.name.clone(),
            group: binding.group,
            binding: binding.binding,
            size,
        });
    }
}
