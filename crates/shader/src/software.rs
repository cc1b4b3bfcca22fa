//! CPU stand-in for a GL driver.
//!
//! `SoftwareContext` implements [`GpuContext`] without touching a GPU. It
//! keeps an ordered log of every call and tracks which objects are alive.
//!
//! Compilation runs naga's GLSL front end (GLSL 4.40+ core, Vulkan-style
//! layout rules), so the info log carries real parse and type errors.
//! Linking matches the vertex entry point's `location` outputs against the
//! fragment entry point's inputs, comparing types structurally.

use std::cell::RefCell;
use std::collections::BTreeMap;

use naga::front::glsl::{Frontend, Options, ParseErrors};
use naga::{Binding, Handle, Scalar, ScalarKind, Type, TypeInner};

use crate::context::{GpuContext, ShaderStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Failure injection for the software driver.
#[derive(Debug, Clone, Default)]
pub struct SoftwareConfig {
    /// Refuse to allocate vertex shader objects.
    pub refuse_vertex_shader: bool,
    /// Refuse to allocate fragment shader objects.
    pub refuse_fragment_shader: bool,
    /// Refuse to allocate program objects.
    pub refuse_program: bool,
}

impl SoftwareConfig {
    fn refuses(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Vertex => self.refuse_vertex_shader,
            ShaderStage::Fragment => self.refuse_fragment_shader,
        }
    }
}

/// One entry in the call log, in the order the calls were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuCall {
    CreateShader {
        stage: ShaderStage,
        result: Option<ShaderId>,
    },
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    ShaderCompileStatus(ShaderId),
    ShaderInfoLog(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram {
        result: Option<ProgramId>,
    },
    AttachShader {
        program: ProgramId,
        shader: ShaderId,
    },
    DetachShader {
        program: ProgramId,
        shader: ShaderId,
    },
    LinkProgram(ProgramId),
    ProgramLinkStatus(ProgramId),
    ProgramInfoLog(ProgramId),
    DeleteProgram(ProgramId),
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    module: Option<naga::Module>,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
struct DriverState {
    last_id: u32,
    shaders: BTreeMap<ShaderId, ShaderObject>,
    programs: BTreeMap<ProgramId, ProgramObject>,
    calls: Vec<GpuCall>,
    errors: Vec<String>,
}

impl DriverState {
    fn next_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    fn invalid(&mut self, message: String) {
        tracing::warn!(%message, "software driver: invalid operation");
        self.errors.push(message);
    }
}

/// Software GL context. Single-threaded; all state sits behind a `RefCell`.
#[derive(Debug, Default)]
pub struct SoftwareContext {
    config: SoftwareConfig,
    state: RefCell<DriverState>,
}

impl SoftwareContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SoftwareConfig) -> Self {
        Self {
            config,
            state: RefCell::default(),
        }
    }

    pub fn config(&self) -> &SoftwareConfig {
        &self.config
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.state.borrow().calls.clone()
    }

    /// Shader objects created and not yet deleted.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Program objects created and not yet deleted.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Invalid operations seen so far (unknown handles, double deletes,
    /// detaching something that was never attached).
    pub fn gl_errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    fn with_state<R>(&self, call: GpuCall, f: impl FnOnce(&mut DriverState) -> R) -> R {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        f(&mut state)
    }
}

impl GpuContext for SoftwareContext {
    type Shader = ShaderId;
    type Program = ProgramId;

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String> {
        let mut state = self.state.borrow_mut();
        if self.config.refuses(stage) {
            state.calls.push(GpuCall::CreateShader {
                stage,
                result: None,
            });
            return Err(format!("software driver refused to allocate a {stage} shader"));
        }

        let id = ShaderId(state.next_id());
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                module: None,
                log: String::new(),
            },
        );
        state.calls.push(GpuCall::CreateShader {
            stage,
            result: Some(id),
        });
        Ok(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        self.with_state(GpuCall::ShaderSource(shader), |state| {
            match state.shaders.get_mut(&shader) {
                Some(object) => object.source = source.to_owned(),
                None => state.invalid(format!("shader_source: unknown shader {}", shader.0)),
            }
        })
    }

    fn compile_shader(&self, shader: ShaderId) {
        self.with_state(GpuCall::CompileShader(shader), |state| {
            match state.shaders.get_mut(&shader) {
                Some(object) => match compile_glsl(object.stage, &object.source) {
                    Ok(module) => {
                        object.module = Some(module);
                        object.log.clear();
                    }
                    Err(log) => {
                        object.module = None;
                        object.log = log;
                    }
                },
                None => state.invalid(format!("compile_shader: unknown shader {}", shader.0)),
            }
        })
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.with_state(GpuCall::ShaderCompileStatus(shader), |state| {
            match state.shaders.get(&shader) {
                Some(object) => object.module.is_some(),
                None => {
                    state.invalid(format!("shader_compile_status: unknown shader {}", shader.0));
                    false
                }
            }
        })
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.with_state(GpuCall::ShaderInfoLog(shader), |state| {
            match state.shaders.get(&shader) {
                Some(object) => object.log.clone(),
                None => {
                    state.invalid(format!("shader_info_log: unknown shader {}", shader.0));
                    String::new()
                }
            }
        })
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.with_state(GpuCall::DeleteShader(shader), |state| {
            if state.shaders.remove(&shader).is_none() {
                state.invalid(format!("delete_shader: unknown shader {}", shader.0));
            }
        })
    }

    fn create_program(&self) -> Result<ProgramId, String> {
        let mut state = self.state.borrow_mut();
        if self.config.refuse_program {
            state.calls.push(GpuCall::CreateProgram { result: None });
            return Err("software driver refused to allocate a program".to_owned());
        }

        let id = ProgramId(state.next_id());
        state.programs.insert(id, ProgramObject::default());
        state.calls.push(GpuCall::CreateProgram { result: Some(id) });
        Ok(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.with_state(GpuCall::AttachShader { program, shader }, |state| {
            if !state.shaders.contains_key(&shader) {
                state.invalid(format!("attach_shader: unknown shader {}", shader.0));
                return;
            }
            let Some(object) = state.programs.get_mut(&program) else {
                state.invalid(format!("attach_shader: unknown program {}", program.0));
                return;
            };
            if object.attached.contains(&shader) {
                state.invalid(format!(
                    "attach_shader: shader {} already attached to program {}",
                    shader.0, program.0
                ));
            } else {
                object.attached.push(shader);
            }
        })
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.with_state(GpuCall::DetachShader { program, shader }, |state| {
            let Some(object) = state.programs.get_mut(&program) else {
                state.invalid(format!("detach_shader: unknown program {}", program.0));
                return;
            };
            match object.attached.iter().position(|s| *s == shader) {
                Some(index) => {
                    object.attached.remove(index);
                }
                None => state.invalid(format!(
                    "detach_shader: shader {} not attached to program {}",
                    shader.0, program.0
                )),
            }
        })
    }

    fn link_program(&self, program: ProgramId) {
        self.with_state(GpuCall::LinkProgram(program), |state| {
            let outcome = match state.programs.get(&program) {
                Some(object) => {
                    let attached: Vec<&ShaderObject> = object
                        .attached
                        .iter()
                        .filter_map(|id| state.shaders.get(id))
                        .collect();
                    link_check(&attached)
                }
                None => {
                    state.invalid(format!("link_program: unknown program {}", program.0));
                    return;
                }
            };
            if let Some(object) = state.programs.get_mut(&program) {
                object.linked = outcome.is_ok();
                object.log = outcome.err().unwrap_or_default();
            }
        })
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.with_state(GpuCall::ProgramLinkStatus(program), |state| {
            match state.programs.get(&program) {
                Some(object) => object.linked,
                None => {
                    state.invalid(format!("program_link_status: unknown program {}", program.0));
                    false
                }
            }
        })
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.with_state(GpuCall::ProgramInfoLog(program), |state| {
            match state.programs.get(&program) {
                Some(object) => object.log.clone(),
                None => {
                    state.invalid(format!("program_info_log: unknown program {}", program.0));
                    String::new()
                }
            }
        })
    }

    fn delete_program(&self, program: ProgramId) {
        self.with_state(GpuCall::DeleteProgram(program), |state| {
            if state.programs.remove(&program).is_none() {
                state.invalid(format!("delete_program: unknown program {}", program.0));
            }
        })
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parse one stage. `Err` is the info log, one `ERROR: 0:<line>: ...` entry
/// per diagnostic.
fn compile_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, String> {
    let module = Frontend::default()
        .parse(&Options::from(naga_stage(stage)), source)
        .map_err(|errors| info_log(&errors, source))?;

    if !module.entry_points.iter().any(|entry| entry.name == "main") {
        return Err("ERROR: 0:1: 'main' : missing entry point".to_owned());
    }
    Ok(module)
}

fn info_log(errors: &ParseErrors, source: &str) -> String {
    errors
        .errors
        .iter()
        .map(|error| {
            let line = error.meta.location(source).line_number;
            format!("ERROR: 0:{line}: {}", error.kind)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn link_check(shaders: &[&ShaderObject]) -> Result<(), String> {
    if shaders.iter().any(|s| s.module.is_none()) {
        return Err("ERROR: One or more attached shaders not successfully compiled".to_owned());
    }
    let module = |wanted: ShaderStage| {
        shaders
            .iter()
            .find(|s| s.stage == wanted)
            .and_then(|s| s.module.as_ref())
    };
    let Some(vertex) = module(ShaderStage::Vertex) else {
        return Err("ERROR: Missing vertex shader".to_owned());
    };
    let Some(fragment) = module(ShaderStage::Fragment) else {
        return Err("ERROR: Missing fragment shader".to_owned());
    };

    let outputs = interface(vertex, Direction::Out);
    let inputs = interface(fragment, Direction::In);

    let mut problems = Vec::new();
    for input in &inputs {
        match outputs.iter().find(|o| o.location == input.location) {
            None => problems.push(format!(
                "ERROR: Input of fragment shader '{}' (location {}) not written by vertex shader",
                input.name, input.location
            )),
            Some(output) if !same_type(vertex, output.ty, fragment, input.ty) => {
                problems.push(format!(
                    "ERROR: Type mismatch for varying '{}' at location {}: {} in vertex shader, \
                     {} in fragment shader",
                    input.name,
                    input.location,
                    type_name(vertex, output.ty),
                    type_name(fragment, input.ty)
                ))
            }
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

/// A user-defined stage interface variable.
#[derive(Debug, Clone)]
struct Varying {
    location: u32,
    name: String,
    ty: Handle<Type>,
}

/// `location`-bound inputs or outputs of the module's `main` entry point.
/// Built-ins such as `gl_Position` are skipped.
fn interface(module: &naga::Module, direction: Direction) -> Vec<Varying> {
    let Some(entry) = module.entry_points.iter().find(|e| e.name == "main") else {
        return Vec::new();
    };

    let mut varyings = Vec::new();
    let mut push = |binding: Option<&Binding>, name: Option<&str>, ty: Handle<Type>| {
        if let Some(Binding::Location { location, .. }) = binding {
            varyings.push(Varying {
                location: *location,
                name: name.unwrap_or("<unnamed>").to_owned(),
                ty,
            });
        }
    };

    match direction {
        Direction::In => {
            for argument in &entry.function.arguments {
                push(argument.binding.as_ref(), argument.name.as_deref(), argument.ty);
            }
        }
        Direction::Out => {
            if let Some(result) = &entry.function.result {
                match &module.types[result.ty].inner {
                    TypeInner::Struct { members, .. } if result.binding.is_none() => {
                        for member in members {
                            push(member.binding.as_ref(), member.name.as_deref(), member.ty);
                        }
                    }
                    _ => push(result.binding.as_ref(), None, result.ty),
                }
            }
        }
    }
    varyings
}

/// Structural equality across two modules. Handles are module-local, so
/// structs and arrays are compared member by member.
fn same_type(a: &naga::Module, a_ty: Handle<Type>, b: &naga::Module, b_ty: Handle<Type>) -> bool {
    match (&a.types[a_ty].inner, &b.types[b_ty].inner) {
        (
            TypeInner::Struct { members: a_members, .. },
            TypeInner::Struct { members: b_members, .. },
        ) => {
            a_members.len() == b_members.len()
                && a_members.iter().zip(b_members).all(|(x, y)| {
                    x.name == y.name && same_type(a, x.ty, b, y.ty)
                })
        }
        (
            TypeInner::Array { base: a_base, size: a_size, .. },
            TypeInner::Array { base: b_base, size: b_size, .. },
        ) => a_size == b_size && same_type(a, *a_base, b, *b_base),
        (x, y) => x == y,
    }
}

fn type_name(module: &naga::Module, ty: Handle<Type>) -> String {
    let ty = &module.types[ty];
    let scalar_prefix = |scalar: Scalar| match scalar.kind {
        ScalarKind::Sint => "i",
        ScalarKind::Uint => "u",
        ScalarKind::Bool => "b",
        _ => "",
    };
    match ty.inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Sint => "int".to_owned(),
            ScalarKind::Uint => "uint".to_owned(),
            ScalarKind::Bool => "bool".to_owned(),
            _ => "float".to_owned(),
        },
        TypeInner::Vector { size, scalar } => {
            format!("{}vec{}", scalar_prefix(scalar), size as u8)
        }
        TypeInner::Matrix { columns, rows, .. } => format!("mat{}x{}", columns as u8, rows as u8),
        TypeInner::Struct { .. } => ty.name.clone().unwrap_or_else(|| "struct".to_owned()),
        ref other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(ctx: &SoftwareContext, stage: ShaderStage, source: &str) -> ShaderId {
        let shader = ctx.create_shader(stage).unwrap();
        ctx.shader_source(shader, source);
        ctx.compile_shader(shader);
        shader
    }

    fn link(vertex: &str, fragment: &str) -> Result<(), String> {
        let ctx = SoftwareContext::new();
        let program = ctx.create_program().unwrap();
        for (stage, source) in [(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)] {
            let shader = compiled(&ctx, stage, source);
            ctx.attach_shader(program, shader);
        }
        ctx.link_program(program);
        if ctx.program_link_status(program) {
            Ok(())
        } else {
            Err(ctx.program_info_log(program))
        }
    }

    const EMPTY_VERTEX: &str = "#version 450
void main() {
    gl_Position = vec4(0.0);
}
";

    const DIR_VERTEX: &str = "#version 450
layout(location = 0) out vec3 v_dir;
void main() {
    v_dir = vec3(0.0, 0.0, -1.0);
    gl_Position = vec4(0.0);
}
";

    const DIR_FRAGMENT: &str = "#version 450
layout(location = 0) in vec3 v_dir;
layout(location = 0) out vec4 colour;
void main() {
    colour = vec4(normalize(v_dir), 1.0);
}
";

    #[test]
    fn compile_accepts_minimal_shader() {
        assert!(compile_glsl(ShaderStage::Vertex, "#version 450\nvoid main() {}\n").is_ok());
    }

    #[test]
    fn compile_handles_comments_and_defines() {
        let source = "#version 450
#define SCALE 2.0
// stray } in a line comment
/* and ( in a
   block comment */
layout(location = 0) out vec4 colour;
void main() { colour = vec4(SCALE); }
";
        assert!(compile_glsl(ShaderStage::Fragment, source).is_ok());
    }

    #[test]
    fn compile_reports_line_of_syntax_error() {
        let source = "#version 450\nvoid main() {\n    float x = (1.0 + 2.0;\n}\n";
        let log = compile_glsl(ShaderStage::Vertex, source).unwrap_err();
        assert!(log.starts_with("ERROR: 0:3: "), "{log}");
    }

    #[test]
    fn compile_rejects_undeclared_names() {
        let source = "#version 450\nvoid main() {\n    gl_Position = vec4(banana);\n}\n";
        let log = compile_glsl(ShaderStage::Vertex, source).unwrap_err();
        assert!(log.contains("banana"), "{log}");

        let nonsense = "#version 450
void main() { gl_Position = vec5(banana) + undefined_fn(); floatt q = ; }
";
        assert!(compile_glsl(ShaderStage::Vertex, nonsense).is_err());
    }

    #[test]
    fn compile_rejects_unterminated_block() {
        assert!(compile_glsl(ShaderStage::Fragment, "#version 450\nvoid main() {\n").is_err());
    }

    #[test]
    fn compile_requires_entry_point() {
        let source = "#version 450\nfloat helper() { return 1.0; }\n";
        let log = compile_glsl(ShaderStage::Vertex, source).unwrap_err();
        assert!(log.contains("entry point"), "{log}");
        assert!(compile_glsl(ShaderStage::Vertex, "").is_err());
    }

    #[test]
    fn compile_status_and_log_through_context() {
        let ctx = SoftwareContext::new();
        let good = compiled(&ctx, ShaderStage::Vertex, EMPTY_VERTEX);
        let bad = compiled(&ctx, ShaderStage::Fragment, "#version 450\nvoid main() {");
        assert!(ctx.shader_compile_status(good));
        assert!(ctx.shader_info_log(good).is_empty());
        assert!(!ctx.shader_compile_status(bad));
        assert!(ctx.shader_info_log(bad).starts_with("ERROR: 0:"));
    }

    #[test]
    fn link_matches_interfaces() {
        assert_eq!(link(DIR_VERTEX, DIR_FRAGMENT), Ok(()));
    }

    #[test]
    fn link_matches_by_location() {
        let vertex = "#version 450
layout(location = 2) out vec2 v_coord;
void main() {
    v_coord = vec2(1.0);
    gl_Position = vec4(0.0);
}
";
        let fragment = "#version 450
layout(location = 2) in vec2 v_uv;
layout(location = 0) out vec4 colour;
void main() {
    colour = vec4(v_uv, 0.0, 1.0);
}
";
        assert_eq!(link(vertex, fragment), Ok(()));
    }

    #[test]
    fn link_reports_missing_varying() {
        let log = link(EMPTY_VERTEX, DIR_FRAGMENT).unwrap_err();
        assert_eq!(
            log,
            "ERROR: Input of fragment shader 'v_dir' (location 0) not written by vertex shader"
        );
    }

    #[test]
    fn link_reports_type_mismatch() {
        let vertex = "#version 450
layout(location = 0) out vec2 v_dir;
void main() {
    v_dir = vec2(0.0);
    gl_Position = vec4(0.0);
}
";
        let log = link(vertex, DIR_FRAGMENT).unwrap_err();
        assert!(log.contains("Type mismatch for varying 'v_dir'"), "{log}");
        assert!(log.contains("vec2 in vertex shader, vec3 in fragment shader"), "{log}");
    }

    #[test]
    fn link_rejects_uncompiled_shader() {
        let log = link("#version 450\nvoid main() {", DIR_FRAGMENT).unwrap_err();
        assert!(log.contains("not successfully compiled"));
    }

    #[test]
    fn link_requires_both_stages() {
        let ctx = SoftwareContext::new();
        let program = ctx.create_program().unwrap();
        let vertex = compiled(&ctx, ShaderStage::Vertex, EMPTY_VERTEX);
        ctx.attach_shader(program, vertex);
        ctx.link_program(program);
        assert!(!ctx.program_link_status(program));
        assert_eq!(ctx.program_info_log(program), "ERROR: Missing fragment shader");
    }

    #[test]
    fn unlinked_program_reports_false() {
        let ctx = SoftwareContext::new();
        let program = ctx.create_program().unwrap();
        assert!(!ctx.program_link_status(program));
        assert!(ctx.program_info_log(program).is_empty());
    }

    #[test]
    fn tracks_live_objects_and_invalid_operations() {
        let ctx = SoftwareContext::new();
        let program = ctx.create_program().unwrap();
        let shader = ctx.create_shader(ShaderStage::Vertex).unwrap();
        assert_eq!((ctx.live_programs(), ctx.live_shaders()), (1, 1));

        ctx.detach_shader(program, shader);
        ctx.delete_shader(shader);
        ctx.delete_shader(shader);
        ctx.delete_program(program);

        assert_eq!((ctx.live_programs(), ctx.live_shaders()), (0, 0));
        let errors = ctx.gl_errors();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("not attached"));
        assert!(errors[1].contains("unknown shader"));
    }

    #[test]
    fn refused_allocations_are_logged() {
        let ctx = SoftwareContext::with_config(SoftwareConfig {
            refuse_fragment_shader: true,
            refuse_program: true,
            ..SoftwareConfig::default()
        });
        assert!(ctx.config().refuse_program);
        assert!(ctx.create_program().is_err());
        assert!(ctx.create_shader(ShaderStage::Vertex).is_ok());
        assert!(ctx.create_shader(ShaderStage::Fragment).is_err());
        assert_eq!(
            ctx.calls(),
            vec![
                GpuCall::CreateProgram { result: None },
                GpuCall::CreateShader {
                    stage: ShaderStage::Vertex,
                    result: Some(ShaderId(1))
                },
                GpuCall::CreateShader {
                    stage: ShaderStage::Fragment,
                    result: None
                },
            ]
        );
    }
}
