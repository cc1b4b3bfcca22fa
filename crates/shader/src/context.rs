use std::fmt;

/// Pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The slice of a GL-style context the program builder needs.
///
/// Method names follow the GL entry points they stand for. Handles are plain
/// copyable ids; ownership of the objects behind them is managed by the
/// caller (the builder wraps them in drop guards).
///
/// Implementations: [`crate::SoftwareContext`] (CPU stand-in used by tests
/// and the CLI) and `glow::Context` behind the `glow` feature.
pub trait GpuContext {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;

    /// Allocate a shader object. `Err` carries the driver's reason.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    /// Allocate a program object. `Err` carries the driver's reason.
    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
}
