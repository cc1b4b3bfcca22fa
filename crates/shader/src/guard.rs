//! Scoped ownership of GPU objects for the build pipeline.
//!
//! Each guard releases its object exactly once when dropped, including while
//! unwinding out of a reporter.

use crate::context::{GpuContext, ShaderStage};

/// A successfully created shader object. Deleted on drop.
pub(crate) struct ShaderGuard<'c, C: GpuContext> {
    ctx: &'c C,
    stage: ShaderStage,
    shader: C::Shader,
}

impl<'c, C: GpuContext> ShaderGuard<'c, C> {
    pub(crate) fn new(ctx: &'c C, stage: ShaderStage, shader: C::Shader) -> Self {
        Self { ctx, stage, shader }
    }

    pub(crate) fn handle(&self) -> C::Shader {
        self.shader
    }
}

impl<C: GpuContext> Drop for ShaderGuard<'_, C> {
    fn drop(&mut self) {
        tracing::trace!(stage = %self.stage, shader = ?self.shader, "deleting shader");
        self.ctx.delete_shader(self.shader);
    }
}

/// A program object that is deleted on drop unless released to the caller.
pub(crate) struct ProgramGuard<'c, C: GpuContext> {
    ctx: &'c C,
    program: C::Program,
    armed: bool,
}

impl<'c, C: GpuContext> ProgramGuard<'c, C> {
    pub(crate) fn new(ctx: &'c C, program: C::Program) -> Self {
        Self {
            ctx,
            program,
            armed: true,
        }
    }

    pub(crate) fn handle(&self) -> C::Program {
        self.program
    }

    /// Hand the program to the caller; the guard no longer deletes it.
    pub(crate) fn release(mut self) -> C::Program {
        self.armed = false;
        self.program
    }
}

impl<C: GpuContext> Drop for ProgramGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            tracing::trace!(program = ?self.program, "deleting program");
            self.ctx.delete_program(self.program);
        }
    }
}

/// A shader attached to a program. Detached on drop.
pub(crate) struct Attachment<'c, C: GpuContext> {
    ctx: &'c C,
    program: C::Program,
    shader: C::Shader,
}

impl<'c, C: GpuContext> Attachment<'c, C> {
    pub(crate) fn new(
        ctx: &'c C,
        program: &ProgramGuard<'c, C>,
        shader: &ShaderGuard<'c, C>,
    ) -> Self {
        let (program, shader) = (program.handle(), shader.handle());
        ctx.attach_shader(program, shader);
        Self {
            ctx,
            program,
            shader,
        }
    }
}

impl<C: GpuContext> Drop for Attachment<'_, C> {
    fn drop(&mut self) {
        self.ctx.detach_shader(self.program, self.shader);
    }
}
