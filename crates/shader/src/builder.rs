use crate::context::{GpuContext, ShaderStage};
use crate::error::{BuildError, ShaderError};
use crate::guard::{Attachment, ProgramGuard, ShaderGuard};
use crate::report::Reporter;

/// Compile a vertex and a fragment stage and link them into one program.
///
/// Both stages are compiled even when the other fails, so every stage
/// diagnostic is reported in one pass. On success the linked program is
/// handed to the caller, who owns it from then on. On any failure every
/// object allocated here has been deleted before this returns, and each
/// failure has been passed to `reporter`.
///
/// Failures are also traced at `debug` level. Pass a
/// [`TracingReporter`](crate::TracingReporter) to see them at `error` level.
///
/// Order of GPU calls on the happy path: create program, create/source/
/// compile vertex, create/source/compile fragment, attach both, link,
/// detach both, delete both shaders, query link status.
pub fn build_program<C: GpuContext>(
    ctx: &C,
    reporter: &dyn Reporter,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<C::Program, BuildError> {
    let _span = tracing::info_span!("build_program").entered();

    let program = match ctx.create_program() {
        Ok(program) => Ok(ProgramGuard::new(ctx, program)),
        Err(reason) => {
            tracing::debug!(%reason, "program object unavailable");
            reporter.report(&format!("Unable to create program object: {reason}"));
            Err(reason)
        }
    };

    let vertex = compile_stage(ctx, reporter, ShaderStage::Vertex, vertex_source);
    let fragment = compile_stage(ctx, reporter, ShaderStage::Fragment, fragment_source);

    let (program, vertex, fragment) = match (program, vertex, fragment) {
        (Ok(program), Ok(vertex), Ok(fragment)) => (program, vertex, fragment),
        (Err(reason), vertex, fragment) => {
            let stages = stage_failures(vertex, fragment);
            return Err(BuildError::ProgramCreation { reason, stages });
        }
        (Ok(_), vertex, fragment) => {
            return Err(BuildError::Stages(stage_failures(vertex, fragment)));
        }
    };

    let vertex_attached = Attachment::new(ctx, &program, &vertex);
    let fragment_attached = Attachment::new(ctx, &program, &fragment);
    ctx.link_program(program.handle());
    drop(vertex_attached);
    drop(fragment_attached);

    drop(vertex);
    drop(fragment);

    if !ctx.program_link_status(program.handle()) {
        let err = BuildError::Link(ctx.program_info_log(program.handle()));
        tracing::debug!(error = %err, "program link failed");
        reporter.report(&err.to_string());
        return Err(err);
    }

    tracing::info!(program = ?program.handle(), "program linked");
    Ok(program.release())
}

/// Failed stages in pipeline order. Successful stages are dropped here, which
/// deletes their shader objects.
fn stage_failures<C: GpuContext>(
    vertex: Result<ShaderGuard<'_, C>, ShaderError>,
    fragment: Result<ShaderGuard<'_, C>, ShaderError>,
) -> Vec<ShaderError> {
    [vertex.err(), fragment.err()].into_iter().flatten().collect()
}

fn compile_stage<'c, C: GpuContext>(
    ctx: &'c C,
    reporter: &dyn Reporter,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderGuard<'c, C>, ShaderError> {
    let shader = match ctx.create_shader(stage) {
        Ok(shader) => ShaderGuard::new(ctx, stage, shader),
        Err(reason) => {
            tracing::debug!(%stage, %reason, "unable to create shader object");
            let err = ShaderError::ObjectCreation { stage, reason };
            reporter.report(&err.to_string());
            return Err(err);
        }
    };

    tracing::debug!(%stage, bytes = source.len(), "compiling shader");
    ctx.shader_source(shader.handle(), source);
    ctx.compile_shader(shader.handle());

    if !ctx.shader_compile_status(shader.handle()) {
        let err = ShaderError::Compile {
            stage,
            log: ctx.shader_info_log(shader.handle()),
        };
        tracing::debug!(%stage, error = %err, "shader compilation failed");
        reporter.report(&err.to_string());
        return Err(err);
    }

    Ok(shader)
}
