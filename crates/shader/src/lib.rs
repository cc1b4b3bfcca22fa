//! Shader program build pipeline: compile two stages, link, report, release.
//!
//! # Invariants
//! - Shader objects never outlive `build_program`, whatever fails.
//! - A failed build deletes its program before returning.
//! - Every failure is passed to the injected [`Reporter`] and logged through
//!   `tracing`; the caller decides whether to abort, fall back or retry.
//!
//! The GPU is reached only through the [`GpuContext`] trait. [`SoftwareContext`]
//! implements it on the CPU for tests and offline checks; enable the `glow`
//! feature for the real GL/WebGL context.

mod builder;
mod context;
mod error;
mod guard;
mod report;
mod software;
mod source;

#[cfg(feature = "glow")]
mod glow_backend;

pub use builder::build_program;
pub use context::{GpuContext, ShaderStage};
pub use error::{BuildError, ShaderError, SourceError};
pub use report::{CollectingReporter, NullReporter, Reporter, TracingReporter};
pub use software::{GpuCall, ProgramId, ShaderId, SoftwareConfig, SoftwareContext};
pub use source::{FRAGMENT_FILE_NAME, ShaderPaths, ShaderSources, VERTEX_FILE_NAME};

pub fn crate_info() -> &'static str {
    "raytrace-shader v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("shader"));
    }

    #[test]
    fn bundled_ray_tracer_shaders_link() {
        let sources = ShaderSources::new(
            include_str!("../../../shaders/ray-tracer.vert"),
            include_str!("../../../shaders/ray-tracer.frag"),
        );
        let ctx = SoftwareContext::new();
        let reporter = CollectingReporter::new();

        let program = build_program(&ctx, &reporter, &sources.vertex, &sources.fragment);

        assert!(program.is_ok(), "{:?}", reporter.messages());
        assert_eq!(ctx.live_shaders(), 0);
    }
}
