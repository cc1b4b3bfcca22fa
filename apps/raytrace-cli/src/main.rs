use std::f32::consts::{FRAC_PI_2, FRAC_PI_8};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use raytrace_shader::{
    CollectingReporter, ShaderPaths, ShaderSources, SoftwareContext, build_program,
};
use raytrace_vecmath::{Vec2, Vec3};
use tracing_subscriber::EnvFilter;

/// E|x*y*z| for directions uniform on the unit sphere.
const UNIFORM_SPHERE_MEAN_XYZ: f32 = 0.0797;

#[derive(Parser)]
#[command(name = "raytrace-cli", about = "CLI tool for the ray tracer support layer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Compile and link the shader pair against the software driver
    Check {
        /// Directory holding ray-tracer.vert and ray-tracer.frag
        #[arg(long, default_value = "shaders")]
        dir: PathBuf,
        /// Vertex shader path (overrides --dir)
        #[arg(long)]
        vert: Option<PathBuf>,
        /// Fragment shader path (overrides --dir)
        #[arg(long)]
        frag: Option<PathBuf>,
    },
    /// Draw random unit vectors and show how their directions spread
    Sample {
        /// Number of vectors to draw
        #[arg(
            short,
            long,
            default_value = "10000",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        count: u64,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Vector dimension
        #[arg(
            short,
            long,
            default_value = "3",
            value_parser = clap::value_parser!(u8).range(2..=3)
        )]
        dims: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Info => {
            println!("raytrace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("vecmath: {}", raytrace_vecmath::crate_info());
            println!("shader: {}", raytrace_shader::crate_info());
        }
        Commands::Check { dir, vert, frag } => {
            let defaults = ShaderPaths::in_dir(&dir);
            let paths = ShaderPaths {
                vertex: vert.unwrap_or(defaults.vertex),
                fragment: frag.unwrap_or(defaults.fragment),
            };
            check_shaders(&paths)?;
        }
        Commands::Sample { count, seed, dims } => {
            let mut rng = StdRng::seed_from_u64(seed);
            println!("Sampling {count} random unit vectors in {dims}D (seed={seed})");
            if dims == 2 {
                sample_2d(count, &mut rng);
            } else {
                sample_3d(count, &mut rng);
            }
        }
    }

    Ok(())
}

fn check_shaders(paths: &ShaderPaths) -> Result<()> {
    println!("Checking {} + {}", paths.vertex.display(), paths.fragment.display());
    let sources = ShaderSources::load(paths).context("loading shader sources")?;

    let ctx = SoftwareContext::new();
    let reporter = CollectingReporter::new();
    let outcome = build_program(&ctx, &reporter, &sources.vertex, &sources.fragment);

    for message in reporter.messages() {
        eprintln!("{message}");
    }
    tracing::debug!(calls = ctx.calls().len(), "software driver calls");

    match outcome {
        Ok(program) => {
            println!("OK: program {} linked", program.0);
            Ok(())
        }
        Err(err) => anyhow::bail!("shader check failed: {err}"),
    }
}

fn sample_2d(count: u64, rng: &mut StdRng) {
    let mut near_axis = 0u64;
    for _ in 0..count {
        let v = Vec2::random_unit_with(rng);
        let angle = v.y.abs().atan2(v.x.abs());
        if angle.min(FRAC_PI_2 - angle) < FRAC_PI_8 {
            near_axis += 1;
        }
    }
    let axis_share = near_axis as f64 / count as f64 * 100.0;
    println!("  within 22.5 deg of an axis:    {axis_share:.1}% (uniform circle: 50.0%)");
    println!("  within 22.5 deg of a diagonal: {:.1}%", 100.0 - axis_share);
}

fn sample_3d(count: u64, rng: &mut StdRng) {
    let mut total = 0.0_f64;
    for _ in 0..count {
        let v = Vec3::random_unit_with(rng);
        total += f64::from((v.x * v.y * v.z).abs());
    }
    let mean = total / count as f64;
    println!("  mean |x*y*z|: {mean:.4} (uniform sphere: {UNIFORM_SPHERE_MEAN_XYZ:.4})");
}
