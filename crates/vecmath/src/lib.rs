//! Vector math: 2D/3D value types for scene geometry and camera math.
//!
//! # Invariants
//! - Every vector is fully initialized; there is no partial component state.
//! - Division and normalisation never panic. A zero divisor (or a zero-length
//!   vector) produces non-finite components, which callers may test for with
//!   `is_finite`.
//!
//! # Conventions
//! Binary operators come in two families: `*_into(rhs, out)` writes into a
//! caller-owned vector and returns it, `*_new(rhs)` returns a fresh one.
//! Unary operators and the `*_assign` family mutate `self` and return it for
//! chaining.

mod vec2;
mod vec3;

pub use vec2::Vec2;
pub use vec3::Vec3;

/// Threshold used by `is_non_zero`: a component counts only if its absolute
/// value is strictly greater than this.
pub const NON_ZERO_EPSILON: f32 = 0.01;

pub fn crate_info() -> &'static str {
    "raytrace-vecmath v0.1.0"
}
