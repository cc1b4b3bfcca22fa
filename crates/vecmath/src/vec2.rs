use core::ops::{Add, Div, Mul, Neg, Sub};

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::NON_ZERO_EPSILON;

/// 2D vector used for screen-space and planar scene math.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub const fn positive_x() -> Self {
        Self::new(1.0, 0.0)
    }

    pub const fn negative_x() -> Self {
        Self::new(-1.0, 0.0)
    }

    pub const fn positive_y() -> Self {
        Self::new(0.0, 1.0)
    }

    pub const fn negative_y() -> Self {
        Self::new(0.0, -1.0)
    }

    /// Random unit vector using the thread-local RNG.
    ///
    /// See [`Vec2::random_unit_with`] for the sampling scheme.
    pub fn random_unit() -> Self {
        Self::random_unit_with(&mut rand::thread_rng())
    }

    /// Random unit vector from the given RNG.
    ///
    /// Each component is drawn uniformly from `[-1, 1)` and the point is then
    /// normalised. Directions are NOT uniform on the circle: samples cluster
    /// toward the diagonals because the box corners reach further out than
    /// its edges.
    pub fn random_unit_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut v = Self::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        *v.normalise()
    }

    #[inline]
    pub fn dot(self, rhs: Vec2) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    #[inline]
    pub fn magnitude_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length. Uses `hypot`, so large components do not overflow
    /// the way `magnitude_squared().sqrt()` would.
    #[inline]
    pub fn magnitude(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Scales `self` to unit length in place.
    ///
    /// A zero vector has an infinite reciprocal and ends up with NaN
    /// components; no check is made.
    pub fn normalise(&mut self) -> &mut Self {
        let recip = 1.0 / self.magnitude();

        self.x *= recip;
        self.y *= recip;

        self
    }

    /// Rotates counter-clockwise by `angle` radians in place.
    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        let Self { x, y } = *self;
        let (sin, cos) = angle.sin_cos();

        self.x = x * cos - y * sin;
        self.y = x * sin + y * cos;

        self
    }

    pub fn is_non_zero(self) -> bool {
        self.x.abs() > NON_ZERO_EPSILON || self.y.abs() > NON_ZERO_EPSILON
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn negate(&mut self) -> &mut Self {
        self.x = -self.x;
        self.y = -self.y;

        self
    }

    pub fn add_into(self, rhs: Vec2, out: &mut Vec2) -> &mut Vec2 {
        out.x = self.x + rhs.x;
        out.y = self.y + rhs.y;

        out
    }

    pub fn add_new(self, rhs: Vec2) -> Vec2 {
        let mut out = Vec2::zero();
        self.add_into(rhs, &mut out);
        out
    }

    pub fn add_assign(&mut self, rhs: Vec2) -> &mut Self {
        self.x += rhs.x;
        self.y += rhs.y;

        self
    }

    pub fn sub_into(self, rhs: Vec2, out: &mut Vec2) -> &mut Vec2 {
        out.x = self.x - rhs.x;
        out.y = self.y - rhs.y;

        out
    }

    pub fn sub_new(self, rhs: Vec2) -> Vec2 {
        let mut out = Vec2::zero();
        self.sub_into(rhs, &mut out);
        out
    }

    pub fn sub_assign(&mut self, rhs: Vec2) -> &mut Self {
        self.x -= rhs.x;
        self.y -= rhs.y;

        self
    }

    pub fn mul_into(self, rhs: f32, out: &mut Vec2) -> &mut Vec2 {
        out.x = self.x * rhs;
        out.y = self.y * rhs;

        out
    }

    pub fn mul_new(self, rhs: f32) -> Vec2 {
        let mut out = Vec2::zero();
        self.mul_into(rhs, &mut out);
        out
    }

    pub fn mul_assign(&mut self, rhs: f32) -> &mut Self {
        self.x *= rhs;
        self.y *= rhs;

        self
    }

    /// Multiplies by the reciprocal of `rhs`; `rhs == 0` gives non-finite output.
    pub fn div_into(self, rhs: f32, out: &mut Vec2) -> &mut Vec2 {
        self.mul_into(1.0 / rhs, out)
    }

    pub fn div_new(self, rhs: f32) -> Vec2 {
        self.mul_new(1.0 / rhs)
    }

    pub fn div_assign(&mut self, rhs: f32) -> &mut Self {
        self.mul_assign(1.0 / rhs)
    }

    pub fn copy_from(&mut self, rhs: Vec2) {
        self.x = rhs.x;
        self.y = rhs.y;
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        self.add_new(rhs)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        self.sub_new(rhs)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        self.mul_new(rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn div(self, rhs: f32) -> Vec2 {
        self.div_new(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(mut self) -> Vec2 {
        *self.negate()
    }
}

impl From<glam::Vec2> for Vec2 {
    fn from(v: glam::Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vec2> for glam::Vec2 {
    fn from(v: Vec2) -> Self {
        glam::Vec2::new(v.x, v.y)
    }
}
