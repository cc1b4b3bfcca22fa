use core::ops::{Add, Div, Mul, Neg, Sub};

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::NON_ZERO_EPSILON;

/// 3D vector for ray origins, directions and camera bases.
///
/// Same operator families as [`crate::Vec2`], without `rotate`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn positive_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub const fn negative_x() -> Self {
        Self::new(-1.0, 0.0, 0.0)
    }

    pub const fn positive_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub const fn negative_y() -> Self {
        Self::new(0.0, -1.0, 0.0)
    }

    pub const fn positive_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub const fn negative_z() -> Self {
        Self::new(0.0, 0.0, -1.0)
    }

    pub fn random_unit() -> Self {
        Self::random_unit_with(&mut rand::thread_rng())
    }

    /// Components uniform in `[-1, 1)`, then normalised. Biased toward the
    /// cube's corners rather than uniform on the sphere.
    pub fn random_unit_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut v = Self::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        *v.normalise()
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn magnitude_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn magnitude(self) -> f32 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Zero-length input yields NaN components.
    pub fn normalise(&mut self) -> &mut Self {
        let recip = 1.0 / self.magnitude();

        self.x *= recip;
        self.y *= recip;
        self.z *= recip;

        self
    }

    pub fn is_non_zero(self) -> bool {
        self.x.abs() > NON_ZERO_EPSILON
            || self.y.abs() > NON_ZERO_EPSILON
            || self.z.abs() > NON_ZERO_EPSILON
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn negate(&mut self) -> &mut Self {
        self.x = -self.x;
        self.y = -self.y;
        self.z = -self.z;

        self
    }

    pub fn add_into(self, rhs: Vec3, out: &mut Vec3) -> &mut Vec3 {
        out.x = self.x + rhs.x;
        out.y = self.y + rhs.y;
        out.z = self.z + rhs.z;

        out
    }

    pub fn add_new(self, rhs: Vec3) -> Vec3 {
        let mut out = Vec3::zero();
        self.add_into(rhs, &mut out);
        out
    }

    pub fn add_assign(&mut self, rhs: Vec3) -> &mut Self {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;

        self
    }

    pub fn sub_into(self, rhs: Vec3, out: &mut Vec3) -> &mut Vec3 {
        out.x = self.x - rhs.x;
        out.y = self.y - rhs.y;
        out.z = self.z - rhs.z;

        out
    }

    pub fn sub_new(self, rhs: Vec3) -> Vec3 {
        let mut out = Vec3::zero();
        self.sub_into(rhs, &mut out);
        out
    }

    pub fn sub_assign(&mut self, rhs: Vec3) -> &mut Self {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;

        self
    }

    pub fn mul_into(self, rhs: f32, out: &mut Vec3) -> &mut Vec3 {
        out.x = self.x * rhs;
        out.y = self.y * rhs;
        out.z = self.z * rhs;

        out
    }

    pub fn mul_new(self, rhs: f32) -> Vec3 {
        let mut out = Vec3::zero();
        self.mul_into(rhs, &mut out);
        out
    }

    pub fn mul_assign(&mut self, rhs: f32) -> &mut Self {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;

        self
    }

    pub fn div_into(self, rhs: f32, out: &mut Vec3) -> &mut Vec3 {
        self.mul_into(1.0 / rhs, out)
    }

    pub fn div_new(self, rhs: f32) -> Vec3 {
        self.mul_new(1.0 / rhs)
    }

    pub fn div_assign(&mut self, rhs: f32) -> &mut Self {
        self.mul_assign(1.0 / rhs)
    }

    pub fn copy_from(&mut self, rhs: Vec3) {
        self.x = rhs.x;
        self.y = rhs.y;
        self.z = rhs.z;
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        self.add_new(rhs)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        self.sub_new(rhs)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        self.mul_new(rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        self.div_new(rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(mut self) -> Vec3 {
        *self.negate()
    }
}

impl From<glam::Vec3> for Vec3 {
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for glam::Vec3 {
    fn from(v: Vec3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}
