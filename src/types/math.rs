//! Minimal 3D math for pose evaluation
//!
//! The evaluators only need dot/cross products, normalization, distances
//! and rotating a vector by a quaternion, so this stays hand-rolled.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or direction in room space (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// The untracked-joint sentinel: a bone reported exactly at the origin
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const RIGHT: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const FORWARD: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Is this the exact zero sentinel?
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn dot(&self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_sq(&self) -> f32 {
        self.dot(*self)
    }

    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Unit vector, or zero when the length is degenerate
    pub fn normalized(&self) -> Vec3 {
        let len_sq = self.length_sq();
        if len_sq < 1e-12 {
            return Vec3::ZERO;
        }
        *self * (1.0 / len_sq.sqrt())
    }

    pub fn distance(a: Vec3, b: Vec3) -> f32 {
        (a - b).length()
    }

    /// Unsigned angle between two vectors in degrees; 0 when degenerate
    pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
        let la = a.length();
        let lb = b.length();
        if la < 1e-6 || lb < 1e-6 {
            return 0.0;
        }
        let cos = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation as a unit quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `degrees` around `axis` (axis need not be normalized)
    pub fn from_axis_angle_deg(axis: Vec3, degrees: f32) -> Quat {
        let axis = axis.normalized();
        let half = degrees.to_radians() * 0.5;
        let s = half.sin();
        Quat {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

/// A hand-local axis choice for rotation-based fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Forward,
    Up,
    Right,
}

impl Axis {
    pub fn unit(&self) -> Vec3 {
        match self {
            Axis::Forward => Vec3::FORWARD,
            Axis::Up => Vec3::UP,
            Axis::Right => Vec3::RIGHT,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
