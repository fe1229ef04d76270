//! Spatial and display types

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// An empty box has `min > max` on every axis so that merging anything into
/// it yields the other operand unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignedBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl AlignedBox {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A cube of edge `size` centered at the origin
    pub fn cube(size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self::new(-half, half)
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.merge_point(p);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn merge(&mut self, other: &AlignedBox) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn merge_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Transform all eight corners and take their bounds
    pub fn transformed(&self, m: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(self.corners().into_iter().map(|c| m.transform_point3(c)))
    }

    pub fn approx_eq(&self, other: &AlignedBox, epsilon: f32) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() == other.is_empty();
        }
        self.min.abs_diff_eq(other.min, epsilon) && self.max.abs_diff_eq(other.max, epsilon)
    }
}

impl Default for AlignedBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Shear factors, applied after scale in the pivot pipeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shear {
    pub xy: f32,
    pub xz: f32,
    pub yz: f32,
}

impl Shear {
    pub const IDENTITY: Self = Self {
        xy: 0.0,
        xz: 0.0,
        yz: 0.0,
    };

    pub const fn new(xy: f32, xz: f32, yz: f32) -> Self {
        Self { xy, xz, yz }
    }

    /// Upper-triangular shear: x' = x + xy*y + xz*z, y' = y + yz*z
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(self.xy, 1.0, 0.0),
            Vec3::new(self.xz, self.yz, 1.0),
        )
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_mat3(self.to_mat3())
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.xy, self.xz, self.yz]
    }

    pub fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const GRAY: Self = Self::new(0.5, 0.5, 0.5, 1.0);

    /// Material color of selected nodes
    pub const SELECTED: Self = Self::new(1.0, 1.0, 0.5, 1.0);
    /// Material color of highlighted (hovered) nodes
    pub const HIGHLIGHTED: Self = Self::new(0.5, 1.0, 1.0, 1.0);
    /// Material color of nodes reacting to a selected ancestor
    pub const REACTIVE: Self = Self::new(1.0, 0.75, 0.5, 1.0);
    /// Material color of nodes that are visible but not selectable
    pub const UNSELECTABLE: Self = Self::new(0.35, 0.35, 0.35, 1.0);
    /// Material color of live (procedurally driven) nodes
    pub const LIVE: Self = Self::new(1.0, 0.5, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
