use glam::Vec3;
use rapier3d::parry::utils::Array2;
use rapier3d::prelude::Real;

use crate::error::PhysicsError;

/// Surface and damping parameters shared by every dynamic body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMaterial {
    pub friction: Real,
    pub restitution: Real,
    pub linear_damping: Real,
    pub angular_damping: Real,
}

impl Default for BodyMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.7,
            linear_damping: 0.1,
            angular_damping: 0.3,
        }
    }
}

impl BodyMaterial {
    pub const TERRAIN: Self = Self {
        friction: 0.8,
        restitution: 0.2,
        linear_damping: 0.0,
        angular_damping: 0.0,
    };
}

/// Row-major grid of height samples, `depth` rows of `width` samples each.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightfield {
    pub width: usize,
    pub depth: usize,
    pub heights: Vec<f32>,
    /// Spacing between samples on x/z and height multiplier on y.
    pub scale: Vec3,
}

impl Heightfield {
    pub fn new(width: usize, depth: usize, heights: Vec<f32>, scale: Vec3) -> Self {
        Self {
            width,
            depth,
            heights,
            scale,
        }
    }

    pub fn flat(width: usize, depth: usize, scale: Vec3) -> Self {
        Self::new(width, depth, vec![0.0; width * depth], scale)
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.width < 2 || self.depth < 2 {
            return Err(PhysicsError::HeightfieldTooSmall {
                width: self.width,
                depth: self.depth,
            });
        }

        let expected = self.width * self.depth;
        if self.heights.len() != expected {
            return Err(PhysicsError::HeightfieldSize {
                width: self.width,
                depth: self.depth,
                expected,
                actual: self.heights.len(),
            });
        }

        for (what, value) in [
            ("terrain scale x", self.scale.x),
            ("terrain scale y", self.scale.y),
            ("terrain scale z", self.scale.z),
        ] {
            positive(what, value)?;
        }

        if let Some(bad) = self.heights.iter().find(|h| !h.is_finite()) {
            return Err(PhysicsError::InvalidDimension {
                what: "terrain height",
                value: *bad,
            });
        }

        Ok(())
    }

    pub fn min_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Full extents of the field; x/z span every sample gap, y is the height multiplier.
    pub fn extents(&self) -> Vec3 {
        Vec3::new(
            self.scale.x * (self.width - 1) as f32,
            self.scale.y,
            self.scale.z * (self.depth - 1) as f32,
        )
    }

    // Rows run along z and columns along x; the collider grid is column-major.
    pub(crate) fn to_grid(&self) -> Array2<Real> {
        let mut data = Vec::with_capacity(self.heights.len());
        for column in 0..self.width {
            for row in 0..self.depth {
                data.push(self.heights[row * self.width + column]);
            }
        }
        Array2::new(self.depth, self.width, data)
    }
}

pub(crate) fn positive(what: &'static str, value: f32) -> Result<(), PhysicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidDimension { what, value })
    }
}
