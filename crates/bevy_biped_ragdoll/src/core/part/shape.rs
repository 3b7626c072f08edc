use bevy_math::{
    Vec3,
    primitives::{Capsule3d, Cuboid, Sphere},
};
use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::core::physics::{ColliderDesc, ColliderShape};

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    None,
    Box,
    Capsule,
    Sphere,
}

/// Local axis a capsule's length runs along.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapsuleAxis {
    #[default]
    X,
    Y,
    Z,
}

impl CapsuleAxis {
    fn index(self) -> usize {
        match self {
            CapsuleAxis::X => 0,
            CapsuleAxis::Y => 1,
            CapsuleAxis::Z => 2,
        }
    }

    pub fn vector(self) -> Vec3 {
        match self {
            CapsuleAxis::X => Vec3::X,
            CapsuleAxis::Y => Vec3::Y,
            CapsuleAxis::Z => Vec3::Z,
        }
    }

    /// Axis of a cardinal direction, ignoring its sign.
    pub fn from_cardinal(direction: Vec3) -> Self {
        let abs = direction.abs();
        if abs.x >= abs.y && abs.x >= abs.z {
            CapsuleAxis::X
        } else if abs.y >= abs.z {
            CapsuleAxis::Y
        } else {
            CapsuleAxis::Z
        }
    }
}

/// Collision shape of a part, in the part's local space.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartShape {
    pub kind: ShapeKind,
    pub center: Vec3,
    pub size: Vec3,
    /// Only meaningful for capsules.
    pub capsule_axis: CapsuleAxis,
}

impl Default for PartShape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::None,
            center: Vec3::ZERO,
            size: Vec3::ONE,
            capsule_axis: CapsuleAxis::X,
        }
    }
}

impl PartShape {
    /// Moves the capsule's length onto `axis`, swapping the size components of the old and new
    /// axes so the radii are preserved.
    pub fn flip_capsule(&mut self, axis: CapsuleAxis) {
        if axis == self.capsule_axis {
            return;
        }
        let mut size = self.size.to_array();
        size.swap(self.capsule_axis.index(), axis.index());
        self.size = Vec3::from_array(size);
        self.capsule_axis = axis;
    }

    /// Writes `length` into the size component along the capsule axis.
    pub fn set_capsule_length(&mut self, length: f32) {
        self.size[self.capsule_axis.index()] = length;
    }

    /// Size component along the capsule axis.
    pub fn capsule_length(&self) -> f32 {
        self.size[self.capsule_axis.index()]
    }

    fn capsule_thickness(&self) -> f32 {
        let mut size = self.size.to_array();
        size[self.capsule_axis.index()] = f32::MIN;
        size[0].max(size[1]).max(size[2])
    }

    /// Collider description for this shape, or `None` for [`ShapeKind::None`].
    pub fn collider_desc(&self) -> Option<ColliderDesc> {
        let shape = match self.kind {
            ShapeKind::None => return None,
            ShapeKind::Box => ColliderShape::Cuboid(Cuboid::from_size(self.size)),
            ShapeKind::Sphere => ColliderShape::Sphere(Sphere::new(self.size.max_element() * 0.5)),
            ShapeKind::Capsule => {
                let radius = self.capsule_thickness() * 0.5;
                let height = self.capsule_length();
                ColliderShape::Capsule {
                    capsule: Capsule3d::new(radius, (height - 2. * radius).max(0.)),
                    axis: self.capsule_axis,
                }
            }
        };

        Some(ColliderDesc {
            center: self.center,
            shape,
        })
    }
}
