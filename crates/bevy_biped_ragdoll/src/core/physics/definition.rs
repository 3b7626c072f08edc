use bevy_math::{
    Quat, Vec3,
    primitives::{Capsule3d, Cuboid, Sphere},
};
use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use super::PhysicsHandle;
use crate::core::part::CapsuleAxis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyDesc {
    /// Always positive.
    pub mass: f32,
    /// Local-space override of the computed centre of mass.
    pub center_of_mass: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Sphere(Sphere),
    /// Capsule whose long axis runs along `axis` of the owning node.
    Capsule {
        capsule: Capsule3d,
        axis: CapsuleAxis,
    },
    Cuboid(Cuboid),
}

impl ColliderShape {
    /// Rotation taking the primitive's own frame into the node frame. Bevy capsules run along
    /// `+Y`.
    pub fn local_rotation(&self) -> Quat {
        match self {
            ColliderShape::Capsule { axis, .. } => Quat::from_rotation_arc(Vec3::Y, axis.vector()),
            _ => Quat::IDENTITY,
        }
    }

    #[cfg(feature = "physics_avian")]
    pub fn avian_collider(&self) -> avian3d::prelude::Collider {
        use avian3d::prelude::Collider;
        match self {
            ColliderShape::Sphere(sphere) => Collider::sphere(sphere.radius),
            ColliderShape::Capsule { capsule, .. } => {
                Collider::capsule(capsule.radius, 2. * capsule.half_length)
            }
            ColliderShape::Cuboid(cuboid) => {
                let size = cuboid.size();
                Collider::cuboid(size.x, size.y, size.z)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColliderDesc {
    /// Offset of the shape in the owning node's local space.
    pub center: Vec3,
    pub shape: ColliderShape,
}

/// Angular limits of a joint, in degrees.
///
/// `x_min..x_max` bounds the twist around the primary axis. `y_max` and `z_max` bound the
/// symmetric swing around the secondary axis and the axis perpendicular to both.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointLimits {
    pub x_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub z_max: f32,
}

impl JointLimits {
    pub const fn new(x_min: f32, x_max: f32, y_max: f32, z_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_max,
            z_max,
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x_min: self.x_min * factor,
            x_max: self.x_max * factor,
            y_max: self.y_max * factor,
            z_max: self.z_max * factor,
        }
    }
}

/// Spring pulling the joint toward the pose it had when the ragdoll was created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDrive {
    pub stiffness: f32,
    /// Torque clamp of the spring. Zero disables the drive.
    pub max_force: f32,
    /// Rotation relative to the joint's rest frame.
    pub target_rotation: Quat,
}

/// Ball-and-socket joint with linear motion locked and angular motion limited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDesc {
    pub connected_body: PhysicsHandle,
    /// Position of the owning node in the connected body's local space, where the two bodies
    /// are pinned together.
    pub anchor: Vec3,
    /// Unit primary axis, in the owning node's local space.
    pub axis: Vec3,
    /// Unit secondary axis, orthogonal to `axis`.
    pub secondary_axis: Vec3,
    pub limits: JointLimits,
    pub drive: JointDrive,
}

impl JointDesc {
    pub fn twist_limit_radians(&self) -> (f32, f32) {
        (
            self.limits.x_min.to_radians(),
            self.limits.x_max.to_radians(),
        )
    }

    pub fn swing_limit_radians(&self) -> f32 {
        self.limits.y_max.max(self.limits.z_max).to_radians()
    }

    /// Angular damping standing in for the drive spring. A zero torque cap disables it.
    pub fn drive_damping(&self) -> f32 {
        if self.drive.max_force > 0. {
            self.drive.stiffness
        } else {
            0.
        }
    }

    /// Avian joint pinning `owner` to `connected` at [`JointDesc::anchor`].
    #[cfg(feature = "physics_avian")]
    pub fn avian_joint(
        &self,
        connected: bevy_ecs::entity::Entity,
        owner: bevy_ecs::entity::Entity,
    ) -> avian3d::prelude::SphericalJoint {
        use avian3d::prelude::{AngleLimit, SphericalJoint};

        let (twist_min, twist_max) = self.twist_limit_radians();
        let swing = self.swing_limit_radians();
        SphericalJoint {
            entity1: connected,
            entity2: owner,
            local_anchor1: self.anchor,
            local_anchor2: Vec3::ZERO,
            swing_axis: self.secondary_axis,
            twist_axis: self.axis,
            swing_limit: Some(AngleLimit {
                min: -swing,
                max: swing,
            }),
            twist_limit: Some(AngleLimit {
                min: twist_min,
                max: twist_max,
            }),
            damping_linear: 1.,
            damping_angular: self.drive_damping(),
            position_lagrange: 0.,
            swing_lagrange: 0.,
            twist_lagrange: 0.,
            compliance: 0.,
            force: Vec3::ZERO,
            swing_torque: Vec3::ZERO,
            twist_torque: Vec3::ZERO,
        }
    }
}

/// Makes `secondary` a unit vector orthogonal to the unit vector `axis`.
pub fn orthonormalize(axis: Vec3, secondary: Vec3) -> (Vec3, Vec3) {
    let axis = axis.try_normalize().unwrap_or(Vec3::X);
    let secondary = (secondary - axis * secondary.dot(axis))
        .try_normalize()
        .unwrap_or_else(|| axis.any_orthonormal_vector());
    (axis, secondary)
}
