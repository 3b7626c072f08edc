mod registry;
mod shape;

pub use registry::*;
pub use shape::*;

use bevy_math::{Quat, Vec3};
use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::core::{
    physics::{JointLimits, PhysicsHandle, RigidBodyDesc},
    skeleton::{NodeId, SkeletonHierarchy},
};

/// Index of a part inside its [`PartRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(usize);

impl PartId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterOfMassOverride {
    pub enabled: bool,
    /// Local-space position.
    pub position: Vec3,
}

/// The opposite part's local axes, as seen from this part's local space.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirroredBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Default for MirroredBasis {
    fn default() -> Self {
        Self {
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
        }
    }
}

impl MirroredBasis {
    pub fn transform(&self, p: Vec3) -> Vec3 {
        p.x * self.right + p.y * self.up + p.z * self.forward
    }
}

/// Physics primitives currently materialized for a part.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartPhysics {
    pub rigid_body: Option<PhysicsHandle>,
    pub collider: Option<PhysicsHandle>,
    pub joint: Option<PhysicsHandle>,
}

impl PartPhysics {
    pub fn is_empty(&self) -> bool {
        self.rigid_body.is_none() && self.collider.is_none() && self.joint.is_none()
    }
}

/// Ragdoll metadata attached to one skeleton node.
#[derive(Debug, Clone)]
pub struct Part {
    node: NodeId,
    label: String,
    pub mass: f32,
    pub center_of_mass: CenterOfMassOverride,
    pub shape: PartShape,
    pub is_rigid_body: bool,
    pub is_collider: bool,
    pub joint_axis: Vec3,
    pub joint_secondary_axis: Vec3,
    pub joint_limits: JointLimits,
    pub parent_part: Option<PartId>,
    pub(crate) opposite_part: Option<PartId>,
    pub(crate) opposite_basis: MirroredBasis,
    initial_rotation: Quat,
    position_snapshot: Vec3,
    pub(crate) physics: PartPhysics,
}

impl Part {
    /// Wraps `node`, capturing its current local rotation and position as the part's snapshots.
    pub fn new<S: SkeletonHierarchy + ?Sized>(scene: &S, node: NodeId) -> Self {
        let local = scene.local_transform(node).unwrap_or_default();
        Self {
            node,
            label: scene.name(node).unwrap_or_default().to_string(),
            mass: 1.,
            center_of_mass: CenterOfMassOverride::default(),
            shape: PartShape::default(),
            is_rigid_body: true,
            is_collider: true,
            joint_axis: Vec3::X,
            joint_secondary_axis: Vec3::Y,
            joint_limits: JointLimits::default(),
            parent_part: None,
            opposite_part: None,
            opposite_basis: MirroredBasis::default(),
            initial_rotation: local.rotation,
            position_snapshot: local.translation,
            physics: PartPhysics::default(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn opposite_part(&self) -> Option<PartId> {
        self.opposite_part
    }

    pub fn opposite_basis(&self) -> &MirroredBasis {
        &self.opposite_basis
    }

    pub fn initial_rotation(&self) -> Quat {
        self.initial_rotation
    }

    pub fn position_snapshot(&self) -> Vec3 {
        self.position_snapshot
    }

    pub fn physics(&self) -> &PartPhysics {
        &self.physics
    }

    pub fn store_initial_rotation<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) {
        if let Some(local) = scene.local_transform(self.node) {
            self.initial_rotation = local.rotation;
        }
    }

    pub fn reset_to_initial_rotation<S: SkeletonHierarchy + ?Sized>(&self, scene: &mut S) {
        if let Some(mut local) = scene.local_transform(self.node) {
            local.rotation = self.initial_rotation;
            scene.set_local_transform(self.node, local);
        }
    }

    pub fn store_position_snapshot<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) {
        if let Some(local) = scene.local_transform(self.node) {
            self.position_snapshot = local.translation;
        }
    }

    pub fn reset_to_position_snapshot<S: SkeletonHierarchy + ?Sized>(&self, scene: &mut S) {
        if let Some(mut local) = scene.local_transform(self.node) {
            local.translation = self.position_snapshot;
            scene.set_local_transform(self.node, local);
        }
    }

    /// Captures both the local rotation and the local position.
    pub fn snapshot_pose<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) {
        self.store_initial_rotation(scene);
        self.store_position_snapshot(scene);
    }

    pub fn restore_pose<S: SkeletonHierarchy + ?Sized>(&self, scene: &mut S) {
        self.reset_to_initial_rotation(scene);
        self.reset_to_position_snapshot(scene);
    }

    pub fn world_position<S: SkeletonHierarchy + ?Sized>(&self, scene: &S) -> Vec3 {
        scene.global_transform(self.node).translation()
    }

    /// World point into this part's local space.
    pub fn inverse_transform_point<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        point: Vec3,
    ) -> Vec3 {
        scene
            .global_transform(self.node)
            .affine()
            .inverse()
            .transform_point3(point)
    }

    /// World direction into this part's local space. Scale is ignored.
    pub fn inverse_transform_direction<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        direction: Vec3,
    ) -> Vec3 {
        scene.global_transform(self.node).rotation().inverse() * direction
    }

    /// Maps `p`, expressed in this part's local space, into the opposite part's local space.
    ///
    /// `scale_ratio` is this node's world scale divided by the opposite node's, per axis.
    pub fn transform_point_to_opposite(&self, p: Vec3, scale_ratio: Option<Vec3>) -> Vec3 {
        let p = match scale_ratio {
            Some(ratio) => p * ratio,
            None => p,
        };
        self.opposite_basis.transform(p)
    }

    pub fn rigid_body_desc(&self) -> RigidBodyDesc {
        RigidBodyDesc {
            mass: if self.mass > 0. { self.mass } else { 1. },
            center_of_mass: self
                .center_of_mass
                .enabled
                .then_some(self.center_of_mass.position),
        }
    }
}
