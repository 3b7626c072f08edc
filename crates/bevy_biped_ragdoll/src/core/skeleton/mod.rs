mod skeleton;

pub use skeleton::*;

use bevy_math::Vec3;
use bevy_transform::components::{GlobalTransform, Transform};

/// Opaque handle of a node in the host's transform hierarchy.
///
/// When the host is a Bevy world, this is the bit representation of the node's `Entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

#[cfg(feature = "physics_avian")]
impl From<bevy_ecs::entity::Entity> for NodeId {
    fn from(value: bevy_ecs::entity::Entity) -> Self {
        Self(value.to_bits())
    }
}

/// Read and write access to a named transform hierarchy.
///
/// Only [`name`](Self::name), [`parent`](Self::parent), [`children`](Self::children) and the
/// local transform accessors are mandatory; everything else is derived from them.
pub trait SkeletonHierarchy {
    fn name(&self, node: NodeId) -> Option<&str>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn local_transform(&self, node: NodeId) -> Option<Transform>;
    fn set_local_transform(&mut self, node: NodeId, transform: Transform);

    /// Highest vertex of any skinned mesh bound to the hierarchy, in world units.
    fn skinned_mesh_max_height(&self) -> Option<f32> {
        None
    }

    fn contains(&self, node: NodeId) -> bool {
        self.local_transform(node).is_some()
    }

    fn global_transform(&self, node: NodeId) -> GlobalTransform {
        let local = self.local_transform(node).unwrap_or_default();
        match self.parent(node) {
            Some(parent) => self.global_transform(parent).mul_transform(local),
            None => GlobalTransform::from(local),
        }
    }

    /// `node` followed by all its descendants, depth first.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Moves `node` so that its world position becomes `translation`, leaving its rotation and
    /// scale untouched.
    fn set_global_translation(&mut self, node: NodeId, translation: Vec3) {
        let Some(mut local) = self.local_transform(node) else {
            return;
        };
        let parent_global = self
            .parent(node)
            .map(|parent| self.global_transform(parent))
            .unwrap_or(GlobalTransform::IDENTITY);
        local.translation = parent_global
            .affine()
            .inverse()
            .transform_point3(translation);
        self.set_local_transform(node, local);
    }
}
