mod definition;

#[cfg(feature = "physics_avian")]
mod avian;

#[cfg(feature = "physics_avian")]
pub use avian::*;
pub use definition::*;

use crate::core::skeleton::NodeId;

/// Opaque id of a rigid body, collider or joint created by a [`PhysicsBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicsHandle(u64);

impl PhysicsHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Factory for the physics primitives a ragdoll is made of.
///
/// Calls are synchronous: a handle returned by a `create_*` method is usable immediately, and a
/// destroyed handle is never passed back.
pub trait PhysicsBackend {
    fn create_rigid_body(&mut self, node: NodeId, desc: &RigidBodyDesc) -> PhysicsHandle;
    fn destroy_rigid_body(&mut self, body: PhysicsHandle);
    fn set_kinematic(&mut self, body: PhysicsHandle, kinematic: bool);

    fn create_collider(&mut self, node: NodeId, desc: &ColliderDesc) -> PhysicsHandle;
    fn destroy_collider(&mut self, collider: PhysicsHandle);

    /// Creates a joint between `body`, owned by `node`, and `desc.connected_body`.
    fn create_joint(&mut self, node: NodeId, body: PhysicsHandle, desc: &JointDesc)
    -> PhysicsHandle;
    fn destroy_joint(&mut self, joint: PhysicsHandle);
}
