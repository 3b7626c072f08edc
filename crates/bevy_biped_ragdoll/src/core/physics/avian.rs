use avian3d::prelude::{CenterOfMass, Mass, RigidBody};
use bevy_ecs::{entity::Entity, system::Commands};
use bevy_transform::components::Transform;

use super::{ColliderDesc, JointDesc, PhysicsBackend, PhysicsHandle, RigidBodyDesc};
use crate::core::skeleton::NodeId;

/// [`PhysicsBackend`] that inserts avian3d components through [`Commands`].
///
/// Node ids must be entity bits (see `NodeId: From<Entity>`). Rigid bodies live on the bone
/// entities themselves, colliders are spawned as children of their bone and joints are spawned
/// as standalone entities.
pub struct AvianPhysics<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
}

impl<'a, 'w, 's> AvianPhysics<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self { commands }
    }

    fn entity(node: NodeId) -> Entity {
        Entity::from_bits(node.raw())
    }

    fn handle(entity: Entity) -> PhysicsHandle {
        PhysicsHandle::from_raw(entity.to_bits())
    }

    fn handle_entity(handle: PhysicsHandle) -> Entity {
        Entity::from_bits(handle.raw())
    }
}

impl PhysicsBackend for AvianPhysics<'_, '_, '_> {
    fn create_rigid_body(&mut self, node: NodeId, desc: &RigidBodyDesc) -> PhysicsHandle {
        let entity = Self::entity(node);
        let mut entity_commands = self.commands.entity(entity);
        entity_commands.insert((RigidBody::Dynamic, Mass(desc.mass)));
        if let Some(center_of_mass) = desc.center_of_mass {
            entity_commands.insert(CenterOfMass(center_of_mass));
        }
        Self::handle(entity)
    }

    fn destroy_rigid_body(&mut self, body: PhysicsHandle) {
        self.commands
            .entity(Self::handle_entity(body))
            .remove::<(RigidBody, Mass, CenterOfMass)>();
    }

    fn set_kinematic(&mut self, body: PhysicsHandle, kinematic: bool) {
        let mode = if kinematic {
            RigidBody::Kinematic
        } else {
            RigidBody::Dynamic
        };
        self.commands.entity(Self::handle_entity(body)).insert(mode);
    }

    fn create_collider(&mut self, node: NodeId, desc: &ColliderDesc) -> PhysicsHandle {
        let collider = self
            .commands
            .spawn((
                Transform::from_translation(desc.center).with_rotation(desc.shape.local_rotation()),
                desc.shape.avian_collider(),
            ))
            .id();
        self.commands.entity(Self::entity(node)).add_child(collider);
        Self::handle(collider)
    }

    fn destroy_collider(&mut self, collider: PhysicsHandle) {
        self.commands.entity(Self::handle_entity(collider)).despawn();
    }

    fn create_joint(
        &mut self,
        _node: NodeId,
        body: PhysicsHandle,
        desc: &JointDesc,
    ) -> PhysicsHandle {
        let joint = desc.avian_joint(
            Self::handle_entity(desc.connected_body),
            Self::handle_entity(body),
        );
        Self::handle(self.commands.spawn(joint).id())
    }

    fn destroy_joint(&mut self, joint: PhysicsHandle) {
        self.commands.entity(Self::handle_entity(joint)).despawn();
    }
}
