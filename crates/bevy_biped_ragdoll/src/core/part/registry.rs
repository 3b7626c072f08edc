use bevy_log::{debug, warn};
use bevy_math::{Quat, Vec3};
use indexmap::IndexMap;

use super::{MirroredBasis, Part, PartId, ShapeKind};
use crate::{
    core::{
        errors::{BipedError, BipedResult},
        physics::{JointDesc, JointDrive, PhysicsBackend, PhysicsHandle, orthonormalize},
        skeleton::{NodeId, SkeletonHierarchy},
    },
    utils::geometry::{mirror_across_plane, nearest_cardinal_axis},
};

/// Owns every [`Part`] of a biped, one per skeleton node.
///
/// Parts refer to each other through [`PartId`]s, which stay valid for the lifetime of the
/// registry.
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    parts: IndexMap<NodeId, Part>,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the part wrapping `node`, creating it on first use.
    pub fn attach<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S, node: NodeId) -> PartId {
        if let Some(index) = self.parts.get_index_of(&node) {
            return PartId(index);
        }
        let (index, _) = self.parts.insert_full(node, Part::new(scene, node));
        PartId(index)
    }

    pub fn id_of(&self, node: NodeId) -> Option<PartId> {
        self.parts.get_index_of(&node).map(PartId)
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get_index(id.0).map(|(_, part)| part)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_index_mut(id.0).map(|(_, part)| part)
    }

    pub(crate) fn part(&self, id: PartId) -> BipedResult<&Part> {
        self.get(id).ok_or(BipedError::UnknownPart(id))
    }

    pub(crate) fn part_mut(&mut self, id: PartId) -> BipedResult<&mut Part> {
        self.get_mut(id).ok_or(BipedError::UnknownPart(id))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PartId> + use<> {
        (0..self.parts.len()).map(PartId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.parts
            .values()
            .enumerate()
            .map(|(index, part)| (PartId(index), part))
    }

    /// Records `a` and `b` as mirror images of each other.
    ///
    /// Each side stores the other side's local axes reflected across the plane halfway between
    /// the two nodes and expressed in its own local space, optionally snapped to the nearest
    /// cardinal axis. Coincident nodes keep the default axes.
    pub fn match_to<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        a: PartId,
        b: PartId,
        cardinal_alignment: bool,
    ) -> BipedResult<()> {
        let node_a = self.part(a)?.node;
        let node_b = self.part(b)?.node;
        let global_a = scene.global_transform(node_a);
        let global_b = scene.global_transform(node_b);

        self.part_mut(a)?.opposite_part = Some(b);
        self.part_mut(b)?.opposite_part = Some(a);

        let delta = global_a.translation() - global_b.translation();
        if delta.length_squared() == 0. {
            warn!(
                "Could not compute corresponding axes for parts {} and {} because they are coincident",
                self.part(a)?.label,
                self.part(b)?.label
            );
            self.part_mut(a)?.opposite_basis = MirroredBasis::default();
            self.part_mut(b)?.opposite_basis = MirroredBasis::default();
            return Ok(());
        }
        let normal = delta.normalize();

        let rotation_a = global_a.rotation();
        let rotation_b = global_b.rotation();
        let mirrored = |from: Quat, into: Quat, axis: Vec3| {
            let local = (into.inverse() * mirror_across_plane(from * axis, normal)).normalize();
            if cardinal_alignment {
                nearest_cardinal_axis(local)
            } else {
                local
            }
        };

        self.part_mut(b)?.opposite_basis = MirroredBasis {
            right: mirrored(rotation_a, rotation_b, Vec3::X),
            up: mirrored(rotation_a, rotation_b, Vec3::Y),
            forward: mirrored(rotation_a, rotation_b, Vec3::Z),
        };
        self.part_mut(a)?.opposite_basis = MirroredBasis {
            right: mirrored(rotation_b, rotation_a, Vec3::X),
            up: mirrored(rotation_b, rotation_a, Vec3::Y),
            forward: mirrored(rotation_b, rotation_a, Vec3::Z),
        };

        Ok(())
    }

    fn opposite_of(&self, id: PartId) -> BipedResult<PartId> {
        let part = self.part(id)?;
        part.opposite_part
            .ok_or_else(|| BipedError::MissingOppositePart(part.label.clone()))
    }

    fn scale_ratio<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        id: PartId,
        opposite: PartId,
    ) -> BipedResult<Vec3> {
        let own = scene.global_transform(self.part(id)?.node).scale();
        let other = scene.global_transform(self.part(opposite)?.node).scale();
        Ok(Vec3::select(other.cmpeq(Vec3::ZERO), Vec3::ZERO, own / other))
    }

    /// Maps a point in `id`'s local space into its opposite part's local space.
    pub fn transform_point_to_opposite<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        id: PartId,
        point: Vec3,
        apply_scale: bool,
    ) -> BipedResult<Vec3> {
        let opposite = self.opposite_of(id)?;
        let ratio = if apply_scale {
            Some(self.scale_ratio(scene, id, opposite)?)
        } else {
            None
        };
        Ok(self.part(id)?.transform_point_to_opposite(point, ratio))
    }

    /// Copies `id`'s shape size onto its opposite part, mirrored into the opposite's space.
    pub fn paste_shape_size_to_opposite<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        id: PartId,
        apply_scale: bool,
    ) -> BipedResult<()> {
        let opposite = self.opposite_of(id)?;
        let source = self.part(id)?.shape;
        let size = self.transform_point_to_opposite(scene, id, source.size, apply_scale)?;
        if size.length_squared() == 0. {
            debug!("Skipping shape paste from {}: degenerate scale", self.part(id)?.label);
            return Ok(());
        }

        let target = &mut self.part_mut(opposite)?.shape;
        target.size = size.abs();
        match target.kind {
            ShapeKind::Sphere => target.size = Vec3::splat(target.size.max_element()),
            ShapeKind::Capsule => {
                let current = target.capsule_axis;
                target.capsule_axis = source.capsule_axis;
                target.flip_capsule(current);
            }
            _ => {}
        }
        Ok(())
    }

    /// Centers the parent's shape halfway toward `id`.
    pub fn set_parent_shape_center<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        id: PartId,
    ) -> BipedResult<()> {
        let part = self.part(id)?;
        let Some(parent) = part.parent_part else {
            return Ok(());
        };
        let position = part.world_position(scene);
        let parent = self.part_mut(parent)?;
        parent.shape.center = 0.5 * parent.inverse_transform_point(scene, position);
        Ok(())
    }

    /// Materializes `id`'s rigid body, reusing the existing one if any.
    pub fn add_rigid_body<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
        id: PartId,
    ) -> BipedResult<PhysicsHandle> {
        let part = self.part_mut(id)?;
        if let Some(body) = part.physics.rigid_body {
            return Ok(body);
        }
        let body = physics.create_rigid_body(part.node, &part.rigid_body_desc());
        part.physics.rigid_body = Some(body);
        Ok(body)
    }

    /// Materializes `id`'s collider, replacing any previous one. Parts without a shape get none.
    pub fn add_collision_shape<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
        id: PartId,
    ) -> BipedResult<Option<PhysicsHandle>> {
        let part = self.part_mut(id)?;
        if let Some(collider) = part.physics.collider.take() {
            physics.destroy_collider(collider);
        }
        let Some(desc) = part.shape.collider_desc() else {
            return Ok(None);
        };
        let collider = physics.create_collider(part.node, &desc);
        part.physics.collider = Some(collider);
        Ok(Some(collider))
    }

    /// Joins `id` to `target` with a limited, spring-driven joint.
    ///
    /// The joint frame is built with the node in its initial rotation, and the spring targets
    /// the rotation the node has when this is called. `target`'s rigid body is created if it
    /// doesn't exist yet.
    pub fn connect_to<S, P>(
        &mut self,
        scene: &mut S,
        physics: &mut P,
        id: PartId,
        target: PartId,
        resistance: f32,
        max_force: f32,
    ) -> BipedResult<PhysicsHandle>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        let node = self.part(id)?.node;
        let live_rotation = scene
            .local_transform(node)
            .ok_or(BipedError::UnknownNode(node))?
            .rotation;
        let initial_rotation = self.part(id)?.initial_rotation;
        self.part(id)?.reset_to_initial_rotation(scene);

        let anchor = {
            let target = self.part(target)?;
            target.inverse_transform_point(scene, self.part(id)?.world_position(scene))
        };

        let body = self.add_rigid_body(physics, id)?;
        physics.set_kinematic(body, true);
        let connected_body = self.add_rigid_body(physics, target)?;

        let part = self.part_mut(id)?;
        if let Some(joint) = part.physics.joint.take() {
            physics.destroy_joint(joint);
        }
        let (axis, secondary_axis) = orthonormalize(part.joint_axis, part.joint_secondary_axis);
        let desc = JointDesc {
            connected_body,
            anchor,
            axis,
            secondary_axis,
            limits: part.joint_limits,
            drive: JointDrive {
                stiffness: resistance.max(0.),
                max_force: max_force.max(0.),
                target_rotation: live_rotation * initial_rotation.inverse(),
            },
        };
        let joint = physics.create_joint(node, body, &desc);
        part.physics.joint = Some(joint);

        if let Some(mut local) = scene.local_transform(node) {
            local.rotation = live_rotation;
            scene.set_local_transform(node, local);
        }
        physics.set_kinematic(body, false);

        Ok(joint)
    }

    pub fn connect_to_parent<S, P>(
        &mut self,
        scene: &mut S,
        physics: &mut P,
        id: PartId,
        resistance: f32,
        max_force: f32,
    ) -> BipedResult<PhysicsHandle>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        let part = self.part(id)?;
        let parent = part
            .parent_part
            .ok_or_else(|| BipedError::MissingParentPart(part.label.clone()))?;
        self.connect_to(scene, physics, id, parent, resistance, max_force)
    }

    /// Destroys every physics primitive materialized for `id`.
    pub fn release_physics<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
        id: PartId,
    ) -> BipedResult<()> {
        let handles = std::mem::take(&mut self.part_mut(id)?.physics);
        if let Some(joint) = handles.joint {
            physics.destroy_joint(joint);
        }
        if let Some(body) = handles.rigid_body {
            physics.destroy_rigid_body(body);
        }
        if let Some(collider) = handles.collider {
            physics.destroy_collider(collider);
        }
        Ok(())
    }
}
