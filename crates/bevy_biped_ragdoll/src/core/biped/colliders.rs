use bevy_log::debug;
use bevy_math::Vec3;
use bevy_transform::components::Transform;

use super::Biped;
use crate::{
    core::{
        errors::BipedResult,
        part::{CapsuleAxis, PartId, PartShape, ShapeKind},
        roles::Side,
        skeleton::{NodeId, SkeletonHierarchy},
    },
    utils::geometry::{nearest_cardinal_axis, smooth_contour},
};

/// Collider thickness of each body segment, relative to the character's height.
pub mod collider_proportion {
    pub const HEAD: f32 = 0.13;
    /// Split evenly between neck segments.
    pub const NECK: f32 = 0.075;
    /// Widest spine segment, tapering toward the pelvis.
    pub const SPINE: f32 = 0.2;
    pub const PELVIS: f32 = 0.18;
    pub const HIP: f32 = 0.085;
    pub const LOWER_LEG: f32 = 0.0675;
    pub const FOOT: f32 = 0.05;
    pub const TOE: f32 = 0.05;
    pub const COLLAR: f32 = 0.08;
    pub const UPPER_ARM: f32 = 0.0675;
    pub const FOREARM: f32 = 0.0575;
    pub const HAND: f32 = 0.0675;
}

/// Pelvis height to body height, for skeletons without a skinned mesh.
const PELVIS_HEIGHT_RATIO: f32 = 1.85;
/// Capsules reach a bit past the next joint so limbs overlap at the joints.
const LIMB_OVERSHOOT: f32 = 1.15;

/// Read-only view of a scene in which the biped's root has unit scale.
struct UnitScaleRoot<'a, S: ?Sized> {
    scene: &'a S,
    root: NodeId,
}

impl<S: SkeletonHierarchy + ?Sized> SkeletonHierarchy for UnitScaleRoot<'_, S> {
    fn name(&self, node: NodeId) -> Option<&str> {
        self.scene.name(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.scene.parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.scene.children(node)
    }

    fn local_transform(&self, node: NodeId) -> Option<Transform> {
        let local = self.scene.local_transform(node)?;
        Some(if node == self.root {
            local.with_scale(Vec3::ONE)
        } else {
            local
        })
    }

    fn set_local_transform(&mut self, _node: NodeId, _transform: Transform) {}

    fn skinned_mesh_max_height(&self) -> Option<f32> {
        self.scene.skinned_mesh_max_height()
    }
}

impl Biped {
    /// Picks and sizes a collider for every part.
    ///
    /// Sizes are measured as if the root had unit scale, so scaling the whole character
    /// doesn't change its colliders in part space.
    pub fn set_default_colliders<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
    ) -> BipedResult<()> {
        self.set_default_collider_shapes()?;
        self.set_default_collider_sizes(scene)
    }

    /// Picks a shape kind for every part and turns collisions on.
    ///
    /// The axial parts get spheres, hands and feet boxes, tips no shape at all. Everything
    /// else is a capsule.
    pub fn set_default_collider_shapes(&mut self) -> BipedResult<()> {
        let required = self.required()?;
        for id in self.all_parts() {
            let part = self.parts.part_mut(id)?;
            part.shape.kind = ShapeKind::Capsule;
            part.is_collider = true;
        }

        let slots = self.slots.clone();
        let mut spheres = vec![required.head, required.pelvis];
        spheres.extend(slots.neck.iter().copied());
        spheres.extend(slots.spine.iter().copied());
        self.set_shape_kinds(spheres, ShapeKind::Sphere)?;

        let mut boxes = Vec::new();
        let mut empty: Vec<PartId> = slots.head_tip.into_iter().collect();
        for side in Side::BOTH {
            let limbs = required.side(side);
            let s = slots.side(side);
            boxes.extend([limbs.hand, limbs.foot]);
            boxes.extend(s.toe);
            empty.extend(s.hand_tip);
            empty.extend(s.toe_tip);

            if let Some(collar) = s.collar {
                if !self.parts.part(collar)?.is_rigid_body {
                    empty.push(collar);
                }
            }
        }
        self.set_shape_kinds(boxes, ShapeKind::Box)?;
        self.set_shape_kinds(empty, ShapeKind::None)
    }

    fn set_shape_kinds(
        &mut self,
        ids: impl IntoIterator<Item = PartId>,
        kind: ShapeKind,
    ) -> BipedResult<()> {
        for id in ids {
            self.parts.part_mut(id)?.shape.kind = kind;
        }
        Ok(())
    }

    /// Character height: the top of the skinned mesh if known, otherwise guessed from the
    /// pelvis height above the root.
    pub fn estimate_height<S: SkeletonHierarchy + ?Sized>(&self, scene: &S) -> BipedResult<f32> {
        if let Some(height) = scene.skinned_mesh_max_height().filter(|height| *height > 0.) {
            return Ok(height);
        }
        let required = self.required()?;
        let pelvis = self.position(scene, required.pelvis)?;
        let to_root = scene.global_transform(self.root).affine().inverse();
        Ok(PELVIS_HEIGHT_RATIO * to_root.transform_point3(pelvis).length())
    }

    /// Sizes and places every collider from the skeleton's proportions, ignoring the root's
    /// scale.
    pub fn set_default_collider_sizes<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
    ) -> BipedResult<()> {
        let unscaled = UnitScaleRoot {
            scene,
            root: self.root,
        };
        self.size_colliders(&unscaled)
    }

    fn size_colliders<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) -> BipedResult<()> {
        use collider_proportion as proportion;

        let required = self.required()?;
        self.set_parent_parts()?;
        let all_parts = self.all_parts();
        for &id in &all_parts {
            self.shape_mut(id)?.center = Vec3::ZERO;
        }

        // Capsules run toward the child joint
        for &id in &all_parts {
            let part = self.parts.part(id)?;
            let Some(parent) = part.parent_part else {
                continue;
            };
            let position = part.world_position(scene);
            let parent = self.parts.part_mut(parent)?;
            let local = parent.inverse_transform_point(scene, position);
            parent.shape.capsule_axis = CapsuleAxis::from_cardinal(nearest_cardinal_axis(local));
        }

        let height = self.estimate_height(scene)?;
        let slots = self.slots.clone();

        // Head, centered toward the top of the character
        let to_root = scene.global_transform(self.root).affine();
        let head_in_root = to_root.inverse().transform_point3(self.position(scene, required.head)?);
        let top = to_root.transform_point3(Vec3::new(head_in_root.x, height, head_in_root.z));
        let head = self.parts.part_mut(required.head)?;
        head.shape.size = Vec3::splat(proportion::HEAD * height);
        let center = 0.3 * head.inverse_transform_point(scene, top);
        head.shape.center = nearest_cardinal_axis(center) * center.length();

        let neck_size = proportion::NECK * height / slots.neck.len().max(1) as f32;
        for &neck in &slots.neck {
            self.shape_mut(neck)?.size = Vec3::splat(neck_size);
            self.parts.set_parent_shape_center(scene, neck)?;
            self.parts.part_mut(neck)?.is_collider = false;
        }

        let spine_length = self.spine_length(scene)?;
        let params = self.compute_chain_parameter_values(scene, &slots.spine, spine_length, 0.7)?;
        for (i, (&spine, &param)) in slots.spine.iter().zip(&params).enumerate() {
            self.shape_mut(spine)?.size =
                Vec3::splat(proportion::SPINE * height * smooth_contour(param, 0.7, 1.));
            self.parts.set_parent_shape_center(scene, spine)?;
            if i > 0 {
                self.shape_mut(slots.spine[i - 1])?.center *= 0.75;
            }
            self.shape_mut(spine)?.center *= 0.75;
        }

        let pelvis = self.shape_mut(required.pelvis)?;
        pelvis.size = Vec3::splat(proportion::PELVIS * height);
        pelvis.center = Vec3::ZERO;

        for side in Side::BOTH {
            let limbs = *required.side(side);
            let s = slots.side(side);

            self.size_limb(scene, limbs.hip, limbs.lower_leg, proportion::HIP * height)?;
            self.size_limb(scene, limbs.lower_leg, limbs.foot, proportion::LOWER_LEG * height)?;

            let foot = self.shape_mut(limbs.foot)?;
            foot.size = Vec3::splat(proportion::FOOT * height);
            foot.set_capsule_length(1.2 * foot.size.length());

            if let Some(toe) = s.toe {
                self.parts.set_parent_shape_center(scene, toe)?;
                self.shape_mut(toe)?.size = Vec3::splat(proportion::TOE * height);
                self.parts.part_mut(toe)?.is_collider = false;
                if let Some(toe_tip) = s.toe_tip {
                    self.parts.set_parent_shape_center(scene, toe_tip)?;
                }
            }
        }

        let character_forward = scene.global_transform(self.root).rotation() * Vec3::Z;
        for side in Side::BOTH {
            let limbs = *required.side(side);
            let s = slots.side(side);

            if let Some(collar) = s.collar {
                let shape = self.shape_mut(collar)?;
                shape.size = Vec3::splat(proportion::COLLAR * height);
                shape.set_capsule_length(0.8 * shape.size.length());
                if self.parts.part(limbs.upper_arm)?.parent_part == Some(collar) {
                    self.parts.set_parent_shape_center(scene, limbs.upper_arm)?;
                }
            }

            self.size_limb(scene, limbs.upper_arm, limbs.forearm, proportion::UPPER_ARM * height)?;
            self.size_limb(scene, limbs.forearm, limbs.hand, proportion::FOREARM * height)?;

            let along = self.position(scene, limbs.hand)? - self.position(scene, limbs.forearm)?;
            let hand = self.parts.part_mut(limbs.hand)?;
            hand.shape.size = Vec3::splat(proportion::HAND * height);
            let along = nearest_cardinal_axis(hand.inverse_transform_direction(scene, along));
            hand.shape.center = along * hand.shape.size.x * 0.5;
            // Flatten the box across the palm
            let facing = nearest_cardinal_axis(hand.inverse_transform_direction(scene, character_forward));
            let thinning = 0.5 * hand.shape.size.x * facing.cross(along).abs();
            hand.shape.size -= thinning;
        }

        self.resolve_collider_overlaps(scene, height)?;
        debug!("Sized colliders for a character {} units tall", height);
        Ok(())
    }

    /// Sizes `id`'s capsule to reach past `next`, and centers it halfway there.
    fn size_limb<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        id: PartId,
        next: PartId,
        thickness: f32,
    ) -> BipedResult<()> {
        let length = LIMB_OVERSHOOT * self.distance(scene, id, next)?;
        let shape = self.shape_mut(id)?;
        shape.size = Vec3::splat(thickness);
        shape.set_capsule_length(length);
        self.parts.set_parent_shape_center(scene, next)
    }

    /// Shrinks or disables chest and belly spheres buried in the head and pelvis spheres.
    fn resolve_collider_overlaps<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        height: f32,
    ) -> BipedResult<()> {
        let required = self.required()?;

        if !self.slots.neck.is_empty() {
            let overlap = self.sphere_overlap(scene, required.head, required.last_spine)?;
            if overlap > 0. {
                let chest = self.parts.part_mut(required.last_spine)?;
                if overlap < 0.01 * height {
                    let shrink = 1. - 4. * overlap / chest.shape.size.x;
                    chest.shape.size *= shrink;
                } else {
                    chest.is_collider = false;
                }
            }
        }

        let overlap = self.sphere_overlap(scene, required.first_spine, required.pelvis)?;
        let belly = self.parts.part_mut(required.first_spine)?;
        if overlap / belly.shape.size.x > 0.8 {
            belly.is_collider = false;
        }
        Ok(())
    }

    /// How far two parts' spheres interpenetrate. Negative when they are apart.
    fn sphere_overlap<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        a: PartId,
        b: PartId,
    ) -> BipedResult<f32> {
        let center = |id: PartId| -> BipedResult<(Vec3, f32)> {
            let part = self.parts.part(id)?;
            let center = scene
                .global_transform(part.node())
                .transform_point(part.shape.center);
            Ok((center, part.shape.size.x))
        };
        let (center_a, size_a) = center(a)?;
        let (center_b, size_b) = center(b)?;
        Ok((size_a + size_b) * 0.5 - center_a.distance(center_b))
    }

    fn shape_mut(&mut self, id: PartId) -> BipedResult<&mut PartShape> {
        Ok(&mut self.parts.part_mut(id)?.shape)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{
        biped::BipedConfig,
        part::Part,
        roles::Role,
        skeleton::Skeleton,
        testing::human_ik_rig,
    };

    fn configured(rig: &Skeleton) -> Biped {
        let mut biped = Biped::new(rig.roots()[0], BipedConfig::default());
        biped.find_bones_using_naming_convention(rig);
        biped.set_default_colliders(rig).unwrap();
        biped
    }

    fn part(biped: &Biped, role: Role) -> &Part {
        biped.part(biped.part_for_role(role).unwrap()).unwrap()
    }

    #[test]
    fn test_height_from_pelvis() {
        let mut rig = human_ik_rig();
        let mut biped = Biped::new(rig.roots()[0], BipedConfig::default());
        biped.find_bones_using_naming_convention(&rig);
        assert!((biped.estimate_height(&rig).unwrap() - 1.85).abs() < 1e-5);

        rig.set_skinned_mesh_max_height(Some(1.7));
        assert_eq!(biped.estimate_height(&rig).unwrap(), 1.7);
    }

    #[test]
    fn test_root_scale_does_not_change_sizes() {
        let rig = human_ik_rig();
        let unscaled = configured(&rig);

        let mut scaled_rig = human_ik_rig();
        let root = scaled_rig.roots()[0];
        scaled_rig.set_local_transform(root, Transform::from_scale(Vec3::splat(2.)));
        let scaled = configured(&scaled_rig);

        for id in unscaled.all_parts() {
            let expected = unscaled.part(id).unwrap();
            let actual = scaled.part(id).unwrap();
            assert_eq!(actual.shape.kind, expected.shape.kind, "{}", expected.label());
            assert_eq!(actual.shape.capsule_axis, expected.shape.capsule_axis);
            assert!(
                actual.shape.size.abs_diff_eq(expected.shape.size, 1e-5),
                "{}: {} != {}",
                expected.label(),
                actual.shape.size,
                expected.shape.size
            );
            assert!(actual.shape.center.abs_diff_eq(expected.shape.center, 1e-5));
            assert_eq!(actual.is_collider, expected.is_collider, "{}", expected.label());
        }
        // The root's scale is left alone
        assert_eq!(
            scaled_rig.local_transform(root).unwrap().scale,
            Vec3::splat(2.)
        );
    }

    #[test]
    fn test_shape_kinds() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        assert_eq!(part(&biped, Role::Head).shape.kind, ShapeKind::Sphere);
        assert_eq!(part(&biped, Role::Spine).shape.kind, ShapeKind::Sphere);
        assert_eq!(part(&biped, Role::Collar(Side::Left)).shape.kind, ShapeKind::Capsule);
        assert_eq!(part(&biped, Role::Forearm(Side::Right)).shape.kind, ShapeKind::Capsule);
        assert_eq!(part(&biped, Role::Hand(Side::Left)).shape.kind, ShapeKind::Box);
        assert_eq!(part(&biped, Role::Toe(Side::Right)).shape.kind, ShapeKind::Box);
        assert_eq!(part(&biped, Role::HeadTip).shape.kind, ShapeKind::None);
        assert_eq!(part(&biped, Role::ToeTip(Side::Left)).shape.kind, ShapeKind::None);
        assert!(part(&biped, Role::HeadTip).shape.collider_desc().is_none());
    }

    #[test]
    fn test_non_rigid_collar_has_no_shape() {
        let rig = human_ik_rig();
        let mut biped = Biped::new(rig.roots()[0], BipedConfig::default());
        biped.find_bones_using_naming_convention(&rig);
        let collar = biped.part_for_role(Role::Collar(Side::Right)).unwrap();
        biped.part_mut(collar).unwrap().is_rigid_body = false;
        biped.set_default_collider_shapes().unwrap();

        assert_eq!(biped.part(collar).unwrap().shape.kind, ShapeKind::None);
    }

    #[test]
    fn test_sizes_follow_height() {
        let rig = human_ik_rig();
        let biped = configured(&rig);
        let height = 1.85;

        let head = part(&biped, Role::Head);
        assert!(head.shape.size.abs_diff_eq(Vec3::splat(0.13 * height), 1e-5));
        // A third of the way from the head joint to the top of the character
        assert!(head.shape.center.abs_diff_eq(Vec3::new(0., 0.3 * 0.27, 0.), 1e-5));

        let pelvis = part(&biped, Role::Pelvis);
        assert!(pelvis.shape.size.abs_diff_eq(Vec3::splat(0.18 * height), 1e-5));
        assert_eq!(pelvis.shape.center, Vec3::ZERO);
    }

    #[test]
    fn test_limb_capsules_run_toward_child() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        let upper_arm = part(&biped, Role::UpperArm(Side::Left));
        assert_eq!(upper_arm.shape.capsule_axis, CapsuleAxis::X);
        assert!((upper_arm.shape.capsule_length() - 1.15 * 0.28).abs() < 1e-5);
        assert!((upper_arm.shape.size.y - 0.0675 * 1.85).abs() < 1e-5);
        assert!(upper_arm.shape.center.abs_diff_eq(Vec3::new(-0.14, 0., 0.), 1e-5));

        let lower_leg = part(&biped, Role::LowerLeg(Side::Right));
        assert_eq!(lower_leg.shape.capsule_axis, CapsuleAxis::Y);
        assert!((lower_leg.shape.capsule_length() - 1.15 * 0.42).abs() < 1e-5);
        assert!(lower_leg.shape.center.abs_diff_eq(Vec3::new(0., -0.21, 0.), 1e-5));
    }

    #[test]
    fn test_hand_box_is_flattened() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        let hand = part(&biped, Role::Hand(Side::Right));
        let size = 0.0675 * 1.85;
        assert!(hand.shape.center.abs_diff_eq(Vec3::new(0.5 * size, 0., 0.), 1e-5));
        // Forward cross along-the-arm is vertical, so the box is thin along Y
        assert!(hand.shape.size.abs_diff_eq(Vec3::new(size, 0.5 * size, size), 1e-5));
    }

    #[test]
    fn test_non_colliding_parts() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        assert!(!part(&biped, Role::Neck).is_collider);
        assert!(!part(&biped, Role::Toe(Side::Left)).is_collider);
        // The head sphere swallows the chest sphere
        let chest = *biped.slots().spine.last().unwrap();
        assert!(!biped.part(chest).unwrap().is_collider);
        assert!(part(&biped, Role::Spine).is_collider);
    }

    #[test]
    fn test_colliders_are_idempotent() {
        let rig = human_ik_rig();
        let mut biped = configured(&rig);
        let shapes: Vec<PartShape> = biped
            .all_parts()
            .into_iter()
            .map(|id| biped.part(id).unwrap().shape)
            .collect();

        biped.set_default_colliders(&rig).unwrap();
        for (id, shape) in biped.all_parts().into_iter().zip(shapes) {
            assert_eq!(biped.part(id).unwrap().shape, shape);
        }
    }
}
