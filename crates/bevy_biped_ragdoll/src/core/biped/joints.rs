use bevy_math::Vec3;

use super::Biped;
use crate::{
    core::{
        errors::BipedResult,
        part::PartId,
        physics::JointLimits,
        roles::Side,
        skeleton::SkeletonHierarchy,
    },
    utils::geometry::{AxisTripod, angle_degrees, nearest_cardinal_axis},
};

/// Default angular limits, in degrees.
pub mod joint_limits {
    use crate::core::physics::JointLimits;

    pub const HEAD: JointLimits = JointLimits::new(-5., 10., 15., 10.);
    /// For a neck segment spanning the whole neck. Scaled by each segment's share.
    pub const NECK: JointLimits = JointLimits::new(-2.5, 2.5, 2.5, 2.5);
    /// For a spine segment spanning the whole spine. Scaled by each segment's share.
    pub const SPINE: JointLimits = JointLimits::new(-40., 120., 40., 60.);
    pub const COLLAR: JointLimits = JointLimits::new(0., 20., 15., 0.);
    pub const UPPER_ARM: JointLimits = JointLimits::new(-100., 50., 100., 100.);
    pub const HAND: JointLimits = JointLimits::new(-90., 30., 10., 45.);
    pub const HIP: JointLimits = JointLimits::new(-40., 100., 30., 45.);
    pub const FOOT: JointLimits = JointLimits::new(-45., 15., 5., 5.);
    pub const TOE: JointLimits = JointLimits::new(-20., 20., 0., 0.);
    /// How far elbows and knees bend past their rest angle.
    pub const HINGE_RANGE: f32 = 100.;
}

impl Biped {
    pub fn set_default_joints<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        cardinal_alignment: bool,
    ) -> BipedResult<()> {
        self.set_default_joint_axes(scene, cardinal_alignment)?;
        self.set_default_joint_limits(scene)
    }

    /// Orients every joint's primary axis so positive twist bends the part the way the matching
    /// human joint bends.
    ///
    /// Axes are derived from the character's facing and the direction of each limb, then
    /// stored in the part's local space. With `cardinal_alignment` they are snapped to the
    /// nearest local axis.
    pub fn set_default_joint_axes<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        cardinal_alignment: bool,
    ) -> BipedResult<()> {
        let required = self.required()?;
        self.set_parent_parts()?;

        let character = AxisTripod::from_quat(scene.global_transform(self.root).rotation());
        let slots = self.slots.clone();
        // Primary and secondary axis of each part, in world space
        let mut axes: Vec<(PartId, Vec3, Vec3)> = Vec::new();

        let axial = std::iter::once(required.head)
            .chain(slots.neck.iter().copied())
            .chain(slots.spine.iter().copied());
        for id in axial {
            axes.push((id, -character.right, character.forward));
        }

        for side in Side::BOTH {
            let limbs = *required.side(side);
            let s = slots.side(side);

            if let Some(collar) = s.collar {
                let axis = match side {
                    Side::Left => character.forward,
                    Side::Right => character.back(),
                };
                axes.push((collar, axis, character.up));
            }

            let upper_arm = AxisTripod::from_forward_up(
                self.direction(scene, limbs.upper_arm, limbs.forearm)?,
                character.forward,
            );
            axes.push((limbs.upper_arm, upper_arm.left(), upper_arm.down()));

            let forearm = AxisTripod::from_forward_up(
                self.direction(scene, limbs.forearm, limbs.hand)?,
                character.forward,
            );
            axes.push((limbs.forearm, forearm.left(), forearm.down()));
            match side {
                Side::Left => axes.push((limbs.hand, forearm.up, forearm.left())),
                Side::Right => axes.push((limbs.hand, forearm.down(), forearm.right)),
            }

            let hip = AxisTripod::from_forward_up(
                self.direction(scene, limbs.hip, limbs.lower_leg)?,
                character.right,
            );
            axes.push((limbs.hip, hip.up, hip.left()));

            let lower_leg = AxisTripod::from_forward_up(
                self.direction(scene, limbs.lower_leg, limbs.foot)?,
                character.right,
            );
            axes.push((limbs.lower_leg, lower_leg.up, lower_leg.left()));

            let foot = AxisTripod::from_forward_up(character.forward, character.right);
            axes.push((limbs.foot, foot.up, foot.left()));
            if let Some(toe) = s.toe {
                axes.push((toe, foot.up, foot.left()));
            }
        }

        for (id, axis, secondary_axis) in axes {
            let part = self.parts.part_mut(id)?;
            part.joint_axis = part.inverse_transform_direction(scene, axis);
            part.joint_secondary_axis = part.inverse_transform_direction(scene, secondary_axis);
        }

        if cardinal_alignment {
            for id in self.all_parts() {
                let part = self.parts.part_mut(id)?;
                part.joint_axis = nearest_cardinal_axis(part.joint_axis);
                part.joint_secondary_axis = nearest_cardinal_axis(part.joint_secondary_axis);
            }
        }
        Ok(())
    }

    /// Sets anatomical limits on every joint and records the current pose as the joints' rest
    /// pose.
    ///
    /// Elbows and knees bend from whatever angle they rest at. Tips and toes stop being rigid
    /// bodies: they only shape their parent's collider.
    pub fn set_default_joint_limits<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
    ) -> BipedResult<()> {
        use joint_limits as limits;

        let required = self.required()?;
        for id in self.all_parts() {
            self.parts.part_mut(id)?.store_initial_rotation(scene);
        }
        let slots = self.slots.clone();

        self.set_limits(required.head, limits::HEAD)?;

        let neck_length = self.neck_length(scene)?;
        self.set_chain_limits(scene, &slots.neck, neck_length, limits::NECK)?;
        let spine_length = self.spine_length(scene)?;
        self.set_chain_limits(scene, &slots.spine, spine_length, limits::SPINE)?;

        for side in Side::BOTH {
            let limbs = *required.side(side);
            let s = slots.side(side);

            if let Some(collar) = s.collar {
                self.set_limits(collar, limits::COLLAR)?;
            }
            self.set_limits(limbs.upper_arm, limits::UPPER_ARM)?;
            let elbow = angle_degrees(
                self.direction(scene, limbs.forearm, limbs.hand)?,
                self.direction(scene, limbs.upper_arm, limbs.forearm)?,
            );
            self.set_limits(
                limbs.forearm,
                JointLimits::new(elbow - limits::HINGE_RANGE, elbow, 0., 0.),
            )?;
            self.set_limits(limbs.hand, limits::HAND)?;

            self.set_limits(limbs.hip, limits::HIP)?;
            let knee = angle_degrees(
                self.direction(scene, limbs.lower_leg, limbs.foot)?,
                self.direction(scene, limbs.hip, limbs.lower_leg)?,
            );
            self.set_limits(
                limbs.lower_leg,
                JointLimits::new(knee - limits::HINGE_RANGE, knee, 1., 1.),
            )?;
            self.set_limits(limbs.foot, limits::FOOT)?;
            if let Some(toe) = s.toe {
                self.set_limits(toe, limits::TOE)?;
            }
        }

        let mut non_rigid: Vec<PartId> = slots.head_tip.into_iter().collect();
        for side in Side::BOTH {
            let s = slots.side(side);
            non_rigid.extend(s.hand_tip);
            non_rigid.extend(s.toe);
            non_rigid.extend(s.toe_tip);
        }
        for id in non_rigid {
            self.parts.part_mut(id)?.is_rigid_body = false;
        }
        Ok(())
    }

    fn set_limits(&mut self, id: PartId, limits: JointLimits) -> BipedResult<()> {
        self.parts.part_mut(id)?.joint_limits = limits;
        Ok(())
    }

    /// Gives each chain segment `whole` scaled by the fraction of the chain it spans.
    fn set_chain_limits<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        chain: &[PartId],
        chain_length: f32,
        whole: JointLimits,
    ) -> BipedResult<()> {
        let params = self.compute_chain_parameter_values(scene, chain, chain_length, 1.)?;
        let mut previous = 0.;
        for (&id, &param) in chain.iter().zip(&params) {
            self.set_limits(id, whole.scaled(param - previous))?;
            previous = param;
        }
        Ok(())
    }

    /// World-space vector from `from` to `to`.
    fn direction<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        from: PartId,
        to: PartId,
    ) -> BipedResult<Vec3> {
        Ok(self.position(scene, to)? - self.position(scene, from)?)
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
        testing::{human_ik_rig, two_neck_rig},
    };
    use bevy_math::Quat;
    use bevy_transform::components::Transform;

    fn configured(rig: &Skeleton) -> Biped {
        let mut biped = Biped::new(rig.roots()[0], BipedConfig::default());
        biped.find_bones_using_naming_convention(rig);
        biped.set_default_joints(rig, true).unwrap();
        biped
    }

    fn part(biped: &Biped, role: Role) -> &Part {
        biped.part(biped.part_for_role(role).unwrap()).unwrap()
    }

    fn axes(biped: &Biped, role: Role) -> (Vec3, Vec3) {
        let part = part(biped, role);
        (part.joint_axis, part.joint_secondary_axis)
    }

    #[test]
    fn test_axial_axes() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        assert_eq!(axes(&biped, Role::Head), (Vec3::NEG_X, Vec3::Z));
        assert_eq!(axes(&biped, Role::Spine), (Vec3::NEG_X, Vec3::Z));
    }

    #[test]
    fn test_arm_axes_mirror() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        assert_eq!(axes(&biped, Role::Collar(Side::Left)), (Vec3::Z, Vec3::Y));
        assert_eq!(axes(&biped, Role::Collar(Side::Right)), (Vec3::NEG_Z, Vec3::Y));
        assert_eq!(axes(&biped, Role::UpperArm(Side::Left)), (Vec3::Y, Vec3::NEG_Z));
        assert_eq!(axes(&biped, Role::UpperArm(Side::Right)), (Vec3::NEG_Y, Vec3::NEG_Z));
        assert_eq!(axes(&biped, Role::Forearm(Side::Left)), (Vec3::Y, Vec3::NEG_Z));
        assert_eq!(axes(&biped, Role::Hand(Side::Left)), (Vec3::Z, Vec3::Y));
        assert_eq!(axes(&biped, Role::Hand(Side::Right)), (Vec3::NEG_Z, Vec3::Y));
    }

    #[test]
    fn test_leg_axes() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        for side in Side::BOTH {
            assert_eq!(axes(&biped, Role::Hip(side)), (Vec3::X, Vec3::Z));
            assert_eq!(axes(&biped, Role::LowerLeg(side)), (Vec3::X, Vec3::Z));
            assert_eq!(axes(&biped, Role::Foot(side)), (Vec3::X, Vec3::Y));
            assert_eq!(axes(&biped, Role::Toe(side)), (Vec3::X, Vec3::Y));
        }
    }

    #[test]
    fn test_axes_in_local_space() {
        let mut rig = human_ik_rig();
        // Roll the left thigh bone a quarter turn around its own length
        let thigh = rig.bone_by_name("LeftUpLeg").unwrap();
        let local = rig.local_transform(thigh).unwrap();
        rig.set_local_transform(
            thigh,
            local.with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let leg = rig.bone_by_name("LeftLeg").unwrap();
        rig.set_local_transform(
            leg,
            Transform::from_xyz(0., -0.45, 0.)
                .with_rotation(Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2)),
        );
        let biped = configured(&rig);

        // World +X seen from a bone rotated +90 degrees around Y is local +Z
        let (axis, secondary) = axes(&biped, Role::Hip(Side::Left));
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-5));
        assert!(secondary.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn test_fixed_limits() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        assert_eq!(part(&biped, Role::Head).joint_limits, joint_limits::HEAD);
        assert_eq!(part(&biped, Role::Hip(Side::Left)).joint_limits, joint_limits::HIP);
        assert_eq!(part(&biped, Role::Toe(Side::Right)).joint_limits, joint_limits::TOE);
        assert_eq!(
            part(&biped, Role::Collar(Side::Right)).joint_limits,
            joint_limits::COLLAR
        );
    }

    #[test]
    fn test_hinge_limits_follow_rest_angle() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        // Straight limbs in the rest pose
        let forearm = part(&biped, Role::Forearm(Side::Left)).joint_limits;
        assert!((forearm.x_min + 100.).abs() < 0.05);
        assert!(forearm.x_max.abs() < 0.05);
        assert_eq!((forearm.y_max, forearm.z_max), (0., 0.));

        let lower_leg = part(&biped, Role::LowerLeg(Side::Right)).joint_limits;
        assert!((lower_leg.x_min + 100.).abs() < 0.05);
        assert!(lower_leg.x_max.abs() < 0.05);
        assert_eq!((lower_leg.y_max, lower_leg.z_max), (1., 1.));
    }

    #[test]
    fn test_bent_elbow_limits() {
        let mut rig = human_ik_rig();
        let hand = rig.bone_by_name("LeftHand").unwrap();
        // Bend the hand 90 degrees forward from the forearm
        rig.set_local_transform(hand, Transform::from_xyz(0., 0., 0.25));
        let biped = configured(&rig);

        let limits = part(&biped, Role::Forearm(Side::Left)).joint_limits;
        assert!((limits.x_max - 90.).abs() < 0.05);
        assert!((limits.x_min + 10.).abs() < 0.05);
    }

    #[test]
    fn test_chain_limits_scale_with_segments() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        for &id in &biped.slots().spine {
            let limits = biped.part(id).unwrap().joint_limits;
            let expected = joint_limits::SPINE.scaled(1. / 3.);
            assert!((limits.x_min - expected.x_min).abs() < 1e-3);
            assert!((limits.x_max - expected.x_max).abs() < 1e-3);
            assert!((limits.z_max - expected.z_max).abs() < 1e-3);
        }
        // A single neck segment spans the whole neck
        assert_eq!(part(&biped, Role::Neck).joint_limits, joint_limits::NECK);
    }

    #[test]
    fn test_two_segment_neck_splits_limits() {
        let rig = two_neck_rig();
        let biped = configured(&rig);
        let neck = biped.slots().neck.clone();
        assert_eq!(neck.len(), 2);

        let mut x_max = 0.;
        for (&id, share) in neck.iter().zip([0.12 / 0.22, 0.1 / 0.22]) {
            let limits = biped.part(id).unwrap().joint_limits;
            let expected = joint_limits::NECK.scaled(share);
            assert!((limits.x_min - expected.x_min).abs() < 1e-5, "{limits:?}");
            assert!((limits.x_max - expected.x_max).abs() < 1e-5, "{limits:?}");
            assert!((limits.y_max - expected.y_max).abs() < 1e-5, "{limits:?}");
            assert!((limits.z_max - expected.z_max).abs() < 1e-5, "{limits:?}");
            x_max += limits.x_max;
        }
        // Together the segments bend as far as a single neck bone would
        assert!((x_max - joint_limits::NECK.x_max).abs() < 1e-5);
    }

    #[test]
    fn test_tips_and_toes_are_not_rigid() {
        let rig = human_ik_rig();
        let biped = configured(&rig);

        for role in [
            Role::HeadTip,
            Role::HandTip(Side::Left),
            Role::Toe(Side::Right),
            Role::ToeTip(Side::Left),
        ] {
            assert!(!part(&biped, role).is_rigid_body, "{role}");
        }
        assert!(part(&biped, Role::Foot(Side::Right)).is_rigid_body);
        assert!(part(&biped, Role::Collar(Side::Left)).is_rigid_body);
    }
}
