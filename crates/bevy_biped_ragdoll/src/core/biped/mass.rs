use bevy_log::debug;

use super::Biped;
use crate::core::{
    errors::BipedResult,
    part::{CenterOfMassOverride, PartId},
    roles::Side,
    skeleton::SkeletonHierarchy,
};

/// Share of the total mass carried by each body segment.
///
/// Values for a single limb part apply to each side. The shares add up to [`TOTAL`], just short
/// of one; they are kept as published rather than renormalized.
pub mod mass_fraction {
    pub const HEAD: f32 = 0.073;
    pub const NECK: f32 = 0.02;
    pub const SPINE: f32 = 0.335;
    pub const PELVIS: f32 = 0.15;
    pub const HIP: f32 = 0.103;
    pub const LOWER_LEG: f32 = 0.043;
    pub const FOOT: f32 = 0.0125;
    pub const TOE: f32 = 0.0025;
    pub const UPPER_ARM: f32 = 0.026;
    pub const FOREARM: f32 = 0.016;
    pub const HAND: f32 = 0.007;

    /// Sum of every share, counting limb parts on both sides.
    pub const TOTAL: f32 = HEAD
        + NECK
        + SPINE
        + PELVIS
        + 2. * (HIP + LOWER_LEG + FOOT + TOE + UPPER_ARM + FOREARM + HAND);
}

/// Where each limb segment's centre of mass sits, as a fraction of the way to the next joint.
pub mod center_of_mass_fraction {
    pub const COLLAR: f32 = 0.5;
    pub const UPPER_ARM: f32 = 0.513;
    pub const FOREARM: f32 = 0.039;
    pub const HIP: f32 = 0.372;
    pub const LOWER_LEG: f32 = 0.0371;
}

impl Biped {
    /// Spreads [`Biped::total_mass`] over the parts by anatomical proportion.
    ///
    /// Mass of a part that is not a rigid body goes to the nearest rigid part above it, and the
    /// neck and spine shares are split between segments by segment length. Limb parts also get
    /// a centre of mass placed partway toward the next joint.
    ///
    /// The parts end up carrying [`mass_fraction::TOTAL`] times the total mass, 0.2% short of
    /// it, since the shares are applied as published.
    pub fn distribute_mass<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) -> BipedResult<()> {
        use mass_fraction as fraction;

        let required = self.required()?;
        let total = self.total_mass;

        for id in self.all_parts() {
            let part = self.parts.part_mut(id)?;
            part.mass = 0.;
            part.center_of_mass = CenterOfMassOverride::default();
        }

        self.add_mass(required.head, fraction::HEAD * total)?;

        let neck = self.slots.neck.clone();
        let neck_is_rigid = match neck.last() {
            Some(&last) => self.parts.part(last)?.is_rigid_body,
            None => false,
        };
        if neck_is_rigid {
            for (id, share) in self.segment_shares(scene, &neck, required.head)? {
                self.add_mass(id, share * fraction::NECK * total)?;
            }
        } else {
            self.add_mass(required.last_spine, fraction::NECK * total)?;
        }

        let spine = self.slots.spine.clone();
        let spine_end = neck.first().copied().unwrap_or(required.head);
        for (id, share) in self.segment_shares(scene, &spine, spine_end)? {
            self.add_mass(id, share * fraction::SPINE * total)?;
        }

        self.add_mass(required.pelvis, fraction::PELVIS * total)?;

        for side in Side::BOTH {
            let limbs = *required.side(side);
            self.add_mass(limbs.hip, fraction::HIP * total)?;
            self.add_mass(limbs.lower_leg, fraction::LOWER_LEG * total)?;

            let foot = self.rigid_or(limbs.foot, limbs.lower_leg)?;
            self.add_mass(foot, fraction::FOOT * total)?;

            let toe = match self.slots.side(side).toe {
                Some(toe) if self.parts.part(toe)?.is_rigid_body => toe,
                _ => foot,
            };
            self.add_mass(toe, fraction::TOE * total)?;
        }

        for side in Side::BOTH {
            let limbs = *required.side(side);
            self.add_mass(limbs.upper_arm, fraction::UPPER_ARM * total)?;
            self.add_mass(limbs.forearm, fraction::FOREARM * total)?;
            let hand = self.rigid_or(limbs.hand, limbs.forearm)?;
            self.add_mass(hand, fraction::HAND * total)?;
        }

        self.set_default_centers_of_mass(scene)?;

        debug!("Distributed {} kg over {} parts", total, self.all_parts().len());
        Ok(())
    }

    fn set_default_centers_of_mass<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
    ) -> BipedResult<()> {
        use center_of_mass_fraction as fraction;

        let required = self.required()?;
        for side in Side::BOTH {
            let limbs = *required.side(side);
            if let Some(collar) = self.slots.side(side).collar {
                self.place_center_of_mass(scene, collar, limbs.upper_arm, fraction::COLLAR)?;
            }
            self.place_center_of_mass(scene, limbs.upper_arm, limbs.forearm, fraction::UPPER_ARM)?;
            self.place_center_of_mass(scene, limbs.forearm, limbs.hand, fraction::FOREARM)?;
            self.place_center_of_mass(scene, limbs.hip, limbs.lower_leg, fraction::HIP)?;
            self.place_center_of_mass(scene, limbs.lower_leg, limbs.foot, fraction::LOWER_LEG)?;
        }
        Ok(())
    }

    fn add_mass(&mut self, id: PartId, mass: f32) -> BipedResult<()> {
        self.parts.part_mut(id)?.mass += mass;
        Ok(())
    }

    /// `id` if it is a rigid body, `fallback` otherwise.
    fn rigid_or(&self, id: PartId, fallback: PartId) -> BipedResult<PartId> {
        Ok(if self.parts.part(id)?.is_rigid_body {
            id
        } else {
            fallback
        })
    }

    /// Puts `id`'s centre of mass `fraction` of the way toward `toward`, in `id`'s local space.
    fn place_center_of_mass<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        id: PartId,
        toward: PartId,
        fraction: f32,
    ) -> BipedResult<()> {
        let target = self.position(scene, toward)?;
        let part = self.parts.part_mut(id)?;
        part.center_of_mass = CenterOfMassOverride {
            enabled: true,
            position: part.inverse_transform_point(scene, target) * fraction,
        };
        Ok(())
    }

    /// Each segment's share of the chain's length, the last segment running to `end`. Chains
    /// of no length are split evenly.
    fn segment_shares<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        chain: &[PartId],
        end: PartId,
    ) -> BipedResult<Vec<(PartId, f32)>> {
        let mut lengths = Vec::with_capacity(chain.len());
        for (i, &id) in chain.iter().enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or(end);
            lengths.push(self.distance(scene, id, next)?);
        }
        let total: f32 = lengths.iter().sum();

        Ok(chain
            .iter()
            .zip(lengths)
            .map(|(&id, length)| {
                let share = if total > f32::EPSILON {
                    length / total
                } else {
                    1. / chain.len() as f32
                };
                (id, share)
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{
        biped::BipedConfig,
        roles::Role,
        skeleton::Skeleton,
        testing::human_ik_rig,
    };
    use bevy_math::Vec3;

    fn biped(rig: &Skeleton) -> Biped {
        let mut biped = Biped::new(rig.roots()[0], BipedConfig::default());
        biped.find_bones_using_naming_convention(rig);
        biped
    }

    fn mass(biped: &Biped, role: Role) -> f32 {
        biped
            .part(biped.part_for_role(role).unwrap())
            .unwrap()
            .mass
    }

    fn total(biped: &Biped) -> f32 {
        biped
            .all_parts()
            .into_iter()
            .map(|id| biped.part(id).unwrap().mass)
            .sum()
    }

    #[test]
    fn test_distributed_mass_adds_up() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        biped.distribute_mass(&rig).unwrap();

        assert!((total(&biped) - mass_fraction::TOTAL * 80.).abs() < 1e-3);
        assert!((mass_fraction::TOTAL - 0.998).abs() < 1e-6);
        assert!((mass(&biped, Role::Head) - 5.84).abs() < 1e-4);
        assert!((mass(&biped, Role::Pelvis) - 12.).abs() < 1e-4);
        assert_eq!(mass(&biped, Role::HeadTip), 0.);
        assert_eq!(mass(&biped, Role::HandTip(Side::Left)), 0.);
    }

    #[test]
    fn test_spine_split_by_length() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        biped.distribute_mass(&rig).unwrap();

        // Three segments of equal length
        let spine = biped.slots().spine.clone();
        let segment = 0.335 * 80. / 3.;
        for id in spine {
            assert!((biped.part(id).unwrap().mass - segment).abs() < 1e-3);
        }
        assert!((mass(&biped, Role::Neck) - 1.6).abs() < 1e-4);
    }

    #[test]
    fn test_non_rigid_parts_hand_mass_up() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        let neck = biped.part_for_role(Role::Neck).unwrap();
        let toe = biped.part_for_role(Role::Toe(Side::Left)).unwrap();
        let hand = biped.part_for_role(Role::Hand(Side::Right)).unwrap();
        for id in [neck, toe, hand] {
            biped.part_mut(id).unwrap().is_rigid_body = false;
        }
        biped.distribute_mass(&rig).unwrap();

        let last_spine = *biped.slots().spine.last().unwrap();
        assert_eq!(mass(&biped, Role::Neck), 0.);
        assert!((biped.part(last_spine).unwrap().mass - (0.335 * 80. / 3. + 1.6)).abs() < 1e-3);
        assert!((mass(&biped, Role::Foot(Side::Left)) - 1.2).abs() < 1e-4);
        assert!((mass(&biped, Role::Foot(Side::Right)) - 1.).abs() < 1e-4);
        assert!((mass(&biped, Role::Forearm(Side::Right)) - 1.84).abs() < 1e-4);
        assert!((total(&biped) - mass_fraction::TOTAL * 80.).abs() < 1e-3);
    }

    #[test]
    fn test_toe_mass_falls_back_to_lower_leg() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        for role in [Role::Toe(Side::Left), Role::Foot(Side::Left)] {
            let id = biped.part_for_role(role).unwrap();
            biped.part_mut(id).unwrap().is_rigid_body = false;
        }
        biped.distribute_mass(&rig).unwrap();

        let expected = (0.043 + 0.0125 + 0.0025) * 80.;
        assert!((mass(&biped, Role::LowerLeg(Side::Left)) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_centers_of_mass() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        biped.distribute_mass(&rig).unwrap();

        let center = |role: Role| {
            biped
                .part(biped.part_for_role(role).unwrap())
                .unwrap()
                .center_of_mass
        };
        let upper_arm = center(Role::UpperArm(Side::Left));
        assert!(upper_arm.enabled);
        assert!(
            upper_arm
                .position
                .abs_diff_eq(Vec3::new(-0.28 * 0.513, 0., 0.), 1e-5)
        );
        let hip = center(Role::Hip(Side::Right));
        assert!(hip.position.abs_diff_eq(Vec3::new(0., -0.45 * 0.372, 0.), 1e-5));
        assert!(!center(Role::Foot(Side::Left)).enabled);
    }

    #[test]
    fn test_redistribution_is_idempotent() {
        let rig = human_ik_rig();
        let mut biped = biped(&rig);
        biped.distribute_mass(&rig).unwrap();
        let first = total(&biped);
        biped.total_mass = 60.;
        biped.distribute_mass(&rig).unwrap();
        biped.total_mass = 80.;
        biped.distribute_mass(&rig).unwrap();

        assert!((total(&biped) - first).abs() < 1e-4);
    }
}
