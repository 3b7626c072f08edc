mod colliders;
mod config;
mod joints;
mod mass;
mod ragdoll;

pub use colliders::*;
pub use config::*;
pub use joints::*;
pub use mass::*;
pub use ragdoll::*;

use bevy_log::{error, info};
use bevy_math::Vec3;

use crate::core::{
    animation::AnimationDriver,
    errors::{BipedError, BipedResult},
    naming::{NamingConvention, NamingPreset},
    part::{Part, PartId, PartRegistry},
    resolver::RoleResolver,
    roles::{BipedSlots, Role, Side},
    skeleton::{NodeId, SkeletonHierarchy},
};

/// A humanoid skeleton with its anatomical roles mapped to [`Part`]s.
///
/// A biped goes through two phases. During setup, [`find_bones_using_naming_convention`]
/// assigns roles and the `set_default_*` methods fill in masses, colliders and joints. After
/// that it toggles between the posed state, where animation drives the skeleton, and the
/// ragdoll state entered with [`create_ragdoll`] and left with [`remove_ragdoll`].
///
/// [`find_bones_using_naming_convention`]: Biped::find_bones_using_naming_convention
/// [`create_ragdoll`]: Biped::create_ragdoll
/// [`remove_ragdoll`]: Biped::remove_ragdoll
pub struct Biped {
    /// Total mass in kilograms.
    pub total_mass: f32,
    pub auto_distribute_mass: bool,
    pub naming: NamingPreset,
    naming_convention: NamingConvention,
    root: NodeId,
    slots: BipedSlots<PartId>,
    parts: PartRegistry,
    is_ragdoll: bool,
    animation: Option<Box<dyn AnimationDriver>>,
}

impl std::fmt::Debug for Biped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Biped")
            .field("total_mass", &self.total_mass)
            .field("auto_distribute_mass", &self.auto_distribute_mass)
            .field("naming", &self.naming)
            .field("root", &self.root)
            .field("slots", &self.slots)
            .field("parts", &self.parts.len())
            .field("is_ragdoll", &self.is_ragdoll)
            .field("animation", &self.animation.is_some())
            .finish()
    }
}

/// Required roles, looked up once validation has passed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequiredParts {
    pub head: PartId,
    pub first_spine: PartId,
    pub last_spine: PartId,
    pub pelvis: PartId,
    pub left: RequiredLimbs,
    pub right: RequiredLimbs,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RequiredLimbs {
    pub upper_arm: PartId,
    pub forearm: PartId,
    pub hand: PartId,
    pub hip: PartId,
    pub lower_leg: PartId,
    pub foot: PartId,
}

impl RequiredParts {
    pub fn side(&self, side: Side) -> &RequiredLimbs {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl Biped {
    pub fn new(root: NodeId, config: BipedConfig) -> Self {
        Self {
            total_mass: config.total_mass,
            auto_distribute_mass: config.auto_distribute_mass,
            naming_convention: config.naming.convention(),
            naming: config.naming,
            root,
            slots: BipedSlots::default(),
            parts: PartRegistry::new(),
            is_ragdoll: false,
            animation: None,
        }
    }

    pub fn with_animation_driver(mut self, driver: impl AnimationDriver + 'static) -> Self {
        self.animation = Some(Box::new(driver));
        self
    }

    pub fn set_animation_driver(&mut self, driver: Option<Box<dyn AnimationDriver>>) {
        self.animation = driver;
    }

    pub fn animation_driver(&self) -> Option<&dyn AnimationDriver> {
        self.animation.as_deref()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_ragdoll(&self) -> bool {
        self.is_ragdoll
    }

    pub fn naming_convention(&self) -> &NamingConvention {
        &self.naming_convention
    }

    /// Replaces the naming convention, making it the preset for later automatic setups too.
    pub fn set_naming_convention(&mut self, convention: NamingConvention) {
        self.naming = NamingPreset::Custom(convention.clone());
        self.naming_convention = convention;
    }

    pub fn slots(&self) -> &BipedSlots<PartId> {
        &self.slots
    }

    /// Role assignments can be edited by hand before running the `set_default_*` methods.
    pub fn slots_mut(&mut self) -> &mut BipedSlots<PartId> {
        &mut self.slots
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut PartRegistry {
        &mut self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id)
    }

    /// Part currently playing `role`. Chain roles return their first segment.
    pub fn part_for_role(&self, role: Role) -> Option<PartId> {
        self.slots.get(role)
    }

    /// Returns the part for `node`, creating it if needed, so it can be assigned to a slot.
    pub fn attach_part<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S, node: NodeId) -> PartId {
        self.parts.attach(scene, node)
    }

    /// Assigns every role the current naming convention can find under the root. Roles that
    /// are not found are left empty.
    pub fn find_bones_using_naming_convention<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) {
        let nodes = RoleResolver::new(scene, self.root, &self.naming_convention).resolve();
        let parts = &mut self.parts;
        self.slots = nodes.map(|node| parts.attach(scene, node));
    }

    /// Every assigned part in a fixed order: head, head tip, neck, spine, pelvis, then arms and
    /// legs, left before right.
    pub fn all_parts(&self) -> Vec<PartId> {
        let slots = &self.slots;
        let mut out = Vec::new();
        out.extend(slots.head);
        out.extend(slots.head_tip);
        out.extend(slots.neck.iter().copied());
        out.extend(slots.spine.iter().copied());
        out.extend(slots.pelvis);
        for side in Side::BOTH {
            let s = slots.side(side);
            out.extend(s.collar);
            out.extend(s.upper_arm);
            out.extend(s.forearm);
            out.extend(s.hand);
            out.extend(s.hand_tip);
        }
        for side in Side::BOTH {
            let s = slots.side(side);
            out.extend(s.hip);
            out.extend(s.lower_leg);
            out.extend(s.foot);
            out.extend(s.toe);
            out.extend(s.toe_tip);
        }
        out
    }

    pub fn missing_required_roles(&self) -> Vec<Role> {
        self.slots.missing_required()
    }

    /// Checks that every mandatory role is assigned, logging the missing ones otherwise.
    pub fn validate_minimum_requirements(&self) -> BipedResult<()> {
        let missing = self.missing_required_roles();
        if missing.is_empty() {
            return Ok(());
        }
        let error = BipedError::MissingRequiredParts(missing);
        error!("{}", error);
        Err(error)
    }

    pub fn is_valid(&self) -> bool {
        self.missing_required_roles().is_empty()
    }

    pub(crate) fn required(&self) -> BipedResult<RequiredParts> {
        self.validate_minimum_requirements()?;
        let slot = |role: Role| {
            self.slots
                .get(role)
                .ok_or_else(|| BipedError::MissingRequiredParts(vec![role]))
        };
        let limbs = |side: Side| -> BipedResult<RequiredLimbs> {
            Ok(RequiredLimbs {
                upper_arm: slot(Role::UpperArm(side))?,
                forearm: slot(Role::Forearm(side))?,
                hand: slot(Role::Hand(side))?,
                hip: slot(Role::Hip(side))?,
                lower_leg: slot(Role::LowerLeg(side))?,
                foot: slot(Role::Foot(side))?,
            })
        };
        let last_spine = self
            .slots
            .spine
            .last()
            .copied()
            .ok_or_else(|| BipedError::MissingRequiredParts(vec![Role::Spine]))?;

        Ok(RequiredParts {
            head: slot(Role::Head)?,
            first_spine: slot(Role::Spine)?,
            last_spine,
            pelvis: slot(Role::Pelvis)?,
            left: limbs(Side::Left)?,
            right: limbs(Side::Right)?,
        })
    }

    /// Validates the biped and distributes its mass when `auto_distribute_mass` is set.
    pub fn initialize<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) -> BipedResult<()> {
        self.validate_minimum_requirements()?;
        if self.auto_distribute_mass {
            self.distribute_mass(scene)?;
        }
        Ok(())
    }

    /// Finds the bones and configures symmetry, colliders, joints and mass in one go.
    pub fn automate_setup<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) -> BipedResult<()> {
        self.naming_convention = self.naming.resolve(scene, self.root);
        self.find_bones_using_naming_convention(scene);
        self.validate_minimum_requirements()?;

        self.map_symmetry(scene, true)?;
        self.set_parent_parts()?;
        self.set_default_colliders(scene)?;
        self.set_default_joints(scene, true)?;
        self.distribute_mass(scene)?;

        info!(
            "Set up biped {:?} with {} parts",
            scene.name(self.root),
            self.all_parts().len()
        );
        Ok(())
    }

    pub(crate) fn position<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        id: PartId,
    ) -> BipedResult<Vec3> {
        Ok(self.parts.part(id)?.world_position(scene))
    }

    pub(crate) fn distance<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        a: PartId,
        b: PartId,
    ) -> BipedResult<f32> {
        Ok(self.position(scene, a)?.distance(self.position(scene, b)?))
    }

    /// Length of `chain` with its last segment running to `end`.
    fn chain_length<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        chain: &[PartId],
        end: PartId,
    ) -> BipedResult<f32> {
        let mut length = 0.;
        for (i, &id) in chain.iter().enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or(end);
            length += self.distance(scene, id, next)?;
        }
        Ok(length)
    }

    /// Distance from the pelvis-most spine segment to the first neck segment, or to the head
    /// when there is no neck.
    pub fn spine_length<S: SkeletonHierarchy + ?Sized>(&self, scene: &S) -> BipedResult<f32> {
        let required = self.required()?;
        let end = self.slots.neck.first().copied().unwrap_or(required.head);
        self.chain_length(scene, &self.slots.spine, end)
    }

    /// Distance from the first neck segment to the head. Zero without a neck.
    pub fn neck_length<S: SkeletonHierarchy + ?Sized>(&self, scene: &S) -> BipedResult<f32> {
        let required = self.required()?;
        self.chain_length(scene, &self.slots.neck, required.head)
    }

    /// Cumulative normalized position along a chain, one value per segment.
    ///
    /// Every segment but the last advances by its length over `chain_length`, scaled by
    /// `offset`. The last segment advances by `offset` times the remaining gap to one, so an
    /// `offset` of one always ends the chain at exactly one.
    pub fn compute_chain_parameter_values<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        chain: &[PartId],
        chain_length: f32,
        offset: f32,
    ) -> BipedResult<Vec<f32>> {
        let one_over_length = if chain_length > 0. {
            1. / chain_length
        } else {
            0.
        };

        let mut values = Vec::with_capacity(chain.len());
        let mut current = 0.;
        for (i, &id) in chain.iter().enumerate() {
            let step = match chain.get(i + 1) {
                Some(&next) => self.distance(scene, id, next)? * one_over_length * offset,
                None => offset * (1. - current),
            };
            current += step;
            values.push(current);
        }
        Ok(values)
    }

    /// Links every part to the part it hangs from in the ragdoll.
    pub fn set_parent_parts(&mut self) -> BipedResult<()> {
        let required = self.required()?;
        for id in self.all_parts() {
            self.parts.part_mut(id)?.parent_part = None;
        }

        let slots = self.slots.clone();
        self.link(slots.head_tip, required.head)?;
        self.link(
            Some(required.head),
            slots.neck.last().copied().unwrap_or(required.last_spine),
        )?;
        for (i, &neck) in slots.neck.iter().enumerate() {
            let parent = if i == 0 {
                required.last_spine
            } else {
                slots.neck[i - 1]
            };
            self.link(Some(neck), parent)?;
        }
        for (i, &spine) in slots.spine.iter().enumerate() {
            let parent = if i == 0 {
                required.pelvis
            } else {
                slots.spine[i - 1]
            };
            self.link(Some(spine), parent)?;
        }

        for side in Side::BOTH {
            let limbs = *required.side(side);
            let s = slots.side(side);

            self.link(s.collar, required.last_spine)?;
            let shoulder = match s.collar {
                Some(collar) if self.parts.part(collar)?.is_rigid_body => collar,
                _ => required.last_spine,
            };
            self.link(Some(limbs.upper_arm), shoulder)?;
            self.link(Some(limbs.forearm), limbs.upper_arm)?;
            self.link(Some(limbs.hand), limbs.forearm)?;
            self.link(s.hand_tip, limbs.hand)?;

            self.link(Some(limbs.hip), required.pelvis)?;
            self.link(Some(limbs.lower_leg), limbs.hip)?;
            self.link(Some(limbs.foot), limbs.lower_leg)?;
            if let Some(toe) = s.toe {
                self.link(Some(toe), limbs.foot)?;
                self.link(s.toe_tip, toe)?;
            }
        }

        Ok(())
    }

    fn link(&mut self, id: Option<PartId>, parent: PartId) -> BipedResult<()> {
        if let Some(id) = id {
            self.parts.part_mut(id)?.parent_part = Some(parent);
        }
        Ok(())
    }

    /// Pairs every left limb part with its right counterpart. Optional parts are only paired
    /// when both sides have them.
    pub fn map_symmetry<S: SkeletonHierarchy + ?Sized>(
        &mut self,
        scene: &S,
        cardinal_alignment: bool,
    ) -> BipedResult<()> {
        let required = self.required()?;
        let (left, right) = (self.slots.left.clone(), self.slots.right.clone());
        let (l, r) = (required.left, required.right);

        let pairs = [
            (left.collar, right.collar),
            (Some(l.upper_arm), Some(r.upper_arm)),
            (Some(l.forearm), Some(r.forearm)),
            (Some(l.hand), Some(r.hand)),
            (left.hand_tip, right.hand_tip),
            (Some(l.hip), Some(r.hip)),
            (Some(l.lower_leg), Some(r.lower_leg)),
            (Some(l.foot), Some(r.foot)),
            (left.toe, right.toe),
            (left.toe_tip, right.toe_tip),
        ];
        for pair in pairs {
            if let (Some(a), Some(b)) = pair {
                self.parts.match_to(scene, a, b, cardinal_alignment)?;
            }
        }
        Ok(())
    }

    /// Captures the current local positions of every part, to be restored when the ragdoll is
    /// removed.
    pub fn snapshot_position<S: SkeletonHierarchy + ?Sized>(&mut self, scene: &S) -> BipedResult<()> {
        for id in self.all_parts() {
            self.parts.part_mut(id)?.store_position_snapshot(scene);
        }
        Ok(())
    }
}
